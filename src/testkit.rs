// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory collaborators for tests.
//!
//! Enabled for unit tests and, through the `testkit` feature, for the
//! integration tests under `tests/`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::bringup::Collaborators;
use crate::compute::{RemoteRuntime, RuntimeInventory, ServeOutcome, ServeParams};
use crate::config::Configuration;
use crate::error::BringupError;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::k8s::{ApplyAction, ClusterApi, ObservedResource, ResourceDescriptor, ResourceKind};
use crate::network::{Cidr, HostNetwork, LinkInfo};

/// Configuration from defaults plus `pairs`.
///
/// # Panics
/// Panics when the pairs do not parse.
pub fn configuration(pairs: &[(&str, &str)]) -> Configuration {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    match Configuration::from_pairs(&map) {
        Ok(config) => config,
        Err(e) => panic!("test configuration rejected: {}", e),
    }
}

/// One scripted answer.
pub type Scripted = Result<CommandOutput, BringupError>;

struct Rule {
    pattern: String,
    responses: VecDeque<Scripted>,
}

/// Command runner answering from a script.
///
/// Rules are matched in the order they were added by substring of the
/// command line. A rule's last response repeats once the others are used.
/// Unmatched commands exit 127.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, pattern: &str, output: CommandOutput) -> &Self {
        self.on_sequence(pattern, vec![Ok(output)])
    }

    pub fn on_error(&self, pattern: &str, error: BringupError) -> &Self {
        self.on_sequence(pattern, vec![Err(error)])
    }

    pub fn on_sequence(&self, pattern: &str, responses: Vec<Scripted>) -> &Self {
        self.rules.lock().push(Rule {
            pattern: pattern.to_string(),
            responses: responses.into(),
        });
        self
    }

    /// Every command line run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(CommandSpec::display).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, BringupError> {
        self.calls.lock().push(spec.clone());
        let line = spec.display();
        let mut rules = self.rules.lock();
        let Some(rule) = rules.iter_mut().find(|r| line.contains(&r.pattern)) else {
            return Ok(CommandOutput::failed(127, format!("{}: command not scripted", spec.program)));
        };
        if rule.responses.len() > 1 {
            rule.responses
                .pop_front()
                .unwrap_or_else(|| Ok(CommandOutput::failed(127, "empty script")))
        } else {
            rule.responses
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(CommandOutput::failed(127, "empty script")))
        }
    }
}

#[derive(Default)]
struct ClusterState {
    objects: BTreeMap<String, Value>,
    operations: Vec<String>,
    failures: HashMap<String, BringupError>,
    observed: HashMap<ResourceKind, Vec<ObservedResource>>,
    get_failures: HashMap<ResourceKind, BringupError>,
}

/// Cluster that keeps objects in memory and records every mutation.
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<ClusterState>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `apply` of the resource with this id fail.
    pub fn fail_apply(&self, id: &str, error: BringupError) {
        self.state.lock().failures.insert(format!("apply {}", id), error);
    }

    pub fn fail_delete(&self, id: &str, error: BringupError) {
        self.state.lock().failures.insert(format!("delete {}", id), error);
    }

    pub fn fail_get(&self, kind: ResourceKind, error: BringupError) {
        self.state.lock().get_failures.insert(kind, error);
    }

    /// Objects returned by `get` for `kind` instead of the stored ones.
    pub fn set_observed(&self, kind: ResourceKind, observed: Vec<ObservedResource>) {
        self.state.lock().observed.insert(kind, observed);
    }

    /// `apply <id>` / `delete <id>` in call order, failures included.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().operations.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.lock().objects.contains_key(id)
    }

    pub fn object_ids(&self) -> Vec<String> {
        self.state.lock().objects.keys().cloned().collect()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn apply(&self, descriptor: &ResourceDescriptor) -> Result<ApplyAction, BringupError> {
        let id = descriptor.id();
        let mut state = self.state.lock();
        let op = format!("apply {}", id);
        state.operations.push(op.clone());
        if let Some(err) = state.failures.get(&op) {
            return Err(err.clone());
        }
        let action = match state.objects.get(&id) {
            Some(existing) if *existing == descriptor.manifest => ApplyAction::Unchanged,
            Some(_) => ApplyAction::Configured,
            None => ApplyAction::Created,
        };
        state.objects.insert(id, descriptor.manifest.clone());
        Ok(action)
    }

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), BringupError> {
        let id = descriptor.id();
        let mut state = self.state.lock();
        let op = format!("delete {}", id);
        state.operations.push(op.clone());
        if let Some(err) = state.failures.get(&op) {
            return Err(err.clone());
        }
        match state.objects.remove(&id) {
            Some(_) => Ok(()),
            None => Err(BringupError::NotFound { resource: id }),
        }
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        _selector: Option<&str>,
    ) -> Result<Vec<ObservedResource>, BringupError> {
        let state = self.state.lock();
        if let Some(err) = state.get_failures.get(&kind) {
            return Err(err.clone());
        }
        if let Some(observed) = state.observed.get(&kind) {
            return Ok(observed.clone());
        }
        let prefix = format!("{}/{}/", kind, namespace);
        Ok(state
            .objects
            .keys()
            .filter_map(|id| id.strip_prefix(&prefix))
            .map(|name| ObservedResource {
                kind,
                namespace: Some(namespace.to_string()),
                name: name.to_string(),
                phase: "Present".to_string(),
                ready: None,
                detail: String::new(),
                healthy: true,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
struct FakeLink {
    name: String,
    carrier: bool,
    addresses: Vec<Cidr>,
}

#[derive(Default)]
struct NetworkState {
    links: Vec<FakeLink>,
    persisted: Vec<(String, Cidr)>,
    mutations: Vec<String>,
    add_error: Option<BringupError>,
    persist_error: Option<BringupError>,
}

/// Host network with links held in memory.
#[derive(Default)]
pub struct FakeNetwork {
    state: Mutex<NetworkState>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(self, name: &str, carrier: bool) -> Self {
        self.state.lock().links.push(FakeLink {
            name: name.to_string(),
            carrier,
            addresses: Vec::new(),
        });
        self
    }

    /// # Panics
    /// Panics on a malformed CIDR.
    pub fn with_address(self, name: &str, cidr: &str) -> Self {
        let cidr: Cidr = match cidr.parse() {
            Ok(c) => c,
            Err(e) => panic!("bad test cidr: {}", e),
        };
        if let Some(link) = self.state.lock().links.iter_mut().find(|l| l.name == name) {
            link.addresses.push(cidr);
        }
        self
    }

    pub fn fail_add(&self, error: BringupError) {
        self.state.lock().add_error = Some(error);
    }

    pub fn fail_persist(&self, error: BringupError) {
        self.state.lock().persist_error = Some(error);
    }

    pub fn addresses_of(&self, name: &str) -> Vec<Cidr> {
        self.state
            .lock()
            .links
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.addresses.clone())
            .unwrap_or_default()
    }

    pub fn persisted(&self) -> Vec<(String, Cidr)> {
        self.state.lock().persisted.clone()
    }

    /// `add <if> <cidr>` / `persist <if> <cidr>` for every mutation performed.
    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().mutations.clone()
    }
}

#[async_trait]
impl HostNetwork for FakeNetwork {
    async fn interfaces(&self) -> Result<Vec<String>, BringupError> {
        Ok(self.state.lock().links.iter().map(|l| l.name.clone()).collect())
    }

    async fn carrier(&self, interface: &str) -> Result<bool, BringupError> {
        self.state
            .lock()
            .links
            .iter()
            .find(|l| l.name == interface)
            .map(|l| l.carrier)
            .ok_or_else(|| BringupError::NotFound {
                resource: format!("interface {}", interface),
            })
    }

    async fn addresses(&self, interface: &str) -> Result<Vec<Cidr>, BringupError> {
        Ok(self.addresses_of(interface))
    }

    async fn add_address(&self, interface: &str, address: &Cidr) -> Result<(), BringupError> {
        let mut state = self.state.lock();
        if let Some(err) = &state.add_error {
            return Err(err.clone());
        }
        state.mutations.push(format!("add {} {}", interface, address));
        match state.links.iter_mut().find(|l| l.name == interface) {
            Some(link) => {
                link.addresses.push(*address);
                Ok(())
            }
            None => Err(BringupError::NotFound {
                resource: format!("interface {}", interface),
            }),
        }
    }

    async fn persist_address(&self, interface: &str, address: &Cidr) -> Result<bool, BringupError> {
        let mut state = self.state.lock();
        if let Some(err) = &state.persist_error {
            return Err(err.clone());
        }
        let entry = (interface.to_string(), *address);
        if state.persisted.contains(&entry) {
            return Ok(false);
        }
        state.mutations.push(format!("persist {} {}", interface, address));
        state.persisted.push(entry);
        Ok(true)
    }

    async fn link_info(&self, interface: &str) -> Result<LinkInfo, BringupError> {
        let carrier = self.carrier(interface).await?;
        Ok(LinkInfo {
            interface: interface.to_string(),
            operstate: if carrier { "up" } else { "down" }.to_string(),
            carrier: Some(carrier),
            speed_mbps: carrier.then_some(200_000),
            mtu: Some(9000),
        })
    }
}

/// Inventory with `gpus` whole GPUs spread over `nodes` nodes.
pub fn inventory(nodes: u32, gpus: u32) -> RuntimeInventory {
    RuntimeInventory {
        active_nodes: nodes,
        gpus_total: f64::from(gpus),
        gpus_used: 0.0,
    }
}

#[derive(Default)]
struct RuntimeState {
    inventories: VecDeque<Result<RuntimeInventory, BringupError>>,
    inventory_calls: u32,
    serving: bool,
    started: Vec<ServeParams>,
    start_error: Option<BringupError>,
    output: Vec<String>,
}

/// Runtime replaying a scripted inventory sequence. The last entry repeats.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<RuntimeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventories(self, sequence: Vec<Result<RuntimeInventory, BringupError>>) -> Self {
        self.state.lock().inventories = sequence.into();
        self
    }

    /// Report `gpus` GPUs from the `ready_on`-th inventory query onwards.
    pub fn gpus_from_attempt(self, ready_on: u32, gpus: u32) -> Self {
        let mut sequence: Vec<Result<RuntimeInventory, BringupError>> =
            (1..ready_on).map(|_| Ok(inventory(1, 1))).collect();
        sequence.push(Ok(inventory(2, gpus)));
        self.with_inventories(sequence)
    }

    pub fn serving(self, serving: bool) -> Self {
        self.state.lock().serving = serving;
        self
    }

    pub fn with_output(self, lines: &[&str]) -> Self {
        self.state.lock().output = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn fail_start(&self, error: BringupError) {
        self.state.lock().start_error = Some(error);
    }

    pub fn started(&self) -> Vec<ServeParams> {
        self.state.lock().started.clone()
    }

    pub fn inventory_calls(&self) -> u32 {
        self.state.lock().inventory_calls
    }
}

#[async_trait]
impl RemoteRuntime for FakeRuntime {
    async fn inventory(&self) -> Result<RuntimeInventory, BringupError> {
        let mut state = self.state.lock();
        state.inventory_calls += 1;
        let next = if state.inventories.len() > 1 {
            state.inventories.pop_front()
        } else {
            state.inventories.front().cloned()
        };
        next.unwrap_or_else(|| Err(BringupError::transient("runtime", "no inventory scripted")))
    }

    async fn start_serving(&self, params: &ServeParams) -> Result<ServeOutcome, BringupError> {
        let mut state = self.state.lock();
        if let Some(err) = &state.start_error {
            return Err(err.clone());
        }
        if state.serving {
            return Ok(ServeOutcome::AlreadyServing);
        }
        state.serving = true;
        state.started.push(params.clone());
        Ok(ServeOutcome::Started)
    }

    async fn is_serving(&self) -> Result<bool, BringupError> {
        Ok(self.state.lock().serving)
    }

    async fn tail_output(&self, lines: usize) -> Result<Vec<String>, BringupError> {
        let state = self.state.lock();
        let skip = state.output.len().saturating_sub(lines);
        Ok(state.output[skip..].to_vec())
    }
}

impl ScriptedRunner {
    /// Runner for a host where every tool exists, one GPU is visible and the
    /// model server answers 200.
    pub fn healthy_host() -> Self {
        let runner = Self::new();
        runner
            .on("command -v", CommandOutput::ok("/usr/bin/tool\n"))
            .on("nvidia-smi", CommandOutput::ok("GPU 0: NVIDIA GB10 (UUID: GPU-0)\n"))
            .on("ping", CommandOutput::ok("1 packets received"))
            .on("curl", CommandOutput::ok("200"));
        runner
    }
}

/// Fakes wired together as [`Collaborators`], with handles kept for asserts.
pub struct Harness {
    pub runner: Arc<ScriptedRunner>,
    pub cluster: Arc<FakeCluster>,
    pub network: Arc<FakeNetwork>,
    pub runtime: Arc<FakeRuntime>,
}

impl Harness {
    pub fn new(runner: ScriptedRunner, network: FakeNetwork, runtime: FakeRuntime) -> Self {
        Self {
            runner: Arc::new(runner),
            cluster: Arc::new(FakeCluster::new()),
            network: Arc::new(network),
            runtime: Arc::new(runtime),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            runner: self.runner.clone(),
            cluster: self.cluster.clone(),
            host: self.network.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

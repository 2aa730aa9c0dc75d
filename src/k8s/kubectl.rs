// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! [`ClusterApi`] backed by the kubectl binary.
//!
//! Manifests are piped to `kubectl apply -f -` as JSON, so nothing is written
//! to disk and the token secret never appears on a command line.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BringupError;
use crate::exec::{CommandRunner, CommandSpec};

use super::cluster::{ApplyAction, ClusterApi, ObservedResource};
use super::descriptor::{ResourceDescriptor, ResourceKind};

pub struct KubectlCluster {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    context: Option<String>,
}

impl KubectlCluster {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>, context: Option<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            context,
        }
    }

    fn command(&self) -> CommandSpec {
        let spec = CommandSpec::new(&self.binary);
        match &self.context {
            Some(ctx) => spec.args(["--context", ctx.as_str()]),
            None => spec,
        }
    }
}

/// Read the verb kubectl prints after the object reference,
/// e.g. `deployment.apps/vllm configured`.
pub(crate) fn parse_apply_action(stdout: &str) -> Option<ApplyAction> {
    let line = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
    let verb = line.split_whitespace().last()?;
    match verb {
        "created" => Some(ApplyAction::Created),
        "configured" => Some(ApplyAction::Configured),
        "unchanged" => Some(ApplyAction::Unchanged),
        _ => None,
    }
}

fn observe_pod(item: &Value) -> (String, Option<String>, String, bool) {
    let phase = item
        .pointer("/status/phase")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();
    let statuses = item
        .pointer("/status/containerStatuses")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let total = statuses.len();
    let ready = statuses
        .iter()
        .filter(|s| s.get("ready").and_then(Value::as_bool) == Some(true))
        .count();
    let restarts: u64 = statuses
        .iter()
        .filter_map(|s| s.get("restartCount").and_then(Value::as_u64))
        .sum();
    let healthy = phase == "Running" && total > 0 && ready == total;
    (
        phase,
        Some(format!("{}/{}", ready, total)),
        format!("restarts={}", restarts),
        healthy,
    )
}

fn observe_service(item: &Value) -> (String, Option<String>, String, bool) {
    let kind = item
        .pointer("/spec/type")
        .and_then(Value::as_str)
        .unwrap_or("ClusterIP")
        .to_string();
    let ip = item
        .pointer("/spec/clusterIP")
        .and_then(Value::as_str)
        .unwrap_or("<none>");
    let ports: Vec<String> = item
        .pointer("/spec/ports")
        .and_then(Value::as_array)
        .map(|ports| {
            ports
                .iter()
                .filter_map(|p| {
                    let port = p.get("port").and_then(Value::as_u64)?;
                    let proto = p.get("protocol").and_then(Value::as_str).unwrap_or("TCP");
                    Some(format!("{}/{}", port, proto))
                })
                .collect()
        })
        .unwrap_or_default();
    let detail = format!("{} {}", ip, ports.join(","));
    (kind, None, detail.trim().to_string(), ip != "<none>")
}

fn observe_deployment(item: &Value) -> (String, Option<String>, String, bool) {
    let desired = item.pointer("/spec/replicas").and_then(Value::as_u64).unwrap_or(1);
    let ready = item
        .pointer("/status/readyReplicas")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let healthy = ready >= desired;
    let phase = if healthy { "Available" } else { "Progressing" };
    (
        phase.to_string(),
        Some(format!("{}/{}", ready, desired)),
        String::new(),
        healthy,
    )
}

fn observe_other(item: &Value) -> (String, Option<String>, String, bool) {
    let phase = item
        .pointer("/status/phase")
        .and_then(Value::as_str)
        .unwrap_or("Present")
        .to_string();
    let healthy = !matches!(phase.as_str(), "Lost" | "Terminating" | "Failed");
    (phase, None, String::new(), healthy)
}

/// Parse `kubectl get -o json` output into observations.
pub(crate) fn parse_observed(kind: ResourceKind, stdout: &str) -> Result<Vec<ObservedResource>, String> {
    let doc: Value = serde_json::from_str(stdout).map_err(|e| format!("unparseable kubectl output: {}", e))?;
    let items = doc
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| "kubectl output has no 'items' list".to_string())?;

    Ok(items
        .iter()
        .map(|item| {
            let (phase, ready, detail, healthy) = match kind {
                ResourceKind::Pod => observe_pod(item),
                ResourceKind::Service => observe_service(item),
                ResourceKind::Deployment => observe_deployment(item),
                _ => observe_other(item),
            };
            ObservedResource {
                kind,
                namespace: item
                    .pointer("/metadata/namespace")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                name: item
                    .pointer("/metadata/name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                phase,
                ready,
                detail,
                healthy,
            }
        })
        .collect())
}

#[async_trait]
impl ClusterApi for KubectlCluster {
    async fn apply(&self, descriptor: &ResourceDescriptor) -> Result<ApplyAction, BringupError> {
        let target = descriptor.id();
        let manifest = serde_json::to_string(&descriptor.manifest)
            .map_err(|e| BringupError::mutation(&target, format!("cannot encode manifest: {}", e)))?;
        let spec = self.command().args(["apply", "-f", "-"]).stdin(manifest);

        let out = self.runner.run(&spec).await?.into_result(&target)?;
        // Older kubectl releases print nothing for server-side no-ops.
        Ok(parse_apply_action(&out.stdout).unwrap_or(ApplyAction::Configured))
    }

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), BringupError> {
        let target = descriptor.id();
        let mut spec = self
            .command()
            .args(["delete", descriptor.kind.cli_name(), descriptor.name.as_str()]);
        if let Some(ns) = &descriptor.namespace {
            spec = spec.args(["-n", ns.as_str()]);
        }
        spec = spec.arg("--wait=false");

        self.runner.run(&spec).await?.into_result(&target)?;
        Ok(())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: Option<&str>,
    ) -> Result<Vec<ObservedResource>, BringupError> {
        let mut spec = self.command().args(["get", kind.cli_name(), "-n", namespace]);
        if let Some(selector) = selector {
            spec = spec.args(["-l", selector]);
        }
        spec = spec.args(["-o", "json"]);

        let target = format!("{}/{}", kind, namespace);
        let out = self.runner.run(&spec).await?.into_result(&target)?;
        parse_observed(kind, &out.stdout).map_err(|e| BringupError::transient(target, e))
    }
}

#[cfg(test)]
#[path = "kubectl_tests.rs"]
mod tests;

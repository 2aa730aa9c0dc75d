// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Readiness probes: read-only predicates over external state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::compute::RemoteRuntime;
use crate::config::Configuration;
use crate::error::BringupError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::k8s::manifests::{app_selector, MODEL_SERVER};
use crate::k8s::{ClusterApi, ResourceKind};

/// One observation of the condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    Ready(String),
    NotReady(String),
}

/// A condition the poller can evaluate repeatedly.
///
/// `probe` must not mutate anything: it is called again on every attempt.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Human-readable condition, e.g. `2 GPU workers`.
    fn describe(&self) -> String;

    async fn probe(&self) -> Result<ProbeState, BringupError>;
}

/// Runtime reports at least `expected` whole GPUs.
pub struct GpuWorkersProbe {
    runtime: Arc<dyn RemoteRuntime>,
    expected: u32,
}

impl GpuWorkersProbe {
    pub fn new(runtime: Arc<dyn RemoteRuntime>, expected: u32) -> Self {
        Self { runtime, expected }
    }
}

#[async_trait]
impl ReadinessProbe for GpuWorkersProbe {
    fn describe(&self) -> String {
        format!("{} GPU workers", self.expected)
    }

    async fn probe(&self) -> Result<ProbeState, BringupError> {
        let inv = self.runtime.inventory().await?;
        let workers = inv.gpu_workers();
        let detail = format!(
            "{}/{} GPU workers across {} node(s)",
            workers, self.expected, inv.active_nodes
        );
        Ok(if workers >= self.expected {
            ProbeState::Ready(detail)
        } else {
            ProbeState::NotReady(detail)
        })
    }
}

/// HTTP endpoint answers 200, checked with curl.
pub struct HttpHealthProbe {
    runner: Arc<dyn CommandRunner>,
    url: String,
}

impl HttpHealthProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, url: impl Into<String>) -> Self {
        Self {
            runner,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReadinessProbe for HttpHealthProbe {
    fn describe(&self) -> String {
        format!("health endpoint {}", self.url)
    }

    async fn probe(&self) -> Result<ProbeState, BringupError> {
        let spec = CommandSpec::new("curl").args([
            "-s",
            "-o",
            "/dev/null",
            "-w",
            "%{http_code}",
            "--max-time",
            "5",
            self.url.as_str(),
        ]);
        let out = self.runner.run(&spec).await?;
        let status = out.stdout.trim();
        if !out.success() {
            return Ok(ProbeState::NotReady(format!(
                "unreachable (curl exit {})",
                out.code.map_or_else(|| "signal".to_string(), |c| c.to_string())
            )));
        }
        Ok(if status == "200" {
            ProbeState::Ready("HTTP 200".to_string())
        } else {
            ProbeState::NotReady(format!("HTTP {}", status))
        })
    }
}

/// At least `expected` pods matching the selector are running and ready.
pub struct PodsReadyProbe {
    cluster: Arc<dyn ClusterApi>,
    namespace: String,
    selector: String,
    expected: u32,
}

impl PodsReadyProbe {
    pub fn new(cluster: Arc<dyn ClusterApi>, namespace: impl Into<String>, selector: impl Into<String>, expected: u32) -> Self {
        Self {
            cluster,
            namespace: namespace.into(),
            selector: selector.into(),
            expected,
        }
    }
}

#[async_trait]
impl ReadinessProbe for PodsReadyProbe {
    fn describe(&self) -> String {
        format!("{} ready pod(s) matching {}", self.expected, self.selector)
    }

    async fn probe(&self) -> Result<ProbeState, BringupError> {
        let pods = self
            .cluster
            .get(ResourceKind::Pod, &self.namespace, Some(&self.selector))
            .await?;
        let ready = pods.iter().filter(|p| p.healthy).count() as u32;
        let detail = format!("{}/{} pods ready", ready, self.expected);
        Ok(if ready >= self.expected {
            ProbeState::Ready(detail)
        } else {
            ProbeState::NotReady(detail)
        })
    }
}

/// Condition named on the command line. Omitted values come from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionSpec {
    GpuWorkers(Option<u32>),
    ModelHealth(Option<String>),
    Pods(Option<u32>),
}

impl FromStr for ConditionSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((n, v)) => (n.trim(), Some(v.trim())),
            None => (s.trim(), None),
        };
        let count = |v: Option<&str>| -> Result<Option<u32>, String> {
            v.map(|v| v.parse::<u32>().map_err(|_| format!("'{}' is not a count", v)))
                .transpose()
        };
        match name {
            "gpu-workers" => Ok(Self::GpuWorkers(count(value)?)),
            "model-health" => Ok(Self::ModelHealth(value.map(str::to_string))),
            "pods" => Ok(Self::Pods(count(value)?)),
            other => Err(format!(
                "unknown condition '{}', expected gpu-workers[=N], model-health[=URL] or pods[=N]",
                other
            )),
        }
    }
}

impl fmt::Display for ConditionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpuWorkers(None) => f.write_str("gpu-workers"),
            Self::GpuWorkers(Some(n)) => write!(f, "gpu-workers={}", n),
            Self::ModelHealth(None) => f.write_str("model-health"),
            Self::ModelHealth(Some(url)) => write!(f, "model-health={}", url),
            Self::Pods(None) => f.write_str("pods"),
            Self::Pods(Some(n)) => write!(f, "pods={}", n),
        }
    }
}

/// Collaborators a condition may need.
pub struct ProbeDeps {
    pub runner: Arc<dyn CommandRunner>,
    pub cluster: Arc<dyn ClusterApi>,
    pub runtime: Arc<dyn RemoteRuntime>,
}

impl ConditionSpec {
    pub fn build(&self, config: &Configuration, deps: &ProbeDeps) -> Box<dyn ReadinessProbe> {
        match self {
            Self::GpuWorkers(n) => Box::new(GpuWorkersProbe::new(
                deps.runtime.clone(),
                n.unwrap_or(config.runtime.expected_gpu_workers),
            )),
            Self::ModelHealth(url) => Box::new(HttpHealthProbe::new(
                deps.runner.clone(),
                url.clone().unwrap_or_else(|| config.runtime.health_url.clone()),
            )),
            Self::Pods(n) => Box::new(PodsReadyProbe::new(
                deps.cluster.clone(),
                config.cluster.namespace.clone(),
                app_selector(MODEL_SERVER),
                n.unwrap_or(config.serving.replicas),
            )),
        }
    }
}

#[cfg(test)]
#[path = "probes_tests.rs"]
mod tests;

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Point-in-time status snapshot.
//!
//! Every query is bounded by the status timeout. Missing data becomes
//! [`Observed::Unknown`] with a reason; collecting a snapshot never fails.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::compute::{RemoteRuntime, RuntimeInventory};
use crate::config::Configuration;
use crate::error::BringupError;
use crate::k8s::{ClusterApi, ObservedResource, ResourceKind};
use crate::network::{HostNetwork, LinkInfo};

/// A value that was either observed or could not be determined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum Observed<T> {
    Known(T),
    Unknown(String),
}

impl<T> Observed<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Healthy => write!(f, "healthy"),
            HealthState::Degraded => write!(f, "degraded"),
            HealthState::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub health: HealthState,
    pub captured_at: String,
    pub namespace: String,
    pub pods: Observed<Vec<ObservedResource>>,
    pub deployments: Observed<Vec<ObservedResource>>,
    pub services: Observed<Vec<ObservedResource>>,
    /// Candidate fabric interfaces that exist on this host.
    pub fabric: Observed<Vec<LinkInfo>>,
    pub runtime: Observed<RuntimeInventory>,
    pub serving: Observed<bool>,
    pub log_tail: Observed<Vec<String>>,
}

/// Read-only collaborators the snapshot queries.
pub struct StatusSources<'a> {
    pub cluster: &'a dyn ClusterApi,
    pub host: &'a dyn HostNetwork,
    pub runtime: &'a dyn RemoteRuntime,
}

async fn bounded<T, F>(limit: Duration, query: F) -> Observed<T>
where
    F: Future<Output = Result<T, BringupError>>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(Ok(value)) => Observed::Known(value),
        Ok(Err(e)) => Observed::Unknown(e.to_string()),
        Err(_) => Observed::Unknown(format!("no answer within {}s", limit.as_secs())),
    }
}

async fn fabric_links(host: &dyn HostNetwork, candidates: &[String]) -> Result<Vec<LinkInfo>, BringupError> {
    let present = host.interfaces().await?;
    let mut links = Vec::new();
    for name in candidates.iter().filter(|c| present.contains(c)) {
        links.push(host.link_info(name).await?);
    }
    Ok(links)
}

fn derive_health(report: &StatusReport) -> HealthState {
    let pods = match report.pods.known() {
        Some(pods) => pods,
        None => return HealthState::Degraded,
    };
    if pods.is_empty() || pods.iter().all(|p| !p.healthy) {
        return HealthState::Unhealthy;
    }
    let fabric_down = report
        .fabric
        .known()
        .map(|links| !links.iter().any(|l| l.carrier == Some(true)))
        .unwrap_or(false);
    let deployments_short = report
        .deployments
        .known()
        .map(|ds| ds.iter().any(|d| !d.healthy))
        .unwrap_or(false);
    let anything_unknown = report.deployments.is_unknown()
        || report.services.is_unknown()
        || report.fabric.is_unknown()
        || report.runtime.is_unknown();

    if pods.iter().any(|p| !p.healthy) || fabric_down || deployments_short || anything_unknown {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    }
}

/// Collect a snapshot, taking at most `status_timeout` per query.
pub async fn collect(config: &Configuration, sources: &StatusSources<'_>, log_lines: usize) -> StatusReport {
    let limit = config.readiness.status_timeout;
    let ns = config.cluster.namespace.as_str();

    let (pods, deployments, services, fabric, runtime, serving, log_tail) = tokio::join!(
        bounded(limit, sources.cluster.get(ResourceKind::Pod, ns, None)),
        bounded(limit, sources.cluster.get(ResourceKind::Deployment, ns, None)),
        bounded(limit, sources.cluster.get(ResourceKind::Service, ns, None)),
        bounded(limit, fabric_links(sources.host, &config.fabric.interfaces)),
        bounded(limit, sources.runtime.inventory()),
        bounded(limit, sources.runtime.is_serving()),
        bounded(limit, sources.runtime.tail_output(log_lines)),
    );

    let mut report = StatusReport {
        health: HealthState::Unhealthy,
        captured_at: chrono::Utc::now().to_rfc3339(),
        namespace: ns.to_string(),
        pods,
        deployments,
        services,
        fabric,
        runtime,
        serving,
        log_tail,
    };
    report.health = derive_health(&report);
    report
}

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for the status projection.

use async_trait::async_trait;

use super::format::*;
use super::*;
use crate::compute::{RemoteRuntime, RuntimeInventory, ServeOutcome, ServeParams};
use crate::error::BringupError;
use crate::k8s::{ObservedResource, ResourceKind};
use crate::testkit::{configuration, inventory, FakeCluster, FakeNetwork, FakeRuntime};

/// Runtime whose queries never answer.
struct StuckRuntime;

#[async_trait]
impl RemoteRuntime for StuckRuntime {
    async fn inventory(&self) -> Result<RuntimeInventory, BringupError> {
        std::future::pending().await
    }

    async fn start_serving(&self, _params: &ServeParams) -> Result<ServeOutcome, BringupError> {
        std::future::pending().await
    }

    async fn is_serving(&self) -> Result<bool, BringupError> {
        std::future::pending().await
    }

    async fn tail_output(&self, _lines: usize) -> Result<Vec<String>, BringupError> {
        std::future::pending().await
    }
}

fn pod(name: &str, healthy: bool) -> ObservedResource {
    ObservedResource {
        kind: ResourceKind::Pod,
        namespace: Some("llm-serving".to_string()),
        name: name.to_string(),
        phase: if healthy { "Running" } else { "CrashLoopBackOff" }.to_string(),
        ready: Some(if healthy { "1/1" } else { "0/1" }.to_string()),
        detail: "restarts=0".to_string(),
        healthy,
    }
}

fn host() -> FakeNetwork {
    FakeNetwork::new().with_link("enp1s0f1np1", true).with_link("eno1", true)
}

#[tokio::test]
async fn test_healthy_snapshot() {
    let config = configuration(&[]);
    let cluster = FakeCluster::new();
    cluster.set_observed(ResourceKind::Pod, vec![pod("vllm-7d9f", true)]);
    let network = host();
    let runtime = FakeRuntime::new()
        .with_inventories(vec![Ok(inventory(2, 2))])
        .serving(true)
        .with_output(&["INFO loading", "INFO Application startup complete."]);
    let sources = StatusSources {
        cluster: &cluster,
        host: &network,
        runtime: &runtime,
    };

    let report = collect(&config, &sources, 1).await;
    assert_eq!(report.health, HealthState::Healthy);
    assert_eq!(report.pods.known().unwrap().len(), 1);
    let links = report.fabric.known().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].interface, "enp1s0f1np1");
    assert_eq!(report.serving, Observed::Known(true));
    assert_eq!(
        report.log_tail,
        Observed::Known(vec!["INFO Application startup complete.".to_string()])
    );
}

#[tokio::test(start_paused = true)]
async fn test_stuck_runtime_reported_unknown_within_timeout() {
    let config = configuration(&[("STATUS_TIMEOUT_SECS", "3")]);
    let cluster = FakeCluster::new();
    cluster.set_observed(ResourceKind::Pod, vec![pod("vllm-7d9f", true)]);
    let network = host();
    let started = tokio::time::Instant::now();

    let report = collect(
        &config,
        &StatusSources {
            cluster: &cluster,
            host: &network,
            runtime: &StuckRuntime,
        },
        20,
    )
    .await;

    assert_eq!(started.elapsed(), std::time::Duration::from_secs(3));
    assert_eq!(report.runtime, Observed::Unknown("no answer within 3s".to_string()));
    assert!(report.serving.is_unknown());
    assert!(report.log_tail.is_unknown());
    assert_eq!(report.health, HealthState::Degraded);
}

#[tokio::test]
async fn test_cluster_errors_become_unknown() {
    let config = configuration(&[]);
    let cluster = FakeCluster::new();
    cluster.fail_get(
        ResourceKind::Pod,
        BringupError::transient("kubectl", "connection refused"),
    );
    let network = FakeNetwork::new();
    let runtime = FakeRuntime::new().with_inventories(vec![Ok(inventory(1, 1))]);
    let report = collect(
        &config,
        &StatusSources {
            cluster: &cluster,
            host: &network,
            runtime: &runtime,
        },
        5,
    )
    .await;

    assert!(matches!(&report.pods, Observed::Unknown(r) if r.contains("connection refused")));
    assert_eq!(report.fabric, Observed::Known(vec![]));
    assert_eq!(report.health, HealthState::Degraded);
}

#[tokio::test]
async fn test_no_ready_pods_is_unhealthy() {
    let config = configuration(&[]);
    let cluster = FakeCluster::new();
    cluster.set_observed(ResourceKind::Pod, vec![pod("vllm-7d9f", false)]);
    let network = host();
    let runtime = FakeRuntime::new().with_inventories(vec![Ok(inventory(2, 2))]);
    let report = collect(
        &config,
        &StatusSources {
            cluster: &cluster,
            host: &network,
            runtime: &runtime,
        },
        5,
    )
    .await;
    assert_eq!(report.health, HealthState::Unhealthy);

    let text = render_status(&report);
    assert!(text.contains("Health: X unhealthy"));
    assert!(text.contains("vllm-7d9f"));
    assert!(text.contains("CrashLoop..."));
}

#[test]
fn test_status_serializes_unknown_with_reason() {
    let observed: Observed<bool> = Observed::Unknown("no answer within 5s".to_string());
    let json = serde_json::to_value(&observed).unwrap();
    assert_eq!(json["state"], "unknown");
    assert_eq!(json["value"], "no answer within 5s");
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(0), "0s");
    assert_eq!(format_duration(55), "55s");
    assert_eq!(format_duration(60), "1m 0s");
    assert_eq!(format_duration(305), "5m 5s");
    assert_eq!(format_duration(3661), "1h 1m");
}

#[test]
fn test_format_speed() {
    assert_eq!(format_speed(100), "100 Mb/s");
    assert_eq!(format_speed(200_000), "200 Gb/s");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("this is a very long string", 10), "this is...");
}

#[test]
fn test_health_state_display() {
    assert_eq!(format!("{}", HealthState::Healthy), "healthy");
    assert_eq!(format!("{}", HealthState::Degraded), "degraded");
    assert_eq!(format!("{}", HealthState::Unhealthy), "unhealthy");
}

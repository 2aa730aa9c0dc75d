// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Apply/delete ordering and idempotence across every profile.

use gg_bringup::error::BringupError;
use gg_bringup::k8s::{DeploymentProfile, ProfileKind};
use gg_bringup::lifecycle::{FailurePolicy, Orchestrator, ResourceStatus};
use gg_bringup::testkit::{configuration, FakeCluster};

fn full_config() -> gg_bringup::Configuration {
    configuration(&[
        ("HF_TOKEN", "hf_abc"),
        ("MONITORING_ENABLED", "true"),
        ("AGENTS_ENABLED", "true"),
    ])
}

// ============================================================================
// Symmetry
// ============================================================================

#[tokio::test]
async fn teardown_reverses_apply_for_every_profile() {
    let config = full_config();
    for kind in [ProfileKind::Serving, ProfileKind::Monitoring, ProfileKind::Agents, ProfileKind::All] {
        let profile = DeploymentProfile::build(&config, kind).unwrap();
        let cluster = FakeCluster::new();
        let orchestrator = Orchestrator::new(&cluster);

        orchestrator.apply(&profile, FailurePolicy::AbortOnFailure).await;
        orchestrator.delete(&profile, FailurePolicy::ContinueOnError).await;

        let ops = cluster.operations();
        let (applies, deletes) = ops.split_at(profile.len());
        let applied: Vec<&str> = applies.iter().map(|op| op.trim_start_matches("apply ")).collect();
        let mut deleted: Vec<&str> = deletes.iter().map(|op| op.trim_start_matches("delete ")).collect();
        deleted.reverse();
        assert_eq!(applied, deleted, "profile {}", kind);
        assert!(cluster.object_ids().is_empty(), "profile {}", kind);
    }
}

#[tokio::test]
async fn teardown_of_full_stack_starts_with_agents() {
    let profile = DeploymentProfile::build(&full_config(), ProfileKind::All).unwrap();
    assert_eq!(profile.len(), 11);
    let cluster = FakeCluster::new();
    let orchestrator = Orchestrator::new(&cluster);
    orchestrator.apply(&profile, FailurePolicy::AbortOnFailure).await;

    let report = orchestrator.delete(&profile, FailurePolicy::ContinueOnError).await;

    assert_eq!(report.outcomes[0].resource, "service/llm-serving/agent-gateway");
    assert_eq!(report.outcomes[10].resource, "namespace/llm-serving");
}

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn teardown_repeated_is_success() {
    let profile = DeploymentProfile::build(&full_config(), ProfileKind::Serving).unwrap();
    let cluster = FakeCluster::new();
    let orchestrator = Orchestrator::new(&cluster);

    for _ in 0..3 {
        let report = orchestrator.delete(&profile, FailurePolicy::ContinueOnError).await;
        assert!(report.success());
        assert!(report.outcomes.iter().all(|o| o.status == ResourceStatus::AlreadyAbsent));
    }
}

#[tokio::test]
async fn teardown_after_partial_apply() {
    let profile = DeploymentProfile::build(&full_config(), ProfileKind::Serving).unwrap();
    let cluster = FakeCluster::new();
    cluster.fail_apply(
        "deployment/llm-serving/vllm",
        BringupError::mutation("deployment/llm-serving/vllm", "image pull secret missing"),
    );
    let orchestrator = Orchestrator::new(&cluster);
    let applied = orchestrator.apply(&profile, FailurePolicy::AbortOnFailure).await;
    assert!(!applied.success());
    assert_eq!(cluster.object_ids().len(), 3);

    let report = orchestrator.delete(&profile, FailurePolicy::ContinueOnError).await;

    assert!(report.success());
    let statuses: Vec<String> = report.outcomes.iter().map(|o| o.status.label()).collect();
    assert_eq!(
        statuses,
        vec!["already absent", "already absent", "deleted", "deleted", "deleted"]
    );
}

#[tokio::test]
async fn reapply_after_teardown_recreates() {
    let profile = DeploymentProfile::build(&full_config(), ProfileKind::Monitoring).unwrap();
    let cluster = FakeCluster::new();
    let orchestrator = Orchestrator::new(&cluster);

    orchestrator.apply(&profile, FailurePolicy::AbortOnFailure).await;
    orchestrator.delete(&profile, FailurePolicy::ContinueOnError).await;
    let again = orchestrator.apply(&profile, FailurePolicy::AbortOnFailure).await;

    assert!(again
        .outcomes
        .iter()
        .all(|o| o.status.label() == "created"));
}

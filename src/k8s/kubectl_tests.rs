// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use super::*;
use crate::exec::CommandOutput;
use crate::k8s::manifests;
use crate::testkit::{configuration, ScriptedRunner};

fn cluster(runner: &Arc<ScriptedRunner>, context: Option<&str>) -> KubectlCluster {
    KubectlCluster::new(runner.clone(), "kubectl", context.map(str::to_string))
}

#[test]
fn test_parse_apply_action() {
    assert_eq!(parse_apply_action("namespace/llm-serving created\n"), Some(ApplyAction::Created));
    assert_eq!(
        parse_apply_action("deployment.apps/vllm configured"),
        Some(ApplyAction::Configured)
    );
    assert_eq!(parse_apply_action("secret/hf-token unchanged\n\n"), Some(ApplyAction::Unchanged));
    assert_eq!(parse_apply_action(""), None);
}

#[tokio::test]
async fn test_apply_pipes_manifest_on_stdin() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on("kubectl apply", CommandOutput::ok("secret/hf-token created\n"));
    let config = configuration(&[("HF_TOKEN", "hf_abc")]);
    let secret = manifests::token_secret(&config);

    let action = cluster(&runner, None).apply(&secret).await.unwrap();
    assert_eq!(action, ApplyAction::Created);

    let calls = runner.specs();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].display(), "kubectl apply -f -");
    let stdin = calls[0].stdin.as_deref().unwrap();
    assert!(stdin.contains("\"kind\":\"Secret\""));
    assert!(!calls[0].display().contains("hf_abc"));
}

#[tokio::test]
async fn test_apply_uses_context_when_configured() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on("apply", CommandOutput::ok("namespace/llm-serving unchanged"));
    let ns = manifests::namespace("llm-serving");
    let action = cluster(&runner, Some("spark")).apply(&ns).await.unwrap();
    assert_eq!(action, ApplyAction::Unchanged);
    assert_eq!(runner.calls()[0], "kubectl --context spark apply -f -");
}

#[tokio::test]
async fn test_apply_failure_is_classified() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on(
        "kubectl apply",
        CommandOutput::failed(1, "Error from server (Forbidden): namespaces is forbidden"),
    );
    let err = cluster(&runner, None)
        .apply(&manifests::namespace("llm-serving"))
        .await
        .unwrap_err();
    assert!(matches!(err, BringupError::PermissionDenied { .. }));
    assert!(err.to_string().contains("namespace/llm-serving"));
}

#[tokio::test]
async fn test_delete_namespaced_and_not_found() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on(
        "kubectl delete service vllm",
        CommandOutput::failed(1, "Error from server (NotFound): services \"vllm\" not found"),
    );
    let config = configuration(&[]);
    let service = manifests::model_server_service(&config);
    let err = cluster(&runner, None).delete(&service).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        runner.calls()[0],
        "kubectl delete service vllm -n llm-serving --wait=false"
    );
}

#[tokio::test]
async fn test_delete_cluster_scoped_has_no_namespace_flag() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on("kubectl delete", CommandOutput::ok("namespace \"monitoring\" deleted"));
    cluster(&runner, None)
        .delete(&manifests::namespace("monitoring"))
        .await
        .unwrap();
    assert_eq!(runner.calls()[0], "kubectl delete namespace monitoring --wait=false");
}

const PODS_JSON: &str = r#"{
  "items": [
    {
      "metadata": {"name": "vllm-7d9f", "namespace": "llm-serving"},
      "status": {
        "phase": "Running",
        "containerStatuses": [{"ready": true, "restartCount": 2}]
      }
    },
    {
      "metadata": {"name": "vllm-8a1c", "namespace": "llm-serving"},
      "status": {"phase": "Pending"}
    }
  ]
}"#;

#[tokio::test]
async fn test_get_pods_parses_readiness() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on("kubectl get pod", CommandOutput::ok(PODS_JSON));
    let pods = cluster(&runner, None)
        .get(ResourceKind::Pod, "llm-serving", Some("app.kubernetes.io/name=vllm"))
        .await
        .unwrap();
    assert_eq!(pods.len(), 2);
    assert_eq!(pods[0].name, "vllm-7d9f");
    assert_eq!(pods[0].ready.as_deref(), Some("1/1"));
    assert_eq!(pods[0].detail, "restarts=2");
    assert!(pods[0].healthy);
    assert_eq!(pods[1].phase, "Pending");
    assert!(!pods[1].healthy);
    assert_eq!(
        runner.calls()[0],
        "kubectl get pod -n llm-serving -l app.kubernetes.io/name=vllm -o json"
    );
}

#[test]
fn test_parse_services_and_deployments() {
    let services = parse_observed(
        ResourceKind::Service,
        r#"{"items":[{"metadata":{"name":"vllm","namespace":"llm-serving"},
            "spec":{"type":"ClusterIP","clusterIP":"10.43.0.12","ports":[{"port":8000,"protocol":"TCP"}]}}]}"#,
    )
    .unwrap();
    assert_eq!(services[0].phase, "ClusterIP");
    assert_eq!(services[0].detail, "10.43.0.12 8000/TCP");
    assert!(services[0].healthy);

    let deployments = parse_observed(
        ResourceKind::Deployment,
        r#"{"items":[{"metadata":{"name":"vllm"},"spec":{"replicas":2},"status":{"readyReplicas":1}}]}"#,
    )
    .unwrap();
    assert_eq!(deployments[0].ready.as_deref(), Some("1/2"));
    assert_eq!(deployments[0].phase, "Progressing");
    assert!(!deployments[0].healthy);
}

#[tokio::test]
async fn test_get_garbage_output_is_transient() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on("kubectl get", CommandOutput::ok("<html>proxy error</html>"));
    let err = cluster(&runner, None)
        .get(ResourceKind::Service, "llm-serving", None)
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

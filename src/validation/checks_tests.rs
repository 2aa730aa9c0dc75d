// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::exec::CommandOutput;
use crate::testkit::{configuration, FakeNetwork, ScriptedRunner};
use crate::validation::gate::{run_all, CheckStatus};

fn deps(runner: Arc<ScriptedRunner>, host: FakeNetwork) -> CheckDeps {
    CheckDeps {
        runner,
        host: Arc::new(host),
    }
}

fn healthy_runner() -> Arc<ScriptedRunner> {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .on("command -v", CommandOutput::ok("/usr/bin/tool\n"))
        .on("ping", CommandOutput::ok("1 received"))
        .on("nvidia-smi", CommandOutput::ok("GPU 0: NVIDIA GB10 (UUID: GPU-1)\n"));
    runner
}

#[test]
fn test_scope_filters_checks() {
    let config = configuration(&[]);
    let deps = deps(healthy_runner(), FakeNetwork::new());

    let tools = standard_checks(&config, &deps, ValidationScope::Tools);
    let names: Vec<String> = tools.iter().map(|c| c.name()).collect();
    assert_eq!(
        names,
        vec!["tool:kubectl", "tool:ip", "tool:curl", "tool:nmcli", "tool:docker"]
    );

    let all = standard_checks(&config, &deps, ValidationScope::All);
    assert_eq!(all.len(), 2 + 5 + 1 + 1 + 1 + 1);
}

#[test]
fn test_nmcli_only_checked_when_persisting() {
    let config = configuration(&[("FABRIC_PERSIST", "false")]);
    let deps = deps(healthy_runner(), FakeNetwork::new());
    let names: Vec<String> = standard_checks(&config, &deps, ValidationScope::Tools)
        .iter()
        .map(|c| c.name())
        .collect();
    assert!(!names.contains(&"tool:nmcli".to_string()));
}

#[tokio::test]
async fn test_missing_required_tool_fails_gate() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .on("sh kubectl", CommandOutput::failed(1, ""))
        .on("command -v", CommandOutput::ok("/usr/bin/x"));
    let config = configuration(&[]);
    let deps = deps(runner, FakeNetwork::new());

    let report = run_all(&standard_checks(&config, &deps, ValidationScope::Tools)).await;
    assert!(!report.passed);
    let blocking: Vec<&str> = report.blocking().map(|e| e.check.as_str()).collect();
    assert_eq!(blocking, vec!["tool:kubectl"]);
}

#[tokio::test]
async fn test_missing_optional_tool_degrades() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .on("sh docker", CommandOutput::failed(1, ""))
        .on("command -v", CommandOutput::ok("/usr/bin/x"));
    let config = configuration(&[]);
    let deps = deps(runner, FakeNetwork::new());

    let report = run_all(&standard_checks(&config, &deps, ValidationScope::Tools)).await;
    assert!(report.passed);
    assert_eq!(report.count(CheckStatus::Degraded), 1);
}

#[tokio::test]
async fn test_fabric_interface_presence() {
    let config = configuration(&[("FABRIC_INTERFACES", "ib0,enp1s0f1np1")]);
    let present = deps(healthy_runner(), FakeNetwork::new().with_link("enp1s0f1np1", false));
    let report = run_all(&standard_checks(&config, &present, ValidationScope::Network)).await;
    assert_eq!(report.entries[0].status, CheckStatus::Pass);
    assert!(report.entries[0].detail.contains("enp1s0f1np1"));

    let absent = deps(healthy_runner(), FakeNetwork::new().with_link("eth0", true));
    let report = run_all(&standard_checks(&config, &absent, ValidationScope::Network)).await;
    assert!(!report.passed);
    assert!(report.entries[0].detail.contains("ib0, enp1s0f1np1"));
}

#[tokio::test]
async fn test_peer_check_only_registered_when_configured() {
    let unset = configuration(&[]);
    let d = deps(healthy_runner(), FakeNetwork::new().with_link("enp1s0f0np0", true));
    let report = run_all(&standard_checks(&unset, &d, ValidationScope::Network)).await;
    let names: Vec<&str> = report.entries.iter().map(|e| e.check.as_str()).collect();
    assert_eq!(names, vec!["fabric-interface"]);
    assert_eq!(report.warnings().count(), 0);

    let runner = Arc::new(ScriptedRunner::new());
    runner.on("ping", CommandOutput::failed(1, "100% packet loss"));
    let set = configuration(&[("PEER_ADDRESS", "192.168.100.11")]);
    let d = deps(runner.clone(), FakeNetwork::new().with_link("enp1s0f0np0", true));
    let report = run_all(&standard_checks(&set, &d, ValidationScope::Network)).await;
    assert_eq!(report.entries[1].check, "peer-reachable");
    assert_eq!(report.entries[1].status, CheckStatus::Fail);
    assert!(report.passed);
    assert!(runner.calls().contains(&"ping -c 1 -W 2 192.168.100.11".to_string()));
}

#[tokio::test]
async fn test_tool_name_is_passed_as_argument() {
    let runner = healthy_runner();
    let config = configuration(&[("KUBECTL", "true; touch /tmp/bringup-marker")]);
    let d = deps(runner.clone(), FakeNetwork::new());

    run_all(&standard_checks(&config, &d, ValidationScope::Tools)).await;

    let lookup = runner
        .calls()
        .into_iter()
        .find(|c| c.ends_with("true; touch /tmp/bringup-marker"))
        .unwrap();
    assert_eq!(lookup, "sh -c command -v \"$1\" sh true; touch /tmp/bringup-marker");

    let report = run_all(&standard_checks(&config, &d, ValidationScope::Config)).await;
    assert!(!report.passed);
    assert!(report.entries[0].detail.contains("KUBECTL"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_tool_lookup_never_runs_injected_commands() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let tool = format!("true; touch {}", marker.display());
    let check = ToolAvailable {
        runner: Arc::new(crate::exec::SystemRunner::new(std::time::Duration::from_secs(5))),
        tool,
        required: true,
    };

    let outcome = check.run().await;

    assert_eq!(outcome.status, CheckStatus::Fail);
    assert!(!marker.exists());
}

#[test]
fn test_existing_ancestor_walks_up() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("a/b/c");
    assert_eq!(existing_ancestor(&missing), Some(dir.path()));
}

#[cfg(unix)]
#[tokio::test]
async fn test_cache_free_space_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("not-yet-created");

    let roomy = CacheFreeSpace {
        path: cache.clone(),
        min_gb: 0,
    };
    let outcome = roomy.run().await;
    assert_eq!(outcome.status, CheckStatus::Pass);
    assert!(outcome.detail.contains(&dir.path().display().to_string()));

    let greedy = CacheFreeSpace {
        path: cache,
        min_gb: u64::MAX / GIB,
    };
    assert_eq!(greedy.run().await.status, CheckStatus::Fail);
}

#[tokio::test]
async fn test_manifest_syntax_reports_bad_extra_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "kind: [unterminated").unwrap();
    let config = configuration(&[("EXTRA_MANIFESTS", path.to_str().unwrap())]);

    let outcome = ManifestSyntax { config }.run().await;
    assert_eq!(outcome.status, CheckStatus::Fail);

    let ok = ManifestSyntax {
        config: configuration(&[]),
    }
    .run()
    .await;
    assert_eq!(ok.status, CheckStatus::Pass);
    assert_eq!(ok.detail, "5 resource(s) rendered");
}

#[tokio::test]
async fn test_token_presence_degrades_for_gated_model() {
    let d = deps(healthy_runner(), FakeNetwork::new());
    let report = run_all(&standard_checks(&configuration(&[]), &d, ValidationScope::Config)).await;
    let token = &report.entries[1];
    assert_eq!(token.check, "hf-token");
    assert_eq!(token.status, CheckStatus::Degraded);
    assert!(token.detail.contains("gated"));
    assert!(report.passed);
}

#[tokio::test]
async fn test_config_issues_fail_gate() {
    let config = configuration(&[("GPU_MEMORY_UTILIZATION", "1.5")]);
    let d = deps(healthy_runner(), FakeNetwork::new());
    let report = run_all(&standard_checks(&config, &d, ValidationScope::Config)).await;
    assert!(!report.passed);
    assert!(report.entries[0].detail.contains("GPU_MEMORY_UTILIZATION"));
}

#[tokio::test]
async fn test_gpu_presence() {
    let d = deps(healthy_runner(), FakeNetwork::new());
    let report = run_all(&standard_checks(&configuration(&[]), &d, ValidationScope::Hardware)).await;
    assert_eq!(report.entries[0].detail, "1 GPU(s) visible");

    let missing = deps(Arc::new(ScriptedRunner::new()), FakeNetwork::new());
    let report = run_all(&standard_checks(&configuration(&[]), &missing, ValidationScope::Hardware)).await;
    assert_eq!(report.entries[0].status, CheckStatus::Degraded);
    assert!(report.passed);
}

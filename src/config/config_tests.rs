// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for configuration loading and validation.

use std::ffi::OsString;
use std::io::Write;

use super::loader::{environment_pairs, merge, read_file};
use super::*;

fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_defaults_apply_for_empty_input() {
    let config = Configuration::from_pairs(&BTreeMap::new()).unwrap();
    assert_eq!(config.cluster.namespace, "llm-serving");
    assert_eq!(config.serving.model, ModelProfile::Llama31Instruct8B);
    assert_eq!(config.serving.max_model_len, 32768);
    assert_eq!(config.serving.tensor_parallel_size, 2);
    assert!((config.serving.gpu_memory_utilization - 0.90).abs() < f64::EPSILON);
    assert!(config.serving.hf_token.is_none());
    assert_eq!(config.fabric.interfaces.len(), 4);
    assert_eq!(config.fabric.address.to_string(), "192.168.100.10/24");
    assert_eq!(config.readiness.max_attempts, 60);
    assert_eq!(config.readiness.delay, Duration::from_secs(5));
    assert!(!config.subsystems.monitoring_enabled);
    assert!(!config.strict);
    assert!(config.issues().is_empty(), "{:?}", config.issues());
}

#[test]
fn test_explicit_values_override_defaults() {
    let config = Configuration::from_pairs(&pairs(&[
        ("MODEL", "qwen2.5-72b-instruct"),
        ("MAX_MODEL_LEN", "4096"),
        ("HF_TOKEN", "hf_abc"),
        ("FABRIC_INTERFACES", "eth0, eth1"),
        ("MONITORING_ENABLED", "yes"),
        ("READY_DELAY_SECS", "2"),
    ]))
    .unwrap();
    assert_eq!(config.serving.model, ModelProfile::Qwen25Instruct72B);
    assert_eq!(config.serving.max_model_len, 4096);
    assert_eq!(config.serving.hf_token.as_deref(), Some("hf_abc"));
    assert_eq!(config.fabric.interfaces, vec!["eth0", "eth1"]);
    assert!(config.subsystems.monitoring_enabled);
    assert_eq!(config.readiness.delay, Duration::from_secs(2));
}

#[test]
fn test_empty_value_counts_as_unset() {
    let config = Configuration::from_pairs(&pairs(&[("HF_TOKEN", "  "), ("NAMESPACE", "")])).unwrap();
    assert!(config.serving.hf_token.is_none());
    assert_eq!(config.cluster.namespace, "llm-serving");
}

#[test]
fn test_all_malformed_values_reported_together() {
    let err = Configuration::from_pairs(&pairs(&[
        ("REPLICAS", "three"),
        ("GPU_MEMORY_UTILIZATION", "most"),
        ("MODEL", "gpt-5"),
        ("FABRIC_PERSIST", "maybe"),
    ]))
    .unwrap_err();
    assert_eq!(err.issues.len(), 4);
    let keys: Vec<String> = err
        .issues
        .iter()
        .map(|e| match e {
            BringupError::ConfigurationInvalid { key, .. } => key.clone(),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert!(keys.contains(&"REPLICAS".to_string()));
    assert!(keys.contains(&"MODEL".to_string()));
    assert!(err.to_string().contains("4 configuration issue(s)"));
}

#[test]
fn test_semantic_issues_name_the_key() {
    let config = Configuration::from_pairs(&pairs(&[
        ("GPU_MEMORY_UTILIZATION", "1.5"),
        ("TENSOR_PARALLEL_SIZE", "4"),
        ("NAMESPACE", "LLM_Serving"),
    ]))
    .unwrap();
    let issues = config.issues();
    let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
    assert!(rendered.iter().any(|m| m.contains("GPU_MEMORY_UTILIZATION")));
    assert!(rendered.iter().any(|m| m.contains("exceeds EXPECTED_GPU_WORKERS=2")));
    assert!(rendered.iter().any(|m| m.contains("NAMESPACE")));
}

#[test]
fn test_model_minimum_gpus_enforced() {
    let config = Configuration::from_pairs(&pairs(&[
        ("MODEL", "llama-3.1-70b-instruct"),
        ("TENSOR_PARALLEL_SIZE", "1"),
    ]))
    .unwrap();
    assert!(config
        .issues()
        .iter()
        .any(|e| e.to_string().contains("needs at least 2 GPUs")));
}

#[test]
fn test_model_accepts_hf_identifier() {
    let model: ModelProfile = "Qwen/Qwen2.5-Coder-32B-Instruct".parse().unwrap();
    assert_eq!(model, ModelProfile::Qwen25CoderInstruct32B);
    assert!("mystery-model".parse::<ModelProfile>().is_err());
}

#[test]
fn test_read_env_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# cluster settings").unwrap();
    writeln!(file, "NAMESPACE=inference").unwrap();
    writeln!(file, "hf_token=\"hf_abc\"").unwrap();
    let read = read_file(file.path()).unwrap();
    assert_eq!(read.get("NAMESPACE").map(String::as_str), Some("inference"));
    assert_eq!(read.get("HF_TOKEN").map(String::as_str), Some("hf_abc"));
}

#[test]
fn test_read_toml_file_flattens_scalars() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bringup.toml");
    std::fs::write(
        &path,
        "namespace = \"inference\"\nreplicas = 2\nstrict = true\nfabric_interfaces = [\"eth0\", \"eth1\"]\n",
    )
    .unwrap();
    let read = read_file(&path).unwrap();
    assert_eq!(read.get("REPLICAS").map(String::as_str), Some("2"));
    assert_eq!(read.get("STRICT").map(String::as_str), Some("true"));
    assert_eq!(read.get("FABRIC_INTERFACES").map(String::as_str), Some("eth0,eth1"));
}

#[test]
fn test_read_toml_rejects_nested_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bringup.toml");
    std::fs::write(&path, "[serving]\nreplicas = 2\n").unwrap();
    let err = read_file(&path).unwrap_err();
    assert!(matches!(err, BringupError::ConfigurationInvalid { .. }));
}

#[test]
fn test_missing_file_is_configuration_invalid() {
    let err = read_file(std::path::Path::new("/nonexistent/bringup.env")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/bringup.env"));
}

#[test]
fn test_environment_filtered_to_known_keys_and_merge_order() {
    let env = environment_pairs(vec![
        (OsString::from("HOME"), OsString::from("/root")),
        (OsString::from("NAMESPACE"), OsString::from("from-env")),
    ]);
    assert_eq!(env.len(), 1);
    let merged = merge([pairs(&[("NAMESPACE", "from-file"), ("REPLICAS", "2")]), env]);
    assert_eq!(merged.get("NAMESPACE").map(String::as_str), Some("from-env"));
    assert_eq!(merged.get("REPLICAS").map(String::as_str), Some("2"));
}

#[cfg(unix)]
#[test]
fn test_environment_skips_non_utf8_entries() {
    use std::os::unix::ffi::OsStringExt;

    let env = environment_pairs(vec![
        (OsString::from("UNRELATED"), OsString::from_vec(b"f\xffo".to_vec())),
        (OsString::from_vec(b"BAD\xffKEY".to_vec()), OsString::from("x")),
        (OsString::from("MODEL"), OsString::from_vec(b"\xfe".to_vec())),
        (OsString::from("REPLICAS"), OsString::from("3")),
    ]);
    assert_eq!(env, pairs(&[("REPLICAS", "3")]));
}

#[test]
fn test_kubectl_with_shell_syntax_is_an_issue() {
    let config = Configuration::from_pairs(&pairs(&[("KUBECTL", "true; touch /tmp/bringup-marker")])).unwrap();
    let rendered: Vec<String> = config.issues().iter().map(ToString::to_string).collect();
    assert!(rendered.iter().any(|m| m.contains("KUBECTL")), "{:?}", rendered);

    let config = Configuration::from_pairs(&pairs(&[("KUBECTL", "/usr/local/bin/kubectl")])).unwrap();
    assert!(config.issues().is_empty());
}

#[test]
fn test_effective_pairs_redact_token() {
    let shown = Configuration::effective_pairs(&pairs(&[("HF_TOKEN", "hf_secret")]));
    let token = shown.iter().find(|(k, _)| k == "HF_TOKEN").unwrap();
    assert_eq!(token.1, "<set>");
    let peer = shown.iter().find(|(k, _)| k == "PEER_ADDRESS").unwrap();
    assert_eq!(peer.1, "<unset>");
}

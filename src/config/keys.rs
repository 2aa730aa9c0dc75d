// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Recognised configuration keys and their defaults.

pub const NAMESPACE: &str = "NAMESPACE";
pub const KUBECTL: &str = "KUBECTL";
pub const KUBE_CONTEXT: &str = "KUBE_CONTEXT";
pub const COMMAND_TIMEOUT_SECS: &str = "COMMAND_TIMEOUT_SECS";

pub const MODEL: &str = "MODEL";
pub const IMAGE: &str = "IMAGE";
pub const REPLICAS: &str = "REPLICAS";
pub const GPUS_PER_POD: &str = "GPUS_PER_POD";
pub const PVC_NAME: &str = "PVC_NAME";
pub const PVC_SIZE: &str = "PVC_SIZE";
pub const STORAGE_CLASS: &str = "STORAGE_CLASS";
pub const SECRET_NAME: &str = "SECRET_NAME";
pub const HF_TOKEN: &str = "HF_TOKEN";
pub const SERVICE_PORT: &str = "SERVICE_PORT";
pub const GPU_MEMORY_UTILIZATION: &str = "GPU_MEMORY_UTILIZATION";
pub const TENSOR_PARALLEL_SIZE: &str = "TENSOR_PARALLEL_SIZE";
pub const PIPELINE_PARALLEL_SIZE: &str = "PIPELINE_PARALLEL_SIZE";
pub const MAX_MODEL_LEN: &str = "MAX_MODEL_LEN";

pub const FABRIC_INTERFACES: &str = "FABRIC_INTERFACES";
pub const FABRIC_ADDRESS: &str = "FABRIC_ADDRESS";
pub const FABRIC_PERSIST: &str = "FABRIC_PERSIST";
pub const PEER_ADDRESS: &str = "PEER_ADDRESS";
pub const USE_SUDO: &str = "USE_SUDO";

pub const RUNTIME_CONTAINER: &str = "RUNTIME_CONTAINER";
pub const RUNTIME_LOG_PATH: &str = "RUNTIME_LOG_PATH";
pub const SERVE_PORT: &str = "SERVE_PORT";
pub const HEALTH_URL: &str = "HEALTH_URL";
pub const EXPECTED_GPU_WORKERS: &str = "EXPECTED_GPU_WORKERS";

pub const READY_MAX_ATTEMPTS: &str = "READY_MAX_ATTEMPTS";
pub const READY_DELAY_SECS: &str = "READY_DELAY_SECS";
pub const STATUS_TIMEOUT_SECS: &str = "STATUS_TIMEOUT_SECS";

pub const CACHE_DIR: &str = "CACHE_DIR";
pub const MIN_FREE_DISK_GB: &str = "MIN_FREE_DISK_GB";

pub const MONITORING_ENABLED: &str = "MONITORING_ENABLED";
pub const MONITORING_NAMESPACE: &str = "MONITORING_NAMESPACE";
pub const AGENTS_ENABLED: &str = "AGENTS_ENABLED";
pub const AGENTS_IMAGE: &str = "AGENTS_IMAGE";
pub const EXTRA_MANIFESTS: &str = "EXTRA_MANIFESTS";

pub const STRICT: &str = "STRICT";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_FORMAT: &str = "LOG_FORMAT";

/// Documentation entry for one key.
#[derive(Debug, Clone, Copy)]
pub struct KeyDoc {
    pub key: &'static str,
    /// Default value as it would be written in a config file. Empty means unset.
    pub default: &'static str,
    pub description: &'static str,
}

/// Every recognised key, in display order.
pub const KEYS: &[KeyDoc] = &[
    KeyDoc { key: NAMESPACE, default: "llm-serving", description: "Namespace for the serving workload" },
    KeyDoc { key: KUBECTL, default: "kubectl", description: "kubectl binary" },
    KeyDoc { key: KUBE_CONTEXT, default: "", description: "kubeconfig context (current when unset)" },
    KeyDoc { key: COMMAND_TIMEOUT_SECS, default: "120", description: "Upper bound for any single external command" },
    KeyDoc { key: MODEL, default: "llama-3.1-8b-instruct", description: "Model profile to serve" },
    KeyDoc { key: IMAGE, default: "vllm/vllm-openai:v0.6.4", description: "Model server image" },
    KeyDoc { key: REPLICAS, default: "1", description: "Model server replicas" },
    KeyDoc { key: GPUS_PER_POD, default: "1", description: "GPUs requested by each model server pod" },
    KeyDoc { key: PVC_NAME, default: "model-cache", description: "Claim holding the model cache" },
    KeyDoc { key: PVC_SIZE, default: "200Gi", description: "Requested size of the model cache claim" },
    KeyDoc { key: STORAGE_CLASS, default: "", description: "Storage class (cluster default when unset)" },
    KeyDoc { key: SECRET_NAME, default: "hf-token", description: "Secret carrying the Hugging Face token" },
    KeyDoc { key: HF_TOKEN, default: "", description: "Hugging Face token (gated models only)" },
    KeyDoc { key: SERVICE_PORT, default: "8000", description: "Model server service port" },
    KeyDoc { key: GPU_MEMORY_UTILIZATION, default: "0.90", description: "Fraction of GPU memory the server may use" },
    KeyDoc { key: TENSOR_PARALLEL_SIZE, default: "2", description: "Tensor-parallel degree for distributed serving" },
    KeyDoc { key: PIPELINE_PARALLEL_SIZE, default: "1", description: "Pipeline-parallel degree for distributed serving" },
    KeyDoc { key: MAX_MODEL_LEN, default: "", description: "Maximum sequence length (model default when unset)" },
    KeyDoc { key: FABRIC_INTERFACES, default: "enp1s0f0np0,enp1s0f1np1,enP2p1s0f0np0,enP2p1s0f1np1", description: "Fabric interface candidates, in priority order" },
    KeyDoc { key: FABRIC_ADDRESS, default: "192.168.100.10/24", description: "Address to bind on the fabric interface" },
    KeyDoc { key: FABRIC_PERSIST, default: "true", description: "Record the fabric address in NetworkManager" },
    KeyDoc { key: PEER_ADDRESS, default: "", description: "Fabric address of the peer node" },
    KeyDoc { key: USE_SUDO, default: "true", description: "Run network mutations through sudo -n" },
    KeyDoc { key: RUNTIME_CONTAINER, default: "ray-head", description: "Container running the distributed runtime head" },
    KeyDoc { key: RUNTIME_LOG_PATH, default: "/tmp/vllm-serve.log", description: "Serve process output inside the runtime container" },
    KeyDoc { key: SERVE_PORT, default: "8000", description: "Port the distributed model server listens on" },
    KeyDoc { key: HEALTH_URL, default: "http://127.0.0.1:8000/health", description: "Model server health endpoint" },
    KeyDoc { key: EXPECTED_GPU_WORKERS, default: "2", description: "GPU-class workers the runtime must report" },
    KeyDoc { key: READY_MAX_ATTEMPTS, default: "60", description: "Readiness attempts before timing out" },
    KeyDoc { key: READY_DELAY_SECS, default: "5", description: "Delay between readiness attempts" },
    KeyDoc { key: STATUS_TIMEOUT_SECS, default: "5", description: "Bound for each status query" },
    KeyDoc { key: CACHE_DIR, default: "/var/cache/huggingface", description: "Host model cache directory" },
    KeyDoc { key: MIN_FREE_DISK_GB, default: "100", description: "Free space required under the cache directory" },
    KeyDoc { key: MONITORING_ENABLED, default: "false", description: "Deploy the monitoring subsystem" },
    KeyDoc { key: MONITORING_NAMESPACE, default: "monitoring", description: "Namespace for the monitoring subsystem" },
    KeyDoc { key: AGENTS_ENABLED, default: "false", description: "Deploy the multi-agent gateway" },
    KeyDoc { key: AGENTS_IMAGE, default: "ghcr.io/gg-core/agent-gateway:0.3", description: "Agent gateway image" },
    KeyDoc { key: EXTRA_MANIFESTS, default: "", description: "Comma-separated YAML manifests applied after the stack" },
    KeyDoc { key: STRICT, default: "false", description: "Treat timeouts and network failures as fatal" },
    KeyDoc { key: LOG_LEVEL, default: "info", description: "Log filter (RUST_LOG overrides)" },
    KeyDoc { key: LOG_FORMAT, default: "pretty", description: "Log format: pretty or json" },
];

/// Look up a key's documentation entry.
pub fn lookup(key: &str) -> Option<&'static KeyDoc> {
    KEYS.iter().find(|doc| doc.key == key)
}

/// Keys whose values must never be printed.
pub fn is_secret(key: &str) -> bool {
    key == HF_TOKEN
}

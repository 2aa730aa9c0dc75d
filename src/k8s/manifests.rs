// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Manifest rendering for the serving stack and its optional subsystems.
//!
//! Each function returns a complete desired object. Secrets are rendered the
//! same way as every other resource and applied declaratively, so re-running
//! an apply updates the token in place instead of failing on "already exists".

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Configuration;
use crate::error::BringupError;

use super::descriptor::{ManifestOrigin, ResourceDescriptor, ResourceKind};

/// Name of the model server Deployment and Service.
pub const MODEL_SERVER: &str = "vllm";
/// Key inside the token Secret.
pub const TOKEN_KEY: &str = "HF_TOKEN";
pub const PROMETHEUS: &str = "prometheus";
pub const PROMETHEUS_IMAGE: &str = "prom/prometheus:v2.54.1";
pub const PROMETHEUS_PORT: u16 = 9090;
pub const AGENT_GATEWAY: &str = "agent-gateway";
pub const AGENT_GATEWAY_PORT: u16 = 8080;

const MANAGED_BY: &str = "gg-bringup";
const MODEL_CACHE_MOUNT: &str = "/root/.cache/huggingface";

/// Common object metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    fn new(name: &str, namespace: Option<&str>) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert("app.kubernetes.io/name".to_string(), name.to_string());
        labels.insert("app.kubernetes.io/managed-by".to_string(), MANAGED_BY.to_string());
        Self {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            labels,
        }
    }
}

/// Label selector matching pods of the named workload.
pub fn app_selector(name: &str) -> String {
    format!("app.kubernetes.io/name={}", name)
}

fn envelope(kind: ResourceKind, meta: &ObjectMeta, body: Value) -> Value {
    let mut manifest = json!({
        "apiVersion": kind.api_version(),
        "kind": kind.as_str(),
        "metadata": meta,
    });
    if let (Some(target), Value::Object(fields)) = (manifest.as_object_mut(), body) {
        target.extend(fields);
    }
    manifest
}

fn descriptor(kind: ResourceKind, name: &str, namespace: Option<&str>, body: Value) -> ResourceDescriptor {
    let meta = ObjectMeta::new(name, namespace);
    ResourceDescriptor::new(kind, namespace, name, envelope(kind, &meta, body))
}

fn nvidia_toleration() -> Value {
    json!({
        "key": "nvidia.com/gpu",
        "operator": "Exists",
        "effect": "NoSchedule",
    })
}

fn gpu_node_affinity() -> Value {
    json!({
        "nodeAffinity": {
            "requiredDuringSchedulingIgnoredDuringExecution": {
                "nodeSelectorTerms": [{
                    "matchExpressions": [{
                        "key": "nvidia.com/gpu.present",
                        "operator": "In",
                        "values": ["true"],
                    }],
                }],
            },
        },
    })
}

pub fn namespace(name: &str) -> ResourceDescriptor {
    descriptor(ResourceKind::Namespace, name, None, json!({}))
}

pub fn model_cache_claim(config: &Configuration) -> ResourceDescriptor {
    let s = &config.serving;
    let mut spec = json!({
        "accessModes": ["ReadWriteOnce"],
        "resources": { "requests": { "storage": s.pvc_size } },
    });
    if let (Some(class), Some(fields)) = (&s.storage_class, spec.as_object_mut()) {
        fields.insert("storageClassName".to_string(), json!(class));
    }
    descriptor(
        ResourceKind::PersistentVolumeClaim,
        &s.pvc_name,
        Some(&config.cluster.namespace),
        json!({ "spec": spec }),
    )
}

/// Token secret. An unset token renders an empty value so the workload's
/// optional secret reference still resolves.
pub fn token_secret(config: &Configuration) -> ResourceDescriptor {
    let token = config.serving.hf_token.clone().unwrap_or_default();
    descriptor(
        ResourceKind::Secret,
        &config.serving.secret_name,
        Some(&config.cluster.namespace),
        json!({
            "type": "Opaque",
            "stringData": { TOKEN_KEY: token },
        }),
    )
}

/// Arguments passed to the model server container.
pub fn model_server_args(config: &Configuration) -> Vec<String> {
    let s = &config.serving;
    vec![
        "--model".to_string(),
        s.model.hf_id().to_string(),
        "--tensor-parallel-size".to_string(),
        s.gpus_per_pod.to_string(),
        "--gpu-memory-utilization".to_string(),
        format!("{:.2}", s.gpu_memory_utilization),
        "--max-model-len".to_string(),
        s.max_model_len.to_string(),
        "--port".to_string(),
        s.service_port.to_string(),
    ]
}

pub fn model_server_deployment(config: &Configuration) -> ResourceDescriptor {
    let s = &config.serving;
    let labels = json!({ "app.kubernetes.io/name": MODEL_SERVER });
    descriptor(
        ResourceKind::Deployment,
        MODEL_SERVER,
        Some(&config.cluster.namespace),
        json!({
            "spec": {
                "replicas": s.replicas,
                "strategy": { "type": "Recreate" },
                "selector": { "matchLabels": labels },
                "template": {
                    "metadata": { "labels": labels },
                    "spec": {
                        "tolerations": [nvidia_toleration()],
                        "affinity": gpu_node_affinity(),
                        "containers": [{
                            "name": MODEL_SERVER,
                            "image": s.image,
                            "args": model_server_args(config),
                            "ports": [{ "name": "http", "containerPort": s.service_port }],
                            "env": [{
                                "name": "HUGGING_FACE_HUB_TOKEN",
                                "valueFrom": { "secretKeyRef": {
                                    "name": s.secret_name,
                                    "key": TOKEN_KEY,
                                    "optional": true,
                                }},
                            }],
                            "resources": { "limits": { "nvidia.com/gpu": s.gpus_per_pod } },
                            "volumeMounts": [{ "name": "model-cache", "mountPath": MODEL_CACHE_MOUNT }],
                            "readinessProbe": {
                                "httpGet": { "path": "/health", "port": "http" },
                                "periodSeconds": 10,
                                "failureThreshold": 60,
                            },
                        }],
                        "volumes": [{
                            "name": "model-cache",
                            "persistentVolumeClaim": { "claimName": s.pvc_name },
                        }],
                    },
                },
            },
        }),
    )
}

fn cluster_ip_service(name: &str, namespace: &str, port: u16) -> ResourceDescriptor {
    descriptor(
        ResourceKind::Service,
        name,
        Some(namespace),
        json!({
            "spec": {
                "type": "ClusterIP",
                "selector": { "app.kubernetes.io/name": name },
                "ports": [{ "name": "http", "port": port, "targetPort": port, "protocol": "TCP" }],
            },
        }),
    )
}

pub fn model_server_service(config: &Configuration) -> ResourceDescriptor {
    cluster_ip_service(MODEL_SERVER, &config.cluster.namespace, config.serving.service_port)
}

fn model_server_url(config: &Configuration) -> String {
    format!(
        "http://{}.{}.svc.cluster.local:{}",
        MODEL_SERVER, config.cluster.namespace, config.serving.service_port
    )
}

pub fn prometheus_config(config: &Configuration) -> ResourceDescriptor {
    let target = format!(
        "{}.{}.svc.cluster.local:{}",
        MODEL_SERVER, config.cluster.namespace, config.serving.service_port
    );
    let scrape = format!(
        "global:\n  scrape_interval: 15s\nscrape_configs:\n  - job_name: {}\n    metrics_path: /metrics\n    static_configs:\n      - targets: ['{}']\n",
        MODEL_SERVER, target
    );
    descriptor(
        ResourceKind::ConfigMap,
        "prometheus-config",
        Some(&config.subsystems.monitoring_namespace),
        json!({ "data": { "prometheus.yml": scrape } }),
    )
}

pub fn prometheus_deployment(config: &Configuration) -> ResourceDescriptor {
    let labels = json!({ "app.kubernetes.io/name": PROMETHEUS });
    descriptor(
        ResourceKind::Deployment,
        PROMETHEUS,
        Some(&config.subsystems.monitoring_namespace),
        json!({
            "spec": {
                "replicas": 1,
                "selector": { "matchLabels": labels },
                "template": {
                    "metadata": { "labels": labels },
                    "spec": {
                        "containers": [{
                            "name": PROMETHEUS,
                            "image": PROMETHEUS_IMAGE,
                            "args": ["--config.file=/etc/prometheus/prometheus.yml"],
                            "ports": [{ "name": "http", "containerPort": PROMETHEUS_PORT }],
                            "volumeMounts": [{ "name": "config", "mountPath": "/etc/prometheus" }],
                        }],
                        "volumes": [{ "name": "config", "configMap": { "name": "prometheus-config" } }],
                    },
                },
            },
        }),
    )
}

pub fn prometheus_service(config: &Configuration) -> ResourceDescriptor {
    cluster_ip_service(PROMETHEUS, &config.subsystems.monitoring_namespace, PROMETHEUS_PORT)
}

pub fn agent_gateway_deployment(config: &Configuration) -> ResourceDescriptor {
    let labels = json!({ "app.kubernetes.io/name": AGENT_GATEWAY });
    descriptor(
        ResourceKind::Deployment,
        AGENT_GATEWAY,
        Some(&config.cluster.namespace),
        json!({
            "spec": {
                "replicas": 1,
                "selector": { "matchLabels": labels },
                "template": {
                    "metadata": { "labels": labels },
                    "spec": {
                        "containers": [{
                            "name": AGENT_GATEWAY,
                            "image": config.subsystems.agents_image,
                            "ports": [{ "name": "http", "containerPort": AGENT_GATEWAY_PORT }],
                            "env": [
                                { "name": "OPENAI_API_BASE", "value": format!("{}/v1", model_server_url(config)) },
                                { "name": "MODEL_NAME", "value": config.serving.model.hf_id() },
                            ],
                        }],
                    },
                },
            },
        }),
    )
}

pub fn agent_gateway_service(config: &Configuration) -> ResourceDescriptor {
    cluster_ip_service(AGENT_GATEWAY, &config.cluster.namespace, AGENT_GATEWAY_PORT)
}

/// Parse an operator-supplied YAML file (possibly multi-document) into
/// descriptors. Namespaced objects without a namespace land in
/// `default_namespace`.
///
/// # Errors
/// Returns `ConfigurationInvalid` naming the file and document index.
pub fn load_manifest_file(path: &Path, default_namespace: &str) -> Result<Vec<ResourceDescriptor>, BringupError> {
    let key = path.display().to_string();
    let content = std::fs::read_to_string(path)
        .map_err(|e| BringupError::config(&key, format!("cannot read manifest: {}", e)))?;
    parse_manifests(&content, default_namespace)
        .map(|descriptors| {
            descriptors
                .into_iter()
                .map(|d| d.with_origin(ManifestOrigin::File(path.to_path_buf())))
                .collect()
        })
        .map_err(|reason| BringupError::config(&key, reason))
}

/// Parse YAML documents into descriptors.
pub fn parse_manifests(content: &str, default_namespace: &str) -> Result<Vec<ResourceDescriptor>, String> {
    let mut descriptors = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let mut manifest = Value::deserialize(document)
            .map_err(|e| format!("document {}: {}", index, e))?;
        if manifest.is_null() {
            continue;
        }
        let kind: ResourceKind = manifest
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("document {}: missing 'kind'", index))?
            .parse()
            .map_err(|e| format!("document {}: {}", index, e))?;
        if manifest.get("apiVersion").and_then(Value::as_str).is_none() {
            return Err(format!("document {}: missing 'apiVersion'", index));
        }
        let name = manifest
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("document {}: missing 'metadata.name'", index))?
            .to_string();

        let namespace = if kind.is_namespaced() {
            let ns = manifest
                .pointer("/metadata/namespace")
                .and_then(Value::as_str)
                .unwrap_or(default_namespace)
                .to_string();
            if let Some(meta) = manifest.get_mut("metadata").and_then(Value::as_object_mut) {
                meta.insert("namespace".to_string(), json!(ns));
            }
            Some(ns)
        } else {
            None
        };

        descriptors.push(ResourceDescriptor::new(kind, namespace.as_deref(), &name, manifest));
    }
    Ok(descriptors)
}

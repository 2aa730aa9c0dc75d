// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Invocation configuration.
//!
//! A [`Configuration`] is built once from key/value pairs when the process
//! starts and passed to every component. Components never read the process
//! environment themselves.

pub mod keys;
pub mod loader;
pub mod model;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::BringupError;
use crate::k8s::validation::{validate_executable, validate_image, validate_path, validate_resource_name};
use crate::network::Cidr;

pub use loader::{gather, read_file};
pub use model::ModelProfile;

/// Cluster control settings.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSettings {
    pub namespace: String,
    pub kubectl: String,
    pub kube_context: Option<String>,
    pub command_timeout: Duration,
}

/// Model server workload settings.
#[derive(Debug, Clone, Serialize)]
pub struct ServingSettings {
    pub model: ModelProfile,
    pub image: String,
    pub replicas: u32,
    pub gpus_per_pod: u32,
    pub pvc_name: String,
    pub pvc_size: String,
    pub storage_class: Option<String>,
    pub secret_name: String,
    #[serde(skip)]
    pub hf_token: Option<String>,
    pub service_port: u16,
    pub gpu_memory_utilization: f64,
    pub tensor_parallel_size: u32,
    pub pipeline_parallel_size: u32,
    pub max_model_len: u32,
}

/// Fabric interconnect settings.
#[derive(Debug, Clone, Serialize)]
pub struct FabricSettings {
    pub interfaces: Vec<String>,
    pub address: Cidr,
    pub persist: bool,
    pub peer_address: Option<std::net::IpAddr>,
    pub use_sudo: bool,
}

/// Distributed runtime settings.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeSettings {
    pub container: String,
    pub log_path: String,
    pub serve_port: u16,
    pub health_url: String,
    pub expected_gpu_workers: u32,
}

/// Readiness and status timing.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessSettings {
    pub max_attempts: u32,
    pub delay: Duration,
    pub status_timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageSettings {
    pub cache_dir: PathBuf,
    pub min_free_gb: u64,
}

/// Optional subsystems and extra manifests.
#[derive(Debug, Clone, Serialize)]
pub struct Subsystems {
    pub monitoring_enabled: bool,
    pub monitoring_namespace: String,
    pub agents_enabled: bool,
    pub agents_image: String,
    pub extra_manifests: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

/// Complete, immutable configuration for one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Configuration {
    pub cluster: ClusterSettings,
    pub serving: ServingSettings,
    pub fabric: FabricSettings,
    pub runtime: RuntimeSettings,
    pub readiness: ReadinessSettings,
    pub storage: StorageSettings,
    pub subsystems: Subsystems,
    pub strict: bool,
    pub logging: LoggingSettings,
}

/// Every problem found while reading configuration pairs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} configuration issue(s): {}", .issues.len(), render_issues(.issues))]
pub struct ConfigError {
    pub issues: Vec<BringupError>,
}

fn render_issues(issues: &[BringupError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reads typed values out of the pair map, collecting issues instead of
/// stopping at the first one.
struct PairReader<'a> {
    pairs: &'a BTreeMap<String, String>,
    issues: Vec<BringupError>,
}

impl<'a> PairReader<'a> {
    fn new(pairs: &'a BTreeMap<String, String>) -> Self {
        Self {
            pairs,
            issues: Vec::new(),
        }
    }

    /// Explicit value, or the documented default. Empty strings count as unset.
    fn raw(&self, key: &str) -> Option<String> {
        self.pairs
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                keys::lookup(key)
                    .map(|doc| doc.default.to_string())
                    .filter(|d| !d.is_empty())
            })
    }

    fn string(&self, key: &str) -> String {
        self.raw(key).unwrap_or_default()
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn parse<T>(&mut self, key: &str, fallback: T) -> T
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.raw(key) {
            Some(value) => match value.parse::<T>() {
                Ok(parsed) => parsed,
                Err(e) => {
                    self.issues
                        .push(BringupError::config(key, format!("'{}': {}", value, e)));
                    fallback
                }
            },
            None => fallback,
        }
    }

    fn parse_optional<T>(&mut self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.raw(key)?;
        match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.issues
                    .push(BringupError::config(key, format!("'{}': {}", value, e)));
                None
            }
        }
    }

    fn flag(&mut self, key: &str, fallback: bool) -> bool {
        match self.raw(key) {
            Some(value) => match parse_bool(&value) {
                Some(b) => b,
                None => {
                    self.issues.push(BringupError::config(
                        key,
                        format!("'{}' is not a boolean (true/false/yes/no/1/0)", value),
                    ));
                    fallback
                }
            },
            None => fallback,
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.raw(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn seconds(&mut self, key: &str, fallback: u64) -> Duration {
        Duration::from_secs(self.parse(key, fallback))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Used when `FABRIC_ADDRESS` fails to parse; the issue is reported separately.
const FALLBACK_FABRIC: Cidr = Cidr {
    addr: std::net::IpAddr::V4(std::net::Ipv4Addr::new(192, 168, 100, 10)),
    prefix: 24,
};

impl Configuration {
    /// Build a configuration from key/value pairs, applying documented defaults.
    ///
    /// # Errors
    /// Returns every malformed value as a `ConfigurationInvalid` issue.
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        for key in pairs.keys() {
            if keys::lookup(key).is_none() {
                tracing::debug!(key = %key, "ignoring unknown configuration key");
            }
        }

        let mut r = PairReader::new(pairs);

        let model: ModelProfile = r.parse(keys::MODEL, ModelProfile::Llama31Instruct8B);
        let max_model_len = r
            .parse_optional(keys::MAX_MODEL_LEN)
            .unwrap_or_else(|| model.default_max_model_len());

        let config = Self {
            cluster: ClusterSettings {
                namespace: r.string(keys::NAMESPACE),
                kubectl: r.string(keys::KUBECTL),
                kube_context: r.optional(keys::KUBE_CONTEXT),
                command_timeout: r.seconds(keys::COMMAND_TIMEOUT_SECS, 120),
            },
            serving: ServingSettings {
                model,
                image: r.string(keys::IMAGE),
                replicas: r.parse(keys::REPLICAS, 1),
                gpus_per_pod: r.parse(keys::GPUS_PER_POD, 1),
                pvc_name: r.string(keys::PVC_NAME),
                pvc_size: r.string(keys::PVC_SIZE),
                storage_class: r.optional(keys::STORAGE_CLASS),
                secret_name: r.string(keys::SECRET_NAME),
                hf_token: r.optional(keys::HF_TOKEN),
                service_port: r.parse(keys::SERVICE_PORT, 8000),
                gpu_memory_utilization: r.parse(keys::GPU_MEMORY_UTILIZATION, 0.90),
                tensor_parallel_size: r.parse(keys::TENSOR_PARALLEL_SIZE, 2),
                pipeline_parallel_size: r.parse(keys::PIPELINE_PARALLEL_SIZE, 1),
                max_model_len,
            },
            fabric: FabricSettings {
                interfaces: r.list(keys::FABRIC_INTERFACES),
                address: r.parse(keys::FABRIC_ADDRESS, FALLBACK_FABRIC),
                persist: r.flag(keys::FABRIC_PERSIST, true),
                peer_address: r.parse_optional(keys::PEER_ADDRESS),
                use_sudo: r.flag(keys::USE_SUDO, true),
            },
            runtime: RuntimeSettings {
                container: r.string(keys::RUNTIME_CONTAINER),
                log_path: r.string(keys::RUNTIME_LOG_PATH),
                serve_port: r.parse(keys::SERVE_PORT, 8000),
                health_url: r.string(keys::HEALTH_URL),
                expected_gpu_workers: r.parse(keys::EXPECTED_GPU_WORKERS, 2),
            },
            readiness: ReadinessSettings {
                max_attempts: r.parse(keys::READY_MAX_ATTEMPTS, 60),
                delay: r.seconds(keys::READY_DELAY_SECS, 5),
                status_timeout: r.seconds(keys::STATUS_TIMEOUT_SECS, 5),
            },
            storage: StorageSettings {
                cache_dir: PathBuf::from(r.string(keys::CACHE_DIR)),
                min_free_gb: r.parse(keys::MIN_FREE_DISK_GB, 100),
            },
            subsystems: Subsystems {
                monitoring_enabled: r.flag(keys::MONITORING_ENABLED, false),
                monitoring_namespace: r.string(keys::MONITORING_NAMESPACE),
                agents_enabled: r.flag(keys::AGENTS_ENABLED, false),
                agents_image: r.string(keys::AGENTS_IMAGE),
                extra_manifests: r
                    .list(keys::EXTRA_MANIFESTS)
                    .into_iter()
                    .map(PathBuf::from)
                    .collect(),
            },
            strict: r.flag(keys::STRICT, false),
            logging: LoggingSettings {
                level: r.string(keys::LOG_LEVEL),
                format: r.parse(keys::LOG_FORMAT, LogFormat::Pretty),
            },
        };

        if r.issues.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError { issues: r.issues })
        }
    }

    /// Semantic problems that make a bring-up impossible.
    ///
    /// Each entry names the offending key. An empty list means the
    /// configuration is complete.
    pub fn issues(&self) -> Vec<BringupError> {
        let mut issues = Vec::new();
        let s = &self.serving;

        for (key, name) in [
            (keys::NAMESPACE, &self.cluster.namespace),
            (keys::PVC_NAME, &s.pvc_name),
            (keys::SECRET_NAME, &s.secret_name),
            (keys::MONITORING_NAMESPACE, &self.subsystems.monitoring_namespace),
        ] {
            if let Err(e) = validate_resource_name(name, key) {
                issues.push(BringupError::config(key, e.to_string()));
            }
        }
        for (key, image) in [(keys::IMAGE, &s.image), (keys::AGENTS_IMAGE, &self.subsystems.agents_image)] {
            if let Err(e) = validate_image(image) {
                issues.push(BringupError::config(key, e.to_string()));
            }
        }
        if let Err(e) = validate_executable(&self.cluster.kubectl, keys::KUBECTL) {
            issues.push(BringupError::config(keys::KUBECTL, e.to_string()));
        }
        if let Some(dir) = self.storage.cache_dir.to_str() {
            if let Err(e) = validate_path(dir, keys::CACHE_DIR) {
                issues.push(BringupError::config(keys::CACHE_DIR, e.to_string()));
            }
        }

        if !(s.gpu_memory_utilization > 0.0 && s.gpu_memory_utilization <= 1.0) {
            issues.push(BringupError::config(
                keys::GPU_MEMORY_UTILIZATION,
                format!("{} is outside (0, 1]", s.gpu_memory_utilization),
            ));
        }
        if s.tensor_parallel_size == 0 || s.pipeline_parallel_size == 0 {
            issues.push(BringupError::config(
                keys::TENSOR_PARALLEL_SIZE,
                "tensor and pipeline parallel sizes must be at least 1",
            ));
        }
        let world = s.tensor_parallel_size.saturating_mul(s.pipeline_parallel_size);
        if world > self.runtime.expected_gpu_workers {
            issues.push(BringupError::config(
                keys::TENSOR_PARALLEL_SIZE,
                format!(
                    "tensor x pipeline parallel = {} exceeds EXPECTED_GPU_WORKERS={}",
                    world, self.runtime.expected_gpu_workers
                ),
            ));
        }
        if world < s.model.min_gpus() {
            issues.push(BringupError::config(
                keys::MODEL,
                format!(
                    "{} needs at least {} GPUs, tensor x pipeline parallel = {}",
                    s.model,
                    s.model.min_gpus(),
                    world
                ),
            ));
        }
        if s.replicas == 0 {
            issues.push(BringupError::config(keys::REPLICAS, "must be at least 1"));
        }
        if s.max_model_len == 0 {
            issues.push(BringupError::config(keys::MAX_MODEL_LEN, "must be at least 1"));
        }
        if self.fabric.interfaces.is_empty() {
            issues.push(BringupError::config(keys::FABRIC_INTERFACES, "no candidate interfaces listed"));
        }
        if self.readiness.max_attempts == 0 {
            issues.push(BringupError::config(keys::READY_MAX_ATTEMPTS, "must be at least 1"));
        }
        if !self.runtime.health_url.starts_with("http://") && !self.runtime.health_url.starts_with("https://") {
            issues.push(BringupError::config(
                keys::HEALTH_URL,
                format!("'{}' is not an http(s) URL", self.runtime.health_url),
            ));
        }

        issues
    }

    /// Effective key/value view with secrets redacted, in documentation order.
    pub fn effective_pairs(pairs: &BTreeMap<String, String>) -> Vec<(String, String)> {
        let reader = PairReader::new(pairs);
        keys::KEYS
            .iter()
            .map(|doc| {
                let value = match reader.raw(doc.key) {
                    Some(_) if keys::is_secret(doc.key) => "<set>".to_string(),
                    Some(v) => v,
                    None => "<unset>".to_string(),
                };
                (doc.key.to_string(), value)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

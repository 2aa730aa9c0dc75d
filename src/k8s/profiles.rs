// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deployment profiles: the ordered descriptor list for one apply/delete cycle.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::{keys, ConfigError, Configuration};
use crate::error::BringupError;

use super::descriptor::ResourceDescriptor;
use super::manifests;
use super::validation::validate_resource_name;

/// Which part of the stack a profile covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Namespace, model cache claim, token secret, model server and its service.
    Serving,
    /// Metrics collection for the model server.
    Monitoring,
    /// Multi-agent gateway in front of the model server.
    Agents,
    /// Serving plus every enabled subsystem and extra manifests.
    All,
}

impl ProfileKind {
    pub const NAMES: [&'static str; 4] = ["serving", "monitoring", "agents", "all"];
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Serving => "serving",
            Self::Monitoring => "monitoring",
            Self::Agents => "agents",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serving" => Ok(Self::Serving),
            "monitoring" => Ok(Self::Monitoring),
            "agents" => Ok(Self::Agents),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown profile '{}', expected one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Ordered resources plus the subsystem flags they were built from.
///
/// Immutable once built. Apply walks `descriptors` front to back, delete walks
/// it back to front.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentProfile {
    pub kind: ProfileKind,
    pub monitoring: bool,
    pub agents: bool,
    pub descriptors: Vec<ResourceDescriptor>,
}

fn serving(config: &Configuration) -> Vec<ResourceDescriptor> {
    vec![
        manifests::namespace(&config.cluster.namespace),
        manifests::model_cache_claim(config),
        manifests::token_secret(config),
        manifests::model_server_deployment(config),
        manifests::model_server_service(config),
    ]
}

fn monitoring(config: &Configuration) -> Vec<ResourceDescriptor> {
    vec![
        manifests::namespace(&config.subsystems.monitoring_namespace),
        manifests::prometheus_config(config),
        manifests::prometheus_deployment(config),
        manifests::prometheus_service(config),
    ]
}

fn agents(config: &Configuration) -> Vec<ResourceDescriptor> {
    vec![
        manifests::agent_gateway_deployment(config),
        manifests::agent_gateway_service(config),
    ]
}

impl DeploymentProfile {
    /// Build and validate the descriptor list for `kind`.
    ///
    /// Everything is checked before anything is returned so an invalid
    /// profile never reaches the cluster.
    ///
    /// # Errors
    /// Returns every invalid name or unreadable extra manifest.
    pub fn build(config: &Configuration, kind: ProfileKind) -> Result<Self, ConfigError> {
        let mut issues = Vec::new();
        let subsystems = &config.subsystems;

        let (monitoring_on, agents_on) = match kind {
            ProfileKind::Serving => (false, false),
            ProfileKind::Monitoring => (true, false),
            ProfileKind::Agents => (false, true),
            ProfileKind::All => (subsystems.monitoring_enabled, subsystems.agents_enabled),
        };

        let mut descriptors = Vec::new();
        if matches!(kind, ProfileKind::Serving | ProfileKind::All) {
            descriptors.extend(serving(config));
        }
        if monitoring_on {
            descriptors.extend(monitoring(config));
        }
        if agents_on {
            descriptors.extend(agents(config));
        }
        if kind == ProfileKind::All {
            for path in &subsystems.extra_manifests {
                match manifests::load_manifest_file(path, &config.cluster.namespace) {
                    Ok(extra) => descriptors.extend(extra),
                    Err(e) => issues.push(e),
                }
            }
        }

        for d in &descriptors {
            issues.extend(descriptor_issues(d));
        }

        if issues.is_empty() {
            Ok(Self {
                kind,
                monitoring: monitoring_on,
                agents: agents_on,
                descriptors,
            })
        } else {
            Err(ConfigError { issues })
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor ids in apply order.
    pub fn ids(&self) -> Vec<String> {
        self.descriptors.iter().map(ResourceDescriptor::id).collect()
    }
}

fn descriptor_issues(d: &ResourceDescriptor) -> Vec<BringupError> {
    let mut issues = Vec::new();
    if let Err(e) = validate_resource_name(&d.name, &d.id()) {
        issues.push(BringupError::config(d.id(), e.to_string()));
    }
    match (&d.namespace, d.kind.is_namespaced()) {
        (Some(ns), true) => {
            if let Err(e) = validate_resource_name(ns, keys::NAMESPACE) {
                issues.push(BringupError::config(d.id(), e.to_string()));
            }
        }
        (None, true) => issues.push(BringupError::config(d.id(), "namespaced resource has no namespace")),
        (Some(_), false) => issues.push(BringupError::config(d.id(), "cluster-scoped resource carries a namespace")),
        (None, false) => {}
    }
    if d.manifest.get("kind").and_then(serde_json::Value::as_str) != Some(d.kind.as_str()) {
        issues.push(BringupError::config(d.id(), "manifest kind does not match descriptor"));
    }
    issues
}

#[cfg(test)]
#[path = "profiles_tests.rs"]
mod tests;

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource descriptors: one unit of desired cluster state.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resource kinds this tool applies or observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Namespace,
    PersistentVolumeClaim,
    Secret,
    ConfigMap,
    Deployment,
    Service,
    Pod,
}

impl ResourceKind {
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::Deployment => "apps/v1",
            _ => "v1",
        }
    }

    /// `kind` field as written in a manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Namespace => "Namespace",
            Self::PersistentVolumeClaim => "PersistentVolumeClaim",
            Self::Secret => "Secret",
            Self::ConfigMap => "ConfigMap",
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::Pod => "Pod",
        }
    }

    /// Resource name understood by kubectl.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::PersistentVolumeClaim => "persistentvolumeclaim",
            Self::Secret => "secret",
            Self::ConfigMap => "configmap",
            Self::Deployment => "deployment",
            Self::Service => "service",
            Self::Pod => "pod",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        !matches!(self, Self::Namespace)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Namespace" => Ok(Self::Namespace),
            "PersistentVolumeClaim" => Ok(Self::PersistentVolumeClaim),
            "Secret" => Ok(Self::Secret),
            "ConfigMap" => Ok(Self::ConfigMap),
            "Deployment" => Ok(Self::Deployment),
            "Service" => Ok(Self::Service),
            "Pod" => Ok(Self::Pod),
            other => Err(format!("unsupported kind '{}'", other)),
        }
    }
}

/// Where a descriptor's manifest came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "path")]
pub enum ManifestOrigin {
    /// Rendered from configuration.
    Generated,
    /// Read from an operator-supplied file.
    File(PathBuf),
}

/// A single resource to apply or delete.
///
/// The manifest is the complete desired object; applying it twice converges
/// on the same state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub name: String,
    #[serde(skip)]
    pub manifest: serde_json::Value,
    pub origin: ManifestOrigin,
}

impl ResourceDescriptor {
    pub fn new(
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
        manifest: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            manifest,
            origin: ManifestOrigin::Generated,
        }
    }

    pub fn with_origin(mut self, origin: ManifestOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Stable identifier used in logs and reports, e.g. `deployment/llm-serving/vllm`.
    pub fn id(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}/{}", self.kind, ns, self.name),
            None => format!("{}/{}", self.kind, self.name),
        }
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

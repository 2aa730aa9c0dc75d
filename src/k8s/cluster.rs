// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cluster control seam.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::BringupError;

use super::descriptor::{ResourceDescriptor, ResourceKind};

/// What a successful apply did to the live object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyAction {
    Created,
    Configured,
    /// Live object already matched the manifest.
    Unchanged,
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Configured => "configured",
            Self::Unchanged => "unchanged",
        })
    }
}

/// Point-in-time view of one live object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedResource {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub name: String,
    /// Pod phase, service type or deployment rollout summary.
    pub phase: String,
    /// `ready/total` for pods and deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<String>,
    /// Cluster IP and ports for services, restart count for pods.
    pub detail: String,
    pub healthy: bool,
}

/// Operations the reconciler needs from the cluster.
///
/// `apply` must converge: applying the same descriptor twice leaves the
/// object unchanged. `delete` reports an absent object as
/// [`BringupError::NotFound`]; callers decide whether that is success.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn apply(&self, descriptor: &ResourceDescriptor) -> Result<ApplyAction, BringupError>;

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), BringupError>;

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: Option<&str>,
    ) -> Result<Vec<ObservedResource>, BringupError>;
}

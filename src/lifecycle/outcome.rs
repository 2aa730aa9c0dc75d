// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-resource lifecycle outcomes.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::BringupError;
use crate::k8s::{ApplyAction, ProfileKind};

/// What to do after a resource fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop and report the remaining resources as skipped.
    AbortOnFailure,
    /// Attempt every resource regardless of earlier failures.
    ContinueOnError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Apply,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Apply => "apply",
            Self::Delete => "delete",
        })
    }
}

/// Result of one resource in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Created or changed by this apply.
    Applied(ApplyAction),
    /// Live object already matched.
    AlreadySatisfied,
    Deleted,
    /// Delete found nothing to remove.
    AlreadyAbsent,
    Failed(BringupError),
    /// Not attempted because an earlier resource failed.
    Skipped,
}

impl ResourceStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_) | Self::Skipped)
    }

    pub fn label(&self) -> String {
        match self {
            Self::Applied(action) => action.to_string(),
            Self::AlreadySatisfied => "already satisfied".to_string(),
            Self::Deleted => "deleted".to_string(),
            Self::AlreadyAbsent => "already absent".to_string(),
            Self::Failed(_) => "failed".to_string(),
            Self::Skipped => "skipped".to_string(),
        }
    }
}

impl Serialize for ResourceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        let status = match self {
            Self::Applied(_) => "applied",
            Self::AlreadySatisfied => "already_satisfied",
            Self::Deleted => "deleted",
            Self::AlreadyAbsent => "already_absent",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
        };
        map.serialize_entry("status", status)?;
        match self {
            Self::Applied(action) => map.serialize_entry("action", action)?,
            Self::Failed(err) => {
                map.serialize_entry("error_kind", err.kind())?;
                map.serialize_entry("error", &err.to_string())?;
            }
            _ => {}
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    pub resource: String,
    #[serde(flatten)]
    pub status: ResourceStatus,
}

/// Ordered outcomes of one apply or delete cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleReport {
    pub operation: Operation,
    pub profile: ProfileKind,
    pub policy: FailurePolicy,
    pub outcomes: Vec<ResourceOutcome>,
}

impl LifecycleReport {
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ResourceStatus::Failed(_)))
    }

    /// First failure, if any.
    pub fn first_error(&self) -> Option<&BringupError> {
        self.outcomes.iter().find_map(|o| match &o.status {
            ResourceStatus::Failed(e) => Some(e),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&ResourceStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

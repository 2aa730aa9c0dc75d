// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy shared by every bring-up component.
//!
//! Lower layers return these as structured outcomes. Only the binary decides
//! whether an error turns into a nonzero exit status.

use thiserror::Error;

/// Errors produced while driving external systems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BringupError {
    /// The named resource does not exist.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The external system could not answer right now.
    #[error("{target} temporarily unavailable: {detail}")]
    TransientUnavailable { target: String, detail: String },

    /// A wait operation ran out of attempts, hit its deadline or was cancelled.
    #[error("timed out waiting for {condition} after {attempts} attempt(s): {detail}")]
    Timeout {
        condition: String,
        attempts: u32,
        detail: String,
    },

    /// A configuration key or derived resource definition is unusable.
    #[error("invalid configuration for {key}: {reason}")]
    ConfigurationInvalid { key: String, reason: String },

    /// The mutation was refused by the target system.
    #[error("permission denied on {target}: {detail}")]
    PermissionDenied { target: String, detail: String },

    /// Generic failure of a single mutation step.
    #[error("{target}: {detail}")]
    MutationFailed { target: String, detail: String },

    /// None of the candidate interfaces exists on this host.
    #[error("no candidate interface present among [{}]", .candidates.join(", "))]
    NoCandidateInterface { candidates: Vec<String> },
}

impl BringupError {
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn transient(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::TransientUnavailable {
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn mutation(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MutationFailed {
            target: target.into(),
            detail: detail.into(),
        }
    }

    /// Short machine-readable name of the variant, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::TransientUnavailable { .. } => "transient_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::ConfigurationInvalid { .. } => "configuration_invalid",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::MutationFailed { .. } => "mutation_failed",
            Self::NoCandidateInterface { .. } => "no_candidate_interface",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientUnavailable { .. })
    }
}

const NOT_FOUND_MARKERS: &[&str] = &["(notfound)", "not found", "no such", "does not exist"];

const PERMISSION_MARKERS: &[&str] = &[
    "forbidden",
    "permission denied",
    "operation not permitted",
    "a password is required",
    "unauthorized",
];

const TRANSIENT_MARKERS: &[&str] = &[
    "connection refused",
    "unable to connect",
    "i/o timeout",
    "tls handshake timeout",
    "connection reset",
    "temporarily unavailable",
    "the server is currently unable",
];

/// Map a collaborator's failure output onto the error taxonomy.
///
/// `target` names the resource, interface or process the failure belongs to
/// so the resulting message is actionable on its own.
pub fn classify_failure(target: &str, stderr: &str) -> BringupError {
    let detail = stderr.trim();
    let lowered = detail.to_ascii_lowercase();
    let detail = if detail.is_empty() {
        "command exited without output".to_string()
    } else {
        detail.to_string()
    };

    if PERMISSION_MARKERS.iter().any(|m| lowered.contains(m)) {
        BringupError::PermissionDenied {
            target: target.to_string(),
            detail,
        }
    } else if TRANSIENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        BringupError::TransientUnavailable {
            target: target.to_string(),
            detail,
        }
    } else if NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        BringupError::NotFound {
            resource: target.to_string(),
        }
    } else {
        BringupError::MutationFailed {
            target: target.to_string(),
            detail,
        }
    }
}

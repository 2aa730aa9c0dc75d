// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Validation gate.
//!
//! Every registered check runs exactly once per pass, whatever the others
//! report. Checks only read; they run concurrently and the report keeps
//! declaration order.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationScope {
    All,
    Config,
    Tools,
    Network,
    Storage,
    Manifests,
    Hardware,
}

impl ValidationScope {
    pub const NAMES: [&'static str; 7] = ["all", "config", "tools", "network", "storage", "manifests", "hardware"];

    /// Whether a check in `scope` belongs to this selection.
    pub fn includes(&self, scope: ValidationScope) -> bool {
        *self == Self::All || *self == scope
    }
}

impl fmt::Display for ValidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Config => "config",
            Self::Tools => "tools",
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Manifests => "manifests",
            Self::Hardware => "hardware",
        };
        f.write_str(name)
    }
}

impl FromStr for ValidationScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "config" => Ok(Self::Config),
            "tools" => Ok(Self::Tools),
            "network" => Ok(Self::Network),
            "storage" => Ok(Self::Storage),
            "manifests" => Ok(Self::Manifests),
            "hardware" => Ok(Self::Hardware),
            other => Err(format!(
                "unknown scope '{}', expected one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// Status could not be fully determined or an optional part is missing.
    Degraded,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Degraded => "WARN",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Pass,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            detail: detail.into(),
        }
    }

    pub fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Degraded,
            detail: detail.into(),
        }
    }
}

/// A read-only probe of one precondition.
#[async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> String;

    fn scope(&self) -> ValidationScope;

    /// Only mandatory failures fail the gate.
    fn mandatory(&self) -> bool {
        true
    }

    async fn run(&self) -> CheckOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub check: String,
    pub scope: ValidationScope,
    pub mandatory: bool,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub entries: Vec<ReportEntry>,
}

impl ValidationReport {
    fn new(entries: Vec<ReportEntry>) -> Self {
        let passed = !entries
            .iter()
            .any(|e| e.mandatory && e.status == CheckStatus::Fail);
        Self { passed, entries }
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Mandatory failures, in declaration order.
    pub fn blocking(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| e.mandatory && e.status == CheckStatus::Fail)
    }

    /// Non-blocking problems: degraded outcomes and optional failures.
    pub fn warnings(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| {
            e.status == CheckStatus::Degraded || (!e.mandatory && e.status == CheckStatus::Fail)
        })
    }
}

/// Run every check once and aggregate.
pub async fn run_all(checks: &[Box<dyn Check>]) -> ValidationReport {
    let outcomes = join_all(checks.iter().map(|c| c.run())).await;

    let entries: Vec<ReportEntry> = checks
        .iter()
        .zip(outcomes)
        .map(|(check, outcome)| {
            let name = check.name();
            match outcome.status {
                CheckStatus::Pass => tracing::debug!(check = %name, detail = %outcome.detail, "check passed"),
                CheckStatus::Degraded => tracing::warn!(check = %name, detail = %outcome.detail, "check degraded"),
                CheckStatus::Fail => tracing::warn!(
                    check = %name,
                    mandatory = check.mandatory(),
                    detail = %outcome.detail,
                    "check failed"
                ),
            }
            ReportEntry {
                check: name,
                scope: check.scope(),
                mandatory: check.mandatory(),
                status: outcome.status,
                detail: outcome.detail,
            }
        })
        .collect();

    ValidationReport::new(entries)
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command implementations.
//!
//! Each command prints its result to stdout and returns the process exit
//! code: 0 on success, 1 on any failure.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::bringup::{self, Collaborators, UpOptions};
use crate::config::{keys, Configuration};
use crate::k8s::{DeploymentProfile, ProfileKind};
use crate::lifecycle::{FailurePolicy, Orchestrator};
use crate::network::{IdempotentMutator, NetworkBinding};
use crate::readiness::{wait_until, ConditionSpec, ReadinessPolicy};
use crate::status::{self, HealthState};
use crate::validation::{run_all, standard_checks, ValidationScope};

use super::output::{self, emit};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Everything a command needs for one invocation.
pub struct CommandContext<'a> {
    pub config: &'a Configuration,
    pub collab: &'a Collaborators,
    pub json: bool,
    pub cancel: CancellationToken,
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    error: &'a str,
    issues: Vec<String>,
}

fn report_error(json: bool, message: &str, issues: Vec<String>) -> i32 {
    if json {
        emit(true, &ErrorReport { error: message, issues }, |_| String::new());
    } else {
        eprintln!("Error: {}", message);
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
    }
    EXIT_FAILURE
}

/// Refuse to mutate anything while the configuration has semantic issues.
fn ensure_config_valid(ctx: &CommandContext<'_>) -> Result<(), i32> {
    let issues = ctx.config.issues();
    if issues.is_empty() {
        return Ok(());
    }
    let rendered = issues.iter().map(ToString::to_string).collect();
    Err(report_error(ctx.json, "configuration is invalid, nothing was changed", rendered))
}

fn build_profile(ctx: &CommandContext<'_>, kind: ProfileKind) -> Result<DeploymentProfile, i32> {
    ensure_config_valid(ctx)?;
    DeploymentProfile::build(ctx.config, kind).map_err(|e| {
        let rendered = e.issues.iter().map(ToString::to_string).collect();
        report_error(ctx.json, &format!("profile '{}' is invalid, nothing was changed", kind), rendered)
    })
}

pub async fn run_validate(ctx: &CommandContext<'_>, scope: ValidationScope) -> i32 {
    let checks = standard_checks(ctx.config, &ctx.collab.check_deps(), scope);
    let report = run_all(&checks).await;
    emit(ctx.json, &report, output::render_validation);
    if report.passed {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

pub async fn run_apply(ctx: &CommandContext<'_>, kind: ProfileKind, policy: FailurePolicy) -> i32 {
    let profile = match build_profile(ctx, kind) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let report = Orchestrator::new(ctx.collab.cluster.as_ref()).apply(&profile, policy).await;
    emit(ctx.json, &report, output::render_lifecycle);
    if report.success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

pub async fn run_delete(ctx: &CommandContext<'_>, kind: ProfileKind, policy: FailurePolicy) -> i32 {
    let profile = match build_profile(ctx, kind) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let report = Orchestrator::new(ctx.collab.cluster.as_ref()).delete(&profile, policy).await;
    emit(ctx.json, &report, output::render_lifecycle);
    if report.success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

pub async fn run_status(ctx: &CommandContext<'_>, log_lines: usize) -> i32 {
    let report = status::collect(ctx.config, &ctx.collab.status_sources(), log_lines).await;
    emit(ctx.json, &report, status::render_status);
    if report.health == HealthState::Unhealthy {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

#[derive(Serialize)]
struct WaitReport<'a> {
    condition: String,
    #[serde(flatten)]
    outcome: &'a crate::readiness::WaitOutcome,
}

pub async fn run_wait(ctx: &CommandContext<'_>, condition: &ConditionSpec, timeout: Option<Duration>) -> i32 {
    let probe = condition.build(ctx.config, &ctx.collab.probe_deps());
    let policy = ReadinessPolicy::from_settings(&ctx.config.readiness).with_deadline(timeout);
    tracing::info!(
        condition = %probe.describe(),
        max_attempts = policy.max_attempts,
        budget_secs = bringup::wait_budget(&policy).as_secs(),
        "waiting for condition"
    );
    let outcome = wait_until(probe.as_ref(), &policy, &ctx.cancel).await;
    let report = WaitReport {
        condition: probe.describe(),
        outcome: &outcome,
    };
    emit(ctx.json, &report, |r| output::render_wait(&r.condition, r.outcome));
    if outcome.is_ready() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

pub async fn run_up(ctx: &CommandContext<'_>, options: &UpOptions) -> i32 {
    let report = bringup::run_up(ctx.config, ctx.collab, options, &ctx.cancel).await;
    emit(ctx.json, &report, output::render_bringup);
    if report.succeeded {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

pub async fn run_network(ctx: &CommandContext<'_>) -> i32 {
    let binding = NetworkBinding::from_config(ctx.config);
    match IdempotentMutator::new(ctx.collab.host.as_ref()).ensure(&binding).await {
        Ok(report) => {
            emit(ctx.json, &report, output::render_mutation);
            EXIT_SUCCESS
        }
        Err(e) => report_error(ctx.json, &format!("fabric binding failed: {}", e), Vec::new()),
    }
}

pub async fn run_logs(ctx: &CommandContext<'_>, lines: usize) -> i32 {
    match ctx.collab.runtime.tail_output(lines).await {
        Ok(output_lines) => {
            emit(ctx.json, &output_lines, |l| output::render_lines(l));
            EXIT_SUCCESS
        }
        Err(e) => report_error(ctx.json, &format!("cannot read runtime output: {}", e), Vec::new()),
    }
}

/// Effective configuration with secrets redacted.
pub fn run_config_show(pairs: &BTreeMap<String, String>, json: bool) -> i32 {
    let effective = Configuration::effective_pairs(pairs);
    if json {
        let map: BTreeMap<&str, &str> = effective.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        emit(true, &map, |_| String::new());
    } else {
        print!("{}", output::render_pairs(&effective));
    }
    EXIT_SUCCESS
}

#[derive(Serialize)]
struct KeyDefault {
    key: &'static str,
    default: &'static str,
    description: &'static str,
}

/// Every recognised key with its default.
pub fn run_config_defaults(json: bool) -> i32 {
    let rows: Vec<KeyDefault> = keys::KEYS
        .iter()
        .map(|doc| KeyDefault {
            key: doc.key,
            default: doc.default,
            description: doc.description,
        })
        .collect();
    emit(json, &rows, |rows| {
        rows.iter()
            .map(|r| {
                let default = if r.default.is_empty() { "<unset>" } else { r.default };
                format!("{:24} {:32} {}\n", r.key, default, r.description)
            })
            .collect()
    });
    EXIT_SUCCESS
}

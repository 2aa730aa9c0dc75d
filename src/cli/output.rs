// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Human and JSON rendering of command results.

use serde::Serialize;

use crate::bringup::{BringUpReport, StepResult};
use crate::compute::ServeOutcome;
use crate::lifecycle::{LifecycleReport, ResourceStatus};
use crate::network::{MutationOutcome, MutationReport, PersistOutcome, SelectionReason};
use crate::readiness::{TimeoutReason, WaitOutcome};
use crate::status::format::{format_duration, truncate};
use crate::status::render_status;
use crate::validation::{CheckStatus, ValidationReport};

/// Print `value` as pretty JSON, or its human rendering.
pub fn emit<T, F>(json: bool, value: &T, human: F)
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error: cannot encode result as JSON: {}", e),
        }
    } else {
        print!("{}", human(value));
    }
}

pub fn render_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    out.push_str("Validation\n");
    for entry in &report.entries {
        let optional = if entry.mandatory { "" } else { " (optional)" };
        out.push_str(&format!(
            "  [{}] {:22} {}{}\n",
            entry.status,
            truncate(&format!("{}:{}", entry.scope, entry.check), 22),
            entry.detail,
            optional
        ));
    }
    out.push_str(&format!(
        "\n  {} passed, {} warned, {} failed; gate {}\n",
        report.count(CheckStatus::Pass),
        report.count(CheckStatus::Degraded),
        report.count(CheckStatus::Fail),
        if report.passed { "PASSED" } else { "FAILED" }
    ));
    out
}

pub fn render_lifecycle(report: &LifecycleReport) -> String {
    let mut out = format!("{} profile '{}'\n", capitalize(&report.operation.to_string()), report.profile);
    for outcome in &report.outcomes {
        let line = match &outcome.status {
            ResourceStatus::Failed(e) => format!("  {:18} {}: {}\n", "failed", outcome.resource, e),
            status => format!("  {:18} {}\n", status.label(), outcome.resource),
        };
        out.push_str(&line);
    }
    let failed = report.failures().count();
    if failed == 0 {
        out.push_str(&format!("\n  {} resource(s) done\n", report.outcomes.len()));
    } else {
        out.push_str(&format!("\n  {} of {} resource(s) failed\n", failed, report.outcomes.len()));
    }
    out
}

pub fn render_wait(condition: &str, outcome: &WaitOutcome) -> String {
    match outcome {
        WaitOutcome::Ready {
            attempts,
            elapsed,
            detail,
        } => format!(
            "{}: ready after {} attempt(s) in {} ({})\n",
            condition,
            attempts,
            format_duration(elapsed.as_secs()),
            detail
        ),
        WaitOutcome::Timeout {
            attempts,
            elapsed,
            reason,
            last_observation,
        } => {
            let why = match reason {
                TimeoutReason::AttemptsExhausted => "attempts exhausted",
                TimeoutReason::Deadline => "deadline reached",
                TimeoutReason::Cancelled => "cancelled",
            };
            format!(
                "{}: not ready, {} after {} attempt(s) in {} (last: {})\n",
                condition,
                why,
                attempts,
                format_duration(elapsed.as_secs()),
                last_observation.as_deref().unwrap_or("none")
            )
        }
    }
}

pub fn render_mutation(report: &MutationReport) -> String {
    let reason = match report.reason {
        SelectionReason::Carrier => "carrier up",
        SelectionReason::FirstPresent => "no carrier on any candidate, first present",
    };
    let outcome = match report.outcome {
        MutationOutcome::Applied => "added",
        MutationOutcome::AlreadySatisfied => "already present",
        MutationOutcome::HeldElsewhere => "already held by this candidate",
    };
    let persistence = match &report.persistence {
        PersistOutcome::Persisted => "recorded in NetworkManager".to_string(),
        PersistOutcome::AlreadyPersisted => "already recorded".to_string(),
        PersistOutcome::Skipped => "not requested".to_string(),
        PersistOutcome::Failed(detail) => format!("WARNING not recorded: {}", detail),
    };
    format!(
        "Fabric\n  Interface:   {} ({})\n  Address:     {} {}\n  Persistence: {}\n",
        report.interface, reason, report.address, outcome, persistence
    )
}

pub fn render_bringup(report: &BringUpReport) -> String {
    let mut out = String::new();
    if let Some(validation) = &report.validation {
        out.push_str(&render_validation(validation));
        out.push('\n');
    }
    if let Some(apply) = &report.apply {
        out.push_str(&render_lifecycle(apply));
        out.push('\n');
    }
    match &report.network {
        Some(StepResult::Done(m)) => out.push_str(&render_mutation(m)),
        Some(StepResult::Failed(e)) => out.push_str(&format!("Fabric\n  FAILED: {}\n", e)),
        None => {}
    }
    if let Some(wait) = &report.gpu_workers {
        out.push_str(&render_wait("gpu-workers", wait));
    }
    match &report.serve {
        Some(StepResult::Done(ServeOutcome::Started)) => out.push_str("serve: model server started\n"),
        Some(StepResult::Done(ServeOutcome::AlreadyServing)) => {
            out.push_str("serve: model server already running\n")
        }
        Some(StepResult::Failed(e)) => out.push_str(&format!("serve: FAILED: {}\n", e)),
        None => {}
    }
    if let Some(wait) = &report.model_health {
        out.push_str(&render_wait("model-health", wait));
    }
    if let Some(status) = &report.status {
        out.push('\n');
        out.push_str(&render_status(status));
    }

    if !report.warnings.is_empty() {
        out.push_str(&format!("\nWarnings ({})\n", report.warnings.len()));
        for warning in &report.warnings {
            out.push_str(&format!("  ! {}\n", warning));
        }
    }
    match (&report.aborted_at, &report.abort_reason) {
        (Some(stage), reason) => out.push_str(&format!(
            "\nBring-up ABORTED at {}: {}\n",
            stage,
            reason.as_deref().unwrap_or("unknown reason")
        )),
        (None, _) => out.push_str("\nBring-up complete\n"),
    }
    out
}

pub fn render_lines(lines: &[String]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn render_pairs(pairs: &[(String, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(k, v)| format!("{:width$} = {}\n", k, v, width = width))
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;

struct Fixed {
    name: &'static str,
    mandatory: bool,
    outcome: CheckOutcome,
    delay: Duration,
    runs: Arc<AtomicU32>,
}

impl Fixed {
    fn new(name: &'static str, outcome: CheckOutcome) -> Self {
        Self {
            name,
            mandatory: true,
            outcome,
            delay: Duration::ZERO,
            runs: Arc::new(AtomicU32::new(0)),
        }
    }

    fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Check for Fixed {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Config
    }

    fn mandatory(&self) -> bool {
        self.mandatory
    }

    async fn run(&self) -> CheckOutcome {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}

#[tokio::test]
async fn test_all_pass() {
    let checks: Vec<Box<dyn Check>> = vec![
        Box::new(Fixed::new("a", CheckOutcome::pass("ok"))),
        Box::new(Fixed::new("b", CheckOutcome::pass("ok"))),
    ];
    let report = run_all(&checks).await;
    assert!(report.passed);
    assert_eq!(report.count(CheckStatus::Pass), 2);
}

#[tokio::test]
async fn test_every_check_runs_once_despite_failures() {
    let first = Fixed::new("first", CheckOutcome::fail("broken"));
    let second = Fixed::new("second", CheckOutcome::pass("ok"));
    let counters = [first.runs.clone(), second.runs.clone()];
    let checks: Vec<Box<dyn Check>> = vec![Box::new(first), Box::new(second)];

    let report = run_all(&checks).await;

    assert!(!report.passed);
    for runs in counters {
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
    assert_eq!(report.blocking().count(), 1);
}

#[tokio::test]
async fn test_optional_failure_and_degraded_do_not_block() {
    let checks: Vec<Box<dyn Check>> = vec![
        Box::new(Fixed::new("tool", CheckOutcome::fail("missing")).optional()),
        Box::new(Fixed::new("token", CheckOutcome::degraded("unset"))),
        Box::new(Fixed::new("config", CheckOutcome::pass("ok"))),
    ];
    let report = run_all(&checks).await;

    assert!(report.passed);
    let warned: Vec<&str> = report.warnings().map(|e| e.check.as_str()).collect();
    assert_eq!(warned, vec!["tool", "token"]);
}

#[tokio::test(start_paused = true)]
async fn test_report_keeps_declaration_order() {
    let checks: Vec<Box<dyn Check>> = vec![
        Box::new(Fixed::new("slow", CheckOutcome::pass("ok")).slow(Duration::from_secs(3))),
        Box::new(Fixed::new("fast", CheckOutcome::fail("no"))),
        Box::new(Fixed::new("medium", CheckOutcome::pass("ok")).slow(Duration::from_secs(1))),
    ];
    let started = tokio::time::Instant::now();
    let report = run_all(&checks).await;

    let names: Vec<&str> = report.entries.iter().map(|e| e.check.as_str()).collect();
    assert_eq!(names, vec!["slow", "fast", "medium"]);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[test]
fn test_scope_parse_and_includes() {
    assert_eq!("Network".parse::<ValidationScope>().unwrap(), ValidationScope::Network);
    assert!("disks".parse::<ValidationScope>().unwrap_err().contains("hardware"));
    assert!(ValidationScope::All.includes(ValidationScope::Storage));
    assert!(!ValidationScope::Tools.includes(ValidationScope::Storage));
    for name in ValidationScope::NAMES {
        let scope: ValidationScope = name.parse().unwrap();
        assert_eq!(scope.to_string(), name);
    }
}

#[tokio::test]
async fn test_report_serializes_statuses() {
    let checks: Vec<Box<dyn Check>> = vec![Box::new(Fixed::new("x", CheckOutcome::degraded("meh")))];
    let json = serde_json::to_value(run_all(&checks).await).unwrap();
    assert_eq!(json["passed"], true);
    assert_eq!(json["entries"][0]["status"], "degraded");
    assert_eq!(json["entries"][0]["scope"], "config");
}

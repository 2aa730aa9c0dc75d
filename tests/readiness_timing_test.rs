// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Readiness bounds on tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use gg_bringup::error::BringupError;
use gg_bringup::exec::CommandOutput;
use gg_bringup::readiness::{
    wait_until, GpuWorkersProbe, HttpHealthProbe, ReadinessPolicy, TimeoutReason, WaitOutcome,
};
use gg_bringup::testkit::{inventory, FakeRuntime, ScriptedRunner};

// ============================================================================
// Attempt and time bounds
// ============================================================================

#[tokio::test(start_paused = true)]
async fn readiness_never_ready_is_bounded() {
    for (attempts, delay) in [(1u32, 5u64), (4, 5), (60, 5), (10, 1)] {
        let runtime = Arc::new(FakeRuntime::new().with_inventories(vec![Ok(inventory(1, 1))]));
        let probe = GpuWorkersProbe::new(runtime.clone(), 2);
        let policy = ReadinessPolicy::new(attempts, Duration::from_secs(delay));
        let started = Instant::now();

        let outcome = wait_until(&probe, &policy, &CancellationToken::new()).await;

        assert_eq!(outcome.attempts(), attempts);
        assert_eq!(runtime.inventory_calls(), attempts);
        assert!(started.elapsed() <= Duration::from_secs(delay * u64::from(attempts)));
        assert!(matches!(
            outcome,
            WaitOutcome::Timeout {
                reason: TimeoutReason::AttemptsExhausted,
                ..
            }
        ));
    }
}

#[tokio::test(start_paused = true)]
async fn readiness_ready_on_attempt_twelve_not_before() {
    let runtime = Arc::new(FakeRuntime::new().gpus_from_attempt(12, 2));
    let probe = GpuWorkersProbe::new(runtime.clone(), 2);
    let policy = ReadinessPolicy::new(60, Duration::from_secs(5));

    let outcome = wait_until(&probe, &policy, &CancellationToken::new()).await;

    assert!(outcome.is_ready());
    assert_eq!(outcome.attempts(), 12);
    assert_eq!(runtime.inventory_calls(), 12);
    let WaitOutcome::Ready { elapsed, .. } = outcome else {
        unreachable!()
    };
    assert_eq!(elapsed, Duration::from_secs(55));
}

// ============================================================================
// Errors and cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn readiness_query_errors_are_not_fatal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_sequence(
        "curl",
        vec![
            Err(BringupError::transient("curl", "timed out")),
            Ok(CommandOutput::failed(7, "connection refused")),
            Ok(CommandOutput::ok("503")),
            Ok(CommandOutput::ok("200")),
        ],
    );
    let probe = HttpHealthProbe::new(runner.clone(), "http://127.0.0.1:8000/health");
    let policy = ReadinessPolicy::new(10, Duration::from_secs(2));

    let outcome = wait_until(&probe, &policy, &CancellationToken::new()).await;

    assert!(outcome.is_ready());
    assert_eq!(outcome.attempts(), 4);
    assert_eq!(runner.calls().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn readiness_deadline_cuts_attempts_short() {
    let runtime = Arc::new(FakeRuntime::new().with_inventories(vec![Ok(inventory(1, 0))]));
    let probe = GpuWorkersProbe::new(runtime, 2);
    let policy = ReadinessPolicy::new(60, Duration::from_secs(5)).with_deadline(Some(Duration::from_secs(30)));
    let started = Instant::now();

    let outcome = wait_until(&probe, &policy, &CancellationToken::new()).await;

    assert!(started.elapsed() <= Duration::from_secs(30));
    assert!(matches!(
        outcome,
        WaitOutcome::Timeout {
            reason: TimeoutReason::Deadline,
            ..
        }
    ));
    assert!(outcome.into_result("2 GPU workers").unwrap_err().to_string().contains("deadline"));
}

#[tokio::test(start_paused = true)]
async fn readiness_cancel_interrupts_delay() {
    let runtime = Arc::new(FakeRuntime::new().with_inventories(vec![Ok(inventory(1, 0))]));
    let probe = GpuWorkersProbe::new(runtime, 2);
    let policy = ReadinessPolicy::new(60, Duration::from_secs(5));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        trigger.cancel();
    });
    let started = Instant::now();

    let outcome = wait_until(&probe, &policy, &cancel).await;

    assert_eq!(started.elapsed(), Duration::from_secs(7));
    assert_eq!(outcome.attempts(), 2);
}

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::*;

/// Ready from the `ready_on`-th call; optionally errors before that.
struct CountingProbe {
    calls: AtomicU32,
    ready_on: Option<u32>,
    error_before_ready: bool,
}

impl CountingProbe {
    fn ready_on(n: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            ready_on: Some(n),
            error_before_ready: false,
        }
    }

    fn never() -> Self {
        Self {
            calls: AtomicU32::new(0),
            ready_on: None,
            error_before_ready: false,
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadinessProbe for CountingProbe {
    fn describe(&self) -> String {
        "counting probe".to_string()
    }

    async fn probe(&self) -> Result<ProbeState, BringupError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.ready_on {
            Some(target) if n >= target => Ok(ProbeState::Ready(format!("call {}", n))),
            _ if self.error_before_ready => Err(BringupError::transient("probe", "connection refused")),
            _ => Ok(ProbeState::NotReady(format!("call {}", n))),
        }
    }
}

fn policy(max: u32, delay_secs: u64) -> ReadinessPolicy {
    ReadinessPolicy::new(max, Duration::from_secs(delay_secs))
}

#[tokio::test(start_paused = true)]
async fn test_ready_on_first_attempt_does_not_sleep() {
    let probe = CountingProbe::ready_on(1);
    let outcome = wait_until(&probe, &policy(5, 5), &CancellationToken::new()).await;
    match outcome {
        WaitOutcome::Ready { attempts, elapsed, .. } => {
            assert_eq!(attempts, 1);
            assert_eq!(elapsed, Duration::ZERO);
        }
        other => panic!("expected ready, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_ready_after_eleven_delays() {
    let probe = CountingProbe::ready_on(12);
    let outcome = wait_until(&probe, &policy(60, 5), &CancellationToken::new()).await;
    match outcome {
        WaitOutcome::Ready { attempts, elapsed, .. } => {
            assert_eq!(attempts, 12);
            assert_eq!(elapsed, Duration::from_secs(55));
        }
        other => panic!("expected ready, got {:?}", other),
    }
    assert_eq!(probe.calls(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_attempts_time_out_within_budget() {
    let probe = CountingProbe::never();
    let outcome = wait_until(&probe, &policy(4, 5), &CancellationToken::new()).await;
    match &outcome {
        WaitOutcome::Timeout {
            attempts,
            elapsed,
            reason,
            last_observation,
        } => {
            assert_eq!(*attempts, 4);
            assert!(*elapsed <= Duration::from_secs(20));
            assert_eq!(*elapsed, Duration::from_secs(15));
            assert_eq!(*reason, TimeoutReason::AttemptsExhausted);
            assert_eq!(last_observation.as_deref(), Some("call 4"));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(probe.calls(), 4);
    let err = outcome.into_result("counting probe").unwrap_err();
    assert!(matches!(err, BringupError::Timeout { attempts: 4, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_probe_errors_count_as_not_ready() {
    let probe = CountingProbe {
        calls: AtomicU32::new(0),
        ready_on: Some(3),
        error_before_ready: true,
    };
    let outcome = wait_until(&probe, &policy(5, 1), &CancellationToken::new()).await;
    assert!(outcome.is_ready());
    assert_eq!(outcome.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_resolves_as_timeout() {
    let probe = CountingProbe::never();
    let policy = policy(100, 5).with_deadline(Some(Duration::from_secs(12)));
    let outcome = wait_until(&probe, &policy, &CancellationToken::new()).await;
    match outcome {
        WaitOutcome::Timeout { reason, elapsed, attempts, .. } => {
            assert_eq!(reason, TimeoutReason::Deadline);
            assert_eq!(elapsed, Duration::from_secs(12));
            assert_eq!(attempts, 3);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_delay() {
    let probe = CountingProbe::never();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        trigger.cancel();
    });

    let outcome = wait_until(&probe, &policy(60, 5), &cancel).await;
    match outcome {
        WaitOutcome::Timeout { reason, attempts, elapsed, .. } => {
            assert_eq!(reason, TimeoutReason::Cancelled);
            assert_eq!(attempts, 2);
            assert_eq!(elapsed, Duration::from_secs(7));
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_already_cancelled_never_probes() {
    let probe = CountingProbe::ready_on(1);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = wait_until(&probe, &policy(5, 1), &cancel).await;
    assert!(!outcome.is_ready());
    assert_eq!(probe.calls(), 0);
}

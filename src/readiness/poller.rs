// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded polling of a readiness probe.
//!
//! The inter-attempt delay is the only wait. It races the cancellation token
//! and the optional overall deadline, and both of those resolve as a
//! timeout, never as success.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::ReadinessSettings;
use crate::error::BringupError;

use super::probes::{ProbeState, ReadinessProbe};

/// Attempt budget for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// Overall bound across all attempts and delays.
    pub deadline: Option<Duration>,
}

impl ReadinessPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            deadline: None,
        }
    }

    pub fn from_settings(settings: &ReadinessSettings) -> Self {
        Self::new(settings.max_attempts, settings.delay)
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutReason {
    AttemptsExhausted,
    Deadline,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum WaitOutcome {
    Ready {
        attempts: u32,
        #[serde(with = "secs")]
        elapsed: Duration,
        detail: String,
    },
    Timeout {
        attempts: u32,
        #[serde(with = "secs")]
        elapsed: Duration,
        reason: TimeoutReason,
        last_observation: Option<String>,
    },
}

mod secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

impl WaitOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. } | Self::Timeout { attempts, .. } => *attempts,
        }
    }

    /// Convert a timeout into [`BringupError::Timeout`] naming `condition`.
    pub fn into_result(self, condition: &str) -> Result<Self, BringupError> {
        match &self {
            Self::Ready { .. } => Ok(self),
            Self::Timeout {
                attempts,
                reason,
                last_observation,
                ..
            } => {
                let why = match reason {
                    TimeoutReason::AttemptsExhausted => "attempts exhausted",
                    TimeoutReason::Deadline => "deadline reached",
                    TimeoutReason::Cancelled => "cancelled",
                };
                let detail = match last_observation {
                    Some(obs) => format!("{}; last observed: {}", why, obs),
                    None => why.to_string(),
                };
                Err(BringupError::Timeout {
                    condition: condition.to_string(),
                    attempts: *attempts,
                    detail,
                })
            }
        }
    }
}

enum Interrupt {
    Cancelled,
    Deadline,
}

async fn until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Poll `probe` until it reports ready or the policy is exhausted.
///
/// Each attempt queries once. A probe error counts as "not ready yet". The
/// delay is only slept between attempts, so `max_attempts` failing probes
/// finish after `(max_attempts - 1) * delay`.
pub async fn wait_until<P>(probe: &P, policy: &ReadinessPolicy, cancel: &CancellationToken) -> WaitOutcome
where
    P: ReadinessProbe + ?Sized,
{
    let started = Instant::now();
    let deadline = policy.deadline.map(|d| started + d);
    let condition = probe.describe();
    let mut attempts = 0;
    let mut last_observation: Option<String> = None;

    let timeout = |attempts, reason, last_observation| WaitOutcome::Timeout {
        attempts,
        elapsed: started.elapsed(),
        reason,
        last_observation,
    };

    if cancel.is_cancelled() {
        return timeout(0, TimeoutReason::Cancelled, None);
    }

    while attempts < policy.max_attempts {
        if attempts > 0 {
            let interrupted = tokio::select! {
                biased;
                _ = cancel.cancelled() => Some(Interrupt::Cancelled),
                _ = until_deadline(deadline) => Some(Interrupt::Deadline),
                _ = tokio::time::sleep(policy.delay) => None,
            };
            match interrupted {
                Some(Interrupt::Cancelled) => return timeout(attempts, TimeoutReason::Cancelled, last_observation),
                Some(Interrupt::Deadline) => return timeout(attempts, TimeoutReason::Deadline, last_observation),
                None => {}
            }
        }

        attempts += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return timeout(attempts, TimeoutReason::Cancelled, last_observation),
            _ = until_deadline(deadline) => return timeout(attempts, TimeoutReason::Deadline, last_observation),
            r = probe.probe() => r,
        };

        match result {
            Ok(ProbeState::Ready(detail)) => {
                tracing::info!(condition = %condition, attempt = attempts, detail = %detail, "condition ready");
                return WaitOutcome::Ready {
                    attempts,
                    elapsed: started.elapsed(),
                    detail,
                };
            }
            Ok(ProbeState::NotReady(detail)) => {
                tracing::debug!(
                    condition = %condition,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    detail = %detail,
                    "not ready"
                );
                last_observation = Some(detail);
            }
            Err(e) => {
                tracing::debug!(condition = %condition, attempt = attempts, error = %e, "probe failed");
                last_observation = Some(e.to_string());
            }
        }
    }

    tracing::warn!(condition = %condition, attempts, "readiness attempts exhausted");
    timeout(attempts, TimeoutReason::AttemptsExhausted, last_observation)
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;

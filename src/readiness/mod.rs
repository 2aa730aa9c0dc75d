// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Readiness waiting.

pub mod poller;
pub mod probes;

pub use poller::{wait_until, ReadinessPolicy, TimeoutReason, WaitOutcome};
pub use probes::{
    ConditionSpec, GpuWorkersProbe, HttpHealthProbe, PodsReadyProbe, ProbeDeps, ProbeState, ReadinessProbe,
};

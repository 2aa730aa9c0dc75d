// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource lifecycle orchestration.

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::Orchestrator;
pub use outcome::{FailurePolicy, LifecycleReport, Operation, ResourceOutcome, ResourceStatus};

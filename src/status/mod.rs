// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only status projection.

pub mod format;
pub mod report;

pub use format::render_status;
pub use report::{collect, HealthState, Observed, StatusReport, StatusSources};

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pre-flight validation.

pub mod checks;
pub mod gate;

pub use checks::{standard_checks, CheckDeps};
pub use gate::{run_all, Check, CheckOutcome, CheckStatus, ReportEntry, ValidationReport, ValidationScope};

// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-line surface.

pub mod commands;
pub mod output;

pub use commands::{
    run_apply, run_config_defaults, run_config_show, run_delete, run_logs, run_network, run_status, run_up,
    run_validate, run_wait, CommandContext, EXIT_FAILURE, EXIT_SUCCESS,
};

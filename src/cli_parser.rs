// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for GG-BRINGUP.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use gg_bringup::k8s::ProfileKind;
use gg_bringup::lifecycle::FailurePolicy;
use gg_bringup::readiness::ConditionSpec;
use gg_bringup::validation::ValidationScope;

/// Bring-up reconciler for multi-node GPU inference clusters
#[derive(Parser, Debug)]
#[command(name = "gg-bringup")]
#[command(version)]
#[command(after_help = "EXIT CODES:\n    0  Success\n    1  Failure\n\n\
ENVIRONMENT:\n    Every configuration key (see `gg-bringup config defaults`) may be set\n    \
in the environment. RUST_LOG overrides LOG_LEVEL.")]
pub struct Cli {
    /// Configuration file (KEY=VALUE or .toml); defaults to ./bringup.env when present
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override one configuration key
    #[arg(long = "set", global = true, value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub overrides: Vec<(String, String)>,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Treat network failures, serve failures and timeouts as fatal
    #[arg(long, global = true)]
    pub strict: bool,

    /// Attempt every resource even after a failure
    #[arg(long, global = true, conflicts_with = "fail_fast")]
    pub continue_on_error: bool,

    /// Stop at the first failed resource
    #[arg(long, global = true)]
    pub fail_fast: bool,

    /// Decrease log verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run pre-flight checks [all, config, tools, network, storage, manifests, hardware]
    Validate {
        #[arg(default_value = "all")]
        scope: ValidationScope,
    },

    /// Apply a deployment profile in order [serving, monitoring, agents, all]
    Apply {
        #[arg(default_value = "all")]
        profile: ProfileKind,
    },

    /// Delete a deployment profile in reverse order
    Delete {
        #[arg(default_value = "all")]
        profile: ProfileKind,
    },

    /// Show cluster, fabric and runtime state
    Status {
        /// Runtime output lines to include
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
    },

    /// Wait for gpu-workers[=N], model-health[=URL] or pods[=N]
    WaitForReady {
        #[arg(default_value = "gpu-workers")]
        condition: ConditionSpec,

        /// Overall bound, e.g. 300, 90s or 10m
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,
    },

    /// Validate, apply, bind the fabric, start serving and wait for health
    Up {
        /// Runtime output lines in the final snapshot
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
    },

    /// Ensure the fabric address is bound
    Network,

    /// Show recent model server output
    Logs {
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Effective configuration with secrets redacted
    Show,
    /// Every key with its default
    Defaults,
}

impl Cli {
    /// `default` unless a policy flag was given.
    pub fn policy(&self, default: FailurePolicy) -> FailurePolicy {
        if self.continue_on_error {
            FailurePolicy::ContinueOnError
        } else if self.fail_fast {
            FailurePolicy::AbortOnFailure
        } else {
            default
        }
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_ascii_uppercase(), value.to_string()))
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (digits, scale) = if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        (s, 1)
    };
    digits
        .parse::<u64>()
        .map(|n| Duration::from_secs(n.saturating_mul(scale)))
        .map_err(|_| format!("'{}' is not a duration (e.g. 300, 90s, 10m)", s))
}

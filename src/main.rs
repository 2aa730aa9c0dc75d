// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! GG-BRINGUP entry point.
//!
//! Loads configuration once, installs logging and Ctrl-C cancellation, then
//! dispatches to the command.

mod cli_parser;

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use gg_bringup::bringup::{Collaborators, UpOptions};
use gg_bringup::cli::{self, CommandContext, EXIT_FAILURE};
use gg_bringup::config::{keys, loader, Configuration};
use gg_bringup::lifecycle::FailurePolicy;
use gg_bringup::logging;

use cli_parser::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    ExitCode::from(run(cli).await as u8)
}

async fn run(cli: Cli) -> i32 {
    let mut overrides = cli.overrides.clone();
    if cli.strict {
        overrides.push((keys::STRICT.to_string(), "true".to_string()));
    }

    let pairs = match loader::gather(cli.config.as_deref(), &overrides) {
        Ok(pairs) => pairs,
        Err(e) => return config_failure(&e.issues),
    };

    if let Command::Config(action) = &cli.command {
        return match action {
            ConfigCommand::Show => cli::run_config_show(&pairs, cli.json),
            ConfigCommand::Defaults => cli::run_config_defaults(cli.json),
        };
    }

    let mut config = match Configuration::from_pairs(&pairs) {
        Ok(config) => config,
        Err(e) => return config_failure(&e.issues),
    };
    config.logging.level = logging::level_for(cli.verbose, cli.quiet, &config.logging.level);
    logging::init(&config.logging);

    let collab = Collaborators::system(&config);
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let ctx = CommandContext {
        config: &config,
        collab: &collab,
        json: cli.json,
        cancel,
    };

    match &cli.command {
        Command::Validate { scope } => cli::run_validate(&ctx, *scope).await,
        Command::Apply { profile } => {
            cli::run_apply(&ctx, *profile, cli.policy(FailurePolicy::AbortOnFailure)).await
        }
        Command::Delete { profile } => {
            cli::run_delete(&ctx, *profile, cli.policy(FailurePolicy::ContinueOnError)).await
        }
        Command::Status { lines } => cli::run_status(&ctx, *lines).await,
        Command::WaitForReady { condition, timeout } => cli::run_wait(&ctx, condition, *timeout).await,
        Command::Up { lines } => {
            let options = UpOptions {
                strict: config.strict,
                policy: cli.policy(FailurePolicy::AbortOnFailure),
                log_lines: *lines,
            };
            cli::run_up(&ctx, &options).await
        }
        Command::Network => cli::run_network(&ctx).await,
        Command::Logs { lines } => cli::run_logs(&ctx, *lines).await,
        // Answered before configuration was parsed.
        Command::Config(_) => EXIT_FAILURE,
    }
}

fn config_failure(issues: &[gg_bringup::error::BringupError]) -> i32 {
    eprintln!("Error: configuration rejected");
    for issue in issues {
        eprintln!("  - {}", issue);
    }
    EXIT_FAILURE
}

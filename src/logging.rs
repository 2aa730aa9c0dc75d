// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout carries only command results.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};

/// Filter from `RUST_LOG` when set, otherwise from the configured level.
pub fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(settings: &LoggingSettings) {
    let builder = fmt().with_env_filter(filter(settings)).with_writer(std::io::stderr);
    let installed = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.with_target(false).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Level to use when verbosity flags override the configuration.
pub fn level_for(verbose: u8, quiet: bool, configured: &str) -> String {
    match (quiet, verbose) {
        (true, _) => "error".to_string(),
        (false, 0) => configured.to_string(),
        (false, 1) => "debug".to_string(),
        (false, _) => "trace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(0, false, "warn"), "warn");
        assert_eq!(level_for(1, false, "warn"), "debug");
        assert_eq!(level_for(3, false, "warn"), "trace");
        assert_eq!(level_for(2, true, "warn"), "error");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = LoggingSettings {
            level: "gg_bringup=debug".to_string(),
            format: LogFormat::Json,
        };
        init(&settings);
        init(&settings);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! One console `fmt` layer behind an `EnvFilter` built from the configured
//! level and the per-crate debug flags.

use anyhow::{Context, Result};
use neat_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Filter for the given flags and config. `print_debug_logs` lowers the
/// default level to `debug` for every crate.
pub fn build_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    let default_level = if config.print_debug_logs {
        "debug"
    } else {
        config.global_log_level.as_str()
    };
    let directives = debug_flags.to_filter_string(default_level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {}", directives))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(debug_flags, config)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter);

    Registry::default()
        .with(console_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    tracing::debug!(
        target: "neat-observability",
        "Logging initialized (debug crates: {:?})",
        debug_flags.enabled_crates
    );
    Ok(())
}

/// [`init_logging`] with flags from the environment and default config
pub fn init_logging_default() -> Result<()> {
    init_logging(&crate::cli::parse_debug_flags(), &LoggingConfig::default())
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neat-observability
//!
//! Console logging for the NEAT crates with per-crate debug flags.
//!
//! ```rust,no_run
//! use neat_config::LoggingConfig;
//! use neat_observability::{init_logging, parse_debug_flags};
//!
//! let flags = parse_debug_flags();
//! init_logging(&flags, &LoggingConfig::default()).expect("logging already initialized");
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Crate names accepted by `--debug-<crate>` and `NEAT_DEBUG`.
/// They double as the `target:` of each crate's log statements.
pub const KNOWN_CRATES: &[&str] = &[
    "neat-network",
    "neat-genetics",
    "neat-experiments",
    "neat-config",
];

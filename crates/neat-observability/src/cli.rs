// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! `--debug-neat-genetics` style arguments and the `NEAT_DEBUG` environment
//! variable raise individual crates to `debug` level.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (comma-separated or `all`)
pub const DEBUG_ENV_VAR: &str = "NEAT_DEBUG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Collect every `--debug-{crate}` argument; `--debug-all` enables all
    /// known crates. Other arguments are ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                if !crate_name.is_empty() {
                    flags.enabled_crates.insert(crate_name.to_string());
                }
            }
        }
        flags
    }

    /// Merge a `NEAT_DEBUG` value
    pub fn apply_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',').map(str::trim) {
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string());
            }
        }
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directives: `default_level` plus `crate=debug` for each
    /// enabled crate, e.g. `"info,neat-genetics=debug"`
    pub fn to_filter_string(&self, default_level: &str) -> String {
        std::iter::once(default_level.to_string())
            .chain(self.enabled_crates.iter().map(|c| format!("{}=debug", c)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Flags from the process arguments and `NEAT_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV_VAR) {
        flags.apply_env_value(&value);
    }
    flags
}

pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for one crate

Available crates:
  {}

Environment Variable:
  {var}={{crate-name}}[,{{crate-name}}]
  {var}=all
"#,
        KNOWN_CRATES.join(", "),
        var = DEBUG_ENV_VAR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(args(&["neat-xor", "--debug-neat-genetics"]));
        assert!(flags.is_enabled("neat-genetics"));
        assert!(!flags.is_enabled("neat-network"));
        assert_eq!(flags.log_level("neat-genetics"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("neat-network"), tracing::Level::INFO);
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(args(&["--debug-all"]));
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        flags.apply_env_value(" neat-network , ,neat-config");
        assert!(flags.is_enabled("neat-network"));
        assert!(flags.is_enabled("neat-config"));
        assert_eq!(flags.enabled_crates.len(), 2);

        let mut flags = CrateDebugFlags::default();
        flags.apply_env_value("all");
        assert_eq!(flags.enabled_crates.len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::default();
        assert!(!flags.any_enabled());
        assert_eq!(flags.to_filter_string("warn"), "warn");

        let flags = CrateDebugFlags::from_args(args(&["--debug-neat-network", "--debug-neat-genetics"]));
        assert_eq!(
            flags.to_filter_string("info"),
            "info,neat-genetics=debug,neat-network=debug"
        );
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module checks that configuration values are within valid ranges and
//! reports every violation at once.

use crate::{ConfigError, ConfigResult, NeatConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    ProbabilityOutOfRange { field: String, value: f64 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProbabilityOutOfRange { field, value } => {
                write!(f, "{} = {} is outside valid range [0, 1]", field, value)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Probabilities inside [0, 1]
/// - Non-zero population size, generation count and runtime ceilings
/// - Positive compatibility threshold
/// - Known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &NeatConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_probabilities(config, &mut errors);
    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_probabilities(config: &NeatConfig, errors: &mut Vec<ConfigValidationError>) {
    let m = &config.mutation;
    let mt = &config.mating;
    let p = &config.population;
    let probabilities = [
        ("population.survival_thresh", p.survival_thresh),
        ("population.interspecies_mate_rate", p.interspecies_mate_rate),
        ("mutation.trait_param_mut_prob", m.trait_param_mut_prob),
        ("mutation.mutate_only_prob", m.mutate_only_prob),
        ("mutation.mutate_random_trait_prob", m.mutate_random_trait_prob),
        ("mutation.mutate_link_trait_prob", m.mutate_link_trait_prob),
        ("mutation.mutate_node_trait_prob", m.mutate_node_trait_prob),
        ("mutation.mutate_link_weights_prob", m.mutate_link_weights_prob),
        ("mutation.mutate_toggle_enable_prob", m.mutate_toggle_enable_prob),
        ("mutation.mutate_gene_reenable_prob", m.mutate_gene_reenable_prob),
        ("mutation.mutate_add_node_prob", m.mutate_add_node_prob),
        ("mutation.mutate_add_link_prob", m.mutate_add_link_prob),
        ("mutation.mutate_connect_sensors", m.mutate_connect_sensors),
        ("mutation.recur_only_prob", m.recur_only_prob),
        ("mating.mate_multipoint_prob", mt.mate_multipoint_prob),
        ("mating.mate_multipoint_avg_prob", mt.mate_multipoint_avg_prob),
        ("mating.mate_singlepoint_prob", mt.mate_singlepoint_prob),
        ("mating.mate_only_prob", mt.mate_only_prob),
        ("mating.matched_gene_tie_prob", mt.matched_gene_tie_prob),
    ];

    for (field, value) in probabilities {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigValidationError::ProbabilityOutOfRange {
                field: field.to_string(),
                value,
            });
        }
    }
}

fn validate_required_fields(config: &NeatConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.logging.global_log_level.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "logging.global_log_level".to_string(),
        });
    }
}

fn validate_value_ranges(config: &NeatConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut invalid = |field: &str, reason: &str| {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        })
    };

    if config.population.pop_size == 0 {
        invalid("population.pop_size", "must be greater than 0");
    }
    if config.population.compat_threshold <= 0.0 {
        invalid("population.compat_threshold", "must be positive");
    }
    if config.population.dropoff_age == 0 {
        invalid("population.dropoff_age", "must be greater than 0");
    }
    if config.population.age_significance <= 0.0 {
        invalid("population.age_significance", "must be positive");
    }
    if config.mutation.weight_mut_power < 0.0 {
        invalid("mutation.weight_mut_power", "must not be negative");
    }
    if config.mutation.new_link_tries == 0 {
        invalid("mutation.new_link_tries", "must be greater than 0");
    }
    if config.network.max_activation_attempts == 0 {
        invalid("network.max_activation_attempts", "must be greater than 0");
    }
    if config.network.max_depth == 0 {
        invalid("network.max_depth", "must be greater than 0");
    }
    if config.experiment.num_generations == 0 {
        invalid("experiment.num_generations", "must be greater than 0");
    }
    if config.experiment.num_runs == 0 {
        invalid("experiment.num_runs", "must be greater than 0");
    }

    let level = config.logging.global_log_level.to_lowercase();
    if !level.is_empty()
        && !["trace", "debug", "info", "warn", "warning", "error", "off"].contains(&level.as_str())
    {
        invalid(
            "logging.global_log_level",
            "must be one of trace, debug, info, warn, error, off",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NeatConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_probability_out_of_range() {
        let mut config = NeatConfig::default();
        config.mutation.mutate_add_node_prob = 1.5;

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("mutation.mutate_add_node_prob"));
                assert!(msg.contains("[0, 1]"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_violations_reported_together() {
        let mut config = NeatConfig::default();
        config.population.pop_size = 0;
        config.population.compat_threshold = 0.0;
        config.network.max_activation_attempts = 0;
        config.logging.global_log_level = "chatty".to_string();

        let Err(ConfigError::ValidationError(msg)) = validate_config(&config) else {
            panic!("expected validation error");
        };
        assert!(msg.contains("population.pop_size"));
        assert!(msg.contains("population.compat_threshold"));
        assert!(msg.contains("network.max_activation_attempts"));
        assert!(msg.contains("logging.global_log_level"));
        assert_eq!(msg.lines().count(), 5);
    }
}

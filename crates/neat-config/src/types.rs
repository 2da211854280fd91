// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neat_configuration.toml`. Defaults reproduce the tuned constants of the
//! reference NEAT parameter files.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeatConfig {
    pub system: SystemConfig,
    pub population: PopulationConfig,
    pub compatibility: CompatibilityConfig,
    pub mutation: MutationConfig,
    pub mating: MatingConfig,
    pub network: NetworkConfig,
    pub experiment: ExperimentConfig,
    pub logging: LoggingConfig,
}

/// System-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Worker threads for fitness evaluation
    pub max_cores: usize,
    /// Seed for the evolution RNG; fresh entropy when unset
    pub random_seed: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_cores: 0, // 0 = auto-detect
            random_seed: None,
        }
    }
}

/// Population sizing, speciation threshold and fitness sharing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub pop_size: usize,
    /// Generations a species may go without improvement before it is penalized
    pub dropoff_age: u32,
    /// Fraction of each species allowed to reproduce
    pub survival_thresh: f64,
    /// Fitness multiplier for species younger than ten generations
    pub age_significance: f64,
    /// Offspring taken from weak species and handed to the best ones
    pub babies_stolen: usize,
    pub compat_threshold: f64,
    pub interspecies_mate_rate: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            pop_size: 200,
            dropoff_age: 15,
            survival_thresh: 0.2,
            age_significance: 1.0,
            babies_stolen: 0,
            compat_threshold: 3.0,
            interspecies_mate_rate: 0.001,
        }
    }
}

/// Compatibility distance coefficients
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompatibilityConfig {
    pub disjoint_coeff: f64,
    pub excess_coeff: f64,
    pub mutdiff_coeff: f64,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            disjoint_coeff: 1.0,
            excess_coeff: 1.0,
            mutdiff_coeff: 0.4,
        }
    }
}

/// Mutation operator probabilities and magnitudes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MutationConfig {
    pub trait_param_mut_prob: f64,
    pub trait_mutation_power: f64,
    pub weight_mut_power: f64,
    /// Share of offspring produced by mutation alone
    pub mutate_only_prob: f64,
    pub mutate_random_trait_prob: f64,
    pub mutate_link_trait_prob: f64,
    pub mutate_node_trait_prob: f64,
    pub mutate_link_weights_prob: f64,
    pub mutate_toggle_enable_prob: f64,
    pub mutate_gene_reenable_prob: f64,
    pub mutate_add_node_prob: f64,
    pub mutate_add_link_prob: f64,
    pub mutate_connect_sensors: f64,
    /// Probability that add-link only looks for recurrent links
    pub recur_only_prob: f64,
    pub new_link_tries: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            trait_param_mut_prob: 0.5,
            trait_mutation_power: 1.0,
            weight_mut_power: 2.5,
            mutate_only_prob: 0.25,
            mutate_random_trait_prob: 0.1,
            mutate_link_trait_prob: 0.1,
            mutate_node_trait_prob: 0.1,
            mutate_link_weights_prob: 0.9,
            mutate_toggle_enable_prob: 0.0,
            mutate_gene_reenable_prob: 0.0,
            mutate_add_node_prob: 0.03,
            mutate_add_link_prob: 0.08,
            mutate_connect_sensors: 0.5,
            recur_only_prob: 0.0,
            new_link_tries: 50,
        }
    }
}

/// Where crossover takes genes present in only one parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedGenePolicy {
    /// Only from the fitter parent
    #[default]
    Fitter,
    /// From the fitter parent, plus each of the other parent's with probability 0.5
    Either,
}

/// Crossover operator probabilities
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatingConfig {
    pub mate_multipoint_prob: f64,
    pub mate_multipoint_avg_prob: f64,
    pub mate_singlepoint_prob: f64,
    /// Share of crossover offspring that skip mutation
    pub mate_only_prob: f64,
    /// Probability of taking the first parent's copy of a matched gene when
    /// both parents are equally fit
    pub matched_gene_tie_prob: f64,
    pub unmatched_genes: UnmatchedGenePolicy,
}

impl Default for MatingConfig {
    fn default() -> Self {
        Self {
            mate_multipoint_prob: 0.3,
            mate_multipoint_avg_prob: 0.3,
            mate_singlepoint_prob: 0.3,
            mate_only_prob: 0.2,
            matched_gene_tie_prob: 0.5,
            unmatched_genes: UnmatchedGenePolicy::Fitter,
        }
    }
}

/// Phenotype runtime ceilings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub max_activation_attempts: usize,
    pub max_depth: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_activation_attempts: 20,
            max_depth: 100,
        }
    }
}

/// Experiment driver settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub num_runs: usize,
    pub num_generations: usize,
    /// Log a population summary every N generations
    pub print_every: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_runs: 1,
            num_generations: 100,
            print_every: 10,
        }
    }
}

/// Console logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub global_log_level: String,
    pub print_debug_logs: bool,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_log_level: "info".to_string(),
            print_debug_logs: false,
            ansi: true,
            with_target: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: NeatConfig = toml::from_str(
            r#"
            [population]
            pop_size = 150

            [mating]
            unmatched_genes = "either"
            "#,
        )
        .unwrap();

        assert_eq!(config.population.pop_size, 150);
        assert_eq!(config.population.compat_threshold, 3.0);
        assert_eq!(config.mating.unmatched_genes, UnmatchedGenePolicy::Either);
        assert_eq!(config.mutation.new_link_tries, 50);
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = NeatConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: NeatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}

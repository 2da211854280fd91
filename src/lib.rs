// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEAT - NeuroEvolution of Augmenting Topologies
//!
//! Evolves both the weights and the topology of small neural networks.
//! This crate re-exports the workspace members:
//!
//! - **`network`**: the phenotype runtime (nodes, links, traits, activation)
//! - **`genetics`**: genomes, the innovation ledger, mutation, crossover,
//!   species, population and the epoch
//! - **`config`**: `neat_configuration.toml` loading and validation
//! - **`experiments`** (feature `experiments`): generation checkpoints, trial
//!   statistics and evaluation drivers
//! - **`observability`** (feature `observability`): logging setup
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neat::prelude::*;
//! use rand::SeedableRng;
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let mut population = Population::new_random(3, 1, 5, false, 0.5, &config, &mut rng)?;
//!
//! for generation in 1..=config.experiment.num_generations {
//!     population.evaluate(|org| {
//!         org.phenotype.load_sensors(&[1.0, 0.0])?;
//!         if org.phenotype.activate().is_err() {
//!             org.fitness = 0.001;
//!             return Ok(());
//!         }
//!         org.fitness = 1.0 - (org.phenotype.output_values()[0] - 1.0).abs();
//!         Ok(())
//!     })?;
//!     population.epoch(generation + 1, &mut rng)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Experiments: neat-experiments                          │
//! │  (Generation records, trials, evaluation drivers)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Genotype: neat-genetics                                │
//! │  (Genome, InnovationLedger, Species, Population)        │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Phenotype: neat-network                                │
//! │  (NNode, Link, Trait, Network)                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use neat_config as config;
pub use neat_genetics as genetics;
pub use neat_network as network;

#[cfg(feature = "experiments")]
pub use neat_experiments as experiments;

#[cfg(feature = "observability")]
pub use neat_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, NeatConfig};
    pub use crate::genetics::{
        Gene, GeneticsError, GeneticsResult, Genome, InnovationLedger, Mutation, MutatorType,
        Organism, Population, Species,
    };
    pub use crate::network::{
        ActivationType, Link, NNode, Network, NetworkError, NeuronType, NodeType, Trait,
    };

    #[cfg(feature = "experiments")]
    pub use crate::experiments::{
        run_experiment, run_trial, Experiment, Generation, GenerationEvaluator,
        OrganismEvaluator, ParallelEvaluator, Trial,
    };

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags, CrateDebugFlags};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_align() {
        assert_eq!(genetics::VERSION, network::VERSION);
        assert_eq!(config::VERSION, genetics::VERSION);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEAT Genetics
//!
//! The genotype side of NEAT:
//! - **Genes / Genomes**: historically marked links, the text codec and verification
//! - **Innovation ledger**: shared markings for identical structural changes
//! - **Mutation / Crossover**: structural and parametric operators, three mating schemes
//! - **Species / Population**: compatibility clustering, fitness sharing and the epoch
//!
//! Fitness evaluation is the only parallel step ([`Population::evaluate`]);
//! everything that touches the innovation ledger runs on the caller's thread.
//!
//! ## Example
//!
//! ```rust,no_run
//! use neat_config::NeatConfig;
//! use neat_genetics::Population;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let config = NeatConfig::default();
//! let mut pop = Population::new_random(3, 1, 5, false, 0.5, &config, &mut rng).unwrap();
//! pop.evaluate(|org| {
//!     org.fitness = 1.0;
//!     Ok(())
//! })
//! .unwrap();
//! pop.epoch(2, &mut rng).unwrap();
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod epoch;
pub mod error;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod organism;
pub mod population;
pub mod random;
pub mod species;

pub use error::{GeneticsError, GeneticsResult};
pub use gene::{Gene, InnovationNum};
pub use genome::{Genome, Mutation, MutatorType};
pub use innovation::{Innovation, InnovationLedger, LinkInnovation, NodeInnovation};
pub use organism::Organism;
pub use population::Population;
pub use species::Species;

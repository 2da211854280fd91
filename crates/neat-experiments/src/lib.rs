// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEAT Experiments
//!
//! Bookkeeping around the evolutionary loop: per-generation checkpoints,
//! trial and experiment statistics, and the drivers that connect a fitness
//! environment to a [`neat_genetics::Population`].
//!
//! Fitness environments themselves (XOR, pole balancing, ...) are supplied by
//! the caller through [`OrganismEvaluator`] or [`GenerationEvaluator`].

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod evaluator;
pub mod floats;
pub mod generation;
pub mod trial;

pub use error::{ExperimentError, ExperimentResult};
pub use evaluator::{
    experiment_rng, run_experiment, run_trial, GenerationEvaluator, OrganismEvaluator,
    ParallelEvaluator,
};
pub use floats::Floats;
pub use generation::{Champion, Generation};
pub use trial::{Experiment, Trial};

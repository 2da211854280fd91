// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEAT Network Runtime
//!
//! The phenotype side of NEAT:
//! - **Traits**: shared parameter bundles referenced by nodes and links
//! - **Activation**: the neuron activation function family
//! - **Nodes / Links**: the graph elements, with per-step activation state
//! - **Network**: arena-backed graph with relaxation-style activation
//!
//! Nodes and links live in flat vectors owned by [`Network`]; cross references
//! are arena indices, so a network can be dropped or cloned without cycles.
//! The genome side (`neat-genetics`) reuses [`NNode`], [`Link`] and [`Trait`]
//! as its genetic records and builds a [`Network`] from them.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod activation;
pub mod error;
pub mod link;
pub mod network;
pub mod node;
pub mod trait_params;

pub use activation::ActivationType;
pub use error::{NetworkError, NetworkResult};
pub use link::Link;
pub use network::{Network, DEFAULT_MAX_ACTIVATION_ATTEMPTS, DEFAULT_MAX_DEPTH};
pub use node::{NNode, NeuronType, NodeType};
pub use trait_params::{Trait, NUM_TRAIT_PARAMS};

/// Identifier of a node inside a genome (unique per genome, shared across
/// genomes when the structural innovation is the same)
pub type NodeId = usize;

/// Identifier of a trait inside a genome
pub type TraitId = usize;

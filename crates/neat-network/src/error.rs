// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for network construction and activation

use crate::NodeId;
use thiserror::Error;

/// Errors raised by the phenotype runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Activation did not settle the outputs within the attempt ceiling
    #[error("Network {network_id} did not settle after {attempts} activation attempts")]
    ActivationLoop { network_id: usize, attempts: usize },

    /// Depth recursion exceeded its ceiling (a cycle through incoming links)
    #[error("Depth can not be determined for network with loop, ceiling {ceiling} exceeded")]
    DepthLoop { ceiling: usize },

    #[error("Sensor count mismatch: expected {expected}, got {actual}")]
    SensorCountMismatch { expected: usize, actual: usize },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Node {id} is not flushed: {reason}")]
    NotFlushed { id: NodeId, reason: String },
}

impl NetworkError {
    /// True for the two loop kinds (activation or depth)
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            NetworkError::ActivationLoop { .. } | NetworkError::DepthLoop { .. }
        )
    }
}

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

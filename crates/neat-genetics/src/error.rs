// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core error handling for NEAT genetics.
*/

use neat_network::NetworkError;
use thiserror::Error;

/// Result type for genetics operations
pub type GeneticsResult<T> = Result<T, GeneticsError>;

/// Error types for genetics operations
#[derive(Error, Debug)]
pub enum GeneticsError {
    /// Dangling gene reference, duplicate gene or broken ordering
    #[error("Genome verification failed: {0}")]
    Verify(String),

    /// Malformed genome text
    #[error("Genome format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// The operator found nothing it could apply to
    #[error("Mutation not applicable: {0}")]
    Mutation(String),

    /// Parents can not be mated
    #[error("Crossover failed: {0}")]
    Crossover(String),

    /// The evaluator or its worker pool failed
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// The population could not be refilled
    #[error("Epoch failed: {0}")]
    Epoch(String),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeneticsError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        GeneticsError::Format {
            line,
            message: message.into(),
        }
    }

    /// True for "nothing to mutate" outcomes that reproduction recovers from
    pub fn is_mutation(&self) -> bool {
        matches!(self, GeneticsError::Mutation(_))
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neat_genetics::GeneticsError;
use thiserror::Error;

/// Checkpoint and experiment-driver errors
#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: u32,
        expected_version: u32,
    },

    #[error("Invalid magic number: expected NEAT, got {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("Genetics error: {0}")]
    Genetics(#[from] GeneticsError),
}

pub type ExperimentResult<T> = Result<T, ExperimentError>;

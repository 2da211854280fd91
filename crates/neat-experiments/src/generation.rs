// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Generation checkpoints
//!
//! Per-generation statistics plus the best organism's genome, persisted as
//!
//! ```text
//! [Header]
//! - Magic: "NEAT" (4 bytes)
//! - Version: u32 LE (4 bytes)
//! [Data]
//! - Bincode-serialized Generation
//! ```
//!
//! Phenotypes are not stored; [`Champion::to_organism`] rebuilds one.

use crate::error::{ExperimentError, ExperimentResult};
use crate::floats::Floats;
use chrono::{DateTime, Utc};
use neat_config::NetworkConfig;
use neat_genetics::{Genome, Organism, Population};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Magic number for checkpoint files: "NEAT"
const MAGIC: &[u8; 4] = b"NEAT";

/// Current format version
const FORMAT_VERSION: u32 = 1;

/// Persistable snapshot of an organism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub fitness: f64,
    pub error: f64,
    pub is_winner: bool,
    pub generation: usize,
    pub species_id: usize,
    pub genotype: Genome,
}

impl From<&Organism> for Champion {
    fn from(org: &Organism) -> Self {
        Self {
            fitness: org.fitness,
            error: org.error,
            is_winner: org.is_winner,
            generation: org.generation,
            species_id: org.species_id,
            genotype: org.genotype.clone(),
        }
    }
}

impl Champion {
    /// Organism with a freshly built phenotype
    pub fn to_organism(&self, limits: &NetworkConfig) -> ExperimentResult<Organism> {
        let mut org = Organism::new(self.fitness, self.genotype.clone(), self.generation)?
            .with_network_limits(limits);
        org.error = self.error;
        org.is_winner = self.is_winner;
        org.species_id = self.species_id;
        Ok(org)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub id: usize,
    pub trial_id: usize,
    pub executed: DateTime<Utc>,
    /// Wall time of evaluation plus epoch
    pub duration: Duration,
    pub solved: bool,

    /// Per-species champion fitness
    pub fitness: Floats,
    /// Per-species age
    pub age: Floats,
    /// Per-species champion phenotype complexity
    pub complexity: Floats,
    /// Number of species
    pub diversity: usize,

    /// Evaluations performed before the winner was found
    pub winner_evals: usize,
    pub winner_nodes: usize,
    pub winner_genes: usize,

    pub best: Option<Champion>,
}

impl Generation {
    pub fn new(id: usize, trial_id: usize) -> Self {
        Self {
            id,
            trial_id,
            executed: Utc::now(),
            duration: Duration::ZERO,
            solved: false,
            fitness: Floats::new(),
            age: Floats::new(),
            complexity: Floats::new(),
            diversity: 0,
            winner_evals: 0,
            winner_nodes: 0,
            winner_genes: 0,
            best: None,
        }
    }

    /// Mark the generation solved by `winner`
    pub fn record_winner(&mut self, winner: &Organism, pop_size: usize) {
        self.solved = true;
        self.winner_nodes = winner.genotype.nodes.len();
        self.winner_genes = winner.genotype.extrons();
        self.winner_evals = pop_size * self.id + winner.genotype.id;
        self.best = Some(Champion::from(winner));
    }

    /// Species statistics of an evaluated population. Unless already
    /// solved, the fittest species champion becomes `best`.
    pub fn fill_population_statistics(&mut self, population: &Population) {
        self.diversity = population.species.len();
        self.age = Floats::new();
        self.complexity = Floats::new();
        self.fitness = Floats::new();

        let mut max_fitness = f64::MIN;
        for species in &population.species {
            let Some(champ) = species.find_champion(&population.organisms) else {
                continue;
            };
            let org = &population.organisms[champ];
            self.age.push(species.age as f64);
            self.complexity.push(org.phenotype.complexity() as f64);
            self.fitness.push(org.fitness);

            if !self.solved && org.fitness > max_fitness {
                max_fitness = org.fitness;
                self.best = Some(Champion::from(org));
            }
        }
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> ExperimentResult<()> {
        w.write_all(MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_le_bytes())?;
        let data =
            bincode::serialize(self).map_err(|e| ExperimentError::Serialization(e.to_string()))?;
        w.write_all(&data)?;
        Ok(())
    }

    pub fn decode<R: Read>(r: &mut R) -> ExperimentResult<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(ExperimentError::InvalidMagic(magic));
        }

        let mut version_bytes = [0u8; 4];
        r.read_exact(&mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != FORMAT_VERSION {
            return Err(ExperimentError::VersionMismatch {
                file_version: version,
                expected_version: FORMAT_VERSION,
            });
        }

        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        bincode::deserialize(&data).map_err(|e| ExperimentError::Deserialization(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ExperimentResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.encode(&mut writer)?;
        writer.flush()?;
        debug!(
            target: "neat-experiments",
            "Saved generation {} of trial {} to {}",
            self.id,
            self.trial_id,
            path.display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ExperimentResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::decode(&mut reader)
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Trials (one evolutionary run) and experiments (repeated trials)

use crate::floats::Floats;
use crate::generation::{Champion, Generation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: usize,
    pub generations: Vec<Generation>,
}

impl Trial {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            generations: Vec::new(),
        }
    }

    /// Fitness of each generation's best organism
    pub fn best_fitness(&self) -> Floats {
        self.generations
            .iter()
            .filter_map(|g| g.best.as_ref().map(|b| b.fitness))
            .collect()
    }

    /// Genome size (nodes plus genes) of each generation's best organism
    pub fn best_complexity(&self) -> Floats {
        self.generations
            .iter()
            .filter_map(|g| g.best.as_ref())
            .map(|b| (b.genotype.nodes.len() + b.genotype.genes.len()) as f64)
            .collect()
    }

    /// Species count per generation
    pub fn diversity(&self) -> Floats {
        self.generations.iter().map(|g| g.diversity as f64).collect()
    }

    pub fn solved(&self) -> bool {
        self.generations.iter().any(|g| g.solved)
    }

    pub fn avg_epoch_duration(&self) -> Duration {
        if self.generations.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.generations.iter().map(|g| g.duration).sum();
        total / self.generations.len() as u32
    }

    /// Best organism over all generations; the winner if one was found
    pub fn champion(&self) -> Option<&Champion> {
        if let Some(winner) = self
            .generations
            .iter()
            .find(|g| g.solved)
            .and_then(|g| g.best.as_ref())
        {
            return Some(winner);
        }
        self.generations
            .iter()
            .filter_map(|g| g.best.as_ref())
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// The solving generation
    pub fn winner_generation(&self) -> Option<&Generation> {
        self.generations.iter().find(|g| g.solved)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: usize,
    pub name: String,
    pub trials: Vec<Trial>,
}

impl Experiment {
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            trials: Vec::new(),
        }
    }

    pub fn solved_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.solved()).count()
    }

    /// Best fitness reached in each trial
    pub fn best_fitness(&self) -> Floats {
        self.trials.iter().map(|t| t.best_fitness().max()).collect()
    }

    /// Generations needed by each solved trial
    pub fn winner_generations(&self) -> Floats {
        self.trials
            .iter()
            .filter_map(|t| t.winner_generation())
            .map(|g| g.id as f64)
            .collect()
    }

    /// Evaluations needed by each solved trial
    pub fn winner_evals(&self) -> Floats {
        self.trials
            .iter()
            .filter_map(|t| t.winner_generation())
            .map(|g| g.winner_evals as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::tests::build_test_generation;

    fn trial(id: usize, fitness: &[f64], solved_at: Option<usize>) -> Trial {
        let mut trial = Trial::new(id);
        for (i, &f) in fitness.iter().enumerate() {
            let mut generation = build_test_generation(i + 1, f);
            generation.solved = solved_at == Some(i + 1);
            trial.generations.push(generation);
        }
        trial
    }

    #[test]
    fn test_trial_statistics() {
        let trial = trial(1, &[1.0, 3.0, 2.0], None);
        assert_eq!(trial.best_fitness().0, vec![1.0, 3.0, 2.0]);
        assert_eq!(trial.best_complexity().0, vec![7.0, 7.0, 7.0]);
        assert_eq!(trial.diversity().mean(), 32.0);
        assert!(!trial.solved());
        assert_eq!(trial.champion().unwrap().fitness, 3.0);
        assert_eq!(trial.avg_epoch_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_winner_is_champion() {
        let trial = trial(1, &[1.0, 2.0, 5.0], Some(2));
        assert!(trial.solved());
        assert_eq!(trial.champion().unwrap().fitness, 2.0);
        assert_eq!(trial.winner_generation().unwrap().id, 2);
    }

    #[test]
    fn test_empty_trial() {
        let trial = Trial::new(0);
        assert!(trial.champion().is_none());
        assert_eq!(trial.avg_epoch_duration(), Duration::ZERO);
    }

    #[test]
    fn test_experiment_summary() {
        let mut experiment = Experiment::new(1, "xor");
        experiment.trials.push(trial(1, &[1.0, 4.0], Some(2)));
        experiment.trials.push(trial(2, &[2.0, 3.0], None));
        assert_eq!(experiment.solved_trials(), 1);
        assert_eq!(experiment.best_fitness().0, vec![4.0, 3.0]);
        assert_eq!(experiment.winner_generations().0, vec![2.0]);
        assert_eq!(experiment.winner_evals().0, vec![12423.0]);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Species

A cluster of mutually compatible organisms. Species hold indices into the
population's organism list; after [`Species::adjust_fitness`] the member list
is sorted best first, so `members[0]` is both champion and representative.
*/

use crate::organism::Organism;
use neat_config::PopulationConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitness multiplier applied to species stagnant past the dropoff age
const STAGNATION_PENALTY: f64 = 0.01;

/// Species up to this age receive the age-significance boost
const YOUNG_SPECIES_AGE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: usize,
    pub age: u32,
    pub ave_fitness: f64,
    pub max_fitness: f64,
    pub max_fitness_ever: f64,
    pub expected_offspring: usize,
    /// Created during the current epoch
    pub is_novel: bool,
    pub is_checked: bool,
    pub age_of_last_improvement: u32,
    /// Indices into the population's organism list
    pub members: Vec<usize>,
}

impl Species {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            age: 1,
            ave_fitness: 0.0,
            max_fitness: 0.0,
            max_fitness_ever: 0.0,
            expected_offspring: 0,
            is_novel: false,
            is_checked: false,
            age_of_last_improvement: 0,
            members: Vec::new(),
        }
    }

    pub fn new_novel(id: usize) -> Self {
        Self {
            is_novel: true,
            ..Self::new(id)
        }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Generations since the last improvement of the best fitness
    pub fn last_improved(&self) -> u32 {
        self.age.saturating_sub(self.age_of_last_improvement)
    }

    /// Index of the member with the highest fitness
    pub fn find_champion(&self, organisms: &[Organism]) -> Option<usize> {
        self.members.iter().copied().max_by(|&a, &b| {
            organisms[a]
                .fitness
                .partial_cmp(&organisms[b].fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    pub fn compute_max_and_avg_fitness(&mut self, organisms: &[Organism]) -> (f64, f64) {
        if self.members.is_empty() {
            self.max_fitness = 0.0;
            self.ave_fitness = 0.0;
            return (0.0, 0.0);
        }
        let mut max = f64::MIN;
        let mut total = 0.0;
        for &m in &self.members {
            let fitness = organisms[m].fitness;
            total += fitness;
            max = max.max(fitness);
        }
        self.max_fitness = max;
        self.ave_fitness = total / self.members.len() as f64;
        (self.max_fitness, self.ave_fitness)
    }

    /// Fitness sharing: penalise stagnation (unless `is_best`), boost youth,
    /// divide by species size, then sort members and mark the champion and
    /// the members ranked too low to reproduce.
    pub fn adjust_fitness(
        &mut self,
        organisms: &mut [Organism],
        config: &PopulationConfig,
        is_best: bool,
    ) {
        if self.members.is_empty() {
            return;
        }

        let mut age_debt = (self.age as i64 - self.age_of_last_improvement as i64 + 1)
            - config.dropoff_age as i64;
        if age_debt == 0 {
            age_debt = 1;
        }
        let size = self.members.len() as f64;

        for &m in &self.members {
            let org = &mut organisms[m];
            org.original_fitness = org.fitness;
            if age_debt >= 1 && !is_best {
                org.fitness *= STAGNATION_PENALTY;
            }
            if self.age <= YOUNG_SPECIES_AGE {
                org.fitness *= config.age_significance;
            }
            if org.fitness < 0.0 {
                org.fitness = 0.0001;
            }
            org.fitness /= size;
        }

        if age_debt >= 1 && !is_best {
            debug!(
                target: "neat-genetics",
                "Species {} stagnant for {} generations, fitness penalised",
                self.id,
                self.last_improved()
            );
        }

        self.members
            .sort_by(|&a, &b| Organism::fitness_order(&organisms[a], &organisms[b]));

        let champion = &organisms[self.members[0]];
        if champion.original_fitness > self.max_fitness_ever {
            self.age_of_last_improvement = self.age;
            self.max_fitness_ever = champion.original_fitness;
        }

        let num_parents = (config.survival_thresh * size + 1.0).floor() as usize;
        organisms[self.members[0]].is_champion = true;
        for &m in self.members.iter().skip(num_parents) {
            organisms[m].to_eliminate = true;
        }
    }

    /// Sum the members' expected offspring. Fractional parts are carried in
    /// `skim` from species to species and paid out once they pass 1.
    pub fn count_offspring(&mut self, organisms: &[Organism], mut skim: f64) -> f64 {
        let mut expected = 0usize;
        for &m in &self.members {
            let e = organisms[m].expected_offspring;
            expected += e.floor() as usize;
            skim += e.fract();
            if skim > 1.0 {
                let whole = skim.floor();
                expected += whole as usize;
                skim -= whole;
            }
        }
        self.expected_offspring = expected;
        skim
    }
}

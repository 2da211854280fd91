// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Organisms: a genome, its phenotype and the fitness bookkeeping of one
//! population member.

use crate::error::GeneticsResult;
use crate::genome::Genome;
use neat_config::NetworkConfig;
use neat_network::Network;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Organism {
    /// Shared (adjusted) fitness once the epoch has run, raw fitness before
    pub fitness: f64,
    /// Raw fitness as reported by the evaluator
    pub original_fitness: f64,
    /// Evaluator-defined error measure
    pub error: f64,
    pub is_winner: bool,

    pub genotype: Genome,
    pub phenotype: Network,
    /// Id of the species this organism belongs to
    pub species_id: usize,

    pub expected_offspring: f64,
    pub generation: usize,

    pub to_eliminate: bool,
    /// Best of its species
    pub is_champion: bool,
    /// Number of reserved offspring when this is a super champion
    pub super_champ_offspring: usize,
    pub is_population_champion: bool,
    /// Exact clone of the population champion
    pub is_population_champion_child: bool,
    /// Fitness of the champion this organism was cloned from
    pub highest_fitness: f64,

    /// Born from a structural mutation
    pub mutation_struct_baby: bool,
    /// Born from mating
    pub mate_baby: bool,
}

impl Organism {
    /// Wrap a genome, building its phenotype
    pub fn new(fitness: f64, genotype: Genome, generation: usize) -> GeneticsResult<Self> {
        let phenotype = genotype.genesis(genotype.id)?;
        Ok(Self {
            fitness,
            original_fitness: 0.0,
            error: 0.0,
            is_winner: false,
            genotype,
            phenotype,
            species_id: 0,
            expected_offspring: 0.0,
            generation,
            to_eliminate: false,
            is_champion: false,
            super_champ_offspring: 0,
            is_population_champion: false,
            is_population_champion_child: false,
            highest_fitness: 0.0,
            mutation_struct_baby: false,
            mate_baby: false,
        })
    }

    /// Apply the configured activation and depth ceilings to the phenotype
    pub fn with_network_limits(mut self, limits: &NetworkConfig) -> Self {
        self.phenotype = self
            .phenotype
            .with_limits(limits.max_activation_attempts, limits.max_depth);
        self
    }

    /// Rebuild the phenotype after the genotype changed
    pub fn update_phenotype(&mut self, limits: &NetworkConfig) -> GeneticsResult<()> {
        self.phenotype = self
            .genotype
            .genesis(self.genotype.id)?
            .with_limits(limits.max_activation_attempts, limits.max_depth);
        Ok(())
    }

    /// A clone of the population champion that lost fitness
    pub fn check_champion_child_damaged(&self) -> bool {
        self.is_population_champion_child && self.highest_fitness > self.fitness
    }

    /// Descending by fitness, ties broken by the smaller genome
    pub fn fitness_order(a: &Organism, b: &Organism) -> Ordering {
        b.fitness
            .partial_cmp(&a.fitness)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.genotype.complexity().cmp(&b.genotype.complexity()))
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Organism generation: {}, fitness: {:.3}, original fitness: {:.3}, species: {}{}]",
            self.generation,
            self.fitness,
            self.original_fitness,
            self.species_id,
            if self.is_champion { " CHAMPION" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::tests::build_test_genome;

    #[test]
    fn test_new_builds_phenotype() {
        let org = Organism::new(1.5, build_test_genome(7), 3).unwrap();
        assert_eq!(org.phenotype.id, 7);
        assert_eq!(org.phenotype.node_count(), 4);
        assert_eq!(org.generation, 3);
        assert_eq!(org.fitness, 1.5);
    }

    #[test]
    fn test_update_phenotype_after_mutation() {
        let mut org = Organism::new(0.0, build_test_genome(1), 1).unwrap();
        org.genotype.genes[0].is_enabled = false;
        org.update_phenotype(&NetworkConfig::default()).unwrap();
        assert_eq!(org.phenotype.link_count(), 2);
    }

    #[test]
    fn test_champion_child_damaged() {
        let mut org = Organism::new(1.0, build_test_genome(1), 1).unwrap();
        org.highest_fitness = 2.0;
        assert!(!org.check_champion_child_damaged());
        org.is_population_champion_child = true;
        assert!(org.check_champion_child_damaged());
        org.fitness = 3.0;
        assert!(!org.check_champion_child_damaged());
    }

    #[test]
    fn test_fitness_order() {
        let mut orgs: Vec<Organism> = [0.5, 2.0, 1.0]
            .iter()
            .map(|&f| Organism::new(f, build_test_genome(1), 1).unwrap())
            .collect();
        orgs.sort_by(Organism::fitness_order);
        let fitness: Vec<f64> = orgs.iter().map(|o| o.fitness).collect();
        assert_eq!(fitness, vec![2.0, 1.0, 0.5]);
    }
}

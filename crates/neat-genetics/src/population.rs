// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Population

Owns every organism, every species and the innovation ledger. Fitness
evaluation runs on a bounded rayon pool; mutation, reproduction and
speciation run on the calling thread (see `epoch`).
*/

use crate::error::{GeneticsError, GeneticsResult};
use crate::genome::{Genome, MutatorType};
use crate::innovation::InnovationLedger;
use crate::organism::Organism;
use crate::species::Species;
use neat_config::NeatConfig;
use rand::Rng;
use rayon::prelude::*;
use std::io::Write;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Population {
    pub organisms: Vec<Organism>,
    pub species: Vec<Species>,
    pub(crate) ledger: InnovationLedger,
    pub(crate) config: NeatConfig,
    pub(crate) last_species_id: usize,
    /// Best raw fitness seen so far
    pub highest_fitness: f64,
    /// Epochs since `highest_fitness` last improved
    pub epochs_highest_last_changed: u32,
}

/// Index of the first representative within the compatibility threshold
pub(crate) fn compatible_species(
    genome: &Genome,
    representatives: &[Genome],
    config: &NeatConfig,
) -> Option<usize> {
    representatives.iter().position(|rep| {
        genome.compatibility(rep, &config.compatibility) < config.population.compat_threshold
    })
}

impl Population {
    /// `pop_size` copies of `start`, each with freshly perturbed weights
    pub fn new<R: Rng + ?Sized>(
        start: &Genome,
        config: &NeatConfig,
        rng: &mut R,
    ) -> GeneticsResult<Self> {
        let pop_size = config.population.pop_size;
        if pop_size == 0 {
            return Err(GeneticsError::Epoch("population size is zero".to_string()));
        }

        let mut organisms = Vec::with_capacity(pop_size);
        for count in 0..pop_size {
            let mut genome = start.duplicate(count);
            match genome.mutate_link_weights(1.0, 1.0, MutatorType::Gaussian, rng) {
                Ok(_) => {}
                Err(e) if e.is_mutation() => {}
                Err(e) => return Err(e),
            }
            organisms.push(Organism::new(0.0, genome, 1)?.with_network_limits(&config.network));
        }

        let ledger = InnovationLedger::new(
            start.next_gene_innovation(),
            start.last_node_id().map_or(0, |id| id + 1),
        );
        Self::from_organisms(organisms, ledger, config)
    }

    /// `pop_size` random genomes, each with a random number of hidden nodes
    /// below `max_hidden`
    #[allow(clippy::too_many_arguments)]
    pub fn new_random<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        max_hidden: usize,
        recurrent: bool,
        link_prob: f64,
        config: &NeatConfig,
        rng: &mut R,
    ) -> GeneticsResult<Self> {
        let pop_size = config.population.pop_size;
        if pop_size == 0 {
            return Err(GeneticsError::Epoch("population size is zero".to_string()));
        }

        let mut organisms = Vec::with_capacity(pop_size);
        for count in 0..pop_size {
            let hidden = if max_hidden > 0 {
                rng.gen_range(0..max_hidden)
            } else {
                0
            };
            let genome = Genome::new_random(
                count, inputs, outputs, hidden, max_hidden, recurrent, link_prob, rng,
            );
            organisms.push(Organism::new(0.0, genome, 1)?.with_network_limits(&config.network));
        }

        let total_nodes = inputs + outputs + max_hidden;
        let ledger = InnovationLedger::new((total_nodes * total_nodes + 1) as u64, total_nodes + 1);
        Self::from_organisms(organisms, ledger, config)
    }

    fn from_organisms(
        organisms: Vec<Organism>,
        ledger: InnovationLedger,
        config: &NeatConfig,
    ) -> GeneticsResult<Self> {
        let mut population = Self {
            organisms,
            species: Vec::new(),
            ledger,
            config: config.clone(),
            last_species_id: 0,
            highest_fitness: 0.0,
            epochs_highest_last_changed: 0,
        };
        population.speciate();
        info!(
            target: "neat-genetics",
            "Population of {} organisms spawned in {} species",
            population.organisms.len(),
            population.species.len()
        );
        Ok(population)
    }

    pub(crate) fn next_species_id(&mut self) -> usize {
        self.last_species_id += 1;
        self.last_species_id
    }

    /// Group every organism into species from scratch
    fn speciate(&mut self) {
        self.species.clear();
        let mut representatives: Vec<Genome> = Vec::new();
        for i in 0..self.organisms.len() {
            let slot =
                match compatible_species(&self.organisms[i].genotype, &representatives, &self.config)
                {
                    Some(slot) => slot,
                    None => {
                        let id = self.next_species_id();
                        self.species.push(Species::new(id));
                        representatives.push(self.organisms[i].genotype.clone());
                        self.species.len() - 1
                    }
                };
            self.species[slot].members.push(i);
            self.organisms[i].species_id = self.species[slot].id;
        }
    }

    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    pub fn ledger(&self) -> &InnovationLedger {
        &self.ledger
    }

    /// Run `evaluator` on every organism in parallel, on at most
    /// `system.max_cores` threads (0 means one per core)
    pub fn evaluate<F>(&mut self, evaluator: F) -> GeneticsResult<()>
    where
        F: Fn(&mut Organism) -> GeneticsResult<()> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.system.max_cores)
            .build()
            .map_err(|e| GeneticsError::Evaluation(format!("failed to build worker pool: {}", e)))?;
        let organisms = &mut self.organisms;
        pool.install(|| organisms.par_iter_mut().try_for_each(|org| evaluator(org)))?;
        debug!(
            target: "neat-genetics",
            "Evaluated {} organisms on {} threads",
            self.organisms.len(),
            pool.current_num_threads()
        );
        Ok(())
    }

    /// Index of the organism with the highest fitness
    pub fn champion_index(&self) -> Option<usize> {
        (0..self.organisms.len()).max_by(|&a, &b| {
            self.organisms[a]
                .fitness
                .partial_cmp(&self.organisms[b].fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    pub fn champion(&self) -> Option<&Organism> {
        self.champion_index().map(|i| &self.organisms[i])
    }

    pub fn species_of(&self, organism: usize) -> Option<&Species> {
        let id = self.organisms.get(organism)?.species_id;
        self.species.iter().find(|s| s.id == id)
    }

    /// Verify every genome
    pub fn verify(&self) -> GeneticsResult<()> {
        self.organisms
            .iter()
            .try_for_each(|org| org.genotype.verify())
    }

    /// Dump all genomes grouped by species, best first within each species
    pub fn write_by_species<W: Write>(&self, w: &mut W) -> GeneticsResult<()> {
        for species in &self.species {
            writeln!(
                w,
                "/* Species #{} : (Size {}) (AF {:.3}) (Age {})  */",
                species.id,
                species.size(),
                species.ave_fitness,
                species.age
            )?;
            let mut members = species.members.clone();
            members.sort_by(|&a, &b| Organism::fitness_order(&self.organisms[a], &self.organisms[b]));
            for m in members {
                let org = &self.organisms[m];
                writeln!(
                    w,
                    "/* Organism #{} Fitness: {:.3} Error: {:.3} */",
                    org.genotype.id, org.fitness, org.error
                )?;
                if org.is_winner {
                    writeln!(w, "/* ## Winner ## */")?;
                }
                org.genotype.write(w)?;
            }
        }
        Ok(())
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Epoch

One generation transition:

```text
adjust fitness per species (sharing, age boost, stagnation penalty)
    → expected offspring per organism, summed per species (fraction skim)
    → sort species by champion fitness
    → population stagnation (delta coding) or stolen babies
    → drop organisms ranked below the survival threshold
    → reproduce per species (clone / mutate / mate)
    → speciate offspring against the old champions
    → age species, renumber genomes, clear the innovation ledger
```

Everything here runs on the calling thread; the innovation ledger is only
ever touched through `&mut`.
*/

use crate::error::{GeneticsError, GeneticsResult};
use crate::genome::{Genome, Mutation, MutatorType};
use crate::innovation::InnovationLedger;
use crate::organism::Organism;
use crate::population::{compatible_species, Population};
use crate::random::gaussian;
use crate::species::Species;
use neat_config::NeatConfig;
use rand::Rng;
use tracing::{debug, info, trace, warn};

/// Species must be older than this to give up offspring to stolen babies
const STEAL_MIN_AGE: u32 = 5;

/// Superchamp offspring get an extra link instead of new weights this often
const SUPERCHAMP_ADD_LINK_PROB: f64 = 0.2;

/// Species larger than this keep an unmutated clone of their champion
const CHAMPION_CLONE_MIN_OFFSPRING: usize = 5;

/// Interspecies partner search gives up after this many draws
const INTERSPECIES_TRIES: usize = 5;

/// Treat "nothing to mutate" as "no change"
fn recover(result: GeneticsResult<bool>) -> GeneticsResult<bool> {
    match result {
        Err(e) if e.is_mutation() => {
            trace!(target: "neat-genetics", "{}", e);
            Ok(false)
        }
        other => other,
    }
}

/// At most one structural mutation, otherwise the parametric ones.
/// Returns whether the structure changed.
fn mutate_offspring<R: Rng + ?Sized>(
    genome: &mut Genome,
    ledger: &mut InnovationLedger,
    config: &NeatConfig,
    rng: &mut R,
) -> GeneticsResult<bool> {
    match Mutation::select_structural(&config.mutation, rng) {
        Some(mutation) => recover(genome.mutate(mutation, ledger, &config.mutation, rng)),
        None => {
            recover(genome.mutate_all_nonstructural(&config.mutation, rng))?;
            Ok(false)
        }
    }
}

/// Read-only view of the parent generation
struct Parents<'a> {
    organisms: &'a [Organism],
    species: &'a [Species],
    config: &'a NeatConfig,
    generation: usize,
}

impl Parents<'_> {
    /// Partner from another species, biased towards the better ones
    fn interspecies_partner<R: Rng + ?Sized>(&self, own: usize, rng: &mut R) -> &Organism {
        let mut other = own;
        let mut tries = 0;
        while other == own && tries < INTERSPECIES_TRIES {
            let mult = (gaussian(rng) / 4.0).abs().min(1.0);
            other = (mult * (self.species.len() as f64 - 1.0) + 0.5).floor() as usize;
            tries += 1;
        }
        &self.organisms[self.species[other].members[0]]
    }

    fn mate<R: Rng + ?Sized>(
        &self,
        mom: &Organism,
        dad: &Organism,
        child_id: usize,
        rng: &mut R,
    ) -> GeneticsResult<Genome> {
        let mating = &self.config.mating;
        let result = if rng.gen::<f64>() < mating.mate_multipoint_prob {
            mom.genotype.mate_multipoint(
                &dad.genotype,
                child_id,
                mom.original_fitness,
                dad.original_fitness,
                mating,
                rng,
            )
        } else if rng.gen::<f64>()
            < mating.mate_multipoint_avg_prob
                / (mating.mate_multipoint_avg_prob + mating.mate_singlepoint_prob)
        {
            mom.genotype.mate_multipoint_avg(
                &dad.genotype,
                child_id,
                mom.original_fitness,
                dad.original_fitness,
                mating,
                rng,
            )
        } else {
            mom.genotype.mate_singlepoint(&dad.genotype, child_id, rng)
        };

        match result {
            Err(GeneticsError::Crossover(reason)) => {
                warn!(
                    target: "neat-genetics",
                    "Mating {} x {} failed ({}), cloning mother",
                    mom.genotype.id, dad.genotype.id, reason
                );
                Ok(mom.genotype.duplicate(child_id))
            }
            other => other,
        }
    }

    /// Offspring of one species
    fn reproduce<R: Rng + ?Sized>(
        &self,
        species_idx: usize,
        ledger: &mut InnovationLedger,
        rng: &mut R,
    ) -> GeneticsResult<Vec<Organism>> {
        let species = &self.species[species_idx];
        let expected = species.expected_offspring;
        if expected == 0 {
            return Ok(Vec::new());
        }
        if species.members.is_empty() {
            return Err(GeneticsError::Epoch(format!(
                "species {} expects {} offspring but has no members",
                species.id, expected
            )));
        }

        let config = self.config;
        let pool_size = species.members.len();
        let champ = &self.organisms[species.members[0]];
        let mut super_champ_left = champ.super_champ_offspring;
        let mut champ_clone_done = false;
        let mut babies = Vec::with_capacity(expected);

        for count in 0..expected {
            let mut struct_baby = false;
            let mut mate_baby = false;
            let mut champion_child = false;

            let genome = if super_champ_left > 0 {
                let mut genome = champ.genotype.duplicate(count);
                if super_champ_left > 1 {
                    if rng.gen::<f64>() >= SUPERCHAMP_ADD_LINK_PROB
                        || config.mutation.mutate_add_link_prob == 0.0
                    {
                        recover(genome.mutate_link_weights(
                            config.mutation.weight_mut_power,
                            1.0,
                            MutatorType::Gaussian,
                            rng,
                        ))?;
                    } else {
                        struct_baby =
                            recover(genome.mutate_add_link(ledger, &config.mutation, rng))?;
                    }
                } else if champ.is_population_champion {
                    champion_child = true;
                }
                super_champ_left -= 1;
                genome
            } else if !champ_clone_done && expected > CHAMPION_CLONE_MIN_OFFSPRING {
                champ_clone_done = true;
                champ.genotype.duplicate(count)
            } else if rng.gen::<f64>() < config.mutation.mutate_only_prob || pool_size == 1 {
                let mom = &self.organisms[species.members[rng.gen_range(0..pool_size)]];
                let mut genome = mom.genotype.duplicate(count);
                struct_baby = mutate_offspring(&mut genome, ledger, config, rng)?;
                genome
            } else {
                let mom = &self.organisms[species.members[rng.gen_range(0..pool_size)]];
                let dad = if rng.gen::<f64>() > config.population.interspecies_mate_rate {
                    &self.organisms[species.members[rng.gen_range(0..pool_size)]]
                } else {
                    self.interspecies_partner(species_idx, rng)
                };

                let mut genome = self.mate(mom, dad, count, rng)?;
                mate_baby = true;

                if rng.gen::<f64>() > config.mating.mate_only_prob
                    || dad.genotype.id == mom.genotype.id
                    || dad
                        .genotype
                        .compatibility(&mom.genotype, &config.compatibility)
                        == 0.0
                {
                    struct_baby = mutate_offspring(&mut genome, ledger, config, rng)?;
                }
                genome
            };

            let mut baby = Organism::new(0.0, genome, self.generation)?
                .with_network_limits(&config.network);
            baby.mutation_struct_baby = struct_baby;
            baby.mate_baby = mate_baby;
            if champion_child {
                baby.is_population_champion_child = true;
                baby.highest_fitness = champ.original_fitness;
            }
            babies.push(baby);
        }
        Ok(babies)
    }
}

impl Population {
    /// Replace the current generation with its offspring
    pub fn epoch<R: Rng + ?Sized>(&mut self, generation: usize, rng: &mut R) -> GeneticsResult<()> {
        if self.organisms.is_empty() || self.species.is_empty() {
            return Err(GeneticsError::Epoch(format!(
                "generation {}: nothing to reproduce from",
                generation
            )));
        }
        let pop_size = self.config.population.pop_size;

        let best_species_id = self
            .champion_index()
            .map(|i| self.organisms[i].species_id);
        for species in self.species.iter_mut() {
            species.compute_max_and_avg_fitness(&self.organisms);
            let is_best = Some(species.id) == best_species_id;
            species.adjust_fitness(&mut self.organisms, &self.config.population, is_best);
        }

        self.apportion_offspring(pop_size)?;

        self.species.sort_by(|a, b| {
            let fa = self.organisms[a.members[0]].original_fitness;
            let fb = self.organisms[b.members[0]].original_fitness;
            fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
        });

        let best_org = self.species[0].members[0];
        self.organisms[best_org].is_population_champion = true;
        if self.organisms[best_org].original_fitness > self.highest_fitness {
            self.highest_fitness = self.organisms[best_org].original_fitness;
            self.epochs_highest_last_changed = 0;
        } else {
            self.epochs_highest_last_changed += 1;
        }

        if self.epochs_highest_last_changed >= self.config.population.dropoff_age + 5 {
            self.delta_coding(pop_size);
        } else if self.config.population.babies_stolen > 0 {
            self.steal_babies(rng);
        }

        self.purge_eliminated();

        let parents = Parents {
            organisms: &self.organisms,
            species: &self.species,
            config: &self.config,
            generation,
        };
        let mut babies = Vec::with_capacity(pop_size);
        for species_idx in 0..parents.species.len() {
            babies.extend(parents.reproduce(species_idx, &mut self.ledger, rng)?);
        }
        if babies.is_empty() {
            return Err(GeneticsError::Epoch(format!(
                "generation {}: no offspring produced",
                generation
            )));
        }
        if babies.len() != pop_size {
            return Err(GeneticsError::Epoch(format!(
                "generation {}: produced {} offspring for a population of {}",
                generation,
                babies.len(),
                pop_size
            )));
        }

        self.speciate_offspring(babies);
        self.ledger.clear();

        info!(
            target: "neat-genetics",
            "Epoch {}: {} organisms in {} species, highest fitness {:.4}",
            generation,
            self.organisms.len(),
            self.species.len(),
            self.highest_fitness
        );
        Ok(())
    }

    /// Expected offspring per organism and per species, summing to the
    /// population size
    fn apportion_offspring(&mut self, pop_size: usize) -> GeneticsResult<()> {
        let total: f64 = self.organisms.iter().map(|o| o.fitness).sum();
        let average = total / self.organisms.len() as f64;
        for org in self.organisms.iter_mut() {
            org.expected_offspring = if average > 0.0 {
                org.fitness / average
            } else {
                0.0
            };
        }

        let mut skim = 0.0;
        for species in self.species.iter_mut() {
            skim = species.count_offspring(&self.organisms, skim);
        }
        self.balance_offspring(pop_size)
    }

    /// Correct rounding so species offspring add up to `pop_size`.
    ///
    /// A shortfall of one goes to the species expecting the most; a larger
    /// one hands that species the whole population. An excess is taken from
    /// that species first, then from the others, largest first.
    fn balance_offspring(&mut self, pop_size: usize) -> GeneticsResult<()> {
        if self.species.is_empty() {
            return Err(GeneticsError::Epoch(
                "no species to apportion offspring to".to_string(),
            ));
        }
        let mut total: usize = self.species.iter().map(|s| s.expected_offspring).sum();

        // the species expecting the most (the last one on ties)
        let best = self
            .species
            .iter()
            .enumerate()
            .fold(0, |best, (i, s)| {
                if s.expected_offspring >= self.species[best].expected_offspring {
                    i
                } else {
                    best
                }
            });

        if total < pop_size {
            self.species[best].expected_offspring += 1;
            total += 1;
            if total < pop_size {
                debug!(
                    target: "neat-genetics",
                    "Offspring apportionment short by {}, species {} takes the population",
                    pop_size - total,
                    self.species[best].id
                );
                for species in self.species.iter_mut() {
                    species.expected_offspring = 0;
                }
                self.species[best].expected_offspring = pop_size;
                total = pop_size;
            }
        } else if total > pop_size {
            let mut order: Vec<usize> = (0..self.species.len()).filter(|&i| i != best).collect();
            order.sort_by(|&a, &b| {
                self.species[b]
                    .expected_offspring
                    .cmp(&self.species[a].expected_offspring)
            });
            for i in std::iter::once(best).chain(order) {
                let species = &mut self.species[i];
                let cut = (total - pop_size).min(species.expected_offspring);
                species.expected_offspring -= cut;
                total -= cut;
                if total == pop_size {
                    break;
                }
            }
        }

        if total != pop_size {
            return Err(GeneticsError::Epoch(format!(
                "apportioned {} offspring for a population of {}",
                total, pop_size
            )));
        }
        Ok(())
    }

    /// Population stagnant: only the two best species reproduce, from their
    /// champions
    fn delta_coding(&mut self, pop_size: usize) {
        info!(
            target: "neat-genetics",
            "Population stagnant for {} epochs, delta coding",
            self.epochs_highest_last_changed
        );
        self.epochs_highest_last_changed = 0;

        let half = pop_size / 2;
        let shares: Vec<usize> = if self.species.len() > 1 {
            vec![half, pop_size - half]
        } else {
            vec![pop_size]
        };
        for (i, species) in self.species.iter_mut().enumerate() {
            let share = shares.get(i).copied().unwrap_or(0);
            species.expected_offspring = share;
            if share > 0 {
                self.organisms[species.members[0]].super_champ_offspring = share;
                species.age_of_last_improvement = species.age;
            }
        }
    }

    /// Move offspring from old, weak species to the champions of the best
    fn steal_babies<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let to_steal = self.config.population.babies_stolen;
        let dropoff = self.config.population.dropoff_age;

        let mut stolen = 0;
        for species in self.species.iter_mut().rev() {
            if stolen >= to_steal {
                break;
            }
            if species.age > STEAL_MIN_AGE && species.expected_offspring > 2 {
                if species.expected_offspring - 1 >= to_steal - stolen {
                    species.expected_offspring -= to_steal - stolen;
                    stolen = to_steal;
                } else {
                    stolen += species.expected_offspring - 1;
                    species.expected_offspring = 1;
                }
            }
        }

        // the top three get 1/5, 1/5 and 1/10, the rest up to 3 at a time
        let blocks = [to_steal / 5, to_steal / 5, to_steal / 10];
        let mut block = 0;
        for species in self.species.iter_mut() {
            if species.last_improved() > dropoff {
                continue;
            }
            let champ = species.members[0];
            if block < blocks.len() && stolen >= blocks[block] {
                self.organisms[champ].super_champ_offspring = blocks[block];
                species.expected_offspring += blocks[block];
                stolen -= blocks[block];
            } else if block >= blocks.len() && rng.gen::<f64>() > 0.1 {
                let share = stolen.min(3);
                self.organisms[champ].super_champ_offspring = share;
                species.expected_offspring += share;
                stolen -= share;
            }
            if stolen == 0 {
                break;
            }
            block += 1;
        }

        if stolen > 0 {
            let species = &mut self.species[0];
            self.organisms[species.members[0]].super_champ_offspring += stolen;
            species.expected_offspring += stolen;
        }
    }

    /// Drop organisms marked for elimination, keeping member indices valid
    fn purge_eliminated(&mut self) {
        let mut remap = vec![None; self.organisms.len()];
        let mut survivors = Vec::with_capacity(self.organisms.len());
        for (i, org) in std::mem::take(&mut self.organisms).into_iter().enumerate() {
            if !org.to_eliminate {
                remap[i] = Some(survivors.len());
                survivors.push(org);
            }
        }
        self.organisms = survivors;
        for species in self.species.iter_mut() {
            species.members = species.members.iter().filter_map(|&m| remap[m]).collect();
        }
    }

    /// Assign offspring to species by comparing against the old champions,
    /// then replace the parent generation
    fn speciate_offspring(&mut self, mut babies: Vec<Organism>) {
        let mut representatives: Vec<Genome> = self
            .species
            .iter()
            .map(|s| self.organisms[s.members[0]].genotype.clone())
            .collect();
        for species in self.species.iter_mut() {
            species.members.clear();
        }

        for (i, baby) in babies.iter_mut().enumerate() {
            baby.genotype.id = i;
            baby.phenotype.id = i;
            let slot = match compatible_species(&baby.genotype, &representatives, &self.config) {
                Some(slot) => slot,
                None => {
                    let id = self.next_species_id();
                    self.species.push(Species::new_novel(id));
                    representatives.push(baby.genotype.clone());
                    self.species.len() - 1
                }
            };
            self.species[slot].members.push(i);
            baby.species_id = self.species[slot].id;
        }
        self.organisms = babies;

        let before = self.species.len();
        self.species.retain(|s| !s.is_empty());
        if self.species.len() < before {
            debug!(
                target: "neat-genetics",
                "{} species went extinct",
                before - self.species.len()
            );
        }
        for species in self.species.iter_mut() {
            if species.is_novel {
                species.is_novel = false;
            } else {
                species.age += 1;
            }
            species.expected_offspring = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::tests::build_test_genome;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(pop_size: usize) -> NeatConfig {
        let mut config = NeatConfig::default();
        config.population.pop_size = pop_size;
        config.system.max_cores = 1;
        config
    }

    fn evaluated(pop_size: usize, seed: u64) -> (Population, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pop = Population::new(&build_test_genome(1), &config(pop_size), &mut rng).unwrap();
        for (i, org) in pop.organisms.iter_mut().enumerate() {
            org.fitness = 1.0 + i as f64;
        }
        (pop, rng)
    }

    #[test]
    fn test_epoch_keeps_population_size() {
        let (mut pop, mut rng) = evaluated(20, 42);
        for generation in 2..6 {
            pop.epoch(generation, &mut rng).unwrap();
            assert_eq!(pop.organisms.len(), 20);
            let members: usize = pop.species.iter().map(|s| s.size()).sum();
            assert_eq!(members, 20);
            assert!(pop.ledger().records().is_empty());
            pop.verify().unwrap();
            for (i, org) in pop.organisms.iter_mut().enumerate() {
                assert_eq!(org.genotype.id, i);
                assert_eq!(org.generation, generation);
                org.fitness = 1.0 + (i % 7) as f64;
            }
        }
    }

    #[test]
    fn test_epoch_tracks_highest_fitness() {
        let (mut pop, mut rng) = evaluated(10, 7);
        pop.epoch(2, &mut rng).unwrap();
        assert_eq!(pop.highest_fitness, 10.0);
        assert_eq!(pop.epochs_highest_last_changed, 0);

        for org in pop.organisms.iter_mut() {
            org.fitness = 1.0;
        }
        pop.epoch(3, &mut rng).unwrap();
        assert_eq!(pop.highest_fitness, 10.0);
        assert_eq!(pop.epochs_highest_last_changed, 1);
    }

    #[test]
    fn test_zero_fitness_population_still_refills() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pop = Population::new(&build_test_genome(1), &config(12), &mut rng).unwrap();
        pop.epoch(2, &mut rng).unwrap();
        assert_eq!(pop.organisms.len(), 12);
    }

    fn three_species(pop: &mut Population) {
        pop.species = vec![Species::new(1), Species::new(2), Species::new(3)];
        pop.species[0].members = vec![0, 1, 2];
        pop.species[1].members = vec![3, 4, 5, 6];
        pop.species[2].members = vec![7, 8, 9];
    }

    #[test]
    fn test_delta_coding_gives_top_two_species_everything() {
        let (mut pop, _) = evaluated(10, 1);
        three_species(&mut pop);
        pop.species[1].age = 9;
        pop.epochs_highest_last_changed = 30;

        pop.delta_coding(11);
        assert_eq!(pop.species[0].expected_offspring, 5);
        assert_eq!(pop.species[1].expected_offspring, 6);
        assert_eq!(pop.species[2].expected_offspring, 0);
        assert_eq!(pop.organisms[0].super_champ_offspring, 5);
        assert_eq!(pop.organisms[3].super_champ_offspring, 6);
        assert_eq!(pop.organisms[7].super_champ_offspring, 0);
        assert_eq!(pop.species[1].age_of_last_improvement, 9);
        assert_eq!(pop.epochs_highest_last_changed, 0);
    }

    #[test]
    fn test_superchamp_offspring_cloned_from_champion() {
        let (mut pop, mut rng) = evaluated(8, 5);
        pop.config.compatibility.mutdiff_coeff = 0.0;
        pop.epochs_highest_last_changed = pop.config.population.dropoff_age + 10;
        pop.highest_fitness = 1000.0;

        pop.epoch(2, &mut rng).unwrap();
        assert_eq!(pop.organisms.len(), 8);
        assert!(pop.organisms.iter().all(|o| !o.mate_baby));
        assert_eq!(
            pop.organisms
                .iter()
                .filter(|o| o.is_population_champion_child)
                .count(),
            1
        );
    }

    #[test]
    fn test_purge_keeps_indices_consistent() {
        let (mut pop, _) = evaluated(6, 2);
        pop.organisms[1].to_eliminate = true;
        pop.organisms[4].to_eliminate = true;
        let kept: Vec<f64> = pop
            .organisms
            .iter()
            .filter(|o| !o.to_eliminate)
            .map(|o| o.fitness)
            .collect();

        pop.purge_eliminated();
        assert_eq!(pop.organisms.len(), 4);
        let fitness: Vec<f64> = pop.organisms.iter().map(|o| o.fitness).collect();
        assert_eq!(fitness, kept);
        for species in &pop.species {
            assert!(species.members.iter().all(|&m| m < 4));
        }
    }

    #[test]
    fn test_excess_offspring_spread_beyond_best_species() {
        let (mut pop, _) = evaluated(10, 6);
        three_species(&mut pop);
        pop.species[0].expected_offspring = 3;
        pop.species[1].expected_offspring = 4;
        pop.species[2].expected_offspring = 2;

        pop.balance_offspring(2).unwrap();
        let expected: Vec<usize> = pop.species.iter().map(|s| s.expected_offspring).collect();
        assert_eq!(expected, vec![0, 0, 2]);

        pop.species[0].expected_offspring = 6;
        pop.species[1].expected_offspring = 6;
        pop.species[2].expected_offspring = 1;
        pop.balance_offspring(10).unwrap();
        let expected: Vec<usize> = pop.species.iter().map(|s| s.expected_offspring).collect();
        assert_eq!(expected, vec![6, 3, 1]);
    }

    #[test]
    fn test_shortfall_goes_to_best_species() {
        let (mut pop, _) = evaluated(10, 6);
        three_species(&mut pop);
        pop.species[0].expected_offspring = 5;
        pop.species[1].expected_offspring = 4;
        pop.balance_offspring(10).unwrap();
        assert_eq!(pop.species[0].expected_offspring, 6);

        pop.species[0].expected_offspring = 2;
        pop.balance_offspring(10).unwrap();
        let expected: Vec<usize> = pop.species.iter().map(|s| s.expected_offspring).collect();
        assert_eq!(expected, vec![0, 10, 0]);
    }

    #[test]
    fn test_unapportionable_population_is_epoch_error() {
        let (mut pop, _) = evaluated(4, 6);
        pop.species.clear();
        assert!(matches!(
            pop.balance_offspring(4),
            Err(GeneticsError::Epoch(_))
        ));
    }

    #[test]
    fn test_steal_babies_moves_offspring_to_best() {
        let (mut pop, mut rng) = evaluated(10, 4);
        pop.config.population.babies_stolen = 5;
        let mut young = Species::new(1);
        young.members = (0..5).collect();
        young.expected_offspring = 4;
        let mut old = Species::new(2);
        old.age = 20;
        old.age_of_last_improvement = 1;
        old.members = (5..10).collect();
        old.expected_offspring = 6;
        pop.species = vec![young, old];

        pop.steal_babies(&mut rng);
        let total: usize = pop.species.iter().map(|s| s.expected_offspring).sum();
        assert_eq!(total, 10);
        assert_eq!(pop.species[1].expected_offspring, 1);
        assert_eq!(pop.species[0].expected_offspring, 9);
        assert_eq!(pop.organisms[0].super_champ_offspring, 5);
    }
}

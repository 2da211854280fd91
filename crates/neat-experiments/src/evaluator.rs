// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Evaluation drivers

Fitness environments plug in at two levels:

- [`OrganismEvaluator`]: scores one organism at a time; [`ParallelEvaluator`]
  fans it out over the population's worker pool.
- [`GenerationEvaluator`]: sees the whole population, for environments that
  need to.

[`run_trial`] alternates evaluation and epochs until a winner appears or the
generation budget runs out; [`run_experiment`] repeats it `num_runs` times
from fresh populations on one seeded RNG.
*/

use crate::error::ExperimentResult;
use crate::generation::Generation;
use crate::trial::{Experiment, Trial};
use neat_config::{ExperimentConfig, NeatConfig};
use neat_genetics::{GeneticsResult, Organism, Population};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info};

/// Scores one organism: sets `fitness`, optionally `error` and `is_winner`.
///
/// Network loop errors are the evaluator's to handle, typically by
/// assigning a minimal fitness.
pub trait OrganismEvaluator: Sync {
    fn evaluate(&self, organism: &mut Organism) -> GeneticsResult<()>;
}

impl<F> OrganismEvaluator for F
where
    F: Fn(&mut Organism) -> GeneticsResult<()> + Sync,
{
    fn evaluate(&self, organism: &mut Organism) -> GeneticsResult<()> {
        self(organism)
    }
}

/// Scores a whole population and fills in the generation record
pub trait GenerationEvaluator {
    fn generation_evaluate(
        &mut self,
        population: &mut Population,
        generation: &mut Generation,
    ) -> ExperimentResult<()>;
}

/// Runs an [`OrganismEvaluator`] on every organism in parallel
pub struct ParallelEvaluator<E> {
    evaluator: E,
}

impl<E: OrganismEvaluator> ParallelEvaluator<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }
}

impl<E: OrganismEvaluator> GenerationEvaluator for ParallelEvaluator<E> {
    fn generation_evaluate(
        &mut self,
        population: &mut Population,
        generation: &mut Generation,
    ) -> ExperimentResult<()> {
        let evaluator = &self.evaluator;
        population.evaluate(|org| evaluator.evaluate(org))?;

        let pop_size = population.organisms.len();
        if let Some(winner) = population.organisms.iter().find(|o| o.is_winner) {
            generation.record_winner(winner, pop_size);
        }
        generation.fill_population_statistics(population);
        Ok(())
    }
}

/// One evolutionary run of at most `config.num_generations` generations
pub fn run_trial<G, R>(
    trial_id: usize,
    population: &mut Population,
    evaluator: &mut G,
    config: &ExperimentConfig,
    rng: &mut R,
) -> ExperimentResult<Trial>
where
    G: GenerationEvaluator + ?Sized,
    R: Rng + ?Sized,
{
    let mut trial = Trial::new(trial_id);

    for id in 1..=config.num_generations {
        let started = Instant::now();
        let mut generation = Generation::new(id, trial_id);
        evaluator.generation_evaluate(population, &mut generation)?;
        if !generation.solved {
            population.epoch(id + 1, rng)?;
        }
        generation.duration = started.elapsed();

        if config.print_every > 0 && id % config.print_every == 0 {
            info!(
                target: "neat-experiments",
                "Trial {} generation {}: best fitness {:.4}, {} species, {:?}",
                trial_id,
                id,
                generation.fitness.max(),
                generation.diversity,
                generation.duration
            );
        } else {
            debug!(
                target: "neat-experiments",
                "Trial {} generation {} finished in {:?}",
                trial_id,
                id,
                generation.duration
            );
        }

        let solved = generation.solved;
        trial.generations.push(generation);
        if solved {
            info!(
                target: "neat-experiments",
                "Trial {} solved at generation {}",
                trial_id,
                id
            );
            break;
        }
    }
    Ok(trial)
}

/// Evolution RNG: seeded from `system.random_seed` when set
pub fn experiment_rng(config: &NeatConfig) -> StdRng {
    match config.system.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// `config.experiment.num_runs` trials, each on a population built by
/// `new_population`
pub fn run_experiment<G, F>(
    id: usize,
    name: &str,
    config: &NeatConfig,
    mut new_population: F,
    evaluator: &mut G,
) -> ExperimentResult<Experiment>
where
    G: GenerationEvaluator + ?Sized,
    F: FnMut(&NeatConfig, &mut StdRng) -> GeneticsResult<Population>,
{
    let mut rng = experiment_rng(config);
    let mut experiment = Experiment::new(id, name);

    for run in 0..config.experiment.num_runs {
        let mut population = new_population(config, &mut rng)?;
        let trial = run_trial(run, &mut population, evaluator, &config.experiment, &mut rng)?;
        debug!(
            target: "neat-experiments",
            "Experiment {} trial {} finished after {} generations (solved: {})",
            name,
            run,
            trial.generations.len(),
            trial.solved()
        );
        experiment.trials.push(trial);
    }

    info!(
        target: "neat-experiments",
        "Experiment {}: {}/{} trials solved",
        name,
        experiment.solved_trials(),
        experiment.trials.len()
    );
    Ok(experiment)
}

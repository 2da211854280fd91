// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Structural and parametric mutation operators.

Every operator returns:
- `Ok(true)` when the genome was changed
- `Ok(false)` when the search for a target came up empty (retry budget spent,
  or the change already exists)
- `Err(GeneticsError::Mutation)` when the genome can not support the
  operator at all (no genes, no traits, nothing disabled)

Structural operators consult the [`InnovationLedger`] before minting new
innovation numbers or node ids.
*/

use super::Genome;
use crate::error::{GeneticsError, GeneticsResult};
use crate::gene::Gene;
use crate::innovation::{InnovationLedger, LinkInnovation, NodeInnovation};
use crate::random::rand_pos_neg;
use neat_config::MutationConfig;
use neat_network::{Link, NNode, NeuronType, NodeId, Trait};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// How `mutate_link_weights` changes a selected weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutatorType {
    /// Perturb, occasionally replace
    Gaussian,
    /// Always replace
    ColdGaussian,
}

/// The closed set of mutation operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mutation {
    AddNode,
    AddLink,
    ConnectSensors,
    RandomTrait,
    LinkTrait,
    NodeTrait,
    LinkWeights,
    ToggleEnable,
    GeneReenable,
}

impl Mutation {
    /// Structural operators in selection order
    pub const STRUCTURAL: [Mutation; 3] =
        [Mutation::AddNode, Mutation::AddLink, Mutation::ConnectSensors];

    /// Parametric operators in application order
    pub const NONSTRUCTURAL: [Mutation; 6] = [
        Mutation::RandomTrait,
        Mutation::LinkTrait,
        Mutation::NodeTrait,
        Mutation::LinkWeights,
        Mutation::ToggleEnable,
        Mutation::GeneReenable,
    ];

    pub fn is_structural(self) -> bool {
        Self::STRUCTURAL.contains(&self)
    }

    /// Configured probability of applying this operator
    pub fn probability(self, config: &MutationConfig) -> f64 {
        match self {
            Mutation::AddNode => config.mutate_add_node_prob,
            Mutation::AddLink => config.mutate_add_link_prob,
            Mutation::ConnectSensors => config.mutate_connect_sensors,
            Mutation::RandomTrait => config.mutate_random_trait_prob,
            Mutation::LinkTrait => config.mutate_link_trait_prob,
            Mutation::NodeTrait => config.mutate_node_trait_prob,
            Mutation::LinkWeights => config.mutate_link_weights_prob,
            Mutation::ToggleEnable => config.mutate_toggle_enable_prob,
            Mutation::GeneReenable => config.mutate_gene_reenable_prob,
        }
    }

    /// At most one structural operator per offspring: each is drawn in turn
    /// against its probability and the first hit wins
    pub fn select_structural<R: Rng + ?Sized>(
        config: &MutationConfig,
        rng: &mut R,
    ) -> Option<Mutation> {
        Self::STRUCTURAL
            .into_iter()
            .find(|m| rng.gen::<f64>() < m.probability(config))
    }

    pub fn name(self) -> &'static str {
        match self {
            Mutation::AddNode => "add_node",
            Mutation::AddLink => "add_link",
            Mutation::ConnectSensors => "connect_sensors",
            Mutation::RandomTrait => "random_trait",
            Mutation::LinkTrait => "link_trait",
            Mutation::NodeTrait => "node_trait",
            Mutation::LinkWeights => "link_weights",
            Mutation::ToggleEnable => "toggle_enable",
            Mutation::GeneReenable => "gene_reenable",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Copy of `source` with every parameter drawn above `param_mut_prob`
/// shifted by up to `power`, kept inside [0, 1]
pub fn perturb_trait<R: Rng + ?Sized>(
    source: &Trait,
    power: f64,
    param_mut_prob: f64,
    rng: &mut R,
) -> Trait {
    let mut params = source.params;
    for p in params.iter_mut() {
        if rng.gen::<f64>() > param_mut_prob {
            *p = (*p + rand_pos_neg(rng) * rng.gen::<f64>() * power).clamp(0.0, 1.0);
        }
    }
    Trait::with_params(source.id, params)
}

fn no_genes(genome: &Genome) -> GeneticsError {
    GeneticsError::Mutation(format!("genome {} has no genes", genome.id))
}

fn no_traits(genome: &Genome) -> GeneticsError {
    GeneticsError::Mutation(format!("genome {} has no traits", genome.id))
}

impl Genome {
    /// Apply one operator
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        mutation: Mutation,
        ledger: &mut InnovationLedger,
        config: &MutationConfig,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        match mutation {
            Mutation::AddNode => self.mutate_add_node(ledger, rng),
            Mutation::AddLink => self.mutate_add_link(ledger, config, rng),
            Mutation::ConnectSensors => self.mutate_connect_sensors(ledger, rng),
            other => self.mutate_parametric(other, config, rng),
        }
    }

    fn mutate_parametric<R: Rng + ?Sized>(
        &mut self,
        mutation: Mutation,
        config: &MutationConfig,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        match mutation {
            Mutation::RandomTrait => self.mutate_random_trait(config, rng),
            Mutation::LinkTrait => self.mutate_link_trait(1, rng),
            Mutation::NodeTrait => self.mutate_node_trait(1, rng),
            Mutation::LinkWeights => self.mutate_link_weights(
                config.weight_mut_power,
                1.0,
                MutatorType::Gaussian,
                rng,
            ),
            Mutation::ToggleEnable => self.mutate_toggle_enable(1, rng),
            Mutation::GeneReenable => self.mutate_gene_reenable(),
            structural => Err(GeneticsError::Mutation(format!(
                "{} needs an innovation ledger",
                structural
            ))),
        }
    }

    /// Draw every parametric operator against its probability and apply the
    /// hits. Inapplicable operators are skipped.
    pub fn mutate_all_nonstructural<R: Rng + ?Sized>(
        &mut self,
        config: &MutationConfig,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        let mut changed = false;
        for mutation in Mutation::NONSTRUCTURAL {
            if rng.gen::<f64>() >= mutation.probability(config) {
                continue;
            }
            match self.mutate_parametric(mutation, config, rng) {
                Ok(applied) => changed |= applied,
                Err(e) if e.is_mutation() => {
                    trace!(target: "neat-genetics", "Genome {}: {}", self.id, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(changed)
    }

    /// Connect two nodes not yet connected in the chosen direction.
    ///
    /// With probability `recur_only_prob` only recurrent links are searched
    /// for (half of those attempts try a self-loop), otherwise only
    /// feed-forward ones. Recurrence is decided on a scratch phenotype.
    pub fn mutate_add_link<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut InnovationLedger,
        config: &MutationConfig,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.nodes.is_empty() {
            return Err(GeneticsError::Mutation(format!(
                "genome {} has no nodes",
                self.id
            )));
        }
        let net = self.genesis(self.id)?;

        let do_recur = rng.gen::<f64>() < config.recur_only_prob;
        let node_count = self.nodes.len();
        let first_non_sensor = self.nodes.iter().take_while(|n| n.is_sensor()).count();
        if first_non_sensor >= node_count {
            return Err(GeneticsError::Mutation(format!(
                "genome {} has no neuron nodes",
                self.id
            )));
        }
        let thresh = node_count * node_count;

        let mut found: Option<(NodeId, NodeId)> = None;
        for _ in 0..config.new_link_tries {
            let (in_idx, out_idx) = if do_recur && rng.gen::<f64>() > 0.5 {
                let j = rng.gen_range(first_non_sensor..node_count);
                (j, j)
            } else {
                (
                    rng.gen_range(0..node_count),
                    rng.gen_range(first_non_sensor..node_count),
                )
            };
            let (in_node, out_node) = (&self.nodes[in_idx], &self.nodes[out_idx]);
            if out_node.is_sensor() {
                continue;
            }

            let candidate = Link::new(0.0, in_node.id, out_node.id, do_recur);
            if self
                .genes
                .iter()
                .any(|g| g.link.is_equal_genetically(&candidate))
            {
                continue;
            }

            let mut count = 0;
            let recur_flag = net.is_recurrent(in_node.id, out_node.id, &mut count, thresh);
            if count > thresh {
                debug!(
                    target: "neat-genetics",
                    "Genome {}: recurrence check {} -> {} gave up after {} visits",
                    self.id, in_node.id, out_node.id, count
                );
            }
            if recur_flag == do_recur {
                found = Some((in_node.id, out_node.id));
                break;
            }
        }

        let Some((in_id, out_id)) = found else {
            trace!(
                target: "neat-genetics",
                "Genome {}: no free link found in {} tries",
                self.id, config.new_link_tries
            );
            return Ok(false);
        };

        let gene = match ledger.find_link(in_id, out_id, do_recur) {
            Some(record) => Gene::new(
                record.weight,
                in_id,
                out_id,
                do_recur,
                record.innovation_num,
                0.0,
            )
            .with_trait(record.trait_id),
            None => {
                let trait_id = self.random_trait_id(rng);
                let weight = rand_pos_neg(rng) * rng.gen::<f64>() * 10.0;
                let innovation_num = ledger.next_innovation();
                ledger.record_link(LinkInnovation {
                    in_node: in_id,
                    out_node: out_id,
                    is_recurrent: do_recur,
                    innovation_num,
                    weight,
                    trait_id,
                });
                Gene::new(weight, in_id, out_id, do_recur, innovation_num, weight)
                    .with_trait(trait_id)
            }
        };

        trace!(target: "neat-genetics", "Genome {}: add link {}", self.id, gene);
        Genome::gene_insert(&mut self.genes, gene);
        Ok(true)
    }

    /// Pick one sensor with no outgoing gene and link it to every neuron
    pub fn mutate_connect_sensors<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut InnovationLedger,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.genes.is_empty() {
            return Err(no_genes(self));
        }

        let disconnected: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.is_sensor())
            .map(|n| n.id)
            .filter(|&id| !self.genes.iter().any(|g| g.in_node() == id))
            .collect();
        if disconnected.is_empty() {
            return Ok(false);
        }
        let sensor = disconnected[rng.gen_range(0..disconnected.len())];

        let targets: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| !n.is_sensor())
            .map(|n| n.id)
            .collect();

        let mut added = false;
        for out_id in targets {
            if self
                .genes
                .iter()
                .any(|g| g.in_node() == sensor && g.out_node() == out_id)
            {
                continue;
            }

            let gene = match ledger.find_link(sensor, out_id, false) {
                Some(record) => {
                    let gene = Gene::new(record.weight, sensor, out_id, false, record.innovation_num, 0.0)
                        .with_trait(record.trait_id);
                    if self.has_gene(&gene) {
                        continue;
                    }
                    gene
                }
                None => {
                    let trait_id = self.random_trait_id(rng);
                    let weight = rand_pos_neg(rng) * rng.gen::<f64>() * 10.0;
                    let innovation_num = ledger.next_innovation();
                    ledger.record_link(LinkInnovation {
                        in_node: sensor,
                        out_node: out_id,
                        is_recurrent: false,
                        innovation_num,
                        weight,
                        trait_id,
                    });
                    Gene::new(weight, sensor, out_id, false, innovation_num, weight)
                        .with_trait(trait_id)
                }
            };
            Genome::gene_insert(&mut self.genes, gene);
            added = true;
        }

        if added {
            trace!(target: "neat-genetics", "Genome {}: connected sensor {}", self.id, sensor);
        }
        Ok(added)
    }

    /// Split an enabled gene through a new hidden node.
    ///
    /// The split gene is disabled; the gene into the new node has weight 1.0
    /// and keeps the old recurrence, the gene out of it takes the old weight.
    /// Genes leaving the bias node are never split.
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut InnovationLedger,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.genes.is_empty() {
            return Err(no_genes(self));
        }

        let nodes = &self.nodes;
        let splittable = |gene: &Gene| {
            gene.is_enabled
                && nodes
                    .iter()
                    .find(|n| n.id == gene.in_node())
                    .map_or(false, |n| n.neuron_type != NeuronType::Bias)
        };

        // Small genomes favour older genes, larger ones pick at random
        let mut chosen = None;
        if self.genes.len() < 15 {
            for (i, gene) in self.genes.iter().enumerate() {
                if splittable(gene) && rng.gen::<f64>() >= 0.3 {
                    chosen = Some(i);
                    break;
                }
            }
        } else {
            for _ in 0..20 {
                let i = rng.gen_range(0..self.genes.len());
                if splittable(&self.genes[i]) {
                    chosen = Some(i);
                    break;
                }
            }
        }
        let Some(idx) = chosen else {
            return Ok(false);
        };

        let old = self.genes[idx].clone();
        let (in_id, out_id) = (old.in_node(), old.out_node());
        let node_trait = self.traits.first().map(|t| t.id);

        let (node_id, innov1, innov2, novel) =
            match ledger.find_node(in_id, out_id, old.innovation_num) {
                Some(record) => {
                    if self.has_node(record.new_node_id) {
                        return Ok(false);
                    }
                    (
                        record.new_node_id,
                        record.innovation_num1,
                        record.innovation_num2,
                        false,
                    )
                }
                None => {
                    let node_id = ledger.next_node_id();
                    let innov1 = ledger.next_innovation();
                    let innov2 = ledger.next_innovation();
                    (node_id, innov1, innov2, true)
                }
            };

        if novel {
            ledger.record_node(NodeInnovation {
                in_node: in_id,
                out_node: out_id,
                old_innovation_num: old.innovation_num,
                new_node_id: node_id,
                innovation_num1: innov1,
                innovation_num2: innov2,
            });
        }

        self.genes[idx].is_enabled = false;
        let gene1 = Gene::new(1.0, in_id, node_id, old.link.is_recurrent, innov1, 0.0)
            .with_trait(old.link.trait_id);
        let gene2 = Gene::new(old.link.weight, node_id, out_id, false, innov2, 0.0)
            .with_trait(old.link.trait_id);
        Genome::gene_insert(&mut self.genes, gene1);
        Genome::gene_insert(&mut self.genes, gene2);
        Genome::node_insert(
            &mut self.nodes,
            NNode::new(node_id, NeuronType::Hidden).with_trait(node_trait),
        );

        trace!(
            target: "neat-genetics",
            "Genome {}: node {} splits gene {} ({} -> {})",
            self.id, node_id, old.innovation_num, in_id, out_id
        );
        Ok(true)
    }

    /// Perturb or replace link weights.
    ///
    /// Half the calls are severe. Otherwise the last fifth of a long genome
    /// is mutated harder, the newer genes being the least tested.
    pub fn mutate_link_weights<R: Rng + ?Sized>(
        &mut self,
        power: f64,
        rate: f64,
        mutator: MutatorType,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.genes.is_empty() {
            return Err(no_genes(self));
        }

        let severe = rng.gen::<f64>() > 0.5;
        let gene_total = self.genes.len() as f64;
        let end_part = gene_total * 0.8;

        for (num, gene) in self.genes.iter_mut().enumerate() {
            let (gauss_point, cold_gauss_point) = if severe {
                (0.3, 0.1)
            } else if gene_total >= 10.0 && num as f64 > end_part {
                (0.5, 0.3)
            } else if rng.gen::<f64>() > 0.5 {
                (1.0 - rate, 1.0 - rate - 0.1)
            } else {
                (1.0 - rate, 1.0 - rate)
            };

            let rand_val = rand_pos_neg(rng) * rng.gen::<f64>() * power;
            match mutator {
                MutatorType::Gaussian => {
                    let choice = rng.gen::<f64>();
                    if choice > gauss_point {
                        gene.link.weight += rand_val;
                    } else if choice > cold_gauss_point {
                        gene.link.weight = rand_val;
                    }
                }
                MutatorType::ColdGaussian => gene.link.weight = rand_val,
            }
            gene.mutation_num = gene.link.weight;
        }
        Ok(true)
    }

    /// Replace one random trait with a perturbed copy
    pub fn mutate_random_trait<R: Rng + ?Sized>(
        &mut self,
        config: &MutationConfig,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.traits.is_empty() {
            return Err(no_traits(self));
        }
        let idx = rng.gen_range(0..self.traits.len());
        self.traits[idx] = perturb_trait(
            &self.traits[idx],
            config.trait_mutation_power,
            config.trait_param_mut_prob,
            rng,
        );
        Ok(true)
    }

    /// Point `times` random genes at random traits
    pub fn mutate_link_trait<R: Rng + ?Sized>(
        &mut self,
        times: usize,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.traits.is_empty() {
            return Err(no_traits(self));
        }
        if self.genes.is_empty() {
            return Err(no_genes(self));
        }
        for _ in 0..times {
            let trait_id = self.random_trait_id(rng);
            let idx = rng.gen_range(0..self.genes.len());
            self.genes[idx].link.trait_id = trait_id;
        }
        Ok(true)
    }

    /// Point `times` random nodes at random traits
    pub fn mutate_node_trait<R: Rng + ?Sized>(
        &mut self,
        times: usize,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.traits.is_empty() {
            return Err(no_traits(self));
        }
        if self.nodes.is_empty() {
            return Err(GeneticsError::Mutation(format!(
                "genome {} has no nodes",
                self.id
            )));
        }
        for _ in 0..times {
            let trait_id = self.random_trait_id(rng);
            let idx = rng.gen_range(0..self.nodes.len());
            self.nodes[idx].trait_id = trait_id;
        }
        Ok(true)
    }

    /// Flip `times` random genes. An enabled gene is only disabled when
    /// another enabled gene leaves the same node, so no part of the network
    /// gets cut off.
    pub fn mutate_toggle_enable<R: Rng + ?Sized>(
        &mut self,
        times: usize,
        rng: &mut R,
    ) -> GeneticsResult<bool> {
        if self.genes.is_empty() {
            return Err(no_genes(self));
        }
        for _ in 0..times {
            let idx = rng.gen_range(0..self.genes.len());
            let gene = &self.genes[idx];
            if gene.is_enabled {
                let has_sibling = self.genes.iter().any(|g| {
                    g.is_enabled
                        && g.in_node() == gene.in_node()
                        && g.innovation_num != gene.innovation_num
                });
                if has_sibling {
                    self.genes[idx].is_enabled = false;
                }
            } else {
                self.genes[idx].is_enabled = true;
            }
        }
        Ok(true)
    }

    /// Enable the first disabled gene
    pub fn mutate_gene_reenable(&mut self) -> GeneticsResult<bool> {
        match self.genes.iter_mut().find(|g| !g.is_enabled) {
            Some(gene) => {
                gene.is_enabled = true;
                Ok(true)
            }
            None => Err(GeneticsError::Mutation(format!(
                "genome {} has no disabled gene",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::build_test_genome;
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_add_link_recurrent_only() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut genome = build_test_genome(1);
        let mut ledger = InnovationLedger::new(4, 5);
        let config = MutationConfig {
            recur_only_prob: 1.0,
            new_link_tries: 50,
            ..MutationConfig::default()
        };

        assert!(genome.mutate_add_link(&mut ledger, &config, &mut rng).unwrap());
        assert_eq!(genome.genes.len(), 4);
        assert_eq!(ledger.current_innovation(), 5);
        assert_eq!(ledger.records().len(), 1);

        // the output is the only neuron, so the new link is its self-loop
        let gene = &genome.genes[3];
        assert_eq!(gene.innovation_num, 4);
        assert!(gene.link.is_recurrent);
        assert_eq!((gene.in_node(), gene.out_node()), (4, 4));
        genome.verify().unwrap();
    }

    #[test]
    fn test_add_link_feed_forward() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut genome = build_test_genome(1);
        Genome::node_insert(&mut genome.nodes, NNode::new(5, NeuronType::Hidden));
        let mut ledger = InnovationLedger::new(4, 6);
        let config = MutationConfig {
            recur_only_prob: 0.0,
            ..MutationConfig::default()
        };

        assert!(genome.mutate_add_link(&mut ledger, &config, &mut rng).unwrap());
        assert_eq!(genome.genes.len(), 4);
        let added = genome.genes.iter().find(|g| g.innovation_num == 4).unwrap();
        assert!(!added.link.is_recurrent);
        assert_ne!(added.in_node(), added.out_node());
        genome.verify().unwrap();
    }

    #[test]
    fn test_add_link_never_duplicates() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut genome = build_test_genome(1);
        let mut ledger = InnovationLedger::new(4, 5);
        let config = MutationConfig {
            recur_only_prob: 0.0,
            ..MutationConfig::default()
        };

        // every sensor already feeds the only neuron
        assert!(!genome.mutate_add_link(&mut ledger, &config, &mut rng).unwrap());
        assert_eq!(genome.genes.len(), 3);
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn test_add_link_reuses_ledger_record() {
        let config = MutationConfig {
            recur_only_prob: 1.0,
            ..MutationConfig::default()
        };
        let mut ledger = InnovationLedger::new(4, 5);
        let mut rng = StdRng::seed_from_u64(11);

        let mut first = build_test_genome(1);
        let mut second = build_test_genome(2);
        assert!(first.mutate_add_link(&mut ledger, &config, &mut rng).unwrap());
        assert!(second.mutate_add_link(&mut ledger, &config, &mut rng).unwrap());

        assert_eq!(ledger.current_innovation(), 5);
        assert_eq!(first.genes[3].innovation_num, second.genes[3].innovation_num);
        assert_eq!(first.genes[3].link.weight, second.genes[3].link.weight);
    }

    #[test]
    fn test_connect_sensors() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut genome = build_test_genome(1);
        let mut ledger = InnovationLedger::new(4, 6);

        assert!(!genome.mutate_connect_sensors(&mut ledger, &mut rng).unwrap());

        Genome::node_insert(&mut genome.nodes, NNode::new(5, NeuronType::Input));
        assert!(genome.mutate_connect_sensors(&mut ledger, &mut rng).unwrap());
        assert_eq!(genome.genes.len(), 4);
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(genome.genes[3].in_node(), 5);
        assert_eq!(genome.genes[3].out_node(), 4);

        let mut empty = Genome::new(2, Vec::new(), Vec::new(), Vec::new());
        assert!(empty
            .mutate_connect_sensors(&mut ledger, &mut rng)
            .unwrap_err()
            .is_mutation());
    }

    fn add_node_until_applied(
        genome: &mut Genome,
        ledger: &mut InnovationLedger,
        rng: &mut StdRng,
    ) -> bool {
        (0..20).any(|_| genome.mutate_add_node(ledger, rng).unwrap())
    }

    #[test]
    fn test_add_node() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut genome = build_test_genome(1);
        let mut ledger = InnovationLedger::new(4, 0);

        assert!(add_node_until_applied(&mut genome, &mut ledger, &mut rng));
        assert_eq!(ledger.current_innovation(), 6);
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(genome.genes.len(), 5);
        assert_eq!(genome.nodes.len(), 5);
        assert_eq!(genome.nodes[0].id, 0);
        assert_eq!(genome.nodes[0].neuron_type, NeuronType::Hidden);
        assert_eq!(genome.extrons(), 4);

        let split = genome.genes.iter().find(|g| !g.is_enabled).unwrap();
        let (into, out_of) = (&genome.genes[3], &genome.genes[4]);
        assert_eq!((into.in_node(), into.out_node()), (split.in_node(), 0));
        assert_eq!((out_of.in_node(), out_of.out_node()), (0, split.out_node()));
        assert_eq!(into.link.weight, 1.0);
        assert_eq!(out_of.link.weight, split.link.weight);
        genome.verify().unwrap();
    }

    #[test]
    fn test_add_node_never_splits_bias_gene() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut genome = build_test_genome(1);
        genome.genes.truncate(0);
        genome
            .genes
            .push(Gene::new(3.5, 3, 4, false, 3, 0.0).with_trait(Some(3)));
        let mut ledger = InnovationLedger::new(4, 5);

        assert!(!add_node_until_applied(&mut genome, &mut ledger, &mut rng));
        assert!(genome.genes[0].is_enabled);
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn test_identical_splits_share_innovations() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut ledger = InnovationLedger::new(4, 5);

        // gene 1 -> 4 is the only one that can be split
        let single_split = |id| {
            let mut genome = build_test_genome(id);
            genome.genes.remove(1);
            genome
        };
        let mut first = single_split(1);
        let mut second = single_split(2);

        assert!(add_node_until_applied(&mut first, &mut ledger, &mut rng));
        assert!(add_node_until_applied(&mut second, &mut ledger, &mut rng));

        assert_eq!(ledger.current_innovation(), 6);
        assert_eq!(ledger.current_node_id(), 6);
        assert_eq!(first.genes, second.genes);
        assert_eq!(first.nodes, second.nodes);
        assert!(first.has_node(5));
    }

    #[test]
    fn test_link_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut genome = build_test_genome(1);

        assert!(genome
            .mutate_link_weights(0.5, 1.0, MutatorType::ColdGaussian, &mut rng)
            .unwrap());
        for gene in &genome.genes {
            assert!(gene.link.weight.abs() <= 0.5);
            assert_eq!(gene.mutation_num, gene.link.weight);
        }

        assert!(genome
            .mutate_link_weights(2.5, 1.0, MutatorType::Gaussian, &mut rng)
            .unwrap());
        for gene in &genome.genes {
            assert_eq!(gene.mutation_num, gene.link.weight);
        }

        let mut empty = Genome::new(2, Vec::new(), Vec::new(), Vec::new());
        assert!(empty
            .mutate_link_weights(1.0, 1.0, MutatorType::Gaussian, &mut rng)
            .is_err());
    }

    #[test]
    fn test_random_trait() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut genome = build_test_genome(1);
        for t in genome.traits.iter_mut() {
            t.params = [0.5; 8];
        }
        let before = genome.traits.clone();
        let config = MutationConfig {
            trait_mutation_power: 0.3,
            trait_param_mut_prob: 0.0,
            ..MutationConfig::default()
        };

        assert!(genome.mutate_random_trait(&config, &mut rng).unwrap());
        assert_ne!(genome.traits, before);
        for (t, old) in genome.traits.iter().zip(&before) {
            assert_eq!(t.id, old.id);
            assert!(t.params.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_link_and_node_trait() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut genome = build_test_genome(1);

        assert!(genome.mutate_link_trait(10, &mut rng).unwrap());
        assert!(genome.mutate_node_trait(10, &mut rng).unwrap());
        let ids: Vec<_> = genome.traits.iter().map(|t| t.id).collect();
        assert!(genome
            .genes
            .iter()
            .all(|g| ids.contains(&g.link.trait_id.unwrap())));
        assert!(genome.nodes.iter().any(|n| n.trait_id.is_some()));

        genome.traits.clear();
        assert!(genome.mutate_node_trait(1, &mut rng).unwrap_err().is_mutation());
    }

    #[test]
    fn test_toggle_enable_keeps_in_node_connected() {
        let mut rng = StdRng::seed_from_u64(41);
        let mut genome = build_test_genome(1);
        genome
            .genes
            .push(Gene::new(5.5, 3, 4, true, 4, 0.0).with_trait(Some(3)));

        assert!(genome.mutate_toggle_enable(5, &mut rng).unwrap());
        assert!(genome.genes[0].is_enabled);
        assert!(genome.genes[1].is_enabled);
        let disabled_from_bias = genome.genes[2..].iter().filter(|g| !g.is_enabled).count();
        assert!(disabled_from_bias <= 1);
    }

    #[test]
    fn test_toggle_enable_reenables() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut genome = build_test_genome(1);
        genome.genes.truncate(1);
        genome.genes[0].is_enabled = false;

        assert!(genome.mutate_toggle_enable(1, &mut rng).unwrap());
        assert!(genome.genes[0].is_enabled);
    }

    #[test]
    fn test_gene_reenable() {
        let mut genome = build_test_genome(1);
        genome
            .genes
            .push(Gene::new(5.5, 3, 4, true, 4, 0.0).with_trait(Some(3)));
        genome.genes[1].is_enabled = false;
        genome.genes[3].is_enabled = false;

        assert!(genome.mutate_gene_reenable().unwrap());
        assert!(genome.genes[1].is_enabled);
        assert!(!genome.genes[3].is_enabled);

        assert!(genome.mutate_gene_reenable().unwrap());
        assert!(genome.mutate_gene_reenable().unwrap_err().is_mutation());
    }

    #[test]
    fn test_select_structural() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut config = MutationConfig {
            mutate_add_node_prob: 0.0,
            mutate_add_link_prob: 1.0,
            mutate_connect_sensors: 1.0,
            ..MutationConfig::default()
        };
        assert_eq!(Mutation::select_structural(&config, &mut rng), Some(Mutation::AddLink));

        config.mutate_add_link_prob = 0.0;
        config.mutate_connect_sensors = 0.0;
        assert_eq!(Mutation::select_structural(&config, &mut rng), None);
        assert!(Mutation::AddNode.is_structural());
        assert!(!Mutation::LinkWeights.is_structural());
    }

    #[test]
    fn test_all_nonstructural_skips_inapplicable() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut genome = build_test_genome(1);
        let config = MutationConfig {
            mutate_random_trait_prob: 0.0,
            mutate_link_trait_prob: 0.0,
            mutate_node_trait_prob: 0.0,
            mutate_link_weights_prob: 1.0,
            mutate_toggle_enable_prob: 0.0,
            mutate_gene_reenable_prob: 1.0,
            ..MutationConfig::default()
        };

        // nothing is disabled, yet the weights still mutate
        assert!(genome.mutate_all_nonstructural(&config, &mut rng).unwrap());
        assert!(genome.genes.iter().all(|g| g.mutation_num == g.link.weight));
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Crossover operators.
//!
//! Genes of both parents are aligned by innovation number. The child gets
//! averaged traits (ids from the first parent), every input, bias and output
//! node of the second parent, and whatever hidden nodes its genes touch.

use super::Genome;
use crate::error::{GeneticsError, GeneticsResult};
use crate::gene::Gene;
use neat_config::{MatingConfig, UnmatchedGenePolicy};
use neat_network::{NNode, NeuronType, NodeId, Trait, TraitId};
use rand::Rng;
use tracing::trace;

/// Probability that a matched gene disabled in either parent stays disabled
const INHERIT_DISABLED_PROB: f64 = 0.75;

/// Incrementally assembled offspring
struct ChildBuilder {
    traits: Vec<Trait>,
    nodes: Vec<NNode>,
    genes: Vec<Gene>,
}

impl ChildBuilder {
    fn new(p1: &Genome, p2: &Genome) -> GeneticsResult<Self> {
        if p1.traits.len() != p2.traits.len() {
            return Err(GeneticsError::Crossover(format!(
                "genomes {} and {} carry {} and {} traits",
                p1.id,
                p2.id,
                p1.traits.len(),
                p2.traits.len()
            )));
        }
        let traits = p1
            .traits
            .iter()
            .zip(&p2.traits)
            .map(|(a, b)| Trait::average(a, b))
            .collect();

        let mut child = Self {
            traits,
            nodes: Vec::new(),
            genes: Vec::new(),
        };
        for node in &p2.nodes {
            if matches!(
                node.neuron_type,
                NeuronType::Input | NeuronType::Bias | NeuronType::Output
            ) {
                let copy = child.copy_node(node, p2);
                Genome::node_insert(&mut child.nodes, copy);
            }
        }
        Ok(child)
    }

    /// Child trait occupying the same position as `id` does in `source`
    fn remap_trait(&self, source: &Genome, id: Option<TraitId>) -> Option<TraitId> {
        let pos = source.traits.iter().position(|t| Some(t.id) == id)?;
        self.traits.get(pos).map(|t| t.id)
    }

    fn copy_node(&self, node: &NNode, source: &Genome) -> NNode {
        NNode::new(node.id, node.neuron_type)
            .with_trait(self.remap_trait(source, node.trait_id))
            .with_activation(node.activation_type)
    }

    fn copy_gene(&self, gene: &Gene, source: &Genome) -> Gene {
        let mut copy = gene.clone();
        copy.link.trait_id = self.remap_trait(source, gene.link.trait_id);
        copy
    }

    fn ensure_node(&mut self, id: NodeId, source: &Genome, other: &Genome) -> GeneticsResult<()> {
        if self.nodes.iter().any(|n| n.id == id) {
            return Ok(());
        }
        let (node, owner) = match source.node_by_id(id) {
            Some(node) => (node, source),
            None => match other.node_by_id(id) {
                Some(node) => (node, other),
                None => {
                    return Err(GeneticsError::Verify(format!(
                        "node {} missing from genomes {} and {}",
                        id, source.id, other.id
                    )))
                }
            },
        };
        let copy = self.copy_node(node, owner);
        Genome::node_insert(&mut self.nodes, copy);
        Ok(())
    }

    /// Add a gene unless an equivalent link was already inherited
    fn push(&mut self, gene: Gene, source: &Genome, other: &Genome) -> GeneticsResult<bool> {
        if self
            .genes
            .iter()
            .any(|g| g.link.is_equal_genetically(&gene.link))
        {
            return Ok(false);
        }
        self.ensure_node(gene.in_node(), source, other)?;
        self.ensure_node(gene.out_node(), source, other)?;
        Genome::gene_insert(&mut self.genes, gene);
        Ok(true)
    }

    fn finish(self, id: usize) -> Genome {
        Genome::new(id, self.traits, self.nodes, self.genes)
    }
}

fn disabled_in_either<R: Rng + ?Sized>(g1: &Gene, g2: &Gene, rng: &mut R) -> bool {
    (!g1.is_enabled || !g2.is_enabled) && rng.gen::<f64>() < INHERIT_DISABLED_PROB
}

/// Whether the first parent counts as the better one: strictly fitter, or
/// equally fit and smaller
fn first_is_better(p1: &Genome, p2: &Genome, fitness1: f64, fitness2: f64) -> bool {
    fitness1 > fitness2 || (fitness1 == fitness2 && p1.genes.len() < p2.genes.len())
}

fn keep_unmatched<R: Rng + ?Sized>(
    from_first: bool,
    first_better: bool,
    policy: UnmatchedGenePolicy,
    rng: &mut R,
) -> bool {
    if from_first == first_better {
        return true;
    }
    match policy {
        UnmatchedGenePolicy::Fitter => false,
        UnmatchedGenePolicy::Either => rng.gen::<f64>() < 0.5,
    }
}

/// Blend of two matched genes; every structural field is picked from a
/// random parent, the weight and mutation number are averaged
fn average_gene<R: Rng + ?Sized>(
    child: &ChildBuilder,
    g1: &Gene,
    p1: &Genome,
    g2: &Gene,
    p2: &Genome,
    rng: &mut R,
) -> Gene {
    let trait_id = if rng.gen::<f64>() > 0.5 {
        child.remap_trait(p1, g1.link.trait_id)
    } else {
        child.remap_trait(p2, g2.link.trait_id)
    };
    let in_node = if rng.gen::<f64>() > 0.5 {
        g1.in_node()
    } else {
        g2.in_node()
    };
    let out_node = if rng.gen::<f64>() > 0.5 {
        g1.out_node()
    } else {
        g2.out_node()
    };
    let recurrent = if rng.gen::<f64>() > 0.5 {
        g1.link.is_recurrent
    } else {
        g2.link.is_recurrent
    };

    let mut gene = Gene::new(
        (g1.link.weight + g2.link.weight) / 2.0,
        in_node,
        out_node,
        recurrent,
        g1.innovation_num,
        (g1.mutation_num + g2.mutation_num) / 2.0,
    )
    .with_trait(trait_id);
    gene.is_enabled = !disabled_in_either(g1, g2, rng);
    gene
}

impl Genome {
    /// Matched genes come from the fitter parent (equal fitness resolved
    /// per gene by `matched_gene_tie_prob`); unmatched genes follow the
    /// configured policy.
    pub fn mate_multipoint<R: Rng + ?Sized>(
        &self,
        other: &Genome,
        child_id: usize,
        fitness1: f64,
        fitness2: f64,
        config: &MatingConfig,
        rng: &mut R,
    ) -> GeneticsResult<Genome> {
        let mut child = ChildBuilder::new(self, other)?;
        let first_better = first_is_better(self, other, fitness1, fitness2);

        let (mut i1, mut i2) = (0, 0);
        while i1 < self.genes.len() || i2 < other.genes.len() {
            let (chosen, from_first) = match (self.genes.get(i1), other.genes.get(i2)) {
                (Some(g1), Some(g2)) if g1.innovation_num == g2.innovation_num => {
                    i1 += 1;
                    i2 += 1;
                    let take_first = if fitness1 != fitness2 {
                        fitness1 > fitness2
                    } else {
                        rng.gen::<f64>() < config.matched_gene_tie_prob
                    };
                    let mut gene = if take_first {
                        child.copy_gene(g1, self)
                    } else {
                        child.copy_gene(g2, other)
                    };
                    gene.is_enabled = !disabled_in_either(g1, g2, rng);
                    child.push(
                        gene,
                        if take_first { self } else { other },
                        if take_first { other } else { self },
                    )?;
                    continue;
                }
                (Some(g1), Some(g2)) if g1.innovation_num < g2.innovation_num => {
                    i1 += 1;
                    (g1, true)
                }
                (Some(_), Some(g2)) => {
                    i2 += 1;
                    (g2, false)
                }
                (Some(g1), None) => {
                    i1 += 1;
                    (g1, true)
                }
                (None, Some(g2)) => {
                    i2 += 1;
                    (g2, false)
                }
                (None, None) => break,
            };

            if keep_unmatched(from_first, first_better, config.unmatched_genes, rng) {
                let (source, fallback) = if from_first { (self, other) } else { (other, self) };
                let gene = child.copy_gene(chosen, source);
                child.push(gene, source, fallback)?;
            }
        }

        let baby = child.finish(child_id);
        trace!(
            target: "neat-genetics",
            "Multipoint mating of {} and {}: child {} with {} genes",
            self.id, other.id, child_id, baby.genes.len()
        );
        Ok(baby)
    }

    /// Like [`Genome::mate_multipoint`], but matched genes are blended
    pub fn mate_multipoint_avg<R: Rng + ?Sized>(
        &self,
        other: &Genome,
        child_id: usize,
        fitness1: f64,
        fitness2: f64,
        config: &MatingConfig,
        rng: &mut R,
    ) -> GeneticsResult<Genome> {
        let mut child = ChildBuilder::new(self, other)?;
        let first_better = first_is_better(self, other, fitness1, fitness2);

        let (mut i1, mut i2) = (0, 0);
        while i1 < self.genes.len() || i2 < other.genes.len() {
            let (chosen, from_first) = match (self.genes.get(i1), other.genes.get(i2)) {
                (Some(g1), Some(g2)) if g1.innovation_num == g2.innovation_num => {
                    i1 += 1;
                    i2 += 1;
                    let gene = average_gene(&child, g1, self, g2, other, rng);
                    child.push(gene, self, other)?;
                    continue;
                }
                (Some(g1), Some(g2)) if g1.innovation_num < g2.innovation_num => {
                    i1 += 1;
                    (g1, true)
                }
                (Some(_), Some(g2)) => {
                    i2 += 1;
                    (g2, false)
                }
                (Some(g1), None) => {
                    i1 += 1;
                    (g1, true)
                }
                (None, Some(g2)) => {
                    i2 += 1;
                    (g2, false)
                }
                (None, None) => break,
            };

            if keep_unmatched(from_first, first_better, config.unmatched_genes, rng) {
                let (source, fallback) = if from_first { (self, other) } else { (other, self) };
                let gene = child.copy_gene(chosen, source);
                child.push(gene, source, fallback)?;
            }
        }

        let baby = child.finish(child_id);
        trace!(
            target: "neat-genetics",
            "Multipoint-average mating of {} and {}: child {} with {} genes",
            self.id, other.id, child_id, baby.genes.len()
        );
        Ok(baby)
    }

    /// Splice at one crossover point chosen over the shorter genome: genes
    /// before it come from the shorter parent, genes after it from the
    /// longer one, and the gene at the point is a blend.
    pub fn mate_singlepoint<R: Rng + ?Sized>(
        &self,
        other: &Genome,
        child_id: usize,
        rng: &mut R,
    ) -> GeneticsResult<Genome> {
        let mut child = ChildBuilder::new(self, other)?;

        let (short, long) = if self.genes.len() < other.genes.len() {
            (self, other)
        } else {
            (other, self)
        };
        let cross_point = if short.genes.is_empty() {
            0
        } else {
            rng.gen_range(0..short.genes.len())
        };

        let (mut i1, mut i2, mut gene_counter) = (0, 0, 0);
        while i2 < long.genes.len() {
            let g2 = &long.genes[i2];
            let Some(g1) = short.genes.get(i1) else {
                i2 += 1;
                let gene = child.copy_gene(g2, long);
                child.push(gene, long, short)?;
                continue;
            };

            if g1.innovation_num == g2.innovation_num {
                let gene = if gene_counter < cross_point {
                    (child.copy_gene(g1, short), short, long)
                } else if gene_counter == cross_point {
                    (average_gene(&child, g1, short, g2, long, rng), short, long)
                } else {
                    (child.copy_gene(g2, long), long, short)
                };
                i1 += 1;
                i2 += 1;
                gene_counter += 1;
                child.push(gene.0, gene.1, gene.2)?;
            } else if g1.innovation_num < g2.innovation_num {
                if gene_counter < cross_point {
                    i1 += 1;
                    gene_counter += 1;
                    let gene = child.copy_gene(g1, short);
                    child.push(gene, short, long)?;
                } else {
                    i2 += 1;
                    let gene = child.copy_gene(g2, long);
                    child.push(gene, long, short)?;
                }
            } else {
                i2 += 1;
            }
        }

        let baby = child.finish(child_id);
        trace!(
            target: "neat-genetics",
            "Singlepoint mating of {} and {} at {}: child {} with {} genes",
            self.id, other.id, cross_point, child_id, baby.genes.len()
        );
        Ok(baby)
    }
}

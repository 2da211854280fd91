// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Genome

The genetic encoding of one network: traits, nodes (sorted by id) and genes
(sorted ascending by innovation number). Genes and nodes reference nodes and
traits by id, so a genome is plain data and can be cloned, serialized and
compared freely.

The phenotype is not cached on the genome. [`Genome::genesis`] builds a fresh
[`Network`] on demand; the owning `Organism` keeps the one it evaluates.

## Modules

- `codec` - line-oriented text format (read / write)
- `compat` - compatibility distance
- `mutation` - structural and parametric mutation operators
- `crossover` - multipoint, multipoint-average and singlepoint mating
*/

pub mod codec;
mod compat;
mod crossover;
pub mod mutation;

use crate::error::{GeneticsError, GeneticsResult};
use crate::gene::{Gene, InnovationNum};
use crate::random::rand_pos_neg;
use neat_network::{NNode, Network, NeuronType, NodeId, Trait, TraitId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

pub use codec::format_real;
pub use mutation::{Mutation, MutatorType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub id: usize,
    pub traits: Vec<Trait>,
    pub nodes: Vec<NNode>,
    pub genes: Vec<Gene>,
}

impl Genome {
    pub fn new(id: usize, traits: Vec<Trait>, nodes: Vec<NNode>, genes: Vec<Gene>) -> Self {
        Self {
            id,
            traits,
            nodes,
            genes,
        }
    }

    /// Random genome from a connection matrix.
    ///
    /// Node ids: `1..=inputs` are sensors (the last one is the bias), then
    /// `hidden` hidden nodes, then the outputs occupy the top `outputs` ids of
    /// `inputs + max_hidden + outputs`. Each matrix cell set with probability
    /// `link_prob` becomes a gene whose innovation number is the cell index;
    /// cells on or below the diagonal are recurrent and only kept when
    /// `recurrent` is true.
    #[allow(clippy::too_many_arguments)]
    pub fn new_random<R: Rng + ?Sized>(
        id: usize,
        inputs: usize,
        outputs: usize,
        hidden: usize,
        max_hidden: usize,
        recurrent: bool,
        link_prob: f64,
        rng: &mut R,
    ) -> Genome {
        let total_nodes = inputs + outputs + max_hidden;
        let matrix_dim = total_nodes * total_nodes;
        let max_node = inputs + hidden;
        let first_output = total_nodes - outputs + 1;

        let dummy_trait = Trait::new(1);
        let trait_id = Some(dummy_trait.id);

        let cm: Vec<bool> = (0..matrix_dim).map(|_| rng.gen::<f64>() < link_prob).collect();

        let mut nodes = Vec::with_capacity(inputs + hidden + outputs);
        for n in 1..=inputs {
            let neuron_type = if n < inputs {
                NeuronType::Input
            } else {
                NeuronType::Bias
            };
            nodes.push(NNode::new(n, neuron_type).with_trait(trait_id));
        }
        for n in inputs + 1..=max_node {
            nodes.push(NNode::new(n, NeuronType::Hidden).with_trait(trait_id));
        }
        for n in first_output..=total_nodes {
            nodes.push(NNode::new(n, NeuronType::Output).with_trait(trait_id));
        }

        let mut genes = Vec::new();
        let mut count = 0usize;
        for col in 1..=total_nodes {
            for row in 1..=total_nodes {
                let in_range = |n: usize| n <= max_node || n >= first_output;
                if cm[count] && col > inputs && in_range(col) && in_range(row) {
                    let is_recurrent = col <= row;
                    if !is_recurrent || recurrent {
                        let weight = rand_pos_neg(rng) * rng.gen::<f64>();
                        genes.push(
                            Gene::new(weight, row, col, is_recurrent, count as InnovationNum, weight)
                                .with_trait(trait_id),
                        );
                    }
                }
                count += 1;
            }
        }

        Genome::new(id, vec![dummy_trait], nodes, genes)
    }

    pub fn trait_by_id(&self, id: Option<TraitId>) -> Option<&Trait> {
        id.and_then(|id| self.traits.iter().find(|t| t.id == id))
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&NNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Build the phenotype: one node per genome node and one link per
    /// enabled gene
    pub fn genesis(&self, net_id: usize) -> GeneticsResult<Network> {
        let nodes = self
            .nodes
            .iter()
            .map(|n| n.phenotype_copy(self.trait_by_id(n.trait_id)))
            .collect();
        let links = self
            .genes
            .iter()
            .filter(|g| g.is_enabled)
            .map(|g| g.link.phenotype_copy(self.trait_by_id(g.link.trait_id)))
            .collect();
        let net = Network::new(net_id, nodes, links)?;
        trace!(
            target: "neat-genetics",
            "Genesis of genome {}: {} nodes, {} links",
            self.id,
            net.node_count(),
            net.link_count()
        );
        Ok(net)
    }

    /// Deep copy under a new id
    pub fn duplicate(&self, new_id: usize) -> Genome {
        let nodes = self
            .nodes
            .iter()
            .map(|n| {
                NNode::new(n.id, n.neuron_type)
                    .with_trait(n.trait_id)
                    .with_activation(n.activation_type)
            })
            .collect();
        Genome::new(new_id, self.traits.clone(), nodes, self.genes.clone())
    }

    /// Check gene endpoints, duplicate genes, duplicate node ids and gene order
    pub fn verify(&self) -> GeneticsResult<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|n| n.id == node.id) {
                return Err(GeneticsError::Verify(format!(
                    "duplicate node id {} in genome {}",
                    node.id, self.id
                )));
            }
        }

        for gene in &self.genes {
            for endpoint in [gene.in_node(), gene.out_node()] {
                if self.node_by_id(endpoint).is_none() {
                    return Err(GeneticsError::Verify(format!(
                        "missing node {} referenced by gene {} in genome {}",
                        endpoint, gene.innovation_num, self.id
                    )));
                }
            }
        }

        for (i, gene) in self.genes.iter().enumerate() {
            for other in &self.genes[i + 1..] {
                if other.innovation_num == gene.innovation_num {
                    return Err(GeneticsError::Verify(format!(
                        "duplicate innovation number {} in genome {}",
                        gene.innovation_num, self.id
                    )));
                }
                if other.link.is_equal_genetically(&gene.link) {
                    return Err(GeneticsError::Verify(format!(
                        "duplicate genes {} and {} ({} -> {}) in genome {}",
                        gene.innovation_num,
                        other.innovation_num,
                        gene.in_node(),
                        gene.out_node(),
                        self.id
                    )));
                }
            }
        }

        if let Some(w) = self
            .genes
            .windows(2)
            .find(|w| w[0].innovation_num >= w[1].innovation_num)
        {
            return Err(GeneticsError::Verify(format!(
                "genes out of innovation order ({} before {}) in genome {}",
                w[0].innovation_num, w[1].innovation_num, self.id
            )));
        }

        Ok(())
    }

    /// Number of enabled genes
    pub fn extrons(&self) -> usize {
        self.genes.iter().filter(|g| g.is_enabled).count()
    }

    /// Node count plus gene count
    pub fn complexity(&self) -> usize {
        self.nodes.len() + self.genes.len()
    }

    pub fn last_node_id(&self) -> Option<NodeId> {
        self.nodes.iter().map(|n| n.id).max()
    }

    /// Innovation number following the last gene
    pub fn next_gene_innovation(&self) -> InnovationNum {
        self.genes.last().map_or(0, |g| g.innovation_num + 1)
    }

    /// Whether a gene with the same endpoints and recurrence exists
    pub fn has_gene(&self, gene: &Gene) -> bool {
        self.genes
            .iter()
            .any(|g| g.link.is_equal_genetically(&gene.link))
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.node_by_id(id).is_some()
    }

    /// Insert keeping the list ascending by innovation number
    pub fn gene_insert(genes: &mut Vec<Gene>, gene: Gene) {
        let pos = genes.partition_point(|g| g.innovation_num < gene.innovation_num);
        genes.insert(pos, gene);
    }

    /// Insert keeping the list ascending by node id
    pub fn node_insert(nodes: &mut Vec<NNode>, node: NNode) {
        let pos = nodes.partition_point(|n| n.id < node.id);
        nodes.insert(pos, node);
    }

    pub(crate) fn random_trait_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TraitId> {
        if self.traits.is_empty() {
            None
        } else {
            Some(self.traits[rng.gen_range(0..self.traits.len())].id)
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GENOME START")?;
        writeln!(f, "  Nodes:")?;
        for n in &self.nodes {
            writeln!(f, "\t{}", n)?;
        }
        writeln!(f, "  Genes:")?;
        for g in &self.genes {
            writeln!(f, "\t{}", g)?;
        }
        writeln!(f, "  Traits:")?;
        for t in &self.traits {
            write!(f, "\t{}", t.id)?;
            for p in &t.params {
                write!(f, " {}", format_real(*p))?;
            }
            writeln!(f)?;
        }
        write!(f, "GENOME END")
    }
}

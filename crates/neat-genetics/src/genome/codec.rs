// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Genome text format
//!
//! ```text
//! genomestart <id>
//! trait <id> <p0> ... <p7>
//! node <id> <traitId|0> <nodeType> <neuronType>
//! gene <traitId|0> <in> <out> <weight> <recurrent> <innovation> <mutation> <enabled>
//! genomeend <id>
//! ```
//!
//! Node type codes: 0 neuron, 1 sensor. Neuron type codes: 0 hidden,
//! 1 input, 2 output, 3 bias. Reals are written in the shortest form that
//! round-trips, switching to exponent notation below 1e-4 and from 1e6 up.
//! Lines starting with `/*` are comments.

use super::Genome;
use crate::error::{GeneticsError, GeneticsResult};
use crate::gene::Gene;
use neat_network::{NNode, NeuronType, NodeType, Trait, TraitId, NUM_TRAIT_PARAMS};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::warn;

/// Shortest round-trip representation of a real, `%g` style
pub fn format_real(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if x == 0.0 {
        return format!("{}", x);
    }
    let sci = format!("{:e}", x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{}", x);
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= 6 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        format!("{}", x)
    }
}

fn trait_field(id: Option<TraitId>) -> TraitId {
    id.unwrap_or(0)
}

impl Genome {
    /// Write the genome in text form
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "genomestart {}", self.id)?;
        for t in &self.traits {
            write!(w, "trait {}", t.id)?;
            for p in &t.params {
                write!(w, " {}", format_real(*p))?;
            }
            writeln!(w)?;
        }
        for n in &self.nodes {
            writeln!(
                w,
                "node {} {} {} {}",
                n.id,
                trait_field(n.trait_id),
                n.node_type().code(),
                n.neuron_type.code()
            )?;
        }
        for g in &self.genes {
            writeln!(
                w,
                "gene {} {} {} {} {} {} {} {}",
                trait_field(g.link.trait_id),
                g.link.in_node,
                g.link.out_node,
                format_real(g.link.weight),
                g.link.is_recurrent,
                g.innovation_num,
                format_real(g.mutation_num),
                g.is_enabled
            )?;
        }
        writeln!(w, "genomeend {}", self.id)
    }

    /// Read one genome; fails if the trailing id differs from the leading one
    pub fn read<R: BufRead>(reader: R) -> GeneticsResult<Genome> {
        let mut parser = Parser::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if let Some(genome) = parser.line(idx + 1, &line)? {
                return Ok(genome);
            }
        }
        Err(GeneticsError::format(
            parser.line_no,
            "unexpected end of input before genomeend",
        ))
    }

    /// Read one genome and check that it carries `expected_id`
    pub fn read_with_id<R: BufRead>(reader: R, expected_id: usize) -> GeneticsResult<Genome> {
        let genome = Genome::read(reader)?;
        if genome.id != expected_id {
            return Err(GeneticsError::format(
                0,
                format!("genome id {} does not match expected id {}", genome.id, expected_id),
            ));
        }
        Ok(genome)
    }

    /// Write into a string
    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        self.write(&mut buf)
            .expect("writing a genome into a Vec<u8> is infallible");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl FromStr for Genome {
    type Err = GeneticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genome::read(s.as_bytes())
    }
}

#[derive(Default)]
struct Parser {
    line_no: usize,
    genome: Option<Genome>,
}

fn parse_field<T: FromStr>(line: usize, name: &str, token: Option<&str>) -> GeneticsResult<T> {
    let token = token.ok_or_else(|| GeneticsError::format(line, format!("missing {}", name)))?;
    token
        .parse::<T>()
        .map_err(|_| GeneticsError::format(line, format!("invalid {}: {:?}", name, token)))
}

impl Parser {
    fn line(&mut self, line_no: usize, line: &str) -> GeneticsResult<Option<Genome>> {
        self.line_no = line_no;
        let line = line.trim();
        if line.is_empty() || line.starts_with("/*") {
            return Ok(None);
        }

        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();

        if keyword == "genomestart" {
            if self.genome.is_some() {
                return Err(GeneticsError::format(line_no, "nested genomestart"));
            }
            let id = parse_field(line_no, "genome id", tokens.next())?;
            self.genome = Some(Genome::new(id, Vec::new(), Vec::new(), Vec::new()));
            return Ok(None);
        }

        let Some(genome) = self.genome.as_mut() else {
            return Err(GeneticsError::format(
                line_no,
                format!("expected genomestart, found {:?}", keyword),
            ));
        };

        match keyword {
            "trait" => {
                let id = parse_field(line_no, "trait id", tokens.next())?;
                let mut params = [0.0; NUM_TRAIT_PARAMS];
                for (i, p) in params.iter_mut().enumerate() {
                    *p = parse_field(line_no, &format!("trait parameter {}", i), tokens.next())?;
                }
                genome.traits.push(Trait::with_params(id, params));
            }
            "node" => {
                let id = parse_field(line_no, "node id", tokens.next())?;
                let trait_id = Self::trait_ref(line_no, genome, tokens.next())?;
                let node_code: u8 = parse_field(line_no, "node type", tokens.next())?;
                let neuron_code: u8 = parse_field(line_no, "neuron type", tokens.next())?;
                let node_type = NodeType::from_code(node_code).ok_or_else(|| {
                    GeneticsError::format(line_no, format!("unknown node type code {}", node_code))
                })?;
                let neuron_type = NeuronType::from_code(neuron_code).ok_or_else(|| {
                    GeneticsError::format(
                        line_no,
                        format!("unknown neuron type code {}", neuron_code),
                    )
                })?;
                if neuron_type.node_type() != node_type {
                    warn!(
                        target: "neat-genetics",
                        "line {}: node {} declared {:?} but neuron type {} is a {:?}",
                        line_no, id, node_type, neuron_type, neuron_type.node_type()
                    );
                }
                genome
                    .nodes
                    .push(NNode::new(id, neuron_type).with_trait(trait_id));
            }
            "gene" => {
                let trait_id = Self::trait_ref(line_no, genome, tokens.next())?;
                let in_node = parse_field(line_no, "in node id", tokens.next())?;
                let out_node = parse_field(line_no, "out node id", tokens.next())?;
                let weight = parse_field(line_no, "weight", tokens.next())?;
                let recurrent = parse_field(line_no, "recurrent flag", tokens.next())?;
                let innovation = parse_field(line_no, "innovation number", tokens.next())?;
                let mutation = parse_field(line_no, "mutation number", tokens.next())?;
                let enabled = parse_field(line_no, "enabled flag", tokens.next())?;
                for endpoint in [in_node, out_node] {
                    if !genome.has_node(endpoint) {
                        return Err(GeneticsError::format(
                            line_no,
                            format!("gene references unknown node {}", endpoint),
                        ));
                    }
                }
                let mut gene = Gene::new(weight, in_node, out_node, recurrent, innovation, mutation)
                    .with_trait(trait_id);
                gene.is_enabled = enabled;
                genome.genes.push(gene);
            }
            "genomeend" => {
                let id: usize = parse_field(line_no, "genome id", tokens.next())?;
                if id != genome.id {
                    return Err(GeneticsError::format(
                        line_no,
                        format!("genomeend id {} does not match genomestart id {}", id, genome.id),
                    ));
                }
                return Ok(self.genome.take());
            }
            other => {
                return Err(GeneticsError::format(
                    line_no,
                    format!("unknown keyword {:?}", other),
                ))
            }
        }

        if let Some(extra) = tokens.next() {
            return Err(GeneticsError::format(
                line_no,
                format!("unexpected trailing token {:?}", extra),
            ));
        }
        Ok(None)
    }

    fn trait_ref(line_no: usize, genome: &Genome, token: Option<&str>) -> GeneticsResult<Option<TraitId>> {
        let id: TraitId = parse_field(line_no, "trait id", token)?;
        if id == 0 {
            return Ok(None);
        }
        if genome.traits.iter().any(|t| t.id == id) {
            Ok(Some(id))
        } else {
            Err(GeneticsError::format(line_no, format!("unknown trait {}", id)))
        }
    }
}

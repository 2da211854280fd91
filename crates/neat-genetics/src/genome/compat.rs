// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compatibility distance between two genomes

use super::Genome;
use neat_config::CompatibilityConfig;

impl Genome {
    /// Weighted sum of excess genes, disjoint genes and the average
    /// mutation-number difference of matching genes.
    ///
    /// Both gene lists are walked in parallel by innovation number. Genes
    /// left in one list once the other is exhausted count as excess.
    pub fn compatibility(&self, other: &Genome, coeffs: &CompatibilityConfig) -> f64 {
        let (mut i1, mut i2) = (0, 0);
        let (len1, len2) = (self.genes.len(), other.genes.len());

        let mut num_disjoint = 0.0;
        let mut num_excess = 0.0;
        let mut mut_diff_total = 0.0;
        let mut num_matching = 0.0;

        while i1 < len1 || i2 < len2 {
            if i1 >= len1 {
                num_excess += 1.0;
                i2 += 1;
            } else if i2 >= len2 {
                num_excess += 1.0;
                i1 += 1;
            } else {
                let g1 = &self.genes[i1];
                let g2 = &other.genes[i2];
                if g1.innovation_num == g2.innovation_num {
                    num_matching += 1.0;
                    mut_diff_total += (g1.mutation_num - g2.mutation_num).abs();
                    i1 += 1;
                    i2 += 1;
                } else if g1.innovation_num < g2.innovation_num {
                    num_disjoint += 1.0;
                    i1 += 1;
                } else {
                    num_disjoint += 1.0;
                    i2 += 1;
                }
            }
        }

        let avg_mut_diff = if num_matching > 0.0 {
            mut_diff_total / num_matching
        } else {
            0.0
        };

        coeffs.disjoint_coeff * num_disjoint
            + coeffs.excess_coeff * num_excess
            + coeffs.mutdiff_coeff * avg_mut_diff
    }
}

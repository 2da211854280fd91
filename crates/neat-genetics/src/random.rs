// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Random helpers shared by the mutation, crossover and reproduction operators.

Every helper takes the caller's RNG so that a seeded `StdRng` reproduces an
entire run.
*/

use rand::Rng;
use rand_distr::StandardNormal;

/// Returns +1.0 or -1.0 with equal probability
pub fn rand_pos_neg<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

/// Uniform integer in the inclusive range [min, max]
pub fn rand_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Standard normal deviate
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(StandardNormal)
}

/// Index picked with probability proportional to `weights`; `None` when all
/// weights are zero
pub fn single_roulette_throw<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let throw = rng.gen::<f64>() * total;
    let mut accumulated = 0.0;
    for (i, w) in weights.iter().enumerate() {
        accumulated += w;
        if throw < accumulated {
            return Some(i);
        }
    }
    Some(weights.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rand_pos_neg() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let v = rand_pos_neg(&mut rng);
            assert!(v == 1.0 || v == -1.0);
        }
    }

    #[test]
    fn test_rand_int_inclusive() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let v = rand_int(&mut rng, 0, 2);
            assert!((0..=2).contains(&v), "rand_int out of range: {}", v);
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(rand_int(&mut rng, 5, 5), 5);
    }

    #[test]
    fn test_roulette() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(single_roulette_throw(&mut rng, &[0.0, 0.0]), None);
        for _ in 0..50 {
            assert_eq!(single_roulette_throw(&mut rng, &[0.0, 1.0, 0.0]), Some(1));
        }
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Summary statistics over a list of samples. Empty lists yield NaN for
//! everything except [`Floats::sum`].

use serde::{Deserialize, Serialize};
use std::ops::Deref;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Floats(pub Vec<f64>);

impl Floats {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, value: f64) {
        self.0.push(value);
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.0.is_empty() {
            return f64::NAN;
        }
        self.sum() / self.0.len() as f64
    }

    /// Mean and population variance
    pub fn mean_variance(&self) -> (f64, f64) {
        if self.0.is_empty() {
            return (f64::NAN, f64::NAN);
        }
        let mean = self.mean();
        let variance =
            self.0.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / self.0.len() as f64;
        (mean, variance)
    }

    pub fn variance(&self) -> f64 {
        self.mean_variance().1
    }

    pub fn median(&self) -> f64 {
        if self.0.is_empty() {
            return f64::NAN;
        }
        let mut sorted = self.0.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    pub fn max(&self) -> f64 {
        self.0.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
    }

    pub fn min(&self) -> f64 {
        self.0.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
    }
}

impl Deref for Floats {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for Floats {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl FromIterator<f64> for Floats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let values = Floats::from(vec![4.0, 1.0, 3.0, 2.0]);
        assert_eq!(values.sum(), 10.0);
        assert_eq!(values.mean(), 2.5);
        assert_eq!(values.median(), 2.5);
        assert_eq!(values.max(), 4.0);
        assert_eq!(values.min(), 1.0);
        let (mean, variance) = values.mean_variance();
        assert_eq!(mean, 2.5);
        assert!((variance - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_odd_median() {
        let values: Floats = [5.0, 1.0, 3.0].into_iter().collect();
        assert_eq!(values.median(), 3.0);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_empty() {
        let values = Floats::new();
        assert_eq!(values.sum(), 0.0);
        assert!(values.mean().is_nan());
        assert!(values.median().is_nan());
        assert!(values.max().is_nan());
        assert!(values.variance().is_nan());
    }
}

//! Summary statistics: incremental moments of a `f64`
//! sample and the mode of a discrete sample.
use serde_derive::Serialize;
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Stores the statistics collected from a `f64` random
/// variable. Accumulation of the statistic is done by
/// add-assigning (using `+=`) one of the following.
///
/// - a `f64` value.  Adds a new sample
/// - another `PixelStats` value.  Accumulates the statistic from the other into `self`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PixelStats {
    max: f64,
    min: f64,
    sum: f64,
    sum_2: f64,
    count: usize,
}

impl Default for PixelStats {
    fn default() -> Self {
        use std::f64::*;
        PixelStats {
            max: NEG_INFINITY,
            min: INFINITY,
            sum: 0.,
            sum_2: 0.,
            count: 0,
        }
    }
}

impl AddAssign<f64> for PixelStats {
    fn add_assign(&mut self, other: f64) {
        self.max = self.max.max(other);
        self.min = self.min.min(other);
        self.sum += other;
        self.sum_2 += other * other;
        self.count += 1;
    }
}
impl AddAssign<&PixelStats> for PixelStats {
    fn add_assign(&mut self, other: &PixelStats) {
        self.max = self.max.max(other.max);
        self.min = self.min.min(other.min);
        self.sum += other.sum;
        self.sum_2 += other.sum_2;
        self.count += other.count;
    }
}

impl PixelStats {
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Population variance.
    #[inline]
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.sum_2 / self.count as f64 - mean * mean).max(0.)
    }

    #[inline]
    pub fn std_deviation(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Most frequent value of `values` with its number of
/// occurrences. Ties go to the smallest value. `None` for
/// an empty input.
pub fn mode<I: IntoIterator<Item = i64>>(values: I) -> Option<(i64, usize)> {
    let mut counts = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0usize) += 1;
    }
    // Ascending iteration; strict `>` keeps the first.
    let mut best: Option<(i64, usize)> = None;
    for (v, c) in counts {
        match best {
            Some((_, bc)) if bc >= c => {}
            _ => best = Some((v, c)),
        }
    }
    best
}

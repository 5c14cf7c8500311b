//! Fixed-width histograms of elevation differences.

use serde_derive::Serialize;

/// Configuration to generate histogram, constructed from
/// min, max and step-size.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct HistogramConfig {
    min: f64,
    max: f64,
    step: f64,
    len: usize,
}

impl HistogramConfig {
    pub fn from_min_max_step(min: f64, max: f64, step: f64) -> Self {
        assert!(min <= max, "min must be smaller than max");
        assert!(step > 0., "step must be positive");
        // Absorb representation error, eg. 20 / 0.1
        let len = ((max - min) / step - 1e-9).ceil().max(1.) as usize;
        HistogramConfig {
            min,
            max,
            step,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Centre of a bin.
    #[inline]
    pub fn center(&self, bin: usize) -> f64 {
        self.min + (bin as f64 + 0.5) * self.step
    }

    #[inline]
    pub fn bin_for(&self, val: f64) -> HistBin {
        use HistBin::*;
        if val >= self.max {
            Max
        } else if val < self.min {
            Min
        } else {
            let bin = ((val - self.min) / self.step).floor() as usize;
            if bin >= self.len {
                Max
            } else {
                Bin(bin)
            }
        }
    }
}

/// Represent the location of a value with respect to a
/// histogram configuration.
pub enum HistBin {
    Min,
    Max,
    Bin(usize),
}

/// A histogram that can be built by accumulating individual
/// values, or other histograms.
#[derive(Clone, Serialize)]
pub struct Histogram<'a> {
    cfg: &'a HistogramConfig,
    hist: Vec<usize>,
    min: usize,
    max: usize,
    count: usize,
}

impl<'a> Histogram<'a> {
    pub fn new(cfg: &'a HistogramConfig) -> Self {
        Histogram {
            cfg,
            hist: vec![0; cfg.len()],
            min: 0,
            max: 0,
            count: 0,
        }
    }

    /// Number of values below the first bin.
    pub fn below(&self) -> usize {
        self.min
    }

    /// Number of values at or above the end of the last bin.
    pub fn above(&self) -> usize {
        self.max
    }

    /// Number of values accumulated, including those out of
    /// range.
    pub fn count(&self) -> usize {
        self.count
    }

    /// All bins sharing the maximum count, in ascending
    /// order, with that count. Empty if no value fell
    /// inside the range.
    pub fn modes(&self) -> (Vec<usize>, usize) {
        let top = self.hist.iter().copied().max().unwrap_or(0);
        if top == 0 {
            return (vec![], 0);
        }
        let bins = self
            .hist
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == top)
            .map(|(i, _)| i)
            .collect();
        (bins, top)
    }
}

use std::ops::AddAssign;
impl<'a, 'b> AddAssign<Histogram<'b>> for Histogram<'a> {
    fn add_assign(&mut self, other: Histogram<'b>) {
        assert!(
            self.cfg == other.cfg,
            "adding histogram with a different config"
        );
        for (a, b) in self.hist.iter_mut().zip(other.hist.iter()) {
            *a += *b;
        }
        self.min += other.min;
        self.max += other.max;
        self.count += other.count;
    }
}
impl<'a> AddAssign<f64> for Histogram<'a> {
    fn add_assign(&mut self, other: f64) {
        use HistBin::*;
        match self.cfg.bin_for(other) {
            Min => {
                self.min += 1;
            }
            Max => {
                self.max += 1;
            }
            Bin(bin) => {
                self.hist[bin] += 1;
            }
        }
        self.count += 1;
    }
}

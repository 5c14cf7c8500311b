//! Mutual information of paired samples, estimated from a
//! Gaussian-smoothed joint histogram.
//!
//! The score ranks shift candidates of a single patch. It
//! depends on the bin count and smoothing, so values are
//! not comparable across patches or configurations.

use ndarray::{Array1, Array2, Axis};

use crate::config::MiConfig;

/// Mutual information between paired samples `a` and `b`.
///
/// The samples must be non-empty, of equal length, and hold
/// only positions valid in both inputs.
pub fn mutual_information(a: &[f64], b: &[f64], cfg: &MiConfig) -> f64 {
    debug_assert!(!a.is_empty(), "empty sample");
    debug_assert_eq!(a.len(), b.len(), "samples must be paired");

    let mut joint = joint_histogram(a, b, cfg.bins);
    if cfg.sigma > 0. {
        joint = gaussian_smooth(&joint, cfg.sigma);
    }

    joint.mapv_inplace(|v| v + f64::EPSILON);
    let total = joint.sum();
    joint.mapv_inplace(|v| v / total);

    let marginal_a = joint.sum_axis(Axis(1));
    let marginal_b = joint.sum_axis(Axis(0));

    let h_joint: f64 = joint.iter().map(|&p| p * p.ln()).sum();
    let h_a = neg_entropy(&marginal_a);
    let h_b = neg_entropy(&marginal_b);

    if cfg.normalized {
        (h_a + h_b) / h_joint - 1.
    } else {
        h_joint - h_a - h_b
    }
}

/// `Σ p ln p`, ie. the negated entropy.
fn neg_entropy(p: &Array1<f64>) -> f64 {
    p.iter().map(|&p| p * p.ln()).sum()
}

/// Range of a sample, widened when it is a single value.
fn value_range(v: &[f64]) -> (f64, f64) {
    let (lo, hi) = v
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

#[inline]
fn bin_index(v: f64, lo: f64, hi: f64, bins: usize) -> usize {
    let idx = ((v - lo) / (hi - lo) * bins as f64).floor();
    if idx <= 0. {
        0
    } else {
        (idx as usize).min(bins - 1)
    }
}

/// Counts of `(a, b)` pairs over `bins x bins` equal bins
/// spanning each sample's range. Rows index `a`.
pub fn joint_histogram(a: &[f64], b: &[f64], bins: usize) -> Array2<f64> {
    let mut hist = Array2::zeros((bins, bins));
    if a.is_empty() {
        return hist;
    }
    let (lo_a, hi_a) = value_range(a);
    let (lo_b, hi_b) = value_range(b);
    for (&x, &y) in a.iter().zip(b) {
        let i = bin_index(x, lo_a, hi_a, bins);
        let j = bin_index(y, lo_b, hi_b, bins);
        hist[(i, j)] += 1.;
    }
    hist
}

/// Normalised Gaussian kernel truncated at `4σ`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4. * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= total);
    kernel
}

/// Separable Gaussian filter, treating samples outside the
/// array as zero.
pub fn gaussian_smooth(input: &Array2<f64>, sigma: f64) -> Array2<f64> {
    let kernel = gaussian_kernel(sigma);
    let rows = convolve_axis(input, &kernel, Axis(0));
    convolve_axis(&rows, &kernel, Axis(1))
}

fn convolve_axis(input: &Array2<f64>, kernel: &[f64], axis: Axis) -> Array2<f64> {
    let radius = (kernel.len() / 2) as isize;
    let mut out = Array2::zeros(input.dim());
    for (src, mut dst) in input
        .lanes(axis)
        .into_iter()
        .zip(out.lanes_mut(axis).into_iter())
    {
        let n = src.len() as isize;
        for i in 0..n {
            let mut acc = 0.;
            for (k, w) in kernel.iter().enumerate() {
                let j = i + k as isize - radius;
                if j >= 0 && j < n {
                    acc += w * src[j as usize];
                }
            }
            dst[i as usize] = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn sample(seed: u64, n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(0.0..30.0)).collect()
    }

    #[test]
    fn kernel_matches_truncation() {
        let k = gaussian_kernel(1.);
        assert_eq!(k.len(), 9);
        assert_relative_eq!(k.iter().sum::<f64>(), 1., epsilon = 1e-12);
        assert!(k[4] > k[3] && k[3] == k[5]);
    }

    #[test]
    fn smoothing_leaks_at_borders() {
        let mut hist = Array2::zeros((5, 5));
        hist[(0, 0)] = 1.;
        let smooth = gaussian_smooth(&hist, 1.);
        assert!(smooth.sum() < 1.);
        assert!(smooth[(0, 0)] > smooth[(1, 1)]);
        assert_relative_eq!(smooth[(0, 1)], smooth[(1, 0)], epsilon = 1e-15);
    }

    #[test]
    fn histogram_places_extremes() {
        let hist = joint_histogram(&[0., 1., 2.], &[5., 5., 5.], 4);
        assert_eq!(hist.sum(), 3.);
        assert_eq!(hist[(0, 2)], 1.);
        assert_eq!(hist[(2, 2)], 1.);
        assert_eq!(hist[(3, 2)], 1.);
    }

    #[test]
    fn symmetric() {
        let a = sample(1, 400);
        let b = sample(2, 400);
        for normalized in &[false, true] {
            let cfg = MiConfig {
                normalized: *normalized,
                ..Default::default()
            };
            assert_relative_eq!(
                mutual_information(&a, &b, &cfg),
                mutual_information(&b, &a, &cfg),
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn non_negative_and_maximal_on_identity() {
        let cfg = MiConfig::default();
        let a = sample(3, 400);
        let self_mi = mutual_information(&a, &a, &cfg);
        for seed in 4..10 {
            let b = sample(seed, 400);
            let mi = mutual_information(&a, &b, &cfg);
            assert!(mi >= -1e-12, "negative MI {}", mi);
            assert!(mi < self_mi, "{} >= {}", mi, self_mi);
        }
        // Scaling keeps every sample in its bin.
        let scaled: Vec<f64> = a.iter().map(|v| 2. * v).collect();
        assert_relative_eq!(mutual_information(&a, &scaled, &cfg), self_mi, max_relative = 1e-10);
    }

    #[test]
    fn normalized_of_identity_is_positive() {
        let cfg = MiConfig {
            normalized: true,
            ..Default::default()
        };
        let a = sample(11, 200);
        let b = sample(12, 200);
        assert!(mutual_information(&a, &a, &cfg) > mutual_information(&a, &b, &cfg));
    }
}

//! Estimate the vertical offset between two rasters from
//! the distribution of their elevation differences.

use anyhow::Context;
use serde_derive::Serialize;

use crate::config::{Config, VerticalConfig};
use crate::error::{CoregError, CoregWarning};
use crate::histogram::{Histogram, HistogramConfig};
use crate::horizontal::resolution_check;
use crate::overlap::{locate, Buffer};
use crate::raster::{is_valid, Raster};
use crate::stats::PixelStats;
use crate::Result;

/// Result of [`estimate_vertical`].
#[derive(Debug, Clone, Serialize)]
pub struct VerticalEstimate {
    /// Centres of every bin at the maximum count, in
    /// ascending order. More than one means the mode is
    /// ambiguous.
    pub centers: Vec<f64>,
    /// Samples in each modal bin.
    pub count: usize,
    /// Valid differences, including those outside the
    /// searched span.
    pub samples: usize,
    /// Statistics of the valid differences.
    pub stats: PixelStats,
    pub warnings: Vec<CoregWarning>,
}

impl VerticalEstimate {
    /// The shift, if the mode is unique.
    pub fn value(&self) -> Option<f64> {
        match self.centers.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.centers.len() > 1
    }
}

/// Estimate the offset `reference - sensed` over the valid
/// overlap of the two rasters.
pub fn estimate_vertical(
    reference: &Raster,
    sensed: &Raster,
    cfg: &Config,
) -> Result<VerticalEstimate> {
    cfg.vertical.validate()?;
    let mut warnings = resolution_check(reference, sensed);

    let overlap = locate(reference, sensed, Buffer::Pixels(cfg.vertical.buffer), cfg.nodata)
        .context("locating overlap for vertical estimate")?;

    let valid = |v: f64| is_valid(v, Some(cfg.nodata));
    let diffs: Vec<f64> = overlap
        .reference
        .iter()
        .zip(overlap.sensed.iter())
        .filter(|&(&r, &s)| valid(r) && valid(s))
        .map(|(&r, &s)| r - s)
        .collect();
    if diffs.is_empty() {
        return Err(CoregError::NoValidData {
            raster: "difference",
            window: overlap.reference_crop,
        }
        .into());
    }
    log::debug!("{} jointly valid differences", diffs.len());

    let mut est = estimate_from_differences(&diffs, &cfg.vertical)?;
    warnings.append(&mut est.warnings);
    est.warnings = warnings;
    Ok(est)
}

/// Differences accumulated per partial histogram.
const CHUNK: usize = 1 << 14;

type Partial<'a> = (Histogram<'a>, PixelStats);

fn add<'a>((mut hist, mut stats): Partial<'a>, &d: &f64) -> Partial<'a> {
    hist += d;
    stats += d;
    (hist, stats)
}

fn merge<'a>((mut hist, mut stats): Partial<'a>, (h, s): Partial<'a>) -> Partial<'a> {
    hist += h;
    stats += &s;
    (hist, stats)
}

/// Mode of a sample of elevation differences, binned over
/// `[-half_width, half_width)`.
pub fn estimate_from_differences(
    diffs: &[f64],
    cfg: &VerticalConfig,
) -> Result<VerticalEstimate> {
    let hist_cfg = HistogramConfig::from_min_max_step(-cfg.half_width, cfg.half_width, cfg.bin_width);
    let init = || (Histogram::new(&hist_cfg), PixelStats::default());

    #[cfg(feature = "use-rayon")]
    let (hist, stats) = {
        use rayon::prelude::*;
        diffs
            .par_chunks(CHUNK)
            .map(|chunk| chunk.iter().fold(init(), add))
            .reduce(init, merge)
    };
    #[cfg(not(feature = "use-rayon"))]
    let (hist, stats) = diffs
        .chunks(CHUNK)
        .map(|chunk| chunk.iter().fold(init(), add))
        .fold(init(), merge);

    if hist.count() == 0 {
        return Err(CoregError::NoValidData {
            raster: "difference",
            window: Default::default(),
        }
        .into());
    }

    let (bins, count) = hist.modes();
    if bins.is_empty() {
        return Err(CoregError::OutOfSearchRange {
            min: hist_cfg.min(),
            max: hist_cfg.max(),
            samples: hist.count(),
            below: hist.below(),
            above: hist.above(),
        }
        .into());
    }

    let centers: Vec<f64> = bins.iter().map(|&b| hist_cfg.center(b)).collect();
    let mut warnings = vec![];
    if centers.len() > 1 {
        let warning = CoregWarning::AmbiguousMode {
            centers: centers.clone(),
            count,
        };
        warning.log();
        warnings.push(warning);
    } else {
        log::info!(
            "vertical shift {:.3} from {} of {} differences (mean {:.3}, std {:.3})",
            centers[0],
            count,
            hist.count(),
            stats.mean(),
            stats.std_deviation()
        );
    }

    Ok(VerticalEstimate {
        centers,
        count,
        samples: hist.count(),
        stats,
        warnings,
    })
}

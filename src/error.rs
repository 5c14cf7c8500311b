//! Failure and warning kinds of a registration attempt.
//!
//! Fatal conditions are [`CoregError`] values carried
//! inside the crate-wide [`anyhow::Error`]; inspect them
//! with `err.downcast_ref::<CoregError>()`. Recoverable
//! conditions are [`CoregWarning`] values returned along
//! with an estimate.

use geo::Rect;
use serde_derive::Serialize;
use thiserror::Error;

use crate::geometry::PixelRect;

/// Errors that end a registration attempt.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoregError {
    #[error("rasters do not overlap: reference bounds {reference:?}, sensed bounds {sensed:?}")]
    NoOverlap {
        reference: Rect<f64>,
        sensed: Rect<f64>,
    },

    #[error("no valid data in the overlap of the {raster} raster (window {window:?})")]
    NoValidData {
        raster: &'static str,
        window: PixelRect,
    },

    #[error("buffer of {buffer} px leaves nothing of the {span} px valid overlap along {axis}")]
    BufferTooLarge {
        axis: &'static str,
        buffer: usize,
        span: usize,
    },

    #[error("no patch produced an unambiguous shift ({attempted} attempted, {dropped} dropped)")]
    InsufficientEvidence { attempted: usize, dropped: usize },

    #[error("vertical shift requires a single band raster (found {0} bands)")]
    UnsupportedBandCount(usize),

    #[error(
        "none of the {samples} valid differences lie in [{min}, {max}) \
         ({below} below, {above} above)"
    )]
    OutOfSearchRange {
        min: f64,
        max: f64,
        samples: usize,
        below: usize,
        above: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Recoverable conditions met while estimating a shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoregWarning {
    /// A patch had more than one shift candidate at the
    /// maximum score. The patch is dropped.
    AmbiguousOptimum {
        x: usize,
        y: usize,
        mi: f64,
        candidates: Vec<(i64, i64)>,
    },

    /// No shift candidate of a patch had enough jointly
    /// valid pixels to be scored. The patch is dropped.
    NoEvidence { x: usize, y: usize },

    /// The vertical difference histogram has more than one
    /// bin at the maximum count.
    AmbiguousMode { centers: Vec<f64>, count: usize },

    /// The two rasters do not share the same pixel size.
    ResolutionMismatch {
        reference: (f64, f64),
        sensed: (f64, f64),
    },
}

impl CoregWarning {
    /// Log the warning through the `log` facade.
    pub fn log(&self) {
        use CoregWarning::*;
        match self {
            AmbiguousOptimum { x, y, candidates, .. } => log::warn!(
                "patch @ ({}, {}): {} shifts share the maximum score; dropping",
                x,
                y,
                candidates.len()
            ),
            NoEvidence { x, y } => {
                log::warn!("patch @ ({}, {}): no shift could be scored; dropping", x, y)
            }
            AmbiguousMode { centers, count } => log::warn!(
                "vertical histogram has {} modes with {} samples each: {:?}",
                centers.len(),
                count,
                centers
            ),
            ResolutionMismatch { reference, sensed } => log::warn!(
                "pixel sizes differ: reference {:?}, sensed {:?}",
                reference,
                sensed
            ),
        }
    }
}

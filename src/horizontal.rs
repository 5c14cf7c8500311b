//! Estimate the horizontal shift between two rasters.
//!
//! # Search
//!
//! The valid overlap (see [`locate`]) of the two rasters is
//! partitioned into a grid of cells. Each cell holds a few
//! square patches at random positions. For every patch,
//! each candidate shift `(dx, dy)` is scored by the mutual
//! information between the reference patch and the sensed
//! patch displaced by the shift, over pixels valid in both.
//! The best candidate of each patch goes into a look-up
//! table (LUT); patches whose maximum is shared by several
//! candidates are dropped.
//!
//! # Consensus
//!
//! The estimate is the mode of `dx` and, independently, of
//! `dy` over the LUT. It is reported in pixels and in
//! ground units (using the signed pixel size, so a row
//! shift on a north-up raster has the opposite sign in
//! ground units).
//!
//! # Reproducibility
//!
//! Each cell seeds its own generator from the run seed and
//! its address, so results do not depend on the order in
//! which cells are processed. With the `use-rayon` feature,
//! cells are processed in parallel.

use anyhow::Context;
use ndarray::{s, Array2, ArrayView2};
use serde_derive::Serialize;

use crate::config::{Config, MiConfig};
use crate::error::{CoregError, CoregWarning};
use crate::mi::mutual_information;
use crate::overlap::{locate, Buffer};
use crate::raster::{is_valid, Raster};
use crate::Result;

mod grid;
mod lut;

pub use grid::*;
pub use lut::*;

/// MI scores of every shift candidate of one patch, rows
/// following `ys` and columns following `xs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftSurface {
    pub x: usize,
    pub y: usize,
    pub xs: Vec<i64>,
    pub ys: Vec<i64>,
    pub scores: Vec<Vec<f64>>,
}

/// Result of [`estimate_horizontal`].
#[derive(Debug, Clone, Serialize)]
pub struct HorizontalEstimate {
    /// Shift in ground units, to be subtracted from the
    /// sensed raster's origin.
    pub shift: (f64, f64),
    pub consensus: Consensus,
    pub lut: Vec<LutEntry>,
    pub warnings: Vec<CoregWarning>,
    /// Number of grid cells `(cols, rows)`.
    pub grid: (usize, usize),
    /// Size of the searched crop, in pixels and ground units.
    pub crop_pixels: (usize, usize),
    pub crop_ground: (f64, f64),
    /// Scores of the patch with the highest MI.
    pub best_surface: Option<ShiftSurface>,
}

impl HorizontalEstimate {
    /// Pixel shift `(dx, dy)`.
    pub fn pixels(&self) -> (i64, i64) {
        (self.consensus.dx, self.consensus.dy)
    }
}

/// Progress notification: the number of usable cells once
/// the grid is laid out, then one per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Planned(usize),
    Searched,
    Skipped,
}

/// Outcome of the search of one patch.
#[derive(Debug, Clone)]
pub enum PatchOutcome {
    Found {
        entry: LutEntry,
        scores: Array2<f64>,
    },
    Dropped(CoregWarning),
}

/// Estimate the shift that aligns `sensed` to `reference`.
pub fn estimate_horizontal(
    reference: &Raster,
    sensed: &Raster,
    cfg: &Config,
) -> Result<HorizontalEstimate> {
    estimate_horizontal_with(reference, sensed, cfg, &|_| {})
}

/// Like [`estimate_horizontal`], calling `progress` as each
/// grid cell completes.
pub fn estimate_horizontal_with<F>(
    reference: &Raster,
    sensed: &Raster,
    cfg: &Config,
    progress: &F,
) -> Result<HorizontalEstimate>
where
    F: Fn(CellStatus) + Sync,
{
    let hcfg = &cfg.horizontal;
    hcfg.validate()?;
    let mut warnings = resolution_check(reference, sensed);

    let overlap = locate(reference, sensed, Buffer::Ground(hcfg.buffer), cfg.nodata)
        .context("locating overlap for horizontal search")?;

    let (pw, ph) = reference.pixel_size();
    let crop_pixels = overlap.size();
    let crop_ground = (
        crop_pixels.0 as f64 * pw.abs(),
        crop_pixels.1 as f64 * ph.abs(),
    );
    log::info!(
        "searching crop of {}x{} px ({:.2} x {:.2})",
        crop_pixels.0,
        crop_pixels.1,
        crop_ground.0,
        crop_ground.1
    );

    let candidates = ShiftCandidates::new(hcfg, (pw, ph));
    let half = (hcfg.patch_size / pw.abs() / 2.).round() as usize;
    if half == 0 {
        return Err(CoregError::InvalidConfig(format!(
            "patch size {} is under two pixels of {}",
            hcfg.patch_size,
            pw.abs()
        ))
        .into());
    }
    let cell_px = (hcfg.grid_size / pw.abs()).round().max(1.) as usize;

    let grid = Grid::new(crop_pixels, cell_px, &candidates);
    let cells = grid.cells();
    log::info!(
        "grid of {:?} cells ({} usable), {} shift candidates",
        grid.shape(),
        cells.len(),
        candidates.len()
    );
    progress(CellStatus::Planned(cells.len()));

    let search = PatchSearch {
        reference: overlap.reference.view(),
        sensed: overlap.sensed.view(),
        nodata: cfg.nodata,
        half,
        candidates: &candidates,
        mi: &hcfg.mi,
    };

    let search_cell = |cell: &Cell| -> Vec<PatchOutcome> {
        match patch_centres(cell, hcfg.seed, half, hcfg.patches_per_cell) {
            Some(centres) => {
                let out = centres
                    .into_iter()
                    .map(|(x, y)| search.evaluate(x, y))
                    .collect();
                progress(CellStatus::Searched);
                out
            }
            None => {
                log::debug!(
                    "cell ({}, {}) of {:?} too small for {} patches",
                    cell.col,
                    cell.row,
                    cell.rect,
                    hcfg.patches_per_cell
                );
                progress(CellStatus::Skipped);
                vec![]
            }
        }
    };

    #[cfg(feature = "use-rayon")]
    let outcomes: Vec<Vec<PatchOutcome>> = {
        use rayon::prelude::*;
        cells.par_iter().map(search_cell).collect()
    };
    #[cfg(not(feature = "use-rayon"))]
    let outcomes: Vec<Vec<PatchOutcome>> = cells.iter().map(search_cell).collect();

    let mut lut = vec![];
    let mut best: Option<(LutEntry, Array2<f64>)> = None;
    let mut attempted = 0;
    for outcome in outcomes.into_iter().flatten() {
        attempted += 1;
        match outcome {
            PatchOutcome::Found { entry, scores } => {
                lut.push(entry);
                if best.as_ref().map_or(true, |(b, _)| entry.mi > b.mi) {
                    best = Some((entry, scores));
                }
            }
            PatchOutcome::Dropped(warning) => {
                warning.log();
                warnings.push(warning);
            }
        }
    }

    let consensus = consensus(&lut).ok_or(CoregError::InsufficientEvidence {
        attempted,
        dropped: attempted - lut.len(),
    })?;
    let shift = (consensus.dx as f64 * pw, consensus.dy as f64 * ph);
    log::info!(
        "estimated shift ({:.2}, {:.2}) with support ({}, {}) of {}",
        shift.0,
        shift.1,
        consensus.support_x,
        consensus.support_y,
        consensus.entries
    );

    let best_surface = best.map(|(entry, scores)| ShiftSurface {
        x: entry.x,
        y: entry.y,
        xs: candidates.xs.clone(),
        ys: candidates.ys.clone(),
        scores: scores.outer_iter().map(|row| row.to_vec()).collect(),
    });

    Ok(HorizontalEstimate {
        shift,
        consensus,
        lut,
        warnings,
        grid: grid.shape(),
        crop_pixels,
        crop_ground,
        best_surface,
    })
}

/// Warn when the two rasters do not share a pixel size.
pub(crate) fn resolution_check(reference: &Raster, sensed: &Raster) -> Vec<CoregWarning> {
    let (r, s) = (reference.pixel_size(), sensed.pixel_size());
    if r == s {
        return vec![];
    }
    let warning = CoregWarning::ResolutionMismatch {
        reference: r,
        sensed: s,
    };
    warning.log();
    vec![warning]
}

/// Exhaustive shift search over aligned crops.
struct PatchSearch<'a> {
    reference: ArrayView2<'a, f64>,
    sensed: ArrayView2<'a, f64>,
    nodata: f64,
    half: usize,
    candidates: &'a ShiftCandidates,
    mi: &'a MiConfig,
}

impl<'a> PatchSearch<'a> {
    /// Score every candidate for the patch centred at
    /// `(x, y)` and pick the unique best.
    fn evaluate(&self, x: usize, y: usize) -> PatchOutcome {
        let scores = self.scores(x, y);

        let top = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if top == f64::NEG_INFINITY {
            return PatchOutcome::Dropped(CoregWarning::NoEvidence { x, y });
        }

        let best: Vec<(i64, i64)> = scores
            .indexed_iter()
            .filter(|(_, &v)| v == top)
            .map(|((iy, ix), _)| (self.candidates.xs[ix], self.candidates.ys[iy]))
            .collect();

        if best.len() > 1 {
            return PatchOutcome::Dropped(CoregWarning::AmbiguousOptimum {
                x,
                y,
                mi: top,
                candidates: best,
            });
        }

        let (dx, dy) = best[0];
        log::debug!("patch @ ({}, {}): shift ({}, {}) mi {:.4}", x, y, dx, dy, top);
        PatchOutcome::Found {
            entry: LutEntry {
                x,
                y,
                dx,
                dy,
                mi: top,
            },
            scores,
        }
    }

    fn scores(&self, x: usize, y: usize) -> Array2<f64> {
        let side = 2 * self.half;
        let (x0, y0) = (x - self.half, y - self.half);
        let patch = self.reference.slice(s![y0..y0 + side, x0..x0 + side]);

        let ys = &self.candidates.ys;
        let xs = &self.candidates.xs;
        let mut scores = Array2::from_elem((ys.len(), xs.len()), f64::NEG_INFINITY);

        let (rows, cols) = self.sensed.dim();
        let mut a = Vec::with_capacity(side * side);
        let mut b = Vec::with_capacity(side * side);
        for (iy, &dy) in ys.iter().enumerate() {
            for (ix, &dx) in xs.iter().enumerate() {
                let sy = y0 as i64 + dy;
                let sx = x0 as i64 + dx;
                if sy < 0 || sx < 0 || sy as usize + side > rows || sx as usize + side > cols {
                    continue;
                }
                let (sx, sy) = (sx as usize, sy as usize);
                let moved = self.sensed.slice(s![sy..sy + side, sx..sx + side]);

                a.clear();
                b.clear();
                for (&r, &m) in patch.iter().zip(moved.iter()) {
                    if is_valid(r, Some(self.nodata)) && is_valid(m, Some(self.nodata)) {
                        a.push(r);
                        b.push(m);
                    }
                }
                if a.len() >= 2 {
                    scores[(iy, ix)] = mutual_information(&a, &b, self.mi);
                }
            }
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShiftRange;
    use crate::geometry::GeoTransform;

    const NODATA: f64 = -9999.;
    const NORTH_UP: GeoTransform = [300_000., 1., 0., 5_000_100., 0., -1.];

    /// Deterministic rough surface, defined for any
    /// pixel address.
    fn texture(col: i64, row: i64) -> f64 {
        let mut z = (col as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (row as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        z = (z ^ (z >> 29)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z ^= z >> 32;
        (z % 3000) as f64 / 100.
    }

    /// Raster whose pixel `(r, c)` shows the texture at
    /// `(c - dx, r - dy)`.
    fn shifted_raster(size: usize, dx: i64, dy: i64) -> Raster {
        let data = Array2::from_shape_fn((size, size), |(r, c)| {
            texture(c as i64 - dx, r as i64 - dy)
        });
        Raster::new(data, NORTH_UP, Some(NODATA))
    }

    fn test_config() -> Config {
        let mut cfg = Config::default();
        cfg.horizontal = crate::config::HorizontalConfig {
            grid_size: 40.,
            patch_size: 20.,
            patches_per_cell: 1,
            shift_x: ShiftRange::new(0., 3.),
            shift_y: ShiftRange::new(0., 3.),
            buffer: 2.,
            seed: 42,
            mi: MiConfig {
                bins: 64,
                ..Default::default()
            },
        };
        cfg
    }

    #[test]
    fn identical_rasters_have_no_shift() -> Result<()> {
        let r = shifted_raster(120, 0, 0);
        let est = estimate_horizontal(&r, &r, &test_config())?;

        assert_eq!(est.pixels(), (0, 0));
        assert_eq!(est.shift, (0., 0.));
        assert_eq!(est.grid, (3, 3));
        assert_eq!(est.crop_pixels, (116, 116));
        assert!(est.lut.iter().all(|e| (e.dx, e.dy) == (0, 0)));
        assert_eq!(est.consensus.support_x, est.lut.len());
        Ok(())
    }

    #[test]
    fn recovers_known_translation() -> Result<()> {
        let reference = shifted_raster(120, 0, 0);
        let sensed = shifted_raster(120, 2, -1);
        let est = estimate_horizontal(&reference, &sensed, &test_config())?;

        assert_eq!(est.pixels(), (2, -1));
        // Rows run south; a one row shift north is +1 in y.
        assert_eq!(est.shift, (2., 1.));

        let surface = est.best_surface.expect("no surface");
        assert_eq!(surface.scores.len(), 7);
        assert_eq!(surface.scores[0].len(), 7);
        Ok(())
    }

    #[test]
    fn any_seed_finds_the_shift() -> Result<()> {
        let reference = shifted_raster(100, 0, 0);
        let sensed = shifted_raster(100, -2, 3);
        let mut cfg = test_config();
        cfg.horizontal.patches_per_cell = 2;
        for seed in &[0, 1, 977] {
            cfg.horizontal.seed = *seed;
            let est = estimate_horizontal(&reference, &sensed, &cfg)?;
            assert_eq!(est.pixels(), (-2, 3));
        }
        Ok(())
    }

    #[test]
    fn reruns_are_reproducible() -> Result<()> {
        let reference = shifted_raster(100, 0, 0);
        let sensed = shifted_raster(100, 1, 1);
        let cfg = test_config();
        let a = estimate_horizontal(&reference, &sensed, &cfg)?;
        let b = estimate_horizontal(&reference, &sensed, &cfg)?;
        assert_eq!(a.lut, b.lut);
        Ok(())
    }

    #[test]
    fn flat_rasters_give_no_evidence() {
        let flat = Raster::new(Array2::from_elem((100, 100), 3.), NORTH_UP, Some(NODATA));
        let err = estimate_horizontal(&flat, &flat, &test_config()).unwrap_err();
        match err.downcast_ref::<CoregError>() {
            Some(CoregError::InsufficientEvidence { attempted, dropped }) => {
                assert!(*attempted > 0);
                assert_eq!(attempted, dropped);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn small_overlap_gives_no_evidence() {
        let r = shifted_raster(30, 0, 0);
        let mut cfg = test_config();
        cfg.horizontal.patch_size = 16.;
        let err = estimate_horizontal(&r, &r, &cfg).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CoregError>(),
            Some(&CoregError::InsufficientEvidence {
                attempted: 0,
                dropped: 0
            })
        );
    }

    #[test]
    fn oversized_grid_and_patch_do_not_overflow() -> Result<()> {
        let r = shifted_raster(120, 0, 0);
        let mut cfg = test_config();
        cfg.horizontal.grid_size = 1e30;
        let est = estimate_horizontal(&r, &r, &cfg)?;
        assert_eq!(est.grid, (2, 2));
        assert_eq!(est.pixels(), (0, 0));

        cfg.horizontal.patch_size = 1e30;
        let err = estimate_horizontal(&r, &r, &cfg).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CoregError>(),
            Some(&CoregError::InsufficientEvidence {
                attempted: 0,
                dropped: 0
            })
        );
        Ok(())
    }

    #[test]
    fn nodata_patches_are_dropped() {
        let reference = shifted_raster(60, 0, 0);
        let mut sensed = shifted_raster(60, 0, 0);
        // Valid columns only on the edges, outside the crop.
        sensed.bands[0]
            .data
            .indexed_iter_mut()
            .filter(|((_, c), _)| c % 59 != 0)
            .for_each(|(_, v)| *v = NODATA);

        let err = estimate_horizontal(&reference, &sensed, &test_config()).unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<CoregError>(),
                Some(CoregError::InsufficientEvidence { .. })
            ),
            "{:#}",
            err
        );
    }

    #[test]
    fn flat_cells_are_dropped_as_ambiguous() -> Result<()> {
        let mut reference = shifted_raster(120, 0, 0);
        let mut sensed = shifted_raster(120, 2, -1);
        // The first column of cells sees a flat surface in both
        // rasters; every candidate scores the same there.
        reference.bands[0].data.slice_mut(s![.., ..45]).fill(3.);
        sensed.bands[0].data.slice_mut(s![.., ..47]).fill(3.);

        let est = estimate_horizontal(&reference, &sensed, &test_config())?;
        assert_eq!(est.pixels(), (2, -1));
        assert_eq!(est.lut.len(), 6);
        assert!(est.lut.iter().all(|e| e.x >= 39));

        let ambiguous: Vec<_> = est
            .warnings
            .iter()
            .filter_map(|w| match w {
                CoregWarning::AmbiguousOptimum { x, candidates, .. } => Some((*x, candidates.len())),
                _ => None,
            })
            .collect();
        assert_eq!(ambiguous.len(), 3);
        assert!(ambiguous.iter().all(|&(x, n)| x < 39 && n == 49));
        Ok(())
    }

    #[test]
    fn masked_cells_are_dropped_without_evidence() -> Result<()> {
        let reference = shifted_raster(120, 0, 0);
        let mut sensed = shifted_raster(120, 2, -1);
        // No candidate of the middle row of cells reaches a
        // valid sensed pixel.
        sensed.bands[0].data.slice_mut(s![36..83, ..]).fill(NODATA);

        let est = estimate_horizontal(&reference, &sensed, &test_config())?;
        assert_eq!(est.pixels(), (2, -1));
        assert_eq!(est.lut.len(), 6);

        let no_evidence: Vec<_> = est
            .warnings
            .iter()
            .filter_map(|w| match w {
                CoregWarning::NoEvidence { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(no_evidence.len(), 3);
        assert!(no_evidence.iter().all(|&y| (39..77).contains(&y)));
        Ok(())
    }

    #[test]
    fn mismatched_resolution_is_reported() -> Result<()> {
        let reference = shifted_raster(120, 0, 0);
        let mut sensed = shifted_raster(120, 0, 0);
        sensed.transform[1] = 1.0000001;
        let est = estimate_horizontal(&reference, &sensed, &test_config())?;
        assert!(matches!(
            est.warnings[0],
            CoregWarning::ResolutionMismatch { .. }
        ));
        Ok(())
    }

    #[test]
    fn progress_sees_every_cell() -> Result<()> {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let r = shifted_raster(120, 0, 0);
        let planned = AtomicUsize::new(0);
        let seen = AtomicUsize::new(0);
        let est = estimate_horizontal_with(&r, &r, &test_config(), &|status| match status {
            CellStatus::Planned(n) => {
                planned.store(n, Ordering::Relaxed);
            }
            _ => {
                seen.fetch_add(1, Ordering::Relaxed);
            }
        })?;
        assert_eq!(planned.load(Ordering::Relaxed), est.grid.0 * est.grid.1);
        assert_eq!(seen.load(Ordering::Relaxed), est.grid.0 * est.grid.1);
        Ok(())
    }
}

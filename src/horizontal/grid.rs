//! Shift candidates, grid partition and patch placement.

use rand::{rngs::StdRng, seq::index, SeedableRng};

use crate::config::HorizontalConfig;
use crate::geometry::PixelRect;

/// Discrete pixel shifts searched for every patch.
/// `xs` ascends; `ys` descends, as world `y` decreases
/// with the row index.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftCandidates {
    pub xs: Vec<i64>,
    pub ys: Vec<i64>,
}

impl ShiftCandidates {
    /// Convert the ground-unit search ranges of `cfg` to
    /// pixels using the signed pixel size.
    pub fn new(cfg: &HorizontalConfig, pixel_size: (f64, f64)) -> Self {
        let (pw, ph) = pixel_size;
        let init_x = (cfg.shift_x.initial / pw).round() as i64;
        let range_x = (cfg.shift_x.half_width / pw).round().abs() as i64;
        let init_y = (cfg.shift_y.initial / ph).round() as i64;
        let range_y = (cfg.shift_y.half_width / ph).round().abs() as i64;

        ShiftCandidates {
            xs: (init_x - range_x..=init_x + range_x).collect(),
            ys: (init_y - range_y..=init_y + range_y).rev().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extreme shifts `(min, max)` along x.
    pub fn x_extent(&self) -> (i64, i64) {
        extent(&self.xs)
    }

    /// Extreme shifts `(min, max)` along y.
    pub fn y_extent(&self) -> (i64, i64) {
        extent(&self.ys)
    }
}

fn extent(v: &[i64]) -> (i64, i64) {
    let min = v.iter().copied().min().unwrap_or(0);
    let max = v.iter().copied().max().unwrap_or(0);
    (min, max)
}

/// Cell boundaries along one axis of length `dim`.
///
/// The axis is split into `max(ceil(dim / cell), 2)` even
/// cells. Boundaries are then clamped to `[-min_shift, dim
/// - max_shift]` so that any cell read at any shift stays
/// inside the axis. Cells may end up empty.
pub fn cell_boundaries(dim: usize, cell: usize, shifts: (i64, i64)) -> Vec<usize> {
    let cell = cell.max(1);
    let count = (dim / cell + (dim % cell != 0) as usize).max(2);

    let lo = (-shifts.0).max(0) as usize;
    let hi = dim.saturating_sub(shifts.1.max(0) as usize);

    (0..=count)
        .map(|k| {
            let b = (k as f64 * dim as f64 / count as f64).round() as usize;
            b.max(lo).min(hi)
        })
        .collect()
}

/// A cell of the grid, addressed by its column and row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub col: usize,
    pub row: usize,
    pub rect: PixelRect,
}

/// Partition of a crop into cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub xs: Vec<usize>,
    pub ys: Vec<usize>,
}

impl Grid {
    /// Grid over a crop of `dims = (cols, rows)` with cells
    /// of `cell` pixels.
    pub fn new(dims: (usize, usize), cell: usize, shifts: &ShiftCandidates) -> Self {
        Grid {
            xs: cell_boundaries(dims.0, cell, shifts.x_extent()),
            ys: cell_boundaries(dims.1, cell, shifts.y_extent()),
        }
    }

    /// Number of cells `(cols, rows)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.xs.len() - 1, self.ys.len() - 1)
    }

    /// Non-empty cells, column-major as the patches are
    /// reported.
    pub fn cells(&self) -> Vec<Cell> {
        let (cols, rows) = self.shape();
        let mut cells = Vec::with_capacity(cols * rows);
        for col in 0..cols {
            for row in 0..rows {
                let (x1, x2) = (self.xs[col], self.xs[col + 1]);
                let (y1, y2) = (self.ys[row], self.ys[row + 1]);
                if x2 > x1 && y2 > y1 {
                    cells.push(Cell {
                        col,
                        row,
                        rect: PixelRect::new(x1, y1, x2, y2),
                    });
                }
            }
        }
        cells
    }
}

/// Seed of a cell's generator, mixed from the run seed and
/// the cell address (splitmix64 finaliser).
pub fn cell_seed(run: u64, col: usize, row: usize) -> u64 {
    let mut z = run
        ^ (col as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (row as u64).wrapping_add(1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Draw `count` patch centres inside `cell`, in crop
/// coordinates, at least `half` pixels from every edge so
/// that a `2 * half` patch fits. Centres have pairwise
/// distinct columns and distinct rows. `None` if the cell is
/// too small to hold them.
pub fn patch_centres(
    cell: &Cell,
    run_seed: u64,
    half: usize,
    count: usize,
) -> Option<Vec<(usize, usize)>> {
    let span = |len: usize| (len + 1).checked_sub(half.saturating_mul(2)).filter(|&n| n >= count);
    let nx = span(cell.rect.width())?;
    let ny = span(cell.rect.height())?;

    let mut rng = StdRng::seed_from_u64(cell_seed(run_seed, cell.col, cell.row));
    let xs = index::sample(&mut rng, nx, count);
    let ys = index::sample(&mut rng, ny, count);

    Some(
        xs.into_iter()
            .zip(ys.into_iter())
            .map(|(x, y)| (cell.rect.x1 + half + x, cell.rect.y1 + half + y))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShiftRange;

    fn candidates(initial: (f64, f64), half: f64, res: f64) -> ShiftCandidates {
        let cfg = HorizontalConfig {
            shift_x: ShiftRange::new(initial.0, half),
            shift_y: ShiftRange::new(initial.1, half),
            ..Default::default()
        };
        ShiftCandidates::new(&cfg, (res, -res))
    }

    #[test]
    fn candidates_in_pixels() {
        let c = candidates((0., 0.), 1., 0.5);
        assert_eq!(c.xs, vec![-2, -1, 0, 1, 2]);
        assert_eq!(c.ys, vec![2, 1, 0, -1, -2]);
        assert_eq!(c.len(), 25);

        // Initial offsets follow the axis sign.
        let c = candidates((2., 1.), 1., 1.);
        assert_eq!(c.xs, vec![1, 2, 3]);
        assert_eq!(c.ys, vec![0, -1, -2]);
        assert_eq!(c.x_extent(), (1, 3));
        assert_eq!(c.y_extent(), (-2, 0));
    }

    #[test]
    fn boundaries_respect_shifts() {
        assert_eq!(cell_boundaries(100, 40, (0, 0)), vec![0, 33, 67, 100]);
        assert_eq!(cell_boundaries(100, 40, (-5, 3)), vec![5, 33, 67, 97]);
        // Small axes still get two cells.
        assert_eq!(cell_boundaries(30, 200, (0, 0)), vec![0, 15, 30]);
        // Shifts larger than a cell empty it.
        assert_eq!(cell_boundaries(30, 200, (-20, 0)), vec![20, 20, 30]);
        assert_eq!(cell_boundaries(100, usize::MAX, (0, 0)), vec![0, 50, 100]);
    }

    #[test]
    fn grid_skips_empty_cells() {
        let shifts = ShiftCandidates {
            xs: vec![-20, 0],
            ys: vec![0],
        };
        let grid = Grid::new((30, 30), 200, &shifts);
        assert_eq!(grid.shape(), (2, 2));
        let cells = grid.cells();
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.col == 1));
    }

    #[test]
    fn centres_fit_in_cell() {
        let cell = Cell {
            col: 1,
            row: 2,
            rect: PixelRect::new(10, 40, 40, 62),
        };
        let centres = patch_centres(&cell, 7, 5, 4).unwrap();
        assert_eq!(centres.len(), 4);
        for &(x, y) in &centres {
            assert!(x >= 15 && x + 5 <= 40, "x = {}", x);
            assert!(y >= 45 && y + 5 <= 62, "y = {}", y);
        }
        let mut xs: Vec<_> = centres.iter().map(|c| c.0).collect();
        xs.sort();
        xs.dedup();
        assert_eq!(xs.len(), 4);

        // Same cell and seed, same draw.
        assert_eq!(patch_centres(&cell, 7, 5, 4), Some(centres));
    }

    #[test]
    fn small_cells_are_skipped() {
        let cell = Cell {
            col: 0,
            row: 0,
            rect: PixelRect::new(0, 0, 9, 30),
        };
        assert_eq!(patch_centres(&cell, 0, 5, 1), None);
        assert!(patch_centres(&cell, 0, 4, 1).is_some());
        assert_eq!(patch_centres(&cell, 0, 4, 3), None);
        assert_eq!(patch_centres(&cell, 0, usize::MAX, 1), None);
    }

    #[test]
    fn cell_seeds_differ() {
        let seeds = [
            cell_seed(0, 0, 0),
            cell_seed(0, 0, 1),
            cell_seed(0, 1, 0),
            cell_seed(1, 0, 0),
        ];
        for i in 0..seeds.len() {
            for j in i + 1..seeds.len() {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }
}

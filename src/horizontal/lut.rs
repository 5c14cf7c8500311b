//! Per-patch results and their consensus.

use serde_derive::Serialize;

use crate::stats::mode;

/// Best shift of one patch. `(x, y)` is the patch centre
/// in crop pixels; `(dx, dy)` in pixels, `dy` along rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LutEntry {
    pub x: usize,
    pub y: usize,
    pub dx: i64,
    pub dy: i64,
    pub mi: f64,
}

/// Mode of each shift component over a LUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Consensus {
    pub dx: i64,
    pub dy: i64,
    /// Number of entries agreeing with `dx` and `dy`.
    pub support_x: usize,
    pub support_y: usize,
    pub entries: usize,
}

/// Consensus of the LUT, `None` if it is empty. Each
/// component is voted independently; ties go to the
/// smallest shift.
pub fn consensus(lut: &[LutEntry]) -> Option<Consensus> {
    let (dx, support_x) = mode(lut.iter().map(|e| e.dx))?;
    let (dy, support_y) = mode(lut.iter().map(|e| e.dy))?;
    Some(Consensus {
        dx,
        dy,
        support_x,
        support_y,
        entries: lut.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lut(shifts: &[(i64, i64)]) -> Vec<LutEntry> {
        shifts
            .iter()
            .enumerate()
            .map(|(i, &(dx, dy))| LutEntry {
                x: i,
                y: i,
                dx,
                dy,
                mi: 1.,
            })
            .collect()
    }

    #[test]
    fn votes_each_axis() {
        let c = consensus(&lut(&[(2, 0), (2, 1), (2, 1), (3, -4), (-1, 0)])).unwrap();
        assert_eq!((c.dx, c.support_x), (2, 3));
        assert_eq!((c.dy, c.support_y), (0, 2));
        assert_eq!(c.entries, 5);
    }

    #[test]
    fn empty_lut_has_no_consensus() {
        assert_eq!(consensus(&[]), None);
    }
}

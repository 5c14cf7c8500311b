//! Apply recovered shifts to a raster.

use crate::error::CoregError;
use crate::raster::{is_valid, Raster};
use crate::Result;

/// Translate the raster by `(shift_x, shift_y)` ground units.
/// The origin is moved by `-shift`; pixel data, every band
/// and its nodata are copied through.
pub fn apply_horizontal(raster: &Raster, shift_x: f64, shift_y: f64) -> Raster {
    let mut out = raster.clone();
    out.transform[0] -= shift_x;
    out.transform[3] -= shift_y;
    out
}

/// Subtract `shift` from every valid sample of a single band
/// raster. Nodata and NaN samples are left as they are.
pub fn apply_vertical(raster: &Raster, shift: f64) -> Result<Raster> {
    if raster.band_count() != 1 {
        return Err(CoregError::UnsupportedBandCount(raster.band_count()).into());
    }
    let mut out = raster.clone();
    let band = &mut out.bands[0];
    let no_data = band.no_data;
    band.data.mapv_inplace(|v| {
        if is_valid(v, no_data) {
            v - shift
        } else {
            v
        }
    });
    Ok(out)
}

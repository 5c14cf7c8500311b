//! Locate the shared valid extent of two rasters.
//!
//! The two rasters may have different transforms. The
//! common world extent is mapped into each raster's pixels
//! independently; within those windows, the bounding boxes
//! of valid samples are intersected and shrunk by a buffer.
//! The resulting crops have identical dimensions, and pixel
//! `(i, j)` of both crops cover (approximately) the same
//! ground location.

use geo::Rect;
use ndarray::{s, Array2, ArrayView2};

use crate::error::CoregError;
use crate::geometry::{BoundsExt, PixelRect};
use crate::raster::{is_valid, Raster};
use crate::Result;

/// Margin removed from each side of the valid overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Buffer {
    /// Ground units, converted with the reference raster's
    /// pixel width.
    Ground(f64),
    Pixels(usize),
}

impl Buffer {
    fn pixels(&self, reference: &Raster) -> usize {
        match *self {
            Buffer::Ground(dist) => {
                let px = (dist / reference.pixel_size().0.abs()).round();
                if px > 0. {
                    px as usize
                } else {
                    0
                }
            }
            Buffer::Pixels(px) => px,
        }
    }
}

/// Aligned crops of the valid overlap.
#[derive(Debug, Clone)]
pub struct Overlap {
    /// Common world extent of the two rasters.
    pub bounds: Rect<f64>,
    /// Window of each raster covering `bounds`.
    pub reference_window: PixelRect,
    pub sensed_window: PixelRect,
    /// Crop of each raster, in that raster's pixels.
    pub reference_crop: PixelRect,
    pub sensed_crop: PixelRect,
    pub reference: Array2<f64>,
    pub sensed: Array2<f64>,
}

impl Overlap {
    /// Crop dimensions as `(cols, rows)`.
    pub fn size(&self) -> (usize, usize) {
        let (rows, cols) = self.reference.dim();
        (cols, rows)
    }
}

/// Locate the valid overlap of `reference` and `sensed`.
/// Samples equal to `nodata` (or NaN) are invalid.
pub fn locate(reference: &Raster, sensed: &Raster, buffer: Buffer, nodata: f64) -> Result<Overlap> {
    let ref_bounds = reference.bounds();
    let sen_bounds = sensed.bounds();

    let no_overlap = || CoregError::NoOverlap {
        reference: ref_bounds,
        sensed: sen_bounds,
    };

    let bounds = ref_bounds.intersection(&sen_bounds).ok_or_else(no_overlap)?;

    let reference_window = bounds.window_in(&reference.transform, reference.size())?;
    let sensed_window = bounds.window_in(&sensed.transform, sensed.size())?;
    if reference_window.is_empty() || sensed_window.is_empty() {
        return Err(no_overlap().into());
    }
    log::debug!(
        "overlap windows: reference {:?}, sensed {:?}",
        reference_window,
        sensed_window
    );

    let ref_view = reference.window(&reference_window);
    let sen_view = sensed.window(&sensed_window);

    let ref_valid = valid_bounds(&ref_view, nodata).ok_or(CoregError::NoValidData {
        raster: "reference",
        window: reference_window,
    })?;
    let sen_valid = valid_bounds(&sen_view, nodata).ok_or(CoregError::NoValidData {
        raster: "sensed",
        window: sensed_window,
    })?;

    let joint = intersect_valid(&ref_valid, &sen_valid).ok_or(CoregError::NoValidData {
        raster: "joint",
        window: reference_window,
    })?;
    // Windows of the two rasters may differ in size after
    // clamping; the joint extent lies inside both.
    let crop = shrink(&joint, buffer.pixels(reference))?;

    let slice = |view: &ArrayView2<f64>| {
        view.slice(s![crop.y1..crop.y2, crop.x1..crop.x2])
            .to_owned()
    };

    Ok(Overlap {
        bounds,
        reference_window,
        sensed_window,
        reference_crop: crop.offset_by(&reference_window),
        sensed_crop: crop.offset_by(&sensed_window),
        reference: slice(&ref_view),
        sensed: slice(&sen_view),
    })
}

/// Smallest rectangle holding every valid sample of `data`.
pub fn valid_bounds(data: &ArrayView2<f64>, nodata: f64) -> Option<PixelRect> {
    let mut found: Option<PixelRect> = None;
    for ((i, j), &val) in data.indexed_iter() {
        if !is_valid(val, Some(nodata)) {
            continue;
        }
        found = Some(match found {
            None => PixelRect::new(j, i, j + 1, i + 1),
            Some(r) => PixelRect::new(r.x1.min(j), r.y1.min(i), r.x2.max(j + 1), r.y2.max(i + 1)),
        });
    }
    found
}

fn intersect_valid(a: &PixelRect, b: &PixelRect) -> Option<PixelRect> {
    let x1 = a.x1.max(b.x1);
    let x2 = a.x2.min(b.x2);
    let y1 = a.y1.max(b.y1);
    let y2 = a.y2.min(b.y2);
    if x2 <= x1 || y2 <= y1 {
        None
    } else {
        Some(PixelRect::new(x1, y1, x2, y2))
    }
}

fn shrink(rect: &PixelRect, buffer: usize) -> Result<PixelRect> {
    if buffer >= (rect.width() + 1) / 2 {
        return Err(CoregError::BufferTooLarge {
            axis: "x",
            buffer,
            span: rect.width(),
        }
        .into());
    }
    if buffer >= (rect.height() + 1) / 2 {
        return Err(CoregError::BufferTooLarge {
            axis: "y",
            buffer,
            span: rect.height(),
        }
        .into());
    }
    Ok(PixelRect::new(
        rect.x1 + buffer,
        rect.y1 + buffer,
        rect.x2 - buffer,
        rect.y2 - buffer,
    ))
}

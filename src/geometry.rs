//! Georeferencing arithmetic: affine transforms, world
//! bounds and pixel windows.
//!
//! Transforms use the GDAL layout `[origin_x, pixel_width,
//! skew_x, origin_y, skew_y, pixel_height]`, mapping pixel
//! `(col, row)` to world `(origin_x + col * pixel_width,
//! origin_y + row * pixel_height)` when the skews are zero.

use anyhow::anyhow;
use geo::{coord, Rect};
use nalgebra::{Matrix3, Point2};
use serde_derive::{Deserialize, Serialize};

use crate::Result;

/// GDAL ordered affine transform.
pub type GeoTransform = [f64; 6];

/// Homogeneous 2D transform from pixel to world coordinates.
pub type PixelTransform = Matrix3<f64>;

/// Raster dimensions as `(cols, rows)`.
pub type RasterDims = (usize, usize);

pub fn transform_from_gdal(t: &GeoTransform) -> PixelTransform {
    Matrix3::new(t[1], t[2], t[0], t[4], t[5], t[3], 0., 0., 1.)
}

pub fn transform_to_gdal(t: &PixelTransform) -> GeoTransform {
    [
        t[(0, 2)],
        t[(0, 0)],
        t[(0, 1)],
        t[(1, 2)],
        t[(1, 0)],
        t[(1, 1)],
    ]
}

/// Signed pixel size `(pixel_width, pixel_height)`.
#[inline]
pub fn pixel_size(t: &GeoTransform) -> (f64, f64) {
    (t[1], t[5])
}

/// World coordinates of the pixel corner `(col, row)`.
pub fn pixel_to_world(t: &GeoTransform, col: f64, row: f64) -> (f64, f64) {
    let pt = transform_from_gdal(t).transform_point(&Point2::new(col, row));
    (pt.x, pt.y)
}

/// Fractional pixel coordinates `(col, row)` of a world
/// location.
pub fn world_to_pixel(t: &GeoTransform, x: f64, y: f64) -> Result<(f64, f64)> {
    let inv = transform_from_gdal(t)
        .try_inverse()
        .ok_or_else(|| anyhow!("couldn't invert geo transform {:?}", t))?;
    let pt = inv.transform_point(&Point2::new(x, y));
    Ok((pt.x, pt.y))
}

/// World bounding box covered by a raster of the given
/// dimensions.
pub fn world_bounds(t: &GeoTransform, dim: RasterDims) -> Rect<f64> {
    let (x0, y0) = pixel_to_world(t, 0., 0.);
    let (x1, y1) = pixel_to_world(t, dim.0 as f64, dim.1 as f64);
    Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
}

/// A half-open rectangle `[x1, x2) x [y1, y2)` of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl PixelRect {
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        debug_assert!(x2 >= x1 && y2 >= y1, "inverted pixel rect");
        PixelRect { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Translate `self` by the origin of `outer`.
    pub fn offset_by(&self, outer: &PixelRect) -> PixelRect {
        PixelRect::new(
            self.x1 + outer.x1,
            self.y1 + outer.y1,
            self.x2 + outer.x1,
            self.y2 + outer.y1,
        )
    }
}

/// Extensions on world bounding boxes.
pub trait BoundsExt: Sized {
    /// The common extent of two boxes, or `None` if they
    /// only touch or are disjoint on either axis.
    fn intersection(&self, other: &Self) -> Option<Self>;

    /// Pixel window of a raster covering these bounds.
    /// Corners are rounded to the nearest pixel and
    /// clamped to the raster, so the window may be empty.
    fn window_in(&self, t: &GeoTransform, dim: RasterDims) -> Result<PixelRect>;
}

impl BoundsExt for Rect<f64> {
    fn intersection(&self, other: &Self) -> Option<Self> {
        let min_x = self.min().x.max(other.min().x);
        let max_x = self.max().x.min(other.max().x);
        let min_y = self.min().y.max(other.min().y);
        let max_y = self.max().y.min(other.max().y);

        if max_x <= min_x || max_y <= min_y {
            return None;
        }
        Some(Rect::new(
            coord! { x: min_x, y: min_y },
            coord! { x: max_x, y: max_y },
        ))
    }

    fn window_in(&self, t: &GeoTransform, dim: RasterDims) -> Result<PixelRect> {
        let (c0, r0) = world_to_pixel(t, self.min().x, self.max().y)?;
        let (c1, r1) = world_to_pixel(t, self.max().x, self.min().y)?;

        let clamp = |v: f64, hi: usize| -> usize {
            let v = v.round();
            if v <= 0. {
                0
            } else {
                (v as usize).min(hi)
            }
        };

        let (x1, x2) = (clamp(c0.min(c1), dim.0), clamp(c0.max(c1), dim.0));
        let (y1, y2) = (clamp(r0.min(r1), dim.1), clamp(r0.max(r1), dim.1));
        Ok(PixelRect::new(x1, y1, x2, y2))
    }
}

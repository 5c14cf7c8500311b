//! In-memory georeferenced raster.

use ndarray::{s, Array2, ArrayView2};

use crate::geometry::{pixel_size, world_bounds, GeoTransform, PixelRect, RasterDims};
use geo::Rect;

/// One band of samples, indexed `(row, col)`, with its
/// nodata sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub data: Array2<f64>,
    pub no_data: Option<f64>,
}

impl Band {
    pub fn new(data: Array2<f64>, no_data: Option<f64>) -> Self {
        Band { data, no_data }
    }

    /// Whether `val` is a measurement, ie. neither the
    /// band's sentinel nor NaN.
    #[inline]
    pub fn is_valid(&self, val: f64) -> bool {
        is_valid(val, self.no_data)
    }
}

#[inline]
pub(crate) fn is_valid(val: f64, no_data: Option<f64>) -> bool {
    !val.is_nan() && Some(val) != no_data
}

/// A georeferenced raster of one or more bands of equal
/// size. Treated as immutable by the registration pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub bands: Vec<Band>,
    pub transform: GeoTransform,
    pub projection: String,
}

impl Raster {
    /// Single band raster with no projection.
    pub fn new(data: Array2<f64>, transform: GeoTransform, no_data: Option<f64>) -> Self {
        Raster {
            bands: vec![Band::new(data, no_data)],
            transform,
            projection: String::new(),
        }
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    /// Dimensions as `(cols, rows)`.
    pub fn size(&self) -> RasterDims {
        let (rows, cols) = self.bands.first().map(|b| b.data.dim()).unwrap_or((0, 0));
        (cols, rows)
    }

    #[inline]
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// First band; the registration stages only read this.
    pub fn band(&self) -> &Band {
        &self.bands[0]
    }

    #[inline]
    pub fn pixel_size(&self) -> (f64, f64) {
        pixel_size(&self.transform)
    }

    pub fn bounds(&self) -> Rect<f64> {
        world_bounds(&self.transform, self.size())
    }

    /// View of the first band inside `win`.
    pub fn window(&self, win: &PixelRect) -> ArrayView2<'_, f64> {
        self.band().data.slice(s![win.y1..win.y2, win.x1..win.x2])
    }
}

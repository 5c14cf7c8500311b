//! Co-registration of adjacent elevation rasters.
//!
//! Canopy-height and terrain models rasterized from separate
//! point-cloud acquisitions carry small horizontal and
//! vertical misalignments. This crate recovers them:
//!
//! - [`overlap`] locates the shared, valid extent of two
//! rasters.
//!
//! - [`horizontal`] searches integer pixel shifts on
//! randomly placed patches, scoring each with [`mi`], and
//! takes the consensus over all patches.
//!
//! - [`vertical`] takes the mode of the elevation difference
//! over the overlap.
//!
//! - [`apply`] produces the shifted rasters.
//!
//! Raster I/O through GDAL is available with the `gdal`
//! feature. Grid cells are processed in parallel with the
//! `use-rayon` feature.

pub mod apply;
pub mod config;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod horizontal;
pub mod mi;
pub mod overlap;
pub mod raster;
pub mod stats;
pub mod vertical;

#[cfg(feature = "gdal")]
pub mod reader;

pub mod prelude;

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

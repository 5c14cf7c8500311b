//! Read and write [`Raster`]s through GDAL.

use std::path::Path;

use anyhow::{format_err, Context};
use gdal::{
    raster::{Buffer, GdalType, RasterBand},
    Dataset, DriverManager,
};
use ndarray::Array2;

use crate::geometry::RasterDims;
use crate::raster::{Band, Raster};
use crate::Result;

/// Window offset `(col, row)` as GDAL takes it.
pub type RasterOffset = (isize, isize);

/// Abstracts reading windows of a band.
pub trait WindowReader {
    /// Emulate [`RasterBand::read_into_slice`].
    fn read_into_slice<T>(&self, out: &mut [T], off: RasterOffset, size: RasterDims) -> Result<()>
    where
        T: GdalType + Copy;

    /// Helper to read into an ndarray indexed `(row, col)`.
    fn read_as_array<T>(&self, off: RasterOffset, size: RasterDims) -> Result<Array2<T>>
    where
        T: GdalType + Copy + Default,
    {
        let mut buf = vec![T::default(); size.0 * size.1];
        self.read_into_slice(&mut buf[..], off, size)?;
        Ok(Array2::from_shape_vec((size.1, size.0), buf)?)
    }
}

impl<'a> WindowReader for RasterBand<'a> {
    fn read_into_slice<T>(&self, out: &mut [T], off: RasterOffset, size: RasterDims) -> Result<()>
    where
        T: GdalType + Copy,
    {
        Ok(self
            .read_into_slice(off, size, size, out, None)
            .with_context(|| {
                format_err!(
                    "reading window @ ({},{}) of dimension ({}x{})",
                    off.0,
                    off.1,
                    size.0,
                    size.1
                )
            })?)
    }
}

/// Read every band of the dataset at `path` as `f64`.
pub fn read_raster(path: &Path) -> Result<Raster> {
    let ds = Dataset::open(path).with_context(|| format!("reading dataset {}", path.display()))?;
    let transform = ds
        .geo_transform()
        .with_context(|| format!("{} has no geotransform", path.display()))?;
    let size = ds.raster_size();

    let bands = (1..=ds.raster_count())
        .map(|i| {
            let band = ds.rasterband(i)?;
            Ok(Band::new(band.read_as_array::<f64>((0, 0), size)?, band.no_data_value()))
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("reading bands of {}", path.display()))?;
    log::debug!(
        "read {} ({}x{}, {} bands)",
        path.display(),
        size.0,
        size.1,
        bands.len()
    );

    Ok(Raster {
        bands,
        transform,
        projection: ds.projection(),
    })
}

/// Write `raster` to `path` as `f64` bands with the GDAL
/// `driver`, keeping its transform, projection and the
/// nodata of every band.
pub fn write_raster(raster: &Raster, path: &Path, driver: &str) -> Result<()> {
    let (width, height) = raster.size();
    let mut ds = DriverManager::get_driver_by_name(driver)?
        .create_with_band_type::<f64, _>(
            path,
            width as isize,
            height as isize,
            raster.band_count() as isize,
        )
        .with_context(|| format!("creating dataset {}", path.display()))?;
    ds.set_geo_transform(&raster.transform)?;
    ds.set_projection(&raster.projection)?;

    for (i, band) in raster.bands.iter().enumerate() {
        let mut out = ds.rasterband(i as isize + 1)?;
        out.set_no_data_value(band.no_data)?;
        let data = Buffer::new((width, height), band.data.iter().copied().collect());
        out.write((0, 0), (width, height), &data)
            .with_context(|| format!("writing band {} of {}", i + 1, path.display()))?;
    }
    Ok(())
}

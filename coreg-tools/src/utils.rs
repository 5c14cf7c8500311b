//! Utilities to read inputs and write rasters and reports.

use anyhow::Context;
use chm_coreg::prelude::*;
use clap::{value_t, ArgMatches};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DEFAULT_DRIVER: &str = "GTiff";

pub struct OutputArgs {
    pub path: PathBuf,
    pub driver: String,
}

impl OutputArgs {
    /// From `--output` and `--driver`, if an output was
    /// requested.
    pub fn from_matches(matches: &ArgMatches) -> Option<Self> {
        let path = value_t!(matches, "output", PathBuf).ok()?;
        let driver =
            value_t!(matches, "driver", String).unwrap_or_else(|_| String::from(DEFAULT_DRIVER));
        Some(OutputArgs { path, driver })
    }

    pub fn write(&self, raster: &Raster) -> Result<()> {
        write_raster(raster, &self.path, &self.driver)?;
        log::info!("wrote {}", self.path.display());
        Ok(())
    }
}

pub fn read_input(path: &Path) -> Result<Raster> {
    read_raster(path).with_context(|| format!("reading raster {}", path.display()))
}

/// Parameters from `--config`, or the defaults.
pub fn read_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening config {}", path.display()))?;
            serde_json::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Config::default(),
    };
    Ok(cfg)
}

pub fn write_json<T: Serialize>(path: &Path, json: &T) -> Result<()> {
    let file = File::create(path)?;
    let buf = std::io::BufWriter::with_capacity(0x100000, file);
    Ok(serde_json::to_writer_pretty(buf, json)?)
}

pub fn print_json<T: Serialize>(json: &T) -> Result<()> {
    let writer = std::io::BufWriter::new(std::io::stdout());
    serde_json::to_writer_pretty(writer, json)?;
    println!();
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::Array2;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use tempdir::TempDir;

    const WIDTH: usize = 16;
    const HEIGHT: usize = 32;
    const NODATA: f64 = -9999.;

    #[test]
    fn write_read_raster() -> Result<()> {
        let tmp_dir = TempDir::new("coreg_test")?;
        let path = tmp_dir.path().join("foo.tif");

        let mut rng = StdRng::seed_from_u64(5);
        let mut data = Array2::from_shape_fn((HEIGHT, WIDTH), |_| rng.gen_range(0.0..40.0));
        data[(3, 4)] = NODATA;
        let raster = Raster::new(data, [1000., 0.5, 0., 2000., 0., -0.5], Some(NODATA));

        let output = OutputArgs {
            path: path.clone(),
            driver: DEFAULT_DRIVER.into(),
        };
        output.write(&apply_horizontal(&raster, 1.5, -2.))?;

        let back = read_input(&path)?;
        assert_eq!(back.size(), (WIDTH, HEIGHT));
        assert_eq!(back.band_count(), 1);
        assert_eq!(back.transform, [998.5, 0.5, 0., 2002., 0., -0.5]);
        assert_eq!(back.band().no_data, Some(NODATA));
        assert_eq!(back.band().data, raster.band().data);
        Ok(())
    }

    #[test]
    fn config_from_file() -> Result<()> {
        let tmp_dir = TempDir::new("coreg_test")?;
        let path = tmp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"horizontal": {"seed": 9}}"#)?;

        let cfg = read_config(Some(&path))?;
        assert_eq!(cfg.horizontal.seed, 9);
        assert_eq!(cfg.vertical, Config::default().vertical);
        assert_eq!(read_config(None)?, Config::default());
        Ok(())
    }
}

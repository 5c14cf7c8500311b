//! Parameters of a registration run.
//!
//! A [`Config`] is threaded through every stage; nothing is
//! read from process-wide state, so independent runs may
//! proceed concurrently with different parameters. Ground
//! distances are in the units of the raster's transform.

use serde_derive::{Deserialize, Serialize};

use crate::error::CoregError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sentinel marking missing samples in both inputs.
    pub nodata: f64,
    pub horizontal: HorizontalConfig,
    pub vertical: VerticalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            nodata: -9999.,
            horizontal: Default::default(),
            vertical: Default::default(),
        }
    }
}

/// Search window along one axis: `initial ± half_width`,
/// in ground units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftRange {
    pub initial: f64,
    pub half_width: f64,
}

impl ShiftRange {
    pub fn new(initial: f64, half_width: f64) -> Self {
        ShiftRange {
            initial,
            half_width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizontalConfig {
    /// Side of a grid cell (ground units).
    pub grid_size: f64,
    /// Side of a patch (ground units).
    pub patch_size: f64,
    pub patches_per_cell: usize,
    pub shift_x: ShiftRange,
    pub shift_y: ShiftRange,
    /// Margin dropped from each side of the valid overlap
    /// (ground units).
    pub buffer: f64,
    /// Run-level seed; each grid cell derives its own
    /// generator from it.
    pub seed: u64,
    pub mi: MiConfig,
}

impl Default for HorizontalConfig {
    fn default() -> Self {
        HorizontalConfig {
            grid_size: 200.,
            patch_size: 10.,
            patches_per_cell: 1,
            shift_x: ShiftRange::new(0., 10.),
            shift_y: ShiftRange::new(0., 10.),
            buffer: 20.,
            seed: 0,
            mi: Default::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalConfig {
    /// Margin dropped from each side of the valid overlap
    /// (pixels).
    pub buffer: usize,
    /// Differences are binned over `[-half_width, half_width)`.
    pub half_width: f64,
    pub bin_width: f64,
}

impl Default for VerticalConfig {
    fn default() -> Self {
        VerticalConfig {
            buffer: 100,
            half_width: 10.,
            bin_width: 0.1,
        }
    }
}

/// Joint histogram parameters of the mutual information
/// score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiConfig {
    pub bins: usize,
    /// Gaussian smoothing of the joint histogram; `0`
    /// disables it.
    pub sigma: f64,
    pub normalized: bool,
}

impl Default for MiConfig {
    fn default() -> Self {
        MiConfig {
            bins: 256,
            sigma: 1.,
            normalized: false,
        }
    }
}

macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            return Err(CoregError::InvalidConfig(format!($($arg)+)).into());
        }
    };
}

impl Config {
    /// Reject parameters that cannot describe a search.
    pub fn validate(&self) -> Result<()> {
        self.horizontal.validate()?;
        self.vertical.validate()
    }
}

impl HorizontalConfig {
    pub fn validate(&self) -> Result<()> {
        let h = self;
        ensure_config!(h.grid_size > 0., "grid size must be positive ({})", h.grid_size);
        ensure_config!(h.patch_size > 0., "patch size must be positive ({})", h.patch_size);
        ensure_config!(h.patches_per_cell > 0, "need at least one patch per cell");
        ensure_config!(
            h.shift_x.half_width >= 0. && h.shift_y.half_width >= 0.,
            "search half-widths must not be negative"
        );
        ensure_config!(h.buffer >= 0., "buffer must not be negative ({})", h.buffer);
        ensure_config!(h.mi.bins > 0, "histogram needs at least one bin");
        ensure_config!(h.mi.sigma >= 0., "sigma must not be negative ({})", h.mi.sigma);
        Ok(())
    }
}

impl VerticalConfig {
    pub fn validate(&self) -> Result<()> {
        let v = self;
        ensure_config!(v.half_width > 0., "vertical half-width must be positive");
        ensure_config!(
            v.bin_width > 0. && v.bin_width <= 2. * v.half_width,
            "vertical bin width must be in (0, {}]",
            2. * v.half_width
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() -> Result<()> {
        Config::default().validate()
    }

    #[test]
    fn rejects_bad_patch() {
        let mut cfg = Config::default();
        cfg.horizontal.patch_size = 0.;
        let err = cfg.validate().unwrap_err();
        match err.downcast_ref::<CoregError>() {
            Some(CoregError::InvalidConfig(msg)) => assert!(msg.contains("patch size")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn stages_validate_independently() {
        let mut cfg = Config::default();
        cfg.horizontal.patch_size = -1.;
        assert!(cfg.vertical.validate().is_ok());
        assert!(cfg.horizontal.validate().is_err());
        assert!(cfg.validate().is_err());

        cfg = Config::default();
        cfg.vertical.bin_width = 0.;
        assert!(cfg.horizontal.validate().is_ok());
        assert!(cfg.vertical.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() -> Result<()> {
        let cfg: Config = serde_json::from_str(
            r#"{
                "nodata": -32768,
                "horizontal": { "patch_size": 20, "shift_x": { "initial": 1.5, "half_width": 4 } },
                "vertical": { "bin_width": 0.05 }
            }"#,
        )?;
        assert_eq!(cfg.nodata, -32768.);
        assert_eq!(cfg.horizontal.patch_size, 20.);
        assert_eq!(cfg.horizontal.shift_x, ShiftRange::new(1.5, 4.));
        assert_eq!(cfg.horizontal.grid_size, 200.);
        assert_eq!(cfg.horizontal.mi, MiConfig::default());
        assert_eq!(cfg.vertical.buffer, 100);
        assert_eq!(cfg.vertical.bin_width, 0.05);
        cfg.validate()
    }
}

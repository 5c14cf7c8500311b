use chm_coreg::config::{Config, ShiftRange};
use clap::{value_t, ErrorKind};
use coreg_tools::{args_parser, cli::args::*, opt, utils::*, Result};
use std::path::PathBuf;

/// Program arguments
pub struct Args {
    pub reference: PathBuf,
    pub sensed: PathBuf,
    pub config: Config,
    /// Path to dump the per-patch shifts
    pub lut: Option<PathBuf>,
    /// Path of the full JSON report
    pub report: Option<PathBuf>,
    /// Shifted copy of the sensed raster
    pub output: Option<OutputArgs>,
    /// Worker threads (default: rayon's choice)
    pub threads: Option<usize>,
}

pub fn parse_cmd_line() -> Result<Args> {
    let matches = output_args(pair_args(args_parser!("coreg-horizontal")))
        .about("Estimate the horizontal shift between two overlapping rasters.")
        .arg(opt!("grid size").help("Side of a grid cell in ground units (default: 200)"))
        .arg(opt!("patch size").help("Side of a patch in ground units (default: 10)"))
        .arg(opt!("patches per cell").help("Patches drawn in each cell (default: 1)"))
        .arg(
            opt!("shift x")
                .allow_hyphen_values(true)
                .help("Search along x as INITIAL:HALF_WIDTH ground units (default: 0:10)"),
        )
        .arg(
            opt!("shift y")
                .allow_hyphen_values(true)
                .help("Search along y as INITIAL:HALF_WIDTH ground units (default: 0:10)"),
        )
        .arg(opt!("buffer").help("Margin dropped from the overlap in ground units (default: 20)"))
        .arg(opt!("seed").help("Seed of the patch placement (default: 0)"))
        .arg(opt!("sigma").help("Smoothing of the joint histogram (default: 1)"))
        .arg(
            opt!("normalized")
                .takes_value(false)
                .help("Score with normalized mutual information"),
        )
        .arg(opt!("lut").help("Write the shift of every patch to this JSON path"))
        .arg(opt!("threads").short("j").help("Number of worker threads"))
        .get_matches();

    let reference = value_t!(matches, "reference", PathBuf).unwrap_or_else(|e| e.exit());
    let sensed = value_t!(matches, "sensed", PathBuf).unwrap_or_else(|e| e.exit());

    let config_path = value_t!(matches, "config", PathBuf).ok();
    let mut config = read_config(config_path.as_deref())?;
    if let Ok(nodata) = value_t!(matches, "nodata", f64) {
        config.nodata = nodata;
    }

    let h = &mut config.horizontal;
    macro_rules! set {
        ($field:ident, $name:expr, $t:ty) => {
            if matches.is_present($name) {
                h.$field = value_t!(matches, $name, $t).unwrap_or_else(|e| e.exit());
            }
        };
    }
    set!(grid_size, "grid size", f64);
    set!(patch_size, "patch size", f64);
    set!(patches_per_cell, "patches per cell", usize);
    set!(buffer, "buffer", f64);
    set!(seed, "seed", u64);
    if matches.is_present("sigma") {
        h.mi.sigma = value_t!(matches, "sigma", f64).unwrap_or_else(|e| e.exit());
    }
    if matches.is_present("normalized") {
        h.mi.normalized = true;
    }
    if let Some(range) = matches.value_of("shift x") {
        h.shift_x = parse_range(range);
    }
    if let Some(range) = matches.value_of("shift y") {
        h.shift_y = parse_range(range);
    }

    Ok(Args {
        reference,
        sensed,
        config,
        lut: value_t!(matches, "lut", PathBuf).ok(),
        report: value_t!(matches, "report", PathBuf).ok(),
        output: OutputArgs::from_matches(&matches),
        threads: value_t!(matches, "threads", usize).ok(),
    })
}

fn parse_range(s: &str) -> ShiftRange {
    let parsed = s
        .split_once(':')
        .and_then(|(init, half)| Some(ShiftRange::new(init.parse().ok()?, half.parse().ok()?)));
    parsed.unwrap_or_else(|| {
        clap::Error::with_description(
            &format!("invalid search range `{}' (expected INITIAL:HALF_WIDTH)", s),
            ErrorKind::InvalidValue,
        )
        .exit()
    })
}

use chm_coreg::prelude::*;
use clap::value_t;
use coreg_tools::{arg, args_parser, opt, utils::*};
use std::path::PathBuf;

// Main function
coreg_tools::sync_main!(run());

/// Program arguments
struct Args {
    input: PathBuf,
    output: OutputArgs,
    horizontal: Option<(f64, f64)>,
    vertical: Option<f64>,
}

fn parse_cmd_line() -> Args {
    let matches = args_parser!("coreg-shift")
        .about("Apply a known shift to a raster.")
        .arg(arg!("input").required(true).help("Input path (raster dataset)"))
        .arg(
            opt!("output")
                .short("o")
                .required(true)
                .help("Output path (raster dataset)"),
        )
        .arg(opt!("driver").help("Output driver (default: GTiff)"))
        .arg(
            opt!("dx")
                .allow_hyphen_values(true)
                .requires("dy")
                .help("Horizontal shift along x, subtracted from the origin"),
        )
        .arg(
            opt!("dy")
                .allow_hyphen_values(true)
                .requires("dx")
                .help("Horizontal shift along y, subtracted from the origin"),
        )
        .arg(
            opt!("dz")
                .allow_hyphen_values(true)
                .help("Vertical shift, subtracted from valid samples (single band only)"),
        )
        .group(
            clap::ArgGroup::with_name("shift")
                .args(&["dx", "dz"])
                .multiple(true)
                .required(true),
        )
        .get_matches();

    let input = value_t!(matches, "input", PathBuf).unwrap_or_else(|e| e.exit());
    let horizontal = if matches.is_present("dx") {
        Some((
            value_t!(matches, "dx", f64).unwrap_or_else(|e| e.exit()),
            value_t!(matches, "dy", f64).unwrap_or_else(|e| e.exit()),
        ))
    } else {
        None
    };
    let vertical = if matches.is_present("dz") {
        Some(value_t!(matches, "dz", f64).unwrap_or_else(|e| e.exit()))
    } else {
        None
    };

    Args {
        input,
        output: OutputArgs::from_matches(&matches)
            .unwrap_or_else(|| clap::Error::argument_not_found_auto("output").exit()),
        horizontal,
        vertical,
    }
}

fn run() -> Result<()> {
    let args = parse_cmd_line();

    let mut raster = read_input(&args.input)?;
    if let Some(dz) = args.vertical {
        raster = apply_vertical(&raster, dz)?;
    }
    if let Some((dx, dy)) = args.horizontal {
        raster = apply_horizontal(&raster, dx, dy);
    }
    args.output.write(&raster)
}

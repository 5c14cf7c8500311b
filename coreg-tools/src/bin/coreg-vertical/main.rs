use anyhow::bail;
use chm_coreg::prelude::*;
use clap::value_t;
use coreg_tools::{args_parser, cli::args::*, opt, utils::*};
use std::path::PathBuf;

// Main function
coreg_tools::sync_main!(run());

/// Program arguments
struct Args {
    reference: PathBuf,
    sensed: PathBuf,
    config: Config,
    report: Option<PathBuf>,
    /// Vertically shifted copy of the sensed raster
    output: Option<OutputArgs>,
}

fn parse_cmd_line() -> Result<Args> {
    let matches = output_args(pair_args(args_parser!("coreg-vertical")))
        .about("Estimate the vertical offset between two overlapping rasters.")
        .arg(opt!("buffer").help("Margin dropped from the overlap in pixels (default: 100)"))
        .arg(
            opt!("half width")
                .help("Differences searched in [-HALF_WIDTH, HALF_WIDTH) (default: 10)"),
        )
        .arg(opt!("bin width").help("Width of a difference bin (default: 0.1)"))
        .get_matches();

    let reference = value_t!(matches, "reference", PathBuf).unwrap_or_else(|e| e.exit());
    let sensed = value_t!(matches, "sensed", PathBuf).unwrap_or_else(|e| e.exit());

    let config_path = value_t!(matches, "config", PathBuf).ok();
    let mut config = read_config(config_path.as_deref())?;
    if let Ok(nodata) = value_t!(matches, "nodata", f64) {
        config.nodata = nodata;
    }
    let v = &mut config.vertical;
    if matches.is_present("buffer") {
        v.buffer = value_t!(matches, "buffer", usize).unwrap_or_else(|e| e.exit());
    }
    if matches.is_present("half width") {
        v.half_width = value_t!(matches, "half width", f64).unwrap_or_else(|e| e.exit());
    }
    if matches.is_present("bin width") {
        v.bin_width = value_t!(matches, "bin width", f64).unwrap_or_else(|e| e.exit());
    }

    Ok(Args {
        reference,
        sensed,
        config,
        report: value_t!(matches, "report", PathBuf).ok(),
        output: OutputArgs::from_matches(&matches),
    })
}

fn run() -> Result<()> {
    let args = parse_cmd_line()?;

    let reference = read_input(&args.reference)?;
    let sensed = read_input(&args.sensed)?;

    let estimate = estimate_vertical(&reference, &sensed, &args.config)?;
    print_json(&estimate)?;
    if let Some(path) = &args.report {
        write_json(path, &estimate)?;
    }

    if let Some(output) = &args.output {
        let shift = match estimate.value() {
            Some(shift) => shift,
            None => bail!(
                "not writing {}: vertical shift is ambiguous between {:?}",
                output.path.display(),
                estimate.centers
            ),
        };
        output.write(&apply_vertical(&sensed, shift)?)?;
    }
    Ok(())
}

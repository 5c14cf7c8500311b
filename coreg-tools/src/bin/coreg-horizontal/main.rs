use chm_coreg::prelude::*;
use coreg_tools::{utils::*, Tracker};
use serde_derive::Serialize;

mod args;

// Main function
coreg_tools::sync_main!(run());

/// Summary printed on stdout.
#[derive(Serialize)]
struct Report<'a> {
    shift: (f64, f64),
    pixels: (i64, i64),
    support: (usize, usize),
    patches: usize,
    grid: (usize, usize),
    crop_pixels: (usize, usize),
    crop_ground: (f64, f64),
    warnings: &'a [CoregWarning],
}

/// Per-patch detail written with `--lut`.
#[derive(Serialize)]
struct LutDump<'a> {
    lut: &'a [LutEntry],
    best_surface: &'a Option<ShiftSurface>,
}

fn run() -> Result<()> {
    // Parse command line
    let args = args::parse_cmd_line()?;
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let reference = read_input(&args.reference)?;
    let sensed = read_input(&args.sensed)?;

    let estimate = {
        let tracker = Tracker::new("cells");
        estimate_horizontal_with(&reference, &sensed, &args.config, &|status| {
            tracker.observe(status)
        })?
    };

    print_json(&Report {
        shift: estimate.shift,
        pixels: estimate.pixels(),
        support: (estimate.consensus.support_x, estimate.consensus.support_y),
        patches: estimate.consensus.entries,
        grid: estimate.grid,
        crop_pixels: estimate.crop_pixels,
        crop_ground: estimate.crop_ground,
        warnings: &estimate.warnings,
    })?;

    if let Some(path) = &args.report {
        write_json(path, &estimate)?;
    }
    if let Some(path) = &args.lut {
        write_json(
            path,
            &LutDump {
                lut: &estimate.lut,
                best_surface: &estimate.best_surface,
            },
        )?;
    }

    if let Some(output) = &args.output {
        let (dx, dy) = estimate.shift;
        output.write(&apply_horizontal(&sensed, dx, dy))?;
    }
    Ok(())
}

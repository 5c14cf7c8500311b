pub use clap::{App, Arg, ArgMatches};
pub use inflector::Inflector;

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::args::App::new($name)
            .version(clap::crate_version!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use inflector::Inflector;
        $crate::cli::args::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use inflector::Inflector;
        $crate::cli::args::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Positional reference and sensed inputs, and the options
/// shared by the estimators.
pub fn pair_args<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.arg(
        arg!("reference")
            .required(true)
            .help("Reference raster (kept fixed)"),
    )
    .arg(
        arg!("sensed")
            .required(true)
            .help("Sensed raster (to be aligned)"),
    )
    .arg(opt!("config").help("Parameters as JSON (missing fields take defaults)"))
    .arg(
        opt!("nodata")
            .allow_hyphen_values(true)
            .help("Nodata value of both rasters (default: -9999)"),
    )
    .arg(opt!("report").help("Also write the JSON report to this path"))
}

/// Output raster and driver options.
pub fn output_args<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.arg(opt!("output").short("o").help("Output path (raster dataset)"))
        .arg(
            opt!("driver")
                .requires("output")
                .help("Output driver (default: GTiff)"),
        )
}

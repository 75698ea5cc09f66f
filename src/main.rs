use anyhow::{bail, Context};
use clap::Parser;
use specqa::core::{AggregatorParams, CloudSlopeParams, SpectrumAggregator};
use specqa::io::{find_header, resolve_wavelength_grid, write_report, EnviHeader, LineReader};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(name = "specqa", about = "Spectrum quality")]
struct Args {
    /// Reflectance cube (ENVI flat binary)
    #[clap(value_name = "REFLECTANCE")]
    rflfile: PathBuf,

    /// Output report path
    #[clap(value_name = "OUTPUT")]
    outfile: PathBuf,

    /// Decimation stride: process every n-th valid spectrum
    #[clap(long, default_value = "1")]
    sample: usize,

    /// External wavelength table (index, wavelength, fwhm columns)
    #[clap(long, value_name = "WAVELENGTH")]
    wavelengths: Option<PathBuf>,

    /// Log accepted cloud fits (interactive plotting is not built in)
    #[clap(long)]
    plot: bool,

    /// Fit visible-range slopes on cloud spectra
    #[clap(long)]
    fit_cloud_slope: bool,

    /// Maximum mean absolute relative fit error for accepting a cloud fit
    #[clap(long, default_value = "0.05")]
    uv_err_thresh: f64,

    /// Maximum absolute visible-range slope for accepting a cloud fit
    #[clap(long, default_value = "0.0003")]
    uv_slope_thresh: f64,

    /// Log destination (stderr when omitted)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// Log verbosity (error, warn, info, debug, trace)
    #[clap(long, default_value = "info")]
    log_level: String,
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = args
        .log_level
        .parse::<log::LevelFilter>()
        .with_context(|| format!("Invalid log level '{}'", args.log_level))?;

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}", record.args()));
    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Cannot open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    if args.sample == 0 {
        bail!("--sample must be a positive integer");
    }

    let header_path = find_header(&args.rflfile);
    let header = EnviHeader::from_file(&header_path)
        .with_context(|| format!("Reading header {}", header_path.display()))?;
    let grid = resolve_wavelength_grid(&header, args.wavelengths.as_deref())?;

    let params = AggregatorParams {
        sample_stride: args.sample,
        fit_cloud_slope: args.fit_cloud_slope,
        slope_params: CloudSlopeParams {
            uv_err_thresh: args.uv_err_thresh,
            uv_slope_thresh: args.uv_slope_thresh,
        },
        trace_cloud_fits: args.plot,
        ..Default::default()
    };

    let mut aggregator = SpectrumAggregator::new(&grid, params)?;
    let mut reader = LineReader::open(&args.rflfile, &header)?;

    let total_lines = reader.lines();
    let mut line = 0usize;
    while let Some(frame) = reader.read_line()? {
        line += 1;
        log::debug!("line {}/{}", line, total_lines);
        aggregator.process_line(&frame)?;
    }

    let summary = aggregator.finalize();

    let mut out = File::create(&args.outfile)
        .with_context(|| format!("Cannot create report {}", args.outfile.display()))?;
    write_report(&summary, &mut out)?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    run(&args)
}

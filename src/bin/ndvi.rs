use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ndvi_tools::{BatchConfig, NdviTransformer, Viridis, config::ConfigOverrides, run_batch};

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "render NDVI images for a range of numbered camera images"
)]
struct Args {
    /// RON batch config, other options override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// source image path, '{index}' is replaced by the image number
    #[arg(short, long)]
    source: Option<String>,

    /// mask image path (white pixels are processed)
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// output image path (png, tif or webp), '{index}' is replaced by the image number
    #[arg(short, long)]
    output: Option<String>,

    /// first image number
    #[arg(long)]
    first: Option<u32>,

    /// last image number (inclusive), defaults to first
    #[arg(long)]
    last: Option<u32>,

    /// rows between progress messages (logged at info level), 0 to disable
    #[arg(long)]
    progress: Option<u32>,

    /// exponent applied to the vegetation index
    #[arg(long, default_value_t = ndvi_tools::ndvi::AMPLIFICATION_EXPONENT)]
    exponent: i32,

    /// gain applied after the exponent
    #[arg(long, default_value_t = ndvi_tools::ndvi::AMPLIFICATION_GAIN)]
    gain: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = batch_config(&args)?;
    let transformer = NdviTransformer::new(Viridis)
        .with_exponent(args.exponent)
        .with_gain(args.gain);

    let report = run_batch(&config, &transformer, |index, p| {
        info!("image {index}: {}%", p.percent());
    })?;

    if report.is_success() {
        info!("{} images converted", report.succeeded.len());
        Ok(())
    } else {
        let failed: Vec<String> = report.failed.iter().map(|(i, _)| i.to_string()).collect();
        Err(anyhow!("failed images: {}", failed.join(", ")))
    }
}

fn batch_config(args: &Args) -> Result<BatchConfig> {
    let base = match &args.config {
        Some(path) => Some(BatchConfig::open(path)?),
        None => None,
    };
    let overrides = ConfigOverrides {
        source_path: args.source.clone(),
        mask_path: args.mask.clone(),
        output_path: args.output.clone(),
        first: args.first,
        last: args.last,
        progress_cadence: args.progress,
    };
    Ok(overrides.resolve(base)?)
}

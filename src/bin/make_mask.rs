use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use image::RgbImage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ndvi_tools::{
    batch::load_rgb,
    mask::{Circle, circle_mask, overlay_circle, selected_count},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "create a circular mask for the NDVI converter")]
struct Args {
    /// sample image that defines the mask size (and background with --overlay)
    #[arg(long)]
    like: Option<PathBuf>,

    /// mask width if no sample image is given
    #[arg(long, default_value_t = 2592)]
    width: u32,

    /// mask height if no sample image is given
    #[arg(long, default_value_t = 1944)]
    height: u32,

    /// vertical offset of the circle center from the image center
    #[arg(long, default_value_t = 50, allow_hyphen_values = true)]
    dy: i32,

    /// circle radius in pixels
    #[arg(short, long, default_value_t = 1095)]
    radius: i32,

    /// paint the circle over the sample image instead of a black background
    #[arg(long)]
    overlay: bool,

    /// mask file to write
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.radius < 0 {
        bail!("negative radius {}", args.radius);
    }

    let sample: Option<RgbImage> = match &args.like {
        Some(path) => Some(load_rgb(path)?),
        None => None,
    };
    let (width, height) = sample
        .as_ref()
        .map(|img| img.dimensions())
        .unwrap_or((args.width, args.height));
    let circle = Circle::offset_from_center(width, height, args.dy, args.radius);

    let mask = match (&sample, args.overlay) {
        (Some(img), true) => overlay_circle(img, &circle),
        (None, true) => bail!("--overlay requires --like <image>"),
        _ => circle_mask(width, height, &circle),
    };

    mask.save(&args.output)?;
    info!(
        "{}: {width}x{height} mask, circle at {},{} r={}, {} selected pixels",
        args.output.display(),
        circle.center_x,
        circle.center_y,
        circle.radius,
        selected_count(&mask)
    );
    Ok(())
}

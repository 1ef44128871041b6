use std::{
    io::BufWriter,
    path::{Path, PathBuf},
};

use image::{ImageError, ImageFormat, RgbImage, RgbaImage};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::{
    colors::ColorRamp,
    config::{BatchConfig, check_output_format},
    errors::{NdviError, Result},
    mask::selected_count,
    ndvi::{NdviTransformer, Progress},
};

/// Loads an image of any supported color type as 8-bit RGB.
///
/// A missing file is a configuration error. Anything that exists but cannot be read or
/// decoded is a data error, including truncated files that the codec reports as IO errors.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(NdviError::missing_file(path));
    }
    let img = image::open(path)
        .map_err(|e| NdviError::Data(format!("cannot decode '{}': {e}", path.display())))?;
    Ok(img.to_rgb8())
}

/// Writes `img` to `path`, in the format given by the path extension.
///
/// The image is encoded into a temporary file next to the target, which is only renamed
/// into place once it is complete. An interrupted write never leaves a partial image at
/// `path`.
pub fn save_rgba<P: AsRef<Path>>(img: &RgbaImage, path: P) -> Result<()> {
    let path = path.as_ref();
    check_output_format(path)?;
    let format = ImageFormat::from_path(path)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        img.write_to(&mut writer, format).map_err(|e| match e {
            ImageError::IoError(io) => NdviError::Io(io),
            other => NdviError::Data(format!("cannot encode '{}': {other}", path.display())),
        })?;
        writer.into_inner().map_err(|e| e.into_error())?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| NdviError::Io(e.error))?;
    Ok(())
}

/// Converts a single source image with an already loaded mask.
pub fn process_image<C, F>(
    transformer: &NdviTransformer<C>,
    source_path: &Path,
    mask: &RgbImage,
    output_path: &Path,
    cadence: u32,
    progress: F,
) -> Result<()>
where
    C: ColorRamp,
    F: FnMut(Progress),
{
    let source = load_rgb(source_path)?;
    let output = transformer.transform_with_progress(&source, mask, cadence, progress)?;
    save_rgba(&output, output_path)
}

/// Outcome of [`run_batch`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(u32, PathBuf)>,
    pub failed: Vec<(u32, NdviError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Converts every numbered image of `config`.
///
/// The configuration and the shared mask are checked first; if either is unusable
/// nothing is processed and the error is returned. After that, a failing image is
/// logged and recorded in the report, and the batch moves on to the next index.
pub fn run_batch<C, F>(
    config: &BatchConfig,
    transformer: &NdviTransformer<C>,
    mut progress: F,
) -> Result<BatchReport>
where
    C: ColorRamp,
    F: FnMut(u32, Progress),
{
    config.validate()?;

    let mask = load_rgb(&config.mask_path)?;
    let (w, h) = mask.dimensions();
    let n_selected = selected_count(&mask);
    info!(
        "mask {} is {w}x{h} with {n_selected} selected pixels",
        config.mask_path.display()
    );
    if n_selected == 0 {
        warn!("mask selects no pixels, all outputs will be fully transparent");
    }

    let mut report = BatchReport::default();
    for index in config.indices() {
        let source_path = config.source_for(index);
        let output_path = config.output_for(index);
        debug!("processing image {index}: {}", source_path.display());

        match process_image(
            transformer,
            &source_path,
            &mask,
            &output_path,
            config.progress_cadence,
            |p| progress(index, p),
        ) {
            Ok(()) => {
                info!("image {index} -> {}", output_path.display());
                report.succeeded.push((index, output_path));
            }
            Err(e) => {
                error!("image {index} ({}) failed: {e}", source_path.display());
                report.failed.push((index, e));
            }
        }
    }

    info!(
        "batch done: {} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    Ok(report)
}

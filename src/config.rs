use std::{
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::errors::{NdviError, Result};

/// Placeholder in path templates that is replaced by the zero padded image number.
pub const INDEX_PLACEHOLDER: &str = "{index}";

fn default_index_width() -> usize {
    3
}

fn default_progress_cadence() -> u32 {
    10
}

/// Configuration of a batch conversion over numbered images.
///
/// ```ron
/// BatchConfig(
///     source_path: "images/phoenix_{index}.jpg",
///     mask_path: "images/phoenix_mask.jpg",
///     output_path: "ndvi/result{index}.png",
///     image_index_range: (start: 78, end: 120),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub source_path: String,
    pub mask_path: PathBuf,
    pub output_path: String,
    pub image_index_range: RangeInclusive<u32>,

    #[serde(default = "default_index_width")]
    pub index_width: usize,

    /// Rows between progress reports, 0 for none.
    #[serde(default = "default_progress_cadence")]
    pub progress_cadence: u32,
}

impl BatchConfig {
    pub fn new(
        source_path: impl Into<String>,
        mask_path: impl Into<PathBuf>,
        output_path: impl Into<String>,
        image_index_range: RangeInclusive<u32>,
    ) -> Self {
        BatchConfig {
            source_path: source_path.into(),
            mask_path: mask_path.into(),
            output_path: output_path.into(),
            image_index_range,
            index_width: default_index_width(),
            progress_cadence: default_progress_cadence(),
        }
    }

    pub fn from_ron_str(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(NdviError::missing_file(path));
        }
        Self::from_ron_str(&fs::read_to_string(path)?)
    }

    /// Checks everything that can be checked without touching the images.
    pub fn validate(&self) -> Result<()> {
        if self.source_path.is_empty() {
            return Err(NdviError::Configuration("no source path".into()));
        }
        if self.mask_path.as_os_str().is_empty() {
            return Err(NdviError::Configuration("no mask path".into()));
        }
        if self.output_path.is_empty() {
            return Err(NdviError::Configuration("no output path".into()));
        }
        if self.image_index_range.is_empty() {
            return Err(NdviError::Configuration(format!(
                "empty image index range {}..={}",
                self.image_index_range.start(),
                self.image_index_range.end()
            )));
        }

        if self.image_count() > 1 {
            for template in [&self.source_path, &self.output_path] {
                if !template.contains(INDEX_PLACEHOLDER) {
                    return Err(NdviError::Configuration(format!(
                        "path '{template}' needs an {INDEX_PLACEHOLDER} placeholder \
                         to process more than one image"
                    )));
                }
            }
        }

        check_output_format(Path::new(&self.output_path))
    }

    pub fn image_count(&self) -> u64 {
        if self.image_index_range.is_empty() {
            0
        } else {
            let (first, last) = (*self.image_index_range.start(), *self.image_index_range.end());
            last as u64 - first as u64 + 1
        }
    }

    pub fn indices(&self) -> RangeInclusive<u32> {
        self.image_index_range.clone()
    }

    pub fn source_for(&self, index: u32) -> PathBuf {
        PathBuf::from(expand_template(&self.source_path, index, self.index_width))
    }

    pub fn output_for(&self, index: u32) -> PathBuf {
        PathBuf::from(expand_template(&self.output_path, index, self.index_width))
    }
}

/// Values given on the command line, taking precedence over a config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub source_path: Option<String>,
    pub mask_path: Option<PathBuf>,
    pub output_path: Option<String>,
    pub first: Option<u32>,
    pub last: Option<u32>,
    pub progress_cadence: Option<u32>,
}

impl ConfigOverrides {
    /// Builds the batch config from an optional file config and the overrides.
    ///
    /// `last` alone keeps the start of the file range. `first` without `last` selects a
    /// single image. Without a file config, source, mask, output and first are required.
    pub fn resolve(&self, base: Option<BatchConfig>) -> Result<BatchConfig> {
        let mut config = match base {
            Some(config) => config,
            None => {
                let (Some(source), Some(mask), Some(output), Some(first)) =
                    (&self.source_path, &self.mask_path, &self.output_path, self.first)
                else {
                    return Err(NdviError::Configuration(
                        "no config file, source, mask, output and first image are required".into(),
                    ));
                };
                BatchConfig::new(source.as_str(), mask, output.as_str(), first..=first)
            }
        };

        if let Some(source) = &self.source_path {
            config.source_path = source.clone();
        }
        if let Some(mask) = &self.mask_path {
            config.mask_path = mask.clone();
        }
        if let Some(output) = &self.output_path {
            config.output_path = output.clone();
        }
        if self.first.is_some() || self.last.is_some() {
            let first = self.first.unwrap_or(*config.image_index_range.start());
            let last = self.last.unwrap_or(first);
            config.image_index_range = first..=last;
        }
        if let Some(cadence) = self.progress_cadence {
            config.progress_cadence = cadence;
        }

        Ok(config)
    }
}

/// Replaces every [`INDEX_PLACEHOLDER`] in `template` with `index`, zero padded to `width`.
pub fn expand_template(template: &str, index: u32, width: usize) -> String {
    template.replace(INDEX_PLACEHOLDER, &format!("{index:0width$}"))
}

/// Output images carry an alpha channel, so the format has to support one.
pub fn check_output_format(path: &Path) -> Result<()> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Png | ImageFormat::Tiff | ImageFormat::WebP) => Ok(()),
        Ok(format) => Err(NdviError::Configuration(format!(
            "output format {format:?} of '{}' does not support transparency",
            path.display()
        ))),
        Err(_) => Err(NdviError::Configuration(format!(
            "unknown output format for '{}'",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn phoenix_config() -> BatchConfig {
        BatchConfig::new(
            "images/phoenix_{index}.jpg",
            "images/phoenix_mask.jpg",
            "ndvi/result{index}.png",
            78..=80,
        )
    }

    #[test]
    fn templates_are_zero_padded() {
        let config = phoenix_config();
        assert_eq!(config.source_for(78), PathBuf::from("images/phoenix_078.jpg"));
        assert_eq!(config.output_for(7), PathBuf::from("ndvi/result007.png"));
        assert_eq!(config.output_for(1234), PathBuf::from("ndvi/result1234.png"));
        assert_eq!(expand_template("a_{index}_{index}", 5, 2), "a_05_05");
    }

    #[test]
    fn parses_ron_with_defaults() {
        let config = BatchConfig::from_ron_str(
            r#"BatchConfig(
                source_path: "images/phoenix_{index}.jpg",
                mask_path: "images/phoenix_mask.jpg",
                output_path: "ndvi/result{index}.png",
                image_index_range: (start: 78, end: 80),
            )"#,
        )
        .unwrap();
        assert_eq!(config, phoenix_config());
        assert_eq!(config.index_width, 3);
        assert_eq!(config.progress_cadence, 10);
        assert_eq!(config.image_count(), 3);
    }

    #[test]
    fn malformed_ron_is_a_configuration_error() {
        let err = BatchConfig::from_ron_str("BatchConfig(source_path: 1)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn missing_config_file() {
        let err = BatchConfig::open("/nonexistent/batch.ron").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn validate_accepts_good_config() {
        assert!(phoenix_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_range() {
        let mut config = phoenix_config();
        config.image_index_range = 80..=78;
        assert_eq!(config.image_count(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_placeholder_for_batches() {
        let mut config = phoenix_config();
        config.output_path = "ndvi/result.png".into();
        assert!(config.validate().is_err());

        config.image_index_range = 78..=78;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_transparent_output_format() {
        let mut config = phoenix_config();
        config.output_path = "ndvi/result{index}.jpg".into();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        config.output_path = "ndvi/result{index}".into();
        assert!(config.validate().is_err());

        config.output_path = "ndvi/result{index}.tif".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_without_file_config() {
        let overrides = ConfigOverrides {
            source_path: Some("in_{index}.jpg".into()),
            mask_path: Some("mask.jpg".into()),
            output_path: Some("out_{index}.png".into()),
            first: Some(12),
            ..Default::default()
        };
        let config = overrides.resolve(None).unwrap();
        assert_eq!(config.image_index_range, 12..=12);
        assert_eq!(config.mask_path, PathBuf::from("mask.jpg"));
        assert_eq!(config.progress_cadence, 10);

        let incomplete = ConfigOverrides {
            output_path: None,
            ..overrides
        };
        let err = incomplete.resolve(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = ConfigOverrides {
            mask_path: Some("other_mask.png".into()),
            progress_cadence: Some(0),
            ..Default::default()
        };
        let config = overrides.resolve(Some(phoenix_config())).unwrap();
        assert_eq!(config.mask_path, PathBuf::from("other_mask.png"));
        assert_eq!(config.progress_cadence, 0);
        assert_eq!(config.source_path, phoenix_config().source_path);
        assert_eq!(config.image_index_range, 78..=80);
    }

    #[test]
    fn last_alone_keeps_file_start() {
        let overrides = ConfigOverrides {
            last: Some(95),
            ..Default::default()
        };
        let config = overrides.resolve(Some(phoenix_config())).unwrap();
        assert_eq!(config.image_index_range, 78..=95);
    }

    #[test]
    fn first_alone_selects_one_image() {
        let overrides = ConfigOverrides {
            first: Some(79),
            ..Default::default()
        };
        let config = overrides.resolve(Some(phoenix_config())).unwrap();
        assert_eq!(config.image_index_range, 79..=79);

        let overrides = ConfigOverrides {
            first: Some(90),
            last: Some(92),
            ..Default::default()
        };
        let config = overrides.resolve(Some(phoenix_config())).unwrap();
        assert_eq!(config.image_index_range, 90..=92);
    }

    #[test]
    fn validate_rejects_missing_paths() {
        let mut config = phoenix_config();
        config.mask_path = PathBuf::new();
        assert!(config.validate().is_err());
    }
}

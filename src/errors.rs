use std::path::Path;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NdviError>;

/// Coarse classification of [`NdviError`], used to decide what aborts a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mismatched dimensions, missing paths, invalid options.
    Configuration,
    /// Unreadable or corrupt input, unsupported format.
    Data,
    /// Output could not be written.
    Io,
}

#[derive(Error, Debug)]
pub enum NdviError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid config file: {0}")]
    ConfigFile(#[from] ron::error::SpannedError),

    #[error("data error: {0}")]
    Data(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device error: {0}")]
    Device(String),
}

impl NdviError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NdviError::Configuration(_) | NdviError::ConfigFile(_) => ErrorKind::Configuration,
            NdviError::Image(image::ImageError::IoError(_)) => ErrorKind::Io,
            NdviError::Data(_) | NdviError::Image(_) => ErrorKind::Data,
            NdviError::Io(_) | NdviError::Device(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn dimension_mismatch(source: (u32, u32), mask: (u32, u32)) -> Self {
        NdviError::Configuration(format!(
            "source image is {}x{} but mask is {}x{}",
            source.0, source.1, mask.0, mask.1
        ))
    }

    pub(crate) fn missing_file(path: &Path) -> Self {
        NdviError::Configuration(format!("file not found: {}", path.display()))
    }
}

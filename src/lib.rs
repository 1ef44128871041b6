//! Vegetation index rendering for Astro Pi camera images.
//!
//! The modules follow the steps of the experiment: [acquisition] decides when to take a
//! picture, [mask] builds the mask of the camera window, [ndvi] turns masked images into
//! color mapped vegetation index images and [batch] runs that over numbered image files.

pub mod acquisition;
pub mod batch;
pub mod colors;
pub mod config;
pub mod errors;
pub mod mask;
pub mod ndvi;

pub use batch::{BatchReport, run_batch};
pub use colors::{ColorRamp, Viridis};
pub use config::BatchConfig;
pub use errors::{ErrorKind, NdviError, Result};
pub use ndvi::NdviTransformer;

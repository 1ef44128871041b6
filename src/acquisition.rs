//! Decision logic of the on-orbit capture loop.
//!
//! The loop takes a picture at a fixed cadence unless the station is on the night side
//! of the Earth or above open Pacific ocean away from the volcanic islands of interest.
//! Camera and orbit propagation are supplied by the caller through [`Camera`] and
//! [`Ephemeris`].

use std::{
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use tracing::{error, info};

use crate::errors::Result;

/// Sun alignment below which the platform is considered to be in darkness.
///
/// Slightly below zero so that frames taken right at the terminator are kept.
pub const NIGHT_THRESHOLD: f64 = -0.05;

/// Kilometers per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Position of the platform and of the sun at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformFix {
    /// Sub-platform latitude in degrees, north positive.
    pub lat_deg: f64,
    /// Sub-platform longitude in degrees, east positive.
    pub lon_deg: f64,
    /// Platform right ascension and declination in radians.
    pub ra: f64,
    pub dec: f64,
    /// Sun right ascension and declination in radians.
    pub sun_ra: f64,
    pub sun_dec: f64,
}

/// Source of platform positions, usually backed by a TLE propagator.
pub trait Ephemeris {
    fn fix(&mut self) -> Result<PlatformFix>;
}

pub trait Camera {
    fn capture(&mut self, path: &Path, tag: &GeoTag) -> Result<()>;
}

/// Dot product of the unit vectors pointing at the platform and at the sun.
///
/// Negative values mean the angle between them exceeds 90°.
pub fn sun_alignment(fix: &PlatformFix) -> f64 {
    fix.dec.cos() * fix.sun_dec.cos() * (fix.ra - fix.sun_ra).cos()
        + fix.dec.sin() * fix.sun_dec.sin()
}

pub fn is_night(fix: &PlatformFix) -> bool {
    sun_alignment(fix) < NIGHT_THRESHOLD
}

/// A place worth photographing even inside an excluded region.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub radius_km: f64,
}

impl Site {
    pub fn new(name: &str, lat_deg: f64, lon_deg: f64, radius_km: f64) -> Self {
        Site {
            name: name.to_string(),
            lat_deg,
            lon_deg,
            radius_km,
        }
    }

    /// Approximate distance in degrees, with longitude scaled by the cosine of the
    /// site latitude.
    pub fn distance_deg(&self, lat_deg: f64, lon_deg: f64) -> f64 {
        let dlat = lat_deg - self.lat_deg;
        let dlon = self.lat_deg.to_radians().cos() * (lon_deg - self.lon_deg);
        dlat.hypot(dlon)
    }

    pub fn covers(&self, lat_deg: f64, lon_deg: f64) -> bool {
        self.distance_deg(lat_deg, lon_deg) <= self.radius_km / KM_PER_DEGREE
    }
}

/// A hemisphere band of longitudes in which no pictures are taken, except near `sites`.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub northern: bool,
    pub lon_center_deg: f64,
    pub lon_half_width_deg: f64,
    pub sites: Vec<Site>,
}

impl Region {
    pub fn excludes(&self, lat_deg: f64, lon_deg: f64) -> bool {
        let in_hemisphere = if self.northern {
            lat_deg > 0.0
        } else {
            lat_deg < 0.0
        };
        in_hemisphere
            && (lon_deg - self.lon_center_deg).abs() < self.lon_half_width_deg
            && !self.sites.iter().any(|s| s.covers(lat_deg, lon_deg))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExcludedRegions {
    pub regions: Vec<Region>,
}

impl ExcludedRegions {
    /// Open Pacific north and south of the equator, keeping Hawaii, the Galapagos,
    /// Easter Island and Tahiti.
    pub fn pacific_volcanoes() -> Self {
        ExcludedRegions {
            regions: vec![
                Region {
                    name: "North Pacific".into(),
                    northern: true,
                    lon_center_deg: -166.0,
                    lon_half_width_deg: 34.0,
                    sites: vec![Site::new("Hawaii", 20.053056, -155.854444, 350.0)],
                },
                Region {
                    name: "South Pacific".into(),
                    northern: false,
                    lon_center_deg: -122.0,
                    lon_half_width_deg: 40.0,
                    sites: vec![
                        Site::new("Galapagos", -0.284722, -90.333889, 450.0),
                        Site::new("Easter Island", -27.15, -109.38, 250.0),
                        Site::new("Tahiti", -17.6494, -149.4764, 350.0),
                    ],
                },
            ],
        }
    }

    pub fn excluding(&self, lat_deg: f64, lon_deg: f64) -> Option<&Region> {
        self.regions.iter().find(|r| r.excludes(lat_deg, lon_deg))
    }
}

/// GPS position in the rational string form of EXIF GPS tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoTag {
    pub latitude: String,
    pub latitude_ref: char,
    pub longitude: String,
    pub longitude_ref: char,
}

impl GeoTag {
    pub fn from_degrees(lat_deg: f64, lon_deg: f64) -> Self {
        GeoTag {
            latitude: exif_dms(lat_deg),
            latitude_ref: if lat_deg < 0.0 { 'S' } else { 'N' },
            longitude: exif_dms(lon_deg),
            longitude_ref: if lon_deg < 0.0 { 'W' } else { 'E' },
        }
    }
}

/// `"d/1, m/1, s/10"` with seconds in tenths.
fn exif_dms(deg: f64) -> String {
    let tenths = (deg.abs() * 36000.0).round() as u64;
    let d = tenths / 36000;
    let m = (tenths % 36000) / 600;
    let s = tenths % 600;
    format!("{d}/1, {m}/1, {s}/10")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Night,
    ExcludedRegion(String),
    Captured { index: u32, path: PathBuf },
}

pub struct AcquisitionLoop<E, C> {
    ephemeris: E,
    camera: C,
    regions: ExcludedRegions,
    output_dir: PathBuf,
    name_prefix: String,
    cadence: Duration,
    photo_counter: u32,
}

impl<E: Ephemeris, C: Camera> AcquisitionLoop<E, C> {
    pub fn new(ephemeris: E, camera: C, output_dir: impl Into<PathBuf>) -> Self {
        AcquisitionLoop {
            ephemeris,
            camera,
            regions: ExcludedRegions::pacific_volcanoes(),
            output_dir: output_dir.into(),
            name_prefix: "phoenix".into(),
            cadence: Duration::from_millis(9600),
            photo_counter: 1,
        }
    }

    pub fn with_regions(mut self, regions: ExcludedRegions) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_name_prefix(mut self, prefix: &str) -> Self {
        self.name_prefix = prefix.to_string();
        self
    }

    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    /// Index the next captured image will get.
    pub fn photo_counter(&self) -> u32 {
        self.photo_counter
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn image_path(&self, index: u32) -> PathBuf {
        self.output_dir.join(format!("{}_{index:03}.jpg", self.name_prefix))
    }

    /// Checks the current position and takes a picture if it is wanted.
    pub fn step(&mut self) -> Result<Decision> {
        let fix = self.ephemeris.fix()?;
        let alignment = sun_alignment(&fix);

        if alignment < NIGHT_THRESHOLD {
            info!(
                "night at {:.4},{:.4} (sun alignment {alignment:.4})",
                fix.lat_deg, fix.lon_deg
            );
            return Ok(Decision::Night);
        }

        if let Some(region) = self.regions.excluding(fix.lat_deg, fix.lon_deg) {
            info!(
                "over {} at {:.4},{:.4}",
                region.name, fix.lat_deg, fix.lon_deg
            );
            return Ok(Decision::ExcludedRegion(region.name.clone()));
        }

        let index = self.photo_counter;
        let path = self.image_path(index);
        let tag = GeoTag::from_degrees(fix.lat_deg, fix.lon_deg);
        self.camera.capture(&path, &tag)?;
        info!(
            "captured {index} at {:.4},{:.4} (sun alignment {alignment:.4})",
            fix.lat_deg, fix.lon_deg
        );
        self.photo_counter += 1;

        Ok(Decision::Captured { index, path })
    }

    /// Runs [`step`](Self::step) every `cadence` until `duration` has elapsed.
    ///
    /// A failing step is logged and does not end the loop. Returns the number of images
    /// captured.
    pub fn run(&mut self, duration: Duration) -> u32 {
        let start = Instant::now();
        let first = self.photo_counter;

        while start.elapsed() < duration {
            if let Err(e) = self.step() {
                error!("acquisition step failed: {e}");
            }
            thread::sleep(self.cadence);
        }

        info!("acquisition done, {} images", self.photo_counter - first);
        self.photo_counter - first
    }
}

//! Pixel-to-meter calibration.
//!
//! The user places two points on a feature of known length while the camera is
//! at the 100% baseline. The distance is measured in image pixels, so the
//! resulting ratio does not depend on the camera.

use chrono::{DateTime, Utc};
use poolviz_core::{CalibrationSettings, GeometryError, Point, PreconditionError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::mask::Mask;
use crate::photo_space::PhotoSpace;

/// How a calibration was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMethod {
    #[default]
    Manual,
}

/// An accepted pixels-per-meter measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub is_calibrated: bool,
    pub reference_length_m: f64,
    pub reference_pixels: f64,
    pub pixels_per_meter: f64,
    pub calibration_date: DateTime<Utc>,
    pub method: CalibrationMethod,
}

impl Calibration {
    /// Builds a calibration from a reference length and its pixel distance.
    pub fn new(reference_length_m: f64, reference_pixels: f64) -> std::result::Result<Self, GeometryError> {
        if !reference_length_m.is_finite() || reference_length_m <= 0.0 {
            return Err(GeometryError::NonPositiveLength {
                length: reference_length_m,
            });
        }
        if !reference_pixels.is_finite() || reference_pixels <= 0.0 {
            return Err(GeometryError::NonPositivePixels {
                pixels: reference_pixels,
            });
        }
        Ok(Self {
            is_calibrated: true,
            reference_length_m,
            reference_pixels,
            pixels_per_meter: reference_pixels / reference_length_m,
            calibration_date: Utc::now(),
            method: CalibrationMethod::Manual,
        })
    }
}

/// Fallback scale when no calibration exists.
pub fn heuristic_pixels_per_meter(img_w: u32, scene_width_m: f64) -> f64 {
    if scene_width_m > 0.0 {
        img_w as f64 / scene_width_m
    } else {
        img_w as f64
    }
}

/// Holds the current calibration for the loaded photo.
#[derive(Debug, Clone, Default)]
pub struct CalibrationEngine {
    current: Option<Calibration>,
    settings: CalibrationSettings,
}

impl CalibrationEngine {
    pub fn new(settings: CalibrationSettings) -> Self {
        Self {
            current: None,
            settings,
        }
    }

    pub fn current(&self) -> Option<&Calibration> {
        self.current.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.is_calibrated)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Restores a previously saved calibration.
    pub fn restore(&mut self, calibration: Calibration) {
        self.current = Some(calibration);
    }

    /// Runs the two-point protocol. A successful call replaces any previous calibration.
    pub fn calibrate(
        &mut self,
        a: Point,
        b: Point,
        length_m: f64,
        space: &PhotoSpace,
    ) -> Result<&Calibration> {
        if !length_m.is_finite() || length_m <= 0.0 {
            return Err(GeometryError::NonPositiveLength { length: length_m }.into());
        }
        if !space.is_at_baseline() {
            return Err(PreconditionError::NotAtBaseline {
                zoom_percent: space.zoom_percent(),
            }
            .into());
        }
        if !a.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate { x: a.x, y: a.y }.into());
        }
        if !b.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate { x: b.x, y: b.y }.into());
        }
        let distance = a.distance_to(&b);
        if distance < self.settings.min_pixel_distance {
            return Err(GeometryError::DegenerateDistance { distance }.into());
        }

        let calibration = Calibration::new(length_m, distance)?;
        info!(
            "Calibrated: {:.3} m over {:.1} px ({:.2} px/m)",
            length_m, distance, calibration.pixels_per_meter
        );
        let stored: &Calibration = self.current.insert(calibration);
        Ok(stored)
    }

    /// Pixels per meter, falling back to the heuristic for uncalibrated photos.
    pub fn pixels_per_meter(&self, img_w: u32) -> f64 {
        match &self.current {
            Some(c) if c.is_calibrated => c.pixels_per_meter,
            _ => heuristic_pixels_per_meter(img_w, self.settings.heuristic_scene_width_m),
        }
    }

    pub fn length_m(&self, pixels: f64, img_w: u32) -> f64 {
        pixels / self.pixels_per_meter(img_w)
    }

    pub fn area_m2(&self, mask: &Mask, img_w: u32) -> f64 {
        let ppm = self.pixels_per_meter(img_w);
        mask.area_px() / (ppm * ppm)
    }

    pub fn perimeter_m(&self, mask: &Mask, img_w: u32) -> f64 {
        self.length_m(mask.perimeter_px(), img_w)
    }
}

/// Aggregate of repeated calibration samples for one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    pub photo_id: String,
    pub pixels_per_meter: f64,
    pub samples: Vec<f64>,
    /// Population standard deviation as a percentage of the mean.
    pub stdev_pct: f64,
}

impl CalibrationRecord {
    pub fn from_samples(
        photo_id: impl Into<String>,
        samples: Vec<f64>,
    ) -> std::result::Result<Self, GeometryError> {
        if let Some(bad) = samples.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(GeometryError::NonPositivePixels { pixels: *bad });
        }
        if samples.is_empty() {
            return Err(GeometryError::NonPositivePixels { pixels: 0.0 });
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Ok(Self {
            photo_id: photo_id.into(),
            pixels_per_meter: mean,
            stdev_pct: variance.sqrt() / mean * 100.0,
            samples,
        })
    }

    pub fn to_calibration(&self) -> std::result::Result<Calibration, GeometryError> {
        Calibration::new(1.0, self.pixels_per_meter)
    }
}

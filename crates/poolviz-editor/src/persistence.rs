//! Storage records for masks and whole scenes.
//!
//! `MaskRecord` is the flat row shape the backend stores: the outline and the
//! editor-only attributes travel as JSON strings and the elevation as a decimal
//! string. Points are clamped into the image on the way out.

use std::path::Path;

use chrono::{DateTime, Utc};
use poolviz_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibration::Calibration;
use crate::coords::clamp_to_image;
use crate::mask::{EffectSettings, Mask, MaskGroup, MaskPoint};

/// Scene file format version.
const SCENE_FORMAT_VERSION: &str = "1.0";

/// Persisted form of one mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskRecord {
    pub id: String,
    pub photo_id: String,
    pub path_json: String,
    pub material_id: Option<String>,
    pub calc_meta_json: String,
    pub depth_level: i32,
    pub elevation_m: String,
    pub z_index: i32,
    pub is_stepped: bool,
}

/// Editor attributes and derived measurements stored alongside the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcMeta {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub effect_settings: Option<EffectSettings>,
    #[serde(default)]
    pub area_px: f64,
    #[serde(default)]
    pub perimeter_px: f64,
    #[serde(default)]
    pub area_m2: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl MaskRecord {
    /// Builds the record for `mask`, clamping every point (and handle) into the image.
    ///
    /// `pixels_per_meter` adds the metric area to the stored measurements.
    pub fn from_mask(
        mask: &Mask,
        photo_id: &str,
        img_w: u32,
        img_h: u32,
        pixels_per_meter: Option<f64>,
    ) -> Result<Self> {
        let points: Vec<MaskPoint> = mask
            .points
            .iter()
            .map(|p| p.map(|q| clamp_to_image(q, img_w, img_h)))
            .collect();
        let area_px = mask.area_px();
        let meta = CalcMeta {
            name: mask.name.clone(),
            is_visible: mask.is_visible,
            is_locked: mask.is_locked,
            group_id: mask.group_id.clone(),
            order: mask.order,
            effect_settings: mask.effect_settings.clone(),
            area_px,
            perimeter_px: mask.perimeter_px(),
            area_m2: pixels_per_meter
                .filter(|ppm| *ppm > 0.0)
                .map(|ppm| area_px / (ppm * ppm)),
        };
        Ok(Self {
            id: mask.id.clone(),
            photo_id: photo_id.to_string(),
            path_json: serde_json::to_string(&points)?,
            material_id: mask.material_id.clone(),
            calc_meta_json: serde_json::to_string(&meta)?,
            depth_level: mask.depth_level,
            elevation_m: format!("{:.3}", mask.elevation_m),
            z_index: mask.z_index,
            is_stepped: mask.is_stepped,
        })
    }

    pub fn calc_meta(&self) -> Result<CalcMeta> {
        Ok(serde_json::from_str(&self.calc_meta_json)?)
    }

    /// Rebuilds the editor mask. The revision is left at 0 for the store to assign.
    pub fn to_mask(&self) -> Result<Mask> {
        let points: Vec<MaskPoint> = serde_json::from_str(&self.path_json)?;
        let meta = self.calc_meta()?;
        let elevation_m = self.elevation_m.trim().parse::<f64>().map_err(|e| {
            Error::other(format!(
                "Invalid elevation '{}' on mask {}: {}",
                self.elevation_m, self.id, e
            ))
        })?;

        let mut mask = Mask::new(self.id.clone(), meta.name, points);
        mask.is_visible = meta.is_visible;
        mask.is_locked = meta.is_locked;
        mask.group_id = meta.group_id;
        mask.order = meta.order;
        mask.effect_settings = meta.effect_settings;
        mask.material_id = self.material_id.clone();
        mask.depth_level = self.depth_level;
        mask.elevation_m = elevation_m;
        mask.z_index = self.z_index;
        mask.is_stepped = self.is_stepped;
        Ok(mask)
    }
}

/// A photo with its masks, groups and calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    pub version: String,
    pub photo_id: String,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub calibration: Option<Calibration>,
    #[serde(default)]
    pub groups: Vec<MaskGroup>,
    #[serde(default)]
    pub masks: Vec<MaskRecord>,
    pub modified: DateTime<Utc>,
}

impl SceneFile {
    pub fn new(photo_id: impl Into<String>, image_width: u32, image_height: u32) -> Self {
        Self {
            version: SCENE_FORMAT_VERSION.to_string(),
            photo_id: photo_id.into(),
            image_width,
            image_height,
            calibration: None,
            groups: Vec::new(),
            masks: Vec::new(),
            modified: Utc::now(),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scene: SceneFile = serde_json::from_str(&content)?;
        debug!(
            "Loaded scene {} with {} masks from {}",
            scene.photo_id,
            scene.masks.len(),
            path.display()
        );
        Ok(scene)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Decodes every mask record.
    pub fn to_masks(&self) -> Result<Vec<Mask>> {
        self.masks.iter().map(MaskRecord::to_mask).collect()
    }
}

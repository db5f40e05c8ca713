//! Mask data model.
//!
//! A mask is a closed outline in image space with optional bezier handles,
//! plus the material and effect settings that decide how it is composited.

mod effect;
pub mod geometry;
mod point;

pub use effect::{EffectSettings, UnderwaterVersion};
pub use geometry::Segment;
pub use point::{MaskPoint, PointKind};

use poolviz_core::constants::MIN_POLYGON_POINTS;
use poolviz_core::{Bounds, Point};
use serde::{Deserialize, Serialize};

/// A user-drawn region of the photo.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub id: String,
    pub name: String,
    pub points: Vec<MaskPoint>,
    pub is_visible: bool,
    pub is_locked: bool,
    pub group_id: Option<String>,
    pub order: i32,
    pub material_id: Option<String>,
    pub effect_settings: Option<EffectSettings>,
    pub depth_level: i32,
    pub elevation_m: f64,
    pub z_index: i32,
    pub is_stepped: bool,
    /// Bumped from a store-wide counter on every geometry or effect change.
    pub revision: u64,
}

impl Mask {
    /// Creates a visible, unlocked mask with no material.
    pub fn new(id: impl Into<String>, name: impl Into<String>, points: Vec<MaskPoint>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            points,
            is_visible: true,
            is_locked: false,
            group_id: None,
            order: 0,
            material_id: None,
            effect_settings: None,
            depth_level: 0,
            elevation_m: 0.0,
            z_index: 0,
            is_stepped: false,
            revision: 0,
        }
    }

    /// True when the mask has enough points to fill.
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= MIN_POLYGON_POINTS
    }

    /// Effect settings, or defaults when none were assigned.
    pub fn effects(&self) -> EffectSettings {
        self.effect_settings.clone().unwrap_or_default()
    }

    pub fn segments(&self) -> Vec<Segment> {
        geometry::segments(&self.points)
    }

    /// Flattened image-space outline.
    pub fn outline(&self) -> Vec<Point> {
        geometry::flatten(&self.points, geometry::FLATTEN_TOLERANCE)
    }

    /// Area in square image pixels.
    pub fn area_px(&self) -> f64 {
        geometry::area(&self.outline())
    }

    /// Perimeter in image pixels.
    pub fn perimeter_px(&self) -> f64 {
        geometry::perimeter(&self.outline())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.outline())
    }

    pub fn centroid(&self) -> Option<Point> {
        geometry::centroid(&self.outline())
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.is_renderable() && geometry::contains(&self.outline(), p)
    }

    /// Index of the vertex nearest to `p` within `tolerance`.
    pub fn vertex_at(&self, p: &Point, tolerance: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.position().distance_to(p)))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    pub(crate) fn translate(&mut self, dx: f64, dy: f64) {
        self.points = self
            .points
            .iter()
            .map(|p| p.map(|q| q.translated(dx, dy)))
            .collect();
    }

    pub(crate) fn rotate(&mut self, degrees: f64) {
        let Some(center) = self.centroid() else {
            return;
        };
        let radians = degrees.to_radians();
        self.points = self
            .points
            .iter()
            .map(|p| p.map(|q| q.rotated_about(&center, radians)))
            .collect();
    }
}

/// Organizational folder for masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskGroup {
    pub id: String,
    pub name: String,
    pub order: i32,
    #[serde(default)]
    pub is_collapsed: bool,
}

impl MaskGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
            is_collapsed: false,
        }
    }
}

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use poolviz_core::Hsv;
use serde::{Deserialize, Serialize};

/// Which compositing recipe a mask uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderwaterVersion {
    /// Pattern plus a single capped tint pass.
    Legacy,
    /// The seven-stage layered recipe.
    #[default]
    Staged,
}

/// Per-mask effect sliders, each an integer in 0..=100.
///
/// Values above 100 are accepted on input and treated as 100 by
/// [`EffectSettings::normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectSettings {
    pub blend: u8,
    pub depth_bias: u8,
    pub tint: u8,
    pub edge_feather: u8,
    pub highlights: u8,
    pub ripple: u8,
    pub meniscus: u8,
    pub material_opacity: u8,
    pub contact_occlusion: u8,
    pub softness: u8,
    pub tile_scale: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampled_water_hue: Option<Hsv>,
    pub underwater_version: UnderwaterVersion,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            blend: 60,
            depth_bias: 30,
            tint: 35,
            edge_feather: 40,
            highlights: 50,
            ripple: 20,
            meniscus: 30,
            material_opacity: 85,
            contact_occlusion: 35,
            softness: 10,
            tile_scale: 50,
            sampled_water_hue: None,
            underwater_version: UnderwaterVersion::Staged,
        }
    }
}

impl EffectSettings {
    /// Maps a 0-100 slider to [0, 1].
    pub fn normalized(value: u8) -> f32 {
        value.min(100) as f32 / 100.0
    }

    /// Tile scale multiplier; the slider midpoint (50) is 1.0.
    pub fn tile_scale_factor(&self) -> f64 {
        self.tile_scale.clamp(1, 100) as f64 / 50.0
    }

    /// Fingerprint over every field that affects rendered output.
    ///
    /// Consistent within one process only; use it for in-memory cache keys,
    /// never for anything persisted.
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        [
            self.blend,
            self.depth_bias,
            self.tint,
            self.edge_feather,
            self.highlights,
            self.ripple,
            self.meniscus,
            self.material_opacity,
            self.contact_occlusion,
            self.softness,
            self.tile_scale,
        ]
        .hash(&mut hasher);
        if let Some(hue) = self.sampled_water_hue {
            hue.h.to_bits().hash(&mut hasher);
            hue.s.to_bits().hash(&mut hasher);
            hue.v.to_bits().hash(&mut hasher);
        }
        self.underwater_version.hash(&mut hasher);
        hasher.finish()
    }
}

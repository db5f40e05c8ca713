//! Engine configuration
//!
//! Every tunable of the engine lives here, grouped by subsystem. Configuration
//! can be loaded from and saved to `.json` or `.toml` files; missing sections
//! fall back to their defaults.

use crate::constants;
use crate::error::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Camera zoom behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    /// Percentage points per zoom click
    pub step_percent: i32,
    /// Percentage points per fast scroll gesture
    pub fast_step_percent: i32,
    /// Lowest allowed zoom
    pub min_percent: i32,
    /// Highest allowed zoom
    pub max_percent: i32,
    /// Snap-to-100% window
    pub snap_percent: i32,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            step_percent: constants::ZOOM_STEP_PERCENT,
            fast_step_percent: constants::ZOOM_FAST_STEP_PERCENT,
            min_percent: constants::ZOOM_MIN_PERCENT,
            max_percent: constants::ZOOM_MAX_PERCENT,
            snap_percent: constants::ZOOM_SNAP_PERCENT,
        }
    }
}

/// Caps and strengths of the underwater compositing recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositingSettings {
    /// Hard ceiling on applied tint strength
    pub tint_ceiling: f32,
    /// Cap on highlight restoration alpha
    pub highlight_cap: f32,
    /// Luma threshold for highlight detection
    pub highlight_luma_threshold: u8,
    /// Cap on ripple strength
    pub ripple_cap: f32,
    /// Maximum contact occlusion darkening
    pub occlusion_max: f32,
    /// Number of edge feather strokes
    pub feather_passes: u32,
    /// Width of the first feather stroke in CSS pixels
    pub feather_base_width: f32,
    /// Maximum darkening contributed by depth bias
    pub depth_bias_max: f32,
    /// Placeholder fill colour (RGBA)
    pub placeholder_rgba: [u8; 4],
}

impl Default for CompositingSettings {
    fn default() -> Self {
        Self {
            tint_ceiling: constants::TINT_CEILING,
            highlight_cap: constants::HIGHLIGHT_ADDITIVE_CAP,
            highlight_luma_threshold: constants::HIGHLIGHT_LUMA_THRESHOLD,
            ripple_cap: constants::RIPPLE_CAP,
            occlusion_max: constants::OCCLUSION_MAX,
            feather_passes: constants::FEATHER_PASSES,
            feather_base_width: constants::FEATHER_BASE_WIDTH,
            depth_bias_max: constants::DEPTH_BIAS_MAX,
            placeholder_rgba: constants::PLACEHOLDER_RGBA,
        }
    }
}

/// Pattern cache sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// LRU capacity in entries
    pub capacity: usize,
    /// Smallest tile edge in pixels
    pub min_tile_px: u32,
    /// Largest tile edge in pixels
    pub max_tile_px: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: constants::PATTERN_CACHE_CAPACITY,
            min_tile_px: constants::MIN_TILE_PX,
            max_tile_px: constants::MAX_TILE_PX,
        }
    }
}

/// Undo history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of undo snapshots kept
    pub max_depth: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_depth: constants::HISTORY_MAX_DEPTH,
        }
    }
}

/// Calibration fallbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Scene width assumed by the heuristic pixels-per-meter estimate
    pub heuristic_scene_width_m: f64,
    /// Pixel distances below this count as coincident
    pub min_pixel_distance: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            heuristic_scene_width_m: constants::HEURISTIC_SCENE_WIDTH_M,
            min_pixel_distance: constants::MIN_CALIBRATION_PIXELS,
        }
    }
}

/// Drawing tool behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Minimum spacing between freehand samples (image pixels)
    pub freehand_min_spacing: f64,
    /// Vertex hit tolerance (image pixels)
    pub handle_hit_tolerance: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            freehand_min_spacing: constants::FREEHAND_MIN_SPACING,
            handle_hit_tolerance: constants::HANDLE_HIT_TOLERANCE,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Camera zoom behaviour
    pub zoom: ZoomSettings,
    /// Compositing caps
    pub compositing: CompositingSettings,
    /// Pattern cache sizing
    pub cache: CacheSettings,
    /// Undo history
    pub history: HistorySettings,
    /// Calibration fallbacks
    pub calibration: CalibrationSettings,
    /// Drawing tools
    pub tools: ToolSettings,
}

impl EngineConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        config.validate()?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let zoom = &self.zoom;
        if zoom.step_percent <= 0 || zoom.fast_step_percent <= 0 {
            return Err(invalid("zoom.step_percent", "zoom steps must be > 0"));
        }
        if zoom.min_percent <= 0 || zoom.min_percent >= zoom.max_percent {
            return Err(invalid(
                "zoom.min_percent",
                "min zoom must be > 0 and below max zoom",
            ));
        }
        if !(zoom.min_percent..=zoom.max_percent).contains(&100) {
            return Err(invalid("zoom.max_percent", "zoom range must include 100%"));
        }
        if zoom.snap_percent < 0 || zoom.snap_percent >= zoom.step_percent {
            return Err(invalid(
                "zoom.snap_percent",
                "snap window must be >= 0 and smaller than one zoom step",
            ));
        }

        let c = &self.compositing;
        for (key, value) in [
            ("compositing.tint_ceiling", c.tint_ceiling),
            ("compositing.highlight_cap", c.highlight_cap),
            ("compositing.ripple_cap", c.ripple_cap),
            ("compositing.occlusion_max", c.occlusion_max),
            ("compositing.depth_bias_max", c.depth_bias_max),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(key, "must be within [0, 1]"));
            }
        }
        if c.feather_base_width < 0.0 || !c.feather_base_width.is_finite() {
            return Err(invalid("compositing.feather_base_width", "must be >= 0"));
        }

        if self.cache.capacity == 0 {
            return Err(invalid("cache.capacity", "must be > 0"));
        }
        if self.cache.min_tile_px == 0 || self.cache.min_tile_px > self.cache.max_tile_px {
            return Err(invalid(
                "cache.min_tile_px",
                "must be > 0 and not above max_tile_px",
            ));
        }

        if self.history.max_depth == 0 {
            return Err(invalid("history.max_depth", "must be > 0"));
        }

        if self.calibration.heuristic_scene_width_m <= 0.0 {
            return Err(invalid(
                "calibration.heuristic_scene_width_m",
                "must be > 0",
            ));
        }
        if self.calibration.min_pixel_distance < 0.0 {
            return Err(invalid("calibration.min_pixel_distance", "must be >= 0"));
        }

        if self.tools.freehand_min_spacing < 0.0 || self.tools.handle_hit_tolerance < 0.0 {
            return Err(invalid("tools", "tolerances must be >= 0"));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> Error {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

//! Default values for the engine's tunables.
//!
//! The compositing caps are empirical: they are kept as named defaults and
//! surfaced through [`crate::config::CompositingSettings`] rather than derived.

/// Minimum number of points for a mask to form a fill.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Zoom step per click, in whole percentage points of the fit scale.
pub const ZOOM_STEP_PERCENT: i32 = 10;
/// Zoom step for fast scroll gestures.
pub const ZOOM_FAST_STEP_PERCENT: i32 = 20;
/// Lower zoom bound.
pub const ZOOM_MIN_PERCENT: i32 = 10;
/// Upper zoom bound.
pub const ZOOM_MAX_PERCENT: i32 = 500;
/// Distance from 100% within which zoom snaps to exactly 100%.
pub const ZOOM_SNAP_PERCENT: i32 = 5;

/// Relative tolerance used when comparing the camera scale to the fit scale.
pub const BASELINE_EPSILON: f64 = 1e-9;

/// Pixel distances below this are treated as coincident.
pub const MIN_CALIBRATION_PIXELS: f64 = 1e-3;
/// Scene width assumed when no calibration exists.
pub const HEURISTIC_SCENE_WIDTH_M: f64 = 12.0;

/// Maximum applied tint strength regardless of the slider.
pub const TINT_CEILING: f32 = 0.40;
/// Maximum additive alpha of highlight restoration.
pub const HIGHLIGHT_ADDITIVE_CAP: f32 = 0.25;
/// Luminance (0-255) above which a photo pixel counts as a highlight.
pub const HIGHLIGHT_LUMA_THRESHOLD: u8 = 200;
/// Maximum ripple strength.
pub const RIPPLE_CAP: f32 = 0.08;
/// Maximum darkening of the contact occlusion gradient.
pub const OCCLUSION_MAX: f32 = 0.45;
/// Number of inner-shadow strokes of the edge feather stage.
pub const FEATHER_PASSES: u32 = 3;
/// Base feather stroke width in CSS pixels.
pub const FEATHER_BASE_WIDTH: f32 = 2.0;
/// Maximum darkening applied by `depth_bias` at the deepest level.
pub const DEPTH_BIAS_MAX: f32 = 0.25;

/// Placeholder fill (RGBA) for masks without a usable pattern.
pub const PLACEHOLDER_RGBA: [u8; 4] = [150, 150, 150, 110];

/// Default LRU capacity of the pattern cache (entries).
pub const PATTERN_CACHE_CAPACITY: usize = 48;
/// Smallest rasterized tile edge in pixels.
pub const MIN_TILE_PX: u32 = 8;
/// Largest rasterized tile edge in pixels.
pub const MAX_TILE_PX: u32 = 2048;

/// Default undo depth.
pub const HISTORY_MAX_DEPTH: usize = 100;

/// Minimum spacing between freehand samples, in image pixels.
pub const FREEHAND_MIN_SPACING: f64 = 3.0;
/// Hit-test tolerance for vertex handles, in image pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 6.0;

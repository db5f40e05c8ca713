//! Error handling for PoolViz
//!
//! Provides error types for every layer of the engine:
//! - Geometry errors (point counts, degenerate distances, non-finite input)
//! - Precondition errors (locked masks, calibration off the 100% baseline)
//! - Asset errors (material lookup, texture loading)
//! - Configuration errors
//!
//! All error types use `thiserror` for ergonomic error handling. Nothing in the
//! engine treats these as fatal: every failure path leaves state unchanged or
//! degrades to a placeholder.

use thiserror::Error;

/// Geometry error type
///
/// Raised when user input cannot form valid geometry. State is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Too few points to form a polygon
    #[error("A mask needs at least {min} points, got {count}")]
    InvalidPointCount {
        /// The number of points supplied.
        count: usize,
        /// The minimum number of points required.
        min: usize,
    },

    /// A coordinate was NaN or infinite
    #[error("Coordinate ({x}, {y}) is not a finite number")]
    NonFiniteCoordinate {
        /// The offending x value.
        x: f64,
        /// The offending y value.
        y: f64,
    },

    /// Two reference points are (nearly) coincident
    #[error("Reference points are too close together ({distance:.3}px); place them further apart")]
    DegenerateDistance {
        /// The measured pixel distance.
        distance: f64,
    },

    /// A real-world length was zero, negative or not finite
    #[error("Reference length must be a positive number of meters, got {length}")]
    NonPositiveLength {
        /// The rejected length.
        length: f64,
    },

    /// A pixel measurement was zero, negative or not finite
    #[error("Reference pixel distance must be positive, got {pixels}")]
    NonPositivePixels {
        /// The rejected pixel distance.
        pixels: f64,
    },

    /// A vertex index was outside the mask's point list
    #[error("Point index {index} out of range for a mask with {len} points")]
    PointIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of points in the mask.
        len: usize,
    },

    /// The image has no usable dimensions
    #[error("Image dimensions {width}x{height} are invalid")]
    InvalidImageSize {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
}

/// Precondition error type
///
/// Raised synchronously when an operation is not allowed in the current state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    /// Calibration requires the camera at the 100% baseline
    #[error("Calibration is only possible at 100% zoom (currently {zoom_percent}%); press Fit first")]
    NotAtBaseline {
        /// The displayed zoom percentage at the time of the request.
        zoom_percent: i32,
    },

    /// The mask is locked against geometry changes and deletion
    #[error("Mask '{id}' is locked; unlock it before editing or deleting")]
    MaskLocked {
        /// The locked mask id.
        id: String,
    },

    /// No mask with this id exists
    #[error("Mask '{id}' not found")]
    MaskNotFound {
        /// The requested mask id.
        id: String,
    },

    /// No group with this id exists
    #[error("Group '{id}' not found")]
    GroupNotFound {
        /// The requested group id.
        id: String,
    },

    /// Group names must not be blank
    #[error("Group name must not be empty")]
    EmptyGroupName,

    /// Group names must be unique
    #[error("A group named '{name}' already exists")]
    DuplicateGroupName {
        /// The conflicting name.
        name: String,
    },

    /// No photo has been loaded yet
    #[error("No photo loaded")]
    NoPhotoLoaded,

    /// The calibration tool has not collected both points
    #[error("Calibration needs exactly two points, {placed} placed")]
    CalibrationPointsMissing {
        /// The number of points currently placed.
        placed: usize,
    },
}

/// Asset error type
///
/// Asset errors are recorded (for example as a cache entry in `error` state) and
/// never propagate out of the renderer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// Material id not present in the catalog
    #[error("Material '{id}' not found in catalog")]
    MaterialNotFound {
        /// The requested material id.
        id: String,
    },

    /// Texture source could not be read
    #[error("Failed to load texture '{url}': {reason}")]
    LoadFailed {
        /// The texture URL or path.
        url: String,
        /// The reason the load failed.
        reason: String,
    },

    /// Texture bytes could not be decoded
    #[error("Failed to decode texture '{url}': {reason}")]
    DecodeFailed {
        /// The texture URL or path.
        url: String,
        /// The reason decoding failed.
        reason: String,
    },

    /// An exported image could not be written
    #[error("Failed to write image '{path}': {reason}")]
    EncodeFailed {
        /// The destination path.
        path: String,
        /// The reason encoding or writing failed.
        reason: String,
    },

    /// The rasterized surface could not be allocated
    #[error("Cannot allocate a {width}x{height} surface")]
    SurfaceAllocation {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The file extension is neither `.json` nor `.toml`
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// The dotted key of the setting.
        key: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// The file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Main error type for PoolViz
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Precondition error
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Asset error
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a geometry (validation) error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a precondition error
    pub fn is_precondition_error(&self) -> bool {
        matches!(self, Error::Precondition(_))
    }

    /// Check if this error was caused by a locked mask
    pub fn is_locked(&self) -> bool {
        matches!(self, Error::Precondition(PreconditionError::MaskLocked { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

//! # PoolViz Core
//!
//! Core types, errors, and configuration shared by the PoolViz editor and
//! renderer crates.
//!
//! - [`error`]: the error taxonomy (geometry, precondition, asset, config)
//! - [`constants`]: default values for every tunable of the engine
//! - [`config`]: [`EngineConfig`], loadable from JSON or TOML
//! - [`types`]: small value types (`Point`, `Bounds`, `Hsv`) used everywhere

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{
    CacheSettings, CalibrationSettings, CompositingSettings, EngineConfig, HistorySettings,
    ToolSettings, ZoomSettings,
};
pub use error::{AssetError, ConfigError, Error, GeometryError, PreconditionError, Result};
pub use types::{Bounds, Hsv, Point};

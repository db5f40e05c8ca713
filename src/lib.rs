//! # PoolViz
//!
//! Photo mask editing and underwater material compositing.
//!
//! ## Architecture
//!
//! PoolViz is organized as a workspace with multiple crates:
//!
//! 1. **poolviz-core** - Errors, tunable constants, engine configuration, value types
//! 2. **poolviz-editor** - Coordinates, camera, masks, history, tools, calibration, persistence
//! 3. **poolviz-render** - Material patterns, compositing pipeline, live view, export
//! 4. **poolviz** - Logging setup and the headless `poolviz` command line tool
//!
//! ## Features
//!
//! - **Exact coordinates**: screen ↔ image mapping that survives any zoom, pan or DPR
//! - **Mask editing**: polygons with bezier handles, groups, locking and bounded undo/redo
//! - **Calibration**: pixels-per-meter from a reference measurement, areas in m²
//! - **Underwater compositing**: seven-stage layered recipe plus the legacy recipe
//! - **Export**: full-resolution PNG with no editing overlay

pub mod commands;

pub use poolviz_core::{EngineConfig, Error, Result};
pub use poolviz_editor::{EditorAction, EditorEvent, EditorState, Mask, MaskAction, SceneFile};
pub use poolviz_render::{ExportRenderer, LiveView, MaterialPatternCache, SceneRenderer};

pub use poolviz_editor as editor;
pub use poolviz_render as render;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date, `YYYY-MM-DD` (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Cargo profile the library was built with
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

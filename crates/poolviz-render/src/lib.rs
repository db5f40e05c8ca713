//! # PoolViz Render
//!
//! Turns masks plus materials into pixels.
//!
//! - [`material`]: material catalog, texture loading and photo sources
//! - [`pattern_cache`]: shared, bounded cache of rasterized material tiles
//! - [`pipeline`]: the per-mask compositing recipes and their stages
//! - [`color`]: water hue sampling for the tint stage
//! - [`scene`]: [`SceneRenderer`], shared by the live view and export
//! - [`composite_cache`] and [`worker`]: per-mask composite reuse and off-thread blending
//! - [`view`]: the live view with its editing overlay
//! - [`export`]: full-resolution export
//!
//! ## Usage
//!
//! ```rust,ignore
//! let patterns = Arc::new(MaterialPatternCache::new(loader, config.cache.clone()));
//! let renderer = SceneRenderer::new(catalog, patterns, config.compositing.clone());
//! ExportRenderer::new(&renderer)
//!     .save_png(&photo, &editor.store().render_order(), ppm, Path::new("out.png"))
//!     .await?;
//! ```

pub mod color;
pub mod composite_cache;
pub mod export;
pub mod material;
pub mod pattern_cache;
pub mod pipeline;
pub mod scene;
pub mod view;
pub mod worker;

pub use color::sample_water_hue;
pub use composite_cache::{BlendResult, CompositeCache};
pub use export::ExportRenderer;
pub use material::{
    DirectoryImageSource, FsTextureLoader, ImageSource, InMemoryCatalog, Material,
    MaterialCatalog, TextureLoader,
};
pub use pattern_cache::{
    CacheStats, MaterialPattern, MaterialPatternCache, PatternKey, PatternLookup, PatternParams,
    PatternStatus,
};
pub use pipeline::{
    render_mask, render_mask_over, MaskComposite, RenderView, Stage, ViewTransform,
};
pub use scene::{PatternSet, SceneRenderer};
pub use view::{pixmap_from_rgba, rgba_from_pixmap, LiveView};
pub use worker::{BlendJob, BlendTask, BlendWorker};

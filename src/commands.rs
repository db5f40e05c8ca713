//! Headless operations behind the `poolviz` command line tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use poolviz_core::EngineConfig;
use poolviz_editor::{CalibrationEngine, MaskStore, SceneFile};
use poolviz_render::{
    pixmap_from_rgba, DirectoryImageSource, ExportRenderer, FsTextureLoader, ImageSource,
    InMemoryCatalog, MaterialPatternCache, SceneRenderer,
};
use serde::Serialize;
use tracing::{info, warn};

/// Inputs of a scene export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Photo file, or a directory holding `<photo_id>.<ext>`.
    pub photo: PathBuf,
    pub scene: PathBuf,
    pub materials: PathBuf,
    pub out: PathBuf,
    /// Root for relative texture URLs; defaults to the directory of `materials`.
    pub textures: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Loads `path` or falls back to defaults, then validates.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn calibration_for(scene: &SceneFile, config: &EngineConfig) -> CalibrationEngine {
    let mut engine = CalibrationEngine::new(config.calibration.clone());
    if let Some(calibration) = scene.calibration.clone() {
        engine.restore(calibration);
    }
    engine
}

/// Pixels per meter of the scene's photo; the heuristic when uncalibrated.
pub fn scene_pixels_per_meter(scene: &SceneFile, config: &EngineConfig) -> f64 {
    calibration_for(scene, config).pixels_per_meter(scene.image_width)
}

/// Composites the scene over the photo and writes a PNG.
pub async fn export(options: &ExportOptions) -> anyhow::Result<()> {
    let config = load_config(options.config.as_deref())?;
    let scene = SceneFile::load_from_file(&options.scene)
        .with_context(|| format!("loading scene {}", options.scene.display()))?;

    let photo_path = if options.photo.is_dir() {
        match DirectoryImageSource::new(&options.photo).resolve(&scene.photo_id) {
            Some(found) => PathBuf::from(found),
            None => bail!(
                "no photo for {} in {}",
                scene.photo_id,
                options.photo.display()
            ),
        }
    } else {
        options.photo.clone()
    };
    let decoded = image::open(&photo_path)
        .with_context(|| format!("opening photo {}", photo_path.display()))?
        .to_rgba8();
    if (decoded.width(), decoded.height()) != (scene.image_width, scene.image_height) {
        warn!(
            "Photo is {}x{} but the scene was drawn on {}x{}",
            decoded.width(),
            decoded.height(),
            scene.image_width,
            scene.image_height
        );
    }
    let Some(photo) = pixmap_from_rgba(&decoded) else {
        bail!("photo {} is empty", photo_path.display());
    };

    let catalog = InMemoryCatalog::load_from_file(&options.materials)
        .with_context(|| format!("loading materials {}", options.materials.display()))?;
    let texture_root = options.textures.clone().unwrap_or_else(|| {
        options
            .materials
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });
    let patterns = Arc::new(MaterialPatternCache::new(
        Arc::new(FsTextureLoader::new(texture_root)),
        config.cache.clone(),
    ));
    let renderer = SceneRenderer::new(Arc::new(catalog), patterns, config.compositing.clone());

    let mut store = MaskStore::new(config.history.max_depth);
    store.load(scene.to_masks()?, scene.groups.clone());
    let masks = store.render_order();
    let ppm = scene_pixels_per_meter(&scene, &config);
    info!(
        "Exporting {} visible masks of {} at {:.2} px/m",
        masks.len(),
        scene.photo_id,
        ppm
    );

    ExportRenderer::new(&renderer)
        .save_png(&photo, &masks, ppm, &options.out)
        .await?;
    Ok(())
}

/// Measured size of one mask.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskMeasurement {
    pub id: String,
    pub name: String,
    pub area_px: f64,
    pub area_m2: f64,
    pub perimeter_m: f64,
}

/// Areas and perimeters of every mask in the scene, in storage order.
pub fn measure(scene: &SceneFile, config: &EngineConfig) -> anyhow::Result<Vec<MaskMeasurement>> {
    let calibration = calibration_for(scene, config);
    let img_w = scene.image_width;
    Ok(scene
        .to_masks()?
        .iter()
        .map(|mask| MaskMeasurement {
            id: mask.id.clone(),
            name: mask.name.clone(),
            area_px: mask.area_px(),
            area_m2: calibration.area_m2(mask, img_w),
            perimeter_m: calibration.perimeter_m(mask, img_w),
        })
        .collect())
}

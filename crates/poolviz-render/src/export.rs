//! Full-resolution export.

use std::path::Path;
use std::time::Instant;

use image::RgbaImage;
use poolviz_core::{AssetError, Result};
use poolviz_editor::Mask;
use tiny_skia::{Pixmap, PixmapPaint, Transform};
use tracing::info;

use crate::pipeline::RenderView;
use crate::scene::SceneRenderer;
use crate::view::rgba_from_pixmap;

/// Renders a scene at the photo's native resolution, without overlay.
pub struct ExportRenderer<'a> {
    renderer: &'a SceneRenderer,
}

impl<'a> ExportRenderer<'a> {
    pub fn new(renderer: &'a SceneRenderer) -> Self {
        Self { renderer }
    }

    /// Composites `masks` (bottom first) over `photo`.
    ///
    /// Waits for every mask's pattern before drawing. Masks whose pattern
    /// failed get the placeholder fill.
    pub async fn render(
        &self,
        photo: &Pixmap,
        masks: &[&Mask],
        pixels_per_meter: f64,
    ) -> Result<Pixmap> {
        let started = Instant::now();
        let mut surface =
            Pixmap::new(photo.width(), photo.height()).ok_or(AssetError::SurfaceAllocation {
                width: photo.width(),
                height: photo.height(),
            })?;
        surface.draw_pixmap(
            0,
            0,
            photo.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        let view = RenderView::export(pixels_per_meter);
        let patterns = self.renderer.resolve_all(masks, pixels_per_meter).await;
        self.renderer
            .render_masks(&mut surface, masks, &patterns, &view, None, 0);

        info!(
            "Exported {}x{} with {} masks in {:?}",
            surface.width(),
            surface.height(),
            masks.len(),
            started.elapsed()
        );
        Ok(surface)
    }

    pub async fn to_rgba_image(
        &self,
        photo: &Pixmap,
        masks: &[&Mask],
        pixels_per_meter: f64,
    ) -> Result<RgbaImage> {
        let surface = self.render(photo, masks, pixels_per_meter).await?;
        Ok(rgba_from_pixmap(&surface))
    }

    pub async fn save_png(
        &self,
        photo: &Pixmap,
        masks: &[&Mask],
        pixels_per_meter: f64,
        path: &Path,
    ) -> Result<()> {
        let image = self.to_rgba_image(photo, masks, pixels_per_meter).await?;
        image.save(path).map_err(|e| AssetError::EncodeFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Saved export to {}", path.display());
        Ok(())
    }
}

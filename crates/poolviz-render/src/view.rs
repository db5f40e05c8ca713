//! Live view rendering.
//!
//! Draws the photo through the camera, the composited masks, and the editing
//! overlay (outlines, vertex handles of the selected mask, the draft outline
//! and calibration markers). Export never draws the overlay.

use image::RgbaImage;
use poolviz_core::Point;
use poolviz_editor::{EditorState, Mask, MaskPoint};
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};
use tracing::debug;

use crate::composite_cache::{base_signature, CompositeCache};
use crate::pipeline::{outline_path, RenderView, ViewTransform};
use crate::scene::SceneRenderer;
use crate::worker::{BlendJob, BlendTask, BlendWorker};

const HANDLE_SIZE: f32 = 8.0;

fn bg_color() -> Color {
    Color::from_rgba8(32, 36, 40, 255)
}
fn outline_color() -> Color {
    Color::from_rgba8(52, 152, 219, 255)
}
fn selection_color() -> Color {
    Color::from_rgba8(255, 235, 59, 255)
}
fn draft_color() -> Color {
    Color::from_rgba8(46, 204, 113, 255)
}
fn calibration_color() -> Color {
    Color::from_rgba8(231, 76, 60, 255)
}

/// Converts straight-alpha RGBA to a premultiplied pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Converts a pixmap back to straight-alpha RGBA.
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    image
}

/// The interactive view of one photo.
pub struct LiveView {
    photo: Pixmap,
    photo_revision: u64,
    cache: CompositeCache,
}

impl LiveView {
    pub fn new(photo: Pixmap) -> Self {
        Self {
            photo,
            photo_revision: 0,
            cache: CompositeCache::new(),
        }
    }

    pub fn photo(&self) -> &Pixmap {
        &self.photo
    }

    pub fn cache(&self) -> &CompositeCache {
        &self.cache
    }

    /// Replaces the photo; every cached composite becomes stale.
    pub fn set_photo(&mut self, photo: Pixmap) {
        self.photo = photo;
        self.photo_revision += 1;
        self.cache.clear();
    }

    /// Camera mapping of the editor's loaded photo.
    pub fn view_for(&self, editor: &EditorState) -> Option<RenderView> {
        let photo = editor.photo()?;
        Some(RenderView {
            transform: ViewTransform::from_camera(&photo.camera()),
            dpr: photo.dpr() as f32,
            pixels_per_meter: editor.pixels_per_meter()?,
        })
    }

    fn surface(&self, editor: &EditorState, view: &RenderView) -> Option<Pixmap> {
        let (w, h) = editor.photo()?.device_size();
        let mut surface = Pixmap::new(w.round().max(1.0) as u32, h.round().max(1.0) as u32)?;
        surface.fill(bg_color());
        surface.draw_pixmap(
            0,
            0,
            self.photo.as_ref(),
            &PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            },
            view.transform.to_skia(),
            None,
        );
        Some(surface)
    }

    fn base_signature(&self, surface: &Pixmap, view: &RenderView) -> u64 {
        base_signature(self.photo_revision, surface.width(), surface.height(), view)
    }

    /// Renders a full frame, compositing every stale mask inline.
    ///
    /// Returns `None` when no photo is loaded in the editor.
    pub fn render_frame(&self, editor: &EditorState, renderer: &SceneRenderer) -> Option<Pixmap> {
        let view = self.view_for(editor)?;
        let mut surface = self.surface(editor, &view)?;
        let masks = editor.store().render_order();
        let patterns = renderer.lookup_all(&masks, view.pixels_per_meter);
        let base = self.base_signature(&surface, &view);
        let rendered =
            renderer.render_masks(&mut surface, &masks, &patterns, &view, Some(&self.cache), base);
        if rendered > 0 {
            debug!("Frame recomposited {} of {} masks", rendered, masks.len());
        }
        self.cache.retain_masks(masks.iter().map(|m| m.id.as_str()));
        draw_overlay(&mut surface, editor, &view);
        Some(surface)
    }

    /// Renders a frame without blocking on compositing.
    ///
    /// Masks up to the first stale one are drawn from the cache. The stale
    /// suffix is handed to `worker`, and until its results are merged the
    /// last known composite of each of those masks is drawn instead.
    pub fn render_frame_deferred(
        &self,
        editor: &EditorState,
        renderer: &SceneRenderer,
        worker: &mut BlendWorker,
    ) -> Option<Pixmap> {
        let view = self.view_for(editor)?;
        let mut surface = self.surface(editor, &view)?;
        let masks = editor.store().render_order();
        let patterns = renderer.lookup_all(&masks, view.pixels_per_meter);
        let base = self.base_signature(&surface, &view);
        let signatures = renderer.signatures(&masks, &patterns, &view, base);

        let mut stale_from = None;
        for (index, (mask, signature)) in masks.iter().zip(&signatures).enumerate() {
            match self.cache.get(&mask.id, *signature) {
                Some(hit) => {
                    if let Some(composite) = hit {
                        composite.draw_onto(&mut surface);
                    }
                }
                None => {
                    stale_from = Some(index);
                    break;
                }
            }
        }

        if let Some((start, photo)) = stale_from.zip(self.surface(editor, &view)) {
            let tasks = masks[start..]
                .iter()
                .zip(&signatures[start..])
                .map(|(mask, signature)| BlendTask {
                    mask: (*mask).clone(),
                    pattern: patterns.get(&mask.id).cloned(),
                    signature: *signature,
                })
                .collect();
            worker.submit(BlendJob {
                base: surface.clone(),
                photo,
                tasks,
                view,
                settings: renderer.settings().clone(),
            });
            for mask in &masks[start..] {
                if let Some(composite) = self.cache.latest(&mask.id) {
                    composite.draw_onto(&mut surface);
                }
            }
        }

        draw_overlay(&mut surface, editor, &view);
        Some(surface)
    }

    /// Merges finished worker results against the editor's current state.
    pub fn apply_results(
        &self,
        editor: &EditorState,
        renderer: &SceneRenderer,
        worker: &mut BlendWorker,
    ) -> usize {
        let current = self.current_signatures(editor, renderer);
        worker.drain(&self.cache, |id| {
            current
                .iter()
                .find(|(mask_id, _)| mask_id == id)
                .map(|(_, signature)| *signature)
        })
    }

    fn current_signatures(
        &self,
        editor: &EditorState,
        renderer: &SceneRenderer,
    ) -> Vec<(String, u64)> {
        let (Some(view), Some(photo)) = (self.view_for(editor), editor.photo()) else {
            return Vec::new();
        };
        let (w, h) = photo.device_size();
        let base = base_signature(
            self.photo_revision,
            w.round().max(1.0) as u32,
            h.round().max(1.0) as u32,
            &view,
        );
        let masks = editor.store().render_order();
        let patterns = renderer.lookup_all(&masks, view.pixels_per_meter);
        let signatures = renderer.signatures(&masks, &patterns, &view, base);
        masks
            .iter()
            .map(|m| m.id.clone())
            .zip(signatures)
            .collect()
    }
}

fn stroke_px(width: f32, dpr: f32) -> Stroke {
    Stroke {
        width: width * dpr,
        ..Stroke::default()
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

/// Strokes `mask`'s outline in surface space.
fn stroke_outline(surface: &mut Pixmap, mask: &Mask, transform: Transform, paint: &Paint, stroke: &Stroke) {
    if let Some(path) = outline_path(mask).and_then(|p| p.transform(transform)) {
        surface.stroke_path(&path, paint, stroke, Transform::identity(), None);
    }
}

fn draw_handle(surface: &mut Pixmap, at: Point, transform: &ViewTransform, size: f32, paint: &Paint) {
    let x = at.x as f32 * transform.scale + transform.tx;
    let y = at.y as f32 * transform.scale + transform.ty;
    if let Some(rect) = Rect::from_xywh(x - size / 2.0, y - size / 2.0, size, size) {
        let path = PathBuilder::from_rect(rect);
        surface.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

fn draw_overlay(surface: &mut Pixmap, editor: &EditorState, view: &RenderView) {
    let transform = view.transform.to_skia();
    let dpr = view.dpr;
    let selected_id = editor.store().selected_id();
    let drag = editor.drag();

    let outline = solid(outline_color());
    for mask in editor.store().render_order() {
        if Some(mask.id.as_str()) == selected_id {
            continue;
        }
        stroke_outline(surface, mask, transform, &outline, &stroke_px(1.0, dpr));
    }

    if let Some(selected) = editor.store().selected() {
        let mut shown = selected.clone();
        if let Some(drag) = drag.filter(|d| d.mask_id == selected.id) {
            if let Some(point) = shown.points.get_mut(drag.index) {
                *point = point.moved_to(drag.position);
            }
        }
        let paint = solid(selection_color());
        stroke_outline(surface, &shown, transform, &paint, &stroke_px(2.0, dpr));
        for point in &shown.points {
            draw_handle(surface, point.position(), &view.transform, HANDLE_SIZE * dpr, &paint);
        }
    }

    let draft = editor.tools().draft();
    if !draft.is_empty() {
        draw_polyline(surface, draft, &view.transform, dpr);
    }

    let calibration = solid(calibration_color());
    let markers: Vec<Point> = match editor.pending_calibration() {
        Some((a, b)) => vec![a, b],
        None => editor.tools().calibration_points().to_vec(),
    };
    for point in &markers {
        draw_handle(surface, *point, &view.transform, HANDLE_SIZE * dpr, &calibration);
    }
    if let [a, b] = markers.as_slice() {
        let mut pb = PathBuilder::new();
        pb.move_to(a.x as f32, a.y as f32);
        pb.line_to(b.x as f32, b.y as f32);
        if let Some(path) = pb.finish().and_then(|p| p.transform(transform)) {
            surface.stroke_path(&path, &calibration, &stroke_px(2.0, dpr), Transform::identity(), None);
        }
    }
}

fn draw_polyline(surface: &mut Pixmap, points: &[MaskPoint], transform: &ViewTransform, dpr: f32) {
    let paint = solid(draft_color());
    let mut pb = PathBuilder::new();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            pb.move_to(p.x as f32, p.y as f32);
        } else {
            pb.line_to(p.x as f32, p.y as f32);
        }
    }
    if let Some(path) = pb.finish().and_then(|p| p.transform(transform.to_skia())) {
        surface.stroke_path(&path, &paint, &stroke_px(1.5, dpr), Transform::identity(), None);
    }
    for p in points {
        draw_handle(surface, p.position(), transform, HANDLE_SIZE * 0.75 * dpr, &paint);
    }
}

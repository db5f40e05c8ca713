//! Per-mask compositing.
//!
//! A mask is rendered into a patch covering its bounding box on the target
//! surface. The patch starts as a copy of the target under the mask; every
//! stage of the recipe reads that copy and returns a full-patch layer with
//! its own blend mode and opacity. The layers are folded onto the patch in a
//! fixed order, and then the patch alpha is multiplied by the mask coverage,
//! once, so it can be drawn back source-over.
//!
//! Live view and export both go through [`render_mask`]; the only difference
//! between them is the [`RenderView`].

pub mod stages;

use poolviz_core::CompositingSettings;
use poolviz_editor::mask::{Mask, Segment, UnderwaterVersion};
use poolviz_editor::{Camera, EffectSettings};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Path, PathBuilder, Pixmap, PixmapPaint, Transform,
};

use crate::pattern_cache::MaterialPattern;

/// Uniform scale plus translation from image pixels to surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl ViewTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            scale: camera.scale as f32,
            tx: camera.pan_x as f32,
            ty: camera.pan_y as f32,
        }
    }

    /// Same mapping, expressed relative to a surface whose origin sits at `(x, y)`.
    pub fn offset(&self, x: i32, y: i32) -> Self {
        Self {
            scale: self.scale,
            tx: self.tx - x as f32,
            ty: self.ty - y as f32,
        }
    }

    pub fn to_skia(&self) -> Transform {
        Transform::from_row(self.scale, 0.0, 0.0, self.scale, self.tx, self.ty)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// How the scene maps onto the target surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub transform: ViewTransform,
    /// Device pixel ratio; stroke widths given in CSS pixels are multiplied by it.
    pub dpr: f32,
    pub pixels_per_meter: f64,
}

impl RenderView {
    /// Full-resolution view used by export.
    pub fn export(pixels_per_meter: f64) -> Self {
        Self {
            transform: ViewTransform::identity(),
            dpr: 1.0,
            pixels_per_meter,
        }
    }
}

/// Pipeline stages, in the order they are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Placeholder,
    Opacity,
    ContactOcclusion,
    Photometric,
    Tint,
    EdgeFeather,
    Highlights,
    Ripple,
}

const STAGED: [Stage; 7] = [
    Stage::Opacity,
    Stage::ContactOcclusion,
    Stage::Photometric,
    Stage::Tint,
    Stage::EdgeFeather,
    Stage::Highlights,
    Stage::Ripple,
];

/// Chooses the recipe for a mask.
pub fn plan(effects: &EffectSettings, has_pattern: bool) -> &'static [Stage] {
    if !has_pattern {
        return &[Stage::Placeholder];
    }
    match effects.underwater_version {
        UnderwaterVersion::Legacy => &[Stage::Opacity, Stage::Tint],
        UnderwaterVersion::Staged if effects.blend == 0 => &[Stage::Opacity],
        UnderwaterVersion::Staged => &STAGED,
    }
}

/// Mask outline on a surface, plus its anti-aliased coverage.
pub struct MaskGeometry {
    pub path: Path,
    pub clip: tiny_skia::Mask,
}

impl MaskGeometry {
    /// Builds the outline with `image_to_surface` applied; curves stay curves.
    pub fn new(mask: &Mask, image_to_surface: Transform, width: u32, height: u32) -> Option<Self> {
        let path = outline_path(mask)?.transform(image_to_surface)?;
        let mut clip = tiny_skia::Mask::new(width, height)?;
        clip.fill_path(&path, FillRule::EvenOdd, true, Transform::identity());
        Some(Self { path, clip })
    }

    /// Coverage of the pixel at `index` (row-major), 0-255.
    pub fn coverage(&self, index: usize) -> u8 {
        self.clip.data().get(index).copied().unwrap_or(0)
    }
}

/// Image-space path of the mask outline.
pub fn outline_path(mask: &Mask) -> Option<Path> {
    if !mask.is_renderable() {
        return None;
    }
    let segments = mask.segments();
    let mut pb = PathBuilder::new();
    let start = match segments.first()? {
        Segment::Line { from, .. } | Segment::Cubic { from, .. } => *from,
    };
    pb.move_to(start.x as f32, start.y as f32);
    for segment in &segments {
        match segment {
            Segment::Line { to, .. } => pb.line_to(to.x as f32, to.y as f32),
            Segment::Cubic {
                ctrl1, ctrl2, to, ..
            } => pb.cubic_to(
                ctrl1.x as f32,
                ctrl1.y as f32,
                ctrl2.x as f32,
                ctrl2.y as f32,
                to.x as f32,
                to.y as f32,
            ),
        }
    }
    pb.close();
    pb.finish()
}

/// One stage's output: a patch-sized layer and how to blend it.
pub struct LayerContribution {
    pub stage: Stage,
    pub layer: Pixmap,
    pub blend_mode: BlendMode,
    pub opacity: f32,
}

/// Everything a stage may read.
pub struct StageContext<'a> {
    /// Target pixels under the mask before any layer is applied.
    pub base: &'a Pixmap,
    /// Photo pixels under the mask, without any other mask drawn over them.
    pub photo: &'a Pixmap,
    pub geometry: &'a MaskGeometry,
    pub effects: &'a EffectSettings,
    pub pattern: Option<&'a MaterialPattern>,
    /// Image pixels to patch pixels.
    pub image_to_surface: Transform,
    pub dpr: f32,
    pub depth_level: i32,
    pub seed: u64,
    pub settings: &'a CompositingSettings,
}

impl Stage {
    pub fn contribute(self, ctx: &StageContext<'_>) -> Option<LayerContribution> {
        match self {
            Stage::Placeholder => stages::placeholder(ctx),
            Stage::Opacity => stages::opacity(ctx),
            Stage::ContactOcclusion => stages::contact_occlusion(ctx),
            Stage::Photometric => stages::photometric(ctx),
            Stage::Tint => stages::tint(ctx),
            Stage::EdgeFeather => stages::edge_feather(ctx),
            Stage::Highlights => stages::highlights(ctx),
            Stage::Ripple => stages::ripple(ctx),
        }
    }
}

/// Draws each layer onto `target` with a fresh paint.
///
/// Layers are not clipped here; coverage is applied to the finished patch.
pub fn fold(target: &mut Pixmap, layers: &[LayerContribution]) {
    for contribution in layers {
        let paint = PixmapPaint {
            opacity: contribution.opacity.clamp(0.0, 1.0),
            blend_mode: contribution.blend_mode,
            quality: FilterQuality::Nearest,
        };
        target.draw_pixmap(
            0,
            0,
            contribution.layer.as_ref(),
            &paint,
            Transform::identity(),
            None,
        );
    }
}

/// A composited mask, ready to be drawn source-over at `(x, y)`.
#[derive(Debug, Clone)]
pub struct MaskComposite {
    pub patch: Pixmap,
    pub x: i32,
    pub y: i32,
}

impl MaskComposite {
    pub fn draw_onto(&self, target: &mut Pixmap) {
        target.draw_pixmap(
            self.x,
            self.y,
            self.patch.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

/// Stable 64-bit FNV-1a hash of a mask id, used to seed procedural stages.
pub fn mask_seed(id: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in id.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Renders one mask over `base`, which also serves as the photo.
///
/// `pattern` is `None` when the material is missing, still loading or failed;
/// the mask then gets the neutral placeholder fill. Returns `None` for masks
/// that cannot be filled or lie entirely off the surface.
pub fn render_mask(
    base: &Pixmap,
    mask: &Mask,
    pattern: Option<&MaterialPattern>,
    view: &RenderView,
    settings: &CompositingSettings,
) -> Option<MaskComposite> {
    render_mask_over(base, base, mask, pattern, view, settings)
}

fn crop(source: &Pixmap, x: i32, y: i32, width: u32, height: u32) -> Option<Pixmap> {
    let mut patch = Pixmap::new(width, height)?;
    patch.draw_pixmap(
        -x,
        -y,
        source.as_ref(),
        &PixmapPaint {
            blend_mode: BlendMode::Source,
            ..PixmapPaint::default()
        },
        Transform::identity(),
        None,
    );
    Some(patch)
}

/// Renders one mask over `surface`, which may already hold the masks below it.
///
/// `photo` is the same view of the photo with no masks drawn; stages that
/// look for features of the photo itself read it instead of `surface`.
pub fn render_mask_over(
    surface: &Pixmap,
    photo: &Pixmap,
    mask: &Mask,
    pattern: Option<&MaterialPattern>,
    view: &RenderView,
    settings: &CompositingSettings,
) -> Option<MaskComposite> {
    let image_path = outline_path(mask)?;
    let bounds = image_path.transform(view.transform.to_skia())?.bounds();

    let x0 = (bounds.left().floor() as i32).max(0);
    let y0 = (bounds.top().floor() as i32).max(0);
    let x1 = (bounds.right().ceil() as i32).min(surface.width() as i32);
    let y1 = (bounds.bottom().ceil() as i32).min(surface.height() as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let (w, h) = ((x1 - x0) as u32, (y1 - y0) as u32);

    let mut patch = crop(surface, x0, y0, w, h)?;
    let photo_patch = crop(photo, x0, y0, w, h)?;

    let image_to_surface = view.transform.offset(x0, y0).to_skia();
    let geometry = MaskGeometry::new(mask, image_to_surface, w, h)?;
    let effects = mask.effects();

    let layers: Vec<LayerContribution> = {
        let ctx = StageContext {
            base: &patch,
            photo: &photo_patch,
            geometry: &geometry,
            effects: &effects,
            pattern,
            image_to_surface,
            dpr: view.dpr,
            depth_level: mask.depth_level,
            seed: mask_seed(&mask.id),
            settings,
        };
        plan(&effects, pattern.is_some())
            .iter()
            .filter_map(|stage| stage.contribute(&ctx))
            .collect()
    };

    fold(&mut patch, &layers);
    patch.apply_mask(&geometry.clip);

    Some(MaskComposite {
        patch,
        x: x0,
        y: y0,
    })
}

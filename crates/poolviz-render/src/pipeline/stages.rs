//! The individual compositing stages.
//!
//! Each stage reads the untouched base patch (or the photo under it) and
//! returns its own layer, or `None` when its slider (or its input) makes it a
//! no-op. None of them touch the target directly.

use poolviz_core::Hsv;
use poolviz_editor::EffectSettings;
use tiny_skia::{
    BlendMode, Color, GradientStop, LineCap, LineJoin, Paint, Pixmap, Point, PremultipliedColorU8,
    RadialGradient, Rect, SpreadMode, Stroke, Transform,
};

use super::{LayerContribution, Stage, StageContext};

/// Tint used when no water hue was sampled.
const DEFAULT_TINT_RGB: [u8; 3] = [38, 140, 150];

/// Number of ripple blobs per mask.
const RIPPLE_COUNT: usize = 8;

/// Peak alpha of the darkest feather stroke at full slider.
const FEATHER_MAX_ALPHA: f32 = 0.35;

/// Peak alpha of the meniscus rim at full slider.
const MENISCUS_MAX_ALPHA: f32 = 0.5;

fn new_layer(ctx: &StageContext<'_>) -> Option<Pixmap> {
    Pixmap::new(ctx.base.width(), ctx.base.height())
}

fn full_rect(layer: &Pixmap) -> Option<Rect> {
    Rect::from_xywh(0.0, 0.0, layer.width() as f32, layer.height() as f32)
}

fn contribution(stage: Stage, layer: Pixmap, blend_mode: BlendMode, opacity: f32) -> LayerContribution {
    LayerContribution {
        stage,
        layer,
        blend_mode,
        opacity,
    }
}

/// Fills a layer with the material pattern.
fn pattern_layer(ctx: &StageContext<'_>) -> Option<Pixmap> {
    let pattern = ctx.pattern?;
    let mut layer = new_layer(ctx)?;
    let mut paint = Paint::default();
    paint.shader = pattern.shader(ctx.image_to_surface, 1.0);
    paint.anti_alias = false;
    layer.fill_rect(full_rect(&layer)?, &paint, Transform::identity(), None);
    Some(layer)
}

/// Tint colour: a deepened version of the sampled water hue, or the default teal.
pub fn tint_color(sampled: Option<Hsv>) -> [u8; 3] {
    match sampled {
        Some(hue) => Hsv::new(hue.h, hue.s.max(0.35), hue.v.clamp(0.45, 0.75)).to_rgb(),
        None => DEFAULT_TINT_RGB,
    }
}

/// Material pattern laid source-over at `material_opacity`.
pub fn opacity(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let alpha = EffectSettings::normalized(ctx.effects.material_opacity);
    if alpha <= 0.0 {
        return None;
    }
    let layer = pattern_layer(ctx)?;
    Some(contribution(Stage::Opacity, layer, BlendMode::SourceOver, alpha))
}

/// Darkens the middle of the mask, as if shadowed by the surrounding walls.
pub fn contact_occlusion(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let strength =
        EffectSettings::normalized(ctx.effects.contact_occlusion) * ctx.settings.occlusion_max;
    if strength <= 0.0 {
        return None;
    }
    let bounds = ctx.geometry.path.bounds();
    let center = Point::from_xy(
        (bounds.left() + bounds.right()) / 2.0,
        (bounds.top() + bounds.bottom()) / 2.0,
    );
    let radius = (bounds.width().max(bounds.height()) / 2.0).max(1.0);
    let shade = ((1.0 - strength) * 255.0).round() as u8;

    let mut layer = new_layer(ctx)?;
    let mut paint = Paint::default();
    paint.shader = RadialGradient::new(
        center,
        center,
        radius,
        vec![
            GradientStop::new(0.0, Color::from_rgba8(shade, shade, shade, 255)),
            GradientStop::new(1.0, Color::WHITE),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )?;
    layer.fill_rect(full_rect(&layer)?, &paint, Transform::identity(), None);
    Some(contribution(
        Stage::ContactOcclusion,
        layer,
        BlendMode::Multiply,
        1.0,
    ))
}

/// Multiplies the pattern into the photo so its lighting shows through.
///
/// Deeper masks (`depth_level > 0`) get a darker pattern, scaled by `depth_bias`.
pub fn photometric(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let blend = EffectSettings::normalized(ctx.effects.blend);
    if blend <= 0.0 {
        return None;
    }
    let mut layer = pattern_layer(ctx)?;

    let darken = (EffectSettings::normalized(ctx.effects.depth_bias)
        * ctx.settings.depth_bias_max
        * ctx.depth_level.max(0) as f32)
        .min(ctx.settings.depth_bias_max);
    if darken > 0.0 {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, (darken * 255.0).round() as u8);
        paint.blend_mode = BlendMode::SourceAtop;
        layer.fill_rect(full_rect(&layer)?, &paint, Transform::identity(), None);
    }

    Some(contribution(
        Stage::Photometric,
        layer,
        BlendMode::Multiply,
        blend,
    ))
}

/// Flat water tint, hard-capped at `tint_ceiling`.
pub fn tint(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let strength = EffectSettings::normalized(ctx.effects.tint).min(ctx.settings.tint_ceiling);
    if strength <= 0.0 {
        return None;
    }
    let [r, g, b] = tint_color(ctx.effects.sampled_water_hue);
    let mut layer = new_layer(ctx)?;
    layer.fill(Color::from_rgba8(r, g, b, 255));
    Some(contribution(Stage::Tint, layer, BlendMode::Multiply, strength))
}

/// Dark strokes along the boundary, progressively wider and fainter, then the
/// light meniscus rim.
pub fn edge_feather(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let feather = EffectSettings::normalized(ctx.effects.edge_feather);
    let meniscus = EffectSettings::normalized(ctx.effects.meniscus);
    if feather <= 0.0 && meniscus <= 0.0 {
        return None;
    }
    let mut layer = new_layer(ctx)?;
    let dpr = ctx.dpr.max(0.1);

    if feather > 0.0 {
        for pass in 0..ctx.settings.feather_passes {
            let step = (pass + 1) as f32;
            let width = ctx.settings.feather_base_width * dpr * step * (0.5 + feather);
            let alpha = feather * FEATHER_MAX_ALPHA / step;
            let mut paint = Paint::default();
            paint.set_color_rgba8(0, 0, 0, (alpha * 255.0).round() as u8);
            paint.anti_alias = true;
            let stroke = Stroke {
                width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            layer.stroke_path(&ctx.geometry.path, &paint, &stroke, Transform::identity(), None);
        }
    }

    if meniscus > 0.0 {
        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, (meniscus * MENISCUS_MAX_ALPHA * 255.0).round() as u8);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: dpr,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        layer.stroke_path(&ctx.geometry.path, &paint, &stroke, Transform::identity(), None);
    }

    Some(contribution(
        Stage::EdgeFeather,
        layer,
        BlendMode::SourceOver,
        1.0,
    ))
}

/// Brings specular highlights of the photo back through the material.
///
/// Highlights are found in the photo alone, so masks drawn below do not
/// change where they appear.
pub fn highlights(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let amount = EffectSettings::normalized(ctx.effects.highlights);
    if amount <= 0.0 {
        return None;
    }
    let threshold = ctx.settings.highlight_luma_threshold as f32;
    let cap = ctx.settings.highlight_cap;

    let mut layer = new_layer(ctx)?;
    let mut any = false;
    for (index, (src, dst)) in ctx
        .photo
        .pixels()
        .iter()
        .zip(layer.pixels_mut().iter_mut())
        .enumerate()
    {
        if ctx.geometry.coverage(index) == 0 {
            continue;
        }
        let c = src.demultiply();
        let luma = 0.299 * c.red() as f32 + 0.587 * c.green() as f32 + 0.114 * c.blue() as f32;
        if luma <= threshold {
            continue;
        }
        let over = (luma - threshold) / (255.0 - threshold).max(1.0);
        let alpha = (over * amount * cap).min(cap);
        let a = (alpha * 255.0).round() as u8;
        if let Some(white) = PremultipliedColorU8::from_rgba(a, a, a, a) {
            *dst = white;
            any = true;
        }
    }
    if !any {
        return None;
    }
    Some(contribution(Stage::Highlights, layer, BlendMode::Screen, 1.0))
}

/// xorshift64 stream for procedural stages.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed })
    }

    fn next_f32(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Soft caustic blobs screened over the mask. Positions come from the mask id,
/// so a mask always ripples the same way.
pub fn ripple(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let strength = EffectSettings::normalized(ctx.effects.ripple) * ctx.settings.ripple_cap;
    if strength <= 0.0 {
        return None;
    }
    let bounds = ctx.geometry.path.bounds();
    let extent = bounds.width().max(bounds.height()).max(1.0);
    let mut rng = Rng::new(ctx.seed);
    let mut layer = new_layer(ctx)?;
    let rect = full_rect(&layer)?;

    for _ in 0..RIPPLE_COUNT {
        let center = Point::from_xy(
            bounds.left() + rng.next_f32() * bounds.width(),
            bounds.top() + rng.next_f32() * bounds.height(),
        );
        let radius = extent * (0.05 + rng.next_f32() * 0.15);
        let mut paint = Paint::default();
        let Some(shader) = RadialGradient::new(
            center,
            center,
            radius,
            vec![
                GradientStop::new(0.0, Color::WHITE),
                GradientStop::new(1.0, Color::TRANSPARENT),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            continue;
        };
        paint.shader = shader;
        layer.fill_rect(rect, &paint, Transform::identity(), None);
    }

    Some(contribution(Stage::Ripple, layer, BlendMode::Screen, strength))
}

/// Neutral fill for masks without a usable pattern.
pub fn placeholder(ctx: &StageContext<'_>) -> Option<LayerContribution> {
    let [r, g, b, a] = ctx.settings.placeholder_rgba;
    let mut layer = new_layer(ctx)?;
    layer.fill(Color::from_rgba8(r, g, b, a));
    Some(contribution(
        Stage::Placeholder,
        layer,
        BlendMode::SourceOver,
        1.0,
    ))
}

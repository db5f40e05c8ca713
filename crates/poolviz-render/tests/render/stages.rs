use poolviz_core::CompositingSettings;
use poolviz_editor::EffectSettings;
use poolviz_render::pipeline::{fold, mask_seed, stages, MaskGeometry, StageContext};
use tiny_skia::{BlendMode, Color, Pixmap, Transform};

use crate::support::{photo, square};

const SIZE: u32 = 64;

/// Everything a stage context borrows.
struct Fixture {
    base: Pixmap,
    photo: Pixmap,
    geometry: MaskGeometry,
    effects: EffectSettings,
    settings: CompositingSettings,
    dpr: f32,
}

impl Fixture {
    fn new(base: Pixmap, effects: EffectSettings) -> Self {
        let mask = square("pool", 12.0, 12.0, 40.0);
        Self {
            photo: base.clone(),
            base,
            geometry: MaskGeometry::new(&mask, Transform::identity(), SIZE, SIZE).unwrap(),
            effects,
            settings: CompositingSettings::default(),
            dpr: 1.0,
        }
    }

    fn ctx(&self) -> StageContext<'_> {
        StageContext {
            base: &self.base,
            photo: &self.photo,
            geometry: &self.geometry,
            effects: &self.effects,
            pattern: None,
            image_to_surface: Transform::identity(),
            dpr: self.dpr,
            depth_level: 0,
            seed: mask_seed("pool"),
            settings: &self.settings,
        }
    }
}

fn only(edit: impl FnOnce(&mut EffectSettings)) -> EffectSettings {
    let mut effects = EffectSettings {
        blend: 0,
        depth_bias: 0,
        tint: 0,
        edge_feather: 0,
        highlights: 0,
        ripple: 0,
        meniscus: 0,
        material_opacity: 0,
        contact_occlusion: 0,
        ..EffectSettings::default()
    };
    edit(&mut effects);
    effects
}

fn luma(p: tiny_skia::PremultipliedColorU8) -> f32 {
    let c = p.demultiply();
    0.299 * c.red() as f32 + 0.587 * c.green() as f32 + 0.114 * c.blue() as f32
}

fn dark(width: u32, height: u32) -> Pixmap {
    let mut pixmap = Pixmap::new(width, height).unwrap();
    pixmap.fill(Color::from_rgba8(20, 40, 60, 255));
    pixmap
}

#[test]
fn test_highlights_are_capped_and_thresholded() {
    let fixture = Fixture::new(photo(SIZE, SIZE), only(|e| e.highlights = 100));
    let ctx = fixture.ctx();
    let highlight = stages::highlights(&ctx).unwrap();
    assert_eq!(highlight.blend_mode, BlendMode::Screen);

    let cap = (fixture.settings.highlight_cap * 255.0).round() as u8;
    let threshold = fixture.settings.highlight_luma_threshold as f32;
    let mut lit = 0;
    for (src, layer) in fixture.base.pixels().iter().zip(highlight.layer.pixels()) {
        assert!(layer.alpha() <= cap);
        if luma(*src) <= threshold {
            assert_eq!(layer.alpha(), 0);
        } else if layer.alpha() > 0 {
            lit += 1;
        }
    }
    assert!(lit > 0);

    // screened on, highlights only ever brighten, and by at most the cap
    let mut folded = fixture.base.clone();
    fold(&mut folded, &[highlight]);
    for (before, after) in fixture.base.pixels().iter().zip(folded.pixels()) {
        let delta = after.green() as i32 - before.green() as i32;
        assert!((-1..=cap as i32 + 1).contains(&delta), "delta {delta}");
    }
}

#[test]
fn test_dark_photo_has_no_highlights() {
    let fixture = Fixture::new(dark(SIZE, SIZE), only(|e| e.highlights = 100));
    assert!(stages::highlights(&fixture.ctx()).is_none());
}

#[test]
fn test_highlights_come_from_the_photo() {
    // a mask drawn earlier darkened the surface, but the photo is still bright
    let mut fixture = Fixture::new(dark(SIZE, SIZE), only(|e| e.highlights = 100));
    fixture.photo = photo(SIZE, SIZE);
    assert!(stages::highlights(&fixture.ctx()).is_some());

    fixture.base = photo(SIZE, SIZE);
    fixture.photo = dark(SIZE, SIZE);
    assert!(stages::highlights(&fixture.ctx()).is_none());
}

fn feather_width(dpr: f32) -> usize {
    let mut fixture = Fixture::new(dark(SIZE, SIZE), only(|e| e.edge_feather = 100));
    fixture.settings.feather_passes = 1;
    fixture.settings.feather_base_width = 4.0;
    fixture.dpr = dpr;
    let feather = stages::edge_feather(&fixture.ctx()).unwrap();
    // left edge of the mask, away from the corners
    let row = 32 * SIZE as usize;
    feather.layer.pixels()[row..row + SIZE as usize / 2]
        .iter()
        .filter(|p| p.alpha() > 0)
        .count()
}

#[test]
fn test_feather_width_follows_dpr() {
    let single = feather_width(1.0);
    let double = feather_width(2.0);
    assert!(single >= 6);
    assert!(
        (double as i32 - 2 * single as i32).abs() <= 2,
        "dpr 1: {single}px, dpr 2: {double}px"
    );
}

#[test]
fn test_ripple_strength_is_capped() {
    let fixture = Fixture::new(photo(SIZE, SIZE), only(|e| e.ripple = 100));
    let ripple = stages::ripple(&fixture.ctx()).unwrap();
    assert!(ripple.opacity <= fixture.settings.ripple_cap);

    let mut folded = fixture.base.clone();
    fold(&mut folded, &[ripple]);
    let limit = (fixture.settings.ripple_cap * 255.0).ceil() as i32 + 1;
    let mut changed = false;
    for (before, after) in fixture.base.pixels().iter().zip(folded.pixels()) {
        for (b, a) in [
            (before.red(), after.red()),
            (before.green(), after.green()),
            (before.blue(), after.blue()),
        ] {
            let delta = a as i32 - b as i32;
            assert!((-1..=limit).contains(&delta), "delta {delta}");
            changed |= delta > 0;
        }
    }
    assert!(changed);
}

use std::sync::Arc;

use poolviz_core::CompositingSettings;
use poolviz_editor::{EffectSettings, Mask, MaskPoint, UnderwaterVersion};
use poolviz_render::pipeline::plan;
use poolviz_render::{render_mask, MaterialPattern, PatternParams, RenderView, Stage};

use crate::support::{cache, material, photo, square, CountingLoader};
use proptest::prelude::*;

async fn tile() -> Arc<MaterialPattern> {
    let cache = cache(CountingLoader::new(), 4);
    cache
        .get_pattern(&material("tile-blue", "blue.png"), 1.0, PatternParams::new(100.0, 10))
        .await
        .unwrap()
}

fn with_effects(mut mask: Mask, edit: impl FnOnce(&mut EffectSettings)) -> Mask {
    let mut effects = mask.effects();
    edit(&mut effects);
    mask.effect_settings = Some(effects);
    mask
}

#[test]
fn test_plan_selects_recipe() {
    let staged = EffectSettings::default();
    assert_eq!(plan(&staged, false), &[Stage::Placeholder]);
    assert_eq!(plan(&staged, true).len(), 7);
    assert_eq!(plan(&staged, true)[0], Stage::Opacity);
    assert_eq!(plan(&staged, true)[6], Stage::Ripple);

    let no_blend = EffectSettings {
        blend: 0,
        ..EffectSettings::default()
    };
    assert_eq!(plan(&no_blend, true), &[Stage::Opacity]);

    let legacy = EffectSettings {
        underwater_version: UnderwaterVersion::Legacy,
        ..EffectSettings::default()
    };
    assert_eq!(plan(&legacy, true), &[Stage::Opacity, Stage::Tint]);
}

#[tokio::test]
async fn test_compositing_is_deterministic() {
    let pattern = tile().await;
    let base = photo(64, 64);
    let mask = square("pool", 10.0, 10.0, 30.0);
    let view = RenderView::export(100.0);
    let settings = CompositingSettings::default();

    let first = render_mask(&base, &mask, Some(&pattern), &view, &settings).unwrap();
    let second = render_mask(&base, &mask, Some(&pattern), &view, &settings).unwrap();
    assert_eq!((first.x, first.y), (10, 10));
    assert_eq!(first.patch.data(), second.patch.data());
}

#[test]
fn test_placeholder_without_pattern() {
    let base = photo(64, 64);
    let mask = square("pool", 10.0, 10.0, 30.0);
    let composite = render_mask(
        &base,
        &mask,
        None,
        &RenderView::export(100.0),
        &CompositingSettings::default(),
    )
    .unwrap();

    let inside = composite.patch.pixel(15, 15).unwrap();
    assert_eq!(inside.alpha(), 255);
    assert_ne!(inside, base.pixel(25, 25).unwrap());
}

#[tokio::test]
async fn test_pixels_outside_mask_untouched() {
    let pattern = tile().await;
    let base = photo(64, 64);
    let mut target = base.clone();
    let triangle = Mask::new(
        "tri",
        "tri",
        vec![
            MaskPoint::corner(10.0, 10.0),
            MaskPoint::corner(50.0, 10.0),
            MaskPoint::corner(10.0, 50.0),
        ],
    );
    let composite = render_mask(
        &base,
        &triangle,
        Some(&pattern),
        &RenderView::export(100.0),
        &CompositingSettings::default(),
    )
    .unwrap();
    composite.draw_onto(&mut target);

    for (x, y) in [(45, 45), (40, 38), (60, 5), (2, 60)] {
        assert_eq!(target.pixel(x, y), base.pixel(x, y), "pixel ({x}, {y})");
    }
    assert_ne!(target.pixel(15, 15), base.pixel(15, 15));
}

#[tokio::test]
async fn test_tint_is_capped() {
    let pattern = tile().await;
    let base = photo(64, 64);
    let view = RenderView::export(100.0);
    let settings = CompositingSettings::default();
    let legacy = |tint| {
        with_effects(square("pool", 10.0, 10.0, 30.0), |e| {
            e.underwater_version = UnderwaterVersion::Legacy;
            e.tint = tint;
        })
    };

    let at_ceiling = render_mask(&base, &legacy(40), Some(&pattern), &view, &settings).unwrap();
    let beyond = render_mask(&base, &legacy(100), Some(&pattern), &view, &settings).unwrap();
    let below = render_mask(&base, &legacy(10), Some(&pattern), &view, &settings).unwrap();
    assert_eq!(at_ceiling.patch.data(), beyond.patch.data());
    assert_ne!(at_ceiling.patch.data(), below.patch.data());
}

#[tokio::test]
async fn test_recipes_differ() {
    let pattern = tile().await;
    let base = photo(64, 64);
    let view = RenderView::export(100.0);
    let settings = CompositingSettings::default();
    let staged = square("pool", 10.0, 10.0, 30.0);
    let legacy = with_effects(staged.clone(), |e| {
        e.underwater_version = UnderwaterVersion::Legacy
    });

    let a = render_mask(&base, &staged, Some(&pattern), &view, &settings).unwrap();
    let b = render_mask(&base, &legacy, Some(&pattern), &view, &settings).unwrap();
    assert_ne!(a.patch.data(), b.patch.data());
}

#[tokio::test]
async fn test_depth_darkens_photometric_blend() {
    let pattern = tile().await;
    let base = photo(64, 64);
    let view = RenderView::export(100.0);
    let settings = CompositingSettings::default();
    let shallow = square("pool", 10.0, 10.0, 30.0);
    let mut deep = shallow.clone();
    deep.depth_level = 3;

    let a = render_mask(&base, &shallow, Some(&pattern), &view, &settings).unwrap();
    let b = render_mask(&base, &deep, Some(&pattern), &view, &settings).unwrap();
    let luma = |p: &tiny_skia::Pixmap| -> u64 {
        p.pixels()
            .iter()
            .map(|c| c.red() as u64 + c.green() as u64 + c.blue() as u64)
            .sum()
    };
    assert!(luma(&b.patch) < luma(&a.patch));
}

#[test]
fn test_off_surface_mask_is_skipped() {
    let base = photo(32, 32);
    let mask = square("far", 100.0, 100.0, 10.0);
    assert!(render_mask(
        &base,
        &mask,
        None,
        &RenderView::export(100.0),
        &CompositingSettings::default(),
    )
    .is_none());
}

#[test]
fn test_edge_coverage_applied_once() {
    let mut base = tiny_skia::Pixmap::new(48, 48).unwrap();
    base.fill(tiny_skia::Color::WHITE);
    let mut target = base.clone();
    let settings = CompositingSettings {
        placeholder_rgba: [0, 0, 0, 255],
        ..CompositingSettings::default()
    };
    let points = vec![
        MaskPoint::corner(10.5, 10.0),
        MaskPoint::corner(30.5, 10.0),
        MaskPoint::corner(30.5, 30.0),
        MaskPoint::corner(10.5, 30.0),
    ];
    let mask = Mask::new("half", "half", points);
    render_mask(&base, &mask, None, &RenderView::export(100.0), &settings)
        .unwrap()
        .draw_onto(&mut target);

    let mut coverage = tiny_skia::Mask::new(48, 48).unwrap();
    let rect = tiny_skia::Rect::from_xywh(10.5, 10.0, 20.0, 20.0).unwrap();
    coverage.fill_path(
        &tiny_skia::PathBuilder::from_rect(rect),
        tiny_skia::FillRule::EvenOdd,
        true,
        tiny_skia::Transform::identity(),
    );
    let c = coverage.data()[20 * 48 + 10] as f32 / 255.0;
    assert!(c > 0.2 && c < 0.8, "edge coverage {c}");

    let edge = target.pixel(10, 20).unwrap().demultiply();
    let expected = 255.0 * (1.0 - c);
    assert!(
        (edge.red() as f32 - expected).abs() <= 3.0,
        "edge {} expected {expected}",
        edge.red()
    );
    assert_eq!(target.pixel(20, 20).unwrap().red(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn placeholder_stays_inside_mask_bounds(
        x in 4u32..30,
        y in 4u32..30,
        size in 6u32..28,
    ) {
        let base = photo(64, 64);
        let mut target = base.clone();
        let mask = square("pool", x as f64, y as f64, size as f64);
        let composite = render_mask(
            &base,
            &mask,
            None,
            &RenderView::export(100.0),
            &CompositingSettings::default(),
        )
        .unwrap();
        composite.draw_onto(&mut target);

        let inside = |v: u32, lo: u32| v + 2 >= lo && v <= lo + size + 2;
        for py in 0..64 {
            for px in 0..64 {
                if !(inside(px, x) && inside(py, y)) {
                    prop_assert_eq!(target.pixel(px, py), base.pixel(px, py));
                }
            }
        }
    }
}

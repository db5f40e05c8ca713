use poolviz_editor::{EditorAction, EditorState, Mask, MaskAction, ViewportBounds};
use poolviz_render::composite_cache::base_signature;
use poolviz_render::{CompositeCache, ExportRenderer, LiveView, PatternSet, RenderView};

use crate::support::{photo, renderer, square, square_points, CountingLoader};

fn editor_with_mask(size: u32) -> EditorState {
    let mut editor = EditorState::default();
    editor
        .dispatch(EditorAction::ResizeViewport(ViewportBounds::sized(
            size as f64,
            size as f64,
        )))
        .unwrap();
    editor
        .dispatch(EditorAction::LoadPhoto {
            width: size,
            height: size,
        })
        .unwrap();
    editor
        .dispatch(EditorAction::Mask(MaskAction::Create {
            points: square_points(16.0, 16.0, 32.0),
            name: None,
        }))
        .unwrap();
    editor
}

fn is_selection_yellow(c: tiny_skia::PremultipliedColorU8) -> bool {
    c.alpha() == 255 && c.red() >= 254 && (234..=236).contains(&c.green()) && c.blue() <= 60
}

#[test]
fn test_frame_matches_device_size_and_caches_composites() {
    let editor = editor_with_mask(64);
    let renderer = renderer(CountingLoader::new());
    let view = LiveView::new(photo(64, 64));

    let frame = view.render_frame(&editor, &renderer).unwrap();
    assert_eq!((frame.width(), frame.height()), (64, 64));
    assert_eq!(view.cache().len(), 1);

    let again = view.render_frame(&editor, &renderer).unwrap();
    assert_eq!(frame.data(), again.data());
}

#[test]
fn test_no_frame_without_photo() {
    let editor = EditorState::default();
    let renderer = renderer(CountingLoader::new());
    let view = LiveView::new(photo(8, 8));
    assert!(view.render_frame(&editor, &renderer).is_none());
}

#[tokio::test]
async fn test_overlay_only_in_live_view() {
    let editor = editor_with_mask(64);
    let renderer = renderer(CountingLoader::new());
    let base = photo(64, 64);
    let view = LiveView::new(base.clone());

    // the new mask is selected, so its first vertex carries a handle
    let frame = view.render_frame(&editor, &renderer).unwrap();
    assert!(is_selection_yellow(frame.pixel(16, 16).unwrap()));

    let masks = editor.store().render_order();
    let exported = ExportRenderer::new(&renderer)
        .render(&base, &masks, editor.pixels_per_meter().unwrap())
        .await
        .unwrap();
    assert!(!is_selection_yellow(exported.pixel(16, 16).unwrap()));
}

#[test]
fn test_only_changed_masks_recomposite() {
    let renderer = renderer(CountingLoader::new());
    let base = photo(64, 64);
    let view = RenderView::export(100.0);
    let cache = CompositeCache::new();
    let patterns = PatternSet::new();
    let seed = base_signature(0, 64, 64, &view);
    let mut lower = square("lower", 4.0, 4.0, 40.0);
    let mut upper = square("upper", 20.0, 20.0, 40.0);

    let pass = |lower: &Mask, upper: &Mask| {
        let mut target = base.clone();
        renderer.render_masks(&mut target, &[lower, upper], &patterns, &view, Some(&cache), seed)
    };

    assert_eq!(pass(&lower, &upper), 2);
    assert_eq!(pass(&lower, &upper), 0);
    upper.revision += 1;
    assert_eq!(pass(&lower, &upper), 1);
    // the upper patch copies what the lower mask left behind
    lower.revision += 1;
    assert_eq!(pass(&lower, &upper), 2);
}

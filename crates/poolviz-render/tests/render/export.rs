use poolviz_editor::Mask;
use poolviz_render::ExportRenderer;

use crate::support::{photo, renderer, square, CountingLoader};

fn with_material(mut mask: Mask, material: &str) -> Mask {
    mask.material_id = Some(material.to_string());
    mask
}

#[tokio::test]
async fn test_export_without_masks_is_the_photo() {
    let renderer = renderer(CountingLoader::new());
    let base = photo(80, 48);
    let out = ExportRenderer::new(&renderer)
        .render(&base, &[], 100.0)
        .await
        .unwrap();
    assert_eq!((out.width(), out.height()), (80, 48));
    assert_eq!(out.data(), base.data());
}

#[tokio::test]
async fn test_export_waits_for_patterns() {
    let loader = CountingLoader::new();
    let renderer = renderer(loader.clone());
    let base = photo(64, 64);
    let textured = with_material(square("pool", 8.0, 8.0, 40.0), "tile-blue");
    let plain = square("pool", 8.0, 8.0, 40.0);
    let export = ExportRenderer::new(&renderer);

    let with_tile = export.render(&base, &[&textured], 100.0).await.unwrap();
    let placeholder = export.render(&base, &[&plain], 100.0).await.unwrap();

    assert_eq!(loader.loads(), 1);
    assert_ne!(with_tile.data(), placeholder.data());
}

#[tokio::test]
async fn test_failed_material_renders_placeholder() {
    let renderer = renderer(CountingLoader::new());
    let base = photo(64, 64);
    let broken = with_material(square("pool", 8.0, 8.0, 40.0), "broken");
    let unknown = with_material(square("pool", 8.0, 8.0, 40.0), "not-in-catalog");
    let plain = square("pool", 8.0, 8.0, 40.0);
    let export = ExportRenderer::new(&renderer);

    let a = export.render(&base, &[&broken], 100.0).await.unwrap();
    let b = export.render(&base, &[&unknown], 100.0).await.unwrap();
    let c = export.render(&base, &[&plain], 100.0).await.unwrap();
    assert_eq!(a.data(), c.data());
    assert_eq!(b.data(), c.data());
}

#[tokio::test]
async fn test_save_png_writes_full_resolution() {
    let renderer = renderer(CountingLoader::new());
    let base = photo(40, 30);
    let mask = with_material(square("pool", 5.0, 5.0, 20.0), "pebble");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.png");

    ExportRenderer::new(&renderer)
        .save_png(&base, &[&mask], 100.0, &path)
        .await
        .unwrap();

    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (40, 30));
}

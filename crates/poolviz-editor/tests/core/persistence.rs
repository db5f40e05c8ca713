use poolviz_core::Point;
use poolviz_editor::{EffectSettings, Mask, MaskGroup, MaskPoint, MaskRecord, SceneFile};
use tempfile::TempDir;

fn pool_mask() -> Mask {
    let mut mask = Mask::new(
        "mask-1",
        "Pool",
        vec![
            MaskPoint::corner(-5.0, 620.0),
            MaskPoint::corner(300.0, 10.0),
            MaskPoint::smooth(
                400.0,
                300.0,
                Point::new(390.0, 250.0),
                Point::new(410.0, 350.0),
            ),
        ],
    );
    mask.material_id = Some("tile-blue".to_string());
    mask.depth_level = 2;
    mask.elevation_m = -1.25;
    mask.z_index = 3;
    mask.is_stepped = true;
    mask.group_id = Some("g1".to_string());
    mask.effect_settings = Some(EffectSettings {
        ripple: 55,
        ..EffectSettings::default()
    });
    mask
}

#[test]
fn test_record_clamps_points_into_image() {
    let record = MaskRecord::from_mask(&pool_mask(), "photo-1", 800, 600, None).unwrap();
    let points: Vec<MaskPoint> = serde_json::from_str(&record.path_json).unwrap();
    assert_eq!(points[0].position(), Point::new(0.0, 599.0));
    assert_eq!(points[1].position(), Point::new(300.0, 10.0));
    assert_eq!(record.elevation_m, "-1.250");
    assert_eq!(record.photo_id, "photo-1");
}

#[test]
fn test_record_restores_mask() {
    let original = pool_mask();
    let record = MaskRecord::from_mask(&original, "photo-1", 800, 600, Some(100.0)).unwrap();
    let restored = record.to_mask().unwrap();

    assert_eq!(restored.id, original.id);
    assert_eq!(restored.name, "Pool");
    assert_eq!(restored.material_id, original.material_id);
    assert_eq!(restored.group_id, original.group_id);
    assert_eq!(restored.effect_settings, original.effect_settings);
    assert_eq!(restored.depth_level, 2);
    assert_eq!(restored.elevation_m, -1.25);
    assert!(restored.is_stepped);
    assert_eq!(restored.points[2].h1, Some(Point::new(390.0, 250.0)));

    let meta = record.calc_meta().unwrap();
    assert!(meta.area_px > 0.0);
    assert!(meta.area_m2.is_some());
}

#[test]
fn test_bad_elevation_is_an_error() {
    let mut record = MaskRecord::from_mask(&pool_mask(), "p", 800, 600, None).unwrap();
    record.elevation_m = "deep".to_string();
    assert!(record.to_mask().is_err());
}

#[test]
fn test_scene_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scene.json");

    let mut scene = SceneFile::new("photo-1", 800, 600);
    scene.groups.push(MaskGroup::new("g1", "Pool area", 0));
    scene
        .masks
        .push(MaskRecord::from_mask(&pool_mask(), "photo-1", 800, 600, None).unwrap());
    scene.save_to_file(&path).unwrap();

    let loaded = SceneFile::load_from_file(&path).unwrap();
    assert_eq!(loaded.image_width, 800);
    assert_eq!(loaded.groups.len(), 1);
    assert_eq!(loaded.to_masks().unwrap().len(), 1);
}

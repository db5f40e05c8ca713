use poolviz_core::{CalibrationSettings, Error, GeometryError, Point, PreconditionError, ZoomSettings};
use poolviz_editor::{Calibration, CalibrationEngine, Mask, MaskPoint, PhotoSpace, ViewportBounds};

fn baseline_space() -> PhotoSpace {
    PhotoSpace::new(
        2400,
        1600,
        1.0,
        ViewportBounds::sized(1200.0, 800.0),
        ZoomSettings::default(),
    )
    .unwrap()
}

#[test]
fn test_calibrate_ratio() {
    let space = baseline_space();
    let mut engine = CalibrationEngine::default();
    let cal = engine
        .calibrate(Point::new(100.0, 100.0), Point::new(400.0, 500.0), 2.5, &space)
        .unwrap();
    assert!((cal.reference_pixels - 500.0).abs() < 1e-9);
    assert!((cal.pixels_per_meter - 200.0).abs() < 1e-9);
    assert!(cal.is_calibrated);
    assert!(engine.is_calibrated());
}

#[test]
fn test_calibrate_rejects_bad_length() {
    let space = baseline_space();
    let mut engine = CalibrationEngine::default();
    for length in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = engine
            .calibrate(Point::new(0.0, 0.0), Point::new(10.0, 0.0), length, &space)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Geometry(GeometryError::NonPositiveLength { .. })
        ));
    }
    assert!(!engine.is_calibrated());
}

#[test]
fn test_calibrate_rejects_coincident_points() {
    let space = baseline_space();
    let mut engine = CalibrationEngine::default();
    let p = Point::new(42.0, 42.0);
    let err = engine.calibrate(p, p, 1.0, &space).unwrap_err();
    assert!(matches!(
        err,
        Error::Geometry(GeometryError::DegenerateDistance { .. })
    ));
}

#[test]
fn test_calibrate_requires_baseline() {
    let mut space = baseline_space();
    space.zoom_in();
    let mut engine = CalibrationEngine::default();
    let err = engine
        .calibrate(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 1.0, &space)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::NotAtBaseline { zoom_percent: 110 })
    ));

    space.zoom_out();
    assert!(engine
        .calibrate(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 1.0, &space)
        .is_ok());
}

#[test]
fn test_recalibration_overwrites() {
    let space = baseline_space();
    let mut engine = CalibrationEngine::default();
    engine
        .calibrate(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 1.0, &space)
        .unwrap();
    engine
        .calibrate(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 4.0, &space)
        .unwrap();
    assert!((engine.current().unwrap().pixels_per_meter - 25.0).abs() < 1e-9);
}

#[test]
fn test_measurements_use_heuristic_until_calibrated() {
    let space = baseline_space();
    let mut engine = CalibrationEngine::new(CalibrationSettings {
        heuristic_scene_width_m: 12.0,
        ..CalibrationSettings::default()
    });
    let mask = Mask::new(
        "m",
        "Pool",
        vec![
            MaskPoint::corner(0.0, 0.0),
            MaskPoint::corner(400.0, 0.0),
            MaskPoint::corner(400.0, 200.0),
            MaskPoint::corner(0.0, 200.0),
        ],
    );
    // 2400 px / 12 m
    assert!((engine.pixels_per_meter(2400) - 200.0).abs() < 1e-9);
    assert!((engine.area_m2(&mask, 2400) - 2.0).abs() < 1e-9);

    engine
        .calibrate(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 1.0, &space)
        .unwrap();
    assert!((engine.area_m2(&mask, 2400) - 8.0).abs() < 1e-9);
    assert!((engine.perimeter_m(&mask, 2400) - 12.0).abs() < 1e-9);
    assert!((engine.length_m(250.0, 2400) - 2.5).abs() < 1e-9);
}

#[test]
fn test_calibration_new_validates() {
    assert!(Calibration::new(1.0, 0.0).is_err());
    assert!(Calibration::new(0.0, 10.0).is_err());
    let cal = Calibration::new(2.0, 300.0).unwrap();
    assert_eq!(cal.pixels_per_meter, 150.0);
}

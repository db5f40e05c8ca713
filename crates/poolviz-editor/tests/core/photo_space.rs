use poolviz_core::{GeometryError, ZoomSettings};
use poolviz_editor::{PhotoSpace, ViewportBounds, ZoomDirection};

fn space() -> PhotoSpace {
    PhotoSpace::new(
        4000,
        3000,
        1.0,
        ViewportBounds::sized(1200.0, 800.0),
        ZoomSettings::default(),
    )
    .unwrap()
}

#[test]
fn test_fit_uses_limiting_axis_and_centers() {
    let s = space();
    let expected = (1200.0f64 / 4000.0).min(800.0 / 3000.0);
    assert!((s.fit_scale() - expected).abs() < 1e-12);
    assert_eq!(s.zoom_percent(), 100);
    assert!(s.is_at_baseline());

    let (pan_x, pan_y) = s.pan();
    assert!((pan_x - (1200.0 - 4000.0 * expected) / 2.0).abs() < 1e-9);
    assert!(pan_y.abs() < 1e-9);
}

#[test]
fn test_fit_accounts_for_dpr() {
    let s = PhotoSpace::new(
        1000,
        1000,
        2.0,
        ViewportBounds::sized(500.0, 500.0),
        ZoomSettings::default(),
    )
    .unwrap();
    assert!((s.fit_scale() - 1.0).abs() < 1e-12);
}

#[test]
fn test_zero_sized_image_rejected() {
    let err = PhotoSpace::new(
        0,
        100,
        1.0,
        ViewportBounds::default(),
        ZoomSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GeometryError::InvalidImageSize { .. }));
}

#[test]
fn test_six_zoom_clicks_reach_160() {
    let mut s = space();
    for _ in 0..6 {
        s.zoom_in();
    }
    assert_eq!(s.zoom_percent(), 160);
    assert!(!s.is_at_baseline());
}

#[test]
fn test_zoom_out_from_105_snaps_to_baseline() {
    let mut s = space();
    s.set_scale(s.fit_scale() * 1.05);
    assert_eq!(s.zoom_percent(), 105);
    s.zoom_out();
    assert_eq!(s.zoom_percent(), 100);
    assert!(s.is_at_baseline());
    assert_eq!(s.scale(), s.fit_scale());
}

#[test]
fn test_zoom_round_trip_returns_to_exact_baseline() {
    let mut s = space();
    for _ in 0..7 {
        s.zoom_in();
    }
    for _ in 0..7 {
        s.zoom_out();
    }
    assert!(s.is_at_baseline());
}

#[test]
fn test_zoom_clamped_to_range() {
    let mut s = space();
    for _ in 0..100 {
        s.zoom_step(ZoomDirection::In, true);
    }
    assert_eq!(s.zoom_percent(), 500);
    for _ in 0..100 {
        s.zoom_out();
    }
    assert_eq!(s.zoom_percent(), 10);
}

#[test]
fn test_next_zoom_percent_fast_step() {
    let s = space();
    assert_eq!(s.next_zoom_percent(100, ZoomDirection::In, true), 120);
    assert_eq!(s.next_zoom_percent(120, ZoomDirection::Out, false), 110);
    assert_eq!(s.next_zoom_percent(112, ZoomDirection::Out, false), 100);
}

#[test]
fn test_wheel_zoom_keeps_point_under_cursor() {
    let mut s = space();
    let (cx, cy) = (317.0, 241.0);
    let before = s.screen_to_image(cx, cy);
    s.zoom_at(cx, cy, ZoomDirection::from_wheel_delta(-120.0), false);
    assert_eq!(s.zoom_percent(), 110);
    let after = s.screen_to_image(cx, cy);
    assert!((before.x - after.x).abs() < 1e-9);
    assert!((before.y - after.y).abs() < 1e-9);

    s.zoom_at(cx, cy, ZoomDirection::from_wheel_delta(120.0), true);
    let again = s.screen_to_image(cx, cy);
    assert!((before.x - again.x).abs() < 1e-9);
}

#[test]
fn test_pan_scales_by_dpr() {
    let mut s = PhotoSpace::new(
        1000,
        1000,
        2.0,
        ViewportBounds::sized(500.0, 500.0),
        ZoomSettings::default(),
    )
    .unwrap();
    let (x0, y0) = s.pan();
    s.pan_by(10.0, -5.0);
    let (x1, y1) = s.pan();
    assert!((x1 - x0 - 20.0).abs() < 1e-12);
    assert!((y1 - y0 + 10.0).abs() < 1e-12);
    // panning keeps the zoom
    assert!(s.is_at_baseline());
}

#[test]
fn test_display_reports_zoom() {
    let s = space();
    assert!(s.to_string().contains("100%"));
}

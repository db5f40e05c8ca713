use poolviz_core::{GeometryError, Point};
use poolviz_editor::coords::{
    clamp_to_image, clamp_to_viewport, image_to_screen, is_within_viewport, screen_to_image,
    validate_finite,
};
use poolviz_editor::mask::geometry;
use poolviz_editor::{Camera, ImageOrigin, ViewportBounds};
use proptest::prelude::*;

#[test]
fn test_offset_viewport_and_dpr() {
    let vp = ViewportBounds::new(50.0, 20.0, 800.0, 600.0);
    let camera = Camera::new(0.5, 10.0, 20.0);
    // client (150, 120) -> device (200, 200) -> canvas (380, 360)
    let p = screen_to_image(150.0, 120.0, &vp, &camera, 2.0, &ImageOrigin::default());
    assert!((p.x - 380.0).abs() < 1e-9);
    assert!((p.y - 360.0).abs() < 1e-9);
}

#[test]
fn test_sub_image_origin() {
    let vp = ViewportBounds::sized(800.0, 600.0);
    let origin = ImageOrigin::new(100.0, 50.0, 0.25);
    let p = screen_to_image(200.0, 150.0, &vp, &Camera::default(), 1.0, &origin);
    assert!((p.x - 400.0).abs() < 1e-9);
    assert!((p.y - 400.0).abs() < 1e-9);
}

#[test]
fn test_validate_finite_rejects_nan_and_infinity() {
    assert_eq!(validate_finite(1.0, 2.0).unwrap(), Point::new(1.0, 2.0));
    assert!(matches!(
        validate_finite(f64::NAN, 0.0),
        Err(GeometryError::NonFiniteCoordinate { .. })
    ));
    assert!(validate_finite(0.0, f64::INFINITY).is_err());
    assert!(validate_finite(f64::NEG_INFINITY, 0.0).is_err());
}

#[test]
fn test_viewport_helpers() {
    let vp = ViewportBounds::new(10.0, 10.0, 100.0, 50.0);
    assert!(is_within_viewport(10.0, 60.0, &vp));
    assert!(!is_within_viewport(9.0, 20.0, &vp));
    assert_eq!(clamp_to_viewport(500.0, -3.0, &vp), Point::new(110.0, 10.0));
}

#[test]
fn test_clamp_to_image_edges() {
    let h = 600;
    let clamped = clamp_to_image(&Point::new(-5.0, h as f64 + 20.0), 800, h);
    assert_eq!(clamped, Point::new(0.0, h as f64 - 1.0));
}

fn camera_strategy() -> impl Strategy<Value = (Camera, f64, ImageOrigin)> {
    (
        0.1f64..10.0,
        -2000.0f64..2000.0,
        -2000.0f64..2000.0,
        prop_oneof![Just(1.0f64), Just(1.5), Just(2.0), Just(3.0)],
        -100.0f64..100.0,
        -100.0f64..100.0,
        0.25f64..4.0,
    )
        .prop_map(|(scale, pan_x, pan_y, dpr, ox, oy, os)| {
            (
                Camera::new(scale, pan_x, pan_y),
                dpr,
                ImageOrigin::new(ox, oy, os),
            )
        })
}

proptest! {
    #[test]
    fn screen_round_trip_is_identity(
        (camera, dpr, origin) in camera_strategy(),
        x in 0.0f64..1200.0,
        y in 0.0f64..800.0,
    ) {
        let vp = ViewportBounds::new(30.0, 40.0, 1200.0, 800.0);
        let (cx, cy) = (x + vp.left, y + vp.top);
        let image = screen_to_image(cx, cy, &vp, &camera, dpr, &origin);
        let back = image_to_screen(image.x, image.y, &vp, &camera, dpr, &origin);
        prop_assert!((back.x - cx).abs() < 1e-6);
        prop_assert!((back.y - cy).abs() < 1e-6);
    }

    #[test]
    fn area_is_camera_independent(
        (camera, dpr, _) in camera_strategy(),
        w in 10.0f64..500.0,
        h in 10.0f64..500.0,
    ) {
        let vp = ViewportBounds::sized(1200.0, 800.0);
        let origin = ImageOrigin::default();
        let image_pts = [
            Point::new(100.0, 100.0),
            Point::new(100.0 + w, 100.0),
            Point::new(100.0 + w, 100.0 + h),
            Point::new(100.0, 100.0 + h),
        ];
        // drawn on screen under this camera, stored back in image space
        let stored: Vec<Point> = image_pts
            .iter()
            .map(|p| image_to_screen(p.x, p.y, &vp, &camera, dpr, &origin))
            .map(|s| screen_to_image(s.x, s.y, &vp, &camera, dpr, &origin))
            .collect();
        let expected = w * h;
        prop_assert!((geometry::area(&stored) - expected).abs() <= expected * 1e-9);
    }
}

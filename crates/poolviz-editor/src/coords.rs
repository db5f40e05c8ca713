//! Screen ↔ image coordinate mapping.
//!
//! Handles conversion between client coordinates (CSS pixels reported by the
//! pointer, relative to the page) and image coordinates (pixels of the source
//! photo). The chain is:
//!
//! ```text
//! device_x = (client_x - viewport.left) * dpr
//! canvas_x = (device_x - camera.pan_x) / camera.scale
//! image_x  = (canvas_x - origin.x) / origin.scale
//! ```
//!
//! and the same for `y`. [`image_to_screen`] is the exact inverse.
//!
//! Every raw pointer coordinate entering the engine passes through
//! [`validate_finite`] first; NaN or infinite values never reach the mask model.

use poolviz_core::{GeometryError, Point};

/// Position and size of the drawing surface on the page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Viewport anchored at the page origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

impl Default for ViewportBounds {
    fn default() -> Self {
        Self::sized(1200.0, 800.0)
    }
}

/// Camera transform in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Camera {
    pub fn new(scale: f64, pan_x: f64, pan_y: f64) -> Self {
        Self {
            scale,
            pan_x,
            pan_y,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

/// Placement of the image inside the camera's canvas space.
///
/// Identity unless the photo is drawn as a sub-image (for example a
/// downscaled preview positioned inside a larger canvas).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageOrigin {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl ImageOrigin {
    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self { x, y, scale }
    }
}

impl Default for ImageOrigin {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Converts client (CSS pixel) coordinates to image coordinates.
pub fn screen_to_image(
    client_x: f64,
    client_y: f64,
    viewport: &ViewportBounds,
    camera: &Camera,
    dpr: f64,
    origin: &ImageOrigin,
) -> Point {
    let device_x = (client_x - viewport.left) * dpr;
    let device_y = (client_y - viewport.top) * dpr;
    let canvas_x = (device_x - camera.pan_x) / camera.scale;
    let canvas_y = (device_y - camera.pan_y) / camera.scale;
    Point::new(
        (canvas_x - origin.x) / origin.scale,
        (canvas_y - origin.y) / origin.scale,
    )
}

/// Converts image coordinates to client (CSS pixel) coordinates.
pub fn image_to_screen(
    image_x: f64,
    image_y: f64,
    viewport: &ViewportBounds,
    camera: &Camera,
    dpr: f64,
    origin: &ImageOrigin,
) -> Point {
    let canvas_x = image_x * origin.scale + origin.x;
    let canvas_y = image_y * origin.scale + origin.y;
    let device_x = canvas_x * camera.scale + camera.pan_x;
    let device_y = canvas_y * camera.scale + camera.pan_y;
    Point::new(
        device_x / dpr + viewport.left,
        device_y / dpr + viewport.top,
    )
}

/// Converts image coordinates to device pixels of the drawing surface.
pub fn image_to_device(image: &Point, camera: &Camera, origin: &ImageOrigin) -> Point {
    Point::new(
        (image.x * origin.scale + origin.x) * camera.scale + camera.pan_x,
        (image.y * origin.scale + origin.y) * camera.scale + camera.pan_y,
    )
}

/// Rejects NaN and infinite coordinates.
pub fn validate_finite(x: f64, y: f64) -> Result<Point, GeometryError> {
    if x.is_finite() && y.is_finite() {
        Ok(Point::new(x, y))
    } else {
        Err(GeometryError::NonFiniteCoordinate { x, y })
    }
}

/// True when the client point lies inside the viewport rectangle.
pub fn is_within_viewport(client_x: f64, client_y: f64, viewport: &ViewportBounds) -> bool {
    client_x >= viewport.left
        && client_x <= viewport.left + viewport.width
        && client_y >= viewport.top
        && client_y <= viewport.top + viewport.height
}

/// Clamps a client point to the viewport rectangle.
pub fn clamp_to_viewport(client_x: f64, client_y: f64, viewport: &ViewportBounds) -> Point {
    Point::new(
        client_x.clamp(viewport.left, viewport.left + viewport.width.max(0.0)),
        client_y.clamp(viewport.top, viewport.top + viewport.height.max(0.0)),
    )
}

/// Clamps an image point to `[0, width-1] × [0, height-1]`.
pub fn clamp_to_image(point: &Point, width: u32, height: u32) -> Point {
    let max_x = width.saturating_sub(1) as f64;
    let max_y = height.saturating_sub(1) as f64;
    Point::new(point.x.clamp(0.0, max_x), point.y.clamp(0.0, max_y))
}

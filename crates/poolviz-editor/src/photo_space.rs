//! Camera model for the photo being annotated.
//!
//! Holds the zoom/pan state of the drawing surface and the "fit" scale that
//! represents 100%. Zoom is quantized to whole-percent steps relative to the fit
//! scale so that calibration, which is only allowed at exactly 100%, always has
//! a reachable, numerically stable baseline.

use std::fmt;

use poolviz_core::constants::BASELINE_EPSILON;
use poolviz_core::{GeometryError, Point, ZoomSettings};

use crate::coords::{self, Camera, ImageOrigin, ViewportBounds};

/// Direction of a zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: negative delta (scroll up) zooms in.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        }
    }

    fn sign(self) -> i32 {
        match self {
            ZoomDirection::In => 1,
            ZoomDirection::Out => -1,
        }
    }
}

/// The camera state of a loaded photo.
#[derive(Debug, Clone)]
pub struct PhotoSpace {
    scale: f64,
    pan_x: f64,
    pan_y: f64,
    fit_scale: f64,
    img_w: u32,
    img_h: u32,
    dpr: f64,
    viewport: ViewportBounds,
    zoom: ZoomSettings,
}

impl PhotoSpace {
    /// Creates the camera for a freshly loaded image, fitted to the viewport.
    pub fn new(
        img_w: u32,
        img_h: u32,
        dpr: f64,
        viewport: ViewportBounds,
        zoom: ZoomSettings,
    ) -> Result<Self, GeometryError> {
        if img_w == 0 || img_h == 0 {
            return Err(GeometryError::InvalidImageSize {
                width: img_w,
                height: img_h,
            });
        }
        let mut space = Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            fit_scale: 1.0,
            img_w,
            img_h,
            dpr: sanitize_dpr(dpr),
            viewport,
            zoom,
        };
        space.fit_to_view();
        Ok(space)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn fit_scale(&self) -> f64 {
        self.fit_scale
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.img_w, self.img_h)
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn viewport(&self) -> &ViewportBounds {
        &self.viewport
    }

    /// Current camera as consumed by the coordinate functions and renderer.
    pub fn camera(&self) -> Camera {
        Camera::new(self.scale, self.pan_x, self.pan_y)
    }

    /// Displayed zoom, `round(scale / fit_scale * 100)`.
    pub fn zoom_percent(&self) -> i32 {
        (self.scale / self.fit_scale * 100.0).round() as i32
    }

    /// True when the camera sits exactly on the 100% baseline.
    pub fn is_at_baseline(&self) -> bool {
        (self.scale - self.fit_scale).abs() <= BASELINE_EPSILON * self.fit_scale
    }

    /// Device-pixel size of the drawing surface.
    pub fn device_size(&self) -> (f64, f64) {
        (
            self.viewport.width * self.dpr,
            self.viewport.height * self.dpr,
        )
    }

    /// Computes the fit scale for the current viewport and centers the image.
    ///
    /// The fit scale is the largest scale at which the whole image is visible,
    /// with no padding.
    pub fn fit_to_view(&mut self) {
        let (dw, dh) = self.device_size();
        let fit = (dw / self.img_w as f64).min(dh / self.img_h as f64);
        self.fit_scale = if fit.is_finite() && fit > 0.0 { fit } else { 1.0 };
        self.scale = self.fit_scale;
        self.center();
    }

    /// Centers the image in the viewport at the current scale.
    pub fn center(&mut self) {
        let (dw, dh) = self.device_size();
        self.pan_x = (dw - self.img_w as f64 * self.scale) / 2.0;
        self.pan_y = (dh - self.img_h as f64 * self.scale) / 2.0;
    }

    /// Updates the viewport (window resize) and refits.
    pub fn set_viewport(&mut self, viewport: ViewportBounds) {
        self.viewport = viewport;
        self.fit_to_view();
    }

    /// Updates the device pixel ratio (monitor change) and refits.
    pub fn set_dpr(&mut self, dpr: f64) {
        self.dpr = sanitize_dpr(dpr);
        self.fit_to_view();
    }

    /// Pans by a delta given in CSS pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.pan_x += dx * self.dpr;
            self.pan_y += dy * self.dpr;
        }
    }

    /// Computes the zoom percentage one step away from `current`.
    ///
    /// The result is clamped to the configured range and snaps to exactly 100
    /// when it lands within the snap window.
    pub fn next_zoom_percent(&self, current: i32, direction: ZoomDirection, fast: bool) -> i32 {
        let step = if fast {
            self.zoom.fast_step_percent
        } else {
            self.zoom.step_percent
        };
        let next = (current + direction.sign() * step)
            .clamp(self.zoom.min_percent, self.zoom.max_percent);
        if (next - 100).abs() <= self.zoom.snap_percent {
            100
        } else {
            next
        }
    }

    /// Zooms one step around the viewport center.
    pub fn zoom_step(&mut self, direction: ZoomDirection, fast: bool) {
        let next = self.next_zoom_percent(self.zoom_percent(), direction, fast);
        let (dw, dh) = self.device_size();
        self.zoom_about_device(next, dw / 2.0, dh / 2.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_step(ZoomDirection::In, false);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_step(ZoomDirection::Out, false);
    }

    /// Wheel zoom: one step, keeping the image point under the cursor fixed.
    pub fn zoom_at(&mut self, client_x: f64, client_y: f64, direction: ZoomDirection, fast: bool) {
        if !client_x.is_finite() || !client_y.is_finite() {
            return;
        }
        let next = self.next_zoom_percent(self.zoom_percent(), direction, fast);
        let device_x = (client_x - self.viewport.left) * self.dpr;
        let device_y = (client_y - self.viewport.top) * self.dpr;
        self.zoom_about_device(next, device_x, device_y);
    }

    /// Sets an explicit zoom percentage, clamped and snapped, about the center.
    pub fn set_zoom_percent(&mut self, percent: i32) {
        let clamped = percent.clamp(self.zoom.min_percent, self.zoom.max_percent);
        let snapped = if (clamped - 100).abs() <= self.zoom.snap_percent {
            100
        } else {
            clamped
        };
        let (dw, dh) = self.device_size();
        self.zoom_about_device(snapped, dw / 2.0, dh / 2.0);
    }

    /// Sets the raw scale. Used when restoring a camera; no quantization.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    fn zoom_about_device(&mut self, percent: i32, device_x: f64, device_y: f64) {
        let new_scale = if percent == 100 {
            self.fit_scale
        } else {
            self.fit_scale * percent as f64 / 100.0
        };
        // pan = device - image * scale, with the image point taken before the change
        let image_x = (device_x - self.pan_x) / self.scale;
        let image_y = (device_y - self.pan_y) / self.scale;
        self.scale = new_scale;
        self.pan_x = device_x - image_x * new_scale;
        self.pan_y = device_y - image_y * new_scale;
    }

    /// Converts a client point to image space using this camera.
    pub fn screen_to_image(&self, client_x: f64, client_y: f64) -> Point {
        coords::screen_to_image(
            client_x,
            client_y,
            &self.viewport,
            &self.camera(),
            self.dpr,
            &ImageOrigin::default(),
        )
    }

    /// Converts an image point to client coordinates using this camera.
    pub fn image_to_screen(&self, image_x: f64, image_y: f64) -> Point {
        coords::image_to_screen(
            image_x,
            image_y,
            &self.viewport,
            &self.camera(),
            self.dpr,
            &ImageOrigin::default(),
        )
    }
}

fn sanitize_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() && dpr > 0.0 {
        dpr
    } else {
        1.0
    }
}

impl fmt::Display for PhotoSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {}% | Pan: ({:.1}, {:.1}) | DPR: {:.2}",
            self.zoom_percent(),
            self.pan_x,
            self.pan_y,
            self.dpr
        )
    }
}

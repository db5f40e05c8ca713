//! Water hue sampling.

use poolviz_core::Hsv;
use poolviz_editor::Mask;
use tiny_skia::{FillRule, Pixmap, Transform};

use crate::pipeline::outline_path;

/// Average colour of the photo under `mask`, as HSV.
///
/// `photo` is in image pixels. Returns `None` when the mask covers no
/// opaque pixel of the photo.
pub fn sample_water_hue(photo: &Pixmap, mask: &Mask) -> Option<Hsv> {
    let path = outline_path(mask)?;
    let bounds = path.bounds();
    let x0 = (bounds.left().floor() as i32).max(0);
    let y0 = (bounds.top().floor() as i32).max(0);
    let x1 = (bounds.right().ceil() as i32).min(photo.width() as i32);
    let y1 = (bounds.bottom().ceil() as i32).min(photo.height() as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let (w, h) = ((x1 - x0) as u32, (y1 - y0) as u32);

    let mut clip = tiny_skia::Mask::new(w, h)?;
    clip.fill_path(
        &path,
        FillRule::EvenOdd,
        false,
        Transform::from_translate(-x0 as f32, -y0 as f32),
    );

    let stride = photo.width() as usize;
    let pixels = photo.pixels();
    let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
    for row in 0..h as usize {
        for col in 0..w as usize {
            if clip.data()[row * w as usize + col] == 0 {
                continue;
            }
            let index = (row + y0 as usize) * stride + col + x0 as usize;
            let Some(px) = pixels.get(index) else {
                continue;
            };
            let c = px.demultiply();
            if c.alpha() == 0 {
                continue;
            }
            r += c.red() as u64;
            g += c.green() as u64;
            b += c.blue() as u64;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    Some(Hsv::from_rgb((r / n) as u8, (g / n) as u8, (b / n) as u8))
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use poolviz_core::{AssetError, CacheSettings, CompositingSettings};
use poolviz_editor::{Mask, MaskPoint};
use poolviz_render::{
    InMemoryCatalog, Material, MaterialPatternCache, SceneRenderer, TextureLoader,
};
use tiny_skia::{Color, Pixmap};
use tokio::sync::Notify;

/// Serves a checkerboard for any URL, or fails for URLs starting with `missing`.
pub struct CountingLoader {
    pub loads: AtomicUsize,
    pub delay: Duration,
}

impl CountingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            delay: Duration::from_millis(20),
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextureLoader for CountingLoader {
    async fn load(&self, url: &str) -> Result<RgbaImage, AssetError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if url.starts_with("missing") {
            return Err(AssetError::LoadFailed {
                url: url.to_string(),
                reason: "not found".to_string(),
            });
        }
        Ok(RgbaImage::from_fn(16, 16, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgba([200, 180, 140, 255])
            } else {
                Rgba([90, 70, 50, 255])
            }
        }))
    }
}

/// Holds loads of URLs starting with `gated` until `release` is called.
pub struct GatedLoader {
    pub loads: AtomicUsize,
    gate: Notify,
}

impl GatedLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            gate: Notify::new(),
        })
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextureLoader for GatedLoader {
    async fn load(&self, url: &str) -> Result<RgbaImage, AssetError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if url.starts_with("gated") {
            self.gate.notified().await;
        }
        Ok(RgbaImage::from_pixel(8, 8, Rgba([120, 160, 200, 255])))
    }
}

pub fn material(id: &str, url: &str) -> Material {
    Material {
        id: id.to_string(),
        name: id.to_string(),
        category: "tile".to_string(),
        albedo_url: url.to_string(),
        physical_repeat_m: 0.3,
        cost_per_area: None,
        version: 1,
    }
}

pub fn catalog() -> InMemoryCatalog {
    [
        material("tile-blue", "blue.png"),
        material("pebble", "pebble.png"),
        material("broken", "missing.png"),
    ]
    .into_iter()
    .collect()
}

pub fn cache(loader: Arc<CountingLoader>, capacity: usize) -> Arc<MaterialPatternCache> {
    Arc::new(MaterialPatternCache::new(
        loader,
        CacheSettings {
            capacity,
            ..CacheSettings::default()
        },
    ))
}

pub fn renderer(loader: Arc<CountingLoader>) -> SceneRenderer {
    SceneRenderer::new(
        Arc::new(catalog()),
        cache(loader, 16),
        CompositingSettings::default(),
    )
}

pub fn square_points(x: f64, y: f64, size: f64) -> Vec<MaskPoint> {
    vec![
        MaskPoint::corner(x, y),
        MaskPoint::corner(x + size, y),
        MaskPoint::corner(x + size, y + size),
        MaskPoint::corner(x, y + size),
    ]
}

pub fn square(id: &str, x: f64, y: f64, size: f64) -> Mask {
    Mask::new(id, id, square_points(x, y, size))
}

/// Vertical gradient with a bright band, so highlights have something to find.
pub fn photo(width: u32, height: u32) -> Pixmap {
    let mut photo = Pixmap::new(width, height).unwrap();
    photo.fill(Color::from_rgba8(40, 110, 150, 255));
    for y in 0..height {
        for x in 0..width {
            let v = if (height / 3..height / 3 + 4).contains(&y) {
                250
            } else {
                ((x * 3 + y * 5) % 120) as u8 + 40
            };
            let idx = (y * width + x) as usize;
            photo.pixels_mut()[idx] = tiny_skia::ColorU8::from_rgba(v / 2, v, v, 255).premultiply();
        }
    }
    photo
}

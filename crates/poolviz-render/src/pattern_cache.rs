//! Cache of rasterized material tiles.
//!
//! A tile is the material's albedo texture resampled so that one repeat covers
//! `physical_repeat_m` meters at the photo's pixels-per-meter, divided by the
//! mask's tile scale. Tiles are keyed structurally by [`PatternKey`].
//!
//! Concurrent requests for the same key share a single load through a
//! `tokio::sync::OnceCell`. Eviction is strict LRU by entry count, but an entry
//! that is still loading or has callers waiting on it is never evicted. A
//! failed load stays cached in the error state so that every frame does not
//! retry it; [`MaterialPatternCache::invalidate_material`] clears it.

use std::collections::HashMap;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use parking_lot::Mutex;
use poolviz_core::{AssetError, CacheSettings};
use tiny_skia::{ColorU8, FilterQuality, Pattern, Pixmap, Shader, SpreadMode, Transform};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::material::{Material, TextureLoader};

/// Rendering parameters that change the rasterized tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternParams {
    /// Pixels per meter, quantized to hundredths.
    ppm_centi: u32,
    pub softness: u8,
}

impl PatternParams {
    pub fn new(pixels_per_meter: f64, softness: u8) -> Self {
        let ppm = if pixels_per_meter.is_finite() {
            pixels_per_meter.max(0.0)
        } else {
            0.0
        };
        Self {
            ppm_centi: (ppm * 100.0).round() as u32,
            softness: softness.min(100),
        }
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.ppm_centi as f64 / 100.0
    }
}

/// Structural cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub material_id: String,
    /// Tile scale multiplier, quantized to thousandths.
    tile_scale_milli: u32,
    pub version: u32,
    pub params: PatternParams,
}

impl PatternKey {
    pub fn new(material: &Material, tile_scale: f64, params: PatternParams) -> Self {
        let tile_scale = if tile_scale.is_finite() && tile_scale > 0.0 {
            tile_scale
        } else {
            1.0
        };
        Self {
            material_id: material.id.clone(),
            tile_scale_milli: (tile_scale * 1000.0).round().max(1.0) as u32,
            version: material.version,
            params,
        }
    }

    pub fn tile_scale(&self) -> f64 {
        self.tile_scale_milli as f64 / 1000.0
    }
}

/// Tile edge length in pixels, `ppm * repeat / tile_scale`, clamped.
pub fn tile_pixels(
    pixels_per_meter: f64,
    physical_repeat_m: f64,
    tile_scale: f64,
    min_px: u32,
    max_px: u32,
) -> u32 {
    let raw = pixels_per_meter * physical_repeat_m / tile_scale.max(1e-3);
    let px = if raw.is_finite() { raw.round() } else { 0.0 };
    (px.max(0.0) as u32).clamp(min_px.max(1), max_px.max(min_px.max(1)))
}

/// A rasterized, premultiplied material tile.
#[derive(Debug)]
pub struct MaterialPattern {
    tile: Pixmap,
    tile_px: u32,
    key: PatternKey,
}

impl MaterialPattern {
    pub fn tile(&self) -> &Pixmap {
        &self.tile
    }

    pub fn tile_px(&self) -> u32 {
        self.tile_px
    }

    pub fn key(&self) -> &PatternKey {
        &self.key
    }

    /// Repeating shader; `transform` maps image pixels to the target surface.
    pub fn shader(&self, transform: Transform, opacity: f32) -> Shader<'_> {
        Pattern::new(
            self.tile.as_ref(),
            SpreadMode::Repeat,
            FilterQuality::Bilinear,
            opacity,
            transform,
        )
    }
}

/// Resamples, softens and premultiplies a decoded texture into a tile.
pub fn rasterize(
    texture: &RgbaImage,
    key: PatternKey,
    physical_repeat_m: f64,
    settings: &CacheSettings,
) -> Result<MaterialPattern, AssetError> {
    let tile_px = tile_pixels(
        key.params.pixels_per_meter(),
        physical_repeat_m,
        key.tile_scale(),
        settings.min_tile_px,
        settings.max_tile_px,
    );
    if texture.width() == 0 || texture.height() == 0 {
        return Err(AssetError::DecodeFailed {
            url: key.material_id.clone(),
            reason: "empty texture".to_string(),
        });
    }

    let mut resized = imageops::resize(texture, tile_px, tile_px, FilterType::Triangle);
    if key.params.softness > 0 {
        let sigma = key.params.softness as f32 / 100.0 * 3.0;
        resized = imageops::blur(&resized, sigma);
    }

    let mut tile = Pixmap::new(tile_px, tile_px).ok_or(AssetError::SurfaceAllocation {
        width: tile_px,
        height: tile_px,
    })?;
    for (src, dst) in resized.pixels().zip(tile.pixels_mut()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    Ok(MaterialPattern { tile, tile_px, key })
}

#[derive(Debug, Clone)]
enum PatternState {
    Ready(Arc<MaterialPattern>),
    Failed(String),
}

/// Result of a non-blocking cache lookup.
#[derive(Debug, Clone)]
pub enum PatternLookup {
    Ready(Arc<MaterialPattern>),
    Pending,
    Failed,
    Missing,
}

impl PatternLookup {
    pub fn pattern(&self) -> Option<&Arc<MaterialPattern>> {
        match self {
            PatternLookup::Ready(p) => Some(p),
            _ => None,
        }
    }
}

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternStatus {
    Missing,
    Pending,
    Ready,
    Failed,
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
}

struct Entry {
    cell: Arc<OnceCell<PatternState>>,
    last_access: u64,
    waiters: usize,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<PatternKey, Entry>,
    clock: u64,
    stats: CacheStats,
}

impl CacheInner {
    fn evict_to(&mut self, capacity: usize) {
        while self.entries.len() > capacity {
            let victim = self
                .entries
                .iter()
                .filter(|(_, e)| e.waiters == 0 && e.cell.initialized())
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone());
            let Some(key) = victim else {
                // everything left is in flight
                break;
            };
            self.entries.remove(&key);
            self.stats.evictions += 1;
            debug!(
                "Evicted pattern {} (scale {:.3})",
                key.material_id,
                key.tile_scale()
            );
        }
    }
}

/// Decrements the waiter count of an entry when a caller stops waiting,
/// including when its future is dropped mid-load.
struct WaiterGuard<'a> {
    cache: &'a MaterialPatternCache,
    key: &'a PatternKey,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.cache.inner.lock();
        if let Some(entry) = inner.entries.get_mut(self.key) {
            entry.waiters = entry.waiters.saturating_sub(1);
        }
        inner.evict_to(self.cache.settings.capacity);
    }
}

/// Shared, bounded cache of material tiles.
pub struct MaterialPatternCache {
    loader: Arc<dyn TextureLoader>,
    settings: CacheSettings,
    inner: Mutex<CacheInner>,
}

impl MaterialPatternCache {
    pub fn new(loader: Arc<dyn TextureLoader>, settings: CacheSettings) -> Self {
        Self {
            loader,
            settings,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Returns the tile for `material`, loading it at most once per key.
    ///
    /// `None` means the load failed; callers render the placeholder fill.
    pub async fn get_pattern(
        &self,
        material: &Material,
        tile_scale: f64,
        params: PatternParams,
    ) -> Option<Arc<MaterialPattern>> {
        let key = PatternKey::new(material, tile_scale, params);
        let cell = {
            let mut inner = self.inner.lock();
            inner.clock += 1;
            let now = inner.clock;
            let is_new = !inner.entries.contains_key(&key);
            let entry = inner.entries.entry(key.clone()).or_insert_with(|| Entry {
                cell: Arc::new(OnceCell::new()),
                last_access: now,
                waiters: 0,
            });
            entry.last_access = now;
            entry.waiters += 1;
            let cell = entry.cell.clone();
            if is_new {
                inner.stats.misses += 1;
            } else {
                inner.stats.hits += 1;
                debug!("Pattern cache hit for {}", key.material_id);
            }
            inner.evict_to(self.settings.capacity);
            cell
        };

        let _guard = WaiterGuard {
            cache: self,
            key: &key,
        };
        let state = cell
            .get_or_init(|| self.load(material, key.clone()))
            .await;
        match state {
            PatternState::Ready(pattern) => Some(pattern.clone()),
            PatternState::Failed(_) => None,
        }
    }

    /// Starts loading in the background if the key is not cached yet.
    pub fn prefetch(self: &Arc<Self>, material: &Material, tile_scale: f64, params: PatternParams) {
        let key = PatternKey::new(material, tile_scale, params);
        if self.status(&key) != PatternStatus::Missing {
            return;
        }
        let cache = Arc::clone(self);
        let material = material.clone();
        tokio::spawn(async move {
            cache.get_pattern(&material, tile_scale, params).await;
        });
    }

    /// Non-blocking lookup for frame rendering; refreshes recency on a hit.
    pub fn peek(&self, key: &PatternKey) -> PatternLookup {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;
        let Some(entry) = inner.entries.get_mut(key) else {
            return PatternLookup::Missing;
        };
        entry.last_access = now;
        match entry.cell.get() {
            Some(PatternState::Ready(pattern)) => PatternLookup::Ready(pattern.clone()),
            Some(PatternState::Failed(_)) => PatternLookup::Failed,
            None => PatternLookup::Pending,
        }
    }

    pub fn status(&self, key: &PatternKey) -> PatternStatus {
        let inner = self.inner.lock();
        match inner.entries.get(key).map(|e| e.cell.get()) {
            None => PatternStatus::Missing,
            Some(None) => PatternStatus::Pending,
            Some(Some(PatternState::Ready(_))) => PatternStatus::Ready,
            Some(Some(PatternState::Failed(_))) => PatternStatus::Failed,
        }
    }

    /// Drops every settled entry for `material_id`. In-flight loads are kept.
    pub fn invalidate_material(&self, material_id: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, entry| {
            key.material_id != material_id || entry.waiters > 0 || !entry.cell.initialized()
        });
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!("Invalidated {} patterns for {}", removed, material_id);
        }
        removed
    }

    async fn load(&self, material: &Material, key: PatternKey) -> PatternState {
        {
            self.inner.lock().stats.loads += 1;
        }
        let texture = match self.loader.load(&material.albedo_url).await {
            Ok(texture) => texture,
            Err(e) => {
                warn!("Pattern load failed for {}: {}", material.id, e);
                return PatternState::Failed(e.to_string());
            }
        };

        let settings = self.settings.clone();
        let repeat = material.physical_repeat_m;
        let result = tokio::task::spawn_blocking(move || rasterize(&texture, key, repeat, &settings))
            .await
            .map_err(|e| AssetError::LoadFailed {
                url: material.albedo_url.clone(),
                reason: e.to_string(),
            })
            .and_then(|r| r);

        match result {
            Ok(pattern) => {
                debug!(
                    "Rasterized {} at {}px (scale {:.3})",
                    material.id,
                    pattern.tile_px(),
                    pattern.key().tile_scale()
                );
                PatternState::Ready(Arc::new(pattern))
            }
            Err(e) => {
                warn!("Pattern rasterization failed for {}: {}", material.id, e);
                PatternState::Failed(e.to_string())
            }
        }
    }
}

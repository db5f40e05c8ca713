//! Scene-level rendering shared by the live view and export.

use std::collections::HashMap;
use std::sync::Arc;

use poolviz_core::CompositingSettings;
use poolviz_editor::Mask;
use tiny_skia::Pixmap;
use tracing::debug;

use crate::composite_cache::{composite_signature, CompositeCache};
use crate::material::{Material, MaterialCatalog};
use crate::pattern_cache::{MaterialPattern, MaterialPatternCache, PatternKey, PatternLookup, PatternParams};
use crate::pipeline::{render_mask_over, RenderView};

/// Ready patterns by mask id. Masks without an entry get the placeholder.
pub type PatternSet = HashMap<String, Arc<MaterialPattern>>;

/// Resolves materials and composites masks onto a surface.
pub struct SceneRenderer {
    catalog: Arc<dyn MaterialCatalog>,
    patterns: Arc<MaterialPatternCache>,
    settings: CompositingSettings,
}

impl SceneRenderer {
    pub fn new(
        catalog: Arc<dyn MaterialCatalog>,
        patterns: Arc<MaterialPatternCache>,
        settings: CompositingSettings,
    ) -> Self {
        Self {
            catalog,
            patterns,
            settings,
        }
    }

    pub fn patterns(&self) -> &Arc<MaterialPatternCache> {
        &self.patterns
    }

    pub fn settings(&self) -> &CompositingSettings {
        &self.settings
    }

    fn material_for(&self, mask: &Mask) -> Option<Material> {
        let id = mask.material_id.as_deref()?;
        let material = self.catalog.get_material_by_id(id);
        if material.is_none() {
            debug!("Mask {} references unknown material {}", mask.id, id);
        }
        material
    }

    fn request(&self, mask: &Mask, pixels_per_meter: f64) -> Option<(Material, f64, PatternParams)> {
        let material = self.material_for(mask)?;
        let effects = mask.effects();
        Some((
            material,
            effects.tile_scale_factor(),
            PatternParams::new(pixels_per_meter, effects.softness),
        ))
    }

    /// Cache key of the tile `mask` needs, if it has a known material.
    pub fn pattern_key(&self, mask: &Mask, pixels_per_meter: f64) -> Option<PatternKey> {
        self.request(mask, pixels_per_meter)
            .map(|(material, scale, params)| PatternKey::new(&material, scale, params))
    }

    /// Non-blocking lookup for a frame. Starts a background load on a miss
    /// when called inside a tokio runtime.
    pub fn lookup(&self, mask: &Mask, pixels_per_meter: f64) -> PatternLookup {
        let Some((material, scale, params)) = self.request(mask, pixels_per_meter) else {
            return PatternLookup::Missing;
        };
        let key = PatternKey::new(&material, scale, params);
        let lookup = self.patterns.peek(&key);
        if matches!(lookup, PatternLookup::Missing)
            && tokio::runtime::Handle::try_current().is_ok()
        {
            self.patterns.prefetch(&material, scale, params);
        }
        lookup
    }

    /// Waits for the tile `mask` needs. `None` means placeholder.
    pub async fn resolve(&self, mask: &Mask, pixels_per_meter: f64) -> Option<Arc<MaterialPattern>> {
        let (material, scale, params) = self.request(mask, pixels_per_meter)?;
        self.patterns.get_pattern(&material, scale, params).await
    }

    /// Patterns that are ready right now, for every mask in `masks`.
    pub fn lookup_all(&self, masks: &[&Mask], pixels_per_meter: f64) -> PatternSet {
        masks
            .iter()
            .filter_map(|mask| {
                self.lookup(mask, pixels_per_meter)
                    .pattern()
                    .map(|p| (mask.id.clone(), Arc::clone(p)))
            })
            .collect()
    }

    /// Awaits the patterns of every mask in `masks`.
    pub async fn resolve_all(&self, masks: &[&Mask], pixels_per_meter: f64) -> PatternSet {
        let mut set = PatternSet::new();
        for mask in masks {
            if let Some(pattern) = self.resolve(mask, pixels_per_meter).await {
                set.insert(mask.id.clone(), pattern);
            }
        }
        set
    }

    /// Chained composite signature of each mask, bottom to top.
    pub fn signatures(
        &self,
        masks: &[&Mask],
        patterns: &PatternSet,
        view: &RenderView,
        base_signature: u64,
    ) -> Vec<u64> {
        let mut below = base_signature;
        masks
            .iter()
            .map(|mask| {
                let key = patterns.get(&mask.id).map(|p| p.key());
                below = composite_signature(mask, key, view, below);
                below
            })
            .collect()
    }

    /// Composites `masks` onto `target` in order, bottom first.
    ///
    /// With a cache, composites whose signature is unchanged are reused and
    /// fresh ones are stored. Returns the number of masks rendered afresh.
    pub fn render_masks(
        &self,
        target: &mut Pixmap,
        masks: &[&Mask],
        patterns: &PatternSet,
        view: &RenderView,
        cache: Option<&CompositeCache>,
        base_signature: u64,
    ) -> usize {
        let signatures = self.signatures(masks, patterns, view, base_signature);
        let any_stale = match cache {
            Some(cache) => masks
                .iter()
                .zip(&signatures)
                .any(|(mask, signature)| cache.get(&mask.id, *signature).is_none()),
            None => !masks.is_empty(),
        };
        // the target before any mask is drawn
        let photo = any_stale.then(|| target.clone());
        let mut rendered = 0;
        for (mask, signature) in masks.iter().zip(signatures) {
            if let Some(hit) = cache.and_then(|c| c.get(&mask.id, signature)) {
                if let Some(composite) = hit {
                    composite.draw_onto(target);
                }
                continue;
            }
            let Some(photo) = photo.as_ref() else {
                continue;
            };
            let pattern = patterns.get(&mask.id).map(|p| p.as_ref());
            let composite =
                render_mask_over(target, photo, mask, pattern, view, &self.settings);
            rendered += 1;
            if let Some(composite) = &composite {
                composite.draw_onto(target);
            }
            if let Some(cache) = cache {
                cache.update(&mask.id, signature, composite);
            }
        }
        rendered
    }
}

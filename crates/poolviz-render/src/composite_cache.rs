//! Per-mask composite cache for the live view.
//!
//! Each visible mask's composite is stored with a signature. A mask's
//! signature chains the signature of every mask drawn below it, because its
//! patch starts as a copy of whatever those masks left on the surface.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use poolviz_editor::Mask;
use tracing::debug;

use crate::pattern_cache::PatternKey;
use crate::pipeline::{MaskComposite, RenderView};

/// Signature of the surface before any mask is drawn.
pub fn base_signature(photo_revision: u64, width: u32, height: u32, view: &RenderView) -> u64 {
    let mut hasher = DefaultHasher::new();
    photo_revision.hash(&mut hasher);
    (width, height).hash(&mut hasher);
    hash_view(view, &mut hasher);
    hasher.finish()
}

fn hash_view(view: &RenderView, hasher: &mut DefaultHasher) {
    view.transform.scale.to_bits().hash(hasher);
    view.transform.tx.to_bits().hash(hasher);
    view.transform.ty.to_bits().hash(hasher);
    view.dpr.to_bits().hash(hasher);
}

/// Signature of `mask` drawn over a surface with signature `below`.
///
/// `pattern` is the key of the tile the mask is drawn with, or `None` when it
/// falls back to the placeholder.
pub fn composite_signature(
    mask: &Mask,
    pattern: Option<&PatternKey>,
    view: &RenderView,
    below: u64,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    below.hash(&mut hasher);
    mask.id.hash(&mut hasher);
    mask.revision.hash(&mut hasher);
    mask.depth_level.hash(&mut hasher);
    mask.effects().signature().hash(&mut hasher);
    pattern.hash(&mut hasher);
    hash_view(view, &mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
struct CachedComposite {
    signature: u64,
    composite: Option<Arc<MaskComposite>>,
}

/// A finished off-thread render, waiting to be merged.
#[derive(Debug, Clone)]
pub struct BlendResult {
    pub mask_id: String,
    pub signature: u64,
    /// `None` when the mask lies entirely off the surface.
    pub composite: Option<MaskComposite>,
}

/// Composites keyed by mask id.
#[derive(Debug, Default)]
pub struct CompositeCache {
    entries: Mutex<HashMap<String, CachedComposite>>,
}

impl CompositeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn needs_update(&self, mask_id: &str, signature: u64) -> bool {
        self.entries
            .lock()
            .get(mask_id)
            .map_or(true, |e| e.signature != signature)
    }

    /// Composite for `mask_id` if it was rendered with `signature`.
    ///
    /// The outer `None` is a miss; `Some(None)` is a cached "nothing to draw".
    pub fn get(&self, mask_id: &str, signature: u64) -> Option<Option<Arc<MaskComposite>>> {
        self.entries
            .lock()
            .get(mask_id)
            .filter(|e| e.signature == signature)
            .map(|e| e.composite.clone())
    }

    /// Most recent composite for `mask_id`, whatever its signature.
    pub fn latest(&self, mask_id: &str) -> Option<Arc<MaskComposite>> {
        self.entries
            .lock()
            .get(mask_id)
            .and_then(|e| e.composite.clone())
    }

    pub fn update(
        &self,
        mask_id: &str,
        signature: u64,
        composite: Option<MaskComposite>,
    ) -> Option<Arc<MaskComposite>> {
        let composite = composite.map(Arc::new);
        self.entries.lock().insert(
            mask_id.to_string(),
            CachedComposite {
                signature,
                composite: composite.clone(),
            },
        );
        composite
    }

    /// Stores an off-thread result if it still matches the scene.
    ///
    /// `current` is the mask's signature now, or `None` if the mask is gone.
    /// Returns whether the result was kept.
    pub fn merge(&self, result: BlendResult, current: Option<u64>) -> bool {
        match current {
            Some(signature) if signature == result.signature => {
                self.update(&result.mask_id, result.signature, result.composite);
                true
            }
            Some(_) => {
                debug!("Dropping stale composite for {}", result.mask_id);
                false
            }
            None => {
                debug!("Dropping composite for removed mask {}", result.mask_id);
                self.entries.lock().remove(&result.mask_id);
                false
            }
        }
    }

    /// Drops entries for masks not in `live_ids`.
    pub fn retain_masks<'a>(&self, live_ids: impl IntoIterator<Item = &'a str>) {
        let live: std::collections::HashSet<&str> = live_ids.into_iter().collect();
        self.entries.lock().retain(|id, _| live.contains(id.as_str()));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

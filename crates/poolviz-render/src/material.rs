//! Materials and the collaborators that resolve them to pixels.
//!
//! The renderer never talks to a backend directly. Materials come from a
//! [`MaterialCatalog`], albedo textures from a [`TextureLoader`] and photos
//! from an [`ImageSource`]; each has a filesystem-backed implementation here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbaImage;
use poolviz_core::{AssetError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A tileable surface material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub albedo_url: String,
    /// Physical size of one texture repeat, in meters.
    pub physical_repeat_m: f64,
    #[serde(default)]
    pub cost_per_area: Option<f64>,
    /// Bumped whenever the texture behind `albedo_url` changes.
    #[serde(default)]
    pub version: u32,
}

/// Lookup of materials by id.
pub trait MaterialCatalog: Send + Sync {
    fn get_material_by_id(&self, id: &str) -> Option<Material>;
}

/// Catalog held in memory, loadable from a JSON array.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    materials: HashMap<String, Material>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: Material) {
        self.materials.insert(material.id.clone(), material);
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let list: Vec<Material> = serde_json::from_str(json)?;
        Ok(list.into_iter().collect())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        debug!(
            "Loaded {} materials from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }
}

impl FromIterator<Material> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for material in iter {
            catalog.insert(material);
        }
        catalog
    }
}

impl MaterialCatalog for InMemoryCatalog {
    fn get_material_by_id(&self, id: &str) -> Option<Material> {
        self.materials.get(id).cloned()
    }
}

/// Resolves an albedo URL to decoded RGBA pixels.
#[async_trait]
pub trait TextureLoader: Send + Sync {
    async fn load(&self, url: &str) -> std::result::Result<RgbaImage, AssetError>;
}

/// Loads textures from disk. Relative URLs and `file://` URLs resolve against `root`.
#[derive(Debug, Clone)]
pub struct FsTextureLoader {
    root: PathBuf,
}

impl FsTextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl TextureLoader for FsTextureLoader {
    async fn load(&self, url: &str) -> std::result::Result<RgbaImage, AssetError> {
        let path = self.resolve(url);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            warn!("Failed to read texture {}: {}", path.display(), e);
            AssetError::LoadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let owned_url = url.to_string();
        tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes)
                .map(|img| img.to_rgba8())
                .map_err(|e| AssetError::DecodeFailed {
                    url: owned_url,
                    reason: e.to_string(),
                })
        })
        .await
        .map_err(|e| AssetError::LoadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
    }
}

/// Resolves a photo id to a loadable location.
///
/// Any cross-origin proxying is the implementor's concern.
pub trait ImageSource: Send + Sync {
    fn resolve(&self, photo_id: &str) -> Option<String>;
}

/// Finds `<root>/<photo_id>.<ext>` for common photo extensions.
#[derive(Debug, Clone)]
pub struct DirectoryImageSource {
    root: PathBuf,
}

impl DirectoryImageSource {
    const EXTENSIONS: [&'static str; 4] = ["jpg", "jpeg", "png", "webp"];

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageSource for DirectoryImageSource {
    fn resolve(&self, photo_id: &str) -> Option<String> {
        Self::EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", photo_id, ext)))
            .find(|p| p.is_file())
            .map(|p| p.to_string_lossy().into_owned())
    }
}

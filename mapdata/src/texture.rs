//! Terrain texture registry and the deterministic texture fallback chain.
//!
//! The registry is populated once at startup and then queried by typed
//! [`TextureKey`]s. [`TextureSelector`] resolves a `(terrain, country)` pair:
//!
//! 1. the country variant of the terrain kind, when a country index is given
//!    and that variant is registered;
//! 2. the plain terrain kind;
//! 3. the land default.
//!
//! Unrecognised terrain labels go straight to the land default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Number of country variants shipped per terrain kind.
pub const STANDARD_VARIANTS: u32 = 6;

const TEXTURE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Closed set of terrain kinds the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    Water,
    Land,
    Mountain,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 3] = [TerrainKind::Water, TerrainKind::Land, TerrainKind::Mountain];

    pub fn as_str(self) -> &'static str {
        match self {
            TerrainKind::Water => "water",
            TerrainKind::Land => "land",
            TerrainKind::Mountain => "mountain",
        }
    }

    /// Parses a payload terrain label. Returns `None` outside the closed set.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == label)
    }
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed registry key: a terrain kind, optionally specialised per country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub terrain: TerrainKind,
    pub country: Option<u32>,
}

impl TextureKey {
    pub fn plain(terrain: TerrainKind) -> Self {
        Self {
            terrain,
            country: None,
        }
    }

    pub fn variant(terrain: TerrainKind, country: u32) -> Self {
        Self {
            terrain,
            country: Some(country),
        }
    }

    /// File stem used on disk, e.g. `land_3` or `water`.
    pub fn file_stem(&self) -> String {
        match self.country {
            Some(c) => format!("{}_{}", self.terrain, c),
            None => self.terrain.to_string(),
        }
    }

    /// Inverse of [`TextureKey::file_stem`].
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        match stem.split_once('_') {
            Some((kind, country)) => Some(Self::variant(
                TerrainKind::parse(kind)?,
                country.parse().ok()?,
            )),
            None => Some(Self::plain(TerrainKind::parse(stem)?)),
        }
    }
}

/// Opaque handle to a registered texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Asset-registry capability consumed by [`TextureSelector`].
pub trait AssetRegistry {
    /// Exact lookup; no fallback.
    fn lookup(&self, key: TextureKey) -> Option<TextureHandle>;

    /// The land texture every chain ends in.
    fn land_default(&self) -> TextureHandle;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureEntry {
    pub key: TextureKey,
    pub path: PathBuf,
}

/// In-memory texture registry keyed by [`TextureKey`].
#[derive(Debug, Clone)]
pub struct TextureRegistry {
    entries: Vec<TextureEntry>,
    by_key: HashMap<TextureKey, TextureHandle>,
}

impl TextureRegistry {
    /// Creates a registry holding only the land default at `land_path`.
    pub fn new(land_path: PathBuf) -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
        };
        registry.register(TextureKey::plain(TerrainKind::Land), land_path);
        registry
    }

    /// Registers the fixed texture set: every kind plain plus variants `1..=6`.
    pub fn standard(dir: &Path) -> Self {
        let mut registry = Self::new(dir.join("land.jpg"));
        for kind in TerrainKind::ALL {
            for country in 1..=STANDARD_VARIANTS {
                let key = TextureKey::variant(kind, country);
                registry.register(key, dir.join(format!("{}.jpg", key.file_stem())));
            }
            let key = TextureKey::plain(kind);
            registry.register(key, dir.join(format!("{}.jpg", key.file_stem())));
        }
        registry
    }

    /// Registers whatever textures exist in `dir`.
    ///
    /// Files are matched by stem (`<kind>` or `<kind>_<n>`); unrelated files
    /// are ignored. The land default is registered even if `dir` lacks it.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut found: Vec<(TextureKey, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_texture = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| TEXTURE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if !is_texture {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(TextureKey::from_file_stem)
            else {
                log::trace!("Ignoring non-terrain texture {}", path.display());
                continue;
            };
            found.push((key, path));
        }
        // Directory order is platform dependent.
        found.sort_by(|a, b| a.1.cmp(&b.1));

        let land = TextureKey::plain(TerrainKind::Land);
        let land_path = found
            .iter()
            .find(|(k, _)| *k == land)
            .map(|(_, p)| p.clone())
            .unwrap_or_else(|| {
                log::warn!("No land texture in {}, using implicit default", dir.display());
                dir.join("land.jpg")
            });

        let mut registry = Self::new(land_path);
        for (key, path) in found {
            if key != land {
                registry.register(key, path);
            }
        }
        log::info!("Registered {} terrain textures from {}", registry.len(), dir.display());
        Ok(registry)
    }

    /// Registers `key`, replacing the path if it was already present.
    pub fn register(&mut self, key: TextureKey, path: PathBuf) -> TextureHandle {
        if let Some(&handle) = self.by_key.get(&key) {
            self.entries[handle.0 as usize].path = path;
            return handle;
        }
        let handle = TextureHandle(self.entries.len() as u32);
        self.entries.push(TextureEntry { key, path });
        self.by_key.insert(key, handle);
        handle
    }

    pub fn entry(&self, handle: TextureHandle) -> Option<&TextureEntry> {
        self.entries.get(handle.0 as usize)
    }

    /// Never zero: every constructor registers the land default.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl AssetRegistry for TextureRegistry {
    fn lookup(&self, key: TextureKey) -> Option<TextureHandle> {
        self.by_key.get(&key).copied()
    }

    fn land_default(&self) -> TextureHandle {
        // Registered first by every constructor.
        TextureHandle(0)
    }
}

/// Resolves terrain/country pairs through the fallback chain. Total.
pub struct TextureSelector<'a, R: AssetRegistry + ?Sized> {
    registry: &'a R,
}

impl<'a, R: AssetRegistry + ?Sized> TextureSelector<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    pub fn select(&self, terrain: &str, country: Option<u32>) -> TextureHandle {
        let Some(kind) = TerrainKind::parse(terrain) else {
            return self.registry.land_default();
        };
        country
            .and_then(|c| self.registry.lookup(TextureKey::variant(kind, c)))
            .or_else(|| self.registry.lookup(TextureKey::plain(kind)))
            .unwrap_or_else(|| self.registry.land_default())
    }
}

/// Extracts the owner index from a country label such as `"Country 3"`.
pub fn country_index(label: &str) -> Option<u32> {
    label.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(registry: &TextureRegistry, handle: TextureHandle) -> TextureKey {
        registry.entry(handle).unwrap().key
    }

    #[test]
    fn test_variant_wins_when_registered() {
        let registry = TextureRegistry::standard(Path::new("/textures"));
        let selector = TextureSelector::new(&registry);
        let h = selector.select("water", Some(3));
        assert_eq!(key_of(&registry, h), TextureKey::variant(TerrainKind::Water, 3));
        assert_eq!(
            registry.entry(h).unwrap().path,
            PathBuf::from("/textures/water_3.jpg")
        );
    }

    #[test]
    fn test_unknown_variant_falls_back_to_plain_kind() {
        let registry = TextureRegistry::standard(Path::new("/textures"));
        let selector = TextureSelector::new(&registry);
        let h = selector.select("mountain", Some(42));
        assert_eq!(key_of(&registry, h), TextureKey::plain(TerrainKind::Mountain));
    }

    #[test]
    fn test_no_country_selects_plain_kind() {
        let registry = TextureRegistry::standard(Path::new("/textures"));
        let selector = TextureSelector::new(&registry);
        for kind in TerrainKind::ALL {
            let h = selector.select(kind.as_str(), None);
            assert_eq!(key_of(&registry, h), TextureKey::plain(kind));
        }
    }

    #[test]
    fn test_missing_plain_kind_falls_back_to_land() {
        let mut registry = TextureRegistry::new(PathBuf::from("land.jpg"));
        registry.register(TextureKey::variant(TerrainKind::Water, 1), "water_1.jpg".into());
        let selector = TextureSelector::new(&registry);
        assert_eq!(selector.select("water", None), registry.land_default());
        assert_eq!(selector.select("water", Some(2)), registry.land_default());
        assert_ne!(selector.select("water", Some(1)), registry.land_default());
    }

    #[test]
    fn test_unrecognised_terrain_goes_straight_to_land() {
        let registry = TextureRegistry::standard(Path::new("t"));
        let selector = TextureSelector::new(&registry);
        assert_eq!(selector.select("lava", Some(1)), registry.land_default());
        assert_eq!(selector.select("", None), registry.land_default());
    }

    #[test]
    fn test_selection_is_total_and_deterministic() {
        let registry = TextureRegistry::new(PathBuf::from("land.jpg"));
        let selector = TextureSelector::new(&registry);
        for label in ["water", "land", "mountain", "swamp"] {
            for country in [None, Some(0), Some(1), Some(6), Some(u32::MAX)] {
                let a = selector.select(label, country);
                let b = selector.select(label, country);
                assert_eq!(a, b);
                assert!(registry.entry(a).is_some());
            }
        }
    }

    #[test]
    fn test_register_replaces_path_keeps_handle() {
        let mut registry = TextureRegistry::new(PathBuf::from("a.jpg"));
        let key = TextureKey::plain(TerrainKind::Land);
        let h = registry.register(key, PathBuf::from("b.jpg"));
        assert_eq!(h, registry.land_default());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entry(h).unwrap().path, PathBuf::from("b.jpg"));
    }

    #[test]
    fn test_standard_registry_size() {
        let registry = TextureRegistry::standard(Path::new("t"));
        assert_eq!(registry.len(), 3 * (STANDARD_VARIANTS as usize + 1));
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["water.jpg", "water_2.jpg", "mountain_1.png", "readme.txt", "sky.jpg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let registry = TextureRegistry::scan(dir.path()).unwrap();
        // Implicit land + three terrain files.
        assert_eq!(registry.len(), 4);
        assert!(registry.lookup(TextureKey::variant(TerrainKind::Water, 2)).is_some());
        assert!(registry.lookup(TextureKey::variant(TerrainKind::Mountain, 1)).is_some());
        assert!(registry.lookup(TextureKey::plain(TerrainKind::Mountain)).is_none());
        assert_eq!(
            registry.entry(registry.land_default()).unwrap().path,
            dir.path().join("land.jpg")
        );
    }

    #[test]
    fn test_file_stem_round_trip() {
        assert_eq!(
            TextureKey::from_file_stem("land_4"),
            Some(TextureKey::variant(TerrainKind::Land, 4))
        );
        assert_eq!(TextureKey::from_file_stem("land_x"), None);
        assert_eq!(TextureKey::from_file_stem("desert"), None);
        assert_eq!(TextureKey::variant(TerrainKind::Mountain, 2).file_stem(), "mountain_2");
    }

    #[test]
    fn test_country_index() {
        assert_eq!(country_index("Country 3"), Some(3));
        assert_eq!(country_index("Country"), None);
        assert_eq!(country_index("Country three"), None);
        assert_eq!(country_index(""), None);
    }
}

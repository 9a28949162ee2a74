//! Viewport Persistence
//!
//! Keeps the last map zoom and center in client-local key/value storage so
//! the map reopens where the user left it. Values are stored as JSON strings
//! under the `mapZoom` and `mapCenter` keys. Missing or malformed values are
//! never an error for the caller: the configured default view is used
//! instead.

use parking_lot::Mutex;
use sectormap_core::LatLng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{TileSettings, ViewSettings};
use crate::error::{PersistenceError, PersistenceResult};

/// Storage key for the zoom level.
pub const ZOOM_KEY: &str = "mapZoom";

/// Storage key for the map center.
pub const CENTER_KEY: &str = "mapCenter";

/// Client-local string key/value storage.
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;

    /// Writes a value.
    fn set(&self, key: &str, value: String) -> PersistenceResult<()>;

    /// Deletes a value.
    fn remove(&self, key: &str) -> PersistenceResult<()>;
}

/// In-memory storage scoped to the process, like a browser session.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> PersistenceResult<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Uses the file at `path`; it is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Uses `session.json` in the platform config directory.
    pub fn in_config_dir() -> PersistenceResult<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            PersistenceError::StorageDirectory("no platform config directory".to_string())
        })?;
        Self::in_dir(&base)
    }

    /// Uses `sectormap/session.json` under `base`, creating the directory.
    pub fn in_dir(base: &Path) -> PersistenceResult<Self> {
        let dir = base.join("sectormap");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::new(dir.join("session.json")))
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> PersistenceResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(PersistenceError::Corrupted(self.path.display().to_string())),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        let _guard = self.lock.lock();
        let map = self.read_all()?;
        Ok(map.get(key).and_then(|v| v.as_str()).map(str::to_string))
    }

    fn set(&self, key: &str, value: String) -> PersistenceResult<()> {
        let _guard = self.lock.lock();
        // A corrupted file is replaced rather than blocking every later write.
        let mut map = self.read_all().unwrap_or_default();
        map.insert(key.to_string(), Value::String(value));
        self.write_all(&map)
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_all().unwrap_or_default();
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

/// A view restored at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoredView {
    /// Map center
    pub center: LatLng,
    /// Zoom level
    pub zoom: f64,
    /// False when the default view was used
    pub from_storage: bool,
}

/// Reads and writes the persisted viewport.
#[derive(Clone)]
pub struct ViewportPersistence {
    storage: Arc<dyn KeyValueStorage>,
    default_view: ViewSettings,
    max_zoom: f64,
}

impl ViewportPersistence {
    /// Creates persistence over `storage` falling back to `default_view`.
    /// Persisted zooms above the default tile maximum are rejected.
    pub fn new(storage: Arc<dyn KeyValueStorage>, default_view: ViewSettings) -> Self {
        Self {
            storage,
            default_view,
            max_zoom: TileSettings::default().max_zoom,
        }
    }

    /// Highest zoom accepted from storage.
    pub fn with_max_zoom(mut self, max_zoom: f64) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// Persisted view, or the default when absent or malformed.
    pub fn restore(&self) -> RestoredView {
        match self.read_persisted() {
            Ok(Some((center, zoom))) => {
                tracing::debug!("Restored viewport {} @ z{}", center, zoom);
                RestoredView {
                    center,
                    zoom,
                    from_storage: true,
                }
            }
            Ok(None) => self.default_restored(),
            Err(reason) => {
                tracing::warn!("Ignoring persisted viewport: {}", reason);
                self.default_restored()
            }
        }
    }

    /// Persists the view.
    pub fn save(&self, center: LatLng, zoom: f64) -> PersistenceResult<()> {
        self.storage.set(ZOOM_KEY, serde_json::to_string(&zoom)?)?;
        self.storage
            .set(CENTER_KEY, serde_json::to_string(&center)?)?;
        Ok(())
    }

    /// Removes the persisted view.
    pub fn clear(&self) -> PersistenceResult<()> {
        self.storage.remove(ZOOM_KEY)?;
        self.storage.remove(CENTER_KEY)
    }

    fn default_restored(&self) -> RestoredView {
        RestoredView {
            center: self.default_view.center,
            zoom: self.default_view.zoom,
            from_storage: false,
        }
    }

    fn read_persisted(&self) -> Result<Option<(LatLng, f64)>, String> {
        let zoom = self.storage.get(ZOOM_KEY).map_err(|e| e.to_string())?;
        let center = self.storage.get(CENTER_KEY).map_err(|e| e.to_string())?;
        let (Some(zoom), Some(center)) = (zoom, center) else {
            return Ok(None);
        };

        let zoom: f64 = serde_json::from_str(&zoom).map_err(|e| format!("zoom: {}", e))?;
        let center: LatLng =
            serde_json::from_str(&center).map_err(|e| format!("center: {}", e))?;

        if !(0.0..=self.max_zoom).contains(&zoom) {
            return Err(format!("zoom out of range: {}", zoom));
        }
        if !center.is_finite() || center.lat.abs() > 90.0 {
            return Err(format!("center out of range: {}", center));
        }
        Ok(Some((center, zoom)))
    }
}

impl std::fmt::Debug for ViewportPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportPersistence")
            .field("default_view", &self.default_view)
            .field("max_zoom", &self.max_zoom)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persistence() -> (Arc<MemoryStorage>, ViewportPersistence) {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = ViewportPersistence::new(storage.clone(), ViewSettings::default());
        (storage, persistence)
    }

    #[test]
    fn test_restore_defaults_when_empty() {
        let (_, persistence) = persistence();
        let view = persistence.restore();
        assert!(!view.from_storage);
        assert_eq!(view.center, LatLng::new(48.0, 68.0));
        assert_eq!(view.zoom, 5.0);
    }

    #[test]
    fn test_save_then_restore() {
        let (storage, persistence) = persistence();
        persistence.save(LatLng::new(43.25, 76.95), 13.0).unwrap();

        assert_eq!(storage.get(ZOOM_KEY).unwrap().as_deref(), Some("13.0"));
        let view = persistence.restore();
        assert!(view.from_storage);
        assert_eq!(view.center, LatLng::new(43.25, 76.95));
        assert_eq!(view.zoom, 13.0);
    }

    #[test]
    fn test_malformed_center_falls_back() {
        let (storage, persistence) = persistence();
        storage.set(ZOOM_KEY, "14".to_string()).unwrap();
        storage.set(CENTER_KEY, "{not json".to_string()).unwrap();

        let view = persistence.restore();
        assert!(!view.from_storage);
        assert_eq!(view.zoom, 5.0);
    }

    #[test]
    fn test_missing_zoom_falls_back() {
        let (storage, persistence) = persistence();
        storage
            .set(CENTER_KEY, r#"{"lat":1.0,"lng":2.0}"#.to_string())
            .unwrap();
        assert!(!persistence.restore().from_storage);
    }

    #[test]
    fn test_out_of_range_latitude_falls_back() {
        let (storage, persistence) = persistence();
        storage.set(ZOOM_KEY, "10".to_string()).unwrap();
        storage
            .set(CENTER_KEY, r#"{"lat":123.0,"lng":2.0}"#.to_string())
            .unwrap();
        assert!(!persistence.restore().from_storage);
    }

    #[test]
    fn test_zoom_beyond_tiles_falls_back() {
        let (storage, persistence) = persistence();
        storage.set(ZOOM_KEY, "1e6".to_string()).unwrap();
        storage
            .set(CENTER_KEY, r#"{"lat":43.2,"lng":76.9}"#.to_string())
            .unwrap();
        let view = persistence.restore();
        assert!(!view.from_storage);
        assert_eq!(view.zoom, 5.0);

        storage.set(ZOOM_KEY, "15".to_string()).unwrap();
        assert!(!persistence.clone().with_max_zoom(14.0).restore().from_storage);
        assert!(persistence.restore().from_storage);
    }

    #[test]
    fn test_storage_dir_layout() {
        let base = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(base.path()).unwrap();
        assert_eq!(storage.path(), base.path().join("sectormap/session.json"));
        assert!(base.path().join("sectormap").is_dir());

        storage.set(ZOOM_KEY, "12.0".to_string()).unwrap();
        assert_eq!(storage.get(ZOOM_KEY).unwrap().as_deref(), Some("12.0"));
    }
}

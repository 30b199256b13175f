//! Cursor storage and persistence.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

/// Concurrent sensor-name → cursor storage, shared by every sensor task.
#[derive(Debug, Clone, Default)]
pub struct CursorStore {
    inner: Arc<DashMap<String, String>>,
}

impl CursorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load cursors from a JSON file. A missing file yields an empty store.
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let store = Self::new();
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: BTreeMap<String, String> = serde_json::from_reader(reader)?;
            for (name, cursor) in map {
                store.inner.insert(name, cursor);
            }
            tracing::info!(path = %path.display(), sensors = store.len(), "Loaded cursors");
        }
        Ok(store)
    }

    /// Save all cursors as a JSON object keyed by sensor name.
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        let map = self.snapshot();
        serde_json::to_writer_pretty(writer, &map)?;
        tracing::info!(path = %path.display(), sensors = map.len(), "Saved cursors");
        Ok(())
    }

    pub fn get(&self, sensor: &str) -> Option<String> {
        self.inner.get(sensor).map(|r| r.value().clone())
    }

    pub fn set(&self, sensor: &str, cursor: String) {
        self.inner.insert(sensor.to_string(), cursor);
    }

    /// Drop a sensor's cursor, as when an operator disables and re-enables it.
    pub fn clear(&self, sensor: &str) -> Option<String> {
        self.inner.remove(sensor).map(|(_, cursor)| cursor)
    }

    /// Sorted copy of every stored cursor.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

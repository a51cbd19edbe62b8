use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Keyed snapshot storage — the seam the original kept behind
/// localStorage. Keys are the `autosave_*` scheme from
/// [`crate::snapshot::PostKey`].
pub trait SnapshotStore {
    /// `Ok(None)` when nothing is stored; `Err(Corrupt)` when something is
    /// stored but does not parse, so the caller can purge it.
    fn get(&self, key: &str) -> Result<Option<Snapshot>, StoreError>;
    fn put(&mut self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Directory-backed store: one `<key>.json` file per snapshot.
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Io(format!("cannot create '{}': {}", dir.display(), e)))?;
        Ok(DirStore { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Snapshot>, StoreError> {
        let path = self.file_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "cannot read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn put(&mut self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        let path = self.file_for(key);
        fs::write(&path, raw).map_err(|e| {
            StoreError::Io(format!("cannot write '{}': {}", path.display(), e))
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.file_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(format!(
                "cannot remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            StoreError::Io(format!("cannot list '{}': {}", self.dir.display(), e))
        })?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StoreError::Io(format!("cannot list entry: {}", e)))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".json") {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-memory store for tests and embedding. Values are kept as raw JSON so
/// the corrupt-entry path behaves like the real thing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Plant a raw value, bypassing serialization. Lets tests exercise the
    /// corrupt-snapshot path.
    pub fn put_raw(&mut self, key: &str, raw: impl Into<String>) {
        self.entries.insert(key.to_string(), raw.into());
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Snapshot>, StoreError> {
        let Some(raw) = self.entries.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(raw).map(Some).map_err(|e| {
            StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn put(&mut self, key: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.entries.insert(key.to_string(), raw);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

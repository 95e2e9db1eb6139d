use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use esweb::prefs::{KeyValueStore, StoreError};
use tracing::warn;

use crate::error::Result;

/// A `localStorage` stand-in: one JSON object of string values on disk.
///
/// The whole file is rewritten on every `set`; preferences are small.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`. A missing file is an empty store; an unreadable one is
    /// logged and treated as empty, like corrupt browser storage.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt preference file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> std::result::Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            if let Err(e) = self.flush() {
                warn!(key, error = %e, "failed to persist removal");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esweb::prefs::{PreferenceStore, SystemSort, GAMES_KEY};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("esweb-{tag}-{}-{nanos}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = scratch_dir("missing");
        let store = FileStore::open(dir.join("prefs.json")).unwrap();
        assert_eq!(store.get(GAMES_KEY), None);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn preferences_survive_reopen() {
        let dir = scratch_dir("reopen");
        let path = dir.join("prefs.json");

        let mut prefs = PreferenceStore::new(FileStore::open(&path).unwrap());
        let mut loaded = prefs.load();
        loaded.systems.sort = SystemSort::Alpha;
        loaded.systems.pinned.insert("snes".into());
        prefs.save(&loaded);

        let mut again = PreferenceStore::new(FileStore::open(&path).unwrap());
        assert_eq!(again.load(), loaded);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = scratch_dir("corrupt");
        let path = dir.join("prefs.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(GAMES_KEY), None);
        fs::remove_dir_all(dir).ok();
    }
}

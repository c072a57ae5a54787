use chrono::{DateTime, Utc};
use library_sync_models::MovieEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Store handle shared by the reconciler and the webhook receiver.
///
/// Every mutation happens under the lock and flushes before releasing it.
pub type SharedStore = Arc<Mutex<JsonStore>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access store file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {} is not a valid store document: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    movies: BTreeMap<String, MovieEntry>,
}

/// Persisted snapshot of tracked library entries, keyed by provider id.
///
/// The whole document is rewritten on every mutation. Writes go to a sibling
/// temp file first and are renamed over the target, so the file on disk is
/// always a complete document.
#[derive(Debug)]
pub struct JsonStore {
    path: Option<PathBuf>,
    data: StoreDocument,
}

impl JsonStore {
    /// Read the store document at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let data = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                StoreDocument::default()
            } else {
                serde_json::from_str(&content).map_err(|source| StoreError::Json {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            debug!("Store file {} does not exist, starting empty", path.display());
            StoreDocument::default()
        };

        info!(
            operation = "store_open",
            path = %path.display(),
            entries = data.movies.len(),
            "Loaded store"
        );

        Ok(Self {
            path: Some(path),
            data,
        })
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: StoreDocument::default(),
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn get(&self, provider_id: &str) -> Option<&MovieEntry> {
        self.data.movies.get(provider_id)
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.data.movies.contains_key(provider_id)
    }

    pub fn len(&self) -> usize {
        self.data.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.movies.is_empty()
    }

    /// Owned copy of every entry, in key order.
    pub fn entries(&self) -> Vec<(String, MovieEntry)> {
        self.data
            .movies
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Insert or replace an entry and flush. The in-memory map is rolled back
    /// if the flush fails.
    pub fn set(&mut self, provider_id: impl Into<String>, entry: MovieEntry) -> Result<(), StoreError> {
        let provider_id = provider_id.into();
        let previous = self.data.movies.insert(provider_id.clone(), entry);
        if let Err(e) = self.flush() {
            match previous {
                Some(prev) => self.data.movies.insert(provider_id, prev),
                None => self.data.movies.remove(&provider_id),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove an entry and flush. Returns the removed entry, if any.
    pub fn delete(&mut self, provider_id: &str) -> Result<Option<MovieEntry>, StoreError> {
        let Some(removed) = self.data.movies.remove(provider_id) else {
            return Ok(None);
        };
        if let Err(e) = self.flush() {
            self.data.movies.insert(provider_id.to_string(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Set `last_seen = now` on every listed entry, flushing once.
    /// Returns how many entries changed.
    pub fn touch_seen(&mut self, provider_ids: &HashSet<String>, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let snapshot = self.data.clone();
        let mut changed = 0;
        for (key, entry) in self.data.movies.iter_mut() {
            if provider_ids.contains(key) {
                let before = entry.last_seen.clone();
                entry.mark_seen(now);
                if entry.last_seen != before {
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            if let Err(e) = self.flush() {
                self.data = snapshot;
                return Err(e);
            }
        }
        Ok(changed)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let content = serde_json::to_vec_pretty(&self.data).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let temp_path = temp_path_for(path);
        std::fs::write(&temp_path, content).map_err(io_err)?;
        std::fs::rename(&temp_path, path).map_err(io_err)?;

        debug!(
            operation = "store_flush",
            entries = self.data.movies.len(),
            "Flushed store"
        );
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path().join("db.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_flushes_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("db.json");

        let mut store = JsonStore::open(&path).unwrap();
        store
            .set("tmdb:603", MovieEntry::observed(Some("2023-01-01".to_string()), at(1)))
            .unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["movies"]["tmdb:603"]["baseline"], "2023-01-01");
        assert_eq!(raw["movies"]["tmdb:603"]["lastSeen"], "2024-05-01T01:00:00.000Z");
        assert!(!dir.path().join("nested").join("db.json.tmp").exists());

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.get("tmdb:603"), store.get("tmdb:603"));
    }

    #[test]
    fn test_delete_flushes_and_returns_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let mut store = JsonStore::open(&path).unwrap();
        store.set("tvdb:1", MovieEntry::observed(None, at(1))).unwrap();
        store.set("tvdb:2", MovieEntry::observed(None, at(1))).unwrap();

        assert!(store.delete("tvdb:1").unwrap().is_some());
        assert!(store.delete("tvdb:1").unwrap().is_none());

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.contains("tvdb:2"));
    }

    #[test]
    fn test_touch_seen_only_listed_entries() {
        let mut store = JsonStore::in_memory();
        store.set("tmdb:1", MovieEntry::observed(None, at(1))).unwrap();
        store.set("tmdb:2", MovieEntry::observed(None, at(1))).unwrap();

        let seen: HashSet<String> = ["tmdb:1".to_string(), "tmdb:9".to_string()].into_iter().collect();
        assert_eq!(store.touch_seen(&seen, at(5)).unwrap(), 1);
        assert_eq!(store.touch_seen(&seen, at(5)).unwrap(), 0);

        assert_eq!(store.get("tmdb:1").unwrap().last_seen_at().unwrap(), at(5));
        assert_eq!(store.get("tmdb:2").unwrap().last_seen_at().unwrap(), at(1));
        assert!(!store.contains("tmdb:9"));
    }

    #[test]
    fn test_open_reads_existing_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(
            &path,
            r#"{"movies": {"imdb:tt0133093": {"baseline": "x", "lastSeen": "2024-01-01T00:00:00.000Z"}}}"#,
        )
        .unwrap();

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.get("imdb:tt0133093").unwrap().baseline.as_deref(), Some("x"));
    }

    #[test]
    fn test_open_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonStore::open(&path), Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_failed_flush_rolls_back() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("db.json");
        std::fs::create_dir(&path).unwrap();
        let mut store = JsonStore {
            path: Some(path),
            data: StoreDocument::default(),
        };

        assert!(store.set("tmdb:1", MovieEntry::observed(None, at(1))).is_err());
        assert!(!store.contains("tmdb:1"));
    }
}

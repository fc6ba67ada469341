//! Client-side persistence: continue-watching record, fullscreen intent and watchlist
//!
//! Two scopes back the records. The durable scope survives restarts (a JSON file under the
//! config dir); the session scope lives as long as the process. Values are JSON strings
//! stored under fixed keys.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{Film, WatchProgress};

pub const WATCHLIST_KEY: &str = "watchlist";
pub const CONTINUE_WATCHING_KEY: &str = "continueWatching";
pub const FULLSCREEN_INTENT_KEY: &str = "wasFullscreen";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value backend
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-process backend: the session scope, and the fake used in tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Durable backend: one JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Discarding unreadable storage file {}: {}", path.display(), e);
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// `<config_dir>/dracin_player/storage.json`
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(AppConfig::data_path("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a sibling temp file and renames it over the store, so a torn write never
    /// replaces the previous contents
    fn flush(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// The playback-facing contract. Exactly one progress record exists at a time.
pub trait ProgressStore {
    /// Overwrites whatever record was there, whichever film it belonged to
    fn save_progress(&mut self, progress: &WatchProgress) -> Result<(), StoreError>;
    fn load_progress(&self) -> Option<WatchProgress>;
    fn set_fullscreen_intent(&mut self) -> Result<(), StoreError>;
    /// Read-and-clear; true at most once per set
    fn consume_fullscreen_intent(&mut self) -> bool;
}

impl<T: ProgressStore + ?Sized> ProgressStore for &mut T {
    fn save_progress(&mut self, progress: &WatchProgress) -> Result<(), StoreError> {
        (**self).save_progress(progress)
    }

    fn load_progress(&self) -> Option<WatchProgress> {
        (**self).load_progress()
    }

    fn set_fullscreen_intent(&mut self) -> Result<(), StoreError> {
        (**self).set_fullscreen_intent()
    }

    fn consume_fullscreen_intent(&mut self) -> bool {
        (**self).consume_fullscreen_intent()
    }
}

/// Durable + session scopes behind one object
#[derive(Debug)]
pub struct Storage<D = FileStore, S = MemoryStore> {
    durable: D,
    session: S,
}

impl Storage {
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(FileStore::open_default()?, MemoryStore::new()))
    }
}

impl Storage<MemoryStore, MemoryStore> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), MemoryStore::new())
    }
}

impl<D: KeyValueStore, S: KeyValueStore> Storage<D, S> {
    pub fn new(durable: D, session: S) -> Self {
        Self { durable, session }
    }

    pub fn durable(&self) -> &D {
        &self.durable
    }

    fn read_json<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
        let raw = store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt '{}' record: {}", key, e);
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(store: &mut impl KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
        store.set(key, serde_json::to_string(value)?)
    }

    /// Saved films, oldest first
    pub fn watchlist(&self) -> Vec<Film> {
        Self::read_json(&self.durable, WATCHLIST_KEY).unwrap_or_default()
    }

    pub fn in_watchlist(&self, book_id: &str) -> bool {
        self.watchlist().iter().any(|f| f.book_id == book_id)
    }

    /// Removes the film if present (by `bookId`), appends it otherwise.
    /// Returns whether the film is in the list afterwards.
    pub fn toggle_watchlist(&mut self, film: &Film) -> Result<bool, StoreError> {
        let mut list = self.watchlist();
        let added = if let Some(pos) = list.iter().position(|f| f.book_id == film.book_id) {
            list.remove(pos);
            false
        } else {
            list.push(film.clone());
            true
        };

        Self::write_json(&mut self.durable, WATCHLIST_KEY, &list)?;
        debug!(
            "{} '{}' {} watchlist",
            if added { "Added" } else { "Removed" },
            film.book_name,
            if added { "to" } else { "from" }
        );
        Ok(added)
    }
}

impl<D: KeyValueStore, S: KeyValueStore> ProgressStore for Storage<D, S> {
    fn save_progress(&mut self, progress: &WatchProgress) -> Result<(), StoreError> {
        let record = WatchProgress {
            saved_at: Some(chrono::Utc::now().timestamp()),
            ..progress.clone()
        };
        Self::write_json(&mut self.durable, CONTINUE_WATCHING_KEY, &record)
    }

    fn load_progress(&self) -> Option<WatchProgress> {
        Self::read_json(&self.durable, CONTINUE_WATCHING_KEY)
    }

    fn set_fullscreen_intent(&mut self) -> Result<(), StoreError> {
        self.session.set(FULLSCREEN_INTENT_KEY, "true".to_string())
    }

    fn consume_fullscreen_intent(&mut self) -> bool {
        let Some(raw) = self.session.get(FULLSCREEN_INTENT_KEY) else {
            return false;
        };
        if let Err(e) = self.session.remove(FULLSCREEN_INTENT_KEY) {
            warn!("Failed to clear fullscreen intent: {}", e);
        }
        raw == "true"
    }
}

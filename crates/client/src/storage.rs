//! Durable key/value storage for the persisted session blob.
//!
//! Backends mirror what a browser offers through `localStorage`: a flat
//! string-to-string map where every write is a full overwrite.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store holding serialized client state.
///
/// Implementations must be cheap to share behind an `Arc`; the session store
/// calls them synchronously from inside async code but never across an await.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage. Clones share the same map, so two session stores
/// built over clones of one `MemoryStorage` see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing any serialization (used to plant corrupt
    /// blobs in tests).
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        self
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::{Storage, StorageError};

    /// One file per key (`{dir}/{key}.json`).
    ///
    /// Writes go to a sibling temp file first and are renamed into place, so a
    /// crash mid-write leaves either the old blob or the new one.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        /// `{app_data_dir}/loyalty`, falling back to `~/.local/share/loyalty`.
        pub fn default_dir() -> Result<PathBuf, StorageError> {
            let base = dirs::data_dir()
                .or_else(|| {
                    dirs::home_dir().map(|mut h| {
                        h.push(".local");
                        h.push("share");
                        h
                    })
                })
                .ok_or_else(|| {
                    StorageError::Unavailable(
                        "failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share"
                            .to_string(),
                    )
                })?;

            Ok(base.join("loyalty"))
        }

        fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
            let valid = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                return Err(StorageError::InvalidKey(key.to_string()));
            }
            Ok(self.dir.join(format!("{key}.json")))
        }
    }

    fn io_error(path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    impl Storage for FileStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            let path = self.path_for(key)?;
            match fs::read_to_string(&path) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error(&path, e)),
            }
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let path = self.path_for(key)?;
            fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, value).map_err(|e| io_error(&tmp, e))?;
            fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            let path = self.path_for(key)?;
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error(&path, e)),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStorage;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{Storage, StorageError};

    /// `window.localStorage`.
    ///
    /// Holds no handle: `web_sys::Storage` is not `Send`, so the storage object
    /// is looked up on every call.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BrowserStorage;

    impl BrowserStorage {
        fn local_storage() -> Result<web_sys::Storage, StorageError> {
            let window = web_sys::window()
                .ok_or_else(|| StorageError::Unavailable("no window object".to_string()))?;
            window
                .local_storage()
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
                .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))
        }
    }

    impl Storage for BrowserStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Self::local_storage()?
                .get_item(key)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            Self::local_storage()?
                .set_item(key, value)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Self::local_storage()?
                .remove_item(key)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }
    }
}

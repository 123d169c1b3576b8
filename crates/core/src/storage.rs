//! Durable key-value storage backends.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Errors from a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error while {operation} '{key}' at {path}: {source}")]
    Io {
        operation: &'static str,
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("storing '{key}' needs {needed} bytes but the quota is {quota} bytes")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("failed to encode message history: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    fn io(
        operation: &'static str,
        key: &str,
        path: &Path,
        source: io::Error,
    ) -> Self {
        Self::Io {
            operation,
            key: key.to_owned(),
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A string-keyed store of string values that survives restarts.
pub trait KeyValueStore: Send + 'static {
    /// Returns the value for `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    #[inline]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Stores every key as a file inside a directory.
///
/// Values are written to a temporary sibling first and renamed into place,
/// so a reader never observes a half-written value.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on the
    /// first write.
    #[inline]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io("reading", key, &path, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| {
            StorageError::io("creating directory for", key, &self.dir, source)
        })?;

        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp_path, value).map_err(|source| {
            StorageError::io("writing", key, &tmp_path, source)
        })?;
        fs::rename(&tmp_path, &path)
            .map_err(|source| StorageError::io("replacing", key, &path, source))
    }
}

/// An in-memory store, shared between clones.
///
/// An optional quota limits the total size of all values, the way browser
/// storage does.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the total byte size of all stored values.
    #[inline]
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    quota,
                });
            }
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

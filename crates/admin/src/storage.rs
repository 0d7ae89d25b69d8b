//! Persisted client state.
//!
//! A flat string key-value store, the local equivalent of browser storage.
//! Writes of several keys are all-or-nothing: [`FileStorage`] rewrites the
//! whole document through a temporary file and a rename.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value persistence used by the session store.
pub trait Storage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write several values in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written; in that
    /// case none of the values are visible to later reads.
    fn set_all(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    /// Remove several keys in one atomic step. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError>;
}

type Document = BTreeMap<String, String>;

/// JSON file storage.
///
/// The whole document is small (a token and a user), so every write
/// rewrites it.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage backed by the file at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Document, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Document::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, document: &Document) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = document.len(), "Storage written");
        Ok(())
    }
}

/// The file holds a bearer token; keep it readable by the owner only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.remove(key))
    }

    fn set_all(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut document = self.read()?;
        for (key, value) in entries {
            document.insert((*key).to_owned(), value.clone());
        }
        self.write(&document)
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let (mut document, corrupt) = match self.read() {
            Ok(document) => (document, false),
            // A corrupt file is replaced rather than blocking the removal.
            Err(StorageError::Serialization(_)) => (Document::new(), true),
            Err(e) => return Err(e),
        };
        let before = document.len();
        for key in keys {
            document.remove(*key);
        }
        if document.len() == before && !corrupt {
            return Ok(());
        }
        self.write(&document)
    }
}

/// In-process storage, for tests and for callers that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<Document>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no key is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_all(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut stored = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            stored.insert((*key).to_owned(), value.clone());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut stored = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            stored.remove(*key);
        }
        Ok(())
    }
}

impl<T: Storage + ?Sized> Storage for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set_all(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        (**self).set_all(entries)
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        (**self).remove_all(keys)
    }
}

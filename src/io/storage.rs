use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;

use super::lock::{DEFAULT_LOCK_TIMEOUT, LockError, WriteLock};

/// Error type for durable storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key {0:?}: use letters, digits, '-', '_' or '.'")]
    InvalidKey(String),
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("storage is read-only")]
    ReadOnly,
}

/// One write in a batch handed to [`Storage::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp<'a> {
    Set { key: &'a str, value: &'a str },
    Remove { key: &'a str },
}

impl WriteOp<'_> {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Set { key, .. } | WriteOp::Remove { key } => key,
        }
    }
}

/// Key-value durable storage, the local-storage analogue.
///
/// Values are whole strings; there are no partial updates.
pub trait Storage {
    /// Read the value under `key`. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replace the value under `key`. Must be durable when it returns.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[WriteOp::Set { key, value }])
    }
    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.apply(&[WriteOp::Remove { key }])
    }
    /// Perform `ops` in order as one unit: every key is checked before the
    /// first write, and no other writer interleaves with the batch.
    fn apply(&mut self, ops: &[WriteOp<'_>]) -> Result<(), StorageError>;
}

pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// In-memory storage
// ---------------------------------------------------------------------------

/// Storage that lives only as long as the value. Used for tests and
/// throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `set`/`remove` fails with [`StorageError::ReadOnly`]
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn apply(&mut self, ops: &[WriteOp<'_>]) -> Result<(), StorageError> {
        for op in ops {
            validate_key(op.key())?;
        }
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        for op in ops {
            match *op {
                WriteOp::Set { key, value } => {
                    self.entries.insert(key.to_string(), value.to_string());
                }
                WriteOp::Remove { key } => {
                    self.entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed storage
// ---------------------------------------------------------------------------

/// One file per key (`<dir>/<key>.json`). Each file is replaced atomically
/// and each batch runs under the directory's [`WriteLock`].
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
        Ok(FileStorage {
            dir,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// How long a batch waits for another writer before failing
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadError { path, source: e }),
        }
    }

    fn apply(&mut self, ops: &[WriteOp<'_>]) -> Result<(), StorageError> {
        for op in ops {
            validate_key(op.key())?;
        }
        let _lock = WriteLock::acquire(&self.dir, self.lock_timeout)?;
        for op in ops {
            let path = self.path_for(op.key());
            let result = match *op {
                WriteOp::Set { value, .. } => atomic_write(&path, value.as_bytes()),
                WriteOp::Remove { .. } => match fs::remove_file(&path) {
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                    other => other,
                },
            };
            result.map_err(|e| StorageError::WriteError { path, source: e })?;
        }
        Ok(())
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

//! Key-value persistence collaborators.
//!
//! The journal only needs a cookie-like store: read a string by key, write a
//! string with a path and a max age. Writes are best-effort; callers get the
//! error back as a value and decide how loud to be about it.

use chrono::Duration;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors a store can report.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("could not encode stored data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("value for '{key}' is {size} bytes, limit is {limit}")]
    ValueTooLarge {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("{} is corrupt ({source}){}", .file.display(), backup_note(.backup))]
    Corrupt {
        file: PathBuf,
        backup: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },
}

fn backup_note(backup: &Option<PathBuf>) -> String {
    match backup {
        Some(path) => format!(", copy kept at {}", path.display()),
        None => String::new(),
    }
}

/// Attributes attached to a written value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub path: String,
    pub max_age: Duration,
}

impl WriteOptions {
    /// One year, rooted at `/`.
    pub fn long_lived() -> Self {
        WriteOptions {
            path: "/".to_string(),
            max_age: Duration::seconds(31_536_000),
        }
    }
}

pub trait KeyValueStore {
    /// `Ok(None)` when the key is absent. `Err` when the store itself cannot
    /// be read, which is not the same as an empty store.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&mut self, key: &str, value: &str, options: &WriteOptions) -> Result<(), StoreError>;
}

pub(crate) fn check_size(key: &str, value: &str, limit: Option<usize>) -> Result<(), StoreError> {
    match limit {
        Some(limit) if value.len() > limit => Err(StoreError::ValueTooLarge {
            key: key.to_string(),
            size: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    max_value_bytes: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_value_bytes: usize) -> Self {
        MemoryStore {
            max_value_bytes: Some(max_value_bytes),
            ..Self::default()
        }
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }

    /// Number of accepted writes.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str, _options: &WriteOptions) -> Result<(), StoreError> {
        check_size(key, value, self.max_value_bytes)?;
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

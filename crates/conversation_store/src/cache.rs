use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

/// Value persisted in the request-state cache.
///
/// Untagged on the wire: `true`, `3`, `3.5` and `"text"` all round-trip to
/// their own variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CacheValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Small key→value store surviving between invocations.
///
/// Absence is meaningful at the call site; the store itself never invents
/// defaults.
pub trait RequestStateCache {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, StoreError>;

    /// Overwrites in place; the whole backing store is rewritten.
    fn set(&mut self, key: &str, value: CacheValue) -> Result<(), StoreError>;

    /// Removes one key. Deleting an absent key is a no-op.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

/// File-backed cache: a single flat JSON object, fully rewritten on every set.
#[derive(Debug, Clone)]
pub struct FileRequestStateCache {
    path: PathBuf,
}

impl FileRequestStateCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, CacheValue>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|source| StoreError::io("reading cache store", &self.path, source))?;

        // A torn write from a racing invocation reads as an empty cache
        // rather than an error; the next set rewrites the file whole.
        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    %error,
                    "cache store is unreadable; treating as empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn persist(&self, map: &BTreeMap<String, CacheValue>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::io("creating data directory", parent, source))?;
        }

        let contents =
            serde_json::to_string(map).map_err(|source| StoreError::serialize(&self.path, source))?;
        fs::write(&self.path, contents)
            .map_err(|source| StoreError::io("rewriting cache store", &self.path, source))
    }
}

impl RequestStateCache for FileRequestStateCache {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, StoreError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: CacheValue) -> Result<(), StoreError> {
        let mut map = self.load()?;
        map.insert(key.to_string(), value);
        self.persist(&map)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.persist(&map)?;
        }
        Ok(())
    }
}

/// In-memory cache for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRequestStateCache {
    map: BTreeMap<String, CacheValue>,
}

impl MemoryRequestStateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestStateCache for MemoryRequestStateCache {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, StoreError> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: CacheValue) -> Result<(), StoreError> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }
}

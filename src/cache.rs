//! Answer cache
//!
//! Exact-match `transcript -> answer` storage. Keys are compared byte for
//! byte: no case folding, no trimming. No expiry, no eviction.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{Error, Result};

/// A cached `(transcript, answer)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
}

/// Persistent key-value store for answers
pub trait AnswerStore: Send + Sync {
    /// Look up the answer stored for `key`
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; returns whether it was present
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn remove(&self, key: &str) -> Result<bool>;

    /// All entries ordered by key
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn entries(&self) -> Result<Vec<CacheEntry>>;

    /// Remove every entry; returns how many were removed
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn clear(&self) -> Result<usize>;
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Cache("memory store lock poisoned".to_string()))
    }
}

impl AnswerStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self
            .lock()?
            .iter()
            .map(|(key, value)| CacheEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    fn clear(&self) -> Result<usize> {
        let mut entries = self.lock()?;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("hello").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemoryStore::new();
        store.set("hello", "hi").unwrap();
        store.set("hello", "hi there").unwrap();

        assert_eq!(store.get("hello").unwrap().as_deref(), Some("hi there"));
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_keys_are_exact() {
        let store = MemoryStore::new();
        store.set("hello", "hi there").unwrap();

        assert!(store.get("Hello").unwrap().is_none());
        assert!(store.get("hello ").unwrap().is_none());
        assert!(store.get(" hello").unwrap().is_none());
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let store = MemoryStore::new();
        store.set("bye", "goodbye").unwrap();

        let first = store.get("bye").unwrap();
        let second = store.get("bye").unwrap();
        assert_eq!(first, second);

        assert_eq!(store.get("nope").unwrap(), store.get("nope").unwrap());
    }

    #[test]
    fn test_remove_and_clear() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.clear().unwrap(), 1);
        assert!(store.entries().unwrap().is_empty());
    }
}

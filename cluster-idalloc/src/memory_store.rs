use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Error, IdStore, Result};

/// In-process `IdStore`.
///
/// Clones share the same map, so several allocators built from clones behave
/// like independent nodes talking to one store. Every operation runs under a
/// single lock, which makes it trivially linearizable.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    lists: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

/// Counters of store calls, for asserting how much traffic an operation caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub lists: u64,
    pub writes: u64,
    pub deletes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            lists: self.inner.lists.load(Ordering::Acquire),
            writes: self.inner.writes.load(Ordering::Acquire),
            deletes: self.inner.deletes.load(Ordering::Acquire),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        Ok(self.entries()?.clone())
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.inner
            .entries
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl IdStore for MemoryStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.lists.fetch_add(1, Ordering::AcqRel);
        let entries = self.entries()?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn list_values(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.inner.lists.fetch_add(1, Ordering::AcqRel);
        let entries = self.entries()?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        self.inner.writes.fetch_add(1, Ordering::AcqRel);
        let mut entries = self.entries()?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.deletes.fetch_add(1, Ordering::AcqRel);
        Ok(self.entries()?.remove(key).is_some())
    }
}

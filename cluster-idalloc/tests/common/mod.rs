//! Store wrappers that inject races and failures around `MemoryStore`.

#![allow(dead_code)]

use async_trait::async_trait;
use cluster_idalloc::{Error, IdStore, IdentityRecord, MemoryStore, Result};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

pub const PREFIX: &str = "allocatedIDs/";

/// Seed `store` with records `(owner, id)` as if other nodes had allocated them.
pub async fn seed(store: &MemoryStore, records: &[(&str, u32)]) {
    for (owner, id) in records {
        let value = IdentityRecord::new(*owner, *id).encode().unwrap();
        assert!(store
            .put_if_absent(&format!("{}{}", PREFIX, id), value)
            .await
            .unwrap());
    }
}

/// Owner recorded at `<prefix><id>`, if any.
pub fn owner_of(store: &MemoryStore, id: u32) -> Option<String> {
    store
        .get(&format!("{}{}", PREFIX, id))
        .unwrap()
        .map(|v| IdentityRecord::decode(&v).unwrap().name)
}

/// Lets a competing node win the first conditional write this store sees.
///
/// Right before the first `put_if_absent`, the competitor's record is written
/// at the very same key, which is exactly what happens when two nodes compute
/// the same gap from the same listing.
pub struct RacingStore {
    pub inner: MemoryStore,
    competitor: String,
    raced: AtomicBool,
    pub puts: AtomicU32,
    pub contested: Mutex<Vec<String>>,
}

impl RacingStore {
    pub fn new(inner: MemoryStore, competitor: &str) -> Self {
        Self {
            inner,
            competitor: competitor.to_string(),
            raced: AtomicBool::new(false),
            puts: AtomicU32::new(0),
            contested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IdStore for RacingStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list_keys(prefix).await
    }

    async fn list_values(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.inner.list_values(prefix).await
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        self.puts.fetch_add(1, Ordering::AcqRel);
        if !self.raced.swap(true, Ordering::AcqRel) {
            let id = cluster_idalloc::id_from_key(PREFIX, key)?;
            let theirs = IdentityRecord::new(self.competitor.as_str(), id).encode()?;
            assert!(self.inner.put_if_absent(key, theirs).await?);
            self.contested.lock().unwrap().push(key.to_string());
        }
        self.inner.put_if_absent(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }
}

/// Every conditional write loses, as under extreme contention.
#[derive(Default)]
pub struct ContendedStore {
    pub inner: MemoryStore,
    pub puts: AtomicU32,
}

#[async_trait]
impl IdStore for ContendedStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list_keys(prefix).await
    }

    async fn list_values(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.inner.list_values(prefix).await
    }

    async fn put_if_absent(&self, _key: &str, _value: Vec<u8>) -> Result<bool> {
        self.puts.fetch_add(1, Ordering::AcqRel);
        Ok(false)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }
}

/// Fails selected operations with a store error until switched off.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_lists: AtomicBool,
    pub fail_puts: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub puts: AtomicU32,
}

impl FlakyStore {
    fn check(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::Acquire) {
            return Err(Error::Store(format!("{} unavailable", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl IdStore for FlakyStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Self::check(&self.fail_lists, "list")?;
        self.inner.list_keys(prefix).await
    }

    async fn list_values(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Self::check(&self.fail_lists, "list")?;
        self.inner.list_values(prefix).await
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        self.puts.fetch_add(1, Ordering::AcqRel);
        Self::check(&self.fail_puts, "put")?;
        self.inner.put_if_absent(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Self::check(&self.fail_deletes, "delete")?;
        self.inner.delete(key).await
    }
}

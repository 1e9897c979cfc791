use async_trait::async_trait;
use std::sync::Arc;

use crate::Result;

/// Minimal view of a linearizable key-value store.
///
/// `put_if_absent` must be a single atomic create-if-not-exists as seen by
/// every client; the allocator's uniqueness guarantee rests on it. Listings
/// may lag slightly since every allocation is re-validated by the
/// conditional write.
#[async_trait]
pub trait IdStore: Send + Sync {
    /// All keys starting with `prefix`.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// All `(key, value)` pairs whose key starts with `prefix`.
    async fn list_values(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Write `value` at `key` only if `key` does not exist. Returns whether the write happened.
    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool>;

    /// Remove `key`. Returns `false` if it was already absent, which is not an error.
    async fn delete(&self, key: &str) -> Result<bool>;
}

#[async_trait]
impl<T: IdStore + ?Sized> IdStore for Arc<T> {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).list_keys(prefix).await
    }

    async fn list_values(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        (**self).list_values(prefix).await
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        (**self).put_if_absent(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key).await
    }
}

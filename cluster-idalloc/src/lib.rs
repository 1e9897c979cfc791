//! Dense, stable node IDs coordinated through a linearizable key-value store.
//!
//! This crate provides:
//! - Cluster-unique numeric IDs drawn from the smallest free value (1, 2, 3, ...)
//! - Race resolution via the store's atomic create-if-absent write
//! - Restart stability: a node with the same owner label gets its old ID back
//! - Redis-backed store (`SET NX`) and an in-memory store for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use cluster_idalloc::{IdAllocator, RedisStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let redis_url = std::env::var("REDIS_URL")?;
//!     let store = RedisStore::connect(&redis_url).await?;
//!
//!     // Owner label must be stable across restarts to keep the same ID
//!     let allocator = IdAllocator::new(store, "vpp-node-3")?;
//!
//!     let node_id = allocator.acquire().await?;
//!     println!("node id: {}", node_id);
//!
//!     // Hand the ID back when the node leaves the cluster
//!     allocator.release().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Store Layout
//!
//! Each allocation is one key, `allocatedIDs/<id>`, whose value is
//! `{"name":"<owner>","id":<id>}`. Released IDs leave a gap that the next
//! allocation fills.
//!
//! # Failure Handling
//!
//! - **Lost race**: re-list and retry, up to `max_attempts` (default 10)
//! - **Store error**: returned immediately, never retried
//! - **Crash**: the ID stays allocated; there are no leases, so nothing reclaims it

mod allocator;
mod config;
mod error;
mod memory_store;
mod record;
#[cfg(feature = "redis")]
mod redis_store;
mod store;

pub use allocator::{AllocationState, IdAllocator};
pub use config::{AllocatorConfig, DEFAULT_KEY_PREFIX, DEFAULT_MAX_ATTEMPTS};
pub use error::{Error, Result};
pub use memory_store::{MemoryStore, StoreStats};
pub use record::{first_available_id, id_from_key, key_for, IdentityRecord};
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use store::IdStore;

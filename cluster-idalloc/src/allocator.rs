use tokio::sync::Mutex;

use crate::record::{first_available_id, id_from_key, key_for, IdentityRecord};
use crate::{AllocatorConfig, Error, IdStore, Result};

/// What this node believes it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationState {
    Unallocated,
    Allocated(u32),
}

/// Hands out a dense, cluster-unique numeric ID to this node.
///
/// Each allocation is a record `{name: owner, id}` stored at `<prefix><id>`.
/// New IDs fill the lowest gap in the existing set, and the store's
/// create-if-absent write decides races between nodes that picked the same
/// gap. A restarted node finds its previous ID again by owner name.
///
/// The whole acquire/release sequence runs under one async mutex, so callers
/// sharing an `Arc<IdAllocator<_>>` never allocate twice.
pub struct IdAllocator<S> {
    store: S,
    owner: String,
    config: AllocatorConfig,
    state: Mutex<AllocationState>,
}

impl<S: IdStore> IdAllocator<S> {
    /// Create an allocator with the default key prefix and retry budget.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `owner` is empty.
    pub fn new(store: S, owner: impl Into<String>) -> Result<Self> {
        Self::with_config(store, owner, AllocatorConfig::default())
    }

    pub fn with_config(
        store: S,
        owner: impl Into<String>,
        config: AllocatorConfig,
    ) -> Result<Self> {
        let owner = owner.into();
        if owner.is_empty() {
            return Err(Error::Config("owner label must not be empty".into()));
        }
        config.validate()?;

        Ok(Self {
            store,
            owner,
            config,
            state: Mutex::new(AllocationState::Unallocated),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub async fn state(&self) -> AllocationState {
        *self.state.lock().await
    }

    /// The held ID, if any. Never touches the store.
    pub async fn current(&self) -> Option<u32> {
        match self.state().await {
            AllocationState::Allocated(id) => Some(id),
            AllocationState::Unallocated => None,
        }
    }

    /// Return this node's ID, allocating one if it has none yet.
    ///
    /// Once held, the ID is returned without any store round trip.
    ///
    /// # Errors
    ///
    /// - `Error::UnableToAllocate` if every attempt lost its conditional write
    /// - `Error::InvalidKey` if a foreign key sits under the prefix
    /// - store errors abort immediately and are never retried
    pub async fn acquire(&self) -> Result<u32> {
        let mut state = self.state.lock().await;

        if let AllocationState::Allocated(id) = *state {
            return Ok(id);
        }

        if let Some(id) = self.find_existing().await? {
            tracing::info!(owner = %self.owner, id, "Adopted existing node ID");
            *state = AllocationState::Allocated(id);
            return Ok(id);
        }

        for attempt in 1..=self.config.max_attempts {
            let mut ids = self.list_ids().await?;
            ids.sort_unstable();

            let candidate =
                first_available_id(&ids).ok_or(Error::UnableToAllocate { attempts: attempt })?;

            if self.write_if_absent(candidate).await? {
                tracing::info!(owner = %self.owner, id = candidate, attempt, "Allocated node ID");
                *state = AllocationState::Allocated(candidate);
                return Ok(candidate);
            }

            tracing::debug!(
                owner = %self.owner,
                id = candidate,
                attempt,
                "Lost race for node ID, retrying"
            );
        }

        tracing::warn!(
            owner = %self.owner,
            attempts = self.config.max_attempts,
            "Giving up on node ID allocation"
        );
        Err(Error::UnableToAllocate {
            attempts: self.config.max_attempts,
        })
    }

    /// Give the held ID back to the pool.
    ///
    /// An already-missing record counts as released, so retrying after a
    /// failed call is safe.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoIdAllocated` if nothing is held. On a store error the
    /// ID stays held.
    pub async fn release(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        let AllocationState::Allocated(id) = *state else {
            return Err(Error::NoIdAllocated);
        };

        let removed = self.store.delete(&key_for(&self.config.key_prefix, id)).await?;
        if !removed {
            tracing::debug!(owner = %self.owner, id, "Node ID record was already gone");
        }

        *state = AllocationState::Unallocated;
        tracing::info!(owner = %self.owner, id, "Released node ID");
        Ok(())
    }

    async fn find_existing(&self) -> Result<Option<u32>> {
        let prefix = &self.config.key_prefix;

        for (key, value) in self.store.list_values(prefix).await? {
            let record = IdentityRecord::decode(&value)?;
            if record.name != self.owner {
                continue;
            }

            let id = id_from_key(prefix, &key)?;
            if id != record.id {
                return Err(Error::InvalidKey(format!(
                    "{} holds a record for id {}",
                    key, record.id
                )));
            }
            return Ok(Some(id));
        }

        Ok(None)
    }

    async fn list_ids(&self) -> Result<Vec<u32>> {
        let prefix = &self.config.key_prefix;
        self.store
            .list_keys(prefix)
            .await?
            .iter()
            .map(|key| id_from_key(prefix, key))
            .collect()
    }

    async fn write_if_absent(&self, id: u32) -> Result<bool> {
        let value = IdentityRecord::new(self.owner.as_str(), id).encode()?;
        self.store
            .put_if_absent(&key_for(&self.config.key_prefix, id), value)
            .await
    }
}

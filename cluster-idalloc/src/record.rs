use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Value stored under `<prefix><id>`: which node owns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub name: String,
    pub id: u32,
}

impl IdentityRecord {
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

pub fn key_for(prefix: &str, id: u32) -> String {
    format!("{}{}", prefix, id)
}

/// Parse the identifier back out of `<prefix><id>`.
///
/// Only the canonical decimal form is accepted (no sign, no leading zeros,
/// no zero), so every identifier maps to exactly one key.
pub fn id_from_key(prefix: &str, key: &str) -> Result<u32> {
    let suffix = key
        .strip_prefix(prefix)
        .ok_or_else(|| Error::InvalidKey(key.to_string()))?;

    match suffix.parse::<u32>() {
        Ok(id) if id > 0 && id.to_string() == suffix => Ok(id),
        _ => Err(Error::InvalidKey(key.to_string())),
    }
}

/// Smallest positive integer missing from `sorted_ids`.
///
/// Returns `None` once the whole `u32` range is taken.
pub fn first_available_id(sorted_ids: &[u32]) -> Option<u32> {
    let mut next: u32 = 1;
    for &id in sorted_ids {
        if id != next {
            break;
        }
        next = next.checked_add(1)?;
    }
    Some(next)
}

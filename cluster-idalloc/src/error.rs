use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A key under the allocation prefix does not decode to an identifier.
    #[error("Invalid key for node ID: {0}")]
    InvalidKey(String),

    #[error("Unable to allocate unique ID for node (gave up after {attempts} attempts)")]
    UnableToAllocate { attempts: u32 },

    #[error("There is no ID allocated for the node")]
    NoIdAllocated,

    #[error("Store error: {0}")]
    Store(String),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

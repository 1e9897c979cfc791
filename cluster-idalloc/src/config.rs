use crate::{Error, Result};

/// Key namespace under which allocated identifiers live.
pub const DEFAULT_KEY_PREFIX: &str = "allocatedIDs/";

/// How many lost conditional writes an `acquire` tolerates before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const ENV_KEY_PREFIX: &str = "IDALLOC_KEY_PREFIX";
const ENV_MAX_ATTEMPTS: &str = "IDALLOC_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub key_prefix: String,
    pub max_attempts: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AllocatorConfig {
    /// Build from `IDALLOC_KEY_PREFIX` / `IDALLOC_MAX_ATTEMPTS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable is set but invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            config.key_prefix = prefix;
        }

        if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
            config.max_attempts = raw.trim().parse().map_err(|e| {
                Error::Config(format!("{}={:?} is not a valid count: {}", ENV_MAX_ATTEMPTS, raw, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return Err(Error::Config("key prefix must not be empty".into()));
        }
        if !self.key_prefix.ends_with('/') {
            return Err(Error::Config(format!(
                "key prefix {:?} must end with '/'",
                self.key_prefix
            )));
        }
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

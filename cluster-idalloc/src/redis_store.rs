use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::{IdStore, Result};

const SCAN_BATCH: usize = 256;

/// `IdStore` backed by a single Redis primary (or Memorystore).
///
/// Create-if-absent is `SET key value NX`, which Redis executes atomically.
/// All keys are stored under an optional namespace, which is stripped again
/// on listing so callers only ever see their own relative keys.
pub struct RedisStore {
    conn: MultiplexedConnection,
    namespace: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        Self::connect_with_namespace(redis_url, None).await
    }

    /// Connect with an optional namespace (for test isolation or sharing one
    /// Redis between clusters).
    pub async fn connect_with_namespace(redis_url: &str, namespace: Option<&str>) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        let namespace = namespace.unwrap_or_default().to_string();

        tracing::debug!(namespace = %namespace, "Connected ID store to Redis");
        Ok(Self { conn, namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn connection(&self) -> MultiplexedConnection {
        self.conn.clone()
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{}*", escape_glob(&self.full_key(prefix)));
        let mut conn = self.connection();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        // SCAN may return a key more than once across batches
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        keys.sort_unstable();
        keys.dedup();
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl IdStore for RedisStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.scan_prefix(prefix).await
    }

    async fn list_values(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut conn = self.connection();
        let mut values = Vec::new();

        for key in self.scan_prefix(prefix).await? {
            // Deleted between SCAN and GET
            let value: Option<Vec<u8>> = conn.get(self.full_key(&key)).await?;
            if let Some(value) = value {
                values.push((key, value));
            }
        }

        Ok(values)
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        let mut conn = self.connection();

        // SET <key> <value> NX replies OK on write, nil if the key exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.full_key(key))
            .arg(value)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection();
        let removed: u64 = conn.del(self.full_key(key)).await?;
        Ok(removed > 0)
    }
}

/// Escape Redis glob metacharacters so a literal prefix matches only itself.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\' | '^') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

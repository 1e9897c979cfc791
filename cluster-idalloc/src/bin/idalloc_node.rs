//! Cluster node that holds one allocated ID, for multi-process testing.
//!
//! Reports status as JSON lines on stdout and accepts commands on stdin:
//! `acquire`, `release`, `status`, `quit`. Logs go to stderr.
//!
//! Environment:
//! - `REDIS_URL` (default `redis://127.0.0.1:6379`)
//! - `IDALLOC_OWNER` (default: random UUID)
//! - `IDALLOC_NAMESPACE` (optional key namespace)
//! - `IDALLOC_KEY_PREFIX`, `IDALLOC_MAX_ATTEMPTS`
//!
//! Run: cargo run -p cluster-idalloc --bin idalloc_node

use cluster_idalloc::{AllocatorConfig, IdAllocator, RedisStore};
use serde_json::json;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn std::error::Error>> {
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    let owner = std::env::var("IDALLOC_OWNER").unwrap_or_else(|_| Uuid::new_v4().to_string());
    let namespace = std::env::var("IDALLOC_NAMESPACE").ok();

    let config = AllocatorConfig::from_env()?;
    let store = RedisStore::connect_with_namespace(&redis_url, namespace.as_deref()).await?;
    let allocator = IdAllocator::with_config(store, owner, config)?;

    emit(json!({ "event": "ready", "owner": allocator.owner() }));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        match command {
            "acquire" => match allocator.acquire().await {
                Ok(id) => emit(json!({
                    "event": "acquired",
                    "owner": allocator.owner(),
                    "id": id,
                })),
                Err(e) => emit(json!({ "event": "acquire_failed", "error": e.to_string() })),
            },
            "release" => match allocator.release().await {
                Ok(()) => emit(json!({ "event": "released", "owner": allocator.owner() })),
                Err(e) => emit(json!({ "event": "release_failed", "error": e.to_string() })),
            },
            "status" => emit(json!({
                "event": "status",
                "owner": allocator.owner(),
                "id": allocator.current().await,
            })),
            "quit" | "exit" => break,
            other => emit(json!({ "error": "unknown_command", "command": other })),
        }
    }

    // Quit keeps the ID; a restart with the same owner adopts it
    emit(json!({
        "event": "shutdown",
        "owner": allocator.owner(),
        "id": allocator.current().await,
    }));
    Ok(())
}

fn emit(status: serde_json::Value) {
    println!("{}", status);
    let _ = io::stdout().flush();
}

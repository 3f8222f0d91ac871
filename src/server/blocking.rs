//! Runs synchronous store calls off the async runtime.

use anyhow::{anyhow, Result};

/// Runs `f` on the blocking thread pool. A panicking or cancelled task is
/// reported as an error.
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| anyhow!("Blocking task failed: {}", err))?
}

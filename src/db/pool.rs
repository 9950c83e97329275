use crate::error::{DatabookError, Result};
use deadpool_postgres::{Config as PoolConfig, Pool, Runtime};
use std::time::Duration;
use tokio_postgres::NoTls;
use tracing::info;

/// Build the bounded connection pool for the backing store.
///
/// Acquire blocks up to the wait timeout; connections are returned to the
/// pool on drop. All repositories share this one pool.
pub fn create_pool(database_url: &str, max_size: u32) -> Result<Pool> {
    let mut cfg = PoolConfig::new();
    cfg.url = Some(database_url.to_string());

    cfg.pool = Some(deadpool_postgres::PoolConfig {
        max_size: max_size as usize,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(5)),
            recycle: Some(Duration::from_secs(5)),
        },
        ..Default::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| DatabookError::Persistence {
            cause: format!("Failed to create pool: {}", e),
        })
}

/// Verify the store is reachable before serving requests.
pub async fn ping(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;

    client
        .execute("SELECT 1", &[])
        .await
        .map_err(|e| DatabookError::Persistence {
            cause: format!("Ping failed: {}", e),
        })?;

    info!("Connected to PostgreSQL");
    Ok(())
}

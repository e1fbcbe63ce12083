//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits and a bounded liveness
//! check before the pool is handed to anyone.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, PgPool};
use tracing::{debug, info};

use crate::config::{ConnectionConfig, PoolConfig};
use crate::error::{StoreError, StoreResult};

/// Create a PostgreSQL connection pool and verify it can reach the server.
///
/// Pool connections are opened lazily. Liveness is checked with one direct
/// connection so the driver's own failure (refused, TLS, auth) is what the
/// caller sees. If the check fails or takes longer than `pool.ping_timeout`,
/// the pool is closed and the error is returned, so a broken pool never
/// escapes.
///
/// # Errors
///
/// Returns [`StoreError::Connect`] if the server refuses or rejects the
/// connection, [`StoreError::ConnectTimeout`] if it does not answer in time.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&ConnectionConfig::from_env()?, &PoolConfig::default()).await?;
/// ```
pub async fn create_pool(connection: &ConnectionConfig, pool: &PoolConfig) -> StoreResult<PgPool> {
    let pg = PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .max_lifetime(pool.max_lifetime)
        .idle_timeout(pool.idle_timeout)
        .acquire_timeout(pool.acquire_timeout)
        .connect_lazy_with(connection.connect_options());

    if let Err(err) = check_connection(connection, pool.ping_timeout).await {
        pg.close().await;
        return Err(err);
    }

    info!(
        host = %connection.host,
        port = connection.port,
        dbname = %connection.dbname,
        max_connections = pool.max_connections,
        "connected to postgres"
    );
    Ok(pg)
}

/// Open one connection, ping it and close it again, bounded by `timeout`.
pub async fn check_connection(connection: &ConnectionConfig, timeout: Duration) -> StoreResult<()> {
    let check = async {
        let mut conn = PgConnection::connect_with(&connection.connect_options()).await?;
        conn.ping().await?;
        conn.close().await
    };

    let result = match tokio::time::timeout(timeout, check).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(StoreError::Connect { source }),
        Err(_) => Err(StoreError::ConnectTimeout { timeout }),
    };
    debug!(ok = result.is_ok(), "database liveness check");
    result
}

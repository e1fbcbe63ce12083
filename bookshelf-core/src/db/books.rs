//! Book store backed by PostgreSQL
//!
//! Expects a table shaped like:
//!
//! ```sql
//! CREATE TABLE books (
//!     id    SERIAL PRIMARY KEY,
//!     title TEXT NOT NULL
//! );
//! ```
//!
//! Ids are cast to BIGINT on the way out so SERIAL and BIGSERIAL both work.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::pool::create_pool;
use crate::config::{BookshelfConfig, ConnectionConfig, PoolConfig};
use crate::deadline::Deadline;
use crate::error::{StoreError, StoreResult};
use crate::models::{Book, BookId, BookTitle};
use crate::store::{require, BookStore};

/// Book store over a sqlx connection pool
///
/// Cheap to share behind a reference; the pool arbitrates concurrent callers.
#[derive(Debug)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    /// Open a pool and check the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connect`] if the liveness check fails, or
    /// [`StoreError::ConnectTimeout`] if it exceeds `pool.ping_timeout`.
    pub async fn connect(connection: &ConnectionConfig, pool: &PoolConfig) -> StoreResult<Self> {
        let pool = create_pool(connection, pool).await?;
        Ok(Self { pool })
    }

    pub async fn from_config(config: &BookshelfConfig) -> StoreResult<Self> {
        Self::connect(&config.connection, &config.pool).await
    }

    /// Wrap an existing pool without checking it.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    #[instrument(level = "debug", skip(self, deadline))]
    async fn get_book(&self, id: BookId, deadline: Deadline) -> StoreResult<String> {
        deadline
            .run("get book", async {
                let title = sqlx::query_scalar::<_, String>("SELECT title FROM books WHERE id = $1")
                    .bind(id.get())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| StoreError::backend("get book", e))?;
                require(id, title)
            })
            .await
    }

    #[instrument(level = "debug", skip(self, title, deadline))]
    async fn add_book(&self, title: &BookTitle, deadline: Deadline) -> StoreResult<BookId> {
        deadline
            .run("add book", async {
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO books (title) VALUES ($1) RETURNING id::BIGINT",
                )
                .bind(title.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::backend("add book", e))?;

                debug!(id, "book added");
                Ok(BookId::new(id))
            })
            .await
    }

    #[instrument(level = "debug", skip(self, deadline))]
    async fn delete_book(&self, id: BookId, deadline: Deadline) -> StoreResult<()> {
        deadline
            .run("delete book", async {
                let result = sqlx::query("DELETE FROM books WHERE id = $1")
                    .bind(id.get())
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::backend("delete book", e))?;

                // The statement succeeded; zero rows means there was nothing to delete.
                if result.rows_affected() == 0 {
                    return Err(StoreError::not_found(id));
                }
                Ok(())
            })
            .await
    }

    #[instrument(level = "debug", skip(self, deadline))]
    async fn get_all_books(&self, deadline: Deadline) -> StoreResult<Vec<String>> {
        deadline
            .run("list books", async {
                let mut rows =
                    sqlx::query_scalar::<_, String>("SELECT title FROM books").fetch(&self.pool);

                let mut titles = Vec::new();
                while let Some(title) = rows
                    .try_next()
                    .await
                    .map_err(|e| StoreError::backend("list books", e))?
                {
                    titles.push(title);
                }

                debug!(count = titles.len(), "listed books");
                Ok(titles)
            })
            .await
    }

    #[instrument(level = "debug", skip(self, deadline))]
    async fn list_books(&self, deadline: Deadline) -> StoreResult<Vec<Book>> {
        deadline
            .run("list books", async {
                sqlx::query_as::<_, Book>("SELECT id::BIGINT AS id, title FROM books ORDER BY id")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| StoreError::backend("list books", e))
            })
            .await
    }

    async fn close(self) -> StoreResult<()> {
        self.pool.close().await;
        debug!("connection pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;

    use super::*;

    // A pool that never gets a connection, so every query fails in the driver.
    fn dead_store() -> PgBookStore {
        let connection: ConnectionConfig =
            "host=127.0.0.1 port=1 user=nobody dbname=nothing sslmode=disable"
                .parse()
                .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy_with(connection.connect_options());
        PgBookStore::from_pool(pool)
    }

    #[tokio::test]
    async fn driver_failures_name_the_operation() {
        let store = dead_store();

        let err = store.get_all_books(Deadline::none()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Backend {
                operation: "list books",
                ..
            }
        ));

        let err = store.get_book(BookId::new(1), Deadline::none()).await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().starts_with("failed to get book:"));

        store.close().await.unwrap();
    }
}

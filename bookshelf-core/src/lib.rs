//! bookshelf-core: storage contract for book records
//!
//! - [`BookStore`] is the contract every backend implements
//! - [`PgBookStore`] talks to PostgreSQL through a sqlx connection pool
//! - [`MemoryBookStore`] keeps books in process, for tests and dry runs

pub mod config;
pub mod db;
pub mod deadline;
pub mod error;
pub mod memory;
pub mod models;
pub mod store;

pub use config::{BookshelfConfig, ConnectionConfig, PoolConfig, SslMode};
pub use db::PgBookStore;
pub use deadline::Deadline;
pub use error::{ConfigError, StoreError, StoreResult};
pub use memory::MemoryBookStore;
pub use models::{Book, BookId, BookTitle, ValidationError};
pub use store::BookStore;

//! PostgreSQL backend - connection pool and book store
//!
//! # Design Principles
//!
//! - One pool per store, shared by all callers; no Arc<Mutex<Connection>>
//! - Every statement binds its parameters, nothing is concatenated
//! - The `books` table is assumed to exist; this crate never migrates it

pub mod books;
pub mod pool;

pub use books::PgBookStore;
pub use pool::{check_connection, create_pool};

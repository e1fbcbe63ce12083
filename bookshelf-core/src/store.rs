//! Storage contract for book records
//!
//! Every backend supports the same operations with the same error
//! semantics:
//! - lookups and deletes of a missing id fail with [`StoreError::NotFound`]
//! - every other failure is backend-class (see [`StoreError::is_backend`])
//! - no operation retries; failures surface to the caller immediately

use async_trait::async_trait;

use crate::deadline::Deadline;
use crate::error::{StoreError, StoreResult};
use crate::models::{Book, BookId, BookTitle};

/// Book storage operations (testable)
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Fetch the title stored under `id`.
    async fn get_book(&self, id: BookId, deadline: Deadline) -> StoreResult<String>;

    /// Insert a new book and return the id the backend assigned to it.
    ///
    /// Titles are not unique; adding the same title twice creates two books.
    async fn add_book(&self, title: &BookTitle, deadline: Deadline) -> StoreResult<BookId>;

    /// Remove the book stored under `id`.
    async fn delete_book(&self, id: BookId, deadline: Deadline) -> StoreResult<()>;

    /// Every stored title, in backend-determined order. Empty is not an error.
    async fn get_all_books(&self, deadline: Deadline) -> StoreResult<Vec<String>>;

    /// Every stored book with its id, ordered by id.
    async fn list_books(&self, deadline: Deadline) -> StoreResult<Vec<Book>>;

    /// Release all held connection resources.
    ///
    /// Consumes the store, so it can only be closed once.
    async fn close(self) -> StoreResult<()>
    where
        Self: Sized;
}

/// Map "no such row" to [`StoreError::NotFound`] for `id`.
pub(crate) fn require<T>(id: BookId, found: Option<T>) -> StoreResult<T> {
    found.ok_or_else(|| StoreError::not_found(id))
}

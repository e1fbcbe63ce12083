//! In-process book store
//!
//! Honors the same contract as the PostgreSQL store: ids are assigned by the
//! store and never reused, missing ids are `NotFound`, and titles may repeat.
//! Useful as a test double and for running the CLI without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::deadline::Deadline;
use crate::error::StoreResult;
use crate::models::{Book, BookId, BookTitle};
use crate::store::{require, BookStore};

#[derive(Debug)]
struct Shelf {
    next_id: i64,
    books: BTreeMap<BookId, String>,
}

/// Book store backed by an in-memory map
#[derive(Debug)]
pub struct MemoryBookStore {
    shelf: Mutex<Shelf>,
}

impl Default for MemoryBookStore {
    fn default() -> Self {
        Self {
            shelf: Mutex::new(Shelf {
                next_id: 1,
                books: BTreeMap::new(),
            }),
        }
    }
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of books currently stored
    pub async fn len(&self) -> usize {
        self.shelf.lock().await.books.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn get_book(&self, id: BookId, deadline: Deadline) -> StoreResult<String> {
        deadline
            .run("get book", async {
                let shelf = self.shelf.lock().await;
                require(id, shelf.books.get(&id).cloned())
            })
            .await
    }

    async fn add_book(&self, title: &BookTitle, deadline: Deadline) -> StoreResult<BookId> {
        deadline
            .run("add book", async {
                let mut shelf = self.shelf.lock().await;
                let id = BookId::new(shelf.next_id);
                shelf.next_id += 1;
                shelf.books.insert(id, title.as_str().to_owned());
                Ok(id)
            })
            .await
    }

    async fn delete_book(&self, id: BookId, deadline: Deadline) -> StoreResult<()> {
        deadline
            .run("delete book", async {
                let mut shelf = self.shelf.lock().await;
                require(id, shelf.books.remove(&id)).map(|_| ())
            })
            .await
    }

    async fn get_all_books(&self, deadline: Deadline) -> StoreResult<Vec<String>> {
        deadline
            .run("list books", async {
                let shelf = self.shelf.lock().await;
                Ok(shelf.books.values().cloned().collect())
            })
            .await
    }

    async fn list_books(&self, deadline: Deadline) -> StoreResult<Vec<Book>> {
        deadline
            .run("list books", async {
                let shelf = self.shelf.lock().await;
                Ok(shelf
                    .books
                    .iter()
                    .map(|(id, title)| Book {
                        id: *id,
                        title: title.clone(),
                    })
                    .collect())
            })
            .await
    }

    async fn close(self) -> StoreResult<()> {
        Ok(())
    }
}

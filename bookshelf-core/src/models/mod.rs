//! Domain models with validation at construction
//!
//! Titles are validated when a [`BookTitle`] is built, so storage code
//! never sees an empty title.

pub mod book;
pub mod title;
pub mod validation;

pub use book::{Book, BookId};
pub use title::BookTitle;
pub use validation::ValidationError;

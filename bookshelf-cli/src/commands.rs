//! Subcommand implementations, generic over the store backend

use std::io::Write;

use anyhow::{Context, Result};
use bookshelf_core::{BookId, BookStore, BookTitle, Deadline};
use clap::Subcommand;
use tracing::warn;

/// Title the demo sequence inserts
pub const DEMO_TITLE: &str = "The Rust Programming Language";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a book and print its new id
    Add {
        /// Book title
        title: String,
    },
    /// Print the title of a book
    Get {
        /// Book id
        id: BookId,
    },
    /// Delete a book
    Delete {
        /// Book id
        id: BookId,
    },
    /// List stored books
    List {
        /// Output as JSON array of {id, title}
        #[arg(long)]
        json: bool,
    },
    /// Run a short add/get/delete walkthrough against the store
    Demo,
}

/// Run one command, writing user-facing output to `out`.
pub async fn run<S: BookStore>(
    store: &S,
    command: Command,
    deadline: Deadline,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Add { title } => {
            let title = BookTitle::new(&title)?;
            let id = store
                .add_book(&title, deadline)
                .await
                .context("Failed to add book")?;
            writeln!(out, "{}", id)?;
        }
        Command::Get { id } => {
            let title = store
                .get_book(id, deadline)
                .await
                .context("Failed to get book")?;
            writeln!(out, "{}", title)?;
        }
        Command::Delete { id } => {
            store
                .delete_book(id, deadline)
                .await
                .context("Failed to delete book")?;
            writeln!(out, "Deleted book {}", id)?;
        }
        Command::List { json } => {
            if json {
                let books = store
                    .list_books(deadline)
                    .await
                    .context("Failed to list books")?;
                writeln!(out, "{}", serde_json::to_string_pretty(&books)?)?;
            } else {
                let titles = store
                    .get_all_books(deadline)
                    .await
                    .context("Failed to list books")?;
                for title in titles {
                    writeln!(out, "{}", title)?;
                }
            }
        }
        Command::Demo => demo(store, deadline, out).await?,
    }
    Ok(())
}

/// Add a book, read it back, then delete it.
///
/// A failing step is reported and the walkthrough moves on; later steps that
/// need the new id are skipped if the add failed.
pub async fn demo<S: BookStore>(store: &S, deadline: Deadline, out: &mut impl Write) -> Result<()> {
    let title = BookTitle::new(DEMO_TITLE)?;

    let id = match store.add_book(&title, deadline).await {
        Ok(id) => {
            writeln!(out, "Book added successfully (id {})", id)?;
            Some(id)
        }
        Err(e) => {
            warn!("Failed to add book: {}", e);
            writeln!(out, "Failed to add book: {}", e)?;
            None
        }
    };

    let Some(id) = id else {
        writeln!(out, "Skipped getting book: no id")?;
        writeln!(out, "Skipped deleting book: no id")?;
        return Ok(());
    };

    match store.get_book(id, deadline).await {
        Ok(title) => writeln!(out, "Book title: {}", title)?,
        Err(e) => {
            warn!("Failed to get book: {}", e);
            writeln!(out, "Failed to get book: {}", e)?;
        }
    }

    match store.delete_book(id, deadline).await {
        Ok(()) => writeln!(out, "Book deleted successfully")?,
        Err(e) => {
            warn!("Failed to delete book: {}", e);
            writeln!(out, "Failed to delete book: {}", e)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::MemoryBookStore;

    async fn run_to_string(store: &MemoryBookStore, command: Command) -> Result<String> {
        let mut out = Vec::new();
        run(store, command, Deadline::none(), &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn add_get_delete_roundtrip() {
        let store = MemoryBookStore::new();

        let id = run_to_string(&store, Command::Add { title: "Dune".into() })
            .await
            .unwrap();
        let id: BookId = id.trim().parse().unwrap();

        let title = run_to_string(&store, Command::Get { id }).await.unwrap();
        assert_eq!(title, "Dune\n");

        let deleted = run_to_string(&store, Command::Delete { id }).await.unwrap();
        assert_eq!(deleted, format!("Deleted book {}\n", id));

        let err = run_to_string(&store, Command::Get { id }).await.unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }

    #[tokio::test]
    async fn add_rejects_blank_title() {
        let store = MemoryBookStore::new();
        let err = run_to_string(&store, Command::Add { title: "  ".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("title cannot be empty"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn list_json_includes_ids() {
        let store = MemoryBookStore::new();
        run_to_string(&store, Command::Add { title: "Alpha".into() })
            .await
            .unwrap();

        let json = run_to_string(&store, Command::List { json: true }).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!([{ "id": 1, "title": "Alpha" }]));

        let plain = run_to_string(&store, Command::List { json: false }).await.unwrap();
        assert_eq!(plain, "Alpha\n");
    }

    #[tokio::test]
    async fn demo_leaves_store_empty() {
        let store = MemoryBookStore::new();
        let output = run_to_string(&store, Command::Demo).await.unwrap();

        assert!(output.contains("Book added successfully"));
        assert!(output.contains(&format!("Book title: {}", DEMO_TITLE)));
        assert!(output.contains("Book deleted successfully"));
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn demo_reports_timeouts_without_failing() {
        let store = MemoryBookStore::new();
        let expired = Deadline::at(tokio::time::Instant::now());
        tokio::time::advance(std::time::Duration::from_millis(1)).await;

        let mut out = Vec::new();
        demo(&store, expired, &mut out).await.unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Failed to add book: add book timed out"));
        assert!(output.contains("Skipped getting book: no id"));
        assert!(output.contains("Skipped deleting book: no id"));
    }
}

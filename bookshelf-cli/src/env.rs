//! Environment and config resolution
//!
//! Connection settings are resolved in this order (first hit wins):
//! 1. `--dsn` / `BOOKSHELF_DSN`
//! 2. `--config <path>`
//! 3. `~/.bookshelf/config.toml`
//! 4. `PG*` environment variables (after loading `.env` files)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bookshelf_core::{BookshelfConfig, ConnectionConfig};
use tracing::{debug, info};

/// Get the bookshelf config directory path (~/.bookshelf)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".bookshelf"))
}

/// Load environment variables from .env files
///
/// Priority order (highest to lowest):
/// 1. Current directory .env
/// 2. ~/.bookshelf/.env
/// 3. Environment variables already set
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(path.display().to_string());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            // dotenvy doesn't overwrite existing vars
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(env_file.display().to_string()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.bookshelf)");
    } else {
        info!("Loaded environment from: {}", loaded_from.join(", "));
    }
}

/// Resolve the full configuration from CLI inputs, files and environment.
pub fn resolve(dsn: Option<&str>, config_path: Option<&Path>) -> Result<BookshelfConfig> {
    let default_path = config_dir().map(|dir| dir.join("config.toml"));
    resolve_with(dsn, config_path, default_path.as_deref())
}

fn resolve_with(
    dsn: Option<&str>,
    config_path: Option<&Path>,
    default_path: Option<&Path>,
) -> Result<BookshelfConfig> {
    let file = match (config_path, default_path) {
        (Some(path), _) => Some(path),
        (None, Some(path)) if path.exists() => Some(path),
        _ => None,
    };

    let mut config = match file {
        Some(path) => {
            debug!("Using config file {}", path.display());
            BookshelfConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => BookshelfConfig {
            connection: ConnectionConfig::from_env().context("Invalid PG* environment")?,
            ..BookshelfConfig::default()
        },
    };

    if let Some(dsn) = dsn {
        config.connection = dsn.parse().context("Invalid connection string")?;
    }

    Ok(config)
}

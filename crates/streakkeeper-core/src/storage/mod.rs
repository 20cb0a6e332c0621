mod config;
pub mod database;
mod kv;

pub use config::{Config, LogConfig, StorageConfig, StreakConfig};
pub use database::Database;
pub use kv::{KeyValueStore, MemoryStore};

use std::path::PathBuf;

/// Returns `~/.config/streakkeeper[-dev]/` based on STREAKKEEPER_ENV.
///
/// Set STREAKKEEPER_ENV=dev to use development data directory.
/// STREAKKEEPER_DATA_DIR, when set, replaces the directory entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    if let Some(dir) = std::env::var_os("STREAKKEEPER_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STREAKKEEPER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("streakkeeper-dev")
    } else {
        base_dir.join("streakkeeper")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

mod config;
pub mod database;

pub use config::{ApiConfig, Config, DisplayConfig, LoggingConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::PersistenceError;

/// Returns the data directory, creating it if needed.
///
/// Resolution order:
/// - `WAKAPP_DATA_DIR` if set (used verbatim)
/// - `~/.config/wakapp-dev/` when `WAKAPP_ENV=dev`
/// - `~/.config/wakapp/` otherwise
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, PersistenceError> {
    let dir = match std::env::var_os("WAKAPP_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("WAKAPP_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("wakapp-dev")
            } else {
                base_dir.join("wakapp")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(PersistenceError::DataDir)?;
    Ok(dir)
}

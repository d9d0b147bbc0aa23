mod config;
mod token;

pub use config::Config;
pub use token::DeviceTokenStore;

use std::io;
use std::path::PathBuf;

/// Returns `~/.config/ringline[-dev]/` based on RINGLINE_ENV.
///
/// Set RINGLINE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("RINGLINE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("ringline-dev")
    } else {
        base_dir.join("ringline")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

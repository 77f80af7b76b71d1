//! Configuration loading for the audit harvester
//!
//! Locates settings in ~/.config/audit-harvester/, parses JSON settings
//! files and applies `.env` files to the process environment.
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Name of the directory under the platform config dir
const APP_DIR: &str = "audit-harvester";

/// Create ~/.config/audit-harvester/ if needed and return it.
///
/// Call this once at application startup.
pub fn init() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Get the harvester config directory (~/.config/audit-harvester/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Path of `filename` in the config directory, if that file exists
pub fn find(filename: &str) -> Option<PathBuf> {
    config_dir()
        .map(|dir| dir.join(filename))
        .filter(|path| path.is_file())
}

/// Load and parse a JSON file
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load a `.env` file into the process environment.
///
/// Values from the file override variables that are already set. Returns
/// `Ok(false)` when the file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let entries = dotenv::from_path_iter(path)
        .with_context(|| format!("Failed to open env file: {}", path.display()))?;
    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("Failed to parse env file: {}", path.display()))?;
        // SAFETY: called during single-threaded startup, before any worker exists.
        unsafe { std::env::set_var(key, value) };
    }
    Ok(true)
}

//! Skytally configuration
//!
//! Locates the YAML configuration file, loads it and applies environment
//! overrides.

pub mod env;
pub mod error;
pub mod inventory;

pub use error::*;
pub use inventory::{
    DEFAULT_CONCURRENCY, DEFAULT_REGION, DEFAULT_SESSION_NAME, DEFAULT_UNIT_TIMEOUT_SECS,
    InventoryConfig,
};

use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SKYTALLY_CONFIG_PATH";

const CANDIDATES: [&str; 2] = ["skytally.local.yaml", "skytally.yaml"];

/// `~/.config/skytally/skytally.yaml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("skytally").join("skytally.yaml"))
}

/// Locate the configuration file.
///
/// Search order:
/// 1. `SKYTALLY_CONFIG_PATH` (direct path)
/// 2. Current directory: skytally.local.yaml, skytally.yaml
/// 3. `./.skytally/skytally.yaml`
/// 4. `~/.config/skytally/skytally.yaml` (global)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{} points to a missing file", CONFIG_PATH_ENV);
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project = current_dir.join(".skytally").join("skytally.yaml");
    if project.exists() {
        return Ok(project);
    }

    if let Some(global) = global_config_path().filter(|p| p.exists()) {
        return Ok(global);
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Load `path`, or the discovered file when `None`, then apply environment
/// overrides.
///
/// A missing file is not an error when nothing was requested explicitly:
/// the environment alone can carry a complete configuration.
pub fn load(path: Option<&Path>) -> Result<InventoryConfig> {
    let mut config = match path {
        Some(path) => InventoryConfig::from_file(path)?,
        None => match find_config_file() {
            Ok(found) => InventoryConfig::from_file(&found)?,
            Err(ConfigError::ConfigFileNotFound) => {
                tracing::debug!("no config file, using environment only");
                InventoryConfig::default()
            }
            Err(e) => return Err(e),
        },
    };
    config.apply_env_overrides()?;
    Ok(config)
}

//! Configuration file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::FileConfig;
use crate::error::{ProvisionError, Result};

/// Config file name looked up in the app root.
pub const CONFIG_FILE_NAME: &str = "kindling.yml";

/// Default config location for an app root.
pub fn default_config_path(app_root: &Path) -> PathBuf {
    app_root.join(CONFIG_FILE_NAME)
}

/// Load configuration for `app_root`.
///
/// An explicit path must exist. Without one, `<app_root>/kindling.yml` is
/// used if present and an empty configuration otherwise.
pub fn load_config(app_root: &Path, explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ProvisionError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path(app_root);
            if !path.is_file() {
                tracing::debug!("No config file at {}", path.display());
                return Ok(FileConfig::default());
            }
            path
        }
    };

    parse_config_file(&path)
}

/// Parse a single config file.
pub fn parse_config_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| ProvisionError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

//! Configuration loading and resolution.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Merging flags, file and defaults in [`settings`]
//!
//! # Example
//!
//! ```
//! use kindling::config::{load_config, ProvisionSettings, SettingsOverrides};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("kindling.yml"), "venv: .venv\n").unwrap();
//!
//! let file = load_config(temp.path(), None).unwrap();
//! let settings = ProvisionSettings::resolve(temp.path(), &file, &SettingsOverrides::default());
//! assert_eq!(settings.venv, temp.path().join(".venv"));
//! ```

pub mod loader;
pub mod schema;
pub mod settings;

pub use loader::{default_config_path, load_config, parse_config_file, CONFIG_FILE_NAME};
pub use schema::FileConfig;
pub use settings::{ProvisionSettings, SettingsOverrides, DEFAULT_PYTHON_VERSION};

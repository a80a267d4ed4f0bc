//! The persisted result of a provisioning run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};
use crate::runtime::RuntimeVersion;

/// Status file name inside the app root.
pub const STATUS_FILE_NAME: &str = ".kindling_status.json";

/// Summary of one run, written as JSON after every provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub ok: bool,
    pub exit_code: i32,
    pub message: String,
    #[serde(default)]
    pub runtime_version: Option<RuntimeVersion>,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    pub fn success(runtime_version: Option<RuntimeVersion>) -> Self {
        Self {
            ok: true,
            exit_code: 0,
            message: "Provisioning completed".to_string(),
            runtime_version,
            finished_at: Utc::now(),
        }
    }

    pub fn failure(err: &ProvisionError) -> Self {
        Self {
            ok: false,
            exit_code: 1,
            message: format!("{}: {}", err.kind(), err),
            runtime_version: None,
            finished_at: Utc::now(),
        }
    }

    /// Status file location for an app root.
    pub fn path_for(app_root: &Path) -> PathBuf {
        app_root.join(STATUS_FILE_NAME)
    }

    /// Load a previously saved outcome, if any.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let outcome = serde_json::from_str(&content).map_err(|e| ProvisionError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Some(outcome))
    }

    /// Write atomically: temp file, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(anyhow::Error::from)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = RunOutcome::path_for(temp.path());
        let outcome = RunOutcome::success(Some(RuntimeVersion::new(3, 11, 9)));

        outcome.save(&path).unwrap();
        let loaded = RunOutcome::load(&path).unwrap().unwrap();

        assert_eq!(loaded, outcome);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn json_shape() {
        let outcome = RunOutcome::failure(&ProvisionError::preflight("no manifest"));
        let value: serde_json::Value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["exit_code"], 1);
        assert!(value["message"]
            .as_str()
            .unwrap()
            .starts_with("PreflightError: "));
        assert!(value["runtime_version"].is_null());
        assert!(value["finished_at"].is_string());
    }

    #[test]
    fn load_missing_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(RunOutcome::load(&RunOutcome::path_for(temp.path()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn load_corrupt_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = RunOutcome::path_for(temp.path());
        fs::write(&path, "{not json").unwrap();
        let err = RunOutcome::load(&path).unwrap_err();
        assert!(matches!(err, ProvisionError::ConfigParse { .. }));
    }
}

//! Building the isolated environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};
use crate::runtime::{HostLayout, RuntimeCandidate};
use crate::shell::{CommandSpec, ProcessRunner, SearchPath};

/// A built environment and its interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedEnvironment {
    pub root: PathBuf,
    pub interpreter: PathBuf,
    pub scripts_dir: PathBuf,
}

impl IsolatedEnvironment {
    /// Describe the environment at `root` without touching disk.
    pub fn at(layout: &HostLayout, root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            interpreter: layout.env_interpreter(root),
            scripts_dir: layout.env_scripts_dir(root),
        }
    }

    /// Whether the embedded interpreter exists.
    pub fn has_interpreter(&self) -> bool {
        self.interpreter.is_file()
    }
}

/// Destroys and recreates environments.
pub struct EnvironmentManager<'a> {
    runner: &'a dyn ProcessRunner,
    layout: &'a HostLayout,
    protected: Vec<PathBuf>,
}

impl<'a> EnvironmentManager<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, layout: &'a HostLayout) -> Self {
        Self {
            runner,
            layout,
            protected: Vec::new(),
        }
    }

    /// Never delete `path` or anything containing it.
    pub fn protect(mut self, path: impl Into<PathBuf>) -> Self {
        self.protected.push(path.into());
        self
    }

    /// Reject roots whose removal would destroy something else.
    pub fn check_safe_root(&self, root: &Path) -> Result<()> {
        let target = normalize(root);

        if target.parent().is_none() {
            return Err(ProvisionError::environment(
                root,
                "refusing to use a filesystem root as the environment",
            ));
        }

        for protected in &self.protected {
            let protected = normalize(protected);
            if protected.starts_with(&target) {
                return Err(ProvisionError::environment(
                    root,
                    format!(
                        "refusing to delete a directory containing {}",
                        protected.display()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Remove anything at `root` and create a fresh environment from `runtime`.
    pub fn rebuild(
        &self,
        runtime: &RuntimeCandidate,
        root: &Path,
        search_path: &SearchPath,
    ) -> Result<IsolatedEnvironment> {
        self.check_safe_root(root)?;
        remove_existing(root)?;

        let spec = CommandSpec::new(&runtime.executable)
            .args(["-m", "venv"])
            .arg(root)
            .search_path(search_path)
            .capture();
        let result = self.runner.run(&spec)?;
        if !result.success {
            return Err(ProvisionError::environment(
                root,
                format!("venv exited with code {:?}", result.exit_code),
            ));
        }

        let env = IsolatedEnvironment::at(self.layout, root);
        if !env.has_interpreter() {
            return Err(ProvisionError::environment(
                root,
                format!("interpreter missing at {}", env.interpreter.display()),
            ));
        }
        Ok(env)
    }
}

fn remove_existing(root: &Path) -> Result<()> {
    let Ok(meta) = fs::symlink_metadata(root) else {
        return Ok(());
    };
    let removed = if meta.is_dir() {
        fs::remove_dir_all(root)
    } else {
        fs::remove_file(root)
    };
    removed.map_err(|e| ProvisionError::environment(root, format!("could not remove: {}", e)))
}

fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeVersion;
    use crate::shell::{MockRunner, OsFamily};
    use tempfile::TempDir;

    fn layout() -> HostLayout {
        HostLayout::with_env(
            OsFamily::Linux,
            |_| Err(std::env::VarError::NotPresent),
            None,
            std::env::temp_dir(),
        )
    }

    fn runtime() -> RuntimeCandidate {
        RuntimeCandidate {
            executable: PathBuf::from("/usr/bin/python3"),
            version: RuntimeVersion::new(3, 11, 9),
        }
    }

    /// A runner whose `-m venv <root>` lays down `bin/python`.
    fn venv_runner() -> MockRunner {
        let runner = MockRunner::new();
        runner.respond_with("-m venv", 0, "", |spec| {
            let root = PathBuf::from(spec.arguments().last().unwrap());
            fs::create_dir_all(root.join("bin")).unwrap();
            fs::write(root.join("bin").join("python"), "").unwrap();
        });
        runner
    }

    fn tree(root: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path.clone());
                }
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
        out.sort();
        out
    }

    #[test]
    fn rebuild_replaces_stale_contents() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("venv");
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib").join("stale.txt"), "old").unwrap();

        let layout = layout();
        let runner = venv_runner();
        let manager = EnvironmentManager::new(&runner, &layout);
        let env = manager
            .rebuild(&runtime(), &root, &SearchPath::default())
            .unwrap();

        assert_eq!(env.interpreter, root.join("bin").join("python"));
        assert!(!root.join("lib").join("stale.txt").exists());
        assert!(runner.was_called("/usr/bin/python3 -m venv"));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("venv");
        let layout = layout();
        let runner = venv_runner();
        let manager = EnvironmentManager::new(&runner, &layout);

        let first = manager
            .rebuild(&runtime(), &root, &SearchPath::default())
            .unwrap();
        let after_first = tree(&root);
        let second = manager
            .rebuild(&runtime(), &root, &SearchPath::default())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(after_first, tree(&root));
    }

    #[test]
    fn venv_failure_is_environment_error() {
        let temp = TempDir::new().unwrap();
        let layout = layout();
        let runner = MockRunner::new();
        runner.respond("-m venv", 1, "");

        let err = EnvironmentManager::new(&runner, &layout)
            .rebuild(&runtime(), &temp.path().join("venv"), &SearchPath::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::EnvironmentCreation { .. }));
    }

    #[test]
    fn missing_interpreter_is_environment_error() {
        let temp = TempDir::new().unwrap();
        let layout = layout();
        let runner = MockRunner::new();

        let err = EnvironmentManager::new(&runner, &layout)
            .rebuild(&runtime(), &temp.path().join("venv"), &SearchPath::default())
            .unwrap_err();
        assert!(err.to_string().contains("interpreter missing"));
    }

    #[test]
    fn guard_rejects_app_root_and_its_ancestors() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("main.py"), "").unwrap();

        let layout = layout();
        let runner = venv_runner();
        let manager = EnvironmentManager::new(&runner, &layout)
            .protect(&app)
            .protect(app.join("requirements.txt"));

        assert!(manager.check_safe_root(&app).is_err());
        assert!(manager.check_safe_root(temp.path()).is_err());
        assert!(manager.check_safe_root(Path::new("/")).is_err());
        assert!(manager.check_safe_root(&app.join("venv")).is_ok());

        let err = manager
            .rebuild(&runtime(), &app, &SearchPath::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::EnvironmentCreation { .. }));
        assert!(app.join("main.py").exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn guard_rejects_root_containing_manifest() {
        let temp = TempDir::new().unwrap();
        let layout = layout();
        let runner = MockRunner::new();
        let manager = EnvironmentManager::new(&runner, &layout)
            .protect(temp.path().join("app"))
            .protect(temp.path().join("deps").join("requirements.txt"));

        assert!(manager.check_safe_root(&temp.path().join("deps")).is_err());
    }
}

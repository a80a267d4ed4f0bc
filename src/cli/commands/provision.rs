//! The `kindling provision` command.

use std::path::{Path, PathBuf};

use crate::cli::args::ProvisionArgs;
use crate::config::{load_config, ProvisionSettings};
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::logging::RunLog;
use crate::runner::{ProvisionContext, ProvisionReport, Provisioner, RunOutcome};
use crate::runtime::HostLayout;
use crate::shell::{is_elevated, HostInfo, SearchPath, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Merge the config file and flags into settings for one app root.
pub fn resolve_settings(
    cwd: &Path,
    config: Option<&Path>,
    args: &ProvisionArgs,
) -> Result<ProvisionSettings> {
    let app_root = args.app_root_or(cwd);
    let config = config.map(|path| cwd.join(path));
    let file = load_config(&app_root, config.as_deref())?;
    Ok(ProvisionSettings::resolve(&app_root, &file, &args.overrides()))
}

/// Run the state machine against the real host and record the outcome.
///
/// The status file is written whatever the result; a failure to write it
/// is logged and does not change the run's result.
pub fn provision_host(settings: &ProvisionSettings) -> Result<ProvisionReport> {
    let runner = SystemRunner;
    let fetcher = HttpFetcher::new()?.with_progress(console::Term::stderr().is_term());
    let layout = HostLayout::detect();
    let host = HostInfo::detect(&runner);
    let log = RunLog::new(&settings.log_file);

    let ctx = ProvisionContext {
        runner: &runner,
        distribution: &fetcher,
        layout: &layout,
        host: &host,
        elevated: is_elevated(),
        log: &log,
        search_path: SearchPath::from_env(),
    };
    let result = Provisioner::new(settings, ctx).run();

    let outcome = match &result {
        Ok(report) => RunOutcome::success(Some(report.runtime.version)),
        Err(e) => RunOutcome::failure(e),
    };
    let status_path = RunOutcome::path_for(&settings.app_root);
    if let Err(e) = outcome.save(&status_path) {
        tracing::warn!("Could not write {}: {}", status_path.display(), e);
    }
    result
}

/// The provision command implementation.
pub struct ProvisionCommand {
    cwd: PathBuf,
    config: Option<PathBuf>,
    args: ProvisionArgs,
}

impl ProvisionCommand {
    pub fn new(cwd: &Path, config: Option<&Path>, args: ProvisionArgs) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
        }
    }

    pub fn args(&self) -> &ProvisionArgs {
        &self.args
    }
}

impl Command for ProvisionCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = resolve_settings(&self.cwd, self.config.as_deref(), &self.args)?;
        ui.show_header(&format!(
            "Provisioning Python {} in {}",
            settings.target.version,
            settings.venv.display()
        ));

        match provision_host(&settings) {
            Ok(report) => {
                show_report(ui, &report);
                ui.success("Environment ready");
                Ok(CommandResult::success())
            }
            Err(e) => {
                report_failure(ui, &e.to_string(), &settings.log_file);
                Ok(CommandResult::failure(1))
            }
        }
    }
}

/// Summarize a successful run.
pub fn show_report(ui: &mut dyn UserInterface, report: &ProvisionReport) {
    let runtime = format!(
        "{} ({}{})",
        report.runtime.version,
        report.runtime.executable.display(),
        if report.installed_runtime {
            ", installed"
        } else {
            ""
        }
    );
    ui.field("Runtime", &runtime);
    ui.field("Environment", &report.environment.root.display().to_string());
    if !report.hooks_run.is_empty() {
        ui.field("Hooks", &report.hooks_run.join(", "));
    }
}

/// Print a fatal error and point at the log.
pub fn report_failure(ui: &mut dyn UserInterface, message: &str, log_file: &Path) {
    ui.error(message);
    ui.hint(&format!("See {} for details", log_file.display()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::IsolatedEnvironment;
    use crate::runner::ProvisionState;
    use crate::runtime::{RuntimeCandidate, RuntimeVersion};
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn settings_resolve_against_app_root() {
        let temp = TempDir::new().unwrap();
        let args = ProvisionArgs {
            app_root: Some(PathBuf::from("app")),
            ..ProvisionArgs::default()
        };
        fs::create_dir_all(temp.path().join("app")).unwrap();

        let settings = resolve_settings(temp.path(), None, &args).unwrap();
        assert_eq!(settings.app_root, temp.path().join("app"));
        assert_eq!(settings.venv, temp.path().join("app").join("venv"));
    }

    #[test]
    fn explicit_config_is_relative_to_cwd() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("custom.yml"), "venv: .venv\n").unwrap();

        let settings = resolve_settings(
            temp.path(),
            Some(Path::new("custom.yml")),
            &ProvisionArgs::default(),
        )
        .unwrap();
        assert_eq!(settings.venv, temp.path().join(".venv"));
    }

    #[test]
    fn missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let err = resolve_settings(
            temp.path(),
            Some(Path::new("nope.yml")),
            &ProvisionArgs::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "ConfigNotFoundError");
    }

    #[test]
    fn unpinned_manifest_fails_and_records_status() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("requirements.txt"), "requests\n").unwrap();
        let args = ProvisionArgs {
            app_root: Some(temp.path().to_path_buf()),
            ..ProvisionArgs::default()
        };
        let mut ui = MockUI::new();

        let result = ProvisionCommand::new(temp.path(), None, args)
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.shows("requests"));
        assert!(ui.shows("provision.log"));
        let outcome = RunOutcome::load(&RunOutcome::path_for(temp.path()))
            .unwrap()
            .unwrap();
        assert!(!outcome.ok);
        assert!(outcome.message.starts_with("UnpinnedRequirementError"));
        assert!(!temp.path().join("venv").exists());
    }

    #[test]
    fn report_lists_runtime_and_hooks() {
        let mut ui = MockUI::new();
        let root = PathBuf::from("/srv/app/venv");
        let report = ProvisionReport {
            states: vec![ProvisionState::Start, ProvisionState::Success],
            runtime: RuntimeCandidate {
                executable: PathBuf::from("/usr/bin/python3.11"),
                version: RuntimeVersion::new(3, 11, 9),
            },
            environment: IsolatedEnvironment {
                interpreter: root.join("bin/python"),
                scripts_dir: root.join("bin"),
                root,
            },
            hooks_run: vec!["pywin32".to_string()],
            installed_runtime: true,
        };

        show_report(&mut ui, &report);
        assert_eq!(
            ui.field_value("Runtime"),
            Some("3.11.9 (/usr/bin/python3.11, installed)")
        );
        assert_eq!(ui.field_value("Hooks"), Some("pywin32"));
    }
}

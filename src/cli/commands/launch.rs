//! The `kindling launch` command, also run when no subcommand is given.

use std::path::{Path, PathBuf};

use crate::cli::args::LaunchArgs;
use crate::environment::IsolatedEnvironment;
use crate::error::Result;
use crate::logging::RunLog;
use crate::runner::Launcher;
use crate::runtime::HostLayout;
use crate::shell::{SearchPath, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::provision::{provision_host, report_failure, resolve_settings};

/// The launch command implementation.
pub struct LaunchCommand {
    cwd: PathBuf,
    config: Option<PathBuf>,
    args: LaunchArgs,
}

impl LaunchCommand {
    pub fn new(cwd: &Path, config: Option<&Path>, args: LaunchArgs) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
        }
    }

    pub fn args(&self) -> &LaunchArgs {
        &self.args
    }
}

impl Command for LaunchCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = resolve_settings(&self.cwd, self.config.as_deref(), &self.args.provision)?;
        let layout = HostLayout::detect();
        let log = RunLog::new(&settings.log_file);

        let launcher = Launcher {
            runner: &SystemRunner,
            log: &log,
            environment: IsolatedEnvironment::at(&layout, &settings.venv),
            app_root: settings.app_root.clone(),
            entry: settings.app_entry.clone(),
            search_path: SearchPath::from_env(),
        };

        let result = launcher.launch(&self.args.app_args, self.args.reprovision, || {
            ui.message("Provisioning environment before launch...");
            provision_host(&settings).map(|_| ())
        });

        match result {
            Ok(code) => Ok(CommandResult::from_exit_code(code)),
            Err(e) => {
                report_failure(ui, &e.to_string(), &settings.log_file);
                Ok(CommandResult::failure(1))
            }
        }
    }
}

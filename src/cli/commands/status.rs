//! The `kindling status` command.
//!
//! Reads the status file written by the last provisioning run.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::cli::args::{resolve_app_root, StatusArgs};
use crate::error::Result;
use crate::runner::RunOutcome;
use crate::ui::{format_age, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The status command implementation.
pub struct StatusCommand {
    cwd: PathBuf,
    args: StatusArgs,
}

impl StatusCommand {
    pub fn new(cwd: &Path, args: StatusArgs) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            args,
        }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let app_root = resolve_app_root(self.args.app_root.as_deref(), &self.cwd);
        let path = RunOutcome::path_for(&app_root);

        let Some(outcome) = RunOutcome::load(&path)? else {
            ui.warning(&format!("No provisioning run recorded in {}", app_root.display()));
            ui.hint("Run 'kindling provision' first");
            return Ok(CommandResult::failure(1));
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&outcome).map_err(anyhow::Error::from)?;
            ui.message(&json);
        } else {
            ui.show_header(&format!("Status of {}", app_root.display()));
            ui.field("Result", if outcome.ok { "success" } else { "failure" });
            ui.field("Exit code", &outcome.exit_code.to_string());
            if let Some(version) = outcome.runtime_version {
                ui.field("Runtime", &version.to_string());
            }
            ui.field(
                "Finished",
                &format!(
                    "{} ({})",
                    outcome.finished_at.format("%Y-%m-%d %H:%M"),
                    format_age(outcome.finished_at, Utc::now())
                ),
            );
            ui.field("Message", &outcome.message);
        }

        Ok(CommandResult::from_exit_code(outcome.exit_code))
    }
}

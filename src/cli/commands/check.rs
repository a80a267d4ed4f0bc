//! The `kindling check` command.
//!
//! Validates the requirements manifest the way a provisioning run would,
//! without touching the runtime, the environment or the network.

use std::path::{Path, PathBuf};

use crate::cli::args::{resolve_app_root, CheckArgs};
use crate::config::{load_config, ProvisionSettings, SettingsOverrides};
use crate::error::Result;
use crate::requirements::{Manifest, PinPolicy, RequirementKind};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The check command implementation.
pub struct CheckCommand {
    cwd: PathBuf,
    config: Option<PathBuf>,
    args: CheckArgs,
}

impl CheckCommand {
    pub fn new(cwd: &Path, config: Option<&Path>, args: CheckArgs) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
        }
    }

    fn manifest_path(&self) -> Result<(PathBuf, PinPolicy)> {
        let app_root = resolve_app_root(self.args.app_root.as_deref(), &self.cwd);
        let config = self.config.as_ref().map(|path| self.cwd.join(path));
        let file = load_config(&app_root, config.as_deref())?;
        let overrides = SettingsOverrides {
            manifest: self.args.manifest.clone(),
            allow_unpinned: self.args.allow_unpinned,
            ..SettingsOverrides::default()
        };
        let settings = ProvisionSettings::resolve(&app_root, &file, &overrides);
        Ok((settings.manifest, settings.pin_policy))
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (path, policy) = self.manifest_path()?;
        let manifest = match Manifest::load(&path) {
            Ok(manifest) => manifest,
            Err(e) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(1));
            }
        };

        let pinned = manifest
            .lines()
            .iter()
            .filter(|l| l.kind == RequirementKind::Pinned)
            .count();
        let unpinned: Vec<_> = manifest.unpinned().cloned().collect();

        for line in &unpinned {
            let text = format!("line {}: {}", line.line_number, line.raw.trim());
            match policy {
                PinPolicy::Enforce => ui.error(&format!("Unpinned requirement {}", text)),
                PinPolicy::AllowUnpinned => ui.warning(&format!("Unpinned requirement allowed {}", text)),
            }
        }

        if policy == PinPolicy::Enforce && !unpinned.is_empty() {
            ui.hint("Pin each requirement with ==, @ or --hash=, or pass --allow-unpinned");
            return Ok(CommandResult::failure(1));
        }

        ui.success(&format!(
            "{}: {} pinned requirement(s)",
            path.display(),
            pinned
        ));
        Ok(CommandResult::success())
    }
}

//! The provisioning state machine.
//!
//! ```text
//! Start → Preflight → ResolveVersion → [Install] → RebuildEnvironment
//!       → ValidateAndInstallDependencies → [PostInstallHook] → [HealthCheck]
//!       → Success
//! ```
//!
//! Each state is handled by one function that either returns the next state
//! or an error; the first error moves the run to `Failure` and ends it.
//! Everything that can be checked without side effects (host support,
//! manifest presence and pins, the environment root guard) is checked in
//! `Preflight`, so a doomed run never touches the network or deletes
//! anything.

use std::fmt;

use crate::config::ProvisionSettings;
use crate::environment::{EnvironmentManager, IsolatedEnvironment};
use crate::error::{ProvisionError, Result};
use crate::fetch::Distribution;
use crate::hooks::run_hooks;
use crate::logging::RunLog;
use crate::requirements::{DependencyInstaller, Manifest, ValidatedManifest};
use crate::runtime::{HostLayout, RuntimeCandidate, RuntimeInstaller, VersionResolver};
use crate::shell::{HostInfo, LoggingRunner, ProcessRunner, SearchPath};

/// States of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Start,
    Preflight,
    ResolveVersion,
    Install,
    RebuildEnvironment,
    ValidateAndInstallDependencies,
    PostInstallHook,
    HealthCheck,
    Success,
    Failure,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionState::Start => "Start",
            ProvisionState::Preflight => "Preflight",
            ProvisionState::ResolveVersion => "ResolveVersion",
            ProvisionState::Install => "Install",
            ProvisionState::RebuildEnvironment => "RebuildEnvironment",
            ProvisionState::ValidateAndInstallDependencies => "ValidateAndInstallDependencies",
            ProvisionState::PostInstallHook => "PostInstallHook",
            ProvisionState::HealthCheck => "HealthCheck",
            ProvisionState::Success => "Success",
            ProvisionState::Failure => "Failure",
        };
        write!(f, "{}", name)
    }
}

/// Collaborators a run talks to.
pub struct ProvisionContext<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub distribution: &'a dyn Distribution,
    pub layout: &'a HostLayout,
    pub host: &'a HostInfo,
    pub elevated: bool,
    pub log: &'a RunLog,
    /// Search path at the start of the run.
    pub search_path: SearchPath,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub states: Vec<ProvisionState>,
    pub runtime: RuntimeCandidate,
    pub environment: IsolatedEnvironment,
    pub hooks_run: Vec<String>,
    /// Whether the runtime had to be installed.
    pub installed_runtime: bool,
}

/// One provisioning run.
pub struct Provisioner<'a> {
    settings: &'a ProvisionSettings,
    ctx: ProvisionContext<'a>,
    search_path: SearchPath,
    states: Vec<ProvisionState>,
    manifest: Option<ValidatedManifest>,
    runtime: Option<RuntimeCandidate>,
    environment: Option<IsolatedEnvironment>,
    hooks_run: Vec<String>,
}

impl<'a> Provisioner<'a> {
    pub fn new(settings: &'a ProvisionSettings, ctx: ProvisionContext<'a>) -> Self {
        let search_path = ctx.search_path.clone();
        Self {
            settings,
            ctx,
            search_path,
            states: Vec::new(),
            manifest: None,
            runtime: None,
            environment: None,
            hooks_run: Vec::new(),
        }
    }

    /// Drive the machine to `Success` or the first error.
    pub fn run(mut self) -> Result<ProvisionReport> {
        let mut state = ProvisionState::Start;
        loop {
            self.enter(state);
            if state == ProvisionState::Success {
                return self.finish();
            }
            match self.step(state) {
                Ok(next) => state = next,
                Err(e) => {
                    self.enter(ProvisionState::Failure);
                    self.ctx.log.error(&e);
                    return Err(e);
                }
            }
        }
    }

    fn enter(&mut self, state: ProvisionState) {
        self.states.push(state);
        self.ctx.log.info(format!("STATE: {}", state));
    }

    fn step(&mut self, state: ProvisionState) -> Result<ProvisionState> {
        match state {
            ProvisionState::Start => self.start(),
            ProvisionState::Preflight => self.preflight(),
            ProvisionState::ResolveVersion => self.resolve_version(),
            ProvisionState::Install => self.install(),
            ProvisionState::RebuildEnvironment => self.rebuild_environment(),
            ProvisionState::ValidateAndInstallDependencies => self.install_dependencies(),
            ProvisionState::PostInstallHook => self.post_install_hooks(),
            ProvisionState::HealthCheck => self.health_check(),
            ProvisionState::Success | ProvisionState::Failure => Err(anyhow::anyhow!(
                "no transition out of terminal state {}",
                state
            )
            .into()),
        }
    }

    fn start(&mut self) -> Result<ProvisionState> {
        let s = self.settings;
        self.ctx.log.info(format!(
            "Provisioning Python {} ({:?}) for {}",
            s.target.version,
            s.target.scope,
            s.app_root.display()
        ));
        Ok(ProvisionState::Preflight)
    }

    fn preflight(&mut self) -> Result<ProvisionState> {
        self.ctx.host.check_supported()?;

        let manifest = Manifest::load(&self.settings.manifest)?;
        let validated = manifest.validate(self.settings.pin_policy)?;
        for line in validated.tolerated() {
            self.ctx.log.warn(format!(
                "Unpinned requirement allowed by override: line {}: {}",
                line.line_number,
                line.raw.trim()
            ));
        }
        self.manifest = Some(validated);

        self.environment_manager(self.ctx.runner)
            .check_safe_root(&self.settings.venv)?;

        Ok(ProvisionState::ResolveVersion)
    }

    fn resolve_version(&mut self) -> Result<ProvisionState> {
        let runner = LoggingRunner::new(self.ctx.runner, self.ctx.log);
        let found = VersionResolver::new(&runner, self.ctx.layout, &self.search_path)
            .resolve(&self.settings.target);

        match found {
            Some(candidate) => {
                self.ctx.log.info(format!(
                    "Using existing Python {} at {}",
                    candidate.version,
                    candidate.executable.display()
                ));
                self.adopt_runtime(candidate);
                Ok(ProvisionState::RebuildEnvironment)
            }
            None => {
                self.ctx.log.info(format!(
                    "No compatible Python {} (>= {}) found",
                    self.settings.target.version.short(),
                    self.settings.target.version
                ));
                Ok(ProvisionState::Install)
            }
        }
    }

    fn install(&mut self) -> Result<ProvisionState> {
        let runner = LoggingRunner::new(self.ctx.runner, self.ctx.log);
        let installer = RuntimeInstaller {
            runner: &runner,
            distribution: self.ctx.distribution,
            layout: self.ctx.layout,
            host: self.ctx.host,
            elevated: self.ctx.elevated,
            options: &self.settings.install,
        };
        let candidate = installer.install(&self.settings.target, &self.search_path)?;
        self.ctx.log.info(format!(
            "Installed Python {} at {}",
            candidate.version,
            candidate.executable.display()
        ));
        self.adopt_runtime(candidate);
        Ok(ProvisionState::RebuildEnvironment)
    }

    fn rebuild_environment(&mut self) -> Result<ProvisionState> {
        let runtime = self.require_runtime()?;
        self.ctx.log.info(format!(
            "Rebuilding environment at {}",
            self.settings.venv.display()
        ));
        let runner = LoggingRunner::new(self.ctx.runner, self.ctx.log);
        let env = self
            .environment_manager(&runner)
            .rebuild(&runtime, &self.settings.venv, &self.search_path)?;
        self.environment = Some(env);
        Ok(ProvisionState::ValidateAndInstallDependencies)
    }

    fn install_dependencies(&mut self) -> Result<ProvisionState> {
        let env = self.require_environment()?;
        let manifest = self
            .manifest
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("manifest was not validated"))?;

        let runner = LoggingRunner::new(self.ctx.runner, self.ctx.log);
        DependencyInstaller::new(&runner, self.settings.pip).install(
            &env,
            manifest,
            &self.search_path,
        )?;

        Ok(self.after_dependencies())
    }

    fn post_install_hooks(&mut self) -> Result<ProvisionState> {
        let env = self.require_environment()?;
        let runner = LoggingRunner::new(self.ctx.runner, self.ctx.log);
        self.hooks_run = run_hooks(
            &runner,
            self.ctx.log,
            &env,
            &self.settings.hooks,
            &self.search_path,
        )?;
        Ok(self.after_hooks())
    }

    fn health_check(&mut self) -> Result<ProvisionState> {
        let env = self.require_environment()?;
        let runner = LoggingRunner::new(self.ctx.runner, self.ctx.log);
        self.settings
            .health_check()
            .run(&runner, &env, &self.search_path)?;
        Ok(ProvisionState::Success)
    }

    fn after_dependencies(&self) -> ProvisionState {
        if self.settings.hooks.is_empty() {
            self.after_hooks()
        } else {
            ProvisionState::PostInstallHook
        }
    }

    fn after_hooks(&self) -> ProvisionState {
        if self.settings.skip_health_check {
            ProvisionState::Success
        } else {
            ProvisionState::HealthCheck
        }
    }

    /// Record the runtime and put it (and its scripts) first on the search path.
    fn adopt_runtime(&mut self, candidate: RuntimeCandidate) {
        let dirs = vec![
            candidate.dir().to_path_buf(),
            self.ctx.layout.runtime_scripts_dir(&candidate.executable),
        ];
        self.search_path = self.search_path.prepend(dirs);
        self.runtime = Some(candidate);
    }

    fn environment_manager<'r>(&'r self, runner: &'r dyn ProcessRunner) -> EnvironmentManager<'r> {
        EnvironmentManager::new(runner, self.ctx.layout)
            .protect(&self.settings.app_root)
            .protect(&self.settings.manifest)
    }

    fn require_runtime(&self) -> Result<RuntimeCandidate> {
        self.runtime
            .clone()
            .ok_or_else(|| ProvisionError::from(anyhow::anyhow!("no runtime was resolved")))
    }

    fn require_environment(&self) -> Result<IsolatedEnvironment> {
        self.environment
            .clone()
            .ok_or_else(|| ProvisionError::from(anyhow::anyhow!("environment was not built")))
    }

    fn finish(self) -> Result<ProvisionReport> {
        let installed_runtime = self.states.contains(&ProvisionState::Install);
        let runtime = self.require_runtime()?;
        let environment = self.require_environment()?;
        self.ctx.log.info(format!(
            "Provisioning completed with Python {}",
            runtime.version
        ));
        Ok(ProvisionReport {
            states: self.states,
            runtime,
            environment,
            hooks_run: self.hooks_run,
            installed_runtime,
        })
    }
}

//! Subprocess execution.
//!
//! Commands are described by a [`CommandSpec`]: a program plus a structured
//! argument list, never a shell string. Specs are validated before spawning
//! and executed by a [`ProcessRunner`], which lets provisioning steps run
//! against [`MockRunner`](super::mock::MockRunner) in tests.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{ProvisionError, Result};
use crate::logging::RunLog;

use super::search_path::SearchPath;

/// How often a timed command is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep reading a killed command's pipes. A grandchild that
/// escaped the kill can hold them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A validated-before-use description of a subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
    search_path: Option<SearchPath>,
    capture: bool,
    timeout: Option<Duration>,
}

impl CommandSpec {
    /// Start a spec for `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            search_path: None,
            capture: false,
            timeout: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir`.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Give the child this `PATH` and resolve bare program names against it.
    pub fn search_path(mut self, path: &SearchPath) -> Self {
        self.search_path = Some(path.clone());
        self
    }

    /// Capture stdout/stderr instead of inheriting them.
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Kill the child if it runs longer than `limit`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.timeout
    }

    /// Reject specs that cannot be passed to the OS intact.
    pub fn validate(&self) -> Result<()> {
        if self.program.as_os_str().is_empty() {
            return Err(ProvisionError::InvalidCommand {
                message: "program is empty".to_string(),
            });
        }
        let has_nul = |s: &std::ffi::OsStr| s.to_string_lossy().contains('\0');
        if has_nul(self.program.as_os_str())
            || self.args.iter().any(|a| has_nul(a.as_os_str()))
        {
            return Err(ProvisionError::InvalidCommand {
                message: format!("NUL byte in command: {}", self.display_line()),
            });
        }
        if self.env.keys().any(|k| k.is_empty() || k.contains('=')) {
            return Err(ProvisionError::InvalidCommand {
                message: "environment variable names must be non-empty and contain no '='"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Human-readable rendering for logs. Never executed.
    pub fn display_line(&self) -> String {
        let mut parts = vec![quote(&self.program.to_string_lossy())];
        parts.extend(self.args.iter().map(|a| quote(&a.to_string_lossy())));
        parts.join(" ")
    }
}

fn quote(part: &str) -> String {
    if part.is_empty() || part.chars().any(char::is_whitespace) {
        format!("\"{}\"", part)
    } else {
        part.to_string()
    }
}

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or timeout).
    pub exit_code: Option<i32>,

    /// Standard output (empty unless captured).
    pub stdout: String,

    /// Standard error (empty unless captured).
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed for exceeding its time limit.
    pub timed_out: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            timed_out: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: false,
        }
    }

    /// Create a result for a command killed at its time limit.
    pub fn timed_out(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::failure(None, stdout, stderr, duration)
        }
    }
}

/// Executes command specs.
pub trait ProcessRunner {
    /// Run `spec` to completion (or its time limit).
    ///
    /// A non-zero exit is a successful `Ok` with `success == false`;
    /// `Err` means the command could not be started at all.
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        spec.validate()?;
        execute(spec)
    }
}

/// Execute a validated spec.
fn execute(spec: &CommandSpec) -> Result<CommandResult> {
    let start = Instant::now();
    let spawn_failed = || ProvisionError::CommandFailed {
        command: spec.display_line(),
        code: None,
    };

    let mut cmd = Command::new(resolve_program(spec));
    cmd.args(&spec.args);

    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }

    if let Some(path) = &spec.search_path {
        cmd.env("PATH", path.to_os_string()?);
    }

    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    if spec.capture {
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
    }

    // A timed command leads its own process group so the whole tree can be
    // killed when the limit expires.
    #[cfg(unix)]
    if spec.timeout.is_some() {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(|_| spawn_failed())?;

    // Drain pipes on their own threads so a chatty child cannot fill a pipe
    // buffer and block while we wait on it.
    let stdout_rx = child.stdout.take().map(spawn_drain);
    let stderr_rx = child.stderr.take().map(spawn_drain);

    let status = match spec.timeout {
        Some(limit) => wait_with_timeout(&mut child, limit),
        None => child.wait().map(Some),
    }
    .map_err(|_| spawn_failed())?;

    let grace = status.is_none().then_some(DRAIN_GRACE);
    let stdout = stdout_rx.map(|rx| collect(&rx, grace)).unwrap_or_default();
    let stderr = stderr_rx.map(|rx| collect(&rx, grace)).unwrap_or_default();

    let duration = start.elapsed();

    Ok(match status {
        Some(status) if status.success() => CommandResult::success(stdout, stderr, duration),
        Some(status) => CommandResult::failure(status.code(), stdout, stderr, duration),
        None => CommandResult::timed_out(stdout, stderr, duration),
    })
}

/// Bare program names are looked up in the spec's own search path, not the
/// parent's.
fn resolve_program(spec: &CommandSpec) -> PathBuf {
    let is_bare = spec.program.components().count() == 1 && !spec.program.is_absolute();
    if is_bare {
        if let (Some(path), Some(name)) = (&spec.search_path, spec.program.to_str()) {
            if let Some(found) = path.resolve(name) {
                return found;
            }
        }
    }
    spec.program.clone()
}

fn drain<R: Read>(mut reader: R) -> String {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn spawn_drain<R: Read + Send + 'static>(reader: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(drain(reader));
    });
    rx
}

/// Wait for a drain thread. With a grace period, a pipe still held open when
/// it expires is abandoned and reads as empty.
fn collect(rx: &Receiver<String>, grace: Option<Duration>) -> String {
    match grace {
        Some(limit) => rx.recv_timeout(limit).unwrap_or_default(),
        None => rx.recv().unwrap_or_default(),
    }
}

fn wait_with_timeout(child: &mut Child, limit: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            kill_tree(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    match libc::pid_t::try_from(child.id()) {
        // SAFETY: the child leads its own group, so this only signals its tree.
        Ok(pgid) => unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        },
        Err(_) => {
            let _ = child.kill();
        }
    }
}

#[cfg(windows)]
fn kill_tree(child: &mut Child) {
    let _ = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &child.id().to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    let _ = child.kill();
}

#[cfg(not(any(unix, windows)))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Records every command and its captured output in the run log.
pub struct LoggingRunner<'a> {
    inner: &'a dyn ProcessRunner,
    log: &'a RunLog,
}

impl<'a> LoggingRunner<'a> {
    pub fn new(inner: &'a dyn ProcessRunner, log: &'a RunLog) -> Self {
        Self { inner, log }
    }
}

impl ProcessRunner for LoggingRunner<'_> {
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        self.log.info(format!("RUN: {}", spec.display_line()));
        let result = self.inner.run(spec)?;
        if !result.stdout.trim().is_empty() {
            self.log.info(format!("OUT: {}", result.stdout.trim()));
        }
        if !result.stderr.trim().is_empty() {
            self.log.info(format!("ERR: {}", result.stderr.trim()));
        }
        if result.timed_out {
            self.log.warn(format!(
                "Timed out after {:.1}s: {}",
                result.duration.as_secs_f64(),
                spec.display_line()
            ));
        }
        Ok(result)
    }
}

//! Scripted process runner for testing.
//!
//! `MockRunner` implements [`ProcessRunner`] without spawning anything.
//! Responses are registered against substrings of a command's
//! [`display_line`](CommandSpec::display_line); the first matching rule
//! wins and unmatched commands succeed with empty output. An optional
//! effect closure lets a rule simulate side effects such as a virtual
//! environment appearing on disk.
//!
//! # Example
//!
//! ```
//! use kindling::shell::{CommandSpec, MockRunner, ProcessRunner};
//!
//! let runner = MockRunner::new();
//! runner.respond("--version", 0, "Python 3.11.9");
//!
//! let result = runner
//!     .run(&CommandSpec::new("python3").arg("--version"))
//!     .unwrap();
//! assert_eq!(result.stdout, "Python 3.11.9");
//! assert!(runner.was_called("python3 --version"));
//! ```

use std::cell::RefCell;
use std::time::Duration;

use crate::error::{ProvisionError, Result};

use super::command::{CommandResult, CommandSpec, ProcessRunner};

type Effect = Box<dyn Fn(&CommandSpec)>;

struct Rule {
    pattern: String,
    exit_code: Option<i32>,
    stdout: String,
    effect: Option<Effect>,
}

/// Process runner returning pre-registered responses.
#[derive(Default)]
pub struct MockRunner {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<String>>,
}

impl MockRunner {
    /// Create a runner where every command succeeds silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to commands containing `pattern`.
    pub fn respond(&self, pattern: &str, exit_code: i32, stdout: &str) -> &Self {
        self.push(pattern, Some(exit_code), stdout, None)
    }

    /// Respond to commands containing `pattern` and run `effect` first.
    pub fn respond_with<F>(&self, pattern: &str, exit_code: i32, stdout: &str, effect: F) -> &Self
    where
        F: Fn(&CommandSpec) + 'static,
    {
        self.push(pattern, Some(exit_code), stdout, Some(Box::new(effect)))
    }

    /// Make commands containing `pattern` fail to start.
    pub fn fail_to_start(&self, pattern: &str) -> &Self {
        self.push(pattern, None, "", None)
    }

    /// Display lines of every command run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Whether any command containing `pattern` was run.
    pub fn was_called(&self, pattern: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.contains(pattern))
    }

    fn push(
        &self,
        pattern: &str,
        exit_code: Option<i32>,
        stdout: &str,
        effect: Option<Effect>,
    ) -> &Self {
        self.rules.borrow_mut().push(Rule {
            pattern: pattern.to_string(),
            exit_code,
            stdout: stdout.to_string(),
            effect,
        });
        self
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        spec.validate()?;
        let line = spec.display_line();
        self.calls.borrow_mut().push(line.clone());

        let rules = self.rules.borrow();
        let Some(rule) = rules.iter().find(|r| line.contains(&r.pattern)) else {
            return Ok(CommandResult::success(
                String::new(),
                String::new(),
                Duration::ZERO,
            ));
        };

        if let Some(effect) = &rule.effect {
            effect(spec);
        }

        match rule.exit_code {
            None => Err(ProvisionError::CommandFailed {
                command: line,
                code: None,
            }),
            Some(0) => Ok(CommandResult::success(
                rule.stdout.clone(),
                String::new(),
                Duration::ZERO,
            )),
            Some(code) => Ok(CommandResult::failure(
                Some(code),
                rule.stdout.clone(),
                String::new(),
                Duration::ZERO,
            )),
        }
    }
}

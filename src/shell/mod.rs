//! Subprocess execution, search path handling and host facts.

pub mod command;
pub mod mock;
pub mod platform;
pub mod search_path;

pub use command::{CommandResult, CommandSpec, LoggingRunner, ProcessRunner, SystemRunner};
pub use mock::MockRunner;
pub use platform::{is_elevated, HostInfo, OsFamily};
pub use search_path::{is_executable, SearchPath};

//! Terminal output.
//!
//! Commands talk to the user through [`UserInterface`] so tests can swap
//! in [`MockUI`] and assert on what would have been shown.
//!
//! # Example
//!
//! ```
//! use kindling::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.success("Environment ready");
//! assert_eq!(ui.successes(), ["Environment ready"]);
//! ```

pub mod mock;
pub mod progress;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use progress::{download_bar, format_age};
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, KindlingTheme};

/// What commands can show the user.
pub trait UserInterface {
    /// Plain line of output.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Errors go to stderr on a real terminal.
    fn error(&mut self, msg: &str);

    /// A suggested next step, shown after an outcome.
    fn hint(&mut self, msg: &str);

    fn show_header(&mut self, title: &str);

    /// A labelled value, e.g. `Runtime: 3.11.9`.
    fn field(&mut self, key: &str, value: &str);
}

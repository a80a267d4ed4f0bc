//! Terminal UI.

use console::Term;
use std::io::Write;

use super::{should_use_colors, KindlingTheme, UserInterface};

/// Writes to stdout, with errors on stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: KindlingTheme,
}

impl TerminalUI {
    pub fn new(colors: bool) -> Self {
        let theme = if colors {
            KindlingTheme::new()
        } else {
            KindlingTheme::plain()
        };
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme,
        }
    }
}

impl UserInterface for TerminalUI {
    fn message(&mut self, msg: &str) {
        writeln!(self.out, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn hint(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_hint(msg)).ok();
    }

    fn show_header(&mut self, title: &str) {
        writeln!(self.out, "\n{}\n", self.theme.format_header(title)).ok();
    }

    fn field(&mut self, key: &str, value: &str) {
        writeln!(self.out, "  {}", self.theme.format_field(key, value)).ok();
    }
}

/// Build the terminal UI, honouring `--no-color` and `NO_COLOR`.
pub fn create_ui(no_color: bool) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(!no_color && should_use_colors()))
}

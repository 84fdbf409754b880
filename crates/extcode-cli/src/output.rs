//! Colored build messages on stderr.

use console::{Style, Term};

/// Terminal output for build results.
pub(crate) struct Output {
    term: Term,
    done: Style,
    warn: Style,
    fail: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            done: Style::new().green().bold(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
        }
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.done, msg);
    }

    /// Build warnings, one per line.
    pub(crate) fn warning(&self, msg: &str) {
        self.line(&self.warn, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.fail, msg);
    }

    fn line(&self, style: &Style, msg: &str) {
        // stderr may be closed; nothing useful to do then
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}

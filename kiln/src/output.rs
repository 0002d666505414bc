//! Output layer for command summaries and exit logs.

use kiln_core::to_short_id;
use kiln_generator::{ExitLog, Severity};

/// Target output for command summaries.
///
/// Commands describe *what* to print with these semantic methods; the
/// implementation decides how to render it.
pub trait Output {
    /// Render a title/header.
    fn title(&mut self, text: &str);

    /// Start a new section with a heading.
    fn section(&mut self, name: &str);

    /// Render a bullet list item.
    fn list_item(&mut self, text: &str);

    /// Render an added item (e.g. new file).
    fn added_item(&mut self, text: &str);

    /// Render a removed item (e.g. deleted file).
    fn removed_item(&mut self, text: &str);

    /// Render a warning message.
    fn warning(&mut self, msg: &str);

    /// Render a block of preformatted text.
    fn preformatted(&mut self, text: &str);

    /// Render a blank line.
    fn newline(&mut self);
}

/// Terminal output implementation.
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for TerminalOutput {
    fn title(&mut self, text: &str) {
        println!("{}", text);
        println!("{}", "=".repeat(text.len()));
    }

    fn section(&mut self, name: &str) {
        println!("{}:", name);
    }

    fn list_item(&mut self, text: &str) {
        println!("  - {}", text);
    }

    fn added_item(&mut self, text: &str) {
        println!("  + {}", text);
    }

    fn removed_item(&mut self, text: &str) {
        println!("  - {}", text);
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("warning: {}", msg);
    }

    fn preformatted(&mut self, text: &str) {
        println!("{}", text);
    }

    fn newline(&mut self) {
        println!();
    }
}

/// Print queued plugin messages grouped by plugin, in queue order, tagged
/// with the short plugin id.
pub fn print_exit_logs(out: &mut dyn Output, logs: &[ExitLog]) {
    if logs.is_empty() {
        return;
    }
    let mut current: Option<&str> = None;
    for log in logs {
        let tag = to_short_id(&log.id);
        if current != Some(log.id.as_str()) {
            out.newline();
            out.section(tag);
            current = Some(log.id.as_str());
        }
        match log.severity {
            Severity::Warn | Severity::Error => {
                out.warning(&format!("[{tag}] {}", log.message));
            }
            _ => out.list_item(&log.message),
        }
    }
}

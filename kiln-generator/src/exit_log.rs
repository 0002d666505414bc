//! Deferred plugin messages, drained only after a successful run.
//!
//! The orchestrator owns the console while the pipeline runs, so plugins
//! queue their messages here instead of printing directly.

use serde::Serialize;

/// Severity tag for a queued exit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// Plain log line.
    Log,
    /// Informational message.
    Info,
    /// Success message.
    Done,
    /// Warning that doesn't abort generation.
    Warn,
    /// Error the plugin chose to report without aborting.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Log => write!(f, "log"),
            Severity::Info => write!(f, "info"),
            Severity::Done => write!(f, "done"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A message queued by a plugin during generation.
#[derive(Debug, Clone, Serialize)]
pub struct ExitLog {
    /// Id of the plugin that queued the message.
    pub id: String,
    /// Severity tag.
    pub severity: Severity,
    /// The message text.
    pub message: String,
}

impl ExitLog {
    pub fn new(id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
        }
    }

    pub fn info(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Info, message)
    }

    pub fn done(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Done, message)
    }

    pub fn warn(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Warn, message)
    }
}

// src/diag.rs - recoverable interpretation conditions, collected per canal
//
// The run-continues policy: malformed tokens, missing feed rates and
// unsupported arc planes are reported here instead of aborting the canal.
// Only invariant violations become hard errors (see canal::CanalError).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{tag} at line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, line: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(line, "{message}");
        self.entries.push(Diagnostic { severity: Severity::Warning, line, message });
    }

    pub fn error(&mut self, line: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(line, "{message}");
        self.entries.push(Diagnostic { severity: Severity::Error, line, message });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

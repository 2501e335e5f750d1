//! Collected warnings and fatal errors.
//!
//! Every recorded message is also emitted through `tracing` at the matching
//! level. Heuristic and capability warnings that would otherwise repeat for
//! every instance are keyed so they are recorded once.

use std::collections::HashSet;

use serde::Serialize;

use super::error::ImportError;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fidelity loss; the import continues.
    Warning,
    /// Structural problem; the import stops.
    Fatal,
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Human readable message.
    pub message: String,
}

/// Diagnostics sink threaded through an import.
#[derive(Debug, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    #[serde(skip)]
    reported: HashSet<String>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    /// Records a warning unless one with the same key was already recorded.
    ///
    /// The message is only built when it is recorded.
    pub fn warn_once(&mut self, key: impl Into<String>, message: impl FnOnce() -> String) {
        if self.reported.insert(key.into()) {
            self.warn(message());
        }
    }

    /// Records a fatal error and hands it back for propagation.
    pub fn fatal(&mut self, error: ImportError) -> ImportError {
        let message = error.to_string();
        tracing::error!("{message}");
        self.entries.push(Diagnostic {
            severity: Severity::Fatal,
            message,
        });
        error
    }

    /// Every diagnostic in the order recorded.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Warning messages in the order recorded.
    pub fn warnings(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.message.as_str())
    }

    /// Number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Returns `true` if any warning message contains `needle`.
    #[must_use]
    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings().any(|w| w.contains(needle))
    }
}

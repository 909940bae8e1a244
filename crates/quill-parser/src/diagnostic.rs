//! Parse diagnostics.
//!
//! Diagnostics are collected, never thrown: a malformed directive records a
//! diagnostic and the parse carries on.

use std::fmt;

use crate::ast::SourceRange;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum Severity {
    /// Recovered; output is still complete.
    Warning,
    /// A directive was replaced by an error node.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A message tied to a range of the top-level document.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Affected lines.
    pub range: SourceRange,
}

impl Diagnostic {
    /// Create a warning.
    pub fn warning(message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            range,
        }
    }

    /// Create an error.
    pub fn error(message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            range,
        }
    }

    /// Check if this is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.severity, self.range, self.message)
    }
}

//! Severity-tagged messages returned from a walk.
//!
//! Diagnostics are data, not errors: a walk always runs to completion of
//! every unblocked vertex and reports what happened, rather than returning
//! early with a single failure. Per-vertex diagnostics keep insertion
//! order; order across concurrently visited vertices is undefined.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The operation failed; the walk result carries an error.
    Error,
    /// Something noteworthy happened but the operation continued.
    Warning,
}

/// A single severity-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    severity: Severity,
    summary: String,
    detail: Option<String>,
}

impl Diagnostic {
    /// Creates an error diagnostic with the given summary.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
        }
    }

    /// Creates a warning diagnostic with the given summary.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
        }
    }

    /// Attaches a longer free-form description.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the short summary.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the longer description, if one was attached.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.detail {
            Some(detail) => write!(f, "{}: {}: {}", tag, self.summary, detail),
            None => write!(f, "{}: {}", tag, self.summary),
        }
    }
}

/// An ordered collection of diagnostics.
///
/// The walk driver merges one `Diagnostics` per vertex into the walk's
/// return value; within a vertex the order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if no diagnostics have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Appends a single diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    /// Appends every diagnostic from `other`, preserving its order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Returns true if any recorded diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity() == Severity::Error)
    }

    /// Iterates over all diagnostics in order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Iterates over error diagnostics only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity() == Severity::Error)
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_errors() {
        let diags = Diagnostics::new();
        assert!(diags.is_empty());
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_warning_is_not_error() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("deprecated attribute"));
        assert!(!diags.has_errors());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_has_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("first"));
        diags.push(Diagnostic::error("second"));
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
    }

    #[test]
    fn test_extend_preserves_order() {
        let mut left = Diagnostics::new();
        left.push(Diagnostic::warning("a"));

        let mut right = Diagnostics::new();
        right.push(Diagnostic::warning("b"));
        right.push(Diagnostic::error("c"));

        left.extend(right);
        let summaries: Vec<_> = left.iter().map(|d| d.summary().to_string()).collect();
        assert_eq!(summaries, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_display_includes_detail() {
        let diag = Diagnostic::error("invalid subgraph").with_detail("root vertex missing");
        assert_eq!(
            diag.to_string(),
            "error: invalid subgraph: root vertex missing"
        );
    }
}

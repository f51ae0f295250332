//! Import report structures
//!
//! Every import returns an [`ImportReport`] alongside the graph. Per-location
//! failures and ignored duplicates land here instead of failing the call.

use crate::error::{ErrorSeverity, ImportError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Category of a recorded issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    MalformedClassFile,
    UnreadableLocation,
    DuplicateClassIgnored,
    Other,
}

impl IssueKind {
    fn of(error: &ImportError) -> Self {
        match error {
            ImportError::MalformedClassFile { .. } => IssueKind::MalformedClassFile,
            ImportError::UnreadableLocation { .. }
            | ImportError::Io { .. }
            | ImportError::Zip { .. }
            | ImportError::InvalidPath { .. } => IssueKind::UnreadableLocation,
            ImportError::DuplicateClassIgnored { .. } => IssueKind::DuplicateClassIgnored,
            _ => IssueKind::Other,
        }
    }
}

/// A non-fatal problem recorded during an import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportIssue {
    pub kind: IssueKind,
    /// URIs involved; duplicates list the kept location first
    pub locations: Vec<String>,
    pub message: String,
    pub severity: ErrorSeverity,
}

impl ImportIssue {
    pub fn from_error(error: &ImportError) -> Self {
        Self {
            kind: IssueKind::of(error),
            locations: error.locations(),
            message: error.user_message(),
            severity: error.severity(),
        }
    }
}

/// Summary statistics of one import call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub locations_enumerated: usize,
    pub classes_parsed: usize,
    pub classes_imported: usize,
    pub external_classes: usize,
    pub duplicates_ignored: usize,
    pub failures: usize,
    pub duration: Duration,
    pub imported_at: chrono::DateTime<chrono::Utc>,
}

impl Default for ImportSummary {
    fn default() -> Self {
        Self {
            locations_enumerated: 0,
            classes_parsed: 0,
            classes_imported: 0,
            external_classes: 0,
            duplicates_ignored: 0,
            failures: 0,
            duration: Duration::from_secs(0),
            imported_at: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub issues: Vec<ImportIssue>,
    /// False when the import was cancelled before every location was parsed
    pub complete: bool,
}

impl Default for ImportReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportReport {
    pub fn new() -> Self {
        Self {
            summary: ImportSummary::default(),
            issues: Vec::new(),
            complete: true,
        }
    }

    /// Record a recoverable error and update the counters
    pub fn record(&mut self, error: &ImportError) {
        let issue = ImportIssue::from_error(error);
        match issue.kind {
            IssueKind::DuplicateClassIgnored => self.summary.duplicates_ignored += 1,
            _ => self.summary.failures += 1,
        }
        self.issues.push(issue);
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.summary.duration = duration;
    }

    pub fn warnings(&self) -> Vec<&ImportIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == ErrorSeverity::Warning)
            .collect()
    }

    /// Locations that could not be read or decoded
    pub fn failures(&self) -> Vec<&ImportIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.kind != IssueKind::DuplicateClassIgnored)
            .collect()
    }

    pub fn duplicates(&self) -> Vec<&ImportIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::DuplicateClassIgnored)
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failures > 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

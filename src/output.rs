//! Result types produced by a pipeline run.
//!
//! Every discovered document yields exactly one [`DocumentOutcome`], whether
//! it made it all the way to a persisted JSON file or stopped early. The
//! driver never propagates a per-document failure; it records it here and
//! moves on, so "one bad file never stops the batch" is visible in the data.

use crate::error::DocumentError;
use crate::schema::AccountSummary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A pipeline stage. Used to label where a document failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Open,
    Render,
    Encode,
    Extract,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Open => "open",
            Stage::Render => "render",
            Stage::Encode => "encode",
            Stage::Extract => "extract",
            Stage::Persist => "persist",
        };
        f.write_str(s)
    }
}

/// Per-document state machine.
///
/// ```text
/// Discovered ─▶ Rendered ─▶ Encoded ─▶ Extracted ─▶ Persisted
///      │            │           │           │
///      └────────────┴───────────┴───────────┴──▶ Failed(stage)
/// ```
///
/// `Persisted` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentState {
    Discovered,
    Rendered,
    Encoded,
    Extracted,
    Persisted,
    Failed(Stage),
}

impl DocumentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentState::Persisted | DocumentState::Failed(_))
    }
}

/// What happened to one input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Path of the input PDF.
    pub source: PathBuf,
    /// Final state reached.
    pub state: DocumentState,
    /// Rendered page image, if it was written.
    pub image_path: Option<PathBuf>,
    /// JSON result file, if it was written.
    pub result_path: Option<PathBuf>,
    /// The extraction record, if the service answered.
    pub extracted: Option<AccountSummary>,
    /// Set when `state` is `Failed`.
    pub error: Option<DocumentError>,
    /// Wall-clock time spent on this document.
    pub duration_ms: u64,
}

impl DocumentOutcome {
    pub(crate) fn discovered(source: PathBuf) -> Self {
        Self {
            source,
            state: DocumentState::Discovered,
            image_path: None,
            result_path: None,
            extracted: None,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.state == DocumentState::Persisted
    }

    /// File name of the source document, for display.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_documents: usize,
    pub persisted: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub stats: RunStats,
}

impl RunReport {
    /// Outcomes that ended in `Failed`.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_persisted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(DocumentState::Persisted.is_terminal());
        assert!(DocumentState::Failed(Stage::Render).is_terminal());
        assert!(!DocumentState::Encoded.is_terminal());
        assert!(!DocumentState::Discovered.is_terminal());
    }

    #[test]
    fn file_name_from_source() {
        let o = DocumentOutcome::discovered(PathBuf::from("input_documents/jane.pdf"));
        assert_eq!(o.file_name(), "jane.pdf");
        assert!(!o.is_persisted());
    }

    #[test]
    fn stage_serialises_lowercase() {
        let s = serde_json::to_string(&Stage::Extract).unwrap();
        assert_eq!(s, "\"extract\"");
    }
}

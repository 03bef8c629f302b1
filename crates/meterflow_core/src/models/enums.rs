//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// Kind of an output column in a format definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Copies a source column (the column's value holds the source index).
    #[default]
    Data,
    /// Writes formula text built from a `{r}`/`{r-1}` template.
    Formula,
    /// Leaves the column blank.
    Empty,
}

impl ColumnKind {
    /// Parse a serialized kind string, falling back to `Data` for
    /// anything unrecognized.
    pub fn sanitize(raw: &str) -> Self {
        match raw {
            "formula" => Self::Formula,
            "empty" => Self::Empty,
            _ => Self::Data,
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Data => write!(f, "data"),
            ColumnKind::Formula => write!(f, "formula"),
            ColumnKind::Empty => write!(f, "empty"),
        }
    }
}

/// Status of a single file within a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileStatus {
    /// Waiting to be processed.
    #[default]
    Queued,
    /// Currently being read and transformed.
    Processing,
    /// Transformed successfully; result cached for commit.
    Done,
    /// Transform failed; the rest of the batch continues.
    Failed,
    /// Skipped because the job was cancelled.
    Cancelled,
}

impl FileStatus {
    /// Get display string for UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Processing => "Processing",
            Self::Done => "Done",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// Job-level phase of a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobPhase {
    /// Files chosen, layout not yet applied.
    #[default]
    Selecting,
    /// Transform running file by file.
    Converting,
    /// All files terminal; destinations editable before commit.
    BatchReview,
    /// Commit phase writing output files.
    Creating,
    /// All outputs written.
    Complete,
    /// Cancelled during Converting or Creating.
    Cancelled,
}

impl JobPhase {
    /// Get display string for UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selecting => "Selecting",
            Self::Converting => "Converting",
            Self::BatchReview => "BatchReview",
            Self::Creating => "Creating",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
        }
    }
}

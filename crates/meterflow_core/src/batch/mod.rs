//! Batch conversion control: sequencing, per-file status, destination
//! validation, and the commit phase with locked-output retry.

mod controller;
mod manifest;
mod validate;

pub use controller::{BatchController, BatchEntry, CommitOutcome, SaveCommand};
pub use manifest::{ensure_xlsx_extension, normalize_output_name, OutputTarget};
pub use validate::{
    invalid_directory_reason, invalid_name_reason, validate_targets, IssueKind, ValidationIssue,
    ValidationReport, REPORT_PREVIEW_CAP, RESERVED_NAME_CHARS,
};

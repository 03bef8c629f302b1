//! Pre-commit validation of batch destinations.
//!
//! Validation runs before any file is written; a single violation blocks
//! the whole commit with an itemized report.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::manifest::OutputTarget;

/// Characters not allowed in output file names.
pub const RESERVED_NAME_CHARS: &str = "<>:\"/\\|?*";

/// How many issues a report preview shows before "and N more".
pub const REPORT_PREVIEW_CAP: usize = 8;

/// What rule a destination violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The output directory is missing, not a directory, or unwritable.
    Directory,
    /// The output file name is empty or malformed.
    FileName,
    /// Two entries resolve to the same destination path.
    DuplicatePath,
}

/// One itemized validation violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Index of the affected batch entry.
    pub index: usize,
    /// Short source name for display.
    pub source: String,
    /// What rule was violated.
    pub kind: IssueKind,
    /// Actionable description.
    pub message: String,
}

/// The itemized result of validating a batch's destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// All violations, in entry order (directory and name issues first,
    /// then duplicate-path conflicts).
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether the batch may commit.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Render a capped preview: numbered lines plus "and N more".
    pub fn summary(&self) -> String {
        let mut lines: Vec<String> = self
            .issues
            .iter()
            .take(REPORT_PREVIEW_CAP)
            .enumerate()
            .map(|(i, issue)| format!("{}. {}: {}", i + 1, issue.source, issue.message))
            .collect();
        if self.issues.len() > REPORT_PREVIEW_CAP {
            lines.push(format!(
                "...and {} more issue(s)",
                self.issues.len() - REPORT_PREVIEW_CAP
            ));
        }
        lines.join("\n")
    }
}

/// Validate every target: directories, file names, then duplicate
/// resolved paths (one conflict entry per affected index).
pub fn validate_targets(targets: &[&OutputTarget]) -> ValidationReport {
    let mut issues = Vec::new();

    for (index, target) in targets.iter().enumerate() {
        if let Some(message) = invalid_directory_reason(&target.save_dir) {
            issues.push(ValidationIssue {
                index,
                source: target.source_display(),
                kind: IssueKind::Directory,
                message,
            });
        }
        if let Some(message) = invalid_name_reason(&target.file_name) {
            issues.push(ValidationIssue {
                index,
                source: target.source_display(),
                kind: IssueKind::FileName,
                message,
            });
        }
    }

    let mut by_path: HashMap<PathBuf, Vec<usize>> = HashMap::new();
    for (index, target) in targets.iter().enumerate() {
        if target.file_name.trim().is_empty() {
            continue;
        }
        by_path.entry(target.save_path()).or_default().push(index);
    }
    let mut conflicts: Vec<(usize, PathBuf)> = by_path
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .flat_map(|(path, group)| group.into_iter().map(move |i| (i, path.clone())))
        .collect();
    conflicts.sort_by_key(|(i, _)| *i);
    for (index, path) in conflicts {
        issues.push(ValidationIssue {
            index,
            source: targets[index].source_display(),
            kind: IssueKind::DuplicatePath,
            message: format!("duplicate output path in batch list: {}", path.display()),
        });
    }

    ValidationReport { issues }
}

/// Why a directory cannot receive output, if it cannot.
pub fn invalid_directory_reason(dir: &Path) -> Option<String> {
    if dir.as_os_str().is_empty() {
        return Some("Save folder cannot be empty.".to_string());
    }
    if !dir.exists() {
        return Some("Save folder does not exist.".to_string());
    }
    if !dir.is_dir() {
        return Some("Save path is not a folder.".to_string());
    }
    if !dir_is_writable(dir) {
        return Some("Save folder is not writable.".to_string());
    }
    None
}

/// Why a file name is unusable, if it is.
pub fn invalid_name_reason(file_name: &str) -> Option<String> {
    let mut base = file_name.trim();
    let lower = base.to_lowercase();
    if lower.ends_with(".xlsx") {
        base = base[..base.len() - 5].trim();
    } else if lower.ends_with(".xls") {
        base = base[..base.len() - 4].trim();
    }
    if base.is_empty() {
        return Some("File name cannot be empty.".to_string());
    }
    let mut bad: Vec<char> = base
        .chars()
        .filter(|c| RESERVED_NAME_CHARS.contains(*c) || (*c as u32) < 32)
        .collect();
    bad.sort_unstable();
    bad.dedup();
    if !bad.is_empty() {
        let shown: String = bad
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        return Some(format!(
            "Invalid character(s): {}. Not allowed: < > : \" / \\ | ? *",
            shown
        ));
    }
    if base.ends_with('.') || base.ends_with(' ') {
        return Some("File name cannot end with a dot or space.".to_string());
    }
    None
}

/// Probe-write check; a directory we cannot create a file in is not a
/// valid destination regardless of what its metadata claims.
fn dir_is_writable(dir: &Path) -> bool {
    let probe = dir.join(".mf_write_probe");
    match fs::File::create(&probe) {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn target(source: &str, name: &str, dir: &Path) -> OutputTarget {
        let mut t = OutputTarget::default_for(Path::new(source));
        t.file_name = name.to_string();
        t.save_dir = dir.to_path_buf();
        t
    }

    #[test]
    fn valid_targets_pass() {
        let dir = tempdir().unwrap();
        let a = target("/s/a.xml", "a.xlsx", dir.path());
        let b = target("/s/b.xml", "b.xlsx", dir.path());
        let report = validate_targets(&[&a, &b]);
        assert!(report.is_ok());
        assert!(report.summary().is_empty());
    }

    #[test]
    fn missing_directory_is_reported() {
        let a = target("/s/a.xml", "a.xlsx", Path::new("/definitely/not/here"));
        let report = validate_targets(&[&a]);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::Directory);
        assert!(report.issues[0].message.contains("does not exist"));
    }

    #[test]
    fn name_rules_are_enforced() {
        assert!(invalid_name_reason("report.xlsx").is_none());
        assert!(invalid_name_reason("").unwrap().contains("empty"));
        assert!(invalid_name_reason(".xlsx").unwrap().contains("empty"));
        assert!(invalid_name_reason("a<b.xlsx").unwrap().contains("Invalid character"));
        assert!(invalid_name_reason("a?.xlsx").unwrap().contains('?'));
        assert!(invalid_name_reason("trailing..xlsx")
            .unwrap()
            .contains("dot or space"));
        assert!(invalid_name_reason("trailing .xlsx")
            .unwrap()
            .contains("dot or space"));
    }

    #[test]
    fn duplicate_paths_reported_once_per_affected_index() {
        let dir = tempdir().unwrap();
        let a = target("/s/a.xml", "same.xlsx", dir.path());
        let b = target("/s/b.xml", "same.xlsx", dir.path());
        let c = target("/s/c.xml", "other.xlsx", dir.path());
        let report = validate_targets(&[&a, &b, &c]);
        let dup: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::DuplicatePath)
            .collect();
        assert_eq!(dup.len(), 2);
        assert_eq!(dup[0].index, 0);
        assert_eq!(dup[1].index, 1);
    }

    #[test]
    fn extension_variants_collide() {
        let dir = tempdir().unwrap();
        // "same" resolves to "same.xlsx" at save time.
        let a = target("/s/a.xml", "same", dir.path());
        let b = target("/s/b.xml", "same.xlsx", dir.path());
        let report = validate_targets(&[&a, &b]);
        assert!(!report.is_ok());
    }

    #[test]
    fn summary_caps_preview() {
        let issues: Vec<ValidationIssue> = (0..11)
            .map(|i| ValidationIssue {
                index: i,
                source: format!("file{}.xml", i),
                kind: IssueKind::FileName,
                message: "File name cannot be empty.".to_string(),
            })
            .collect();
        let report = ValidationReport { issues };
        let summary = report.summary();
        assert!(summary.contains("...and 3 more issue(s)"));
        assert_eq!(summary.lines().count(), REPORT_PREVIEW_CAP + 1);
    }
}

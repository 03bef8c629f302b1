//! Batch output targets: per-entry destination file name and folder,
//! editable before commit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Proposed destination for one converted source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTarget {
    /// The source file this result came from.
    pub source_file: PathBuf,
    /// Output file name (extension normalized to `.xlsx` at resolve
    /// time).
    pub file_name: String,
    /// Output directory.
    pub save_dir: PathBuf,
}

impl OutputTarget {
    /// Default target: the source file's own directory, stem + `.xlsx`.
    pub fn default_for(source: &Path) -> Self {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        Self {
            source_file: source.to_path_buf(),
            file_name: format!("{}.xlsx", stem),
            save_dir: source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Short source name for reports.
    pub fn source_display(&self) -> String {
        self.source_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source_file.to_string_lossy().to_string())
    }

    /// The fully resolved destination path.
    pub fn save_path(&self) -> PathBuf {
        self.save_dir.join(ensure_xlsx_extension(&self.file_name))
    }

    /// Replace the file name, normalizing the extension. An input that
    /// normalizes to nothing clears the name (caught by validation).
    pub fn set_file_name(&mut self, name: &str) {
        self.file_name = normalize_output_name(name);
    }

    /// Replace the output directory.
    pub fn set_save_dir(&mut self, dir: impl Into<PathBuf>) {
        self.save_dir = dir.into();
    }
}

/// Append `.xlsx` unless the name already ends with it (any case).
pub fn ensure_xlsx_extension(file_name: &str) -> String {
    if file_name.is_empty() {
        return "output.xlsx".to_string();
    }
    if file_name.to_lowercase().ends_with(".xlsx") {
        file_name.to_string()
    } else {
        format!("{}.xlsx", file_name)
    }
}

/// Normalize a user-entered output name: strip any `.xlsx`/`.xls`
/// extension and surrounding whitespace, then re-append `.xlsx`.
/// Returns an empty string when nothing usable remains.
pub fn normalize_output_name(file_name: &str) -> String {
    let mut base = file_name.trim();
    if base.is_empty() {
        return String::new();
    }
    let lower = base.to_lowercase();
    if lower.ends_with(".xlsx") {
        base = &base[..base.len() - 5];
    } else if lower.ends_with(".xls") {
        base = &base[..base.len() - 4];
    }
    let base = base.trim();
    if base.is_empty() {
        return String::new();
    }
    format!("{}.xlsx", base)
}

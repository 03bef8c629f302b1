//! The sheet-writer collaborator: a small trait over the spreadsheet
//! library, plus the production implementation on `rust_xlsxwriter`.
//!
//! A locked destination (held open by another process) is surfaced as
//! its own error kind so callers can offer a retry instead of aborting.

use std::io;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use thiserror::Error;

use super::style::{NumberClass, StyleSpec};
use crate::models::OutCell;

/// Errors from writing a spreadsheet.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The destination is open in another program; close it and retry.
    #[error("destination file is locked by another process: {path}")]
    DestinationLocked { path: PathBuf },

    /// Generic I/O failure writing the destination.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Spreadsheet-level failure (bad sheet name, cell limits, ...).
    #[error("spreadsheet error: {message}")]
    Sheet { message: String },
}

impl ExportError {
    /// Whether the caller can retry after operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DestinationLocked { .. })
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Handle to an interned style.
pub type StyleId = usize;

/// Low-level spreadsheet writing primitive.
///
/// One writer instance serves a sequence of documents: `new_document`
/// opens a fresh workbook, `save` flushes it to disk.
pub trait SheetWriter {
    /// Start a new single-sheet document at the given path.
    fn new_document(&mut self, path: &Path, sheet_name: &str) -> ExportResult<()>;

    /// Intern a style, returning its handle.
    fn define_style(&mut self, spec: &StyleSpec) -> StyleId;

    /// Write one cell (blank cells still receive the style).
    fn write_cell(&mut self, row: u32, col: u16, value: &OutCell, style: StyleId)
        -> ExportResult<()>;

    /// Write formula text into a cell.
    fn write_formula(&mut self, row: u32, col: u16, text: &str, style: StyleId)
        -> ExportResult<()>;

    /// Set a column's width and visibility.
    fn set_column_width(&mut self, col: u16, width: f64, hidden: bool) -> ExportResult<()>;

    /// Flush the current document to disk.
    fn save(&mut self) -> ExportResult<()>;
}

/// Production sheet writer backed by `rust_xlsxwriter`.
///
/// The workbook is buffered in memory until `save`.
#[derive(Default)]
pub struct XlsxSheetWriter {
    workbook: Option<Workbook>,
    path: PathBuf,
    styles: Vec<Format>,
    interned: Vec<(StyleSpec, StyleId)>,
}

impl XlsxSheetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn worksheet(&mut self) -> ExportResult<&mut rust_xlsxwriter::Worksheet> {
        let workbook = self.workbook.as_mut().ok_or_else(|| ExportError::Sheet {
            message: "no document open".to_string(),
        })?;
        workbook
            .worksheet_from_index(0)
            .map_err(|e| ExportError::Sheet {
                message: e.to_string(),
            })
    }

    fn style(&self, id: StyleId) -> ExportResult<&Format> {
        self.styles.get(id).ok_or_else(|| ExportError::Sheet {
            message: format!("unknown style handle {}", id),
        })
    }

    fn map_save_error(path: &Path, err: XlsxError) -> ExportError {
        match err {
            XlsxError::IoError(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                ExportError::DestinationLocked {
                    path: path.to_path_buf(),
                }
            }
            XlsxError::IoError(e) => ExportError::Write {
                path: path.to_path_buf(),
                source: e,
            },
            other => ExportError::Sheet {
                message: other.to_string(),
            },
        }
    }
}

/// Build the library format for a style spec.
fn build_format(spec: &StyleSpec) -> Format {
    let mut format = Format::new().set_num_format(spec.number.format_code());
    if let Some(bg) = spec.background {
        format = format.set_background_color(bg);
    }
    if let Some(color) = spec.font_color {
        format = format.set_font_color(color);
    }
    if spec.header {
        format = format
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border_left(FormatBorder::Thin)
            .set_border_right(FormatBorder::Thin);
    } else {
        format = format
            .set_align(FormatAlign::Right)
            .set_border(FormatBorder::Thin);
    }
    format
}

impl SheetWriter for XlsxSheetWriter {
    fn new_document(&mut self, path: &Path, sheet_name: &str) -> ExportResult<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name)
            .map_err(|e| ExportError::Sheet {
                message: e.to_string(),
            })?;
        self.workbook = Some(workbook);
        self.path = path.to_path_buf();
        self.styles.clear();
        self.interned.clear();
        Ok(())
    }

    fn define_style(&mut self, spec: &StyleSpec) -> StyleId {
        if let Some((_, id)) = self.interned.iter().find(|(s, _)| s == spec) {
            return *id;
        }
        let id = self.styles.len();
        self.styles.push(build_format(spec));
        self.interned.push((*spec, id));
        id
    }

    fn write_cell(
        &mut self,
        row: u32,
        col: u16,
        value: &OutCell,
        style: StyleId,
    ) -> ExportResult<()> {
        let format = self.style(style)?.clone();
        let worksheet = self.worksheet()?;
        let result = match value {
            OutCell::Empty => worksheet.write_blank(row, col, &format),
            OutCell::Number(n) => worksheet.write_number_with_format(row, col, *n, &format),
            OutCell::Text(s) => worksheet.write_string_with_format(row, col, s, &format),
            // Formula cells routed here still go through the formula
            // channel so the sheet computes them.
            OutCell::Formula(f) => worksheet.write_formula_with_format(row, col, f.as_str(), &format),
        };
        result.map(|_| ()).map_err(|e| ExportError::Sheet {
            message: e.to_string(),
        })
    }

    fn write_formula(
        &mut self,
        row: u32,
        col: u16,
        text: &str,
        style: StyleId,
    ) -> ExportResult<()> {
        let format = self.style(style)?.clone();
        let worksheet = self.worksheet()?;
        worksheet
            .write_formula_with_format(row, col, text, &format)
            .map(|_| ())
            .map_err(|e| ExportError::Sheet {
                message: e.to_string(),
            })
    }

    fn set_column_width(&mut self, col: u16, width: f64, hidden: bool) -> ExportResult<()> {
        let worksheet = self.worksheet()?;
        worksheet
            .set_column_width(col, width)
            .map_err(|e| ExportError::Sheet {
                message: e.to_string(),
            })?;
        if hidden {
            worksheet
                .set_column_hidden(col)
                .map_err(|e| ExportError::Sheet {
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    fn save(&mut self) -> ExportResult<()> {
        let path = self.path.clone();
        let workbook = self.workbook.as_mut().ok_or_else(|| ExportError::Sheet {
            message: "no document open".to_string(),
        })?;
        let result = workbook
            .save(&path)
            .map_err(|e| Self::map_save_error(&path, e));
        if result.is_ok() {
            self.workbook = None;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_a_document_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let mut writer = XlsxSheetWriter::new();
        writer.new_document(&path, "report").unwrap();
        let header = writer.define_style(&StyleSpec::header());
        let numeric = writer.define_style(&StyleSpec::numeric());
        writer
            .write_cell(0, 0, &OutCell::Text("Clock".to_string()), header)
            .unwrap();
        writer
            .write_cell(2, 1, &OutCell::Number(42.5), numeric)
            .unwrap();
        writer
            .write_formula(2, 2, "=B3*280", numeric)
            .unwrap();
        writer.set_column_width(0, 17.73, false).unwrap();
        writer.set_column_width(6, 16.27, true).unwrap();
        writer.save().unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn styles_are_interned_once() {
        let mut writer = XlsxSheetWriter::new();
        writer
            .new_document(Path::new("unused.xlsx"), "s")
            .unwrap();
        let a = writer.define_style(&StyleSpec::numeric());
        let b = writer.define_style(&StyleSpec::numeric());
        let c = writer.define_style(&StyleSpec::numeric().highlighted());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unwritable_destination_reports_write_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("deep").join("report.xlsx");

        let mut writer = XlsxSheetWriter::new();
        writer.new_document(&path, "report").unwrap();
        let err = writer.save().unwrap_err();
        assert!(!err.is_retryable());
        match err {
            ExportError::Write { path: p, .. } => assert!(p.ends_with("report.xlsx")),
            other => panic!("expected Write error, got {:?}", other),
        }
    }
}

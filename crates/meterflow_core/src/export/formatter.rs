//! Applies the style taxonomy to an output grid and writes it through
//! the sheet-writer collaborator.

use std::path::Path;

use super::style::StyleSpec;
use super::writer::{ExportResult, SheetWriter};
use crate::formats::BuiltinKind;
use crate::models::{OutCell, OutputGrid, ProgressFn};
use crate::transform::Layout;

/// Longest sheet name the target format accepts.
pub const SHEET_NAME_MAX: usize = 31;

/// Writes computed grids as styled spreadsheets.
///
/// Stateless; styling decisions are pure functions of the layout
/// identity, the column position, and the cell value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportFormatter;

impl ExportFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Write `grid` to `dest`. The sheet name is derived from the source
    /// file the grid was computed from.
    pub fn write(
        &self,
        grid: &OutputGrid,
        layout: &Layout,
        source: &Path,
        dest: &Path,
        writer: &mut dyn SheetWriter,
        progress: Option<&ProgressFn>,
    ) -> ExportResult<()> {
        let mut grid = grid.clone();
        grid.sanitize_non_finite();

        report(progress, 90);
        writer.new_document(dest, &sheet_name_for(source))?;

        let header = writer.define_style(&StyleSpec::header());
        let accent_header = writer.define_style(&StyleSpec::accent_header());

        // Header rows: accent style on formula-bearing columns.
        for (row_idx, row) in grid.header_rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let style = if grid.columns[col_idx].formula {
                    accent_header
                } else {
                    header
                };
                writer.write_cell(row_idx as u32, col_idx as u16, cell, style)?;
            }
        }

        // Data rows: per-layout decision table, highlight override on
        // flagged rows.
        for (row_idx, row) in grid.rows.iter().enumerate() {
            let sheet_row = (OutputGrid::DATA_START_ROW + row_idx) as u32;
            for (col_idx, cell) in row.cells.iter().enumerate() {
                let mut spec = data_style(layout, col_idx, cell);
                if row.highlighted {
                    spec = spec.highlighted();
                }
                let style = writer.define_style(&spec);
                writer.write_cell(sheet_row, col_idx as u16, cell, style)?;
            }
        }

        for (col_idx, meta) in grid.columns.iter().enumerate() {
            writer.set_column_width(col_idx as u16, meta.width, meta.hidden)?;
        }

        writer.save()?;
        report(progress, 100);
        Ok(())
    }
}

fn report(progress: Option<&ProgressFn>, percent: u8) {
    if let Some(callback) = progress {
        callback(percent);
    }
}

/// Derive the sheet name from a source file: the stem with its last
/// underscore-delimited segment removed, capped to the format limit.
pub fn sheet_name_for(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Sheet1".to_string());
    let base = match stem.rfind('_') {
        Some(pos) => stem[..pos].to_string(),
        None => stem,
    };
    base.chars().take(SHEET_NAME_MAX).collect()
}

/// The per-layout style decision table for data cells.
fn data_style(layout: &Layout, col: usize, cell: &OutCell) -> StyleSpec {
    match layout {
        Layout::BuiltIn(BuiltinKind::Den) => {
            if col == 1 {
                // Status column: hex codes must never auto-coerce to
                // numbers.
                StyleSpec::text()
            } else if BuiltinKind::Den.accent_columns().contains(&col) {
                StyleSpec::accent_numeric()
            } else if matches!(cell, OutCell::Number(_) | OutCell::Formula(_)) {
                StyleSpec::numeric()
            } else {
                StyleSpec::text()
            }
        }
        Layout::BuiltIn(kind) => {
            let numeric_band = match kind {
                BuiltinKind::Glacier => 3..=12,
                _ => 3..=14,
            };
            if kind.accent_columns().contains(&col) {
                StyleSpec::accent_numeric()
            } else if numeric_band.contains(&col) {
                StyleSpec::numeric()
            } else if col == 0 {
                StyleSpec::generic()
            } else if col == 1 {
                StyleSpec::text()
            } else {
                StyleSpec::numeric()
            }
        }
        Layout::Custom(_) => {
            if cell.is_formula() {
                StyleSpec::custom_formula()
            } else {
                StyleSpec::generic()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::style::{ACCENT_BG, HIGHLIGHT_BG};
    use crate::export::writer::{ExportError, StyleId};
    use crate::formats::FormatDefinition;
    use crate::models::{ColumnMeta, GridRow};
    use std::path::PathBuf;

    /// Records every operation for assertions; can simulate a locked
    /// destination.
    #[derive(Default)]
    pub struct MockSheetWriter {
        pub sheet_name: String,
        pub path: PathBuf,
        pub styles: Vec<StyleSpec>,
        pub cells: Vec<(u32, u16, OutCell, StyleSpec)>,
        pub widths: Vec<(u16, f64, bool)>,
        pub locked_paths: Vec<PathBuf>,
        pub saved: Vec<PathBuf>,
    }

    impl SheetWriter for MockSheetWriter {
        fn new_document(&mut self, path: &Path, sheet_name: &str) -> ExportResult<()> {
            self.path = path.to_path_buf();
            self.sheet_name = sheet_name.to_string();
            Ok(())
        }

        fn define_style(&mut self, spec: &StyleSpec) -> StyleId {
            if let Some(pos) = self.styles.iter().position(|s| s == spec) {
                return pos;
            }
            self.styles.push(*spec);
            self.styles.len() - 1
        }

        fn write_cell(
            &mut self,
            row: u32,
            col: u16,
            value: &OutCell,
            style: StyleId,
        ) -> ExportResult<()> {
            self.cells.push((row, col, value.clone(), self.styles[style]));
            Ok(())
        }

        fn write_formula(
            &mut self,
            row: u32,
            col: u16,
            text: &str,
            style: StyleId,
        ) -> ExportResult<()> {
            self.write_cell(row, col, &OutCell::Formula(text.to_string()), style)
        }

        fn set_column_width(&mut self, col: u16, width: f64, hidden: bool) -> ExportResult<()> {
            self.widths.push((col, width, hidden));
            Ok(())
        }

        fn save(&mut self) -> ExportResult<()> {
            if self.locked_paths.contains(&self.path) {
                return Err(ExportError::DestinationLocked {
                    path: self.path.clone(),
                });
            }
            self.saved.push(self.path.clone());
            Ok(())
        }
    }

    fn small_grid(highlighted: bool) -> OutputGrid {
        OutputGrid {
            header_rows: [
                vec![OutCell::Text("0-0:1.0.0".to_string()), OutCell::Empty],
                vec![OutCell::Text("Clock".to_string()), OutCell::Empty],
            ],
            rows: vec![GridRow {
                cells: vec![
                    OutCell::Text("2024-01-05 10:15:07".to_string()),
                    OutCell::Formula("=A3*2".to_string()),
                ],
                highlighted,
            }],
            columns: vec![
                ColumnMeta::visible(17.0),
                ColumnMeta {
                    width: 20.0,
                    hidden: false,
                    formula: true,
                },
            ],
        }
    }

    fn custom_layout() -> Layout {
        Layout::Custom(FormatDefinition::new(
            "Site",
            FormatDefinition::default_columns("=C{r}*280"),
        ))
    }

    #[test]
    fn sheet_name_strips_last_segment_and_caps() {
        assert_eq!(sheet_name_for(Path::new("/x/meter_2024_01.xml")), "meter_2024");
        assert_eq!(sheet_name_for(Path::new("/x/report.xml")), "report");
        let long = format!("/x/{}.xml", "a".repeat(40));
        assert_eq!(sheet_name_for(Path::new(&long)).len(), SHEET_NAME_MAX);
    }

    #[test]
    fn header_rows_use_accent_for_formula_columns() {
        let mut writer = MockSheetWriter::default();
        ExportFormatter::new()
            .write(
                &small_grid(false),
                &custom_layout(),
                Path::new("src_a.xml"),
                Path::new("out.xlsx"),
                &mut writer,
                None,
            )
            .unwrap();

        let header_cells: Vec<_> = writer.cells.iter().filter(|(r, ..)| *r < 2).collect();
        assert_eq!(header_cells.len(), 4);
        for (_, col, _, spec) in header_cells {
            if *col == 1 {
                assert_eq!(spec.background, Some(ACCENT_BG));
            } else {
                assert_eq!(*spec, StyleSpec::header());
            }
        }
        assert_eq!(writer.sheet_name, "src");
    }

    #[test]
    fn highlighted_rows_get_yellow_background() {
        let mut writer = MockSheetWriter::default();
        ExportFormatter::new()
            .write(
                &small_grid(true),
                &custom_layout(),
                Path::new("src.xml"),
                Path::new("out.xlsx"),
                &mut writer,
                None,
            )
            .unwrap();

        for (row, _, _, spec) in writer.cells.iter().filter(|(r, ..)| *r >= 2) {
            assert_eq!(*row, 2);
            assert_eq!(spec.background, Some(HIGHLIGHT_BG));
        }
    }

    #[test]
    fn column_widths_and_hidden_flags_forwarded() {
        let mut writer = MockSheetWriter::default();
        let mut grid = small_grid(false);
        grid.columns[1].hidden = true;
        ExportFormatter::new()
            .write(
                &grid,
                &custom_layout(),
                Path::new("src.xml"),
                Path::new("out.xlsx"),
                &mut writer,
                None,
            )
            .unwrap();
        assert_eq!(writer.widths, vec![(0, 17.0, false), (1, 20.0, true)]);
        assert_eq!(writer.saved, vec![PathBuf::from("out.xlsx")]);
    }

    #[test]
    fn den_status_column_is_text_even_for_numbers() {
        let spec = data_style(
            &Layout::BuiltIn(BuiltinKind::Den),
            1,
            &OutCell::Number(12345.0),
        );
        assert_eq!(spec, StyleSpec::text());
    }

    #[test]
    fn den_decision_table() {
        let den = Layout::BuiltIn(BuiltinKind::Den);
        assert_eq!(
            data_style(&den, 3, &OutCell::Formula("=C3*280".to_string())),
            StyleSpec::accent_numeric()
        );
        assert_eq!(data_style(&den, 5, &OutCell::Empty), StyleSpec::accent_numeric());
        assert_eq!(data_style(&den, 4, &OutCell::Number(1.0)), StyleSpec::numeric());
        assert_eq!(
            data_style(&den, 0, &OutCell::Text("ts".to_string())),
            StyleSpec::text()
        );
    }

    #[test]
    fn globe_decision_table() {
        let globe = Layout::BuiltIn(BuiltinKind::Globe);
        assert_eq!(
            data_style(&globe, 10, &OutCell::Empty),
            StyleSpec::accent_numeric()
        );
        assert_eq!(
            data_style(&globe, 14, &OutCell::Number(1.0)),
            StyleSpec::numeric()
        );
        assert_eq!(
            data_style(&globe, 0, &OutCell::Text("ts".to_string())),
            StyleSpec::generic()
        );
        assert_eq!(
            data_style(&globe, 1, &OutCell::Text("00".to_string())),
            StyleSpec::text()
        );
    }

    #[test]
    fn glacier_numeric_band_is_narrower() {
        let glacier = Layout::BuiltIn(BuiltinKind::Glacier);
        assert_eq!(
            data_style(&glacier, 12, &OutCell::Number(1.0)),
            StyleSpec::numeric()
        );
        // Column 8 is an accent column for Glacier.
        assert_eq!(
            data_style(&glacier, 8, &OutCell::Empty),
            StyleSpec::accent_numeric()
        );
    }

    #[test]
    fn non_finite_values_are_zeroed_before_writing() {
        let mut grid = small_grid(false);
        grid.rows[0].cells[0] = OutCell::Number(f64::INFINITY);
        let mut writer = MockSheetWriter::default();
        ExportFormatter::new()
            .write(
                &grid,
                &custom_layout(),
                Path::new("src.xml"),
                Path::new("out.xlsx"),
                &mut writer,
                None,
            )
            .unwrap();
        let (_, _, value, _) = writer
            .cells
            .iter()
            .find(|(r, c, ..)| *r == 2 && *c == 0)
            .unwrap();
        assert_eq!(*value, OutCell::Number(0.0));
    }

    #[test]
    fn locked_destination_surfaces_distinct_error() {
        let mut writer = MockSheetWriter {
            locked_paths: vec![PathBuf::from("out.xlsx")],
            ..Default::default()
        };
        let err = ExportFormatter::new()
            .write(
                &small_grid(false),
                &custom_layout(),
                Path::new("src.xml"),
                Path::new("out.xlsx"),
                &mut writer,
                None,
            )
            .unwrap_err();
        assert!(err.is_retryable());
    }
}

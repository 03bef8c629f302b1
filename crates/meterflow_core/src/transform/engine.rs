//! The transform engine: raw row table + layout -> output grid.
//!
//! Pure given its inputs. Malformed cells degrade to blanks and parse
//! failures never raise; the only hard failure is a source with no data
//! rows left after schema filtering.

use thiserror::Error;

use super::formula;
use super::highlight::row_is_highlighted;
use super::layout::Layout;
use crate::formats::{BuiltinKind, ColumnSpec, FormatDefinition, LabelKey, DEFAULT_WIDTH};
use crate::models::{
    ColumnKind, ColumnMeta, GridRow, OutCell, OutputGrid, ProgressFn, RawRow, RawTable, Scalar,
};

/// Marker substring identifying schema artifact rows from the reader.
pub const SCHEMA_MARKER: &str = "/ArrayFieldDataSet";

/// One-based sheet row of the first data row (two header rows above it).
const FIRST_DATA_SHEET_ROW: usize = OutputGrid::DATA_START_ROW + 1;

/// Errors from applying a layout to a row table.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Every raw row was filtered out as a schema artifact.
    #[error("no valid data rows found in source (all rows were schema artifacts)")]
    EmptySource,

    /// A row could not be processed.
    #[error("failed to transform source row {origin}: {message}")]
    Row { origin: usize, message: String },
}

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Applies a layout to raw row tables.
///
/// Stateless; a single engine value can serve any number of conversions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformEngine;

impl TransformEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply `layout` to `table`, producing the computed output grid.
    ///
    /// Progress is reported from 50 to 90 across the row iteration; the
    /// caller owns 0-50 (reading) and 90-100 (writing).
    pub fn apply(
        &self,
        table: &RawTable,
        layout: &Layout,
        progress: Option<&ProgressFn>,
    ) -> TransformResult<OutputGrid> {
        let data_rows = filter_schema_rows(table);
        if data_rows.is_empty() {
            return Err(TransformError::EmptySource);
        }
        report(progress, 50);

        let grid = match layout {
            Layout::BuiltIn(kind) => apply_builtin(*kind, &data_rows, progress),
            Layout::Custom(def) => apply_custom(def, &data_rows, progress),
        };
        report(progress, 90);
        Ok(grid)
    }
}

/// Drop schema artifact rows (first cell contains the marker).
fn filter_schema_rows(table: &RawTable) -> Vec<&RawRow> {
    table
        .rows
        .iter()
        .filter(|row| {
            !row.cells
                .first()
                .and_then(Scalar::as_text)
                .is_some_and(|text| text.contains(SCHEMA_MARKER))
        })
        .collect()
}

/// The working cells of a raw row: everything after the dropped marker
/// column.
fn working_cells(row: &RawRow) -> &[Scalar] {
    row.cells.get(1..).unwrap_or(&[])
}

fn report(progress: Option<&ProgressFn>, percent: u8) {
    if let Some(callback) = progress {
        callback(percent);
    }
}

fn apply_builtin(
    kind: BuiltinKind,
    data_rows: &[&RawRow],
    progress: Option<&ProgressFn>,
) -> OutputGrid {
    let width = kind.output_width();
    let header_rows = builtin_header_rows(kind);
    let total = data_rows.len();

    let mut rows = Vec::with_capacity(total);
    for (i, raw) in data_rows.iter().enumerate() {
        let working = working_cells(raw);
        let mut cells = vec![OutCell::Empty; width];
        for (src, dst) in kind.mapping() {
            if let Some(value) = working.get(*src) {
                cells[*dst] = OutCell::from(value);
            }
        }

        let sheet_row = i + FIRST_DATA_SHEET_ROW;
        for (col, template) in kind.formulas() {
            // Delta formulas reference the previous row; the first data
            // row has no predecessor and keeps its mapped value.
            if formula::references_previous_row(template) && i == 0 {
                continue;
            }
            cells[*col] = OutCell::Formula(formula::substitute(template, sheet_row));
        }

        let highlighted = row_is_highlighted(&cells);
        rows.push(GridRow { cells, highlighted });
        report(progress, row_progress(i, total));
    }

    let hidden = kind.hidden_columns();
    let formula_cols: Vec<usize> = kind.formulas().iter().map(|(col, _)| *col).collect();
    let columns = kind
        .widths()
        .iter()
        .enumerate()
        .map(|(i, w)| ColumnMeta {
            width: *w,
            hidden: hidden.contains(&i),
            formula: formula_cols.contains(&i),
        })
        .collect();

    OutputGrid {
        header_rows,
        rows,
        columns,
    }
}

fn builtin_header_rows(kind: BuiltinKind) -> [Vec<OutCell>; 2] {
    let width = kind.output_width();
    let mut codes = vec![OutCell::Empty; width];
    let mut friendly = vec![OutCell::Empty; width];
    for (i, key) in kind.labels().iter().enumerate() {
        let resolved = LabelKey::sanitize(key).resolve();
        codes[i] = header_cell(&resolved.code);
        friendly[i] = header_cell(&resolved.friendly);
    }
    [codes, friendly]
}

fn apply_custom(
    def: &FormatDefinition,
    data_rows: &[&RawRow],
    progress: Option<&ProgressFn>,
) -> OutputGrid {
    let width = def
        .columns
        .iter()
        .map(|c| c.letter.index() + 1)
        .max()
        .unwrap_or(1);
    let total = data_rows.len();

    let mut rows = Vec::with_capacity(total);
    for (i, raw) in data_rows.iter().enumerate() {
        let working = working_cells(raw);
        let sheet_row = i + FIRST_DATA_SHEET_ROW;
        let mut cells = vec![OutCell::Empty; width];
        for spec in &def.columns {
            cells[spec.letter.index()] = custom_cell(spec, working, sheet_row);
        }
        let highlighted = row_is_highlighted(&cells);
        rows.push(GridRow { cells, highlighted });
        report(progress, row_progress(i, total));
    }

    let mut columns = vec![ColumnMeta::visible(DEFAULT_WIDTH); width];
    for spec in &def.columns {
        let meta = &mut columns[spec.letter.index()];
        meta.width = spec.width;
        meta.formula = spec.kind == ColumnKind::Formula;
    }

    OutputGrid {
        header_rows: custom_header_rows(def, width),
        rows,
        columns,
    }
}

/// Compute one output cell from a column spec.
///
/// Out-of-range or unparseable source references yield a blank cell;
/// sparse source data is legitimate.
fn custom_cell(spec: &ColumnSpec, working: &[Scalar], sheet_row: usize) -> OutCell {
    match spec.kind {
        ColumnKind::Data => spec
            .source_index()
            .and_then(|src| working.get(src))
            .map(OutCell::from)
            .unwrap_or_default(),
        ColumnKind::Formula => OutCell::Formula(formula::substitute(&spec.value, sheet_row)),
        ColumnKind::Empty => OutCell::Empty,
    }
}

fn custom_header_rows(def: &FormatDefinition, width: usize) -> [Vec<OutCell>; 2] {
    let mut codes = vec![OutCell::Empty; width];
    let mut friendly = vec![OutCell::Empty; width];
    for spec in &def.columns {
        let resolved = spec.label.resolve();
        codes[spec.letter.index()] = header_cell(&resolved.code);
        friendly[spec.letter.index()] = header_cell(&resolved.friendly);
    }
    [codes, friendly]
}

fn header_cell(text: &str) -> OutCell {
    if text.is_empty() {
        OutCell::Empty
    } else {
        OutCell::Text(text.to_string())
    }
}

/// Map a row index onto the 50-90 progress window.
fn row_progress(index: usize, total: usize) -> u8 {
    50 + ((index + 1) * 40 / total.max(1)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::sync::Arc;

    /// A raw table in source shape: marker column first, then clock,
    /// status, and value registers.
    fn sample_table(data_rows: usize) -> RawTable {
        let mut cells = vec![vec![
            Scalar::Text("/ArrayFieldDataSet/Items".to_string()),
            Scalar::Text("header junk".to_string()),
        ]];
        for i in 0..data_rows {
            let mut row = vec![
                Scalar::Text("row".to_string()),
                Scalar::Text(format!("2024-01-05 10:{:02}:00", i)),
                Scalar::Text("00000000".to_string()),
            ];
            // Value registers V0..V10.
            for v in 0..11 {
                row.push(Scalar::Number((i * 100 + v) as f64));
            }
            cells.push(row);
        }
        RawTable::from_cells(cells)
    }

    fn den_grid(rows: usize) -> OutputGrid {
        TransformEngine::new()
            .apply(&sample_table(rows), &Layout::BuiltIn(BuiltinKind::Den), None)
            .unwrap()
    }

    #[test]
    fn empty_source_after_filtering_fails() {
        let table = RawTable::from_cells(vec![vec![Scalar::Text(
            "/ArrayFieldDataSet/Items".to_string(),
        )]]);
        let result =
            TransformEngine::new().apply(&table, &Layout::BuiltIn(BuiltinKind::Den), None);
        assert!(matches!(result, Err(TransformError::EmptySource)));
    }

    #[test]
    fn den_grid_has_expected_shape() {
        let grid = den_grid(3);
        assert_eq!(grid.width(), 13);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.header_rows[0].len(), 13);
        // Header row 1 carries register codes, row 2 friendly names.
        assert_eq!(
            grid.header_rows[0][0],
            OutCell::Text("0-0:1.0.0".to_string())
        );
        assert_eq!(grid.header_rows[1][0], OutCell::Text("Clock".to_string()));
        assert_eq!(grid.header_rows[1][3], OutCell::Text("Demand".to_string()));
        assert_eq!(grid.header_rows[0][3], OutCell::Empty);
    }

    #[test]
    fn den_first_row_demand_formula_and_deferred_deltas() {
        let grid = den_grid(3);
        // First data row: current-row formula present, delta columns
        // still blank (no predecessor row).
        assert_eq!(
            grid.rows[0].cells[3],
            OutCell::Formula("=C3*280".to_string())
        );
        assert_eq!(grid.rows[0].cells[5], OutCell::Empty);
        assert_eq!(grid.rows[0].cells[8], OutCell::Empty);
        // Second data row: deltas reference the row above.
        assert_eq!(
            grid.rows[1].cells[5],
            OutCell::Formula("=(E4-E3)*280/1000".to_string())
        );
        assert_eq!(
            grid.rows[1].cells[8],
            OutCell::Formula("=(H4-H3)*280/1000".to_string())
        );
        assert_eq!(
            grid.rows[2].cells[3],
            OutCell::Formula("=C5*280".to_string())
        );
    }

    #[test]
    fn den_maps_source_columns() {
        let grid = den_grid(2);
        // Working row: [clock, status, V0..V10]; mapping src2 -> out2.
        assert_eq!(grid.rows[0].cells[0], OutCell::Text("2024-01-05 10:00:00".to_string()));
        assert_eq!(grid.rows[0].cells[1], OutCell::Text("00000000".to_string()));
        assert_eq!(grid.rows[0].cells[2], OutCell::Number(0.0));
        // src3 (V1) -> out4, src9 (V7) -> out12.
        assert_eq!(grid.rows[0].cells[4], OutCell::Number(1.0));
        assert_eq!(grid.rows[0].cells[12], OutCell::Number(7.0));
        assert_eq!(grid.rows[1].cells[4], OutCell::Number(101.0));
    }

    #[test]
    fn globe_uses_its_own_factor_and_columns() {
        let grid = TransformEngine::new()
            .apply(
                &sample_table(2),
                &Layout::BuiltIn(BuiltinKind::Globe),
                None,
            )
            .unwrap();
        assert_eq!(grid.width(), 15);
        assert_eq!(
            grid.rows[0].cells[3],
            OutCell::Formula("=C3*1400".to_string())
        );
        assert_eq!(
            grid.rows[1].cells[10],
            OutCell::Formula("=(J4-J3)*1400/1000".to_string())
        );
        assert_eq!(grid.columns[6].hidden, true);
        assert_eq!(grid.columns[8].hidden, true);
        assert_eq!(grid.columns[9].hidden, false);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let table = sample_table(4);
        let layout = Layout::BuiltIn(BuiltinKind::Glacier);
        let engine = TransformEngine::new();
        let a = engine.apply(&table, &layout, None).unwrap();
        let b = engine.apply(&table, &layout, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn highlight_follows_seconds_component() {
        let mut table = sample_table(2);
        // Second data row: off-schedule capture at :07 seconds.
        table.rows[2].cells[1] = Scalar::Text("2024-01-05 10:15:07".to_string());
        let grid = TransformEngine::new()
            .apply(&table, &Layout::BuiltIn(BuiltinKind::Den), None)
            .unwrap();
        assert!(!grid.rows[0].highlighted);
        assert!(grid.rows[1].highlighted);
    }

    #[test]
    fn custom_layout_maps_and_substitutes() {
        let def = FormatDefinition::new(
            "Site",
            vec![
                ColumnSpec::data(0, 0, 17.0),
                ColumnSpec::formula(1, "=A{r}*2", 20.0),
                ColumnSpec::formula(2, "=A{r}-A{r-1}", 21.0),
                ColumnSpec::data(4, 99, 10.0), // out of range -> blank
            ],
        );
        let grid = TransformEngine::new()
            .apply(&sample_table(2), &Layout::Custom(def), None)
            .unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(
            grid.rows[0].cells[0],
            OutCell::Text("2024-01-05 10:00:00".to_string())
        );
        // Custom formulas are substituted on every data row; {r-1} at the
        // first data row references the row above it in the sheet.
        assert_eq!(grid.rows[0].cells[1], OutCell::Formula("=A3*2".to_string()));
        assert_eq!(
            grid.rows[0].cells[2],
            OutCell::Formula("=A3-A2".to_string())
        );
        assert_eq!(
            grid.rows[1].cells[2],
            OutCell::Formula("=A4-A3".to_string())
        );
        // Unmapped letter position stays blank; out-of-range source too.
        assert_eq!(grid.rows[0].cells[3], OutCell::Empty);
        assert_eq!(grid.rows[0].cells[4], OutCell::Empty);
        // Column metadata follows the specs; holes get the default width.
        assert_eq!(grid.columns[1].width, 20.0);
        assert!(grid.columns[1].formula);
        assert_eq!(grid.columns[3].width, DEFAULT_WIDTH);
    }

    #[test]
    fn custom_headers_resolve_labels() {
        let def = FormatDefinition::new(
            "Site",
            vec![
                ColumnSpec::data(0, 0, 14.0)
                    .with_label(LabelKey::preset("clock").unwrap()),
                ColumnSpec::data(1, 1, 14.0).with_label(LabelKey::custom("Meter ID")),
                ColumnSpec::data(2, 2, 14.0),
            ],
        );
        let grid = TransformEngine::new()
            .apply(&sample_table(1), &Layout::Custom(def), None)
            .unwrap();
        assert_eq!(
            grid.header_rows[0][0],
            OutCell::Text("0-0:1.0.0".to_string())
        );
        assert_eq!(grid.header_rows[1][0], OutCell::Text("Clock".to_string()));
        assert_eq!(grid.header_rows[0][1], OutCell::Empty);
        assert_eq!(
            grid.header_rows[1][1],
            OutCell::Text("Meter ID".to_string())
        );
        assert_eq!(grid.header_rows[1][2], OutCell::Empty);
    }

    #[test]
    fn progress_is_monotonic_and_bounded() {
        let last = Arc::new(AtomicU8::new(0));
        let last_in = Arc::clone(&last);
        let callback = move |p: u8| {
            let prev = last_in.swap(p, Ordering::SeqCst);
            assert!(p >= prev, "progress went backwards: {} -> {}", prev, p);
            assert!(p <= 90);
        };
        let progress: &ProgressFn = &callback;
        TransformEngine::new()
            .apply(
                &sample_table(25),
                &Layout::BuiltIn(BuiltinKind::Den),
                Some(progress),
            )
            .unwrap();
        assert_eq!(last.load(Ordering::SeqCst), 90);
    }
}

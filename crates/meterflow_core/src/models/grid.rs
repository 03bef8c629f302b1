//! Row table and output grid structures.

use serde::{Deserialize, Serialize};

use super::cells::{OutCell, Scalar};

/// One record of a source row table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Zero-based row index in the source document.
    pub origin: usize,
    /// Ordered cell values.
    pub cells: Vec<Scalar>,
}

impl RawRow {
    /// Create a row from cells, tagged with its source index.
    pub fn new(origin: usize, cells: Vec<Scalar>) -> Self {
        Self { origin, cells }
    }
}

/// An ordered 2-D table of scalar cells, as produced by a row reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Rows in source order.
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Create a table from rows.
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    /// Build a table from plain cell grids (rows numbered from 0).
    pub fn from_cells(cells: Vec<Vec<Scalar>>) -> Self {
        Self {
            rows: cells
                .into_iter()
                .enumerate()
                .map(|(i, c)| RawRow::new(i, c))
                .collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Presentation metadata for one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column width in character units.
    pub width: f64,
    /// Whether the column is collapsed out of view.
    pub hidden: bool,
    /// Whether the column carries formula cells (drives header styling).
    pub formula: bool,
}

impl ColumnMeta {
    /// Visible column of the given width.
    pub fn visible(width: f64) -> Self {
        Self {
            width,
            hidden: false,
            formula: false,
        }
    }
}

/// One computed data row of an output grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    /// Cells aligned to the grid's column positions.
    pub cells: Vec<OutCell>,
    /// Row-level anomaly flag: the leading timestamp has a non-zero
    /// seconds component.
    pub highlighted: bool,
}

/// The fully computed table produced from raw rows plus a layout.
///
/// Two synthetic header rows, then N data rows. The first data row sits
/// at sheet row 3 (one-based), which formula templates rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputGrid {
    /// The two header rows (technical code row, friendly label row).
    pub header_rows: [Vec<OutCell>; 2],
    /// Data rows with per-row highlight flags.
    pub rows: Vec<GridRow>,
    /// Per-column presentation metadata.
    pub columns: Vec<ColumnMeta>,
}

impl OutputGrid {
    /// Zero-based grid row where data begins (after the two header rows).
    pub const DATA_START_ROW: usize = 2;

    /// Number of output columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Replace non-finite numeric cells with 0.
    ///
    /// Spreadsheet files cannot represent infinities or NaN.
    pub fn sanitize_non_finite(&mut self) {
        for row in &mut self.rows {
            for cell in &mut row.cells {
                if let OutCell::Number(n) = cell {
                    if !n.is_finite() {
                        *cell = OutCell::Number(0.0);
                    }
                }
            }
        }
    }
}

//! Export formatting: the style taxonomy, the sheet-writer collaborator,
//! and the formatter that applies one to the other.

mod formatter;
mod style;
mod writer;

pub use formatter::{sheet_name_for, ExportFormatter, SHEET_NAME_MAX};
pub use style::{
    NumberClass, StyleSpec, ACCENT_BG, FORMULA_BG, HEADER_BG, HEADER_FONT, HIGHLIGHT_BG,
};
pub use writer::{ExportError, ExportResult, SheetWriter, StyleId, XlsxSheetWriter};

//! Transform engine: applies a column layout to a raw row table and
//! produces a fully computed output grid.
//!
//! Built-in layouts dispatch to fixed mapping tables; custom layouts are
//! driven by their column specs. Both paths share formula substitution
//! and row-highlight derivation.

mod engine;
mod formula;
mod highlight;
mod layout;

pub use engine::{TransformEngine, TransformError, TransformResult, SCHEMA_MARKER};
pub use formula::{references_previous_row, substitute, PLACEHOLDER_PREV_ROW, PLACEHOLDER_ROW};
pub use highlight::row_is_highlighted;
pub use layout::Layout;

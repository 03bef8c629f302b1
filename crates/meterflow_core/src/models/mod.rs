//! Shared data model: cell values, grids, and status enums.

mod cells;
mod enums;
mod grid;

pub use cells::{OutCell, Scalar};
pub use enums::{ColumnKind, FileStatus, JobPhase};
pub use grid::{ColumnMeta, GridRow, OutputGrid, RawRow, RawTable};

/// Callback for reporting progress as a 0-100 percentage.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

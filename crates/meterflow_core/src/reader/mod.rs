//! Source collaborator: reads meter export files into raw row tables.
//!
//! The transform engine only depends on the [`RowReader`] trait; the
//! bundled [`XmlRowReader`] handles the meter export XML schema.

mod discover;
mod xml;

use std::path::Path;

use thiserror::Error;

use crate::models::RawTable;

pub use discover::collect_source_files;
pub use xml::{XmlRowReader, SOURCE_NAMESPACE, SOURCE_ROW_ELEMENT};

/// Errors from reading a source file.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The file could not be read.
    #[error("failed to read source {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid XML for the expected schema.
    #[error("failed to parse source {path}: {message}")]
    Parse {
        path: std::path::PathBuf,
        message: String,
    },

    /// The document parsed but contained no row elements.
    #[error("no row records found in source {path}")]
    NoRows { path: std::path::PathBuf },
}

/// Result type for reader operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Reads an ordered 2-D table of scalar cells from a source file.
pub trait RowReader {
    fn read_rows(&self, path: &Path) -> ReadResult<RawTable>;
}

//! Format registry: named column layouts, built-in and user-defined.
//!
//! A format definition is an ordered set of column rules keyed by
//! spreadsheet-style letters. Three layouts (Den, Glacier, Globe) are
//! built in and reserved; everything else is user-defined and persisted
//! to a primary JSON document plus optional per-format sidecar files.

mod builtin;
mod definition;
mod labels;
mod letter;
mod registry;
mod store;

pub use builtin::{builtin_definitions, BuiltinKind};
pub use definition::{ColumnSpec, FormatDefinition, DEFAULT_WIDTH, WIDTH_MAX, WIDTH_MIN};
pub use labels::{LabelKey, LabelPreset, ResolvedLabel, CUSTOM_PREFIX, LABEL_PRESETS};
pub use letter::ColumnLetter;
pub use registry::{ColumnEdit, DeleteOutcome, FormatRegistry, RegistryError};
pub use store::{parse_external_document, safe_file_name, FormatStore, PRIMARY_FILE_NAME};

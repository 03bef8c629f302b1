//! Format definitions: named, ordered sets of output column rules.

use serde::{Deserialize, Serialize};

use super::labels::LabelKey;
use super::letter::ColumnLetter;
use crate::models::ColumnKind;

/// Smallest allowed column width.
pub const WIDTH_MIN: f64 = 1.0;
/// Largest allowed column width.
pub const WIDTH_MAX: f64 = 200.0;
/// Width used when none is specified.
pub const DEFAULT_WIDTH: f64 = 14.0;

/// One output column of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Stable column position as a letter label.
    #[serde(rename = "col")]
    pub letter: ColumnLetter,
    /// What the column holds.
    #[serde(rename = "type", default)]
    pub kind: ColumnKind,
    /// Source column index (Data), formula template (Formula), or empty.
    #[serde(default)]
    pub value: String,
    /// Column width, clamped to [1, 200].
    #[serde(default = "default_width")]
    pub width: f64,
    /// Header label for this column.
    #[serde(default, skip_serializing_if = "LabelKey::is_empty")]
    pub label: LabelKey,
}

fn default_width() -> f64 {
    DEFAULT_WIDTH
}

impl ColumnSpec {
    /// A data column copying the given source index.
    pub fn data(index: usize, source: usize, width: f64) -> Self {
        Self {
            letter: ColumnLetter::from_index(index),
            kind: ColumnKind::Data,
            value: source.to_string(),
            width,
            label: LabelKey::none(),
        }
    }

    /// A formula column with the given template.
    pub fn formula(index: usize, template: &str, width: f64) -> Self {
        Self {
            letter: ColumnLetter::from_index(index),
            kind: ColumnKind::Formula,
            value: template.to_string(),
            width,
            label: LabelKey::none(),
        }
    }

    /// A blank column.
    pub fn empty(index: usize, width: f64) -> Self {
        Self {
            letter: ColumnLetter::from_index(index),
            kind: ColumnKind::Empty,
            value: String::new(),
            width,
            label: LabelKey::none(),
        }
    }

    /// Attach a header label.
    pub fn with_label(mut self, label: LabelKey) -> Self {
        self.label = label;
        self
    }

    /// The source column index, when this is a data column with a valid
    /// index value.
    pub fn source_index(&self) -> Option<usize> {
        if self.kind != ColumnKind::Data {
            return None;
        }
        self.value.trim().parse::<usize>().ok()
    }

    /// Clamp width, normalize the letter, and clear values that the kind
    /// cannot carry.
    pub fn sanitize(&mut self) {
        self.letter = ColumnLetter::normalize(self.letter.as_str());
        self.width = self.width.clamp(WIDTH_MIN, WIDTH_MAX);
        if self.kind == ColumnKind::Empty {
            self.value.clear();
        }
        self.label = LabelKey::sanitize(self.label.as_str());
    }
}

/// A named column layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDefinition {
    /// Registry-unique name (case-insensitive).
    pub name: String,
    /// Prior names from renames, kept so files saved under an old name
    /// remain discoverable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Ordered column rules, sorted ascending by letter index.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl FormatDefinition {
    /// Create a definition with the given columns, sorted.
    pub fn new(name: impl Into<String>, mut columns: Vec<ColumnSpec>) -> Self {
        columns.sort_by_key(|c| c.letter.index());
        Self {
            name: name.into(),
            aliases: Vec::new(),
            columns,
        }
    }

    /// The default four-column template used for freshly created formats.
    pub fn default_columns(formula: &str) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::data(0, 0, 17.0),
            ColumnSpec::data(1, 1, 17.0),
            ColumnSpec::data(2, 2, DEFAULT_WIDTH),
            ColumnSpec::formula(3, formula, DEFAULT_WIDTH),
        ]
    }

    /// Case-insensitive name match against the current name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Stable sort of columns by letter index.
    pub fn sort_columns(&mut self) {
        self.columns.sort_by_key(|c| c.letter.index());
    }

    /// The lowest letter index not occupied by any column.
    pub fn next_free_letter(&self) -> ColumnLetter {
        let used: std::collections::HashSet<usize> =
            self.columns.iter().map(|c| c.letter.index()).collect();
        let mut index = 0;
        while used.contains(&index) {
            index += 1;
        }
        ColumnLetter::from_index(index)
    }

    /// Sanitize every column and restore sorted order.
    pub fn sanitize(&mut self) {
        for column in &mut self.columns {
            column.sanitize();
        }
        self.sort_columns();
    }

    /// Record a prior name into the alias list, deduplicated
    /// case-insensitively and never equal to the current name.
    pub fn record_alias(&mut self, prior: &str) {
        let prior = prior.trim();
        if prior.is_empty() || self.name.eq_ignore_ascii_case(prior) {
            return;
        }
        if !self.aliases.iter().any(|a| a.eq_ignore_ascii_case(prior)) {
            self.aliases.push(prior.to_string());
        }
    }

    /// Column letters are strictly ascending and collision-free.
    pub fn letters_are_consistent(&self) -> bool {
        self.columns
            .windows(2)
            .all(|w| w[0].letter.index() < w[1].letter.index())
    }
}

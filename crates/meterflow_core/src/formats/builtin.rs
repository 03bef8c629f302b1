//! The three built-in meter family layouts.
//!
//! Den and Glacier share one 13-column shape (different widths); Globe is
//! a wider 15-column variant with per-period delta registers. Their
//! mapping tables, formula columns, widths and hidden columns are fixed.

use super::definition::{ColumnSpec, FormatDefinition};
use super::labels::LabelKey;
use super::letter::ColumnLetter;
use crate::models::ColumnKind;

/// Identity of a built-in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Den,
    Glacier,
    Globe,
}

/// Mapping and formula tables for the shared Den/Glacier shape.
const DEN_MAPPING: &[(usize, usize)] = &[
    (0, 0),
    (1, 1),
    (2, 2),
    (3, 4),
    (4, 6),
    (5, 7),
    (6, 9),
    (7, 10),
    (8, 11),
    (9, 12),
];

const DEN_FORMULAS: &[(usize, &str)] = &[
    (3, "=C{r}*280"),
    (5, "=(E{r}-E{r-1})*280/1000"),
    (8, "=(H{r}-H{r-1})*280/1000"),
];

const GLOBE_MAPPING: &[(usize, usize)] = &[
    (0, 0),
    (1, 1),
    (2, 2),
    (3, 4),
    (4, 6),
    (5, 7),
    (6, 8),
    (7, 9),
    (8, 11),
    (9, 12),
    (10, 13),
    (11, 14),
];

const GLOBE_FORMULAS: &[(usize, &str)] = &[
    (3, "=C{r}*1400"),
    (5, "=(E{r}-E{r-1})*1400/1000"),
    (10, "=(J{r}-J{r-1})*1400/1000"),
];

const DEN_WIDTHS: &[f64] = &[
    17.73, 17.27, 16.27, 16.27, 16.27, 16.27, 16.27, 16.27, 16.27, 32.27, 36.36, 23.36, 24.76,
];

const GLACIER_WIDTHS: &[f64] = &[
    17.73, 17.27, 16.91, 16.91, 16.91, 16.91, 16.91, 16.91, 16.91, 18.73, 17.55, 23.36, 23.36,
];

const GLOBE_WIDTHS: &[f64] = &[
    17.73, 17.27, 14.91, 14.91, 14.91, 14.91, 14.91, 14.91, 14.91, 14.91, 14.91, 41.91, 33.27,
    43.36, 23.36,
];

/// Label keys per output column for the Den/Glacier shape.
const DEN_LABELS: &[&str] = &[
    "clock",
    "edis_status",
    "avg_demand",
    "demand",
    "import_total",
    "kwh",
    "export_total",
    "reactive_import",
    "kvarh",
    "reactive_export",
    "rate1_energy",
    "power_factor",
    "abs_energy",
];

const GLOBE_LABELS: &[&str] = &[
    "clock",
    "edis_status",
    "avg_demand",
    "demand",
    "import_total",
    "kwh",
    "import_delta",
    "export_total",
    "export_delta",
    "reactive_import",
    "kvarh",
    "reactive_import_delta",
    "reactive_export",
    "reactive_export_delta",
    "power_factor",
];

impl BuiltinKind {
    /// All built-in kinds, in registry order.
    pub fn all() -> &'static [BuiltinKind] {
        &[Self::Den, Self::Glacier, Self::Globe]
    }

    /// The reserved layout name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Den => "Den",
            Self::Glacier => "Glacier",
            Self::Globe => "Globe",
        }
    }

    /// Match a name against the reserved set, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "den" => Some(Self::Den),
            "glacier" => Some(Self::Glacier),
            "globe" => Some(Self::Globe),
            _ => None,
        }
    }

    /// Check whether a name is reserved for a built-in layout.
    pub fn is_builtin_name(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    /// (source index, output index) pairs of the fixed column remapping.
    pub fn mapping(&self) -> &'static [(usize, usize)] {
        match self {
            Self::Den | Self::Glacier => DEN_MAPPING,
            Self::Globe => GLOBE_MAPPING,
        }
    }

    /// (output index, template) pairs of the fixed formula columns.
    pub fn formulas(&self) -> &'static [(usize, &'static str)] {
        match self {
            Self::Den | Self::Glacier => DEN_FORMULAS,
            Self::Globe => GLOBE_FORMULAS,
        }
    }

    /// Number of output columns.
    pub fn output_width(&self) -> usize {
        match self {
            Self::Den | Self::Glacier => 13,
            Self::Globe => 15,
        }
    }

    /// Fixed column widths.
    pub fn widths(&self) -> &'static [f64] {
        match self {
            Self::Den => DEN_WIDTHS,
            Self::Glacier => GLACIER_WIDTHS,
            Self::Globe => GLOBE_WIDTHS,
        }
    }

    /// Output columns kept but collapsed out of view. These hold
    /// intermediate registers the report does not surface.
    pub fn hidden_columns(&self) -> &'static [usize] {
        match self {
            Self::Den | Self::Glacier => &[6],
            Self::Globe => &[6, 7, 8],
        }
    }

    /// Output columns rendered with the accent style (formula columns).
    pub fn accent_columns(&self) -> &'static [usize] {
        match self {
            Self::Den | Self::Glacier => &[3, 5, 8],
            Self::Globe => &[3, 5, 10],
        }
    }

    /// Label keys per output column.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Den | Self::Glacier => DEN_LABELS,
            Self::Globe => GLOBE_LABELS,
        }
    }

    /// Build the registry entry describing this layout.
    ///
    /// The entry mirrors the fixed tables so the layout is inspectable
    /// and persists like any other; the transform engine still dispatches
    /// on the built-in identity rather than these columns.
    pub fn definition(&self) -> FormatDefinition {
        let mut source_by_target = std::collections::HashMap::new();
        for (src, dst) in self.mapping() {
            source_by_target.insert(*dst, *src);
        }
        let formulas: std::collections::HashMap<usize, &str> =
            self.formulas().iter().copied().collect();
        let widths = self.widths();
        let labels = self.labels();

        let columns = (0..self.output_width())
            .map(|idx| {
                let (kind, value) = if let Some(template) = formulas.get(&idx) {
                    (ColumnKind::Formula, template.to_string())
                } else if let Some(src) = source_by_target.get(&idx) {
                    (ColumnKind::Data, src.to_string())
                } else {
                    (ColumnKind::Empty, String::new())
                };
                ColumnSpec {
                    letter: ColumnLetter::from_index(idx),
                    kind,
                    value,
                    width: widths.get(idx).copied().unwrap_or(14.0),
                    label: LabelKey::sanitize(labels.get(idx).copied().unwrap_or("")),
                }
            })
            .collect();

        FormatDefinition {
            name: self.name().to_string(),
            aliases: Vec::new(),
            columns,
        }
    }
}

impl std::fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Registry entries for all built-in layouts, in canonical order.
pub fn builtin_definitions() -> Vec<FormatDefinition> {
    BuiltinKind::all().iter().map(|k| k.definition()).collect()
}

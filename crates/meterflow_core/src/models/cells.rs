//! Cell value types for source tables and output grids.

use serde::{Deserialize, Serialize};

/// A scalar cell value read from a source row table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Missing or blank cell.
    #[default]
    Empty,
    /// Numeric cell.
    Number(f64),
    /// Text cell.
    Text(String),
}

impl Scalar {
    /// Build a scalar from raw cell text.
    ///
    /// Text that parses as a finite number becomes `Number`; blank text
    /// becomes `Empty`.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Scalar::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Scalar::Number(n),
            _ => Scalar::Text(trimmed.to_string()),
        }
    }

    /// Get the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if the cell is blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Empty)
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Empty => Ok(()),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A computed cell of an output grid.
///
/// Unlike [`Scalar`], an output cell can carry spreadsheet formula text
/// (written through the sheet writer's formula channel, not as a string).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum OutCell {
    /// Blank cell (still written, so it receives the row's style).
    #[default]
    Empty,
    /// Numeric cell.
    Number(f64),
    /// Text cell.
    Text(String),
    /// Spreadsheet formula text, including the leading `=`.
    Formula(String),
}

impl OutCell {
    /// Check whether this cell carries formula text.
    pub fn is_formula(&self) -> bool {
        matches!(self, OutCell::Formula(_))
    }

    /// Check if the cell is blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, OutCell::Empty)
    }

    /// Get the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutCell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&Scalar> for OutCell {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Empty => OutCell::Empty,
            Scalar::Number(n) => OutCell::Number(*n),
            Scalar::Text(s) => OutCell::Text(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_parses_numbers() {
        assert_eq!(Scalar::from_text("42.5"), Scalar::Number(42.5));
        assert_eq!(Scalar::from_text("  7 "), Scalar::Number(7.0));
    }

    #[test]
    fn from_text_keeps_text() {
        assert_eq!(
            Scalar::from_text("2024-01-05 10:15:00"),
            Scalar::Text("2024-01-05 10:15:00".to_string())
        );
    }

    #[test]
    fn from_text_blank_is_empty() {
        assert_eq!(Scalar::from_text("   "), Scalar::Empty);
        assert_eq!(Scalar::from_text(""), Scalar::Empty);
    }

    #[test]
    fn non_finite_text_stays_text() {
        // "inf"/"NaN" parse as f64 but cannot be represented in a sheet.
        assert_eq!(Scalar::from_text("inf"), Scalar::Text("inf".to_string()));
        assert_eq!(Scalar::from_text("NaN"), Scalar::Text("NaN".to_string()));
    }

    #[test]
    fn out_cell_from_scalar() {
        assert_eq!(OutCell::from(&Scalar::Number(1.0)), OutCell::Number(1.0));
        assert!(OutCell::from(&Scalar::Empty).is_empty());
        assert!(OutCell::Formula("=C3*280".to_string()).is_formula());
    }
}

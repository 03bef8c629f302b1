//! Spreadsheet-style column letters.
//!
//! A column letter is the base-26 encoding of a zero-based column index
//! ("A" = 0, "Z" = 25, "AA" = 26). Letters are the stable identity of a
//! column within a format definition.

use serde::{Deserialize, Serialize};

/// A column letter label ("A", "B", ..., "AA", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLetter(String);

impl ColumnLetter {
    /// Encode a zero-based column index as a letter label.
    pub fn from_index(index: usize) -> Self {
        let mut n = index;
        let mut out = String::new();
        loop {
            let rem = (n % 26) as u8;
            out.insert(0, (b'A' + rem) as char);
            n /= 26;
            if n == 0 {
                break;
            }
            n -= 1;
        }
        Self(out)
    }

    /// Decode this label to its zero-based column index.
    ///
    /// Invalid labels decode to 0, matching the tolerant handling of
    /// hand-edited format documents.
    pub fn index(&self) -> usize {
        let name = self.0.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_uppercase()) {
            return 0;
        }
        let mut idx: usize = 0;
        for ch in name.chars() {
            idx = idx * 26 + (ch as usize - 'A' as usize + 1);
        }
        idx - 1
    }

    /// Normalize free-form input into a letter label.
    ///
    /// Keeps alphabetic characters, uppercased, at most three; falls back
    /// to "A" when nothing remains.
    pub fn normalize(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .take(3)
            .collect();
        if cleaned.is_empty() {
            Self("A".to_string())
        } else {
            Self(cleaned)
        }
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ColumnLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Row highlight derivation from the leading timestamp cell.
//!
//! Meter rows are captured on period boundaries; a reading whose clock
//! carries a non-zero seconds component is an off-schedule capture and
//! gets flagged. Parsing is best-effort and never fails a row.

use chrono::{NaiveTime, Timelike};

use crate::models::OutCell;

/// Decide the highlight flag from a row's first cell.
///
/// The cell is expected to read `<date> HH:MM:SS`; anything that does not
/// parse that way simply yields `false`.
pub fn row_is_highlighted(cells: &[OutCell]) -> bool {
    let Some(OutCell::Text(text)) = cells.first() else {
        return false;
    };
    let mut parts = text.trim().split_whitespace();
    let _date = parts.next();
    let Some(time_part) = parts.next() else {
        return false;
    };
    match NaiveTime::parse_from_str(time_part, "%H:%M:%S") {
        Ok(time) => time.second() != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(value: &str) -> Vec<OutCell> {
        vec![OutCell::Text(value.to_string())]
    }

    #[test]
    fn nonzero_seconds_highlights() {
        assert!(row_is_highlighted(&text_row("2024-01-05 10:15:07")));
    }

    #[test]
    fn zero_seconds_does_not_highlight() {
        assert!(!row_is_highlighted(&text_row("2024-01-05 10:15:00")));
    }

    #[test]
    fn unparseable_cell_is_not_highlighted() {
        assert!(!row_is_highlighted(&text_row("not a timestamp")));
        assert!(!row_is_highlighted(&text_row("10:15:07")));
        assert!(!row_is_highlighted(&text_row("")));
        assert!(!row_is_highlighted(&[OutCell::Number(42.0)]));
        assert!(!row_is_highlighted(&[OutCell::Empty]));
        assert!(!row_is_highlighted(&[]));
    }

    #[test]
    fn extra_tokens_after_time_are_ignored() {
        assert!(row_is_highlighted(&text_row("2024-01-05 10:15:07 DST")));
    }
}

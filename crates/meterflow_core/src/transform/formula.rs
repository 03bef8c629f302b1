//! Formula template placeholder substitution.
//!
//! Templates carry `{r}` for the current one-based sheet row and `{r-1}`
//! for the previous row, clamped to row 1. Substitution is purely
//! textual; formula semantics are not validated.

/// Placeholder for the current row.
pub const PLACEHOLDER_ROW: &str = "{r}";
/// Placeholder for the previous row.
pub const PLACEHOLDER_PREV_ROW: &str = "{r-1}";

/// Substitute row placeholders into a formula template.
///
/// `row` is the one-based sheet row the formula lands on. `{r-1}` never
/// resolves below 1, so sparse leading data cannot produce a row-0
/// reference.
pub fn substitute(template: &str, row: usize) -> String {
    let prev = row.saturating_sub(1).max(1);
    // Replace the longer placeholder first so "{r}" does not eat the
    // prefix of "{r-1}".
    template
        .replace(PLACEHOLDER_PREV_ROW, &prev.to_string())
        .replace(PLACEHOLDER_ROW, &row.to_string())
}

/// Whether a template references the previous row.
pub fn references_previous_row(template: &str) -> bool {
    template.contains(PLACEHOLDER_PREV_ROW)
}

//! Output budget for lookup results
//!
//! Lookup payloads are cut before they reach the model so a single tool call
//! cannot blow the context window.

/// Maximum characters returned by any lookup tool
pub const TRUNCATION_BUDGET: usize = 3500;

/// Keep at most [`TRUNCATION_BUDGET`] characters of `text`.
///
/// Hard cut on a character boundary, no ellipsis.
pub fn truncate(text: &str) -> String {
    truncate_to(text, TRUNCATION_BUDGET)
}

/// Keep at most `limit` characters of `text`
pub fn truncate_to(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

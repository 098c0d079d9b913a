//! Character-based text helpers.

/// Keep the first `max` characters of `text`, appending `notice` if anything was cut.
pub fn truncate_chars(text: &str, max: usize, notice: &str) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{notice}", &text[..cut]),
        None => text.to_string(),
    }
}

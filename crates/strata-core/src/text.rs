//! Character-safe text trimming used for embeddings, prompts and excerpts.

/// First `max_chars` characters of `text` (never splits a code point).
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Excerpt of at most `max_chars` characters, cut at the last word boundary
/// and suffixed with `…` when the text was shortened.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let head = truncate_chars(text, max_chars);
    if head.len() == text.len() {
        return head.to_string();
    }
    let cut = head
        .rfind(char::is_whitespace)
        .map_or(head, |idx| head[..idx].trim_end());
    format!("{cut}…")
}

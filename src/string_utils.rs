/// True for bytes that can appear inside a SQL word (identifier or keyword).
pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Length in bytes of the UTF-8 character starting with `b`.
pub(crate) fn char_width(b: u8) -> usize {
    match b {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        // continuation byte; should not start a char, advance one byte
        _ => 1,
    }
}

/// Collapse every run of whitespace (including newlines) to a single space
/// and trim the ends. With `remove_spaces`, drop all whitespace entirely —
/// that form is the token-flattened text used for equivalence checks.
pub(crate) fn flatten_whitespace(text: &str, remove_spaces: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !remove_spaces && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

/// True if `text[..end]` ends with `word` at a word boundary.
pub(crate) fn ends_with_word(text: &str, word: &str) -> bool {
    if !text.ends_with(word) {
        return false;
    }
    let start = text.len() - word.len();
    start == 0 || !is_word_byte(text.as_bytes()[start - 1])
}

/// True if `text` continues with `word` at byte offset `i`, bounded on the
/// right by a non-word byte or end of text. The caller is responsible for
/// checking the left boundary.
pub(crate) fn starts_with_word_at(text: &str, i: usize, word: &str) -> bool {
    let end = i + word.len();
    if end > text.len() || !text.is_char_boundary(end) {
        return false;
    }
    text[i..end].eq_ignore_ascii_case(word)
        && text.as_bytes().get(end).map_or(true, |&b| !is_word_byte(b))
}

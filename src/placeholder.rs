use memchr::{memchr, memmem};

use crate::string_utils::char_width;

/// Every placeholder token starts with this prefix. The token character set
/// (ASCII letters, digits, underscores) can never be mistaken for a quote or
/// a comment start by any later pipeline stage.
pub const PLACEHOLDER_PREFIX: &str = "__SQLPASS_";

/// Prefix of placeholders standing in for `--` line comments. The newline
/// inserter needs to recognize these so it can give each one its own line.
pub const LINE_COMMENT_PREFIX: &str = "__SQLPASS_LINE_COMMENT_";

/// Ordered mapping from placeholder token to the original span text.
/// Append-only during extraction, read-only during restoration. Owned by a
/// single `format_sql` call; never shared.
#[derive(Debug, Default)]
pub struct PlaceholderTable {
    entries: Vec<(String, String)>,
}

impl PlaceholderTable {
    fn insert(&mut self, key: String, original: String) {
        self.entries.push((key, original));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Span kinds, in match priority order. The label only shows up inside the
/// placeholder token itself (useful when reading audit output).
const BLOCK_COMMENT: &str = "BLOCK_COMMENT";
const LINE_COMMENT: &str = "LINE_COMMENT";
const JINJA: &str = "JINJA";
const JINJA_COMMENT: &str = "JINJA_COMMENT";
const SINGLE_QUOTED: &str = "SINGLE_QUOTED";
const DOUBLE_QUOTED: &str = "DOUBLE_QUOTED";

/// Replace every non-structural span (comments, Jinja blocks, quoted strings
/// and identifiers) with a unique placeholder token. Single left-to-right
/// scan; unterminated spans are left in place as ordinary text.
pub fn protect(text: &str) -> (String, PlaceholderTable) {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut table = PlaceholderTable::default();
    let mut counter: usize = 1;
    let mut i = 0;

    while i < bytes.len() {
        if let Some((label, end)) = match_span(bytes, i) {
            let key = format!("{}{}_{:04}__", PLACEHOLDER_PREFIX, label, counter);
            counter += 1;
            table.insert(key.clone(), text[i..end].to_string());
            out.push_str(&key);
            i = end;
        } else {
            // All span starts are ASCII, so a failed match advances one char.
            let w = char_width(bytes[i]);
            out.push_str(&text[i..i + w]);
            i += w;
        }
    }

    (out, table)
}

/// Try to match a protected span starting at byte `i`. Returns the span label
/// and the exclusive end offset.
fn match_span(bytes: &[u8], i: usize) -> Option<(&'static str, usize)> {
    match bytes[i] {
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            // unterminated block comments are "no match"
            memmem::find(&bytes[i + 2..], b"*/").map(|p| (BLOCK_COMMENT, i + 2 + p + 2))
        }
        b'-' if bytes.get(i + 1) == Some(&b'-') => {
            // to end of line; the newline itself stays outside the span
            let end = memchr(b'\n', &bytes[i..]).map_or(bytes.len(), |p| i + p);
            Some((LINE_COMMENT, end))
        }
        b'{' => match bytes.get(i + 1) {
            Some(&b'{') => memmem::find(&bytes[i + 2..], b"}}").map(|p| (JINJA, i + 2 + p + 2)),
            Some(&b'%') => memmem::find(&bytes[i + 2..], b"%}").map(|p| (JINJA, i + 2 + p + 2)),
            Some(&b'#') => {
                memmem::find(&bytes[i + 2..], b"#}").map(|p| (JINJA_COMMENT, i + 2 + p + 2))
            }
            _ => None,
        },
        b'\'' => find_quoted_end(bytes, i, b'\'').map(|end| (SINGLE_QUOTED, end)),
        b'"' => find_quoted_end(bytes, i, b'"').map(|end| (DOUBLE_QUOTED, end)),
        _ => None,
    }
}

/// End of a quoted span starting at `start`, honoring doubled-quote escapes
/// (`''` inside a single-quoted string, `""` inside a quoted identifier).
/// None if the span never closes.
fn find_quoted_end(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut j = start + 1;
    while j < bytes.len() {
        let off = memchr(quote, &bytes[j..])?;
        let q = j + off;
        if bytes.get(q + 1) == Some(&quote) {
            j = q + 2;
        } else {
            return Some(q + 1);
        }
    }
    None
}

/// Expand every placeholder back to its original span text. Idempotent:
/// after one pass no key remains, and span contents can never look like a
/// placeholder pattern themselves being restored verbatim.
pub fn restore(text: &str, table: &PlaceholderTable) -> String {
    let mut out = text.to_string();
    for (key, original) in table.iter() {
        out = out.replace(key, original);
    }
    out
}

/// Return the first table key still present in `text`, if any. Used by the
/// driver after restoration; a hit means protect/restore got out of sync.
pub fn find_unresolved(text: &str, table: &PlaceholderTable) -> Option<String> {
    table
        .iter()
        .find(|(key, _)| memmem::find(text.as_bytes(), key.as_bytes()).is_some())
        .map(|(key, _)| key.to_string())
}

use memchr::memmem;

use crate::classify::ParenSpans;
use crate::functions::FunctionNames;
use crate::mode::Mode;
use crate::placeholder::LINE_COMMENT_PREFIX;
use crate::string_utils::{char_width, flatten_whitespace, is_word_byte, starts_with_word_at};

/// Keywords that force a line break, multi-word first so "LEFT JOIN" wins
/// over "JOIN". `true` marks a clause keyword: blank line before, own line.
/// Minor keywords get a single newline and keep their operands inline.
const BREAK_KEYWORDS: &[(&str, bool)] = &[
    ("LEFT OUTER JOIN", true),
    ("RIGHT OUTER JOIN", true),
    ("FULL OUTER JOIN", true),
    ("LEFT JOIN", true),
    ("RIGHT JOIN", true),
    ("INNER JOIN", true),
    ("OUTER JOIN", true),
    ("FULL JOIN", true),
    ("CROSS JOIN", true),
    ("GROUP BY", true),
    ("ORDER BY", true),
    ("SELECT", true),
    ("FROM", true),
    ("WHERE", true),
    ("HAVING", true),
    ("JOIN", true),
    ("UNION", false),
    ("EXCEPT", false),
    ("INTERSECT", false),
    ("LIMIT", false),
    ("ON", false),
    ("AND", false),
    ("OR", false),
    ("WITH", false),
    ("WHEN", false),
    ("THEN", false),
    ("ELSE", false),
    ("END", false),
    ("OVER", false),
];

/// Keywords that terminate a SELECT column list for comma classification.
const SELECT_LIST_ENDERS: &[&str] = &["FROM", "WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT"];

/// Rewrite whitespace so that structural keywords, structural parens, and
/// structural commas each begin a new line. Operates on protected text only.
pub fn insert_structural_newlines(text: &str, mode: &Mode, functions: &FunctionNames) -> String {
    let flat = flatten_whitespace(text, false);
    let keyed = keyword_newlines(&flat);
    let broken = paren_and_comma_newlines(&keyed, mode, functions);
    let commented = isolate_line_comments(&broken);
    normalize_newlines(&commented)
}

/// Insert a newline before every keyword occurrence not already at line
/// start, word-boundary matched and case-insensitive. Clause keywords get a
/// blank line before and a newline after; matched keywords are uppercased.
fn keyword_newlines(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 64);
    let mut i = 0;

    while i < bytes.len() {
        let at_word_start = is_word_byte(bytes[i]) && (i == 0 || !is_word_byte(bytes[i - 1]));
        if at_word_start {
            if let Some((kw, clause)) = match_keyword(text, i) {
                if !out.is_empty() && !out.ends_with('\n') {
                    trim_trailing_spaces(&mut out);
                    out.push('\n');
                    if clause {
                        out.push('\n');
                    }
                }
                out.push_str(kw);
                if clause {
                    out.push('\n');
                }
                i += kw.len();
                continue;
            }
        }
        let w = char_width(bytes[i]);
        out.push_str(&text[i..i + w]);
        i += w;
    }

    out
}

fn match_keyword(text: &str, i: usize) -> Option<(&'static str, bool)> {
    BREAK_KEYWORDS
        .iter()
        .find(|(kw, _)| starts_with_word_at(text, i, kw))
        .map(|&(kw, clause)| (kw, clause))
}

/// Paren, comma, and semicolon rewrites in a single pass over one shared
/// `ParenSpans` scan. Structural `(` gets a newline after it; structural `)`
/// gets newlines around it (keeping a trailing `AS alias` on the closing
/// line); structural commas become leading `, ` on a fresh line; commas
/// inside function calls are normalized to inline `, `.
fn paren_and_comma_newlines(text: &str, mode: &Mode, functions: &FunctionNames) -> String {
    let spans = ParenSpans::scan(text, functions);
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 64);
    let mut in_select_list = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if is_word_byte(b) && (i == 0 || !is_word_byte(bytes[i - 1])) {
            if starts_with_word_at(text, i, "SELECT") {
                in_select_list = true;
            } else if SELECT_LIST_ENDERS
                .iter()
                .any(|kw| starts_with_word_at(text, i, kw))
            {
                in_select_list = false;
            }
        }

        match b {
            b'(' if !spans.in_function(i) => {
                out.push('(');
                out.push('\n');
                i += 1;
            }
            b')' if !spans.in_function(i) => {
                trim_trailing_spaces(&mut out);
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push(')');
                if !follows_as(text, i + 1) {
                    out.push('\n');
                }
                i += 1;
            }
            b',' => {
                let structural = !spans.in_function(i)
                    && (in_select_list || spans.in_select(i) || mode.break_list_commas);
                trim_trailing_spaces(&mut out);
                if structural {
                    out.push('\n');
                }
                out.push_str(", ");
                i += 1;
                while i < bytes.len() && bytes[i] == b' ' {
                    i += 1;
                }
            }
            b';' => {
                trim_trailing_spaces(&mut out);
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push(';');
                out.push('\n');
                i += 1;
            }
            _ => {
                let w = char_width(b);
                out.push_str(&text[i..i + w]);
                i += w;
            }
        }
    }

    out
}

/// True if the text at `i` (after optional spaces) continues with the AS
/// keyword, so `) AS alias` stays on the closing-paren line.
fn follows_as(text: &str, mut i: usize) -> bool {
    let bytes = text.as_bytes();
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    starts_with_word_at(text, i, "AS")
}

/// Give every line-comment placeholder its own line. The flatten pass erased
/// the original newlines, so without this any text trailing a `--` comment on
/// the same line would be swallowed by the comment after restoration.
fn isolate_line_comments(text: &str) -> String {
    let prefix = LINE_COMMENT_PREFIX.as_bytes();
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;

    while let Some(pos) = memmem::find(rest.as_bytes(), prefix) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let end = tail[LINE_COMMENT_PREFIX.len()..]
            .find("__")
            .map(|p| LINE_COMMENT_PREFIX.len() + p + 2)
            .unwrap_or(tail.len());

        trim_trailing_spaces(&mut out);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&tail[..end]);
        if !tail[end..].starts_with('\n') {
            out.push('\n');
        }
        rest = &tail[end..];
    }

    out.push_str(rest);
    out
}

/// Collapse runs of three or more newlines to exactly two, trim every line,
/// drop leading blank lines, and suppress blank lines hugging a structural
/// paren (directly after a `(`-terminated line or before a `)` line).
fn normalize_newlines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut out = String::with_capacity(text.len());
    let mut started = false;
    let mut blank_pending = false;
    let mut prev_open_paren = false;

    for line in lines {
        if line.is_empty() {
            blank_pending = started;
            continue;
        }
        if blank_pending && !prev_open_paren && !line.starts_with(')') {
            out.push('\n');
        }
        blank_pending = false;
        out.push_str(line);
        out.push('\n');
        started = true;
        prev_open_paren = line.ends_with('(');
    }

    out
}

fn trim_trailing_spaces(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

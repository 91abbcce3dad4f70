use crate::error::{Result, SqlPassError};
use crate::functions::FunctionNames;
use crate::mode::Mode;
use crate::string_utils::flatten_whitespace;
use crate::{indent, newline, placeholder};

/// Outcome of one `format_sql` call.
#[derive(Debug)]
pub struct FormatResult {
    pub text: String,
    /// Parens or CASE/END nesting never closed; frames were force-closed at
    /// end of input. A warning, never fatal.
    pub unbalanced: bool,
}

/// The single entry point of the core: protect spans, insert structural
/// newlines, indent, restore, then verify nothing but whitespace and keyword
/// casing changed.
pub fn format_sql(source: &str, mode: &Mode) -> Result<FormatResult> {
    let functions = match &mode.function_names {
        Some(names) => FunctionNames::custom(names),
        None => FunctionNames::builtin(),
    };

    let (protected, table) = placeholder::protect(source);
    let lined = newline::insert_structural_newlines(&protected, mode, &functions);
    let (indented, unbalanced) = indent::indent(&lined, mode);
    let restored = placeholder::restore(&indented, &table);

    if let Some(token) = placeholder::find_unresolved(&restored, &table) {
        return Err(SqlPassError::UnresolvedPlaceholder {
            token,
            formatted: restored,
        });
    }

    if !mode.fast && flatten_tokens(source) != flatten_tokens(&restored) {
        return Err(SqlPassError::Equivalence {
            original: source.to_string(),
            formatted: restored,
        });
    }

    Ok(FormatResult {
        text: restored,
        unbalanced,
    })
}

/// Whitespace-insensitive, case-insensitive view of a text used for the
/// equivalence check: formatting may only move whitespace and recase
/// keywords, never add, drop, or reorder tokens.
pub(crate) fn flatten_tokens(text: &str) -> String {
    flatten_whitespace(text, true).to_ascii_lowercase()
}

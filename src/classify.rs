use crate::functions::FunctionNames;

/// Decide whether the `(` at byte offset `open_paren` opens a function-call
/// argument list. Looks backward for the longest dotted identifier
/// immediately preceding the paren and checks its final segment against the
/// function-name set. A bare grouping paren, a sub-select paren, or a CTE
/// body paren has no recognized function name in front of it.
///
/// Purely local: no bracket matching, no recursion. The caller must pass
/// protected text so string and comment contents cannot fool the lookback.
pub fn is_function_call(text: &str, open_paren: usize, functions: &FunctionNames) -> bool {
    let bytes = text.as_bytes();
    let mut j = open_paren;
    while j > 0 && bytes[j - 1].is_ascii_whitespace() {
        j -= 1;
    }
    let end = j;
    while j > 0 && is_ident_byte(bytes[j - 1]) {
        j -= 1;
    }
    if j == end {
        return false;
    }
    let ident = &text[j..end];
    let last = ident.rsplit('.').next().unwrap_or(ident);
    functions.contains(last)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'.'
}

/// Paren spans discovered in one left-to-right scan, with each open paren
/// tagged by the classifier at push time. Computed once per inserter pass and
/// reused by both the paren and the comma rewrites.
#[derive(Debug, Default)]
pub struct ParenSpans {
    function: Vec<(usize, usize)>,
    select: Vec<(usize, usize)>,
    /// Unmatched opens were left on the stack at end of text. Those parens
    /// are treated as structural: over-inserting a newline is safer than
    /// merging unrelated clauses.
    pub unbalanced: bool,
}

impl ParenSpans {
    pub fn scan(text: &str, functions: &FunctionNames) -> Self {
        let mut stack: Vec<(usize, bool)> = Vec::new();
        let mut function = Vec::new();
        let mut select = Vec::new();

        for (i, &b) in text.as_bytes().iter().enumerate() {
            match b {
                b'(' => stack.push((i, is_function_call(text, i, functions))),
                b')' => {
                    if let Some((start, is_fn)) = stack.pop() {
                        if is_fn {
                            function.push((start, i));
                        } else if contains_select(&text[start + 1..i]) {
                            select.push((start, i));
                        }
                    }
                }
                _ => {}
            }
        }

        ParenSpans {
            function,
            select,
            unbalanced: !stack.is_empty(),
        }
    }

    /// Inside (or on the boundary of) any function-call span.
    pub fn in_function(&self, idx: usize) -> bool {
        self.function.iter().any(|&(s, e)| s <= idx && idx <= e)
    }

    /// Inside any structural paren span whose body contains a SELECT.
    pub fn in_select(&self, idx: usize) -> bool {
        self.select.iter().any(|&(s, e)| s <= idx && idx <= e)
    }
}

fn contains_select(segment: &str) -> bool {
    segment.to_ascii_lowercase().contains("select")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> FunctionNames {
        FunctionNames::builtin()
    }

    #[test]
    fn test_function_call_detected() {
        let sql = "select coalesce(a, b) from t";
        let idx = sql.find('(').unwrap();
        assert!(is_function_call(sql, idx, &names()));
    }

    #[test]
    fn test_dotted_identifier_uses_last_segment() {
        let sql = "select schema.COALESCE(a, b)";
        let idx = sql.find('(').unwrap();
        assert!(is_function_call(sql, idx, &names()));
    }

    #[test]
    fn test_bare_grouping_paren() {
        let sql = "where (a or b)";
        let idx = sql.find('(').unwrap();
        assert!(!is_function_call(sql, idx, &names()));
    }

    #[test]
    fn test_unknown_identifier_is_not_function() {
        let sql = "from my_table(a)";
        let idx = sql.find('(').unwrap();
        assert!(!is_function_call(sql, idx, &names()));
    }

    #[test]
    fn test_cte_paren_is_structural() {
        let sql = "with cte as (select 1)";
        let idx = sql.find('(').unwrap();
        assert!(!is_function_call(sql, idx, &names()));
    }

    #[test]
    fn test_scan_classifies_spans() {
        let sql = "select sum(a), (select max(b) from u) from t";
        let spans = ParenSpans::scan(sql, &names());
        let sum_open = sql.find('(').unwrap();
        assert!(spans.in_function(sum_open));
        let sub_open = sql.find("(select").unwrap();
        assert!(!spans.in_function(sub_open));
        assert!(spans.in_select(sub_open + 1));
        assert!(!spans.unbalanced);
    }

    #[test]
    fn test_scan_flags_unbalanced() {
        let spans = ParenSpans::scan("select ( a from t", &names());
        assert!(spans.unbalanced);
        assert!(!spans.in_function(7));
    }

    #[test]
    fn test_nested_paren_inside_function_span() {
        let sql = "select coalesce((a + b), c) from t";
        let spans = ParenSpans::scan(sql, &names());
        let inner = sql.find("(a").unwrap();
        // the inner grouping paren sits inside the coalesce span, so it is
        // never split onto its own line
        assert!(spans.in_function(inner));
    }
}

use smallvec::SmallVec;

use crate::mode::Mode;
use crate::string_utils::{ends_with_word, starts_with_word_at};

/// One active nesting context on the indentation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// An open clause (SELECT, FROM, ...). Popped by a sibling clause.
    Clause,
    /// A structural paren group, popped by its standalone `)` line.
    Paren,
    /// An OVER(...) or WITHIN GROUP(...) paren body. ORDER BY inside one of
    /// these never opens a CLAUSE frame.
    Window,
    Case,
    When,
    ThenElse,
    /// Boolean continuation of a WHEN condition.
    AndOr,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    /// Depth this frame adds to every line nested inside it.
    contribution: usize,
}

type Stack = SmallVec<[Frame; 16]>;

/// Assign an indentation depth to every non-blank line of the inserter's
/// output via one explicit frame stack, walked top to bottom exactly once.
/// Returns the indented text and whether nesting failed to close by end of
/// input (force-closed, formatting proceeds).
pub fn indent(text: &str, mode: &Mode) -> (String, bool) {
    let clauses = mode.clause_list();
    let mut stack: Stack = SmallVec::new();
    let mut out = String::with_capacity(text.len() + text.len() / 4);

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            out.push('\n');
            continue;
        }
        let upper = line.to_ascii_uppercase();
        let depth = process_line(&mut stack, &upper, &clauses);
        for _ in 0..depth {
            out.push_str(&mode.indent);
        }
        out.push_str(line);
        out.push('\n');
    }

    // Frames other than open clauses still on the stack mean the input never
    // closed its parens or CASE blocks. Force-close and report a warning.
    let unbalanced = stack
        .iter()
        .any(|f| !matches!(f.kind, FrameKind::Clause | FrameKind::AndOr));
    stack.clear();

    (out, unbalanced)
}

/// Apply the nesting rules for one line: adjust the stack and return the
/// depth the line is emitted at. Total: every line falls into exactly one
/// category, with "content at current depth" as the default.
fn process_line(stack: &mut Stack, upper: &str, clauses: &[String]) -> usize {
    // a standalone statement terminator resets the whole nesting context
    if upper.starts_with(';') {
        stack.clear();
        return 0;
    }

    if upper.starts_with(')') {
        pop_through_paren(stack);
        return depth(stack);
    }

    let opens_case = ends_with_word(upper, "CASE");
    let opens_paren = upper.ends_with('(');
    let emit;

    if leading_clause(upper, clauses) {
        if in_window(stack) {
            // ORDER BY (or PARTITION BY, etc.) inside OVER(...) is window
            // body content, not a new top-level clause
            emit = depth(stack);
        } else {
            while top_is(stack, &[FrameKind::Clause, FrameKind::AndOr]) {
                stack.pop();
            }
            emit = depth(stack);
            stack.push(Frame {
                kind: FrameKind::Clause,
                contribution: 1,
            });
        }
    } else if starts_with_word_at(upper, 0, "WHEN") && in_case(stack) {
        pop_case_children(stack);
        emit = depth(stack);
        stack.push(Frame {
            kind: FrameKind::When,
            contribution: 1,
        });
    } else if (starts_with_word_at(upper, 0, "THEN") || starts_with_word_at(upper, 0, "ELSE"))
        && in_case(stack)
    {
        while top_is(stack, &[FrameKind::ThenElse, FrameKind::AndOr]) {
            stack.pop();
        }
        emit = depth(stack);
        stack.push(Frame {
            kind: FrameKind::ThenElse,
            contribution: 0,
        });
    } else if starts_with_word_at(upper, 0, "END") && in_case(stack) {
        pop_case_children(stack);
        emit = depth(stack);
        stack.pop();
        return finish_line(stack, emit, opens_case, opens_paren, upper);
    } else if (starts_with_word_at(upper, 0, "AND") || starts_with_word_at(upper, 0, "OR"))
        && top_is(stack, &[FrameKind::When, FrameKind::AndOr])
    {
        if !top_is(stack, &[FrameKind::AndOr]) {
            stack.push(Frame {
                kind: FrameKind::AndOr,
                contribution: 0,
            });
        }
        emit = depth(stack);
    } else {
        emit = depth(stack);
    }

    finish_line(stack, emit, opens_case, opens_paren, upper)
}

/// Push the frames a line opens at its end (`... CASE` or `... (`), after
/// its leading keyword has been handled.
fn finish_line(stack: &mut Stack, emit: usize, opens_case: bool, opens_paren: bool, upper: &str) -> usize {
    if opens_case {
        stack.push(Frame {
            kind: FrameKind::Case,
            contribution: 1,
        });
    }
    if opens_paren {
        let kind = if opens_window(upper) {
            FrameKind::Window
        } else {
            FrameKind::Paren
        };
        stack.push(Frame {
            kind,
            contribution: 1,
        });
    }
    emit
}

fn depth(stack: &Stack) -> usize {
    stack.iter().map(|f| f.contribution).sum()
}

fn top_is(stack: &Stack, kinds: &[FrameKind]) -> bool {
    stack.last().is_some_and(|f| kinds.contains(&f.kind))
}

/// Pop frames until a PAREN (or WINDOW) frame has been removed. If no such
/// frame is open, pop just the innermost frame, best effort.
fn pop_through_paren(stack: &mut Stack) {
    if stack
        .iter()
        .any(|f| matches!(f.kind, FrameKind::Paren | FrameKind::Window))
    {
        while let Some(f) = stack.pop() {
            if matches!(f.kind, FrameKind::Paren | FrameKind::Window) {
                break;
            }
        }
    } else {
        stack.pop();
    }
}

/// Pop WHEN/THEN-ELSE/AND-OR frames so the innermost CASE frame is on top.
fn pop_case_children(stack: &mut Stack) {
    while top_is(
        stack,
        &[FrameKind::When, FrameKind::ThenElse, FrameKind::AndOr],
    ) {
        stack.pop();
    }
}

/// The innermost paren-like frame is a WINDOW frame, with no plain paren in
/// between.
fn in_window(stack: &Stack) -> bool {
    for f in stack.iter().rev() {
        match f.kind {
            FrameKind::Window => return true,
            FrameKind::Paren => return false,
            _ => {}
        }
    }
    false
}

/// A CASE frame is open within the current paren scope.
fn in_case(stack: &Stack) -> bool {
    for f in stack.iter().rev() {
        match f.kind {
            FrameKind::Case => return true,
            FrameKind::Paren | FrameKind::Window => return false,
            _ => {}
        }
    }
    false
}

fn leading_clause(upper: &str, clauses: &[String]) -> bool {
    clauses.iter().any(|kw| starts_with_word_at(upper, 0, kw))
}

fn opens_window(upper: &str) -> bool {
    let head = upper[..upper.len() - 1].trim_end();
    ends_with_word(head, "OVER") || ends_with_word(head, "WITHIN GROUP")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(lines: &str) -> String {
        indent(lines, &Mode::default()).0
    }

    #[test]
    fn test_clause_indents_contents() {
        let out = run("SELECT\na\n, b\n\nFROM\nt\n");
        assert_eq!(out, "SELECT\n    a\n    , b\n\nFROM\n    t\n");
    }

    #[test]
    fn test_sibling_clause_pops_previous() {
        let out = run("SELECT\na\n\nFROM\nt\n\nWHERE\nx = 1\n");
        assert!(out.contains("\nFROM\n"));
        assert!(out.contains("\nWHERE\n"));
        assert!(out.contains("    x = 1"));
    }

    #[test]
    fn test_paren_frame_nests_and_closes_shallower() {
        // "FROM (" opens both a clause frame and a paren frame; the closing
        // line pops through to the paren and lands one level shallower than
        // its contents
        let out = run("FROM (\nSELECT\n1\n) AS x\n");
        assert_eq!(out, "FROM (\n        SELECT\n            1\n    ) AS x\n");
    }

    #[test]
    fn test_bare_paren_group() {
        let out = run("(\nSELECT\n1\n)\n");
        assert_eq!(out, "(\n    SELECT\n        1\n)\n");
    }

    #[test]
    fn test_case_when_then_end_depths() {
        let out = run("SELECT\nCASE\nWHEN x\nTHEN 1\nELSE 2\nEND\n");
        let expected = "SELECT\n    CASE\n        WHEN x\n            THEN 1\n            ELSE 2\n        END\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_nested_case() {
        let out = run("SELECT\nCASE\nWHEN x\nTHEN CASE\nWHEN y\nTHEN 2\nEND\nEND\n");
        let lines: Vec<&str> = out.lines().collect();
        // inner WHEN is deeper than outer WHEN
        let outer_when = lines.iter().find(|l| l.trim_start() == "WHEN x").unwrap();
        let inner_when = lines.iter().find(|l| l.trim_start() == "WHEN y").unwrap();
        let outer_depth = outer_when.len() - outer_when.trim_start().len();
        let inner_depth = inner_when.len() - inner_when.trim_start().len();
        assert!(inner_depth > outer_depth);
        // both ENDs present, outer END back at outer CASE + 1
        assert_eq!(lines.iter().filter(|l| l.trim() == "END").count(), 2);
    }

    #[test]
    fn test_when_condition_boolean_continuation() {
        let out = run("SELECT\nCASE\nWHEN x\nAND y\nTHEN 1\nEND\n");
        let lines: Vec<&str> = out.lines().collect();
        let when = lines.iter().find(|l| l.trim_start() == "WHEN x").unwrap();
        let and = lines.iter().find(|l| l.trim_start() == "AND y").unwrap();
        let then = lines.iter().find(|l| l.trim_start() == "THEN 1").unwrap();
        let when_depth = when.len() - when.trim_start().len();
        let and_depth = and.len() - and.trim_start().len();
        let then_depth = then.len() - then.trim_start().len();
        assert!(and_depth > when_depth);
        assert_eq!(then_depth, and_depth);
    }

    #[test]
    fn test_order_by_inside_window_is_not_a_clause() {
        let out = run("SELECT\nOVER (\nPARTITION BY x\nORDER BY\ny\n) AS rn\n");
        let lines: Vec<&str> = out.lines().collect();
        let order_by = lines.iter().find(|l| l.trim_start() == "ORDER BY").unwrap();
        let y = lines.iter().find(|l| l.trim_start() == "y").unwrap();
        let ob_depth = order_by.len() - order_by.trim_start().len();
        let y_depth = y.len() - y.trim_start().len();
        // no CLAUSE frame pushed: y stays at the window body depth
        assert_eq!(ob_depth, y_depth);
        assert!(out.contains(") AS rn"));
    }

    #[test]
    fn test_semicolon_resets_stack() {
        let out = run("SELECT\n1\n;\nSELECT\n2\n");
        assert_eq!(out, "SELECT\n    1\n;\nSELECT\n    2\n");
    }

    #[test]
    fn test_unbalanced_paren_force_closed() {
        let (out, unbalanced) = indent("SELECT\n(\na\n", &Mode::default());
        assert!(unbalanced);
        assert!(out.contains("a"));
    }

    #[test]
    fn test_open_clauses_at_eof_are_not_unbalanced() {
        let (_, unbalanced) = indent("SELECT\na\n\nFROM\nt\n", &Mode::default());
        assert!(!unbalanced);
    }

    #[test]
    fn test_closing_paren_without_open_pops_one_frame() {
        let (out, _) = indent("SELECT\na\n)\nb\n", &Mode::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], ")");
        // the stray close popped the SELECT clause frame
        assert_eq!(lines[3], "b");
    }

    #[test]
    fn test_custom_indent_unit() {
        let mode = Mode {
            indent: "\t".to_string(),
            ..Mode::default()
        };
        let (out, _) = indent("SELECT\na\n", &mode);
        assert_eq!(out, "SELECT\n\ta\n");
    }

    #[test]
    fn test_blank_lines_emitted_empty() {
        let out = run("SELECT\na\n\nFROM\nt\n");
        assert!(out.contains("\n\nFROM"));
    }
}

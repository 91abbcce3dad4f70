use std::path::PathBuf;

use serde::Deserialize;

/// Clause keywords that open a new CLAUSE frame in the indentation engine.
/// Ordered for documentation only; matching sorts longest-first.
pub const DEFAULT_CLAUSE_KEYWORDS: &[&str] = &[
    "SELECT",
    "FROM",
    "WHERE",
    "GROUP BY",
    "ORDER BY",
    "HAVING",
    "LEFT OUTER JOIN",
    "RIGHT OUTER JOIN",
    "FULL OUTER JOIN",
    "LEFT JOIN",
    "RIGHT JOIN",
    "INNER JOIN",
    "OUTER JOIN",
    "FULL JOIN",
    "CROSS JOIN",
    "JOIN",
    "UNION",
    "EXCEPT",
    "INTERSECT",
    "LIMIT",
];

/// Mode holds all formatting configuration for sqlpass.
#[derive(Debug, Clone, Deserialize)]
pub struct Mode {
    /// Text emitted for one indentation level.
    #[serde(default = "default_indent")]
    pub indent: String,

    /// Override the built-in function-name set (replaces it wholesale).
    #[serde(default)]
    pub function_names: Option<Vec<String>>,

    /// Override the clause keywords that open an indentation frame.
    #[serde(default)]
    pub clause_keywords: Option<Vec<String>>,

    /// Break commas inside any structural paren (IN lists, CTE column
    /// lists), not just recognized column-list contexts.
    #[serde(default)]
    pub break_list_commas: bool,

    /// Report files that would change without writing them.
    #[serde(default)]
    pub check: bool,

    /// Print a diff for files that would change.
    #[serde(default)]
    pub diff: bool,

    /// Skip the equivalence safety check for faster operation.
    #[serde(default)]
    pub fast: bool,

    /// Glob patterns to exclude during directory discovery.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub quiet: bool,

    /// Number of threads for parallel processing (0 = all cores).
    #[serde(default)]
    pub threads: usize,

    #[serde(default)]
    pub single_process: bool,

    /// Root directory for pre/post/diff audit files. None disables auditing.
    #[serde(default)]
    pub audit_dir: Option<PathBuf>,

    /// Mirror the source directory layout under the audit root.
    #[serde(default = "default_true")]
    pub mirror_audit: bool,
}

fn default_indent() -> String {
    "    ".to_string()
}

fn default_true() -> bool {
    true
}

impl Mode {
    /// The effective clause keyword list, longest keyword first so that
    /// multi-word clauses win over their single-word prefixes.
    pub fn clause_list(&self) -> Vec<String> {
        let mut list: Vec<String> = match &self.clause_keywords {
            Some(custom) => custom.iter().map(|k| k.to_ascii_uppercase()).collect(),
            None => DEFAULT_CLAUSE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        };
        list.sort_by(|a, b| b.len().cmp(&a.len()));
        list
    }

    /// SQL file extensions to process.
    pub fn sql_extensions(&self) -> &[&str] {
        &["sql", "sql.jinja", "sql.jinja2", "ddl", "dml"]
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            function_names: None,
            clause_keywords: None,
            break_list_commas: false,
            check: false,
            diff: false,
            fast: false,
            exclude: Vec::new(),
            verbose: false,
            quiet: false,
            threads: 0,
            single_process: false,
            audit_dir: None,
            mirror_audit: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode() {
        let mode = Mode::default();
        assert_eq!(mode.indent, "    ");
        assert!(mode.function_names.is_none());
        assert!(!mode.check);
        assert!(!mode.break_list_commas);
        assert!(mode.mirror_audit);
    }

    #[test]
    fn test_clause_list_sorted_longest_first() {
        let mode = Mode::default();
        let list = mode.clause_list();
        let group_by = list.iter().position(|k| k == "GROUP BY").unwrap();
        let join = list.iter().position(|k| k == "JOIN").unwrap();
        assert!(group_by < join);
    }

    #[test]
    fn test_custom_clause_list_uppercased() {
        let mode = Mode {
            clause_keywords: Some(vec!["select".to_string(), "qualify".to_string()]),
            ..Mode::default()
        };
        let list = mode.clause_list();
        assert!(list.contains(&"QUALIFY".to_string()));
        assert!(list.contains(&"SELECT".to_string()));
        assert_eq!(list.len(), 2);
    }
}

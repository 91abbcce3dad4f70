use std::collections::HashSet;

use phf::phf_set;

/// Built-in catalog of function names whose parentheses are treated as
/// function-call parentheses (contents never reflowed). Snowflake-flavored;
/// override per dialect with `Mode::function_names`.
pub static SNOWFLAKE_FUNCTIONS: phf::Set<&'static str> = phf_set! {
    "ABS", "ACOS", "ARRAY_AGG", "ASCII", "ASIN", "ATAN", "ATAN2", "AVG",
    "CASE", "CAST", "CEIL", "CEILING", "CHARINDEX", "CHR", "COALESCE",
    "CONCAT", "CONCAT_WS", "COS", "COSH", "COUNT", "DATEADD", "DATEDIFF",
    "DECODE", "DENSE_RANK", "EXP", "FIRST_VALUE", "FLOOR", "GREATEST",
    "IFF", "INITCAP", "LAG", "LAST_VALUE", "LEAD", "LEAST", "LEFT",
    "LISTAGG", "LN", "LOG", "LOG10", "LOWER", "LPAD", "LTRIM", "MAX",
    "MIN", "MOD", "NTILE", "NULLIF", "NVL", "POSITION", "POWER", "RANK",
    "REGEXP_REPLACE", "REGEXP_SUBSTR", "REPLACE", "REVERSE", "RIGHT",
    "ROUND", "ROW_NUMBER", "RPAD", "RTRIM", "SIGN", "SIN", "SINH",
    "SPLIT_PART", "SQRT", "SUBSTR", "SUBSTRING", "SUM", "TAN", "TANH",
    "TO_ARRAY", "TO_BOOLEAN", "TO_CHAR", "TO_DATE", "TO_DECIMAL",
    "TO_DOUBLE", "TO_NUMBER", "TO_OBJECT", "TO_TIMESTAMP", "TO_VARCHAR",
    "TO_VARIANT", "TRIM", "TRUNC", "TRY_CAST", "TRY_TO_DATE",
    "TRY_TO_TIMESTAMP", "UPPER",
};

/// The set of identifiers recognized as function names, shared read-only
/// across all classification calls. Defaults to the built-in catalog; a
/// custom set replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct FunctionNames {
    custom: Option<HashSet<String>>,
}

impl FunctionNames {
    pub fn builtin() -> Self {
        Self { custom: None }
    }

    pub fn custom<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            custom: Some(
                names
                    .into_iter()
                    .map(|n| n.as_ref().to_ascii_uppercase())
                    .collect(),
            ),
        }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        let upper = name.to_ascii_uppercase();
        match &self.custom {
            Some(set) => set.contains(&upper),
            None => SNOWFLAKE_FUNCTIONS.contains(upper.as_str()),
        }
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::SqlPassError;
use crate::mode::Mode;

/// Load sqlpass configuration from a sqlpass.toml or pyproject.toml file.
/// Searches parent directories of the input paths if no config path is given.
pub fn load_config(files: &[PathBuf], config_path: Option<&Path>) -> Result<Mode, SqlPassError> {
    let mut mode = Mode::default();

    let config_file = match config_path {
        Some(path) => {
            if path.exists() {
                Some(path.to_path_buf())
            } else {
                return Err(SqlPassError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }
        None => find_config_file(files),
    };

    if let Some(path) = config_file {
        let raw = load_config_from_path(&path)?;
        apply_config(&mut mode, &raw)?;
    }

    Ok(mode)
}

/// Search for a config file in the common parent directories of the given
/// files, most specific directory first.
fn find_config_file(files: &[PathBuf]) -> Option<PathBuf> {
    for parent in get_common_parents(files) {
        let config = parent.join("sqlpass.toml");
        if config.exists() {
            return Some(config);
        }
        let config = parent.join("pyproject.toml");
        if config.exists() {
            return Some(config);
        }
    }
    None
}

fn get_common_parents(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut parents = Vec::new();

    for file in files {
        let parent = if file.is_dir() {
            file.clone()
        } else {
            file.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        };

        let mut current = Some(parent.as_path());
        while let Some(dir) = current {
            let dir_buf = dir.to_path_buf();
            if !parents.contains(&dir_buf) {
                parents.push(dir_buf);
            }
            current = dir.parent();
        }
    }

    parents
}

/// Load and parse a TOML config file. sqlpass.toml uses top-level keys;
/// pyproject.toml uses a [tool.sqlpass] section.
fn load_config_from_path(path: &Path) -> Result<HashMap<String, toml::Value>, SqlPassError> {
    let content = std::fs::read_to_string(path)?;
    let parsed: toml::Value = content
        .parse()
        .map_err(|e| SqlPassError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    let section = parsed
        .get("tool")
        .and_then(|t| t.get("sqlpass"))
        .or_else(|| {
            if path
                .file_name()
                .map(|n| n == "sqlpass.toml")
                .unwrap_or(false)
            {
                Some(&parsed)
            } else {
                None
            }
        });

    match section {
        Some(toml::Value::Table(table)) => {
            let mut map = HashMap::new();
            for (k, v) in table {
                map.insert(k.to_lowercase(), v.clone());
            }
            Ok(map)
        }
        _ => Ok(HashMap::new()),
    }
}

/// Apply configuration values to a Mode.
fn apply_config(mode: &mut Mode, config: &HashMap<String, toml::Value>) -> Result<(), SqlPassError> {
    if let Some(toml::Value::String(s)) = config.get("indent") {
        mode.indent = s.clone();
    }

    if let Some(toml::Value::Array(arr)) = config.get("function_names") {
        mode.function_names = Some(string_array(arr));
    }

    if let Some(toml::Value::Array(arr)) = config.get("clause_keywords") {
        mode.clause_keywords = Some(string_array(arr));
    }

    if let Some(toml::Value::Boolean(b)) = config.get("break_list_commas") {
        mode.break_list_commas = *b;
    }

    if let Some(toml::Value::Array(arr)) = config.get("exclude") {
        mode.exclude = string_array(arr);
    }

    if let Some(toml::Value::String(s)) = config.get("audit_dir") {
        mode.audit_dir = Some(PathBuf::from(s));
    }

    if let Some(toml::Value::Boolean(b)) = config.get("mirror_audit") {
        mode.mirror_audit = *b;
    }

    if let Some(toml::Value::Boolean(b)) = config.get("fast") {
        mode.fast = *b;
    }

    // Reject unknown keys
    let known_keys = [
        "indent",
        "function_names",
        "clause_keywords",
        "break_list_commas",
        "exclude",
        "audit_dir",
        "mirror_audit",
        "fast",
    ];
    for key in config.keys() {
        if !known_keys.contains(&key.as_str()) {
            return Err(SqlPassError::Config(format!(
                "Unknown config option: {}",
                key
            )));
        }
    }

    Ok(())
}

fn string_array(arr: &[toml::Value]) -> Vec<String> {
    arr.iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_config() {
        let mut mode = Mode::default();
        let mut config = HashMap::new();
        config.insert("indent".to_string(), toml::Value::String("  ".to_string()));
        config.insert("break_list_commas".to_string(), toml::Value::Boolean(true));
        config.insert(
            "clause_keywords".to_string(),
            toml::Value::Array(vec![toml::Value::String("SELECT".to_string())]),
        );

        apply_config(&mut mode, &config).unwrap();
        assert_eq!(mode.indent, "  ");
        assert!(mode.break_list_commas);
        assert_eq!(mode.clause_keywords, Some(vec!["SELECT".to_string()]));
    }

    #[test]
    fn test_unknown_config_key_error() {
        let mut mode = Mode::default();
        let mut config = HashMap::new();
        config.insert("line_length".to_string(), toml::Value::Integer(88));

        assert!(apply_config(&mut mode, &config).is_err());
    }

    #[test]
    fn test_load_sqlpass_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("sqlpass.toml");
        std::fs::write(&config, "indent = \"\\t\"\nbreak_list_commas = true\n").unwrap();

        let mode = load_config(&[], Some(&config)).unwrap();
        assert_eq!(mode.indent, "\t");
        assert!(mode.break_list_commas);
    }

    #[test]
    fn test_load_pyproject_section() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("pyproject.toml");
        std::fs::write(&config, "[tool.sqlpass]\nfast = true\n").unwrap();

        let mode = load_config(&[], Some(&config)).unwrap();
        assert!(mode.fast);
    }

    #[test]
    fn test_missing_explicit_config_errors() {
        let result = load_config(&[], Some(Path::new("/nonexistent/sqlpass.toml")));
        assert!(result.is_err());
    }
}

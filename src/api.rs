use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::audit;
use crate::error::SqlPassError;
use crate::mode::Mode;
use crate::pipeline::{self, flatten_tokens};
use crate::report::{FileResult, FileStatus, Report};

/// Version written into the pass-1 marker comment. Bump when the formatting
/// rules change so previously formatted files are picked up again.
pub const PASS_VERSION: u32 = 1;

const MARKER_KEY: &str = "sqlpass-pass1-version:";

/// Format a SQL string according to the given mode.
/// This is the core API function; it never reads or writes version markers.
pub fn format_string(source: &str, mode: &Mode) -> Result<String, SqlPassError> {
    pipeline::format_sql(source, mode).map(|r| r.text)
}

fn marker_line() -> String {
    format!("-- {} {}", MARKER_KEY, PASS_VERSION)
}

fn parse_marker(line: &str) -> Option<u32> {
    line.trim()
        .strip_prefix("--")?
        .trim_start()
        .strip_prefix(MARKER_KEY)?
        .trim()
        .parse()
        .ok()
}

/// True if the file already carries a marker at or above the current pass
/// version, meaning it can be skipped.
pub fn has_current_marker(source: &str) -> bool {
    source
        .lines()
        .filter_map(parse_marker)
        .any(|v| v >= PASS_VERSION)
}

/// Remove the first marker line, if any. The core formatter must never see
/// the marker.
pub fn strip_marker(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut stripped = false;
    for line in source.lines() {
        if !stripped && parse_marker(line).is_some() {
            stripped = true;
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_start_matches('\n').to_string()
}

/// Prepend a fresh marker to formatted output.
pub fn with_marker(text: &str) -> String {
    format!("{}\n{}", marker_line(), text.trim_start_matches('\n'))
}

/// Run the formatter on a collection of files.
pub fn run(files: &[PathBuf], mode: &Mode) -> Report {
    let matching_paths = get_matching_paths(files, mode);
    let mut report = Report::new();

    if mode.single_process || matching_paths.len() <= 1 {
        for path in &matching_paths {
            report.add(format_file(path, mode));
        }
    } else {
        use rayon::prelude::*;

        let num_threads = if mode.threads > 0 {
            mode.threads
        } else {
            0 // rayon default: all available cores
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .expect("failed to build rayon thread pool");

        let results: Vec<FileResult> = pool.install(|| {
            matching_paths
                .par_iter()
                .map(|path| format_file(path, mode))
                .collect()
        });
        for result in results {
            report.add(result);
        }
    }

    if let Some(ref root) = mode.audit_dir {
        if let Err(e) = audit::write_summary(root, &report) {
            eprintln!("warning: failed to write audit summary: {}", e);
        }
    }

    report
}

/// Format a single file, honoring the version marker and audit settings.
fn format_file(path: &Path, mode: &Mode) -> FileResult {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return FileResult::error(path.to_path_buf(), format!("Read error: {}", e)),
    };

    if has_current_marker(&raw) {
        return FileResult::new(path.to_path_buf(), FileStatus::Skipped);
    }

    let source = strip_marker(&raw);
    let formatted = match pipeline::format_sql(&source, mode) {
        Ok(result) => result,
        Err(SqlPassError::Equivalence {
            original,
            formatted,
        }) => {
            let pre_flat = flatten_tokens(&original);
            let post_flat = flatten_tokens(&formatted);
            write_file_audit(
                path,
                mode,
                &source,
                Some(&formatted),
                Some((pre_flat.as_str(), post_flat.as_str())),
            );
            return FileResult::error(
                path.to_path_buf(),
                "formatting changed the token stream; output not written".to_string(),
            );
        }
        Err(e) => return FileResult::error(path.to_path_buf(), format!("{}", e)),
    };

    let output = with_marker(&formatted.text);
    // in check/diff mode no write happens, so a post snapshot would suggest
    // a change that was never applied; record the pre snapshot only
    let audit_post = if mode.check || mode.diff {
        None
    } else {
        Some(output.as_str())
    };
    write_file_audit(path, mode, &source, audit_post, None);

    let mut result = if raw == output {
        FileResult::new(path.to_path_buf(), FileStatus::Unchanged)
    } else if mode.check || mode.diff {
        if mode.diff {
            print_diff(path, &raw, &output);
        }
        FileResult::new(path.to_path_buf(), FileStatus::Changed)
    } else {
        match std::fs::write(path, &output) {
            Ok(_) => FileResult::new(path.to_path_buf(), FileStatus::Changed),
            Err(e) => {
                return FileResult::error(path.to_path_buf(), format!("Write error: {}", e))
            }
        }
    };

    if formatted.unbalanced {
        result.warning = Some("unbalanced parens or CASE/END; frames force-closed".to_string());
    }
    result
}

fn write_file_audit(
    path: &Path,
    mode: &Mode,
    pre: &str,
    post: Option<&str>,
    drift: Option<(&str, &str)>,
) {
    if let Some(ref root) = mode.audit_dir {
        if let Err(e) = audit::write_audit(root, path, mode.mirror_audit, pre, post, drift) {
            eprintln!("warning: failed to write audit for {}: {}", path.display(), e);
        }
    }
}

/// Get all SQL file paths that match the given inputs.
pub fn get_matching_paths(paths: &[PathBuf], mode: &Mode) -> Vec<PathBuf> {
    let extensions = mode.sql_extensions();
    let mut result = HashSet::new();

    for path in paths {
        if path.is_file() {
            if is_sql_file(path, extensions) {
                result.insert(path.clone());
            }
        } else if path.is_dir() {
            collect_sql_files(path, extensions, &mode.exclude, &mut result);
        }
    }

    let mut sorted: Vec<PathBuf> = result.into_iter().collect();
    sorted.sort();
    sorted
}

/// Check if a file has a SQL extension.
fn is_sql_file(path: &Path, extensions: &[&str]) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    extensions.iter().any(|ext| name.ends_with(ext))
}

/// Recursively collect SQL files from a directory.
fn collect_sql_files(
    dir: &Path,
    extensions: &[&str],
    exclude: &[String],
    result: &mut HashSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Skip hidden directories and excluded patterns
        if name.starts_with('.') {
            continue;
        }
        if exclude.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&name))
                .unwrap_or(false)
        }) {
            continue;
        }

        if path.is_dir() {
            collect_sql_files(&path, extensions, exclude, result);
        } else if is_sql_file(&path, extensions) {
            result.insert(path);
        }
    }
}

/// Print a diff between original and formatted content.
fn print_diff(path: &Path, original: &str, formatted: &str) {
    use similar::{ChangeTag, TextDiff};

    eprintln!("--- {}", path.display());
    eprintln!("+++ {}", path.display());

    let diff = TextDiff::from_lines(original, formatted);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        eprint!("{}{}", sign, change);
    }
}

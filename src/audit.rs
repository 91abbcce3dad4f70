use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::report::{FileStatus, Report};

/// Per-file audit trail: pre-format snapshot, post-format snapshot, and (on
/// equivalence drift) both flattened token streams for diffing. File numbers
/// mirror the original pass-1 tooling: `00` is always the pre-format copy.
pub fn write_audit(
    root: &Path,
    source_path: &Path,
    mirror: bool,
    pre: &str,
    post: Option<&str>,
    drift: Option<(&str, &str)>,
) -> io::Result<PathBuf> {
    let base = audit_base(root, source_path, mirror);
    fs::create_dir_all(&base)?;
    let stem = file_stem(source_path);

    fs::write(base.join(format!("{}_00_pre_format.sql", stem)), pre)?;

    let mut stage = 1;
    if let Some((pre_flat, post_flat)) = drift {
        fs::write(
            base.join(format!("{}_{:02}_diff.txt", stem, stage)),
            format!("{}\n{}\n", pre_flat, post_flat),
        )?;
        stage += 1;
    }
    if let Some(post) = post {
        fs::write(base.join(format!("{}_{:02}_post_format.sql", stem, stage)), post)?;
    }

    Ok(base)
}

/// Write the run summary under the audit root.
pub fn write_summary(root: &Path, report: &Report) -> io::Result<()> {
    fs::create_dir_all(root)?;
    let mut out = String::from("=== Pass 1 Summary ===\n");
    out.push_str(&format!("Formatted files: {}\n", report.changed()));
    for r in status_paths(report, FileStatus::Changed) {
        out.push_str(&format!("  - {}\n", r));
    }
    out.push_str(&format!("Skipped files: {}\n", report.skipped()));
    for r in status_paths(report, FileStatus::Skipped) {
        out.push_str(&format!("  - {}\n", r));
    }
    out.push_str(&format!("Files with errors: {}\n", report.errors()));
    for r in status_paths(report, FileStatus::Error) {
        out.push_str(&format!("  - {}\n", r));
    }
    fs::write(root.join("pass1_summary.txt"), out)
}

fn status_paths(report: &Report, status: FileStatus) -> Vec<String> {
    report
        .results
        .iter()
        .filter(|r| r.status == status)
        .map(|r| r.path.display().to_string())
        .collect()
}

/// Directory holding one file's audit artifacts. With mirroring, the source
/// file's directory layout is reproduced under the audit root (absolute path
/// components are dropped).
fn audit_base(root: &Path, source_path: &Path, mirror: bool) -> PathBuf {
    let stem = file_stem(source_path);
    if mirror {
        if let Some(parent) = source_path.parent() {
            let rel: PathBuf = parent
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();
            return root.join(rel).join(stem);
        }
    }
    root.join(stem)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FileResult;

    #[test]
    fn test_write_audit_pre_and_post() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_audit(
            dir.path(),
            Path::new("models/staging/stg_orders.sql"),
            true,
            "select 1",
            Some("SELECT\n    1\n"),
            None,
        )
        .unwrap();

        assert!(base.ends_with("models/staging/stg_orders"));
        assert!(base.join("stg_orders_00_pre_format.sql").exists());
        assert!(base.join("stg_orders_01_post_format.sql").exists());
    }

    #[test]
    fn test_write_audit_with_drift() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_audit(
            dir.path(),
            Path::new("a.sql"),
            false,
            "select 1",
            Some("select 2"),
            Some(("select1", "select2")),
        )
        .unwrap();

        assert!(base.join("a_01_diff.txt").exists());
        assert!(base.join("a_02_post_format.sql").exists());
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = Report::new();
        report.add(FileResult::new(
            PathBuf::from("x.sql"),
            FileStatus::Changed,
        ));
        write_summary(dir.path(), &report).unwrap();
        let text = fs::read_to_string(dir.path().join("pass1_summary.txt")).unwrap();
        assert!(text.contains("Formatted files: 1"));
        assert!(text.contains("x.sql"));
    }
}

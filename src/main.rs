use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;

use sqlpass::mode::Mode;

/// sqlpass - pass-1 SQL reflow formatter.
/// One structural keyword per line, leading commas, stack-based indentation.
#[derive(Parser, Debug)]
#[command(name = "sqlpass", version, about)]
struct Cli {
    /// Files or directories to format. Use "-" to read from stdin.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Text for one indentation level (default: four spaces).
    #[arg(short = 'i', long)]
    indent: Option<String>,

    /// Check formatting without writing changes.
    #[arg(long)]
    check: bool,

    /// Show formatting diff.
    #[arg(long)]
    diff: bool,

    /// Skip the equivalence safety check (faster).
    #[arg(long)]
    fast: bool,

    /// Break commas inside IN lists and other parenthesized lists.
    #[arg(long)]
    break_list_commas: bool,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Root directory for pre/post/diff audit files.
    #[arg(long)]
    audit_dir: Option<PathBuf>,

    /// Disable folder hierarchy mirroring under the audit root.
    #[arg(long)]
    no_mirror_audit: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,

    /// Number of threads for parallel processing (0 = all cores).
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Disable multi-threaded processing.
    #[arg(long)]
    single_process: bool,

    /// Path to config file (sqlpass.toml or pyproject.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let is_stdin = cli.files.len() == 1 && cli.files[0].to_string_lossy() == "-";

    let base_mode = match sqlpass::load_config(&cli.files, cli.config.as_deref()) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let mode = Mode {
        indent: cli.indent.unwrap_or(base_mode.indent),
        check: cli.check,
        diff: cli.diff,
        fast: cli.fast || base_mode.fast,
        break_list_commas: cli.break_list_commas || base_mode.break_list_commas,
        exclude: if cli.exclude.is_empty() {
            base_mode.exclude
        } else {
            cli.exclude
        },
        audit_dir: cli.audit_dir.or(base_mode.audit_dir),
        mirror_audit: !cli.no_mirror_audit && base_mode.mirror_audit,
        verbose: cli.verbose,
        quiet: cli.quiet,
        threads: cli.threads,
        single_process: cli.single_process,
        function_names: base_mode.function_names,
        clause_keywords: base_mode.clause_keywords,
    };

    if is_stdin {
        let mut source = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut source) {
            eprintln!("Error reading stdin: {}", e);
            std::process::exit(2);
        }

        match sqlpass::format_string(&source, &mode) {
            Ok(formatted) => {
                print!("{}", formatted);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            }
        }
    } else {
        let report = sqlpass::run(&cli.files, &mode);

        if !mode.quiet {
            print_verbose_results(&report, &mode);
            eprintln!("{}", report.summary());
        }

        report.print_errors();

        if report.has_errors() {
            std::process::exit(2);
        } else if mode.check && report.has_changes() {
            std::process::exit(1);
        }
    }
}

fn print_verbose_results(report: &sqlpass::report::Report, mode: &Mode) {
    if !mode.verbose {
        return;
    }
    for result in &report.results {
        match result.status {
            sqlpass::report::FileStatus::Changed => {
                eprintln!("reformatted {}", result.path.display());
            }
            sqlpass::report::FileStatus::Skipped => {
                eprintln!("skipped {} (already formatted)", result.path.display());
            }
            sqlpass::report::FileStatus::Error => {
                eprintln!(
                    "error: {}: {}",
                    result.path.display(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            sqlpass::report::FileStatus::Unchanged => {}
        }
    }
}

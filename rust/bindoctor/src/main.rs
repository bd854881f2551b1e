//! yaml-doctor command-line tool.
//!
//! Usage: yaml-doctor [options] <PATH...>
//!
//! Each PATH may be a file, a directory (checked recursively for
//! .yaml/.yml/.md files), or a glob pattern. Options:
//!     --fix          Rewrite fixable issues in place
//!     --debug        Emit repair diagnostics to stderr
//!     -h, --help     Print help
//!     -V, --version  Print version

use std::path::Path;
use std::process;

use libdoctor::{check_file, CheckError, CheckOptions};
use walkdir::WalkDir;

mod report;

use report::Batch;

/// Extensions picked up when a directory is expanded.
fn is_checkable_extension(path: &Path) -> bool {
    path.extension().map_or(false, |ext| {
        ext.eq_ignore_ascii_case("yaml")
            || ext.eq_ignore_ascii_case("yml")
            || ext.eq_ignore_ascii_case("md")
    })
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut fix = false;
    let mut debug = false;
    let mut paths: Vec<&str> = Vec::new();

    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("yaml-doctor {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--fix" => {
                fix = true;
            }
            "--debug" => {
                debug = true;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            path => paths.push(path),
        }
    }

    if debug {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    if paths.is_empty() {
        eprintln!("Error: No paths given");
        eprintln!("Usage: yaml-doctor [options] <PATH...> (see --help)");
        process::exit(1);
    }

    let files = expand_paths(&paths);
    if files.is_empty() {
        eprintln!("Error: No files matched");
        process::exit(1);
    }

    let options = CheckOptions {
        fix,
        debug,
        ..CheckOptions::default()
    };

    let mut batch = Batch::new();
    for file in &files {
        match check_file(file, None, &options) {
            Ok(report) => batch.add(file, &report),
            Err(CheckError::Io { source, .. })
                if matches!(
                    source.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                ) =>
            {
                batch.add_unreadable(file, &source);
            }
            Err(error) => {
                eprintln!("Error: {}", error);
                process::exit(1);
            }
        }
    }

    batch.print_summary();
    process::exit(batch.exit_code());
}

/// Expand files, directories, and glob patterns into the file list.
fn expand_paths(paths: &[&str]) -> Vec<String> {
    let mut files = Vec::new();
    for path in paths {
        let as_path = Path::new(path);
        if as_path.is_dir() {
            let mut found: Vec<String> = WalkDir::new(as_path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| is_checkable_extension(entry.path()))
                .map(|entry| entry.path().to_string_lossy().to_string())
                .collect();
            found.sort();
            files.extend(found);
        } else if path.contains(['*', '?', '[']) {
            match glob::glob(path) {
                Ok(matches) => {
                    for m in matches.flatten() {
                        if m.is_file() {
                            files.push(m.to_string_lossy().to_string());
                        }
                    }
                }
                Err(error) => {
                    eprintln!("Error: Bad glob pattern {}: {}", path, error);
                    process::exit(1);
                }
            }
        } else {
            // Explicit files are checked regardless of extension; missing
            // ones surface later as unreadable.
            files.push(path.to_string());
        }
    }
    files
}

fn print_help() {
    println!(
        "yaml-doctor - error-tolerant YAML checker and auto-fixer

USAGE:
    yaml-doctor [OPTIONS] <PATH...>

ARGS:
    <PATH...>    Files, directories, or glob patterns to check.
                 Directories are searched recursively for .yaml, .yml,
                 and .md files; .md files are checked on their YAML
                 front-matter only. Explicitly named files are checked
                 regardless of extension.

OPTIONS:
    --fix          Rewrite fixable issues and write the files back
    --debug        Emit repair diagnostics to stderr
    -h, --help     Print help
    -V, --version  Print version

EXIT CODES:
    0    No errors (warnings and fixes are not fatal)
    1    At least one error, an unreadable file, no files matched,
         or an invalid invocation

EXAMPLES:
    # Check one file
    yaml-doctor config.yaml

    # Check and repair everything under ./configs
    yaml-doctor --fix ./configs/

    # Check the front-matter of all Markdown pages
    yaml-doctor 'docs/**/*.md'
"
    );
}

//! Console reporting for checked files.

use colored::Colorize;
use libdoctor::{CheckReport, Level};

/// Tallies across one invocation.
pub struct Batch {
    files: usize,
    errors: usize,
    warnings: usize,
    fixed: usize,
    unreadable: Vec<String>,
}

impl Batch {
    pub fn new() -> Self {
        Self {
            files: 0,
            errors: 0,
            warnings: 0,
            fixed: 0,
            unreadable: Vec::new(),
        }
    }

    /// Print a file's issues and fold them into the tallies.
    pub fn add(&mut self, path: &str, report: &CheckReport) {
        self.files += 1;
        if report.issues.is_empty() {
            return;
        }
        println!("{}", path.bold());
        for issue in &report.issues {
            let level = match issue.level {
                Level::Error => {
                    self.errors += 1;
                    "error".red()
                }
                Level::Warning => {
                    self.warnings += 1;
                    "warning".yellow()
                }
                Level::Fixed => {
                    self.fixed += 1;
                    "fixed".green()
                }
            };
            println!(
                "  {}:{}  {}  {}",
                issue.mark.line + 1,
                issue.mark.column + 1,
                level,
                issue.reason
            );
        }
    }

    /// Record a file that could not be read.
    pub fn add_unreadable(&mut self, path: &str, error: &std::io::Error) {
        self.unreadable.push(format!("{}: {}", path, error));
    }

    pub fn print_summary(&self) {
        let line = format!(
            "{} errors, {} warnings, {} fixed in {} files",
            self.errors, self.warnings, self.fixed, self.files
        );
        if self.errors > 0 {
            println!("{}", line.red());
        } else if self.warnings > 0 {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
        if !self.unreadable.is_empty() {
            println!("{}", "unreadable:".red());
            for entry in &self.unreadable {
                println!("  {}", entry);
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.errors > 0 || !self.unreadable.is_empty() {
            1
        } else {
            0
        }
    }
}

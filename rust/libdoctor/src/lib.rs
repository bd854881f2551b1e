//! Error-tolerant YAML checker and auto-fixer.
//!
//! Where a strict parser stops at the first fault, this checker keeps
//! going: it guesses what the author meant, patches its working copy of the
//! document so parsing can continue, and reports every fault with a precise
//! line/column mark. With repair enabled it also emits a corrected source
//! string in which as many faults as possible are rewritten in place.
//!
//! # Checking Pipeline
//!
//! A call to [`check`] runs three phases:
//!
//! 1. **Invariant scan**: code points YAML forbids outright are reported
//!    and stripped from the parse buffer.
//!
//! 2. **Listener-driven parse**: a SAX-style walker reads the buffer while
//!    the session inspects every upcoming token for common author mistakes
//!    (unescaped quotes, runaway strings, bad escapes, unquoted `{{ … }}`
//!    substitutions, reserved leading characters, under-indented
//!    continuation lines), repairing each in place.
//!
//! 3. **Report**: issues carry marks into the *original* text, translated
//!    back through the edit history of the working buffers.
//!
//! # Example
//!
//! ```
//! use libdoctor::{check, CheckOptions};
//!
//! let options = CheckOptions { fix: true, ..CheckOptions::default() };
//! let report = check("some_key: 'it's broken'", &options).unwrap();
//! assert_eq!(report.fixed.as_deref(), Some("some_key: 'it''s broken'"));
//! ```

mod boundary;
mod editor;
mod error;
pub mod frontmatter;
mod invariant;
mod issue;
mod listener;
mod parser;

use std::fs;
use std::path::Path;

pub use boundary::{plain_scalar_end, quoted_scalar_end, ScalarEnd};
pub use editor::StringEditor;
pub use error::{CheckError, Result};
pub use issue::{Issue, Level, Mark};

use listener::ParseSession;

/// Options for a checking session.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Produce a repaired copy of the source.
    pub fix: bool,
    /// Delete forbidden code points from the repaired copy.
    pub remove_invalid_characters: bool,
    /// Emit per-repair diagnostics through the `log` facade.
    pub debug: bool,
    /// Filename attached to issue marks.
    pub filename: Option<String>,
    /// Let `check_file` write the repaired content back to disk.
    pub write: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            fix: false,
            remove_invalid_characters: true,
            debug: false,
            filename: None,
            write: true,
        }
    }
}

/// The outcome of a checking session.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Every fault found, in scan order.
    pub issues: Vec<Issue>,
    /// The repaired source; present exactly when `fix` was requested.
    pub fixed: Option<String>,
}

impl CheckReport {
    /// Whether any issue remains at `error` level.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.level == Level::Error)
    }
}

/// Check a YAML document.
///
/// Syntax faults never fail the call; they are returned as issues. Only an
/// internal engine fault produces an error.
pub fn check(text: &str, options: &CheckOptions) -> Result<CheckReport> {
    let mut session = ParseSession::new(text, options);
    session.run()?;
    let (issues, fixed) = session.finish();
    Ok(CheckReport { issues, fixed })
}

/// Check a file, reading it when `content` is not supplied.
///
/// Markdown files are split on their front-matter: only the YAML block is
/// checked and the body is carried through verbatim. When `fix` is on and
/// `options.write` permits, a changed result is written back to the file.
pub fn check_file(path: &str, content: Option<&str>, options: &CheckOptions) -> Result<CheckReport> {
    let owned;
    let content = match content {
        Some(text) => text,
        None => {
            owned = fs::read_to_string(path).map_err(|e| CheckError::io(path, e))?;
            &owned
        }
    };

    let mut options = options.clone();
    if options.filename.is_none() {
        options.filename = Some(path.to_string());
    }

    let is_markdown = Path::new(path)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("md"));

    if is_markdown {
        let (meta, body) = frontmatter::split(content);
        if meta.is_empty() {
            return Ok(CheckReport {
                issues: Vec::new(),
                fixed: options.fix.then(|| content.to_string()),
            });
        }
        let mut report = check(meta, &options)?;
        if let Some(fixed_meta) = report.fixed.take() {
            let joined = frontmatter::join(&fixed_meta, body);
            if options.write && joined != content {
                fs::write(path, &joined).map_err(|e| CheckError::io(path, e))?;
            }
            report.fixed = Some(joined);
        }
        return Ok(report);
    }

    let report = check(content, &options)?;
    if let Some(fixed) = &report.fixed {
        if options.write && fixed != content {
            fs::write(path, fixed).map_err(|e| CheckError::io(path, e))?;
        }
    }
    Ok(report)
}

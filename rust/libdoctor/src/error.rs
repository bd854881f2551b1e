//! Error types for checking operations.
//!
//! YAML syntax faults never surface here; they become issues in the report.
//! `CheckError` covers only engine bugs and filesystem failures from
//! `check_file`.

use thiserror::Error;

/// Result type for checking operations.
pub type Result<T> = std::result::Result<T, CheckError>;

/// Failure of a checking operation itself, as opposed to a fault found in
/// the document.
#[derive(Error, Debug)]
pub enum CheckError {
    /// A fault inside the checker: an untagged parser failure or a violated
    /// engine invariant.
    #[error("internal checker error: {0}")]
    Internal(String),

    /// Filesystem failure while reading or writing a checked file.
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CheckError {
    /// Build an I/O error tagged with the file it concerns.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        CheckError::Io {
            path: path.into(),
            source,
        }
    }
}

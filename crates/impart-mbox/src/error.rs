//! Errors raised while scanning an mbox stream.

use std::fmt;
use std::io;

use thiserror::Error;

// MARK: - Format Violations

/// Structural problems that make it impossible to delimit a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatViolation {
    /// The first non-blank line of the stream is not a `From ` separator.
    MissingSeparator,

    /// The stream ended in the middle of a line.
    UnterminatedLine,
}

impl fmt::Display for FormatViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => f.write_str("missing leading From separator"),
            Self::UnterminatedLine => f.write_str("final line is not terminated"),
        }
    }
}

// MARK: - Errors

/// Errors from impart-mbox operations.
///
/// Every variant is terminal for a [`Scanner`](crate::Scanner): once one is
/// recorded, it is reported on every later query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The stream does not follow the mbox convention.
    #[error("invalid mbox format: {0}")]
    InvalidFormat(FormatViolation),

    /// The header block after a confirmed separator could not be decoded.
    #[error("header decoding failed: {0}")]
    HeaderDecode(String),

    /// A single message does not fit into the configured maximum buffer.
    #[error("message exceeds the maximum buffer size of {max} bytes")]
    ResourceExceeded {
        /// Configured buffer limit.
        max: usize,
    },

    /// The underlying byte source failed.
    #[error("I/O error ({kind:?}): {message}")]
    Io {
        /// Kind of the original error.
        kind: io::ErrorKind,
        /// Rendered original error.
        message: String,
    },

    /// Buffer sizing was changed after scanning started.
    #[error("buffer cannot be resized once scanning has started")]
    AlreadyStarted,

    /// Buffer sizing is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<io::Error> for ScanError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type for impart-mbox operations.
pub type Result<T> = std::result::Result<T, ScanError>;

//! Error types for rigctld protocol parsing

use thiserror::Error;

/// Errors that can occur while parsing a response payload
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Response had fewer lines than the command produces
    #[error("expected {expected} lines, got {actual}")]
    MissingLines { expected: usize, actual: usize },

    /// Invalid frequency value
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Invalid passband value
    #[error("invalid passband: {0}")]
    InvalidPassband(String),

    /// Invalid level value
    #[error("invalid level value: {0}")]
    InvalidLevel(String),

    /// Invalid boolean (expected 0 or 1)
    #[error("invalid boolean: {0}")]
    InvalidBool(String),

    /// Malformed `RPRT` line
    #[error("invalid report: {0}")]
    InvalidReport(String),
}

/// Higher-level protocol errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The daemon answered with a negative `RPRT` code
    ///
    /// `code` holds the magnitude: `RPRT -11` yields `code == 11`.
    #[error("command failed with code {code}")]
    CommandFailed { code: i32 },
}

//! Shared error type for all `wirecell-*` crates.
//!
//! Every component fails fast within its own scope and surfaces one of the
//! five kinds below with a human-readable context message (component name,
//! offending identifiers, what was expected).

use thiserror::Error;

/// The one error type shared across the workspace.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, malformed input, or a geometric invariant violated.
    #[error("value error: {0}")]
    Value(String),

    /// A referenced object could not be found by position/index.
    #[error("index error: {0}")]
    Index(String),

    /// A referenced object could not be found by name/key.
    #[error("key error: {0}")]
    Key(String),

    /// A pipeline invariant was violated at run time.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A stream failed during read or write.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

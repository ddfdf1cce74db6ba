use std::fmt;

/// Unified error type for the interval skip list.
#[derive(Debug)]
pub enum Error {
    /// `remove` was called with an interval that is not indexed.
    NotFound,
    /// An internal consistency check failed. Indicates a bug in the
    /// marker-adjustment protocol rather than a caller mistake.
    InvariantViolation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "interval not found in index"),
            Error::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

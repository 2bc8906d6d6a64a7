//! Arena provider error types.

use std::error::Error;
use std::fmt;

/// Errors from validating an [`ArenaConfig`](crate::ArenaConfig).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaConfigError {
    /// The requested capacity was zero bytes.
    ZeroCapacity,
}

impl fmt::Display for ArenaConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "arena capacity must be non-zero"),
        }
    }
}

impl Error for ArenaConfigError {}

//! Errors from our source of random material.

use core::fmt;

/// Random material generation failed.
#[derive(Debug)]
pub struct GetRandomFailed;

impl fmt::Display for GetRandomFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to get random bytes")
    }
}

impl std::error::Error for GetRandomFailed {}

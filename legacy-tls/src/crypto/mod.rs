//! Cryptographic collaborators: the random source and RSA key transport.

use core::fmt::Debug;

pub use crate::rand::GetRandomFailed;

pub(crate) mod rsa;

/// A source of cryptographically secure randomness.
pub trait SecureRandom: Send + Sync + Debug {
    /// Fill the given buffer with random bytes.
    ///
    /// The bytes must be sourced from a cryptographically secure random number
    /// generator seeded with good quality, secret entropy.
    fn fill(&self, buf: &mut [u8]) -> Result<(), GetRandomFailed>;
}

/// The operating system's random number generator.
#[derive(Debug)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&self, bytes: &mut [u8]) -> Result<(), GetRandomFailed> {
        use rand_core::RngCore;
        rand_core::OsRng
            .try_fill_bytes(bytes)
            .map_err(|_| GetRandomFailed)
    }
}

//! The library's source of time.

use core::fmt::Debug;

use pki_types::UnixTime;

/// An object that provides the current time.
///
/// This is used to check if a certificate has expired during
/// certificate validation, to stamp the hello random, and to check
/// the age of a cached session.
pub trait TimeProvider: Debug + Send + Sync {
    /// Returns the current wall time.
    ///
    /// This is not required to be monotonic.
    ///
    /// Return `None` if unable to retrieve the time.
    fn current_time(&self) -> Option<UnixTime>;
}

#[derive(Debug)]
/// Default `TimeProvider` implementation that uses `std`
pub struct DefaultTimeProvider;

impl TimeProvider for DefaultTimeProvider {
    fn current_time(&self) -> Option<UnixTime> {
        Some(UnixTime::now())
    }
}

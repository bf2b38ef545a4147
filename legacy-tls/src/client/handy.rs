use core::fmt;
use std::sync::{Arc, Mutex};

use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::client::{self, ClientAuthRequest};
use crate::limited_cache;
use crate::msgs::persist;
use crate::sign;

/// An implementer of `ClientSessionStore` which does nothing.
#[derive(Debug)]
pub struct NoClientSessionStorage;

impl client::ClientSessionStore for NoClientSessionStorage {
    fn set_session(&self, _: &str, _: persist::ClientSessionValue) {}

    fn session(&self, _: &str) -> Option<persist::ClientSessionValue> {
        None
    }

    fn remove_session(&self, _: &str) {}
}

/// An implementer of `ClientSessionStore` that stores everything
/// in memory.
///
/// It enforces a limit on the number of entries to bound memory usage.
pub struct ClientSessionMemoryCache {
    sessions: Mutex<limited_cache::LimitedCache<String, persist::ClientSessionValue>>,
}

impl ClientSessionMemoryCache {
    /// Make a new ClientSessionMemoryCache.  `size` is the
    /// maximum number of stored sessions.
    pub fn new(size: usize) -> Self {
        Self {
            sessions: Mutex::new(limited_cache::LimitedCache::new(size)),
        }
    }
}

fn key(host: &str) -> String {
    host.to_ascii_lowercase()
}

impl client::ClientSessionStore for ClientSessionMemoryCache {
    fn set_session(&self, host: &str, value: persist::ClientSessionValue) {
        self.sessions
            .lock()
            .unwrap()
            .insert(key(host), value);
    }

    fn session(&self, host: &str) -> Option<persist::ClientSessionValue> {
        self.sessions
            .lock()
            .unwrap()
            .get(&key(host))
            .cloned()
    }

    fn remove_session(&self, host: &str) {
        self.sessions
            .lock()
            .unwrap()
            .remove(&key(host));
    }
}

impl fmt::Debug for ClientSessionMemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Note: we omit self.sessions as it may contain sensitive data.
        f.debug_struct("ClientSessionMemoryCache")
            .finish()
    }
}

#[derive(Debug)]
pub(super) struct FailResolveClientCert {}

impl client::ResolvesClientCert for FailResolveClientCert {
    fn resolve(&self, _request: &ClientAuthRequest) -> Option<Arc<sign::CertifiedKey>> {
        None
    }

    fn has_certs(&self) -> bool {
        false
    }
}

/// Picks the first configured certificate whose issuer the server
/// says it accepts, or the first certificate if none matches.
pub(super) struct FirstAcceptableClientCert(Vec<Arc<sign::CertifiedKey>>);

impl FirstAcceptableClientCert {
    pub(super) fn new(certs: Vec<Arc<sign::CertifiedKey>>) -> Self {
        Self(certs)
    }
}

fn issued_by_any(certified: &sign::CertifiedKey, request: &ClientAuthRequest) -> bool {
    let Ok(end_entity) = certified.end_entity_cert() else {
        return false;
    };
    let Ok((_, cert)) = X509Certificate::from_der(end_entity) else {
        return false;
    };

    request
        .issuers
        .iter()
        .any(|issuer| issuer.der == cert.issuer().as_raw())
}

impl client::ResolvesClientCert for FirstAcceptableClientCert {
    fn resolve(&self, request: &ClientAuthRequest) -> Option<Arc<sign::CertifiedKey>> {
        self.0
            .iter()
            .find(|ck| issued_by_any(ck, request))
            .or_else(|| self.0.first())
            .cloned()
    }

    fn has_certs(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Debug for FirstAcceptableClientCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstAcceptableClientCert")
            .field("certs", &self.0.len())
            .finish()
    }
}

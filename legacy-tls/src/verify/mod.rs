//! Validation of the server's certificate chain.
//!
//! Three checks run over every chain, in this order:
//!
//! 1. the leaf's key usage must suit the negotiated key exchange,
//! 2. one of the leaf's names must match the requested host,
//! 3. a [`ChainBuilder`] must build a trusted path from the leaf.
//!
//! Every failure is collected.  If a [`ServerCertValidationHook`] is
//! configured it sees them all and has the last word; otherwise any
//! failure rejects the chain with the alert of the first one.

use std::fmt::Debug;
use std::net::IpAddr;
use std::sync::Arc;

use pki_types::{CertificateDer, UnixTime};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;

use crate::crypto::rsa::PeerRsaKey;
use crate::error::{CertificateError, CertificateRejection, Error, PeerIncompatible};
use crate::suites::KeyExchangeAlgorithm;

mod chain;
mod hostname;
mod usage;

pub use chain::{ChainBuilder, ChainStatus};
pub use hostname::match_hostname;

/// An application callback that sees the outcome of certificate
/// validation and may override it.
pub trait ServerCertValidationHook: Debug + Send + Sync {
    /// Decide whether to accept `chain`.
    ///
    /// `errors` holds every problem found, in the order the checks ran;
    /// it is empty for a chain that validated cleanly.  Returning `true`
    /// accepts the chain regardless.
    fn accept(&self, chain: &[CertificateDer<'static>], errors: &[CertificateError]) -> bool;
}

/// Runs the server certificate checks.
#[derive(Debug, Clone)]
pub struct CertificateValidator {
    chain_builder: Arc<dyn ChainBuilder>,
    hook: Option<Arc<dyn ServerCertValidationHook>>,
}

impl CertificateValidator {
    /// Make a validator that builds paths with `chain_builder`.
    pub fn new(
        chain_builder: Arc<dyn ChainBuilder>,
        hook: Option<Arc<dyn ServerCertValidationHook>>,
    ) -> Self {
        Self {
            chain_builder,
            hook,
        }
    }

    /// Validate a server's `chain` (leaf first) for a connection to
    /// `host` using key exchange `kx`, at time `now`.
    pub fn validate(
        &self,
        chain: &[CertificateDer<'static>],
        host: &str,
        kx: KeyExchangeAlgorithm,
        now: UnixTime,
    ) -> Result<(), Error> {
        let (end_entity, intermediates) = chain
            .split_first()
            .ok_or(Error::NoCertificatesPresented)?;

        let mut errors = Vec::new();
        match X509Certificate::from_der(end_entity) {
            Ok((_, leaf)) => {
                if !usage::server_usage_allows(&leaf, kx) {
                    errors.push(CertificateError::InvalidPurpose);
                }
                if !names_match(&leaf, host) {
                    errors.push(CertificateError::NotValidForName);
                }
            }
            Err(_) => errors.push(CertificateError::BadEncoding),
        }

        if let Err(status) = self
            .chain_builder
            .build(end_entity, intermediates, now)
        {
            errors.push(status.into());
        }

        let accepted = match &self.hook {
            Some(hook) => hook.accept(chain, &errors),
            None => errors.is_empty(),
        };

        if accepted {
            if !errors.is_empty() {
                warn!("certificate errors {:?} overridden by application", errors);
            }
            return Ok(());
        }

        if errors.is_empty() {
            errors.push(CertificateError::ApplicationVerificationFailure);
        }
        let rejection = CertificateRejection::new(errors);
        warn!(
            "server certificate rejected: {:?} (codes {:?})",
            rejection.errors,
            rejection.codes()
        );
        Err(rejection.into())
    }
}

/// Whether any name in `cert` matches `host`: first the subjectAltName
/// DNS names and IP addresses, then the subject common names.  The common
/// names are always tried when no SAN entry matched, even if the SAN holds
/// DNS names.
fn names_match(cert: &X509Certificate<'_>, host: &str) -> bool {
    let host_ip = host.parse::<IpAddr>().ok();

    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            match (name, host_ip) {
                (GeneralName::DNSName(pattern), _) if match_hostname(host, pattern) => {
                    return true;
                }
                (GeneralName::IPAddress(bytes), Some(ip)) if ip_matches(&ip, bytes) => {
                    return true;
                }
                _ => {}
            }
        }
    }

    cert.subject()
        .iter_common_name()
        .filter_map(|cn| cn.as_str().ok())
        .any(|cn| match_hostname(host, cn))
}

fn ip_matches(ip: &IpAddr, bytes: &[u8]) -> bool {
    match ip {
        IpAddr::V4(v4) => bytes == v4.octets(),
        IpAddr::V6(v6) => bytes == v6.octets(),
    }
}

/// The RSA public key of an end-entity certificate.
pub(crate) fn end_entity_rsa_key(end_entity: &CertificateDer<'_>) -> Result<PeerRsaKey, Error> {
    let (_, cert) = X509Certificate::from_der(end_entity).map_err(|_| {
        Error::InvalidCertificate(CertificateRejection::new(vec![
            CertificateError::BadEncoding,
        ]))
    })?;

    match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => PeerRsaKey::from_components(rsa.modulus, rsa.exponent),
        _ => Err(PeerIncompatible::ServerCertificateKeyNotRsa.into()),
    }
}

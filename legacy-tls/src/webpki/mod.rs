use std::sync::Arc;

use pki_types::{CertificateDer, SignatureVerificationAlgorithm, UnixTime};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::verify::{ChainBuilder, ChainStatus};

mod anchors;

pub use anchors::RootCertStore;

/// TRUST_E_FAIL: a generic trust failure.
const GENERIC_TRUST_FAILURE: i32 = -2146762485;

/// CERT_E_CRITICAL: an unknown critical extension.
const UNKNOWN_CRITICAL_EXTENSION: i32 = -2146762491;

/// CERT_E_INVALID_NAME: a name constraint was violated.
const INVALID_NAME: i32 = -2146762476;

fn pki_error(error: webpki::Error) -> ChainStatus {
    use webpki::Error::*;
    match error {
        BadDer | BadDerTime | TrailingData(_) | UnsupportedCertVersion => ChainStatus::Malformed,
        CertNotValidYet | CertExpired | InvalidCertValidity => ChainStatus::NotTimeValid,
        UnknownIssuer
        | MaximumPathDepthExceeded
        | MaximumPathBuildCallsExceeded
        | MaximumSignatureChecksExceeded => ChainStatus::PartialChain,
        CertRevoked => ChainStatus::Revoked,
        CaUsedAsEndEntity | EndEntityUsedAsCa | PathLenConstraintViolated => {
            ChainStatus::InvalidBasicConstraints
        }
        RequiredEkuNotFound => ChainStatus::NotValidForUsage,

        InvalidSignatureForPublicKey
        | SignatureAlgorithmMismatch
        | UnsupportedSignatureAlgorithm
        | UnsupportedSignatureAlgorithmForPublicKey => ChainStatus::NotSignatureValid,

        UnsupportedCriticalExtension => ChainStatus::Other(UNKNOWN_CRITICAL_EXTENSION),
        NameConstraintViolation | InvalidNetworkMaskConstraint => ChainStatus::Other(INVALID_NAME),

        _ => ChainStatus::Other(GENERIC_TRUST_FAILURE),
    }
}

/// Signature algorithms accepted on certificates in a path.
static SUPPORTED_SIG_ALGS: &[&dyn SignatureVerificationAlgorithm] = &[
    webpki::ring::RSA_PKCS1_2048_8192_SHA256,
    webpki::ring::RSA_PKCS1_2048_8192_SHA384,
    webpki::ring::RSA_PKCS1_2048_8192_SHA512,
    webpki::ring::RSA_PKCS1_3072_8192_SHA384,
    webpki::ring::ECDSA_P256_SHA256,
    webpki::ring::ECDSA_P256_SHA384,
    webpki::ring::ECDSA_P384_SHA256,
    webpki::ring::ECDSA_P384_SHA384,
];

/// Default [`ChainBuilder`], building paths with `webpki` to the roots
/// of a [`RootCertStore`].
#[derive(Debug, Clone)]
pub struct WebPkiChainBuilder {
    roots: Arc<RootCertStore>,
}

impl WebPkiChainBuilder {
    /// Make a chain builder trusting `roots`.
    pub fn new(roots: impl Into<Arc<RootCertStore>>) -> Self {
        Self {
            roots: roots.into(),
        }
    }

    /// The trusted roots.
    pub fn roots(&self) -> &RootCertStore {
        &self.roots
    }
}

impl ChainBuilder for WebPkiChainBuilder {
    fn build(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<(), ChainStatus> {
        let cert = webpki::EndEntityCert::try_from(end_entity).map_err(pki_error)?;

        let result = cert.verify_for_usage(
            SUPPORTED_SIG_ALGS,
            self.roots.anchors(),
            intermediates,
            now,
            webpki::KeyUsage::server_auth(),
            None,
            None,
        );

        match result {
            Ok(_) => Ok(()),
            Err(webpki::Error::UnknownIssuer) => {
                let last = intermediates
                    .last()
                    .unwrap_or(end_entity);
                match is_self_issued(last) {
                    true => Err(ChainStatus::UntrustedRoot),
                    false => Err(ChainStatus::PartialChain),
                }
            }
            Err(e) => {
                debug!("chain building failed: {:?}", e);
                Err(pki_error(e))
            }
        }
    }
}

/// Whether `cert` names itself as its issuer.
fn is_self_issued(cert: &CertificateDer<'_>) -> bool {
    X509Certificate::from_der(cert)
        .map(|(_, cert)| cert.issuer().as_raw() == cert.subject().as_raw())
        .unwrap_or(false)
}

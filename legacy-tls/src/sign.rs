use std::fmt::Debug;
use std::sync::Arc;

use pki_types::{CertificateDer, PrivateKeyDer};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use zeroize::Zeroizing;

use crate::error::Error;

/// An abstract RSA signing key, used to answer a CertificateRequest.
///
/// SSL3 and TLS1.0 sign a bare 36-byte MD5/SHA-1 digest with PKCS#1 v1.5
/// padding and no DigestInfo.  A key store may be unable to do that; such
/// keys can still be used if they allow their private parameters to be
/// exported.
pub trait SigningKey: Debug + Send + Sync {
    /// Sign `digest` directly.
    ///
    /// Return `None` if this key cannot make raw-digest signatures.
    fn sign_digest(&self, digest: &[u8]) -> Option<Result<Vec<u8>, Error>>;

    /// Export the private key as PKCS#8 DER.
    ///
    /// Return `None` if the key is not exportable.  The returned buffer
    /// is wiped when dropped.
    fn export_pkcs8(&self) -> Option<Zeroizing<Vec<u8>>> {
        None
    }
}

/// Sign `digest` with `key`, falling back to exporting the key's private
/// parameters when it has no raw-digest signing.
///
/// The exported key exists only for the duration of this call.
pub(crate) fn sign_digest_with_fallback(
    key: &dyn SigningKey,
    digest: &[u8],
) -> Result<Vec<u8>, Error> {
    if let Some(signature) = key.sign_digest(digest) {
        return signature;
    }

    debug!("client key has no raw signing; exporting private parameters");
    let der = key
        .export_pkcs8()
        .ok_or(Error::ClientKeyUnavailable)?;
    let private = RsaPrivateKey::from_pkcs8_der(&der).map_err(|_| Error::ClientKeyUnavailable)?;
    sign_unprefixed(&private, digest)
}

fn sign_unprefixed(key: &RsaPrivateKey, digest: &[u8]) -> Result<Vec<u8>, Error> {
    key.sign(Pkcs1v15Sign::new_unprefixed(), digest)
        .map_err(|e| Error::General(format!("signing failed: {e}")))
}

/// An in-memory RSA private key.
#[derive(Debug)]
pub struct RsaSigningKey {
    key: Arc<RsaPrivateKey>,
}

impl RsaSigningKey {
    /// Make a new `RsaSigningKey` from a DER encoding, in either
    /// PKCS#1 or PKCS#8 format.
    pub fn new(der: &PrivateKeyDer<'_>) -> Result<Self, Error> {
        let key = match der {
            PrivateKeyDer::Pkcs8(pkcs8) => {
                RsaPrivateKey::from_pkcs8_der(pkcs8.secret_pkcs8_der()).ok()
            }
            PrivateKeyDer::Pkcs1(pkcs1) => {
                RsaPrivateKey::from_pkcs1_der(pkcs1.secret_pkcs1_der()).ok()
            }
            _ => {
                return Err(Error::General(
                    "only RSA private keys are supported".into(),
                ))
            }
        }
        .ok_or_else(|| {
            Error::General("failed to parse RSA private key as PKCS#1 or PKCS#8".into())
        })?;

        Ok(Self { key: Arc::new(key) })
    }
}

impl SigningKey for RsaSigningKey {
    fn sign_digest(&self, digest: &[u8]) -> Option<Result<Vec<u8>, Error>> {
        Some(sign_unprefixed(&self.key, digest))
    }
}

/// A packaged-together certificate chain and matching `SigningKey`.
#[derive(Clone, Debug)]
pub struct CertifiedKey {
    /// The certificate chain.
    pub cert: Vec<CertificateDer<'static>>,

    /// The certified key.
    pub key: Arc<dyn SigningKey>,
}

impl CertifiedKey {
    /// Make a new CertifiedKey, with the given chain and key.
    ///
    /// The cert chain must not be empty. The first certificate in the chain
    /// must be the end-entity certificate.
    pub fn new(cert: Vec<CertificateDer<'static>>, key: Arc<dyn SigningKey>) -> Self {
        Self { cert, key }
    }

    /// The end-entity certificate.
    pub fn end_entity_cert(&self) -> Result<&CertificateDer<'static>, Error> {
        self.cert
            .first()
            .ok_or(Error::NoCertificatesPresented)
    }
}

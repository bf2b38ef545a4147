use std::sync::Arc;

use pki_types::{CertificateDer, PrivateKeyDer};

use crate::builder::{ConfigBuilder, WantsVerifier};
use crate::client::{handy, ClientConfig, ResolvesClientCert};
use crate::crypto::OsRandom;
use crate::error::Error;
use crate::sign::{CertifiedKey, RsaSigningKey};
use crate::suites::SupportedCipherSuite;
use crate::time_provider::DefaultTimeProvider;
use crate::verify::ChainBuilder;
use crate::versions::EnabledVersions;
use crate::webpki::{RootCertStore, WebPkiChainBuilder};

/// The number of sessions the default session store keeps.
const DEFAULT_SESSION_CACHE_SIZE: usize = 256;

impl ConfigBuilder<ClientConfig, WantsVerifier> {
    /// Choose how to verify server certificates: build paths with
    /// `webpki` to the roots in `root_store`.
    pub fn with_root_certificates(
        self,
        root_store: impl Into<Arc<RootCertStore>>,
    ) -> ConfigBuilder<ClientConfig, WantsClientCert> {
        self.with_chain_builder(Arc::new(WebPkiChainBuilder::new(root_store)))
    }

    /// Set a custom [`ChainBuilder`].
    ///
    /// The usage and host name checks still run; only path building and
    /// trust decisions are delegated.
    pub fn with_chain_builder(
        self,
        chain_builder: Arc<dyn ChainBuilder>,
    ) -> ConfigBuilder<ClientConfig, WantsClientCert> {
        ConfigBuilder {
            state: WantsClientCert {
                cipher_suites: self.state.cipher_suites,
                versions: self.state.versions,
                chain_builder,
            },
            side: self.side,
        }
    }
}

/// A config builder state where the caller needs to supply whether and how to provide a client
/// certificate.
///
/// For more information, see the [`ConfigBuilder`] documentation.
#[derive(Clone, Debug)]
pub struct WantsClientCert {
    cipher_suites: Vec<&'static SupportedCipherSuite>,
    versions: EnabledVersions,
    chain_builder: Arc<dyn ChainBuilder>,
}

impl ConfigBuilder<ClientConfig, WantsClientCert> {
    /// Sets a single certificate chain and matching private key for use
    /// in client authentication.
    ///
    /// `cert_chain` is a vector of DER-encoded certificates.
    /// `key_der` is a DER-encoded RSA private key as PKCS#1 or PKCS#8.
    ///
    /// This function fails if `key_der` is invalid.
    pub fn with_client_auth_cert(
        self,
        cert_chain: Vec<CertificateDer<'static>>,
        key_der: PrivateKeyDer<'static>,
    ) -> Result<ClientConfig, Error> {
        self.with_client_auth_certs(vec![(cert_chain, key_der)])
    }

    /// Sets several certificate chains with their private keys.
    ///
    /// When a server asks for a certificate, the first whose issuer it
    /// names is sent; if it names none of them, the first is.
    pub fn with_client_auth_certs(
        self,
        certs: Vec<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)>,
    ) -> Result<ClientConfig, Error> {
        let certified = certs
            .into_iter()
            .map(|(chain, key_der)| {
                let key = RsaSigningKey::new(&key_der)?;
                let certified = CertifiedKey::new(chain, Arc::new(key));
                certified.end_entity_cert()?;
                Ok(Arc::new(certified))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(self.with_client_cert_resolver(Arc::new(handy::FirstAcceptableClientCert::new(
            certified,
        ))))
    }

    /// Do not support client auth.
    pub fn with_no_client_auth(self) -> ClientConfig {
        self.with_client_cert_resolver(Arc::new(handy::FailResolveClientCert {}))
    }

    /// Sets a custom [`ResolvesClientCert`].
    pub fn with_client_cert_resolver(
        self,
        client_auth_cert_resolver: Arc<dyn ResolvesClientCert>,
    ) -> ClientConfig {
        ClientConfig {
            cipher_suites: self.state.cipher_suites,
            versions: self.state.versions,
            chain_builder: self.state.chain_builder,
            client_auth_cert_resolver,
            validation_hook: None,
            session_storage: Arc::new(handy::ClientSessionMemoryCache::new(
                DEFAULT_SESSION_CACHE_SIZE,
            )),
            enable_sni: true,
            secure_random: Arc::new(OsRandom),
            time_provider: Arc::new(DefaultTimeProvider),
        }
    }
}

use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use pki_types::UnixTime;

use crate::builder::{ConfigBuilder, WantsCipherSuites};
use crate::client::ClientAuthRequest;
use crate::crypto::SecureRandom;
use crate::enums::{CipherSuite, ProtocolVersion};
use crate::error::Error;
use crate::msgs::persist::ClientSessionValue;
use crate::sign;
use crate::suites::SupportedCipherSuite;
use crate::time_provider::TimeProvider;
use crate::verify::{CertificateValidator, ChainBuilder, ServerCertValidationHook};
use crate::versions::EnabledVersions;

/// A trait for the ability to store client session data, so that
/// sessions can be resumed in future connections.
///
/// Sessions are keyed by the host name the handshake authenticated,
/// compared case-insensitively.
pub trait ClientSessionStore: fmt::Debug + Send + Sync {
    /// Remember `value` as the session to offer next time we connect
    /// to `host`, replacing any earlier one.
    fn set_session(&self, host: &str, value: ClientSessionValue);

    /// The session to offer when connecting to `host`.
    fn session(&self, host: &str) -> Option<ClientSessionValue>;

    /// Forget the session for `host`.
    fn remove_session(&self, host: &str);
}

/// A trait for the ability to choose a certificate chain and
/// private key for the purposes of client authentication.
pub trait ResolvesClientCert: fmt::Debug + Send + Sync {
    /// Given what the server asked for in `request`, return a certificate
    /// chain and signing key to authenticate with.
    ///
    /// Return `None` to decline; the handshake then fails with a
    /// `user_canceled` alert.
    fn resolve(&self, request: &ClientAuthRequest) -> Option<Arc<sign::CertifiedKey>>;

    /// Return true if any certificates at all are available.
    fn has_certs(&self) -> bool;
}

/// Common configuration for (typically) all connections made by a program.
///
/// Making one of these is cheap, though one of the inputs may be expensive:
/// gathering trust roots from the operating system to add to the
/// [`RootCertStore`] passed to `with_root_certificates()`.
///
/// These must be created via the [`ClientConfig::builder()`] function.
///
/// # Defaults
///
/// * [`ClientConfig::session_storage`]: the default stores 256 sessions in memory.
/// * [`ClientConfig::enable_sni`]: true.
/// * [`ClientConfig::validation_hook`]: none; any certificate error is fatal.
/// * [`ClientConfig::secure_random`]: the operating system's generator.
/// * [`ClientConfig::time_provider`]: the system clock.
///
/// [`RootCertStore`]: crate::RootCertStore
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// List of ciphersuites, in preference order.
    pub(super) cipher_suites: Vec<&'static SupportedCipherSuite>,

    /// Supported versions.
    pub(super) versions: EnabledVersions,

    /// How to build a path from the server's certificate to a trusted root.
    pub(super) chain_builder: Arc<dyn ChainBuilder>,

    /// How to decide which client auth certificate/keys to use.
    pub(super) client_auth_cert_resolver: Arc<dyn ResolvesClientCert>,

    /// Sees every certificate validation outcome, and may override it.
    pub validation_hook: Option<Arc<dyn ServerCertValidationHook>>,

    /// How we store session data for resumption.
    pub session_storage: Arc<dyn ClientSessionStore>,

    /// Whether to send the Server Name Indication (SNI) extension
    /// during the client handshake.
    ///
    /// It is only ever sent in a TLS1.0 ClientHello, and never for
    /// hosts that are IP addresses.
    pub enable_sni: bool,

    /// Source of randomness for hello randoms and premaster secrets.
    pub secure_random: Arc<dyn SecureRandom>,

    /// Provides the current system time.
    pub time_provider: Arc<dyn TimeProvider>,
}

impl ClientConfig {
    /// Create a builder for a client configuration.
    ///
    /// For more information, see the [`ConfigBuilder`] documentation.
    pub fn builder() -> ConfigBuilder<Self, WantsCipherSuites> {
        ConfigBuilder {
            state: WantsCipherSuites(()),
            side: PhantomData,
        }
    }

    /// The configured cipher suites, in preference order.
    pub fn cipher_suites(&self) -> &[&'static SupportedCipherSuite] {
        &self.cipher_suites
    }

    #[doc(hidden)]
    /// We support a given TLS version if it's within the configured
    /// range *and* at least one ciphersuite for this version is
    /// also configured.
    pub fn supports_version(&self, v: ProtocolVersion) -> bool {
        self.versions.contains(v)
            && self
                .cipher_suites
                .iter()
                .any(|cs| cs.usable_for_version(v))
    }

    /// Whether any client certificate is configured.
    pub fn has_client_certs(&self) -> bool {
        self.client_auth_cert_resolver.has_certs()
    }

    pub(super) fn find_cipher_suite(
        &self,
        suite: CipherSuite,
    ) -> Option<&'static SupportedCipherSuite> {
        self.cipher_suites
            .iter()
            .copied()
            .find(|scs| scs.suite == suite)
    }

    pub(super) fn validator(&self) -> CertificateValidator {
        CertificateValidator::new(
            self.chain_builder.clone(),
            self.validation_hook.clone(),
        )
    }

    pub(super) fn current_time(&self) -> Result<UnixTime, Error> {
        self.time_provider
            .current_time()
            .ok_or(Error::FailedToGetCurrentTime)
    }
}

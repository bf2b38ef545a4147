use core::fmt;
use core::marker::PhantomData;

use crate::error::Error;
use crate::suites::{self, SupportedCipherSuite};
use crate::versions::{self, EnabledVersions, SupportedProtocolVersion};

/// A [builder] for [`ClientConfig`] values.
///
/// To get one of these, call [`ClientConfig::builder()`].
///
/// To build a config, you must make at least three decisions (in order):
///
/// - Which cipher suites and protocol versions should be offered?
/// - How should the server's certificate chain be built and trusted?
/// - What certificate, if any, should be sent when the server asks for one?
///
/// For settings besides these, see the fields of [`ClientConfig`].
///
/// The usual choice for protocol primitives is to call
/// [`ConfigBuilder::with_safe_defaults`], which offers every non-export
/// suite at SSL3 and TLS1.0:
///
/// ```
/// use legacy_tls::{ClientConfig, RootCertStore};
///
/// let config = ClientConfig::builder()
///     .with_safe_defaults()
///     .with_root_certificates(RootCertStore::empty())
///     .with_no_client_auth();
/// ```
///
/// Overriding a default introduces a `Result` that must be unwrapped,
/// because the config builder checks for consistency of the choices made.
/// For instance, it's an error to configure only AES suites while
/// restricting the client to SSL3, which cannot negotiate them.
///
/// ```
/// use legacy_tls::{suites, versions, ClientConfig};
///
/// let config = ClientConfig::builder()
///     .with_cipher_suites(&[&suites::TLS_RSA_WITH_AES_128_CBC_SHA])
///     .with_protocol_versions(&[&versions::SSL3]);
/// assert!(config.is_err());
/// ```
///
/// # Types
///
/// ConfigBuilder uses the [typestate] pattern to ensure at compile time that each required
/// configuration item is provided exactly once. This is tracked in the `State` type parameter,
/// which can have these values:
///
/// - [`WantsCipherSuites`]
/// - [`WantsVersions`]
/// - [`WantsVerifier`]
/// - [`WantsClientCert`]
///
/// [builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
/// [typestate]: http://cliffle.com/blog/rust-typestate/
/// [`ClientConfig`]: crate::ClientConfig
/// [`ClientConfig::builder()`]: crate::ClientConfig::builder()
/// [`WantsClientCert`]: crate::client::WantsClientCert
#[derive(Clone)]
pub struct ConfigBuilder<Side: ConfigSide, State> {
    pub(crate) state: State,
    pub(crate) side: PhantomData<Side>,
}

impl<Side: ConfigSide, State: fmt::Debug> fmt::Debug for ConfigBuilder<Side, State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side_name = core::any::type_name::<Side>();
        let (_, name) = side_name
            .rsplit_once("::")
            .unwrap_or(("", side_name));

        f.debug_struct(&format!("ConfigBuilder<{}, _>", name))
            .field("state", &self.state)
            .finish()
    }
}

/// Config builder state where the caller must supply cipher suites.
///
/// For more information, see the [`ConfigBuilder`] documentation.
#[derive(Clone, Debug)]
pub struct WantsCipherSuites(pub(crate) ());

impl<S: ConfigSide> ConfigBuilder<S, WantsCipherSuites> {
    /// Start side-specific config with defaults for the protocol primitives.
    ///
    /// If used, this will enable the suites in [`DEFAULT_CIPHER_SUITES`]
    /// and the versions in [`DEFAULT_VERSIONS`].
    ///
    /// [`DEFAULT_CIPHER_SUITES`]: suites::DEFAULT_CIPHER_SUITES
    /// [`DEFAULT_VERSIONS`]: versions::DEFAULT_VERSIONS
    pub fn with_safe_defaults(self) -> ConfigBuilder<S, WantsVerifier> {
        ConfigBuilder {
            state: WantsVerifier {
                cipher_suites: suites::DEFAULT_CIPHER_SUITES.to_vec(),
                versions: EnabledVersions::default(),
            },
            side: self.side,
        }
    }

    /// Choose a specific set of cipher suites, in preference order.
    ///
    /// Export suites are only offered if named here.
    pub fn with_cipher_suites(
        self,
        cipher_suites: &[&'static SupportedCipherSuite],
    ) -> ConfigBuilder<S, WantsVersions> {
        ConfigBuilder {
            state: WantsVersions {
                cipher_suites: cipher_suites.to_vec(),
            },
            side: self.side,
        }
    }

    /// Choose the default set of cipher suites.
    pub fn with_safe_default_cipher_suites(self) -> ConfigBuilder<S, WantsVersions> {
        self.with_cipher_suites(suites::DEFAULT_CIPHER_SUITES)
    }
}

/// Config builder state where the caller must supply protocol versions.
///
/// For more information, see the [`ConfigBuilder`] documentation.
#[derive(Clone, Debug)]
pub struct WantsVersions {
    cipher_suites: Vec<&'static SupportedCipherSuite>,
}

impl<S: ConfigSide> ConfigBuilder<S, WantsVersions> {
    /// Accept the default protocol versions: both SSL3 and TLS1.0 are enabled.
    pub fn with_safe_default_protocol_versions(
        self,
    ) -> Result<ConfigBuilder<S, WantsVerifier>, Error> {
        self.with_protocol_versions(versions::DEFAULT_VERSIONS)
    }

    /// Use a specific set of protocol versions.
    ///
    /// The client negotiates the smallest range covering them.
    pub fn with_protocol_versions(
        self,
        versions: &[&'static SupportedProtocolVersion],
    ) -> Result<ConfigBuilder<S, WantsVerifier>, Error> {
        let enabled = EnabledVersions::covering(versions)
            .ok_or_else(|| Error::General("no protocol versions configured".into()))?;
        self.finish_versions(enabled)
    }

    /// Use every protocol version from `min` to `max` inclusive.
    pub fn with_protocol_version_range(
        self,
        min: &'static SupportedProtocolVersion,
        max: &'static SupportedProtocolVersion,
    ) -> Result<ConfigBuilder<S, WantsVerifier>, Error> {
        let enabled = EnabledVersions::new(min, max).ok_or_else(|| {
            Error::General(format!(
                "inverted protocol version range {:?}..={:?}",
                min, max
            ))
        })?;
        self.finish_versions(enabled)
    }

    fn finish_versions(
        self,
        enabled: EnabledVersions,
    ) -> Result<ConfigBuilder<S, WantsVerifier>, Error> {
        if self.state.cipher_suites.is_empty() {
            return Err(Error::General("no cipher suites configured".into()));
        }

        let any_usable_suite = self
            .state
            .cipher_suites
            .iter()
            .any(|scs| {
                versions::ALL_VERSIONS
                    .iter()
                    .any(|v| enabled.contains(v.version) && scs.usable_for_version(v.version))
            });

        if !any_usable_suite {
            return Err(Error::General("no usable cipher suites configured".into()));
        }

        Ok(ConfigBuilder {
            state: WantsVerifier {
                cipher_suites: self.state.cipher_suites,
                versions: enabled,
            },
            side: self.side,
        })
    }
}

/// Config builder state where the caller must supply how to trust the
/// server's certificate chain.
///
/// For more information, see the [`ConfigBuilder`] documentation.
#[derive(Clone, Debug)]
pub struct WantsVerifier {
    pub(crate) cipher_suites: Vec<&'static SupportedCipherSuite>,
    pub(crate) versions: EnabledVersions,
}

/// Helper trait to abstract [`ConfigBuilder`] over the config it builds.
///
/// Only [`ClientConfig`] implements it.
///
/// [`ClientConfig`]: crate::ClientConfig
pub trait ConfigSide: sealed::Sealed {}

impl ConfigSide for crate::ClientConfig {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for crate::ClientConfig {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ProtocolVersion;
    use crate::suites::{TLS_RSA_WITH_AES_128_CBC_SHA, TLS_RSA_WITH_RC4_128_MD5};
    use crate::versions::{SSL3, TLS10};
    use crate::ClientConfig;

    #[test]
    fn defaults_cover_both_versions() {
        let b = ClientConfig::builder().with_safe_defaults();
        assert!(b.state.versions.contains(ProtocolVersion::SSLv3));
        assert!(b.state.versions.contains(ProtocolVersion::TLSv1_0));
        assert_eq!(b.state.cipher_suites, suites::DEFAULT_CIPHER_SUITES.to_vec());
    }

    #[test]
    fn empty_choices_are_refused() {
        assert!(ClientConfig::builder()
            .with_cipher_suites(&[])
            .with_safe_default_protocol_versions()
            .is_err());
        assert!(ClientConfig::builder()
            .with_safe_default_cipher_suites()
            .with_protocol_versions(&[])
            .is_err());
    }

    #[test]
    fn inverted_range_is_refused() {
        let err = ClientConfig::builder()
            .with_safe_default_cipher_suites()
            .with_protocol_version_range(&TLS10, &SSL3)
            .unwrap_err();
        assert_eq!(
            err,
            Error::General("inverted protocol version range TLSv1_0..=SSLv3".into())
        );
    }

    #[test]
    fn suites_must_be_usable_in_range() {
        assert_eq!(
            ClientConfig::builder()
                .with_cipher_suites(&[&TLS_RSA_WITH_AES_128_CBC_SHA])
                .with_protocol_versions(&[&SSL3])
                .unwrap_err(),
            Error::General("no usable cipher suites configured".into())
        );

        let b = ClientConfig::builder()
            .with_cipher_suites(&[&TLS_RSA_WITH_AES_128_CBC_SHA, &TLS_RSA_WITH_RC4_128_MD5])
            .with_protocol_versions(&[&SSL3])
            .unwrap();
        assert!(!b.state.versions.contains(ProtocolVersion::TLSv1_0));
    }

    #[test]
    fn debug_names_the_side() {
        let b = ClientConfig::builder();
        assert_eq!(
            format!("{:?}", b),
            "ConfigBuilder<ClientConfig, _> { state: WantsCipherSuites(()) }"
        );
    }
}

use std::fmt;

use crate::enums::ProtocolVersion;

/// A TLS protocol version supported by legacy-tls.
///
/// All possible instances of this class are provided by the library in
/// the [`ALL_VERSIONS`] array, as well as individually as [`SSL3`]
/// and [`TLS10`].
#[derive(PartialEq, Eq)]
pub struct SupportedProtocolVersion {
    /// The TLS enumeration naming this version.
    pub version: ProtocolVersion,
    is_private: (),
}

impl fmt::Debug for SupportedProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.version, f)
    }
}

/// SSL 3.0
pub static SSL3: SupportedProtocolVersion = SupportedProtocolVersion {
    version: ProtocolVersion::SSLv3,
    is_private: (),
};

/// TLS 1.0
pub static TLS10: SupportedProtocolVersion = SupportedProtocolVersion {
    version: ProtocolVersion::TLSv1_0,
    is_private: (),
};

/// A list of all the protocol versions supported by legacy-tls.
pub static ALL_VERSIONS: &[&SupportedProtocolVersion] = &[&TLS10, &SSL3];

/// The version configuration that an application should use by default.
pub static DEFAULT_VERSIONS: &[&SupportedProtocolVersion] = ALL_VERSIONS;

/// The contiguous range of versions a client will negotiate.
///
/// The default range is SSL3 to TLS1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EnabledVersions {
    min: ProtocolVersion,
    max: ProtocolVersion,
}

impl EnabledVersions {
    pub(crate) fn new(
        min: &'static SupportedProtocolVersion,
        max: &'static SupportedProtocolVersion,
    ) -> Option<Self> {
        match min.version <= max.version {
            true => Some(Self {
                min: min.version,
                max: max.version,
            }),
            false => None,
        }
    }

    /// The smallest range covering every version in `versions`.
    pub(crate) fn covering(versions: &[&'static SupportedProtocolVersion]) -> Option<Self> {
        let min = versions
            .iter()
            .min_by_key(|v| u16::from(v.version))?;
        let max = versions
            .iter()
            .max_by_key(|v| u16::from(v.version))?;
        Self::new(min, max)
    }

    pub(crate) fn contains(&self, version: ProtocolVersion) -> bool {
        self.min <= version && version <= self.max
    }

    /// The version a ClientHello offers.
    pub(crate) fn max(&self) -> ProtocolVersion {
        self.max
    }
}

impl Default for EnabledVersions {
    fn default() -> Self {
        Self {
            min: SSL3.version,
            max: TLS10.version,
        }
    }
}

use std::fmt::Debug;

use pki_types::{CertificateDer, UnixTime};

use crate::error::CertificateError;

/// Why a [`ChainBuilder`] could not build a trusted path.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    /// A certificate on the path is expired or not yet valid.
    NotTimeValid,
    /// A certificate's validity period lies outside its issuer's.
    NotTimeNested,
    /// No issuer could be found for some certificate on the path.
    PartialChain,
    /// The path ends in a self-issued root that is not trusted.
    UntrustedRoot,
    /// A signature on the path does not verify.
    NotSignatureValid,
    /// A certificate violates its basic constraints or path length.
    InvalidBasicConstraints,
    /// A certificate on the path is revoked.
    Revoked,
    /// The path does not allow server authentication.
    NotValidForUsage,
    /// A certificate could not be decoded.
    Malformed,
    /// Anything else, with a builder-specific diagnostic code.
    Other(i32),
}

impl From<ChainStatus> for CertificateError {
    fn from(status: ChainStatus) -> Self {
        match status {
            ChainStatus::NotTimeValid => Self::Expired,
            ChainStatus::NotTimeNested => Self::ValidityPeriodNesting,
            ChainStatus::PartialChain => Self::IncompleteChain,
            ChainStatus::UntrustedRoot => Self::UntrustedRoot,
            ChainStatus::NotSignatureValid => Self::BadSignature,
            ChainStatus::InvalidBasicConstraints => Self::BasicConstraints,
            ChainStatus::Revoked => Self::Revoked,
            ChainStatus::NotValidForUsage => Self::WrongUsage,
            ChainStatus::Malformed => Self::BadEncoding,
            ChainStatus::Other(code) => Self::Other(code),
        }
    }
}

/// Something that can build and check a certificate path from a server's
/// end-entity certificate to a trusted root.
pub trait ChainBuilder: Debug + Send + Sync {
    /// Build a path from `end_entity` through any of `intermediates`,
    /// valid at time `now`.
    ///
    /// `intermediates` is what the server sent after its end-entity
    /// certificate, in the order it was sent.
    fn build(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<(), ChainStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::AlertDescription;

    #[test]
    fn statuses_map_to_alerts() {
        let alert = |s| AlertDescription::from(CertificateError::from(s));
        assert_eq!(
            alert(ChainStatus::NotTimeValid),
            AlertDescription::CertificateExpired
        );
        assert_eq!(alert(ChainStatus::PartialChain), AlertDescription::UnknownCA);
        assert_eq!(alert(ChainStatus::UntrustedRoot), AlertDescription::UnknownCA);
        assert_eq!(
            alert(ChainStatus::NotSignatureValid),
            AlertDescription::BadCertificate
        );
        assert_eq!(
            alert(ChainStatus::InvalidBasicConstraints),
            AlertDescription::BadCertificate
        );
        assert_eq!(
            alert(ChainStatus::NotTimeNested),
            AlertDescription::BadCertificate
        );
        assert_eq!(
            alert(ChainStatus::Revoked),
            AlertDescription::CertificateRevoked
        );
        assert_eq!(
            alert(ChainStatus::Other(-1)),
            AlertDescription::CertificateUnknown
        );
    }

    #[test]
    fn statuses_keep_their_codes() {
        assert_eq!(
            CertificateError::from(ChainStatus::PartialChain).code(),
            -2146762486
        );
        assert_eq!(
            CertificateError::from(ChainStatus::UntrustedRoot).code(),
            -2146762487
        );
        assert_eq!(CertificateError::from(ChainStatus::Other(7)).code(), 7);
    }
}

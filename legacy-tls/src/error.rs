use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::SystemTimeError;

use crate::enums::{AlertDescription, ContentType, HandshakeType};
use crate::rand;

/// legacy-tls reports protocol errors using this type.
///
/// Every error is fatal to the handshake attempt that produced it.
/// [`Error::alert`] names the alert that should be sent to the peer.
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// We received a TLS message that isn't valid right now.
    /// `expect_types` lists the message types we can expect right now.
    /// `got_type` is the type we found.  This error is typically
    /// caused by a buggy TLS stack (the peer or this one), a broken
    /// network, or an attack.
    InappropriateMessage {
        /// Which types we expected
        expect_types: Vec<ContentType>,
        /// What type we received
        got_type: ContentType,
    },

    /// We received a TLS handshake message that isn't valid right now.
    /// `expect_types` lists the handshake message types we can expect
    /// right now.  `got_type` is the type we found.
    InappropriateHandshakeMessage {
        /// Which handshake type we expected
        expect_types: Vec<HandshakeType>,
        /// What handshake type we received
        got_type: HandshakeType,
    },

    /// The peer sent us a TLS message with invalid contents.
    InvalidMessage(InvalidMessage),

    /// The peer didn't give us any certificates.
    NoCertificatesPresented,

    /// The peer doesn't support a protocol version/feature we require.
    /// The parameter gives a hint as to what version/feature it is.
    PeerIncompatible(PeerIncompatible),

    /// The peer deviated from the standard TLS protocol.
    /// The parameter gives a hint where.
    PeerMisbehaved(PeerMisbehaved),

    /// We received a fatal alert.  This means the peer is unhappy.
    AlertReceived(AlertDescription),

    /// The server's certificate chain was rejected.
    ///
    /// Every diagnostic found during validation is kept, in the
    /// order the checks ran.
    InvalidCertificate(CertificateRejection),

    /// The server asked for a client certificate and none was configured,
    /// or the selection callback declined to pick one.
    NoClientCertificate,

    /// The selected client certificate had no usable private key.
    ClientKeyUnavailable,

    /// The handshake was abandoned locally, for example after a timeout.
    HandshakeAborted,

    /// This function doesn't work until the TLS handshake
    /// is complete.
    HandshakeNotComplete,

    /// The transport failed while the handshake was in progress.
    Transport(io::ErrorKind),

    /// We failed to figure out what time it currently is.
    FailedToGetCurrentTime,

    /// We failed to acquire random bytes from the system.
    FailedToGetRandomBytes,

    /// A catch-all error for unlikely errors.
    General(String),
}

impl Error {
    /// The alert that reports this error to the peer.
    ///
    /// `None` means no alert should be sent: either the peer already
    /// knows (it sent us an alert), or the transport is gone.
    pub fn alert(&self) -> Option<AlertDescription> {
        match self {
            Self::InappropriateMessage { .. } | Self::InappropriateHandshakeMessage { .. } => {
                Some(AlertDescription::UnexpectedMessage)
            }
            Self::InvalidMessage(e) => Some(AlertDescription::from(*e)),
            Self::NoCertificatesPresented => Some(AlertDescription::HandshakeFailure),
            Self::PeerIncompatible(e) => Some(AlertDescription::from(e)),
            Self::PeerMisbehaved(e) => Some(AlertDescription::from(e)),
            Self::InvalidCertificate(rejection) => Some(rejection.alert),
            Self::NoClientCertificate | Self::ClientKeyUnavailable => {
                Some(AlertDescription::UserCanceled)
            }
            Self::FailedToGetRandomBytes | Self::FailedToGetCurrentTime | Self::General(_) => {
                Some(AlertDescription::InternalError)
            }
            Self::AlertReceived(_)
            | Self::HandshakeAborted
            | Self::HandshakeNotComplete
            | Self::Transport(_) => None,
        }
    }
}

/// A corrupt TLS message payload that resulted in an error.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidMessage {
    /// An advertised message was larger then expected.
    HandshakePayloadTooLarge,
    /// The peer sent us a syntactically incorrect ChangeCipherSpec payload.
    InvalidCcs,
    /// A certificate in a chain could not be parsed as X.509.
    InvalidCertificateEncoding,
    /// A distinguished name in a CertificateRequest could not be parsed.
    InvalidDistinguishedName,
    /// A Finished message had the wrong length for the negotiated version.
    InvalidFinishedLength,
    /// A peer's RSA parameters could not be decoded.
    InvalidRsaParams,
    /// A server name extension carried a name that is not a DNS name.
    InvalidServerName,
    /// A TLS message payload was larger than the protocol allows.
    MessageTooLarge,
    /// Message is shorter than the expected length
    MessageTooShort,
    /// Missing data for the named handshake payload value
    MissingData(&'static str),
    /// Trailing data found for the named handshake payload value
    TrailingData(&'static str),
    /// A peer sent an unexpected message type.
    UnexpectedMessage(&'static str),
}

impl From<InvalidMessage> for Error {
    #[inline]
    fn from(e: InvalidMessage) -> Self {
        Self::InvalidMessage(e)
    }
}

impl From<InvalidMessage> for AlertDescription {
    fn from(e: InvalidMessage) -> Self {
        match e {
            InvalidMessage::InvalidCcs => Self::IllegalParameter,
            InvalidMessage::InvalidCertificateEncoding => Self::BadCertificate,
            InvalidMessage::HandshakePayloadTooLarge | InvalidMessage::MessageTooLarge => {
                Self::RecordOverflow
            }
            _ => Self::DecodeError,
        }
    }
}

#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Clone)]
/// The set of cases where we failed to make a connection because we thought
/// the peer was misbehaving.
///
/// This is `non_exhaustive`: we might add or stop using items here in minor
/// versions.  We also don't document what they mean.  Generally a user of
/// legacy-tls shouldn't vary its behaviour on these error codes, and there is
/// nothing it can do to improve matters.
pub enum PeerMisbehaved {
    IncorrectFinished,
    InvalidServerKeyExchangeSignature,
    ResumptionOfferedWithVariedCipherSuite,
    ResumptionOfferedWithVariedVersion,
    SelectedUnofferedCipherSuite,
    SelectedUnofferedCompression,
    SelectedUnofferedVersion,
    SelectedUnusableCipherSuiteForVersion,
    ServerKeyExchangeWithUnusableKey,
}

impl From<PeerMisbehaved> for Error {
    #[inline]
    fn from(e: PeerMisbehaved) -> Self {
        Self::PeerMisbehaved(e)
    }
}

impl From<&PeerMisbehaved> for AlertDescription {
    fn from(e: &PeerMisbehaved) -> Self {
        use PeerMisbehaved::*;
        match e {
            IncorrectFinished => Self::DecryptError,
            InvalidServerKeyExchangeSignature => Self::DecodeError,
            SelectedUnofferedCipherSuite | SelectedUnusableCipherSuiteForVersion => {
                Self::InsufficientSecurity
            }
            SelectedUnofferedVersion | ResumptionOfferedWithVariedVersion => Self::ProtocolVersion,
            ResumptionOfferedWithVariedCipherSuite
            | SelectedUnofferedCompression
            | ServerKeyExchangeWithUnusableKey => Self::IllegalParameter,
        }
    }
}

#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Clone)]
/// The set of cases where we failed to make a connection because a peer
/// doesn't support a TLS version/feature we require.
///
/// This is `non_exhaustive`: we might add or stop using items here in minor
/// versions.
pub enum PeerIncompatible {
    ServerCertificateKeyNotRsa,
    ServerTlsVersionIsDisabledByOurConfig,
}

impl From<PeerIncompatible> for Error {
    #[inline]
    fn from(e: PeerIncompatible) -> Self {
        Self::PeerIncompatible(e)
    }
}

impl From<&PeerIncompatible> for AlertDescription {
    fn from(e: &PeerIncompatible) -> Self {
        match e {
            PeerIncompatible::ServerCertificateKeyNotRsa => Self::UnsupportedCertificate,
            PeerIncompatible::ServerTlsVersionIsDisabledByOurConfig => Self::ProtocolVersion,
        }
    }
}

/// One diagnostic raised while validating the server's certificate.
///
/// Each variant carries a stable numeric code (see [`CertificateError::code`])
/// so that callers can report failures the same way certificate stores on
/// other platforms do.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateError {
    /// The leaf's key usage does not allow the negotiated key exchange.
    InvalidPurpose,
    /// No subject name in the leaf matches the requested host.
    NotValidForName,
    /// A certificate in the chain is outside its validity period.
    Expired,
    /// A certificate's validity period does not nest within its issuer's.
    ValidityPeriodNesting,
    /// The chain could not be completed up to a root.
    IncompleteChain,
    /// The chain ends in a root we do not trust.
    UntrustedRoot,
    /// A certificate is not correctly signed by its issuer.
    BadSignature,
    /// A certificate violates basic constraints.
    BasicConstraints,
    /// A certificate in the chain has been revoked.
    Revoked,
    /// The chain does not allow server authentication.
    WrongUsage,
    /// The leaf certificate could not be parsed.
    BadEncoding,
    /// The application's validation hook rejected the chain.
    ApplicationVerificationFailure,
    /// Any other chain failure, with its numeric code.
    Other(i32),
}

impl CertificateError {
    /// The numeric diagnostic code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidPurpose => -2146762490,
            Self::NotValidForName => -2146762481,
            Self::Expired => -2146762495,
            Self::ValidityPeriodNesting => -2146762494,
            Self::IncompleteChain => -2146762486,
            Self::UntrustedRoot => -2146762487,
            Self::BadSignature => -2146869232,
            Self::BasicConstraints => -2146869223,
            Self::Revoked => -2146762484,
            Self::WrongUsage => -2146762480,
            Self::BadEncoding => -2146881269,
            Self::ApplicationVerificationFailure => -2146762485,
            Self::Other(code) => *code,
        }
    }
}

impl From<CertificateError> for AlertDescription {
    fn from(e: CertificateError) -> Self {
        use CertificateError::*;
        match e {
            InvalidPurpose | NotValidForName | BadEncoding | BadSignature | BasicConstraints
            | ValidityPeriodNesting | ApplicationVerificationFailure => Self::BadCertificate,
            Expired => Self::CertificateExpired,
            IncompleteChain | UntrustedRoot => Self::UnknownCA,
            Revoked => Self::CertificateRevoked,
            WrongUsage | Other(_) => Self::CertificateUnknown,
        }
    }
}

/// Why the server's certificate chain was refused.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateRejection {
    /// The alert chosen from the highest-priority failure.
    pub alert: AlertDescription,
    /// Every diagnostic found, in the order the checks ran.
    pub errors: Vec<CertificateError>,
}

impl CertificateRejection {
    /// Build a rejection whose alert follows from the first error.
    pub fn new(errors: Vec<CertificateError>) -> Self {
        let alert = errors
            .first()
            .map(|e| AlertDescription::from(*e))
            .unwrap_or(AlertDescription::BadCertificate);
        Self { alert, errors }
    }

    /// The numeric codes of every error, in order.
    pub fn codes(&self) -> Vec<i32> {
        self.errors.iter().map(|e| e.code()).collect()
    }
}

impl From<CertificateRejection> for Error {
    #[inline]
    fn from(e: CertificateRejection) -> Self {
        Self::InvalidCertificate(e)
    }
}

fn join<T: fmt::Debug>(items: &[T]) -> String {
    items
        .iter()
        .map(|x| format!("{:?}", x))
        .collect::<Vec<String>>()
        .join(" or ")
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::InappropriateMessage {
                ref expect_types,
                ref got_type,
            } => write!(
                f,
                "received unexpected message: got {:?} when expecting {}",
                got_type,
                join::<ContentType>(expect_types)
            ),
            Self::InappropriateHandshakeMessage {
                ref expect_types,
                ref got_type,
            } => write!(
                f,
                "received unexpected handshake message: got {:?} when expecting {}",
                got_type,
                join::<HandshakeType>(expect_types)
            ),
            Self::InvalidMessage(ref typ) => {
                write!(f, "received corrupt message of type {:?}", typ)
            }
            Self::PeerIncompatible(ref why) => write!(f, "peer is incompatible: {:?}", why),
            Self::PeerMisbehaved(PeerMisbehaved::IncorrectFinished) => {
                write!(f, "invalid Finished message")
            }
            Self::PeerMisbehaved(ref why) => write!(f, "peer misbehaved: {:?}", why),
            Self::AlertReceived(ref alert) => write!(f, "received fatal alert: {:?}", alert),
            Self::InvalidCertificate(ref rejection) => write!(
                f,
                "invalid peer certificate: {:?} (codes {:?})",
                rejection.errors,
                rejection.codes()
            ),
            Self::NoCertificatesPresented => write!(f, "peer sent no certificates"),
            Self::NoClientCertificate => write!(f, "no client certificate available"),
            Self::ClientKeyUnavailable => write!(f, "client private key unavailable"),
            Self::HandshakeAborted => write!(f, "handshake aborted"),
            Self::HandshakeNotComplete => write!(f, "handshake not complete"),
            Self::Transport(ref kind) => write!(f, "transport failed: {:?}", kind),
            Self::FailedToGetCurrentTime => write!(f, "failed to get current time"),
            Self::FailedToGetRandomBytes => write!(f, "failed to get random bytes"),
            Self::General(ref err) => write!(f, "unexpected error: {}", err),
        }
    }
}

impl From<SystemTimeError> for Error {
    #[inline]
    fn from(_: SystemTimeError) -> Self {
        Self::FailedToGetCurrentTime
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(e: io::Error) -> Self {
        Self::Transport(e.kind())
    }
}

impl StdError for Error {}

impl From<rand::GetRandomFailed> for Error {
    fn from(_: rand::GetRandomFailed) -> Self {
        Self::FailedToGetRandomBytes
    }
}

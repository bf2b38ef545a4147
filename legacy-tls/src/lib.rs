//! # legacy-tls - the client side of SSL 3.0 and TLS 1.0 handshakes
//!
//! legacy-tls negotiates a session with servers that speak nothing newer
//! than TLS 1.0.  It implements the handshake only: the record layer,
//! with its bulk ciphers and MACs, is left to the caller, who receives
//! the keys to install at each ChangeCipherSpec.
//!
//! ## Current features
//!
//! * SSL 3.0 and TLS 1.0, with the version-specific key derivation,
//!   Finished and CertificateVerify constructions of each.
//! * RSA key transport, including export suites with a signed ephemeral
//!   RSA key in ServerKeyExchange.
//! * Server certificate validation: key usage against the negotiated key
//!   exchange, host name matching with wildcards, and chain building to
//!   a set of roots via `rustls-webpki`.  An application hook sees every
//!   diagnostic and may override the outcome.
//! * SNI for TLS 1.0 connections to named hosts.
//! * Session resumption with server-assigned session ids.
//! * Client authentication, with keys that cannot sign raw digests
//!   supported by exporting their private parameters.
//!
//! ## Non-features
//!
//! * TLS 1.1 and later.
//! * Server-side handshakes.
//! * Renegotiation: HelloRequest is ignored.
//! * Compression.
//!
//! ## Getting started
//!
//! Build a [`ClientConfig`] once; then, per connection, either drive a
//! [`ClientHandshake`] yourself, feeding it messages from your record
//! layer, or hand a [`RecordTransport`] to [`complete_handshake`].
//!
//! ```no_run
//! # fn transport() -> Box<dyn legacy_tls::RecordTransport> { unimplemented!() }
//! use std::sync::Arc;
//! use legacy_tls::{complete_handshake, ClientConfig, RootCertStore};
//!
//! let mut roots = RootCertStore::empty();
//! # let ca_der = pki_types::CertificateDer::from(&b""[..]);
//! roots.add(ca_der).unwrap();
//!
//! let config = Arc::new(
//!     ClientConfig::builder()
//!         .with_safe_defaults()
//!         .with_root_certificates(roots)
//!         .with_no_client_auth(),
//! );
//!
//! let mut transport = transport();
//! let session = complete_handshake(config, "example.com", transport.as_mut()).unwrap();
//! println!("negotiated {:?}", session.cipher_suite());
//! ```
//!
//! ## Crate features
//!
//! - `logging`: this makes the library log via the `log` crate.  This is
//!   enabled by default.

// Require docs for public APIs, deny unsafe code, etc.
#![forbid(unsafe_code, unused_must_use)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::use_self,
    trivial_casts,
    trivial_numeric_casts,
    missing_docs,
    unused_import_braces,
    unused_extern_crates,
    unused_qualifications
)]
// Relax these clippy lints:
// - too_many_arguments: some things just need a lot of state, wrapping it
//   doesn't necessarily make it easier to follow what's going on
// - new_without_default: for internal constructors, the indirection is not
//   helpful
#![allow(clippy::too_many_arguments, clippy::new_without_default)]
// Enable documentation for all features on docs.rs
#![cfg_attr(docsrs, feature(doc_cfg))]

// log for logging (optional).
#[cfg(feature = "logging")]
#[macro_use]
extern crate log;

#[cfg(not(feature = "logging"))]
#[macro_use]
mod log {
    macro_rules! trace    ( ($($tt:tt)*) => {{}} );
    macro_rules! debug    ( ($($tt:tt)*) => {{}} );
    macro_rules! warn     ( ($($tt:tt)*) => {{}} );
    macro_rules! error    ( ($($tt:tt)*) => {{}} );
}

#[macro_use]
mod msgs;
#[macro_use]
mod check;
mod builder;
mod enums;
mod error;
mod hash_hs;
mod limited_cache;
mod rand;
mod secrets;
mod ssl3;
mod stream;
mod tls10;
mod verify;
mod webpki;

/// Internal classes which may be useful outside the library.
/// The contents of this section DO NOT form part of the stable interface.
pub mod internal {
    /// Low-level handshake message parsing and encoding functions.
    pub mod msgs {
        pub use crate::msgs::*;
    }
    /// Key derivation and the handshake digests built on it.
    pub mod secrets {
        pub use crate::hash_hs::HandshakeTranscript;
        pub use crate::secrets::{premaster_secret, ConnectionRandoms, ConnectionSecrets};
    }
}

// The public interface is:
pub use crate::builder::{
    ConfigBuilder, ConfigSide, WantsCipherSuites, WantsVerifier, WantsVersions,
};
pub use crate::enums::{
    AlertDescription, AlertLevel, CipherSuite, ContentType, HandshakeType, ProtocolVersion,
};
pub use crate::error::{
    CertificateError, CertificateRejection, Error, InvalidMessage, PeerIncompatible,
    PeerMisbehaved,
};
pub use crate::msgs::enums::ClientCertificateType;
pub use crate::secrets::{DirectionKeys, SessionKeys};
pub use crate::stream::{complete_handshake, RecordTransport};
pub use crate::suites::{
    BulkAlgorithm, KeyExchangeAlgorithm, MacAlgorithm, SupportedCipherSuite, ALL_CIPHER_SUITES,
    DEFAULT_CIPHER_SUITES,
};
pub use crate::verify::{
    match_hostname, CertificateValidator, ChainBuilder, ChainStatus, ServerCertValidationHook,
};
pub use crate::versions::{SupportedProtocolVersion, ALL_VERSIONS, DEFAULT_VERSIONS};
pub use crate::webpki::{RootCertStore, WebPkiChainBuilder};

/// Items for use in a client.
pub mod client;
pub use client::{
    ClientConfig, ClientHandshake, ClientSessionMemoryCache, EstablishedSession, Inbound, Output,
    Phase,
};

/// Cryptographic collaborators.
pub mod crypto;

/// Message signing interfaces.
pub mod sign;

/// All defined cipher suites are listed here.
pub mod suites;

pub mod time_provider;

/// All defined protocol versions are listed here.
pub mod versions;

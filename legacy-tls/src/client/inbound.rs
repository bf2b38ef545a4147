//! Processing of the messages a server sends.
//!
//! Each function checks an already-decoded message against what we
//! offered and what has been negotiated so far, and only then records
//! its effect in the [`Context`].

use md5::{Digest, Md5};
use pki_types::UnixTime;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use x509_parser::prelude::FromDer;
use x509_parser::x509::X509Name;

use crate::client::{AcceptableIssuer, ClientAuthRequest, Context};
use crate::crypto::rsa::PeerRsaKey;
use crate::enums::ProtocolVersion;
use crate::error::{Error, InvalidMessage, PeerIncompatible, PeerMisbehaved};
use crate::msgs::base::Payload;
use crate::msgs::codec::Codec;
use crate::msgs::enums::Compression;
use crate::msgs::handshake::{
    CertificateChain, CertificateRequestPayload, ServerHelloPayload, ServerKeyExchangePayload,
};
use crate::secrets::{ConnectionRandoms, ConnectionSecrets};
use crate::suites::SupportedCipherSuite;
use crate::verify;

/// The smallest ephemeral key that can carry a premaster secret.
const MIN_EPHEMERAL_KEY_BITS: usize = 512;

/// What a ServerHello settled.
pub(super) struct Negotiated {
    pub(super) version: ProtocolVersion,
    pub(super) suite: &'static SupportedCipherSuite,
    pub(super) randoms: ConnectionRandoms,
    /// Set when the server agreed to resume the offered session.
    pub(super) resumed: Option<ConnectionSecrets>,
}

pub(super) fn process_server_hello(
    ctx: &mut Context,
    server_hello: &ServerHelloPayload,
) -> Result<Negotiated, Error> {
    let version = server_hello.server_version;
    if version > ctx.offered_version() {
        return Err(PeerMisbehaved::SelectedUnofferedVersion.into());
    }
    if !ctx.config.versions.contains(version) {
        return Err(PeerIncompatible::ServerTlsVersionIsDisabledByOurConfig.into());
    }

    if server_hello.compression_method != Compression::Null {
        return Err(PeerMisbehaved::SelectedUnofferedCompression.into());
    }

    let suite = ctx
        .offered_cipher_suites()
        .iter()
        .copied()
        .find(|scs| scs.suite == server_hello.cipher_suite)
        .ok_or(PeerMisbehaved::SelectedUnofferedCipherSuite)?;
    if !suite.usable_for_version(version) {
        return Err(PeerMisbehaved::SelectedUnusableCipherSuiteForVersion.into());
    }

    let randoms = ConnectionRandoms::new(*ctx.client_random(), server_hello.random.0);

    // An echo of the id we offered means the server wants to resume.
    let resumed = match ctx.offered_session() {
        Some(session) if !session.session_id().is_empty()
            && *session.session_id() == server_hello.session_id =>
        {
            if session.version() != version {
                return Err(PeerMisbehaved::ResumptionOfferedWithVariedVersion.into());
            }
            if session.suite() != suite.suite {
                return Err(PeerMisbehaved::ResumptionOfferedWithVariedCipherSuite.into());
            }
            Some(ConnectionSecrets::new_resume(
                randoms,
                suite,
                version,
                session.master_secret(),
            ))
        }
        _ => None,
    };

    debug!(
        "Using {:?} with {:?}, resuming: {}",
        version,
        suite.suite,
        resumed.is_some()
    );
    ctx.set_server_hello(version, randoms, server_hello.session_id, suite);
    if resumed.is_some() {
        ctx.set_resuming();
    }

    Ok(Negotiated {
        version,
        suite,
        randoms,
        resumed,
    })
}

/// Validate the server's chain and return the key its leaf certifies.
pub(super) fn process_server_certificate(
    ctx: &mut Context,
    chain: &CertificateChain,
    suite: &'static SupportedCipherSuite,
    now: UnixTime,
) -> Result<PeerRsaKey, Error> {
    let end_entity = chain
        .0
        .first()
        .ok_or(Error::NoCertificatesPresented)?;

    ctx.config
        .validator()
        .validate(&chain.0, ctx.host(), suite.kx, now)?;
    let key = verify::end_entity_rsa_key(end_entity)?;
    debug!(
        "Server certificate chain of {} accepted, {}-bit key",
        chain.0.len(),
        key.bits()
    );

    ctx.set_server_cert_chain(chain.0.clone());
    Ok(key)
}

/// Check the export ServerKeyExchange was signed by `cert_key` and
/// return the ephemeral key it carries.
pub(super) fn process_server_kx(
    skx: &ServerKeyExchangePayload,
    randoms: &ConnectionRandoms,
    cert_key: &PeerRsaKey,
) -> Result<PeerRsaKey, Error> {
    let mut message = randoms.client_server().to_vec();
    skx.params.encode(&mut message);

    let mut digest = Md5::digest(&message).to_vec();
    digest.extend_from_slice(&Sha1::digest(&message));

    if !cert_key.verify_unprefixed(&digest, &skx.signature.0) {
        warn!("ServerKeyExchange signature does not verify");
        return Err(PeerMisbehaved::InvalidServerKeyExchangeSignature.into());
    }

    let key = PeerRsaKey::from_components(&skx.params.modulus.0, &skx.params.exponent.0)?;
    if key.bits() < MIN_EPHEMERAL_KEY_BITS {
        return Err(PeerMisbehaved::ServerKeyExchangeWithUnusableKey.into());
    }

    debug!("Using {}-bit ephemeral RSA key", key.bits());
    Ok(key)
}

pub(super) fn process_certificate_request(
    ctx: &mut Context,
    certreq: &CertificateRequestPayload,
) -> Result<(), Error> {
    let issuers = certreq
        .canames
        .iter()
        .map(|dn| {
            let (_, name) = X509Name::from_der(dn.as_ref())
                .map_err(|_| InvalidMessage::InvalidDistinguishedName)?;
            Ok(AcceptableIssuer {
                der: dn.as_ref().to_vec(),
                name: name.to_string(),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    debug!(
        "Server asks for a certificate of types {:?} from {:?}",
        certreq.certtypes,
        issuers
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>()
    );

    ctx.set_client_auth(ClientAuthRequest {
        certificate_types: certreq.certtypes.clone(),
        issuers,
    });
    Ok(())
}

/// Check the server's Finished against the transcript so far.
pub(super) fn verify_server_finished(
    ctx: &Context,
    secrets: &ConnectionSecrets,
    finished: &Payload<'_>,
) -> Result<(), Error> {
    let expect_verify_data = secrets.server_verify_data(ctx.handshake_transcript());

    // Constant-time verification of this is relatively unimportant: they only
    // get one chance.  But it can't hurt.
    if !bool::from(expect_verify_data.ct_eq(finished.bytes())) {
        warn!("Server Finished does not verify");
        return Err(PeerMisbehaved::IncorrectFinished.into());
    }

    Ok(())
}

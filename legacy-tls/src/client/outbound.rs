//! The messages a client sends.
//!
//! Each `emit_*` function builds one message at the version currently in
//! force, adds it to the transcript, and queues its encoding.

use std::net::IpAddr;
use std::sync::Arc;

use pki_types::DnsName;

use crate::client::client_conn::Output;
use crate::client::Context;
use crate::crypto::rsa::PeerRsaKey;
use crate::enums::{HandshakeType, ProtocolVersion};
use crate::error::Error;
use crate::msgs::base::{Payload, PayloadU16};
use crate::msgs::enums::Compression;
use crate::msgs::handshake::{
    CertificateChain, ClientExtension, ClientHelloPayload, HandshakeMessagePayload,
    HandshakePayload, Random,
};
use crate::msgs::message::Message;
use crate::secrets::{self, ConnectionRandoms, ConnectionSecrets, SessionKeys};
use crate::sign::{self, CertifiedKey};
use crate::suites::SupportedCipherSuite;

fn send(ctx: &mut Context, out: &mut Vec<Output>, typ: HandshakeType, payload: HandshakePayload) {
    let m = Message::build_handshake(
        ctx.current_version(),
        HandshakeMessagePayload { typ, payload },
    );
    trace!("Sending {:?}", m);
    ctx.add_message(&m);
    out.push(Output::Handshake(m.encoded_payload()));
}

/// The `server_name` extension to send, if any.
///
/// SSL3 has no extensions, and RFC 3546 forbids literal addresses.
fn sni_extension(ctx: &Context) -> Option<ClientExtension> {
    if !ctx.config.enable_sni || ctx.offered_version() != ProtocolVersion::TLSv1_0 {
        return None;
    }
    if ctx.host().parse::<IpAddr>().is_ok() {
        return None;
    }

    match DnsName::try_from(ctx.host()) {
        Ok(name) => Some(ClientExtension::make_sni(name.to_owned())),
        Err(_) => {
            debug!("not sending SNI for {:?}: not a DNS name", ctx.host());
            None
        }
    }
}

pub(super) fn client_hello(ctx: &Context) -> ClientHelloPayload {
    ClientHelloPayload {
        client_version: ctx.offered_version(),
        random: Random::from(*ctx.client_random()),
        session_id: *ctx.session_id(),
        cipher_suites: ctx
            .offered_cipher_suites()
            .iter()
            .map(|scs| scs.suite)
            .collect(),
        compression_methods: vec![Compression::Null],
        extensions: sni_extension(ctx).into_iter().collect(),
    }
}

pub(super) fn emit_client_hello(ctx: &mut Context, out: &mut Vec<Output>) {
    let hello = client_hello(ctx);
    debug!(
        "Offering {:?} with {} suites, session id {:?}",
        hello.client_version,
        hello.cipher_suites.len(),
        hello.session_id
    );
    send(ctx, out, HandshakeType::ClientHello, HandshakePayload::ClientHello(hello));
}

pub(super) fn emit_certificate(ctx: &mut Context, certkey: &CertifiedKey, out: &mut Vec<Output>) {
    let chain = CertificateChain(certkey.cert.clone());
    send(ctx, out, HandshakeType::Certificate, HandshakePayload::Certificate(chain));
}

/// Send a fresh premaster secret encrypted to `server_key`, and derive
/// the connection's secrets from it.
pub(super) fn emit_clientkx(
    ctx: &mut Context,
    server_key: &PeerRsaKey,
    randoms: ConnectionRandoms,
    suite: &'static SupportedCipherSuite,
    version: ProtocolVersion,
    out: &mut Vec<Output>,
) -> Result<ConnectionSecrets, Error> {
    // the premaster names the version we offered, not the one negotiated
    let secure_random = ctx.config.secure_random.as_ref();
    let pms = secrets::premaster_secret(ctx.offered_version(), secure_random)?;
    let encrypted = server_key.encrypt_pkcs1(secure_random, &pms[..])?;

    send(
        ctx,
        out,
        HandshakeType::ClientKeyExchange,
        HandshakePayload::ClientKeyExchange(Payload::new(encrypted)),
    );

    Ok(ConnectionSecrets::from_premaster(&pms[..], randoms, suite, version))
}

pub(super) fn emit_certverify(
    ctx: &mut Context,
    secrets: &ConnectionSecrets,
    certkey: &CertifiedKey,
    out: &mut Vec<Output>,
) -> Result<(), Error> {
    let digest = secrets.certificate_verify_digest(ctx.handshake_transcript());
    let signature = sign::sign_digest_with_fallback(certkey.key.as_ref(), &digest)?;

    send(
        ctx,
        out,
        HandshakeType::CertificateVerify,
        HandshakePayload::CertificateVerify(PayloadU16::new(signature)),
    );
    Ok(())
}

pub(super) fn emit_ccs(keys: &Arc<SessionKeys>, out: &mut Vec<Output>) {
    // ChangeCipherSpec is not a handshake message: no transcript update
    out.push(Output::ChangeCipherSpec(keys.clone()));
}

pub(super) fn emit_finished(ctx: &mut Context, secrets: &ConnectionSecrets, out: &mut Vec<Output>) {
    let verify_data = secrets.client_verify_data(ctx.handshake_transcript());
    send(
        ctx,
        out,
        HandshakeType::Finished,
        HandshakePayload::Finished(Payload::new(verify_data)),
    );
}

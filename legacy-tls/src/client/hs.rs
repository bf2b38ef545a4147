use std::sync::Arc;

use pki_types::UnixTime;

use crate::check::{check_message, inappropriate_message};
use crate::client::client_conn::{Output, Phase};
use crate::client::{inbound, outbound, ClientConfig, Context, EstablishedSession};
use crate::crypto::rsa::PeerRsaKey;
use crate::enums::{ContentType, HandshakeType, ProtocolVersion};
use crate::error::Error;
use crate::msgs::handshake::{HandshakePayload, Random};
use crate::msgs::message::{Message, MessagePayload};
use crate::msgs::persist::ClientSessionValue;
use crate::secrets::{ConnectionRandoms, ConnectionSecrets, SessionKeys};
use crate::suites::SupportedCipherSuite;

pub(super) type NextState = Box<dyn State>;
pub(super) type NextStateOrError = Result<NextState, Error>;

/// One state of the client handshake.
///
/// Each state owns the [`Context`] and whatever secrets have been
/// derived so far, and is consumed by the message that ends it.
pub(super) trait State: Send + Sync {
    /// Process `m`, queueing anything to send on `out`.
    fn handle(self: Box<Self>, out: &mut Vec<Output>, m: Message) -> NextStateOrError;

    /// Send the first flight.  Only the initial state has one.
    fn start(self: Box<Self>, _out: &mut Vec<Output>) -> NextStateOrError {
        Err(Error::General("handshake already started".into()))
    }

    fn phase(&self) -> Phase;

    fn context(&self) -> &Context;

    fn established(&self) -> Option<&EstablishedSession> {
        None
    }
}

/// The cached session to offer to `host`, if it is still usable.
fn find_session(config: &ClientConfig, host: &str, now: UnixTime) -> Option<ClientSessionValue> {
    let session = config.session_storage.session(host)?;

    let usable = session.is_fresh(now)
        && config.supports_version(session.version())
        && config
            .find_cipher_suite(session.suite())
            .map(|scs| scs.usable_for_version(session.version()))
            .unwrap_or(false);

    if !usable {
        debug!("Cached session for {:?} is no longer usable", host);
        config.session_storage.remove_session(host);
        return None;
    }

    debug!("Offering cached session {:?}", session.session_id());
    Some(session)
}

pub(super) struct Start {
    ctx: Context,
}

impl Start {
    pub(super) fn new(config: Arc<ClientConfig>, host: &str) -> Result<Self, Error> {
        let now = config.current_time()?;
        let random = Random::new(config.secure_random.as_ref(), now)?;
        let session = find_session(&config, host, now);
        if session.is_none() {
            debug!("No cached session for {:?}", host);
        }

        Ok(Self {
            ctx: Context::new(config, host.to_owned(), random, session),
        })
    }
}

impl State for Start {
    fn handle(self: Box<Self>, _out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        Err(inappropriate_message(&m, &[]))
    }

    fn start(mut self: Box<Self>, out: &mut Vec<Output>) -> NextStateOrError {
        outbound::emit_client_hello(&mut self.ctx, out);
        Ok(Box::new(ExpectServerHello { ctx: self.ctx }))
    }

    fn phase(&self) -> Phase {
        Phase::Start
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

struct ExpectServerHello {
    ctx: Context,
}

impl State for ExpectServerHello {
    fn handle(mut self: Box<Self>, _out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        let server_hello =
            require_handshake_msg!(m, HandshakeType::ServerHello, HandshakePayload::ServerHello)?;
        trace!("We got ServerHello {:#?}", server_hello);

        let negotiated = inbound::process_server_hello(&mut self.ctx, server_hello)?;
        self.ctx.add_message(&m);

        let inbound::Negotiated {
            version,
            suite,
            randoms,
            resumed,
        } = negotiated;

        // If the server echoed our session id, it will send
        // ChangeCipherSpec and Finished straight away.
        if let Some(secrets) = resumed {
            return Ok(Box::new(ExpectCcs {
                ctx: self.ctx,
                keys: Arc::new(secrets.session_keys()),
                secrets,
                version,
                suite,
                resuming: true,
                phase: Phase::HelloReceived,
            }));
        }

        Ok(Box::new(ExpectCertificate {
            ctx: self.ctx,
            version,
            suite,
            randoms,
        }))
    }

    fn phase(&self) -> Phase {
        Phase::HelloSent
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

struct ExpectCertificate {
    ctx: Context,
    version: ProtocolVersion,
    suite: &'static SupportedCipherSuite,
    randoms: ConnectionRandoms,
}

impl State for ExpectCertificate {
    fn handle(mut self: Box<Self>, _out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        let chain =
            require_handshake_msg!(m, HandshakeType::Certificate, HandshakePayload::Certificate)?;

        let now = self.ctx.config.current_time()?;
        let cert_key = inbound::process_server_certificate(&mut self.ctx, chain, self.suite, now)?;
        self.ctx.add_message(&m);

        if self.suite.uses_server_key_exchange() {
            Ok(Box::new(ExpectServerKx {
                ctx: self.ctx,
                version: self.version,
                suite: self.suite,
                randoms: self.randoms,
                cert_key,
            }))
        } else {
            Ok(Box::new(ExpectServerDoneOrCertReq {
                ctx: self.ctx,
                version: self.version,
                suite: self.suite,
                randoms: self.randoms,
                server_key: cert_key,
            }))
        }
    }

    fn phase(&self) -> Phase {
        Phase::HelloReceived
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

// --- An export suite's ServerKeyExchange, or straight on. ---
// A server whose certificate key is small enough to use directly
// may skip the ServerKeyExchange.
struct ExpectServerKx {
    ctx: Context,
    version: ProtocolVersion,
    suite: &'static SupportedCipherSuite,
    randoms: ConnectionRandoms,
    cert_key: PeerRsaKey,
}

impl State for ExpectServerKx {
    fn handle(mut self: Box<Self>, out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        if !m.is_handshake_type(HandshakeType::ServerKeyExchange) {
            return Box::new(ExpectServerDoneOrCertReq {
                ctx: self.ctx,
                version: self.version,
                suite: self.suite,
                randoms: self.randoms,
                server_key: self.cert_key,
            })
            .handle(out, m);
        }

        let skx = require_handshake_msg!(
            m,
            HandshakeType::ServerKeyExchange,
            HandshakePayload::ServerKeyExchange
        )?;
        let server_key = inbound::process_server_kx(skx, &self.randoms, &self.cert_key)?;
        self.ctx.add_message(&m);

        Ok(Box::new(ExpectServerDoneOrCertReq {
            ctx: self.ctx,
            version: self.version,
            suite: self.suite,
            randoms: self.randoms,
            server_key,
        }))
    }

    fn phase(&self) -> Phase {
        Phase::CertificateExchanged
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

// --- Either a CertificateRequest, or a ServerHelloDone. ---
// Existence of the CertificateRequest tells us the server is asking for
// client auth.  Otherwise we go straight to ServerHelloDone.
struct ExpectServerDoneOrCertReq {
    ctx: Context,
    version: ProtocolVersion,
    suite: &'static SupportedCipherSuite,
    randoms: ConnectionRandoms,
    /// The key our premaster secret will be encrypted to.
    server_key: PeerRsaKey,
}

impl State for ExpectServerDoneOrCertReq {
    fn handle(mut self: Box<Self>, out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        if m.is_handshake_type(HandshakeType::CertificateRequest) {
            let certreq = require_handshake_msg!(
                m,
                HandshakeType::CertificateRequest,
                HandshakePayload::CertificateRequest
            )?;
            inbound::process_certificate_request(&mut self.ctx, certreq)?;
            self.ctx.add_message(&m);

            Ok(Box::new(ExpectServerDone {
                ctx: self.ctx,
                version: self.version,
                suite: self.suite,
                randoms: self.randoms,
                server_key: self.server_key,
            }))
        } else {
            Box::new(ExpectServerDone {
                ctx: self.ctx,
                version: self.version,
                suite: self.suite,
                randoms: self.randoms,
                server_key: self.server_key,
            })
            .handle(out, m)
        }
    }

    fn phase(&self) -> Phase {
        Phase::CertificateExchanged
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

struct ExpectServerDone {
    ctx: Context,
    version: ProtocolVersion,
    suite: &'static SupportedCipherSuite,
    randoms: ConnectionRandoms,
    server_key: PeerRsaKey,
}

impl State for ExpectServerDone {
    fn handle(self: Box<Self>, out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        check_message(&m, &[ContentType::Handshake], &[HandshakeType::ServerHelloDone])?;

        let mut st = *self;
        st.ctx.add_message(&m);

        debug!("Server cert is {:?}", st.ctx.server_certificate_chain());

        // 1. If doing client auth, send our Certificate.
        // 2. Complete the key exchange:
        //   a) send our premaster secret in ClientKeyExchange,
        //   b) derive the master secret and key block,
        //   c) if we sent a Certificate, prove we hold its key in CertificateVerify,
        //   d) send ChangeCipherSpec.
        // 3. Send Finished, our first message under the new keys.

        // 1.
        let certkey = match st.ctx.client_auth() {
            Some(request) => {
                if !st.ctx.config.has_client_certs() {
                    warn!("Server asked for a certificate; none configured");
                    return Err(Error::NoClientCertificate);
                }
                let certkey = st
                    .ctx
                    .config
                    .client_auth_cert_resolver
                    .resolve(request)
                    .ok_or_else(|| {
                        warn!("No client certificate chosen for {:?}", request);
                        Error::NoClientCertificate
                    })?;
                outbound::emit_certificate(&mut st.ctx, &certkey, out);
                st.ctx.set_selected_client_cert(certkey.clone());
                Some(certkey)
            }
            None => None,
        };

        // 2a, 2b.
        let secrets = outbound::emit_clientkx(
            &mut st.ctx,
            &st.server_key,
            st.randoms,
            st.suite,
            st.version,
            out,
        )?;

        // 2c.
        let phase = match &certkey {
            Some(certkey) => {
                outbound::emit_certverify(&mut st.ctx, &secrets, certkey, out)?;
                Phase::CertificateVerified
            }
            None => Phase::KeyExchanged,
        };

        // 2d.
        let keys = Arc::new(secrets.session_keys());
        outbound::emit_ccs(&keys, out);

        // 3.
        outbound::emit_finished(&mut st.ctx, &secrets, out);

        Ok(Box::new(ExpectCcs {
            ctx: st.ctx,
            secrets,
            keys,
            version: st.version,
            suite: st.suite,
            resuming: false,
            phase,
        }))
    }

    fn phase(&self) -> Phase {
        Phase::CertificateExchanged
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

struct ExpectCcs {
    ctx: Context,
    secrets: ConnectionSecrets,
    keys: Arc<SessionKeys>,
    version: ProtocolVersion,
    suite: &'static SupportedCipherSuite,
    resuming: bool,
    /// How far the handshake got before waiting for the server.
    phase: Phase,
}

impl ExpectCcs {
    fn into_expect_finished(self) -> NextState {
        Box::new(ExpectFinished {
            ctx: self.ctx,
            secrets: self.secrets,
            keys: self.keys,
            version: self.version,
            suite: self.suite,
            resuming: self.resuming,
        })
    }
}

impl State for ExpectCcs {
    fn handle(self: Box<Self>, out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        check_message(&m, &[ContentType::ChangeCipherSpec], &[])?;

        // nb. msgs layer validates trivial contents of CCS
        out.push(Output::StartDecrypting(self.keys.clone()));

        Ok(self.into_expect_finished())
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

// -- Waiting for their finished --
fn save_session(ctx: &Context, secrets: &ConnectionSecrets, version: ProtocolVersion) {
    let host = ctx.host();
    if ctx.session_id().is_empty() {
        debug!("Session not saved: server didn't allocate id");
        if ctx.offered_session().is_some() {
            ctx.config.session_storage.remove_session(host);
        }
        return;
    }

    let now = match ctx.config.current_time() {
        Ok(now) => now,
        Err(_) => {
            debug!("Session not saved: could not get current time");
            return;
        }
    };

    let value = ClientSessionValue::new(
        version,
        secrets.suite().suite,
        *ctx.session_id(),
        secrets.master_secret(),
        ctx.shared_server_cert_chain(),
        now,
    );

    ctx.config
        .session_storage
        .set_session(host, value);
    debug!("Session saved for {:?}", host);
}

struct ExpectFinished {
    ctx: Context,
    secrets: ConnectionSecrets,
    keys: Arc<SessionKeys>,
    version: ProtocolVersion,
    suite: &'static SupportedCipherSuite,
    resuming: bool,
}

impl State for ExpectFinished {
    fn handle(self: Box<Self>, out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        let mut st = *self;
        let finished =
            require_handshake_msg!(m, HandshakeType::Finished, HandshakePayload::Finished)?;

        inbound::verify_server_finished(&st.ctx, &st.secrets, finished)?;

        // Hash this message too.
        st.ctx.add_message(&m);

        if st.resuming {
            outbound::emit_ccs(&st.keys, out);
            outbound::emit_finished(&mut st.ctx, &st.secrets, out);
        } else {
            save_session(&st.ctx, &st.secrets, st.version);
        }

        debug!(
            "Handshake complete: {:?} {:?}, resumed: {}",
            st.version, st.suite.suite, st.resuming
        );
        let session = EstablishedSession::new(st.version, st.suite, &st.ctx, st.keys);
        Ok(Box::new(Established {
            ctx: st.ctx,
            session,
        }))
    }

    fn phase(&self) -> Phase {
        Phase::ChangeCipherSpec
    }

    fn context(&self) -> &Context {
        &self.ctx
    }
}

struct Established {
    ctx: Context,
    session: EstablishedSession,
}

impl State for Established {
    fn handle(self: Box<Self>, _out: &mut Vec<Output>, m: Message) -> NextStateOrError {
        Err(inappropriate_message(&m, &[]))
    }

    fn phase(&self) -> Phase {
        Phase::Finished
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn established(&self) -> Option<&EstablishedSession> {
        Some(&self.session)
    }
}

use std::fmt;
use std::sync::Arc;

use pki_types::CertificateDer;

use crate::client::ClientConfig;
use crate::enums::ProtocolVersion;
use crate::hash_hs::HandshakeTranscript;
use crate::msgs::enums::ClientCertificateType;
use crate::msgs::handshake::{Random, SessionId};
use crate::msgs::message::Message;
use crate::msgs::persist::ClientSessionValue;
use crate::secrets::{ConnectionRandoms, SessionKeys};
use crate::sign::CertifiedKey;
use crate::suites::SupportedCipherSuite;

/// An issuer the server will accept client certificates from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptableIssuer {
    /// The DER encoding of the issuer's X.500 name, including the outer
    /// `SEQUENCE`.
    pub der: Vec<u8>,
    /// The same name in display form, such as `O=Example, CN=Example CA`.
    pub name: String,
}

/// What a server asked for in its CertificateRequest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientAuthRequest {
    /// The certificate types the server accepts.
    pub certificate_types: Vec<ClientCertificateType>,
    /// The issuers the server accepts, in the order it listed them.
    pub issuers: Vec<AcceptableIssuer>,
}

/// Negotiation state of one handshake attempt.
///
/// A `Context` is created when the handshake starts and moves through
/// every state of the handshake; each message updates it exactly once.
/// Derived secrets are not kept here but alongside it in the states
/// that need them.
pub struct Context {
    pub(super) config: Arc<ClientConfig>,
    host: String,
    offered_version: ProtocolVersion,
    offered_suites: Vec<&'static SupportedCipherSuite>,
    offered_session: Option<ClientSessionValue>,
    client_random: Random,
    protocol_version: Option<ProtocolVersion>,
    randoms: Option<ConnectionRandoms>,
    session_id: SessionId,
    negotiated_suite: Option<&'static SupportedCipherSuite>,
    resuming: bool,
    transcript: HandshakeTranscript,
    client_auth: Option<ClientAuthRequest>,
    selected_client_cert: Option<Arc<CertifiedKey>>,
    server_cert_chain: Arc<Vec<CertificateDer<'static>>>,
}

impl Context {
    pub(super) fn new(
        config: Arc<ClientConfig>,
        host: String,
        client_random: Random,
        offered_session: Option<ClientSessionValue>,
    ) -> Self {
        let offered_version = config.versions.max();
        let offered_suites = config
            .cipher_suites
            .iter()
            .copied()
            .filter(|scs| scs.usable_for_version(offered_version))
            .collect();
        let session_id = offered_session
            .as_ref()
            .map(|s| *s.session_id())
            .unwrap_or_else(SessionId::empty);

        Self {
            config,
            host,
            offered_version,
            offered_suites,
            offered_session,
            client_random,
            protocol_version: None,
            randoms: None,
            session_id,
            negotiated_suite: None,
            resuming: false,
            transcript: HandshakeTranscript::new(),
            client_auth: None,
            selected_client_cert: None,
            server_cert_chain: Arc::new(Vec::new()),
        }
    }

    /// The host this handshake is authenticating.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The version our ClientHello offered.
    pub fn offered_version(&self) -> ProtocolVersion {
        self.offered_version
    }

    /// The suites our ClientHello offered, in preference order.
    pub fn offered_cipher_suites(&self) -> &[&'static SupportedCipherSuite] {
        &self.offered_suites
    }

    /// The version the server chose, once its ServerHello has been processed.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.protocol_version
    }

    /// Our hello random.
    pub fn client_random(&self) -> &[u8; 32] {
        &self.client_random.0
    }

    /// The server's hello random, once known.
    pub fn server_random(&self) -> Option<&[u8; 32]> {
        self.randoms.as_ref().map(|r| &r.server)
    }

    /// Before ServerHello, the session id we offered; afterwards, the one
    /// the server assigned.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The suite the server chose.
    pub fn negotiated_cipher_suite(&self) -> Option<&'static SupportedCipherSuite> {
        self.negotiated_suite
    }

    /// Whether the server agreed to resume our cached session.
    pub fn is_resuming(&self) -> bool {
        self.resuming
    }

    /// Whether the server asked us for a certificate.
    pub fn client_certificate_requested(&self) -> bool {
        self.client_auth.is_some()
    }

    /// What the server's CertificateRequest asked for.
    pub fn client_auth(&self) -> Option<&ClientAuthRequest> {
        self.client_auth.as_ref()
    }

    /// The certificate chain we sent to the server, if any.
    pub fn selected_client_certificate(&self) -> Option<&[CertificateDer<'static>]> {
        self.selected_client_cert
            .as_ref()
            .map(|ck| ck.cert.as_slice())
    }

    /// The server's certificate chain, leaf first.  For a resumed session,
    /// the chain cached with it.
    pub fn server_certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.server_cert_chain
    }

    /// Every handshake message exchanged so far, as sent on the wire.
    pub fn transcript(&self) -> &[u8] {
        self.transcript.bytes()
    }

    pub(super) fn offered_session(&self) -> Option<&ClientSessionValue> {
        self.offered_session.as_ref()
    }

    pub(super) fn handshake_transcript(&self) -> &HandshakeTranscript {
        &self.transcript
    }

    /// The version records and messages use right now.
    pub(super) fn current_version(&self) -> ProtocolVersion {
        self.protocol_version
            .unwrap_or(self.offered_version)
    }

    pub(super) fn add_message(&mut self, m: &Message) {
        self.transcript.add_message(m);
    }

    pub(super) fn set_server_hello(
        &mut self,
        version: ProtocolVersion,
        randoms: ConnectionRandoms,
        session_id: SessionId,
        suite: &'static SupportedCipherSuite,
    ) {
        self.protocol_version = Some(version);
        self.randoms = Some(randoms);
        self.session_id = session_id;
        self.negotiated_suite = Some(suite);
        // only suites usable at the negotiated version remain candidates
        self.offered_suites
            .retain(|scs| scs.usable_for_version(version));
    }

    pub(super) fn set_resuming(&mut self) {
        self.resuming = true;
        if let Some(session) = &self.offered_session {
            self.server_cert_chain = session.server_cert_chain().clone();
        }
    }

    pub(super) fn set_server_cert_chain(&mut self, chain: Vec<CertificateDer<'static>>) {
        self.server_cert_chain = Arc::new(chain);
    }

    pub(super) fn shared_server_cert_chain(&self) -> Arc<Vec<CertificateDer<'static>>> {
        self.server_cert_chain.clone()
    }

    pub(super) fn set_client_auth(&mut self, request: ClientAuthRequest) {
        self.client_auth = Some(request);
    }

    pub(super) fn set_selected_client_cert(&mut self, certkey: Arc<CertifiedKey>) {
        self.selected_client_cert = Some(certkey);
    }

    pub(super) fn selected_client_cert(&self) -> Option<&Arc<CertifiedKey>> {
        self.selected_client_cert.as_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("host", &self.host)
            .field("offered_version", &self.offered_version)
            .field("protocol_version", &self.protocol_version)
            .field("session_id", &self.session_id)
            .field("negotiated_suite", &self.negotiated_suite)
            .field("resuming", &self.resuming)
            .field("client_auth", &self.client_auth)
            .finish_non_exhaustive()
    }
}

/// The outcome of a completed handshake.
#[derive(Clone, Debug)]
pub struct EstablishedSession {
    version: ProtocolVersion,
    suite: &'static SupportedCipherSuite,
    session_id: SessionId,
    resumed: bool,
    server_cert_chain: Arc<Vec<CertificateDer<'static>>>,
    client_cert_sent: bool,
    keys: Arc<SessionKeys>,
}

impl EstablishedSession {
    pub(super) fn new(
        version: ProtocolVersion,
        suite: &'static SupportedCipherSuite,
        ctx: &Context,
        keys: Arc<SessionKeys>,
    ) -> Self {
        Self {
            version,
            suite,
            session_id: ctx.session_id,
            resumed: ctx.resuming,
            server_cert_chain: ctx.server_cert_chain.clone(),
            client_cert_sent: ctx.selected_client_cert.is_some(),
            keys,
        }
    }

    /// The negotiated protocol version.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }

    /// The negotiated cipher suite.
    pub fn cipher_suite(&self) -> &'static SupportedCipherSuite {
        self.suite
    }

    /// The session id the server assigned; empty if it assigned none.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether this was an abbreviated handshake.
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// The server's certificate chain, leaf first.
    pub fn server_certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.server_cert_chain
    }

    /// Whether we authenticated with a client certificate.
    pub fn client_certificate_sent(&self) -> bool {
        self.client_cert_sent
    }

    /// The record layer keys.
    pub fn keys(&self) -> &Arc<SessionKeys> {
        &self.keys
    }
}

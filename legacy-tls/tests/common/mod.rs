#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
pub use std::sync::Arc;

use legacy_tls::crypto::OsRandom;
use legacy_tls::internal::msgs::base::{Payload, PayloadU16};
use legacy_tls::internal::msgs::codec::{Codec, Reader};
use legacy_tls::internal::msgs::enums::Compression;
use legacy_tls::internal::msgs::handshake::{
    CertificateChain, CertificateRequestPayload, ClientHelloPayload, DistinguishedName,
    HandshakeMessagePayload, HandshakePayload, Random, ServerHelloPayload,
    ServerKeyExchangePayload, ServerRsaParams, SessionId,
};
use legacy_tls::internal::secrets::{ConnectionRandoms, ConnectionSecrets, HandshakeTranscript};
use legacy_tls::{
    AlertDescription, AlertLevel, ClientCertificateType, ClientConfig, ClientHandshake,
    ContentType, Error, HandshakeType, Inbound, Output, Phase, ProtocolVersion, RecordTransport,
    RootCertStore, SessionKeys, SupportedCipherSuite,
};
use md5::{Digest, Md5};
use pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

macro_rules! embed_files {
    (
        $(
            ($name:ident, $file:literal);
        )+
    ) => {
        $(
            const $name: &'static [u8] = include_bytes!(
                concat!("../../../test-ca/", $file));
        )+
    }
}

embed_files! {
    (CA_CERT, "ca.der");
    (INTER_CERT, "inter.der");
    (END_CERT, "end.der");
    (END_KEY, "end.key.der");
    (CLIENT_CERT, "client.der");
    (CLIENT_KEY, "client.key.der");
    (EXPORT_KX_KEY, "export-kx.key.der");
    (UNTRUSTED_CERT, "untrusted.der");
    (EXPIRED_CERT, "expired.der");
    (SIGN_ONLY_CERT, "sign-only.der");
    (KX_ONLY_CERT, "kx-only.der");
    (CN_ONLY_CERT, "cn-only.der");
}

pub const HOST: &str = "foo.example.com";

pub fn ca_cert() -> CertificateDer<'static> {
    CertificateDer::from(CA_CERT)
}

pub fn server_chain() -> Vec<CertificateDer<'static>> {
    vec![CertificateDer::from(END_CERT), CertificateDer::from(INTER_CERT)]
}

pub fn untrusted_chain() -> Vec<CertificateDer<'static>> {
    vec![CertificateDer::from(UNTRUSTED_CERT)]
}

pub fn expired_chain() -> Vec<CertificateDer<'static>> {
    vec![CertificateDer::from(EXPIRED_CERT), CertificateDer::from(INTER_CERT)]
}

pub fn sign_only_chain() -> Vec<CertificateDer<'static>> {
    vec![CertificateDer::from(SIGN_ONLY_CERT), CertificateDer::from(INTER_CERT)]
}

pub fn kx_only_chain() -> Vec<CertificateDer<'static>> {
    vec![CertificateDer::from(KX_ONLY_CERT), CertificateDer::from(INTER_CERT)]
}

pub fn cn_only_chain() -> Vec<CertificateDer<'static>> {
    vec![CertificateDer::from(CN_ONLY_CERT), CertificateDer::from(INTER_CERT)]
}

pub fn client_chain() -> Vec<CertificateDer<'static>> {
    vec![CertificateDer::from(CLIENT_CERT)]
}

pub fn client_key() -> PrivateKeyDer<'static> {
    PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(CLIENT_KEY))
}

pub fn roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.add(ca_cert()).unwrap();
    roots
}

pub fn make_client_config(
    suites: &[&'static SupportedCipherSuite],
    versions: &[&'static legacy_tls::SupportedProtocolVersion],
) -> ClientConfig {
    ClientConfig::builder()
        .with_cipher_suites(suites)
        .with_protocol_versions(versions)
        .unwrap()
        .with_root_certificates(roots())
        .with_no_client_auth()
}

pub fn make_client_config_with_auth(
    suites: &[&'static SupportedCipherSuite],
    versions: &[&'static legacy_tls::SupportedProtocolVersion],
) -> ClientConfig {
    ClientConfig::builder()
        .with_cipher_suites(suites)
        .with_protocol_versions(versions)
        .unwrap()
        .with_root_certificates(roots())
        .with_client_auth_cert(client_chain(), client_key())
        .unwrap()
}

/// How the scripted server behaves.
#[derive(Clone, Copy, Debug)]
pub enum FinishedByte {
    First,
    Last,
}

pub struct ServerOptions {
    /// The highest version the server speaks.
    pub max_version: ProtocolVersion,
    pub suite: &'static SupportedCipherSuite,
    pub chain: Vec<CertificateDer<'static>>,
    /// Sign an ephemeral key into a ServerKeyExchange.
    pub send_server_kx: bool,
    pub corrupt_server_kx_signature: bool,
    pub request_client_cert: bool,
    pub assign_session_id: bool,
    /// Agree to resume sessions this server issued.
    pub resume: bool,
    /// Flip the low bit of this byte of the server's verify data.
    pub corrupt_finished: Option<FinishedByte>,
    /// Send a warning alert before the first flight.
    pub warn_first: Option<AlertDescription>,
    /// Answer the ClientHello with this fatal alert instead.
    pub refuse_with: Option<AlertDescription>,
}

impl ServerOptions {
    pub fn new(suite: &'static SupportedCipherSuite) -> Self {
        Self {
            max_version: ProtocolVersion::TLSv1_0,
            suite,
            chain: server_chain(),
            send_server_kx: false,
            corrupt_server_kx_signature: false,
            request_client_cert: false,
            assign_session_id: true,
            resume: true,
            corrupt_finished: None,
            warn_first: None,
            refuse_with: None,
        }
    }
}

/// A record the server sends.
#[derive(Debug)]
pub enum ServerRecord {
    Handshake(Vec<u8>),
    ChangeCipherSpec,
    Alert(AlertLevel, AlertDescription),
}

struct IssuedSession {
    id: SessionId,
    master_secret: [u8; 48],
    version: ProtocolVersion,
}

/// What the server observed during one connection.
#[derive(Debug, Default)]
pub struct ServerView {
    pub client_hello: Option<ClientHelloPayload>,
    pub client_chain: Vec<CertificateDer<'static>>,
    pub client_cert_verified: bool,
    pub client_finished_verified: bool,
    pub resumed: bool,
    pub premaster_version: Option<ProtocolVersion>,
    pub alerts: Vec<(AlertLevel, AlertDescription)>,
}

/// A minimal SSL3/TLS1.0 server that follows a script.
///
/// It panics on anything a correct client would not send.
pub struct TestServer {
    pub options: ServerOptions,
    key: RsaPrivateKey,
    ephemeral_key: RsaPrivateKey,
    issued: Option<IssuedSession>,

    version: ProtocolVersion,
    transcript: HandshakeTranscript,
    randoms: ConnectionRandoms,
    session_id: SessionId,
    secrets: Option<ConnectionSecrets>,
    client_ccs: bool,
    pub view: ServerView,
}

impl TestServer {
    pub fn new(options: ServerOptions) -> Self {
        Self {
            options,
            key: RsaPrivateKey::from_pkcs8_der(END_KEY).unwrap(),
            ephemeral_key: RsaPrivateKey::from_pkcs8_der(EXPORT_KX_KEY).unwrap(),
            issued: None,
            version: ProtocolVersion::TLSv1_0,
            transcript: HandshakeTranscript::new(),
            randoms: ConnectionRandoms::new([0; 32], [0; 32]),
            session_id: SessionId::empty(),
            secrets: None,
            client_ccs: false,
            view: ServerView::default(),
        }
    }

    /// Forget per-connection state, keeping issued sessions.
    pub fn reset(&mut self) {
        self.transcript = HandshakeTranscript::new();
        self.secrets = None;
        self.client_ccs = false;
        self.view = ServerView::default();
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// The record layer keys the server derived.
    pub fn session_keys(&self) -> SessionKeys {
        self.secrets
            .as_ref()
            .expect("no keys yet")
            .session_keys()
    }

    /// Process one record from the client, returning the server's reply.
    pub fn receive(&mut self, typ: ContentType, payload: &[u8]) -> Vec<ServerRecord> {
        match typ {
            ContentType::Handshake => self.receive_handshake(payload),
            ContentType::ChangeCipherSpec => {
                assert_eq!(payload, &[0x01]);
                assert!(self.secrets.is_some(), "client CCS before key exchange");
                self.client_ccs = true;
                Vec::new()
            }
            ContentType::Alert => {
                let level = AlertLevel::from(payload[0]);
                let desc = AlertDescription::from(payload[1]);
                self.view.alerts.push((level, desc));
                Vec::new()
            }
            other => panic!("unexpected record type {:?}", other),
        }
    }

    fn receive_handshake(&mut self, bytes: &[u8]) -> Vec<ServerRecord> {
        let m = HandshakeMessagePayload::read_version(&mut Reader::init(bytes), self.version)
            .unwrap();

        if let HandshakePayload::Finished(verify_data) = &m.payload {
            assert!(self.client_ccs, "client Finished before its CCS");
            let secrets = self.secrets.as_ref().unwrap();
            assert_eq!(
                verify_data.bytes(),
                &secrets.client_verify_data(&self.transcript)[..],
                "client Finished does not verify"
            );
            self.transcript.update_raw(bytes);
            self.view.client_finished_verified = true;
            if self.view.resumed {
                return Vec::new();
            }
            return self.send_ccs_finished();
        }

        // the signature covers the transcript up to, not including, itself
        if let HandshakePayload::CertificateVerify(sig) = &m.payload {
            let digest = self
                .secrets
                .as_ref()
                .unwrap()
                .certificate_verify_digest(&self.transcript);
            let (_, cert) = X509Certificate::from_der(self.view.client_chain[0].as_ref()).unwrap();
            let public = RsaPublicKey::from_public_key_der(cert.public_key().raw).unwrap();
            public
                .verify(Pkcs1v15Sign::new_unprefixed(), &digest, &sig.0)
                .expect("CertificateVerify does not verify");
            self.view.client_cert_verified = true;
            self.transcript.update_raw(bytes);
            return Vec::new();
        }

        self.transcript.update_raw(bytes);
        match m.payload {
            HandshakePayload::ClientHello(hello) => self.receive_client_hello(hello),
            HandshakePayload::Certificate(chain) => {
                assert!(self.options.request_client_cert);
                self.view.client_chain = chain.0;
                Vec::new()
            }
            HandshakePayload::ClientKeyExchange(encrypted) => {
                let key = match self.options.send_server_kx {
                    true => &self.ephemeral_key,
                    false => &self.key,
                };
                let pms = key
                    .decrypt(Pkcs1v15Encrypt, encrypted.bytes())
                    .unwrap();
                assert_eq!(pms.len(), 48);
                self.view.premaster_version =
                    Some(ProtocolVersion::from(u16::from_be_bytes([pms[0], pms[1]])));
                self.secrets = Some(ConnectionSecrets::from_premaster(
                    &pms,
                    self.randoms,
                    self.options.suite,
                    self.version,
                ));
                Vec::new()
            }
            other => panic!("unexpected handshake message {:?}", other),
        }
    }

    fn encode(&self, typ: HandshakeType, payload: HandshakePayload) -> Vec<u8> {
        HandshakeMessagePayload { typ, payload }.encoding_for(self.version)
    }

    fn send(&mut self, out: &mut Vec<ServerRecord>, typ: HandshakeType, payload: HandshakePayload) {
        let bytes = self.encode(typ, payload);
        self.transcript.update_raw(&bytes);
        out.push(ServerRecord::Handshake(bytes));
    }

    fn receive_client_hello(&mut self, hello: ClientHelloPayload) -> Vec<ServerRecord> {
        let mut out = Vec::new();
        if let Some(desc) = self.options.warn_first {
            out.push(ServerRecord::Alert(AlertLevel::Warning, desc));
        }
        if let Some(desc) = self.options.refuse_with {
            out.push(ServerRecord::Alert(AlertLevel::Fatal, desc));
            return out;
        }

        self.version = if hello.client_version < self.options.max_version {
            hello.client_version
        } else {
            self.options.max_version
        };
        assert!(hello
            .cipher_suites
            .contains(&self.options.suite.suite));

        let mut server_random = [0u8; 32];
        server_random[..4].copy_from_slice(&[0x77; 4]);
        server_random[4..].copy_from_slice(&[0x52; 28]);
        self.randoms = ConnectionRandoms::new(hello.random.0, server_random);

        let resumable = self
            .issued
            .as_ref()
            .filter(|issued| {
                self.options.resume
                    && !hello.session_id.is_empty()
                    && issued.id == hello.session_id
                    && issued.version == self.version
            })
            .map(|issued| (issued.id, issued.master_secret));
        self.view.client_hello = Some(hello);

        if let Some((id, master_secret)) = resumable {
            self.view.resumed = true;
            self.send_server_hello(&mut out, id);
            self.secrets = Some(ConnectionSecrets::new_resume(
                self.randoms,
                self.options.suite,
                self.version,
                &master_secret,
            ));
            out.extend(self.send_ccs_finished());
            return out;
        }

        let id = match self.options.assign_session_id {
            true => SessionId::random(&OsRandom).unwrap(),
            false => SessionId::empty(),
        };
        self.send_server_hello(&mut out, id);

        let chain = CertificateChain(self.options.chain.clone());
        self.send(&mut out, HandshakeType::Certificate, HandshakePayload::Certificate(chain));

        if self.options.send_server_kx {
            let skx = self.server_kx();
            self.send(
                &mut out,
                HandshakeType::ServerKeyExchange,
                HandshakePayload::ServerKeyExchange(skx),
            );
        }

        if self.options.request_client_cert {
            let (_, ca) = X509Certificate::from_der(CA_CERT).unwrap();
            let certreq = CertificateRequestPayload {
                certtypes: vec![ClientCertificateType::RSASign],
                canames: vec![DistinguishedName::new(ca.subject().as_raw())],
            };
            self.send(
                &mut out,
                HandshakeType::CertificateRequest,
                HandshakePayload::CertificateRequest(certreq),
            );
        }

        self.send(&mut out, HandshakeType::ServerHelloDone, HandshakePayload::ServerHelloDone);
        out
    }

    fn send_server_hello(&mut self, out: &mut Vec<ServerRecord>, id: SessionId) {
        self.session_id = id;
        let hello = ServerHelloPayload {
            server_version: self.version,
            random: Random::from(self.randoms.server),
            session_id: id,
            cipher_suite: self.options.suite.suite,
            compression_method: Compression::Null,
            extensions: Vec::new(),
        };
        self.send(out, HandshakeType::ServerHello, HandshakePayload::ServerHello(hello));
    }

    fn server_kx(&self) -> ServerKeyExchangePayload {
        let ephemeral = self.ephemeral_key.to_public_key();
        let params = ServerRsaParams {
            modulus: PayloadU16::new(ephemeral.n().to_bytes_be()),
            exponent: PayloadU16::new(ephemeral.e().to_bytes_be()),
        };

        let mut message = Vec::new();
        message.extend_from_slice(&self.randoms.client);
        message.extend_from_slice(&self.randoms.server);
        params.encode(&mut message);

        let mut digest = Md5::digest(&message).to_vec();
        digest.extend_from_slice(&Sha1::digest(&message));

        let mut signature = self
            .key
            .sign(Pkcs1v15Sign::new_unprefixed(), &digest)
            .unwrap();
        if self.options.corrupt_server_kx_signature {
            signature[10] ^= 0x01;
        }

        ServerKeyExchangePayload {
            params,
            signature: PayloadU16::new(signature),
        }
    }

    fn send_ccs_finished(&mut self) -> Vec<ServerRecord> {
        let secrets = self.secrets.as_ref().unwrap();
        let mut verify_data = secrets.server_verify_data(&self.transcript);
        match self.options.corrupt_finished {
            Some(FinishedByte::First) => verify_data[0] ^= 0x01,
            Some(FinishedByte::Last) => {
                if let Some(last) = verify_data.last_mut() {
                    *last ^= 0x01;
                }
            }
            None => {}
        }

        let mut out = vec![ServerRecord::ChangeCipherSpec];
        self.send(
            &mut out,
            HandshakeType::Finished,
            HandshakePayload::Finished(Payload::new(verify_data)),
        );

        if !self.view.resumed && !self.session_id.is_empty() {
            let master_secret = *self.secrets.as_ref().unwrap().master_secret();
            self.issued = Some(IssuedSession {
                id: self.session_id,
                master_secret,
                version: self.version,
            });
        }
        out
    }
}

/// Run a handshake to completion in memory, one message at a time.
pub fn do_handshake(client: &mut ClientHandshake, server: &mut TestServer) -> Result<(), Error> {
    let mut outputs = client.start()?;

    loop {
        let mut replies = Vec::new();
        for output in outputs.drain(..) {
            match output {
                Output::Handshake(bytes) => {
                    replies.extend(server.receive(ContentType::Handshake, &bytes))
                }
                Output::ChangeCipherSpec(_) => {
                    replies.extend(server.receive(ContentType::ChangeCipherSpec, &[0x01]))
                }
                Output::StartDecrypting(_) => {}
            }
        }

        if client.phase() == Phase::Finished {
            return Ok(());
        }
        assert!(!replies.is_empty(), "handshake stalled at {:?}", client.phase());

        for reply in replies {
            let more = match reply {
                ServerRecord::Handshake(bytes) => client.handle(Inbound::Handshake(&bytes))?,
                ServerRecord::ChangeCipherSpec => {
                    client.handle(Inbound::ChangeCipherSpec(&[0x01]))?
                }
                ServerRecord::Alert(AlertLevel::Warning, _) => Vec::new(),
                ServerRecord::Alert(_, desc) => return Err(Error::AlertReceived(desc)),
            };
            outputs.extend(more);
        }
    }
}

/// A record layer backed by a [`TestServer`].
///
/// Each server flight's handshake messages are coalesced into a single
/// record, as real servers tend to do.
pub struct MemoryTransport {
    pub server: TestServer,
    inbox: VecDeque<(ContentType, Vec<u8>)>,
    pub sent: Vec<(ContentType, ProtocolVersion, Vec<u8>)>,
    pub write_keys: Option<Arc<SessionKeys>>,
    pub read_keys: Option<Arc<SessionKeys>>,
    /// Split the server's handshake records at this length.
    pub max_fragment: Option<usize>,
}

impl MemoryTransport {
    pub fn new(server: TestServer) -> Self {
        Self {
            server,
            inbox: VecDeque::new(),
            sent: Vec::new(),
            write_keys: None,
            read_keys: None,
            max_fragment: None,
        }
    }

    fn queue(&mut self, records: Vec<ServerRecord>) {
        let mut handshake = Vec::new();
        for record in records {
            match record {
                ServerRecord::Handshake(bytes) => handshake.extend_from_slice(&bytes),
                other => {
                    self.flush_handshake(&mut handshake);
                    match other {
                        ServerRecord::ChangeCipherSpec => self
                            .inbox
                            .push_back((ContentType::ChangeCipherSpec, vec![0x01])),
                        ServerRecord::Alert(level, desc) => self.inbox.push_back((
                            ContentType::Alert,
                            vec![u8::from(level), u8::from(desc)],
                        )),
                        ServerRecord::Handshake(_) => unreachable!(),
                    }
                }
            }
        }
        self.flush_handshake(&mut handshake);
    }

    fn flush_handshake(&mut self, handshake: &mut Vec<u8>) {
        if handshake.is_empty() {
            return;
        }
        let chunk = self.max_fragment.unwrap_or(handshake.len());
        for fragment in handshake.chunks(chunk) {
            self.inbox
                .push_back((ContentType::Handshake, fragment.to_vec()));
        }
        handshake.clear();
    }

    /// Queue a record as if the server had sent it.
    pub fn inject(&mut self, typ: ContentType, payload: Vec<u8>) {
        self.inbox.push_back((typ, payload));
    }
}

impl RecordTransport for MemoryTransport {
    fn send(
        &mut self,
        typ: ContentType,
        version: ProtocolVersion,
        payload: &[u8],
    ) -> io::Result<()> {
        self.sent
            .push((typ, version, payload.to_vec()));
        let replies = self.server.receive(typ, payload);
        self.queue(replies);
        Ok(())
    }

    fn receive(&mut self) -> io::Result<(ContentType, Vec<u8>)> {
        self.inbox
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn change_write_keys(&mut self, keys: Arc<SessionKeys>) {
        self.write_keys = Some(keys);
    }

    fn change_read_keys(&mut self, keys: Arc<SessionKeys>) {
        self.read_keys = Some(keys);
    }
}

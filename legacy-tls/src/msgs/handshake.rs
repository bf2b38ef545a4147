use std::fmt;

use pki_types::{CertificateDer, DnsName, UnixTime};
use subtle::ConstantTimeEq;

use crate::crypto::SecureRandom;
use crate::enums::{CipherSuite, HandshakeType, ProtocolVersion};
use crate::error::InvalidMessage;
use crate::msgs::base::{Payload, PayloadU16};
use crate::msgs::codec::{self, Codec, Reader};
use crate::msgs::enums::{ClientCertificateType, Compression, ExtensionType, ServerNameType};
use crate::rand;

/// Length of an SSL3 Finished body: an MD5 and a SHA-1 digest.
pub(crate) const SSL3_FINISHED_LEN: usize = 36;

/// Length of a TLS1.0 Finished body.
pub(crate) const TLS10_FINISHED_LEN: usize = 12;

/// A hello random.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Random(pub [u8; 32]);

impl Random {
    /// A hello random: the big-endian UNIX time in seconds followed
    /// by 28 bytes from `secure_random`.
    pub fn new(
        secure_random: &dyn SecureRandom,
        now: UnixTime,
    ) -> Result<Self, rand::GetRandomFailed> {
        let mut data = [0u8; 32];
        let (time, rest) = data.split_at_mut(4);
        time.copy_from_slice(&(now.as_secs() as u32).to_be_bytes());
        secure_random.fill(rest)?;
        Ok(Self(data))
    }
}

impl From<[u8; 32]> for Random {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Codec<'_> for Random {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.0);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        r.take(32)
            .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
            .map(Self)
            .ok_or(InvalidMessage::MissingData("Random"))
    }
}

impl fmt::Debug for Random {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::base::hex(f, &self.0)
    }
}

/// A session id of up to 32 bytes.
///
/// Equality runs in constant time over the id bytes.
#[derive(Copy, Clone)]
pub struct SessionId {
    len: usize,
    data: [u8; 32],
}

impl SessionId {
    /// A fresh 32-byte id.
    pub fn random(secure_random: &dyn SecureRandom) -> Result<Self, rand::GetRandomFailed> {
        let mut id = Self {
            len: 32,
            data: [0u8; 32],
        };
        secure_random.fill(&mut id.data)?;
        Ok(id)
    }

    /// The zero-length id: no session offered, or none assigned.
    pub fn empty() -> Self {
        Self {
            len: 0,
            data: [0u8; 32],
        }
    }

    /// Length of the id in bytes, 0 to 32.
    pub fn len(&self) -> usize {
        self.len
    }

    /// An empty id means the server will not cache the session.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for SessionId {
    fn as_ref(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl PartialEq for SessionId {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.as_ref().ct_eq(other.as_ref()))
    }
}

impl Codec<'_> for SessionId {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.len as u8);
        bytes.extend_from_slice(self.as_ref());
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let len = usize::from(u8::read(r)?);
        if len > 32 {
            return Err(InvalidMessage::TrailingData("SessionID"));
        }

        let bytes = r
            .take(len)
            .ok_or(InvalidMessage::MissingData("SessionID"))?;
        let mut id = Self::empty();
        id.data[..len].copy_from_slice(bytes);
        id.len = len;
        Ok(id)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::base::hex(f, self.as_ref())
    }
}

#[derive(Clone, Debug)]
pub struct UnknownExtension {
    pub typ: ExtensionType,
    pub payload: Payload<'static>,
}

impl UnknownExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.payload.encode(bytes);
    }

    fn read(typ: ExtensionType, r: &mut Reader<'_>) -> Self {
        let payload = Payload::read(r).into_owned();
        Self { typ, payload }
    }
}

#[derive(Clone, Debug)]
pub enum ServerNamePayload {
    HostName(DnsName<'static>),
    Unknown(Payload<'static>),
}

impl ServerNamePayload {
    fn read_hostname(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let raw = PayloadU16::read(r)?;
        let name = core::str::from_utf8(&raw.0)
            .ok()
            .and_then(|s| DnsName::try_from(s).ok())
            .ok_or(InvalidMessage::InvalidServerName)?;
        Ok(Self::HostName(name.to_owned()))
    }

    fn encode(&self, bytes: &mut Vec<u8>) {
        match *self {
            Self::HostName(ref name) => PayloadU16::encode_slice(name.as_ref().as_bytes(), bytes),
            Self::Unknown(ref r) => r.encode(bytes),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerName {
    pub typ: ServerNameType,
    pub payload: ServerNamePayload,
}

impl Codec<'_> for ServerName {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.typ.encode(bytes);
        self.payload.encode(bytes);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let typ = ServerNameType::read(r)?;

        let payload = match typ {
            ServerNameType::HostName => ServerNamePayload::read_hostname(r)?,
            _ => ServerNamePayload::Unknown(Payload::read(r).into_owned()),
        };

        Ok(Self { typ, payload })
    }
}

#[derive(Clone, Debug)]
pub enum ClientExtension {
    ServerName(Vec<ServerName>),
    Unknown(UnknownExtension),
}

impl ClientExtension {
    pub fn ext_type(&self) -> ExtensionType {
        match *self {
            Self::ServerName(_) => ExtensionType::ServerName,
            Self::Unknown(ref r) => r.typ,
        }
    }

    /// Make a basic SNI ServerNameRequest quoting `hostname`.
    pub fn make_sni(dns_name: DnsName<'static>) -> Self {
        Self::ServerName(vec![ServerName {
            typ: ServerNameType::HostName,
            payload: ServerNamePayload::HostName(dns_name),
        }])
    }
}

impl Codec<'_> for ClientExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.ext_type().encode(bytes);

        let mut sub: Vec<u8> = Vec::new();
        match *self {
            Self::ServerName(ref r) => codec::encode_vec_u16(&mut sub, r),
            Self::Unknown(ref r) => r.encode(&mut sub),
        }

        (sub.len() as u16).encode(bytes);
        bytes.append(&mut sub);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let typ = ExtensionType::read(r)?;
        let len = u16::read(r)? as usize;
        let mut sub = r.sub(len)?;

        let ext = match typ {
            ExtensionType::ServerName => Self::ServerName(codec::read_vec_u16(&mut sub)?),
            _ => Self::Unknown(UnknownExtension::read(typ, &mut sub)),
        };

        sub.expect_empty("ClientExtension")
            .map(|_| ext)
    }
}

/// Extensions a server appended to its ServerHello.
///
/// SSL3 and TLS1.0 servers may answer an extension-bearing hello with
/// extensions of their own; we parse them for well-formedness only.
#[derive(Clone, Debug)]
pub struct ServerExtension(pub UnknownExtension);

impl Codec<'_> for ServerExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.0.typ.encode(bytes);
        PayloadU16::encode_slice(self.0.payload.bytes(), bytes);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let typ = ExtensionType::read(r)?;
        let len = u16::read(r)? as usize;
        let mut sub = r.sub(len)?;
        Ok(Self(UnknownExtension::read(typ, &mut sub)))
    }
}

#[derive(Debug)]
pub struct ClientHelloPayload {
    pub client_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Vec<Compression>,
    pub extensions: Vec<ClientExtension>,
}

impl Codec<'_> for ClientHelloPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.client_version.encode(bytes);
        self.random.encode(bytes);
        self.session_id.encode(bytes);
        codec::encode_vec_u16(bytes, &self.cipher_suites);
        codec::encode_vec_u8(bytes, &self.compression_methods);

        if !self.extensions.is_empty() {
            codec::encode_vec_u16(bytes, &self.extensions);
        }
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let mut ret = Self {
            client_version: ProtocolVersion::read(r)?,
            random: Random::read(r)?,
            session_id: SessionId::read(r)?,
            cipher_suites: codec::read_vec_u16(r)?,
            compression_methods: codec::read_vec_u8(r)?,
            extensions: Vec::new(),
        };

        if r.any_left() {
            ret.extensions = codec::read_vec_u16(r)?;
        }

        r.expect_empty("ClientHelloPayload")
            .map(|_| ret)
    }
}

impl ClientHelloPayload {
    pub fn find_extension(&self, ext: ExtensionType) -> Option<&ClientExtension> {
        self.extensions
            .iter()
            .find(|x| x.ext_type() == ext)
    }

    pub fn sni_hostname(&self) -> Option<&DnsName<'static>> {
        match self.find_extension(ExtensionType::ServerName)? {
            ClientExtension::ServerName(names) => names
                .iter()
                .find_map(|name| match name.payload {
                    ServerNamePayload::HostName(ref dns) => Some(dns),
                    ServerNamePayload::Unknown(_) => None,
                }),
            ClientExtension::Unknown(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct ServerHelloPayload {
    pub server_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suite: CipherSuite,
    pub compression_method: Compression,
    pub extensions: Vec<ServerExtension>,
}

impl Codec<'_> for ServerHelloPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.server_version.encode(bytes);
        self.random.encode(bytes);

        self.session_id.encode(bytes);
        self.cipher_suite.encode(bytes);
        self.compression_method.encode(bytes);

        if !self.extensions.is_empty() {
            codec::encode_vec_u16(bytes, &self.extensions);
        }
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let server_version = ProtocolVersion::read(r)?;
        let random = Random::read(r)?;
        let session_id = SessionId::read(r)?;
        let suite = CipherSuite::read(r)?;
        let compression = Compression::read(r)?;

        // Anything after the compression method is an extensions block.
        let extensions = if r.any_left() {
            codec::read_vec_u16(r)?
        } else {
            vec![]
        };

        let ret = Self {
            server_version,
            random,
            session_id,
            cipher_suite: suite,
            compression_method: compression,
            extensions,
        };

        r.expect_empty("ServerHelloPayload")
            .map(|_| ret)
    }
}

impl Default for ServerHelloPayload {
    fn default() -> Self {
        Self {
            server_version: ProtocolVersion::TLSv1_0,
            random: Random([0u8; 32]),
            session_id: SessionId::empty(),
            cipher_suite: CipherSuite::TLS_NULL_WITH_NULL_NULL,
            compression_method: Compression::Null,
            extensions: Vec::new(),
        }
    }
}

/// A leaf-first certificate chain, as carried by the Certificate message.
#[derive(Clone, Debug, Default)]
pub struct CertificateChain(pub Vec<CertificateDer<'static>>);

impl Codec<'_> for CertificateChain {
    fn encode(&self, bytes: &mut Vec<u8>) {
        codec::encode_vec_u24(bytes, &self.0);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let certs = codec::read_vec_u24_limited::<CertificateDer<'_>>(
            r,
            codec::CERTIFICATE_MAX_SIZE_LIMIT,
        )?;
        Ok(Self(
            certs
                .into_iter()
                .map(|c| c.into_owned())
                .collect(),
        ))
    }
}

/// Ephemeral RSA parameters sent by a server using an export suite.
#[derive(Clone, Debug)]
pub struct ServerRsaParams {
    pub modulus: PayloadU16,
    pub exponent: PayloadU16,
}

impl Codec<'_> for ServerRsaParams {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.modulus.encode(bytes);
        self.exponent.encode(bytes);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let modulus = PayloadU16::read(r)?;
        let exponent = PayloadU16::read(r)?;
        if modulus.0.is_empty() || exponent.0.is_empty() {
            return Err(InvalidMessage::InvalidRsaParams);
        }

        Ok(Self { modulus, exponent })
    }
}

#[derive(Clone, Debug)]
pub struct ServerKeyExchangePayload {
    pub params: ServerRsaParams,
    pub signature: PayloadU16,
}

impl Codec<'_> for ServerKeyExchangePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.params.encode(bytes);
        self.signature.encode(bytes);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        Ok(Self {
            params: ServerRsaParams::read(r)?,
            signature: PayloadU16::read(r)?,
        })
    }
}

/// A DER-encoded X.500 `Name`, as listed in a CertificateRequest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistinguishedName(PayloadU16);

impl DistinguishedName {
    /// `der` is the whole encoding, outer `SEQUENCE` included.
    pub fn new(der: &[u8]) -> Self {
        Self(PayloadU16::new(der.to_vec()))
    }
}

impl AsRef<[u8]> for DistinguishedName {
    fn as_ref(&self) -> &[u8] {
        &self.0 .0
    }
}

impl Codec<'_> for DistinguishedName {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.0.encode(bytes);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        PayloadU16::read(r).map(Self)
    }
}

#[derive(Debug)]
pub struct CertificateRequestPayload {
    pub certtypes: Vec<ClientCertificateType>,
    pub canames: Vec<DistinguishedName>,
}

impl Codec<'_> for CertificateRequestPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        codec::encode_vec_u8(bytes, &self.certtypes);
        codec::encode_vec_u16(bytes, &self.canames);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let certtypes = codec::read_vec_u8(r)?;
        let canames = codec::read_vec_u16(r)?;

        Ok(Self { certtypes, canames })
    }
}

#[derive(Debug)]
pub enum HandshakePayload {
    HelloRequest,
    ClientHello(ClientHelloPayload),
    ServerHello(ServerHelloPayload),
    Certificate(CertificateChain),
    ServerKeyExchange(ServerKeyExchangePayload),
    CertificateRequest(CertificateRequestPayload),
    ServerHelloDone,
    CertificateVerify(PayloadU16),
    /// The encrypted premaster secret.  TLS1.0 length-prefixes it; SSL3
    /// sends it bare.
    ClientKeyExchange(Payload<'static>),
    Finished(Payload<'static>),
    Unknown(Payload<'static>),
}

impl HandshakePayload {
    fn encode_for(&self, bytes: &mut Vec<u8>, vers: ProtocolVersion) {
        use self::HandshakePayload::*;
        match *self {
            HelloRequest | ServerHelloDone => {}
            ClientHello(ref x) => x.encode(bytes),
            ServerHello(ref x) => x.encode(bytes),
            Certificate(ref x) => x.encode(bytes),
            ServerKeyExchange(ref x) => x.encode(bytes),
            CertificateRequest(ref x) => x.encode(bytes),
            CertificateVerify(ref x) => x.encode(bytes),
            ClientKeyExchange(ref x) if vers == ProtocolVersion::SSLv3 => x.encode(bytes),
            ClientKeyExchange(ref x) => PayloadU16::encode_slice(x.bytes(), bytes),
            Finished(ref x) => x.encode(bytes),
            Unknown(ref x) => x.encode(bytes),
        }
    }
}

#[derive(Debug)]
pub struct HandshakeMessagePayload {
    pub typ: HandshakeType,
    pub payload: HandshakePayload,
}

impl Codec<'_> for HandshakeMessagePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.encode_for(bytes, ProtocolVersion::TLSv1_0);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        Self::read_version(r, ProtocolVersion::TLSv1_0)
    }
}

impl HandshakeMessagePayload {
    pub fn encode_for(&self, bytes: &mut Vec<u8>, vers: ProtocolVersion) {
        // encode payload to learn length
        let mut sub: Vec<u8> = Vec::new();
        self.payload.encode_for(&mut sub, vers);

        // output type, length, and encoded payload
        self.typ.encode(bytes);
        codec::u24(sub.len() as u32).encode(bytes);
        bytes.append(&mut sub);
    }

    /// This message's wire encoding at protocol version `vers`.
    pub fn encoding_for(&self, vers: ProtocolVersion) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.encode_for(&mut bytes, vers);
        bytes
    }

    pub fn read_version(r: &mut Reader<'_>, vers: ProtocolVersion) -> Result<Self, InvalidMessage> {
        let typ = HandshakeType::read(r)?;
        let len = codec::u24::read(r)?.0 as usize;
        let mut sub = r.sub(len)?;

        let payload = match typ {
            HandshakeType::HelloRequest if sub.left() == 0 => HandshakePayload::HelloRequest,
            HandshakeType::ClientHello => {
                HandshakePayload::ClientHello(ClientHelloPayload::read(&mut sub)?)
            }
            HandshakeType::ServerHello => {
                HandshakePayload::ServerHello(ServerHelloPayload::read(&mut sub)?)
            }
            HandshakeType::Certificate => {
                HandshakePayload::Certificate(CertificateChain::read(&mut sub)?)
            }
            HandshakeType::ServerKeyExchange => {
                let p = ServerKeyExchangePayload::read(&mut sub)?;
                HandshakePayload::ServerKeyExchange(p)
            }
            HandshakeType::ServerHelloDone => {
                sub.expect_empty("ServerHelloDone")?;
                HandshakePayload::ServerHelloDone
            }
            HandshakeType::ClientKeyExchange if vers == ProtocolVersion::SSLv3 => {
                HandshakePayload::ClientKeyExchange(Payload::read(&mut sub).into_owned())
            }
            HandshakeType::ClientKeyExchange => HandshakePayload::ClientKeyExchange(Payload::new(
                PayloadU16::read(&mut sub)?.0,
            )),
            HandshakeType::CertificateRequest => {
                let p = CertificateRequestPayload::read(&mut sub)?;
                HandshakePayload::CertificateRequest(p)
            }
            HandshakeType::CertificateVerify => {
                HandshakePayload::CertificateVerify(PayloadU16::read(&mut sub)?)
            }
            HandshakeType::Finished => {
                let expected = match vers {
                    ProtocolVersion::SSLv3 => SSL3_FINISHED_LEN,
                    _ => TLS10_FINISHED_LEN,
                };
                if sub.left() != expected {
                    return Err(InvalidMessage::InvalidFinishedLength);
                }
                HandshakePayload::Finished(Payload::read(&mut sub).into_owned())
            }
            _ => HandshakePayload::Unknown(Payload::read(&mut sub).into_owned()),
        };

        sub.expect_empty("HandshakeMessagePayload")
            .map(|_| Self { typ, payload })
    }
}

use std::fmt;

use pki_types::CertificateDer;

use crate::error::InvalidMessage;
use crate::msgs::codec::{self, Codec, Reader};

/// Bytes whose extent is fixed by the enclosing structure: they run to
/// the end of the reader.
#[derive(Clone, Eq, PartialEq)]
pub enum Payload<'a> {
    /// Still pointing into the message being decoded.
    Borrowed(&'a [u8]),
    /// Detached from any input buffer.
    Owned(Vec<u8>),
}

impl<'a> Payload<'a> {
    /// Take everything left in `r`.
    pub fn read(r: &mut Reader<'a>) -> Self {
        Self::Borrowed(r.rest())
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Borrowed(b) => b,
            Self::Owned(v) => v,
        }
    }

    /// Copy out of the input buffer, if still borrowing from it.
    pub fn into_owned(self) -> Payload<'static> {
        match self {
            Self::Borrowed(b) => Payload::Owned(b.to_vec()),
            Self::Owned(v) => Payload::Owned(v),
        }
    }
}

impl Payload<'static> {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Owned(bytes.into())
    }
}

impl<'a> Codec<'a> for Payload<'a> {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(self.bytes());
    }

    fn read(r: &mut Reader<'a>) -> Result<Self, InvalidMessage> {
        Ok(Self::read(r))
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex(f, self.bytes())
    }
}

/// One certificate of a `Certificate` message: `u24 len ‖ DER`.
impl<'a> Codec<'a> for CertificateDer<'a> {
    fn encode(&self, bytes: &mut Vec<u8>) {
        let der = self.as_ref();
        codec::u24(der.len() as u32).encode(bytes);
        bytes.extend_from_slice(der);
    }

    fn read(r: &mut Reader<'a>) -> Result<Self, InvalidMessage> {
        let len = codec::u24::read(r)?.0 as usize;
        Ok(Self::from(r.take(len).ok_or(InvalidMessage::MessageTooShort)?))
    }
}

/// Opaque bytes behind a u16 length: RSA parameters, signatures,
/// distinguished names and the like.
#[derive(Clone, Eq, PartialEq)]
pub struct PayloadU16(pub Vec<u8>);

impl PayloadU16 {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Write `slice` with its u16 length, without building a `PayloadU16`.
    pub fn encode_slice(slice: &[u8], bytes: &mut Vec<u8>) {
        (slice.len() as u16).encode(bytes);
        bytes.extend_from_slice(slice);
    }
}

impl Codec<'_> for PayloadU16 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        Self::encode_slice(&self.0, bytes);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, InvalidMessage> {
        let len = usize::from(u16::read(r)?);
        r.take(len)
            .map(|body| Self(body.to_vec()))
            .ok_or(InvalidMessage::MessageTooShort)
    }
}

impl fmt::Debug for PayloadU16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex(f, &self.0)
    }
}

/// Lower-case hex, no separators.
pub(crate) fn hex<'a>(
    f: &mut fmt::Formatter<'_>,
    payload: impl IntoIterator<Item = &'a u8>,
) -> fmt::Result {
    payload
        .into_iter()
        .try_for_each(|b| write!(f, "{:02x}", b))
}

use crate::enums::{AlertDescription, AlertLevel, ContentType, HandshakeType, ProtocolVersion};
use crate::error::InvalidMessage;
use crate::msgs::alert::AlertMessagePayload;
use crate::msgs::base::Payload;
use crate::msgs::ccs::ChangeCipherSpecPayload;
use crate::msgs::codec::{Codec, Reader};
use crate::msgs::handshake::HandshakeMessagePayload;

#[derive(Debug)]
pub enum MessagePayload {
    Alert(AlertMessagePayload),
    // The wire bytes are kept next to the parsed form: the transcript
    // hashes exactly what was sent or received.
    Handshake {
        parsed: HandshakeMessagePayload,
        encoded: Payload<'static>,
    },
    ChangeCipherSpec(ChangeCipherSpecPayload),
}

impl MessagePayload {
    pub fn encode(&self, bytes: &mut Vec<u8>) {
        match self {
            Self::Alert(x) => x.encode(bytes),
            Self::Handshake { encoded, .. } => bytes.extend_from_slice(encoded.bytes()),
            Self::ChangeCipherSpec(x) => x.encode(bytes),
        }
    }

    pub fn handshake(parsed: HandshakeMessagePayload, vers: ProtocolVersion) -> Self {
        Self::Handshake {
            encoded: Payload::new(parsed.encoding_for(vers)),
            parsed,
        }
    }

    /// Decode a whole, unfragmented payload of content type `typ`.
    pub fn new(
        typ: ContentType,
        vers: ProtocolVersion,
        payload: &[u8],
    ) -> Result<Self, InvalidMessage> {
        let mut r = Reader::init(payload);
        match typ {
            ContentType::Alert => AlertMessagePayload::read(&mut r).map(MessagePayload::Alert),
            ContentType::Handshake => {
                let parsed = HandshakeMessagePayload::read_version(&mut r, vers)?;
                r.expect_empty("Message")?;
                Ok(Self::Handshake {
                    parsed,
                    encoded: Payload::new(payload),
                })
            }
            ContentType::ChangeCipherSpec => {
                ChangeCipherSpecPayload::read(&mut r).map(MessagePayload::ChangeCipherSpec)
            }
            _ => Err(InvalidMessage::UnexpectedMessage("unsupported content type")),
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Alert(_) => ContentType::Alert,
            Self::Handshake { .. } => ContentType::Handshake,
            Self::ChangeCipherSpec(_) => ContentType::ChangeCipherSpec,
        }
    }
}

/// A decoded TLS message, named TLSPlaintext in the standard.
#[derive(Debug)]
pub struct Message {
    pub version: ProtocolVersion,
    pub payload: MessagePayload,
}

impl Message {
    pub fn is_handshake_type(&self, hstyp: HandshakeType) -> bool {
        // Bit of a layering violation, but OK.
        if let MessagePayload::Handshake { parsed, .. } = &self.payload {
            parsed.typ == hstyp
        } else {
            false
        }
    }

    pub fn build_alert(
        version: ProtocolVersion,
        level: AlertLevel,
        desc: AlertDescription,
    ) -> Self {
        Self {
            version,
            payload: MessagePayload::Alert(AlertMessagePayload {
                level,
                description: desc,
            }),
        }
    }

    pub fn build_handshake(version: ProtocolVersion, parsed: HandshakeMessagePayload) -> Self {
        Self {
            version,
            payload: MessagePayload::handshake(parsed, version),
        }
    }

    pub fn build_change_cipher_spec(version: ProtocolVersion) -> Self {
        Self {
            version,
            payload: MessagePayload::ChangeCipherSpec(ChangeCipherSpecPayload {}),
        }
    }

    /// The record payload carrying this message.
    pub fn encoded_payload(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.payload.encode(&mut bytes);
        bytes
    }
}

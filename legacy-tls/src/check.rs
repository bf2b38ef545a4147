use crate::enums::{ContentType, HandshakeType};
use crate::error::Error;
use crate::msgs::handshake::HandshakeMessagePayload;
use crate::msgs::message::{Message, MessagePayload};

/// For a Message $m, and a HandshakePayload enum member $payload_type,
/// return Ok(payload) if $m is both a handshake message and one that
/// has the given $payload_type.  If not, return Err(Error) quoting
/// $handshake_type as the expected handshake type.
macro_rules! require_handshake_msg(
  ( $m:expr, $handshake_type:path, $payload_type:path ) => (
    match &$m.payload {
        MessagePayload::Handshake { parsed, .. } => match &parsed.payload {
            $payload_type(hm) => Ok(hm),
            _ => Err($crate::check::inappropriate_handshake_message(
                     parsed, &[ $handshake_type ]))
        }
        payload => Err(Error::InappropriateMessage {
                 expect_types: vec![ ContentType::Handshake ],
                 got_type: payload.content_type()})
    }
  )
);

/// Validate the message `m`: return an error if:
///
/// - the type of m does not appear in `content_types`.
/// - if m is a handshake message, the handshake message type does
///   not appear in `handshake_types`.
pub(crate) fn check_message(
    m: &Message,
    content_types: &[ContentType],
    handshake_types: &[HandshakeType],
) -> Result<(), Error> {
    if !content_types.contains(&m.payload.content_type()) {
        return Err(inappropriate_message(m, content_types));
    }

    if let MessagePayload::Handshake { parsed, .. } = &m.payload {
        if !handshake_types.is_empty() && !handshake_types.contains(&parsed.typ) {
            return Err(inappropriate_handshake_message(parsed, handshake_types));
        }
    }

    Ok(())
}

pub(crate) fn inappropriate_message(m: &Message, content_types: &[ContentType]) -> Error {
    warn!(
        "Received a {:?} message while expecting {:?}",
        m.payload.content_type(),
        content_types
    );
    Error::InappropriateMessage {
        expect_types: content_types.to_vec(),
        got_type: m.payload.content_type(),
    }
}

pub(crate) fn inappropriate_handshake_message(
    hsp: &HandshakeMessagePayload,
    handshake_types: &[HandshakeType],
) -> Error {
    warn!(
        "Received a {:?} handshake message while expecting {:?}",
        hsp.typ, handshake_types
    );
    Error::InappropriateHandshakeMessage {
        expect_types: handshake_types.to_vec(),
        got_type: hsp.typ,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ProtocolVersion;
    use crate::msgs::handshake::HandshakePayload;

    fn server_hello_done() -> Message {
        Message::build_handshake(
            ProtocolVersion::TLSv1_0,
            HandshakeMessagePayload {
                typ: HandshakeType::ServerHelloDone,
                payload: HandshakePayload::ServerHelloDone,
            },
        )
    }

    #[test]
    fn accepts_expected_types() {
        let m = server_hello_done();
        check_message(
            &m,
            &[ContentType::Handshake],
            &[HandshakeType::CertificateRequest, HandshakeType::ServerHelloDone],
        )
        .unwrap();
        check_message(&m, &[ContentType::Handshake], &[]).unwrap();
    }

    #[test]
    fn rejects_wrong_handshake_type() {
        let err = check_message(
            &server_hello_done(),
            &[ContentType::Handshake],
            &[HandshakeType::Finished],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InappropriateHandshakeMessage {
                expect_types: vec![HandshakeType::Finished],
                got_type: HandshakeType::ServerHelloDone,
            }
        );
    }

    #[test]
    fn require_macro_rejects_other_content_types() {
        let ccs = Message::build_change_cipher_spec(ProtocolVersion::SSLv3);
        let res = require_handshake_msg!(
            ccs,
            HandshakeType::ServerHello,
            HandshakePayload::ServerHello
        );
        assert_eq!(
            res.unwrap_err(),
            Error::InappropriateMessage {
                expect_types: vec![ContentType::Handshake],
                got_type: ContentType::ChangeCipherSpec,
            }
        );
    }
}

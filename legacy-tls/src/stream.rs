use std::io;
use std::sync::Arc;

use crate::client::{ClientConfig, ClientHandshake, EstablishedSession, Inbound, Output};
use crate::enums::{AlertDescription, AlertLevel, ContentType, ProtocolVersion};
use crate::error::Error;
use crate::msgs::alert::AlertMessagePayload;
use crate::msgs::codec::{Codec, Reader};
use crate::msgs::deframer::HandshakeDeframer;
use crate::msgs::message::Message;
use crate::secrets::SessionKeys;

/// The largest record payload we send.
pub(crate) const MAX_FRAGMENT_LEN: usize = 16384;

/// A record layer, as seen by the handshake.
///
/// Implementations frame, protect and transport records; the handshake
/// only deals in plaintext payloads and tells the record layer when to
/// switch keys.
pub trait RecordTransport {
    /// Send one record carrying `payload`.
    fn send(&mut self, typ: ContentType, version: ProtocolVersion, payload: &[u8])
        -> io::Result<()>;

    /// Block until a whole record arrives, and return its content type
    /// and plaintext payload.
    fn receive(&mut self) -> io::Result<(ContentType, Vec<u8>)>;

    /// Protect records sent from now on with the client half of `keys`.
    fn change_write_keys(&mut self, keys: Arc<SessionKeys>);

    /// Unprotect records received from now on with the server half of `keys`.
    fn change_read_keys(&mut self, keys: Arc<SessionKeys>);
}

/// Run a whole client handshake with `host` over `transport`.
///
/// On failure a fatal alert describing the error is sent, unless the
/// peer caused it with an alert of its own or the transport failed.
pub fn complete_handshake<T: RecordTransport + ?Sized>(
    config: Arc<ClientConfig>,
    host: &str,
    transport: &mut T,
) -> Result<EstablishedSession, Error> {
    let mut handshake = ClientHandshake::new(config, host)?;

    let result = drive(&mut handshake, transport);
    if let Err(err) = &result {
        handshake.abort();
        if let Some(alert) = err.alert() {
            send_fatal_alert(handshake.record_version(), alert, transport);
        }
    }
    result
}

fn drive<T: RecordTransport + ?Sized>(
    handshake: &mut ClientHandshake,
    transport: &mut T,
) -> Result<EstablishedSession, Error> {
    let mut deframer = HandshakeDeframer::new();

    let hello = handshake.start()?;
    perform(hello, handshake.record_version(), transport)?;

    loop {
        if let Some(session) = handshake.established() {
            return Ok(session.clone());
        }

        let (typ, payload) = transport.receive()?;
        match typ {
            ContentType::Handshake => {
                deframer.push(&payload)?;
                while let Some(frame) = deframer.pop() {
                    let outputs = handshake.handle(Inbound::Handshake(&frame))?;
                    perform(outputs, handshake.record_version(), transport)?;
                }
            }
            ContentType::ChangeCipherSpec => {
                // CCS must not interrupt a fragmented handshake message.
                if !deframer.is_empty() {
                    return Err(Error::InappropriateMessage {
                        expect_types: vec![ContentType::Handshake],
                        got_type: ContentType::ChangeCipherSpec,
                    });
                }
                let outputs = handshake.handle(Inbound::ChangeCipherSpec(&payload))?;
                perform(outputs, handshake.record_version(), transport)?;
            }
            ContentType::Alert => {
                let alert = AlertMessagePayload::read(&mut Reader::init(&payload))?;
                if !alert.is_fatal() {
                    warn!("Ignoring warning alert {:?}", alert.description);
                    continue;
                }

                error!("Received fatal alert {:?}", alert.description);
                return Err(Error::AlertReceived(alert.description));
            }
            _ => {
                return Err(Error::InappropriateMessage {
                    expect_types: vec![
                        ContentType::Handshake,
                        ContentType::ChangeCipherSpec,
                        ContentType::Alert,
                    ],
                    got_type: typ,
                });
            }
        }
    }
}

fn perform<T: RecordTransport + ?Sized>(
    outputs: Vec<Output>,
    version: ProtocolVersion,
    transport: &mut T,
) -> Result<(), Error> {
    for output in outputs {
        match output {
            Output::Handshake(bytes) => {
                for fragment in bytes.chunks(MAX_FRAGMENT_LEN) {
                    transport.send(ContentType::Handshake, version, fragment)?;
                }
            }
            Output::ChangeCipherSpec(keys) => {
                let ccs = Message::build_change_cipher_spec(version);
                transport.send(ContentType::ChangeCipherSpec, version, &ccs.encoded_payload())?;
                transport.change_write_keys(keys);
            }
            Output::StartDecrypting(keys) => transport.change_read_keys(keys),
        }
    }

    Ok(())
}

fn send_fatal_alert<T: RecordTransport + ?Sized>(
    version: ProtocolVersion,
    desc: AlertDescription,
    transport: &mut T,
) {
    warn!("Sending fatal alert {:?}", desc);
    let m = Message::build_alert(version, AlertLevel::Fatal, desc);
    if let Err(err) = transport.send(ContentType::Alert, version, &m.encoded_payload()) {
        debug!("Could not send alert: {}", err);
    }
}

use core::fmt;
use core::mem;
use std::sync::Arc;

use crate::client::hs::{self, State};
use crate::client::{ClientConfig, Context, EstablishedSession};
use crate::enums::{ContentType, HandshakeType, ProtocolVersion};
use crate::error::Error;
use crate::msgs::message::{Message, MessagePayload};
use crate::secrets::SessionKeys;

/// One message delivered by the record layer.
#[derive(Clone, Copy, Debug)]
pub enum Inbound<'a> {
    /// A single, whole handshake message: header and body.
    Handshake(&'a [u8]),
    /// The payload of a ChangeCipherSpec record.
    ChangeCipherSpec(&'a [u8]),
}

/// Something the record layer must do on our behalf, in order.
#[derive(Debug)]
pub enum Output {
    /// Send this handshake message.
    Handshake(Vec<u8>),
    /// Send a ChangeCipherSpec, then protect everything written after it
    /// with the client half of these keys.
    ChangeCipherSpec(Arc<SessionKeys>),
    /// The server's ChangeCipherSpec has arrived; unprotect everything
    /// read after it with the server half of these keys.
    StartDecrypting(Arc<SessionKeys>),
}

/// How far a handshake has got.
///
/// A full handshake passes through every phase from `Start` to
/// `Finished`, skipping `CertificateVerified` unless we sent a client
/// certificate.  An abbreviated one goes from `HelloReceived` straight
/// to `ChangeCipherSpec`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Nothing has been sent.
    Start,
    /// We sent ClientHello.
    HelloSent,
    /// The server's ServerHello was accepted.
    HelloReceived,
    /// The server's certificate was validated.
    CertificateExchanged,
    /// We sent our key exchange, ChangeCipherSpec and Finished.
    KeyExchanged,
    /// As `KeyExchanged`, having also proved our certificate's key.
    CertificateVerified,
    /// The server's ChangeCipherSpec arrived.
    ChangeCipherSpec,
    /// Both Finished messages were exchanged and verified.
    Finished,
    /// The handshake failed or was abandoned.
    Aborted,
}

/// A client handshake in progress.
///
/// This is sans-IO: call [`ClientHandshake::start`] for the first flight,
/// then feed each message the server sends to [`ClientHandshake::handle`],
/// performing the returned [`Output`]s in order.  The first error is
/// final; every later call returns it again.
pub struct ClientHandshake {
    state: Result<Box<dyn State>, Error>,
    record_version: ProtocolVersion,
}

impl ClientHandshake {
    /// Prepare a handshake with `host`, offering any session cached for it.
    pub fn new(config: Arc<ClientConfig>, host: &str) -> Result<Self, Error> {
        let start = hs::Start::new(config, host)?;
        Ok(Self {
            record_version: start.context().current_version(),
            state: Ok(Box::new(start)),
        })
    }

    /// Produce the ClientHello.
    pub fn start(&mut self) -> Result<Vec<Output>, Error> {
        self.advance(|state, out| state.start(out))
    }

    /// Process one message from the server.
    pub fn handle(&mut self, input: Inbound<'_>) -> Result<Vec<Output>, Error> {
        let version = self.record_version();
        let parsed = match input {
            Inbound::Handshake(bytes) => {
                MessagePayload::new(ContentType::Handshake, version, bytes)
            }
            Inbound::ChangeCipherSpec(bytes) => {
                MessagePayload::new(ContentType::ChangeCipherSpec, version, bytes)
            }
        };

        let m = match parsed {
            Ok(payload) => Message { version, payload },
            Err(err) => {
                let err = Error::from(err);
                return self.advance(|_, _| Err(err));
            }
        };

        // We never renegotiate.
        if m.is_handshake_type(HandshakeType::HelloRequest) && self.state.is_ok() {
            debug!("Ignoring HelloRequest");
            return Ok(Vec::new());
        }

        trace!("Received {:?}", m);
        self.advance(|state, out| state.handle(out, m))
    }

    /// Give up on the handshake, for instance after a timeout.
    ///
    /// A handshake that already finished is unaffected.
    pub fn abort(&mut self) {
        if self.phase() != Phase::Finished {
            self.state = Err(Error::HandshakeAborted);
        }
    }

    /// How far the handshake has got.
    pub fn phase(&self) -> Phase {
        match &self.state {
            Ok(state) => state.phase(),
            Err(_) => Phase::Aborted,
        }
    }

    /// The error that ended the handshake, if it failed.
    pub fn error(&self) -> Option<&Error> {
        self.state.as_ref().err()
    }

    /// The negotiation state, unless the handshake failed.
    pub fn context(&self) -> Option<&Context> {
        self.state
            .as_ref()
            .ok()
            .map(|state| state.context())
    }

    /// The outcome of the handshake, once it is `Finished`.
    pub fn established(&self) -> Option<&EstablishedSession> {
        self.state
            .as_ref()
            .ok()
            .and_then(|state| state.established())
    }

    /// The version to put in record headers: the negotiated one when
    /// known, else the one we offered.  It survives a failure, so the
    /// alert reporting it can be framed.
    pub fn record_version(&self) -> ProtocolVersion {
        self.record_version
    }

    fn advance(
        &mut self,
        f: impl FnOnce(Box<dyn State>, &mut Vec<Output>) -> hs::NextStateOrError,
    ) -> Result<Vec<Output>, Error> {
        let state = match mem::replace(&mut self.state, Err(Error::HandshakeNotComplete)) {
            Ok(state) => state,
            Err(err) => {
                self.state = Err(err.clone());
                return Err(err);
            }
        };

        let mut out = Vec::new();
        match f(state, &mut out) {
            Ok(next) => {
                self.record_version = next.context().current_version();
                self.state = Ok(next);
                Ok(out)
            }
            Err(err) => {
                debug!("Handshake failed: {}", err);
                self.state = Err(err.clone());
                Err(err)
            }
        }
    }
}

impl fmt::Debug for ClientHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandshake")
            .field("phase", &self.phase())
            .field("context", &self.context())
            .finish()
    }
}

use std::collections::VecDeque;

use crate::error::InvalidMessage;
use crate::msgs::codec;

const HEADER_SIZE: usize = 1 + 3;

/// TLS allows for handshake messages of up to 16MB.  We
/// restrict that to 64KB to limit potential for denial-of-
/// service.
const MAX_HANDSHAKE_SIZE: u32 = 0xffff;

/// This works to reconstruct whole handshake messages from the
/// payloads of handshake-content records.  A record may carry a
/// fragment of a message, or several messages.
///
/// Frames are output as raw bytes: parsing a message needs the
/// negotiated protocol version, which only the handshake state knows.
pub struct HandshakeDeframer {
    /// Completed handshake frames for output.
    frames: VecDeque<Vec<u8>>,

    /// The message payload we're currently accumulating.
    buf: Vec<u8>,
}

impl Default for HandshakeDeframer {
    fn default() -> Self {
        Self::new()
    }
}

enum BufferState {
    /// Buffer contains a header that introduces a message that is too long.
    MessageTooLarge,

    /// Buffer contains a full header and body.
    OneMessage(usize),

    /// We need more data to see a header and complete body.
    NeedsMoreData,
}

impl HandshakeDeframer {
    pub fn new() -> Self {
        Self {
            frames: VecDeque::new(),
            buf: Vec::new(),
        }
    }

    /// Do we have any partial message buffered?
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take a record payload, and join/split it as needed.
    ///
    /// Returns a count of how many complete messages we queued.  An
    /// error means the stream is desynchronised beyond repair.
    pub fn push(&mut self, payload: &[u8]) -> Result<usize, InvalidMessage> {
        self.buf.extend_from_slice(payload);

        let mut count = 0;
        loop {
            match self.buf_contains_message() {
                BufferState::MessageTooLarge => {
                    return Err(InvalidMessage::HandshakePayloadTooLarge)
                }
                BufferState::NeedsMoreData => break,
                BufferState::OneMessage(used) => {
                    let rest = self.buf.split_off(used);
                    let frame = core::mem::replace(&mut self.buf, rest);
                    self.frames.push_back(frame);
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    /// The oldest complete message, if any.
    pub fn pop(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// Does our `buf` contain a full handshake payload?  It does if it is big
    /// enough to contain a header, and that header has a length which falls
    /// within `buf`.
    fn buf_contains_message(&self) -> BufferState {
        if self.buf.len() < HEADER_SIZE {
            return BufferState::NeedsMoreData;
        }

        let (header, rest) = self.buf.split_at(HEADER_SIZE);
        match codec::u24::decode(&header[1..]) {
            Some(len) if len.0 > MAX_HANDSHAKE_SIZE => BufferState::MessageTooLarge,
            Some(len) if rest.len() >= usize::from(len) => {
                BufferState::OneMessage(HEADER_SIZE + usize::from(len))
            }
            _ => BufferState::NeedsMoreData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HandshakeDeframer;
    use crate::error::InvalidMessage;

    const HELLO_DONE: [u8; 4] = [0x0e, 0x00, 0x00, 0x00];

    #[test]
    fn want() {
        let mut hj = HandshakeDeframer::new();
        assert!(hj.is_empty());
        assert_eq!(hj.pop(), None);
    }

    #[test]
    fn split() {
        // Check we split two handshake messages within one PDU.
        let mut hj = HandshakeDeframer::new();
        let mut payload = HELLO_DONE.to_vec();
        payload.extend_from_slice(&HELLO_DONE);

        assert_eq!(hj.push(&payload), Ok(2));
        assert!(hj.is_empty());
        assert_eq!(hj.pop(), Some(HELLO_DONE.to_vec()));
        assert_eq!(hj.pop(), Some(HELLO_DONE.to_vec()));
        assert_eq!(hj.pop(), None);
    }

    #[test]
    fn join() {
        // Check we join one handshake message split over two PDUs.
        let mut hj = HandshakeDeframer::new();
        let finished = [0x14, 0x00, 0x00, 0x0c, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

        assert_eq!(hj.push(&finished[..6]), Ok(0));
        assert!(!hj.is_empty());
        assert_eq!(hj.push(&finished[6..]), Ok(1));
        assert!(hj.is_empty());
        assert_eq!(hj.pop(), Some(finished.to_vec()));
    }

    #[test]
    fn header_split_over_records() {
        let mut hj = HandshakeDeframer::new();
        assert_eq!(hj.push(&HELLO_DONE[..1]), Ok(0));
        assert_eq!(hj.push(&HELLO_DONE[1..3]), Ok(0));
        assert_eq!(hj.push(&HELLO_DONE[3..]), Ok(1));
        assert_eq!(hj.pop(), Some(HELLO_DONE.to_vec()));
    }

    #[test]
    fn too_big() {
        let mut hj = HandshakeDeframer::new();
        assert_eq!(
            hj.push(&[0x0b, 0x01, 0x00, 0x00]),
            Err(InvalidMessage::HandshakePayloadTooLarge)
        );
    }
}

use md5::{Digest, Md5};
use sha1::Sha1;

use crate::msgs::message::{Message, MessagePayload};

/// The running transcript of a handshake.
///
/// Every handshake message is added exactly once, in wire order, as
/// it was encoded on the wire.  SSL3 and TLS1.0 both hash the transcript
/// with MD5 and SHA-1 side by side, so we keep both contexts running
/// and fork them whenever a digest is needed.
#[derive(Clone)]
pub struct HandshakeTranscript {
    buffer: Vec<u8>,
    md5: Md5,
    sha1: Sha1,
}

impl HandshakeTranscript {
    /// An empty transcript.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            md5: Md5::new(),
            sha1: Sha1::new(),
        }
    }

    /// Hash/buffer a handshake message.
    pub fn add_message(&mut self, m: &Message) -> &mut Self {
        if let MessagePayload::Handshake { encoded, .. } = &m.payload {
            self.update_raw(encoded.bytes());
        }
        self
    }

    /// Hash and buffer a byte slice.
    pub fn update_raw(&mut self, buf: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(buf);
        self.md5.update(buf);
        self.sha1.update(buf);
        self
    }

    /// A fork of the running MD5 context.
    pub(crate) fn md5(&self) -> Md5 {
        self.md5.clone()
    }

    /// A fork of the running SHA-1 context.
    pub(crate) fn sha1(&self) -> Sha1 {
        self.sha1.clone()
    }

    /// `MD5(transcript) ‖ SHA1(transcript)`.
    pub(crate) fn current_hash(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..16].copy_from_slice(&self.md5().finalize());
        out[16..].copy_from_slice(&self.sha1().finalize());
        out
    }

    /// Every message added so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::HandshakeTranscript;
    use md5::{Digest, Md5};
    use sha1::Sha1;

    #[test]
    fn hashes_correctly() {
        let mut hs = HandshakeTranscript::new();
        hs.update_raw(b"hello");
        assert_eq!(hs.bytes().len(), 5);
        hs.update_raw(b"world");
        assert_eq!(hs.bytes(), b"helloworld");

        let h = hs.current_hash();
        assert_eq!(&h[..16], &Md5::digest(b"helloworld")[..]);
        assert_eq!(&h[16..], &Sha1::digest(b"helloworld")[..]);
    }

    #[test]
    fn forks_do_not_disturb_running_hash() {
        let mut hs = HandshakeTranscript::new();
        hs.update_raw(b"hello");
        let before = hs.current_hash();
        let mut fork = hs.md5();
        fork.update(b"extra");
        assert_eq!(hs.current_hash(), before);
    }

    #[test]
    fn order_matters() {
        let mut a = HandshakeTranscript::new();
        a.update_raw(b"first").update_raw(b"second");
        let mut b = HandshakeTranscript::new();
        b.update_raw(b"second").update_raw(b"first");
        assert_ne!(a.current_hash(), b.current_hash());
    }
}

//! SSL 3.0 key derivation and handshake MACs.
//!
//! SSL3 predates the TLS PRF.  Secrets are expanded with nested MD5/SHA-1
//! hashes over salts `"A"`, `"BB"`, `"CCC"`, ..., and the Finished and
//! CertificateVerify digests are keyed MACs over the transcript built from
//! fixed pad bytes.

use md5::{Digest, Md5};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::hash_hs::HandshakeTranscript;
use crate::secrets::ConnectionRandoms;
use crate::tls10::ExportKeys;

/// Sender marker mixed into the client's Finished: "CLNT".
pub(crate) const CLIENT_SENDER: [u8; 4] = [0x43, 0x4c, 0x4e, 0x54];

/// Sender marker mixed into the server's Finished: "SRVR".
pub(crate) const SERVER_SENDER: [u8; 4] = [0x53, 0x52, 0x56, 0x52];

const PAD1: u8 = 0x36;
const PAD2: u8 = 0x5c;
const MD5_PAD_LEN: usize = 48;
const SHA1_PAD_LEN: usize = 40;

/// `out = MD5(secret + SHA1("A" + secret + first + second)) +
///        MD5(secret + SHA1("BB" + secret + first + second)) + ...`
fn expand(out: &mut [u8], secret: &[u8], first: &[u8; 32], second: &[u8; 32]) {
    for (i, chunk) in out.chunks_mut(16).enumerate() {
        let salt = vec![b'A' + i as u8; i + 1];
        let inner = Sha1::new()
            .chain_update(&salt)
            .chain_update(secret)
            .chain_update(first)
            .chain_update(second)
            .finalize();
        let outer = Md5::new()
            .chain_update(secret)
            .chain_update(inner)
            .finalize();
        chunk.copy_from_slice(&outer[..chunk.len()]);
    }
}

pub(crate) fn master_secret(premaster: &[u8], randoms: &ConnectionRandoms) -> [u8; 48] {
    let mut out = [0u8; 48];
    expand(&mut out, premaster, &randoms.client, &randoms.server);
    out
}

pub(crate) fn key_block(
    master_secret: &[u8; 48],
    randoms: &ConnectionRandoms,
    len: usize,
) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(vec![0u8; len]);
    expand(&mut out, master_secret, &randoms.server, &randoms.client);
    out
}

/// `MD5(ms + pad2 + MD5(hs + sender + ms + pad1)) ‖
///  SHA1(ms + pad2 + SHA1(hs + sender + ms + pad1))`
fn transcript_mac(
    master_secret: &[u8; 48],
    transcript: &HandshakeTranscript,
    sender: Option<&[u8; 4]>,
) -> [u8; 36] {
    let sender: &[u8] = match sender {
        Some(sender) => sender,
        None => &[],
    };

    let md5_inner = transcript
        .md5()
        .chain_update(sender)
        .chain_update(master_secret)
        .chain_update([PAD1; MD5_PAD_LEN])
        .finalize();
    let md5_outer = Md5::new()
        .chain_update(master_secret)
        .chain_update([PAD2; MD5_PAD_LEN])
        .chain_update(md5_inner)
        .finalize();

    let sha1_inner = transcript
        .sha1()
        .chain_update(sender)
        .chain_update(master_secret)
        .chain_update([PAD1; SHA1_PAD_LEN])
        .finalize();
    let sha1_outer = Sha1::new()
        .chain_update(master_secret)
        .chain_update([PAD2; SHA1_PAD_LEN])
        .chain_update(sha1_inner)
        .finalize();

    let mut out = [0u8; 36];
    out[..16].copy_from_slice(&md5_outer);
    out[16..].copy_from_slice(&sha1_outer);
    out
}

/// The 36-byte Finished body for the side named by `sender`.
pub(crate) fn verify_data(
    master_secret: &[u8; 48],
    transcript: &HandshakeTranscript,
    sender: &[u8; 4],
) -> Vec<u8> {
    transcript_mac(master_secret, transcript, Some(sender)).to_vec()
}

/// The digest a client certificate key signs.  This is the Finished
/// construction without a sender marker.
pub(crate) fn certificate_verify_digest(
    master_secret: &[u8; 48],
    transcript: &HandshakeTranscript,
) -> [u8; 36] {
    transcript_mac(master_secret, transcript, None)
}

pub(crate) fn export_keys(
    client_key: &[u8],
    server_key: &[u8],
    randoms: &ConnectionRandoms,
    expanded_key_len: usize,
    iv_len: usize,
) -> ExportKeys {
    let client_key_hash = Md5::new()
        .chain_update(client_key)
        .chain_update(randoms.client)
        .chain_update(randoms.server)
        .finalize();
    let server_key_hash = Md5::new()
        .chain_update(server_key)
        .chain_update(randoms.server)
        .chain_update(randoms.client)
        .finalize();
    let client_iv = Md5::new()
        .chain_update(randoms.client)
        .chain_update(randoms.server)
        .finalize();
    let server_iv = Md5::new()
        .chain_update(randoms.server)
        .chain_update(randoms.client)
        .finalize();

    ExportKeys {
        client_write_key: Zeroizing::new(client_key_hash[..expanded_key_len].to_vec()),
        server_write_key: Zeroizing::new(server_key_hash[..expanded_key_len].to_vec()),
        client_iv: client_iv[..iv_len].to_vec(),
        server_iv: server_iv[..iv_len].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn randoms() -> ConnectionRandoms {
        ConnectionRandoms::new([1u8; 32], [2u8; 32])
    }

    fn transcript() -> HandshakeTranscript {
        let mut hs = HandshakeTranscript::new();
        hs.update_raw(b"client hello")
            .update_raw(b"server hello");
        hs
    }

    #[test]
    fn master_secret_first_block() {
        let premaster = [7u8; 48];
        let ms = master_secret(&premaster, &randoms());

        let inner = Sha1::new()
            .chain_update(b"A")
            .chain_update(premaster)
            .chain_update([1u8; 32])
            .chain_update([2u8; 32])
            .finalize();
        let outer = Md5::new()
            .chain_update(premaster)
            .chain_update(inner)
            .finalize();
        assert_eq!(&ms[..16], &outer[..]);
    }

    #[test]
    fn key_block_is_a_prefix_stream() {
        let ms = [9u8; 48];
        let short = key_block(&ms, &randoms(), 20);
        let long = key_block(&ms, &randoms(), 64);
        assert_eq!(&short[..], &long[..20]);
        assert_ne!(&long[..16], &long[16..32]);
    }

    #[test]
    fn finished_depends_on_sender() {
        let ms = [3u8; 48];
        let hs = transcript();
        let client = verify_data(&ms, &hs, &CLIENT_SENDER);
        let server = verify_data(&ms, &hs, &SERVER_SENDER);
        assert_eq!(client.len(), 36);
        assert_ne!(client, server);
        assert_eq!(client, verify_data(&ms, &hs, &CLIENT_SENDER));
        assert_ne!(&client[..], &certificate_verify_digest(&ms, &hs)[..]);
    }

    #[test]
    fn export_keys_are_directional() {
        let keys = export_keys(&[5u8; 5], &[5u8; 5], &randoms(), 16, 8);
        assert_ne!(&keys.client_write_key[..], &keys.server_write_key[..]);
        assert_ne!(keys.client_iv, keys.server_iv);
        assert_eq!(keys.client_iv.len(), 8);
        assert_eq!(
            keys.client_iv,
            Md5::new()
                .chain_update([1u8; 32])
                .chain_update([2u8; 32])
                .finalize()[..8]
                .to_vec()
        );
    }

    // Fixed inputs: client random 00..1f, server random 20..3f, premaster
    // 03 00 40..6d, transcript "client hello" + "server hello".
    mod known_answers {
        use super::super::*;

        fn unhex(s: &str) -> Vec<u8> {
            (0..s.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
                .collect()
        }

        fn randoms() -> ConnectionRandoms {
            let mut client = [0u8; 32];
            let mut server = [0u8; 32];
            for i in 0..32 {
                client[i] = i as u8;
                server[i] = 0x20 + i as u8;
            }
            ConnectionRandoms::new(client, server)
        }

        fn premaster() -> Vec<u8> {
            let mut pm = vec![0x03, 0x00];
            pm.extend(0x40..0x40 + 46u8);
            pm
        }

        fn master() -> [u8; 48] {
            master_secret(&premaster(), &randoms())
        }

        fn transcript() -> HandshakeTranscript {
            let mut hs = HandshakeTranscript::new();
            hs.update_raw(b"client hello")
                .update_raw(b"server hello");
            hs
        }

        #[test]
        fn master_secret_vector() {
            assert_eq!(
                master().to_vec(),
                unhex(
                    "eea6e0aac419b1e12355342bc26f255fd9deef9c9b0636e912cd2a737d106fe6\
                     dc74adbd17767f69c2bcc6c093b27fae"
                )
            );
        }

        #[test]
        fn key_block_vector() {
            let block = key_block(&master(), &randoms(), 104);
            assert_eq!(
                block.to_vec(),
                unhex(
                    "c260ab597c93bcba8fa0b89b7a2678daa1b20382145699092ef827aaf43fcb24\
                     655741aeef6ee5f737d32ec208dd728df99287eb93142196d734470d8e94d270\
                     283bccc917212492424ff9afb593acd719bf6070881ba25ad41c746ba0755a2f\
                     b5fbf969c49bb685"
                )
            );
        }

        #[test]
        fn finished_vectors() {
            let ms = master();
            let hs = transcript();
            assert_eq!(
                verify_data(&ms, &hs, &CLIENT_SENDER),
                unhex(
                    "f27710628fdf3178bab4280f46ca5e401c7377746501e317865fb1d5c2b1a7f2\
                     67ee40af"
                )
            );
            assert_eq!(
                verify_data(&ms, &hs, &SERVER_SENDER),
                unhex(
                    "a5c4244b52011dd2b48323cb8fd66d7029f631c6b7b6c3f9b1a5aafeecbd3978\
                     0c3518f0"
                )
            );
        }

        #[test]
        fn certificate_verify_vector() {
            assert_eq!(
                certificate_verify_digest(&master(), &transcript()).to_vec(),
                unhex(
                    "f079400af7b369df8ef3885eace06bb4717279d380030266efa97d01e5f13534\
                     983ba95d"
                )
            );
        }

        #[test]
        fn export_key_vectors() {
            let client_key: Vec<u8> = (0x60..0x65).collect();
            let server_key: Vec<u8> = (0x70..0x75).collect();
            let keys = export_keys(&client_key, &server_key, &randoms(), 16, 8);
            assert_eq!(
                keys.client_write_key.to_vec(),
                unhex("edec748c1a6e8770345b8a72f26b4ea1")
            );
            assert_eq!(
                keys.server_write_key.to_vec(),
                unhex("7c5c7c5b9ad215d12ebd2df4c1ece821")
            );
            assert_eq!(keys.client_iv, unhex("b2d3f56bc197fd98"));
            assert_eq!(keys.server_iv, unhex("db25eda3880f5a4a"));
        }
    }
}

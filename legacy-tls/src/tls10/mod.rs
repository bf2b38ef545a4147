//! TLS1.0 key derivation, with the MD5/SHA-1 PRF of RFC 2246.

use zeroize::Zeroizing;

use crate::hash_hs::HandshakeTranscript;
use crate::secrets::ConnectionRandoms;

pub(crate) mod prf;

pub(crate) const CLIENT_FINISHED_LABEL: &[u8] = b"client finished";
pub(crate) const SERVER_FINISHED_LABEL: &[u8] = b"server finished";

pub(crate) fn master_secret(premaster: &[u8], randoms: &ConnectionRandoms) -> [u8; 48] {
    let mut out = [0u8; 48];
    prf::prf(
        &mut out,
        premaster,
        b"master secret",
        &randoms.client_server(),
    );
    out
}

pub(crate) fn key_block(
    master_secret: &[u8; 48],
    randoms: &ConnectionRandoms,
    len: usize,
) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(vec![0u8; len]);
    prf::prf(
        &mut out,
        master_secret,
        b"key expansion",
        &randoms.server_client(),
    );
    out
}

/// The 12-byte Finished body for the side named by `label`.
pub(crate) fn verify_data(
    master_secret: &[u8; 48],
    transcript: &HandshakeTranscript,
    label: &[u8],
) -> Vec<u8> {
    let mut out = vec![0u8; 12];
    prf::prf(&mut out, master_secret, label, &transcript.current_hash());
    out
}

/// The digest a client certificate key signs: `MD5(hs) ‖ SHA1(hs)`.
pub(crate) fn certificate_verify_digest(transcript: &HandshakeTranscript) -> [u8; 36] {
    transcript.current_hash()
}

/// Expand the short keys of an export suite, and derive its IVs, which
/// export suites take from public values only.
pub(crate) fn export_keys(
    client_key: &[u8],
    server_key: &[u8],
    randoms: &ConnectionRandoms,
    expanded_key_len: usize,
    iv_len: usize,
) -> ExportKeys {
    let seed = randoms.client_server();

    let mut client_write_key = Zeroizing::new(vec![0u8; expanded_key_len]);
    prf::prf(&mut client_write_key, client_key, b"client write key", &seed);

    let mut server_write_key = Zeroizing::new(vec![0u8; expanded_key_len]);
    prf::prf(&mut server_write_key, server_key, b"server write key", &seed);

    let mut iv_block = vec![0u8; 2 * iv_len];
    prf::prf(&mut iv_block, &[], b"IV block", &seed);
    let server_iv = iv_block.split_off(iv_len);

    ExportKeys {
        client_write_key,
        server_write_key,
        client_iv: iv_block,
        server_iv,
    }
}

/// Final keys of an export suite.
pub(crate) struct ExportKeys {
    pub(crate) client_write_key: Zeroizing<Vec<u8>>,
    pub(crate) server_write_key: Zeroizing<Vec<u8>>,
    pub(crate) client_iv: Vec<u8>,
    pub(crate) server_iv: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn randoms() -> ConnectionRandoms {
        ConnectionRandoms::new([1u8; 32], [2u8; 32])
    }

    #[test]
    fn finished_labels_differ() {
        let mut hs = HandshakeTranscript::new();
        hs.update_raw(b"transcript");
        let ms = master_secret(&[3u8; 48], &randoms());
        let client = verify_data(&ms, &hs, CLIENT_FINISHED_LABEL);
        let server = verify_data(&ms, &hs, SERVER_FINISHED_LABEL);
        assert_eq!(client.len(), 12);
        assert_ne!(client, server);
        assert_eq!(client, verify_data(&ms, &hs, CLIENT_FINISHED_LABEL));
    }

    #[test]
    fn key_block_uses_server_random_first() {
        let ms = [4u8; 48];
        let swapped = ConnectionRandoms::new([2u8; 32], [1u8; 32]);
        assert_ne!(
            &key_block(&ms, &randoms(), 40)[..],
            &key_block(&ms, &swapped, 40)[..]
        );

        let mut expect = [0u8; 40];
        prf::prf(&mut expect, &ms, b"key expansion", &randoms().server_client());
        assert_eq!(&key_block(&ms, &randoms(), 40)[..], &expect[..]);
    }

    #[test]
    fn export_ivs_come_from_one_block() {
        let keys = export_keys(&[5u8; 5], &[6u8; 5], &randoms(), 16, 8);
        assert_eq!(keys.client_write_key.len(), 16);
        assert_eq!(keys.server_write_key.len(), 16);
        assert_ne!(&keys.client_write_key[..], &keys.server_write_key[..]);

        let mut iv_block = [0u8; 16];
        prf::prf(&mut iv_block, &[], b"IV block", &randoms().client_server());
        assert_eq!(keys.client_iv, iv_block[..8].to_vec());
        assert_eq!(keys.server_iv, iv_block[8..].to_vec());
    }
}

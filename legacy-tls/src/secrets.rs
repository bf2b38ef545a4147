use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use crate::crypto::SecureRandom;
use crate::enums::ProtocolVersion;
use crate::hash_hs::HandshakeTranscript;
use crate::rand::GetRandomFailed;
use crate::suites::SupportedCipherSuite;
use crate::{ssl3, tls10};

/// The client and server hello randoms of one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionRandoms {
    /// From our ClientHello.
    pub client: [u8; 32],
    /// From the ServerHello.
    pub server: [u8; 32],
}

impl ConnectionRandoms {
    #[allow(missing_docs)]
    pub fn new(client: [u8; 32], server: [u8; 32]) -> Self {
        Self { client, server }
    }

    /// `client_random ‖ server_random`
    pub(crate) fn client_server(&self) -> [u8; 64] {
        join_randoms(&self.client, &self.server)
    }

    /// `server_random ‖ client_random`
    pub(crate) fn server_client(&self) -> [u8; 64] {
        join_randoms(&self.server, &self.client)
    }
}

fn join_randoms(first: &[u8; 32], second: &[u8; 32]) -> [u8; 64] {
    let mut randoms = [0u8; 64];
    randoms[..32].copy_from_slice(first);
    randoms[32..].copy_from_slice(second);
    randoms
}

/// A fresh RSA premaster secret: the version the client offered, then 46
/// random bytes.
pub fn premaster_secret(
    client_version: ProtocolVersion,
    secure_random: &dyn SecureRandom,
) -> Result<Zeroizing<[u8; 48]>, GetRandomFailed> {
    let mut pms = Zeroizing::new([0u8; 48]);
    pms[..2].copy_from_slice(&u16::from(client_version).to_be_bytes());
    secure_random.fill(&mut pms[2..])?;
    Ok(pms)
}

/// Key material for one direction of the record layer.
pub struct DirectionKeys {
    /// The MAC secret.
    pub mac_secret: Vec<u8>,
    /// The bulk cipher key, already expanded for export suites.
    pub write_key: Vec<u8>,
    /// The initial CBC IV; empty for stream ciphers.
    pub iv: Vec<u8>,
}

impl Drop for DirectionKeys {
    fn drop(&mut self) {
        self.mac_secret.zeroize();
        self.write_key.zeroize();
        self.iv.zeroize();
    }
}

impl fmt::Debug for DirectionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectionKeys")
            .finish_non_exhaustive()
    }
}

/// The keys the record layer installs at ChangeCipherSpec.
#[derive(Debug)]
pub struct SessionKeys {
    /// The negotiated suite, naming the bulk cipher and MAC.
    pub suite: &'static SupportedCipherSuite,
    /// The negotiated protocol version.
    pub version: ProtocolVersion,
    /// Keys protecting records the client writes.
    pub client: DirectionKeys,
    /// Keys protecting records the server writes.
    pub server: DirectionKeys,
}

/// Secrets derived during a handshake, and the operations over them.
///
/// SSL3 and TLS1.0 derive every value differently; each method picks the
/// construction for the negotiated version.
pub struct ConnectionSecrets {
    pub(crate) randoms: ConnectionRandoms,
    suite: &'static SupportedCipherSuite,
    version: ProtocolVersion,
    master_secret: Zeroizing<[u8; 48]>,
}

impl ConnectionSecrets {
    /// Derive the master secret of a full handshake from `premaster`.
    pub fn from_premaster(
        premaster: &[u8],
        randoms: ConnectionRandoms,
        suite: &'static SupportedCipherSuite,
        version: ProtocolVersion,
    ) -> Self {
        let master_secret = match version {
            ProtocolVersion::SSLv3 => ssl3::master_secret(premaster, &randoms),
            _ => tls10::master_secret(premaster, &randoms),
        };

        Self {
            randoms,
            suite,
            version,
            master_secret: Zeroizing::new(master_secret),
        }
    }

    /// Take up a cached master secret for an abbreviated handshake.
    pub fn new_resume(
        randoms: ConnectionRandoms,
        suite: &'static SupportedCipherSuite,
        version: ProtocolVersion,
        master_secret: &[u8; 48],
    ) -> Self {
        Self {
            randoms,
            suite,
            version,
            master_secret: Zeroizing::new(*master_secret),
        }
    }

    pub(crate) fn suite(&self) -> &'static SupportedCipherSuite {
        self.suite
    }

    /// The 48-byte master secret, for caching.
    pub fn master_secret(&self) -> &[u8; 48] {
        &self.master_secret
    }

    fn make_key_block(&self) -> Zeroizing<Vec<u8>> {
        let len = self.suite.key_block_len();
        match self.version {
            ProtocolVersion::SSLv3 => ssl3::key_block(&self.master_secret, &self.randoms, len),
            _ => tls10::key_block(&self.master_secret, &self.randoms, len),
        }
    }

    /// Make the record layer keys, chopping up the key block.
    pub fn session_keys(&self) -> SessionKeys {
        let suite = self.suite;
        let key_block = self.make_key_block();

        let (client_mac, rest) = key_block.split_at(suite.mac.output_len());
        let (server_mac, rest) = rest.split_at(suite.mac.output_len());
        let (client_key, rest) = rest.split_at(suite.key_len);
        let (server_key, rest) = rest.split_at(suite.key_len);

        let (client_write_key, server_write_key, client_iv, server_iv) = if suite.exportable {
            let keys = match self.version {
                ProtocolVersion::SSLv3 => ssl3::export_keys(
                    client_key,
                    server_key,
                    &self.randoms,
                    suite.expanded_key_len,
                    suite.iv_len,
                ),
                _ => tls10::export_keys(
                    client_key,
                    server_key,
                    &self.randoms,
                    suite.expanded_key_len,
                    suite.iv_len,
                ),
            };
            (
                keys.client_write_key.to_vec(),
                keys.server_write_key.to_vec(),
                keys.client_iv,
                keys.server_iv,
            )
        } else {
            let (client_iv, rest) = rest.split_at(suite.iv_len);
            let (server_iv, _) = rest.split_at(suite.iv_len);
            (
                client_key.to_vec(),
                server_key.to_vec(),
                client_iv.to_vec(),
                server_iv.to_vec(),
            )
        };

        SessionKeys {
            suite,
            version: self.version,
            client: DirectionKeys {
                mac_secret: client_mac.to_vec(),
                write_key: client_write_key,
                iv: client_iv,
            },
            server: DirectionKeys {
                mac_secret: server_mac.to_vec(),
                write_key: server_write_key,
                iv: server_iv,
            },
        }
    }

    /// The client's Finished body over `transcript`.
    pub fn client_verify_data(&self, transcript: &HandshakeTranscript) -> Vec<u8> {
        match self.version {
            ProtocolVersion::SSLv3 => {
                ssl3::verify_data(&self.master_secret, transcript, &ssl3::CLIENT_SENDER)
            }
            _ => tls10::verify_data(
                &self.master_secret,
                transcript,
                tls10::CLIENT_FINISHED_LABEL,
            ),
        }
    }

    /// The Finished body expected from the server over `transcript`.
    pub fn server_verify_data(&self, transcript: &HandshakeTranscript) -> Vec<u8> {
        match self.version {
            ProtocolVersion::SSLv3 => {
                ssl3::verify_data(&self.master_secret, transcript, &ssl3::SERVER_SENDER)
            }
            _ => tls10::verify_data(
                &self.master_secret,
                transcript,
                tls10::SERVER_FINISHED_LABEL,
            ),
        }
    }

    /// The 36-byte digest signed in a CertificateVerify.
    pub fn certificate_verify_digest(&self, transcript: &HandshakeTranscript) -> [u8; 36] {
        match self.version {
            ProtocolVersion::SSLv3 => {
                ssl3::certificate_verify_digest(&self.master_secret, transcript)
            }
            _ => tls10::certificate_verify_digest(transcript),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::OsRandom;
    use crate::suites::{
        TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5, TLS_RSA_WITH_AES_128_CBC_SHA,
        TLS_RSA_WITH_RC4_128_MD5,
    };

    fn randoms() -> ConnectionRandoms {
        ConnectionRandoms::new([0x11; 32], [0x22; 32])
    }

    #[test]
    fn premaster_carries_client_version() {
        let pms = premaster_secret(ProtocolVersion::TLSv1_0, &OsRandom).unwrap();
        assert_eq!(&pms[..2], &[0x03, 0x01]);
        let pms = premaster_secret(ProtocolVersion::SSLv3, &OsRandom).unwrap();
        assert_eq!(&pms[..2], &[0x03, 0x00]);
    }

    #[test]
    fn randoms_concatenate_both_ways() {
        let r = randoms();
        assert_eq!(&r.client_server()[..32], &[0x11; 32]);
        assert_eq!(&r.server_client()[..32], &[0x22; 32]);
    }

    #[test]
    fn versions_derive_different_master_secrets() {
        let pms = [0x33u8; 48];
        let tls = ConnectionSecrets::from_premaster(
            &pms,
            randoms(),
            &TLS_RSA_WITH_RC4_128_MD5,
            ProtocolVersion::TLSv1_0,
        );
        let ssl = ConnectionSecrets::from_premaster(
            &pms,
            randoms(),
            &TLS_RSA_WITH_RC4_128_MD5,
            ProtocolVersion::SSLv3,
        );
        assert_ne!(tls.master_secret(), ssl.master_secret());
    }

    #[test]
    fn derivation_is_deterministic() {
        let pms = [0x44u8; 48];
        let mut hs = HandshakeTranscript::new();
        hs.update_raw(b"messages");

        for version in [ProtocolVersion::SSLv3, ProtocolVersion::TLSv1_0] {
            let a = ConnectionSecrets::from_premaster(
                &pms,
                randoms(),
                &TLS_RSA_WITH_RC4_128_MD5,
                version,
            );
            let b = ConnectionSecrets::new_resume(
                randoms(),
                &TLS_RSA_WITH_RC4_128_MD5,
                version,
                a.master_secret(),
            );
            assert_eq!(a.client_verify_data(&hs), b.client_verify_data(&hs));
            assert_eq!(a.server_verify_data(&hs), b.server_verify_data(&hs));
            assert_eq!(
                a.certificate_verify_digest(&hs),
                b.certificate_verify_digest(&hs)
            );
            assert_eq!(
                a.session_keys().client.write_key,
                b.session_keys().client.write_key
            );
        }
    }

    #[test]
    fn key_block_is_split_by_suite_geometry() {
        let secrets = ConnectionSecrets::from_premaster(
            &[0x55u8; 48],
            randoms(),
            &TLS_RSA_WITH_AES_128_CBC_SHA,
            ProtocolVersion::TLSv1_0,
        );
        let keys = secrets.session_keys();
        assert_eq!(keys.client.mac_secret.len(), 20);
        assert_eq!(keys.server.write_key.len(), 16);
        assert_eq!(keys.client.iv.len(), 16);

        let block = secrets.make_key_block();
        assert_eq!(&block[..20], &keys.client.mac_secret[..]);
        assert_eq!(&block[40..56], &keys.client.write_key[..]);
        assert_eq!(&block[88..104], &keys.server.iv[..]);
    }

    #[test]
    fn export_keys_are_expanded() {
        for version in [ProtocolVersion::SSLv3, ProtocolVersion::TLSv1_0] {
            let secrets = ConnectionSecrets::from_premaster(
                &[0x66u8; 48],
                randoms(),
                &TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5,
                version,
            );
            let keys = secrets.session_keys();
            assert_eq!(keys.client.mac_secret.len(), 16);
            assert_eq!(keys.client.write_key.len(), 16);
            assert_eq!(keys.server.write_key.len(), 16);
            assert_eq!(keys.client.iv.len(), 8);
            assert_ne!(keys.client.iv, keys.server.iv);
        }
    }
}

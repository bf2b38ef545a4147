use std::fmt;

use crate::enums::{CipherSuite, ProtocolVersion};

/// How the premaster secret reaches the server, and so what the server's
/// certificate key must be allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyExchangeAlgorithm {
    /// The premaster secret is encrypted to the certificate's RSA key.
    RsaKeyX,
    /// The certificate's RSA key signs an ephemeral RSA key, which then
    /// transports the premaster secret.  Used by export suites.
    RsaSign,
    /// Diffie-Hellman key agreement against the certificate key.
    DiffieHellman,
    /// Fortezza KEA.  Never supported.
    Fortezza,
}

/// The bulk cipher of a suite.
///
/// Bulk encryption happens in the record layer; the handshake only needs
/// the key geometry.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkAlgorithm {
    Rc4,
    Rc2Cbc,
    DesCbc,
    TripleDesCbc,
    Aes128Cbc,
    Aes256Cbc,
}

/// The record MAC of a suite.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MacAlgorithm {
    Md5,
    Sha1,
}

impl MacAlgorithm {
    /// Length of the MAC secret, which is also the MAC output length.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
        }
    }
}

/// A cipher suite supported by legacy-tls.
///
/// All suites use RSA for authentication and key transport.
pub struct SupportedCipherSuite {
    /// The TLS enumeration naming this cipher suite.
    pub suite: CipherSuite,

    /// How the client transports the premaster secret.
    pub kx: KeyExchangeAlgorithm,

    /// The bulk cipher.
    pub bulk: BulkAlgorithm,

    /// The record MAC.
    pub mac: MacAlgorithm,

    /// Bytes of key material taken from the key block per direction.
    pub key_len: usize,

    /// For export suites, the length the key block's short key is
    /// expanded to.  Equal to `key_len` otherwise.
    pub expanded_key_len: usize,

    /// Length of the CBC initialisation vector; zero for stream ciphers.
    pub iv_len: usize,

    /// Export suites carry a short key, and allow the server to send an
    /// ephemeral RSA key in a ServerKeyExchange.
    pub exportable: bool,

    /// The lowest protocol version this suite may be negotiated at.
    pub min_version: ProtocolVersion,
}

impl SupportedCipherSuite {
    /// Can this suite be negotiated at `version`?
    pub fn usable_for_version(&self, version: ProtocolVersion) -> bool {
        version >= self.min_version
            && matches!(
                version,
                ProtocolVersion::SSLv3 | ProtocolVersion::TLSv1_0
            )
    }

    /// The number of key block bytes this suite consumes.
    pub fn key_block_len(&self) -> usize {
        2 * (self.mac.output_len() + self.key_len + self.iv_len)
    }

    /// Does this suite use a ServerKeyExchange message?
    pub fn uses_server_key_exchange(&self) -> bool {
        self.exportable && self.kx == KeyExchangeAlgorithm::RsaSign
    }
}

impl fmt::Debug for SupportedCipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.suite, f)
    }
}

impl PartialEq for SupportedCipherSuite {
    fn eq(&self, other: &Self) -> bool {
        self.suite == other.suite
    }
}

pub static TLS_RSA_WITH_AES_256_CBC_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
    kx: KeyExchangeAlgorithm::RsaKeyX,
    bulk: BulkAlgorithm::Aes256Cbc,
    mac: MacAlgorithm::Sha1,
    key_len: 32,
    expanded_key_len: 32,
    iv_len: 16,
    exportable: false,
    min_version: ProtocolVersion::TLSv1_0,
};

pub static TLS_RSA_WITH_AES_128_CBC_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
    kx: KeyExchangeAlgorithm::RsaKeyX,
    bulk: BulkAlgorithm::Aes128Cbc,
    mac: MacAlgorithm::Sha1,
    key_len: 16,
    expanded_key_len: 16,
    iv_len: 16,
    exportable: false,
    min_version: ProtocolVersion::TLSv1_0,
};

pub static TLS_RSA_WITH_3DES_EDE_CBC_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA,
    kx: KeyExchangeAlgorithm::RsaKeyX,
    bulk: BulkAlgorithm::TripleDesCbc,
    mac: MacAlgorithm::Sha1,
    key_len: 24,
    expanded_key_len: 24,
    iv_len: 8,
    exportable: false,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_WITH_RC4_128_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_WITH_RC4_128_SHA,
    kx: KeyExchangeAlgorithm::RsaKeyX,
    bulk: BulkAlgorithm::Rc4,
    mac: MacAlgorithm::Sha1,
    key_len: 16,
    expanded_key_len: 16,
    iv_len: 0,
    exportable: false,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_WITH_RC4_128_MD5: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_WITH_RC4_128_MD5,
    kx: KeyExchangeAlgorithm::RsaKeyX,
    bulk: BulkAlgorithm::Rc4,
    mac: MacAlgorithm::Md5,
    key_len: 16,
    expanded_key_len: 16,
    iv_len: 0,
    exportable: false,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_WITH_DES_CBC_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_WITH_DES_CBC_SHA,
    kx: KeyExchangeAlgorithm::RsaKeyX,
    bulk: BulkAlgorithm::DesCbc,
    mac: MacAlgorithm::Sha1,
    key_len: 8,
    expanded_key_len: 8,
    iv_len: 8,
    exportable: false,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_EXPORT_WITH_RC4_40_MD5: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_EXPORT_WITH_RC4_40_MD5,
    kx: KeyExchangeAlgorithm::RsaSign,
    bulk: BulkAlgorithm::Rc4,
    mac: MacAlgorithm::Md5,
    key_len: 5,
    expanded_key_len: 16,
    iv_len: 0,
    exportable: true,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5,
    kx: KeyExchangeAlgorithm::RsaSign,
    bulk: BulkAlgorithm::Rc2Cbc,
    mac: MacAlgorithm::Md5,
    key_len: 5,
    expanded_key_len: 16,
    iv_len: 8,
    exportable: true,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_EXPORT_WITH_DES40_CBC_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_EXPORT_WITH_DES40_CBC_SHA,
    kx: KeyExchangeAlgorithm::RsaSign,
    bulk: BulkAlgorithm::DesCbc,
    mac: MacAlgorithm::Sha1,
    key_len: 5,
    expanded_key_len: 8,
    iv_len: 8,
    exportable: true,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_EXPORT1024_WITH_DES_CBC_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_EXPORT1024_WITH_DES_CBC_SHA,
    kx: KeyExchangeAlgorithm::RsaSign,
    bulk: BulkAlgorithm::DesCbc,
    mac: MacAlgorithm::Sha1,
    key_len: 8,
    expanded_key_len: 8,
    iv_len: 8,
    exportable: true,
    min_version: ProtocolVersion::SSLv3,
};

pub static TLS_RSA_EXPORT1024_WITH_RC4_56_SHA: SupportedCipherSuite = SupportedCipherSuite {
    suite: CipherSuite::TLS_RSA_EXPORT1024_WITH_RC4_56_SHA,
    kx: KeyExchangeAlgorithm::RsaSign,
    bulk: BulkAlgorithm::Rc4,
    mac: MacAlgorithm::Sha1,
    key_len: 7,
    expanded_key_len: 16,
    iv_len: 0,
    exportable: true,
    min_version: ProtocolVersion::SSLv3,
};

/// Every suite legacy-tls can negotiate, in preference order.
pub static ALL_CIPHER_SUITES: &[&SupportedCipherSuite] = &[
    &TLS_RSA_WITH_AES_256_CBC_SHA,
    &TLS_RSA_WITH_AES_128_CBC_SHA,
    &TLS_RSA_WITH_3DES_EDE_CBC_SHA,
    &TLS_RSA_WITH_RC4_128_SHA,
    &TLS_RSA_WITH_RC4_128_MD5,
    &TLS_RSA_WITH_DES_CBC_SHA,
    &TLS_RSA_EXPORT1024_WITH_RC4_56_SHA,
    &TLS_RSA_EXPORT1024_WITH_DES_CBC_SHA,
    &TLS_RSA_EXPORT_WITH_DES40_CBC_SHA,
    &TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5,
    &TLS_RSA_EXPORT_WITH_RC4_40_MD5,
];

/// The suites offered unless configured otherwise: everything except
/// the export suites.
pub static DEFAULT_CIPHER_SUITES: &[&SupportedCipherSuite] = &[
    &TLS_RSA_WITH_AES_256_CBC_SHA,
    &TLS_RSA_WITH_AES_128_CBC_SHA,
    &TLS_RSA_WITH_3DES_EDE_CBC_SHA,
    &TLS_RSA_WITH_RC4_128_SHA,
    &TLS_RSA_WITH_RC4_128_MD5,
    &TLS_RSA_WITH_DES_CBC_SHA,
];

/// Look up a suite by its wire value.
pub fn lookup(suite: CipherSuite) -> Option<&'static SupportedCipherSuite> {
    ALL_CIPHER_SUITES
        .iter()
        .copied()
        .find(|scs| scs.suite == suite)
}

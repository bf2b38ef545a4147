use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{KeyUsage, ParsedExtension};
use x509_parser::x509::X509Version;

use crate::suites::KeyExchangeAlgorithm;

/// Whether the leaf certificate `cert` may be used as a server
/// certificate for key exchange `kx`.
///
/// Certificates older than X.509 v3 carry no usage information and
/// always pass.  For v3 certificates, a present KeyUsage must allow
/// the operation the key exchange performs with the server's key, and
/// a present ExtendedKeyUsage must contain serverAuth.  With neither
/// present, a Netscape certificate type extension (if any) must allow
/// SSL server use.
pub(crate) fn server_usage_allows(cert: &X509Certificate<'_>, kx: KeyExchangeAlgorithm) -> bool {
    if cert.version().0 < X509Version::V3.0 {
        return true;
    }

    if kx == KeyExchangeAlgorithm::Fortezza {
        return false;
    }

    // a duplicated extension is a parse error here
    let (Ok(key_usage), Ok(extended_key_usage)) = (cert.key_usage(), cert.extended_key_usage())
    else {
        return false;
    };

    match (key_usage, extended_key_usage) {
        (None, None) => netscape_allows_ssl_server(cert),
        (Some(ku), None) => key_usage_allows(ku.value, kx),
        (None, Some(eku)) => eku.value.server_auth,
        (Some(ku), Some(eku)) => key_usage_allows(ku.value, kx) && eku.value.server_auth,
    }
}

fn key_usage_allows(ku: &KeyUsage, kx: KeyExchangeAlgorithm) -> bool {
    match kx {
        KeyExchangeAlgorithm::RsaSign => ku.digital_signature(),
        KeyExchangeAlgorithm::RsaKeyX => ku.key_encipherment(),
        KeyExchangeAlgorithm::DiffieHellman => ku.key_agreement(),
        KeyExchangeAlgorithm::Fortezza => false,
    }
}

fn netscape_allows_ssl_server(cert: &X509Certificate<'_>) -> bool {
    cert.extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::NSCertType(ns) => Some(ns.ssl_server()),
            _ => None,
        })
        .unwrap_or(true)
}

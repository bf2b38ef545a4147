#![allow(clippy::upper_case_acronyms)]
#![allow(non_camel_case_types)]
use crate::msgs::codec::{Codec, Reader};

enum_builder! {
    /// Compression methods offered in ClientHello.  Only `Null` is
    /// ever offered or accepted.
    #[repr(u8)]
    pub enum Compression {
        Null => 0x00,
        Deflate => 0x01,
    }
}

enum_builder! {
    /// Certificate types a server may list in CertificateRequest.
    #[repr(u8)]
    pub enum ClientCertificateType {
        RSASign => 0x01,
        DSSSign => 0x02,
        RSAFixedDH => 0x03,
        DSSFixedDH => 0x04,
        RSAEphemeralDH => 0x05,
        DSSEphemeralDH => 0x06,
        FortezzaDMS => 0x14,
    }
}

enum_builder! {
    /// Hello extensions from RFC 3546 we can name in logs.  We only
    /// send `ServerName`; the rest are carried opaquely.
    #[repr(u16)]
    pub enum ExtensionType {
        ServerName => 0x0000,
        MaxFragmentLength => 0x0001,
        ClientCertificateUrl => 0x0002,
        TrustedCAKeys => 0x0003,
        TruncatedHMAC => 0x0004,
        StatusRequest => 0x0005,
        RenegotiationInfo => 0xff01,
    }
}

enum_builder! {
    /// Entry types of a `server_name` list.
    #[repr(u8)]
    pub enum ServerNameType {
        HostName => 0x00,
    }
}

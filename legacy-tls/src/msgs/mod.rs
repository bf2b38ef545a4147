#![allow(missing_docs)]
//! Wire encodings of the SSL3 and TLS1.0 handshake.

#[macro_use]
mod macros;

pub mod alert;
pub mod base;
pub mod ccs;
pub mod codec;
pub mod deframer;
pub mod enums;
pub mod handshake;
pub mod message;
pub mod persist;

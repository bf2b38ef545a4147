//! The client side of the handshake.

pub use crate::msgs::handshake::SessionId;
pub use crate::msgs::persist::ClientSessionValue;

pub(super) mod builder;
pub use builder::WantsClientCert;

mod client_conn;
pub use client_conn::{ClientHandshake, Inbound, Output, Phase};

mod config;
pub use config::{ClientConfig, ClientSessionStore, ResolvesClientCert};

mod context;
pub use context::{AcceptableIssuer, ClientAuthRequest, Context, EstablishedSession};

pub(super) mod handy;
pub use handy::{ClientSessionMemoryCache, NoClientSessionStorage};

mod hs;
mod inbound;
mod outbound;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pki_types::{CertificateDer, UnixTime};
use zeroize::Zeroizing;

use crate::enums::{CipherSuite, ProtocolVersion};
use crate::msgs::handshake::SessionId;

/// How long a cached session may be offered for resumption.
pub(crate) const SESSION_LIFETIME: Duration = Duration::from_secs(3 * 60);

/// What a client remembers about a completed full handshake, so that a
/// later connection to the same host can offer an abbreviated one.
#[derive(Clone)]
pub struct ClientSessionValue {
    version: ProtocolVersion,
    suite: CipherSuite,
    session_id: SessionId,
    master_secret: Zeroizing<[u8; 48]>,
    server_cert_chain: Arc<Vec<CertificateDer<'static>>>,
    epoch: u64,
}

impl ClientSessionValue {
    pub(crate) fn new(
        version: ProtocolVersion,
        suite: CipherSuite,
        session_id: SessionId,
        master_secret: &[u8; 48],
        server_cert_chain: Arc<Vec<CertificateDer<'static>>>,
        time_now: UnixTime,
    ) -> Self {
        Self {
            version,
            suite,
            session_id,
            master_secret: Zeroizing::new(*master_secret),
            server_cert_chain,
            epoch: time_now.as_secs(),
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub(crate) fn master_secret(&self) -> &[u8; 48] {
        &self.master_secret
    }

    pub fn server_cert_chain(&self) -> &Arc<Vec<CertificateDer<'static>>> {
        &self.server_cert_chain
    }

    /// Whether the session is still within its lifetime at `time_now`.
    pub fn is_fresh(&self, time_now: UnixTime) -> bool {
        time_now
            .as_secs()
            .checked_sub(self.epoch)
            .map(|age| age < SESSION_LIFETIME.as_secs())
            .unwrap_or(false)
    }
}

impl fmt::Debug for ClientSessionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSessionValue")
            .field("version", &self.version)
            .field("suite", &self.suite)
            .field("session_id", &self.session_id)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

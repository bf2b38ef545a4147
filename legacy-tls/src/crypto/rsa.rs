use std::fmt;

use rand_core::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPublicKey};

use super::SecureRandom;
use crate::error::{Error, InvalidMessage};
use crate::rand::GetRandomFailed;

/// A peer's RSA public key: either from its certificate, or the
/// ephemeral key of an export ServerKeyExchange.
#[derive(Clone)]
pub(crate) struct PeerRsaKey {
    key: RsaPublicKey,
}

impl PeerRsaKey {
    /// Build a key from big-endian modulus and exponent bytes.
    pub(crate) fn from_components(modulus: &[u8], exponent: &[u8]) -> Result<Self, Error> {
        RsaPublicKey::new(
            BigUint::from_bytes_be(modulus),
            BigUint::from_bytes_be(exponent),
        )
        .map(|key| Self { key })
        .map_err(|_| InvalidMessage::InvalidRsaParams.into())
    }

    /// RSAES-PKCS1-v1_5 encryption, as used to transport the premaster secret.
    /// Padding bytes come from `secure_random`.
    pub(crate) fn encrypt_pkcs1(
        &self,
        secure_random: &dyn SecureRandom,
        msg: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let mut rng = RandomAdapter {
            inner: secure_random,
            failed: false,
        };
        let encrypted = self
            .key
            .encrypt(&mut rng, Pkcs1v15Encrypt, msg)
            .map_err(|e| Error::General(format!("RSA encryption failed: {e}")))?;

        match rng.failed {
            true => Err(GetRandomFailed.into()),
            false => Ok(encrypted),
        }
    }

    /// Verify a PKCS#1 v1.5 signature made over `digest` without a
    /// DigestInfo prefix.
    pub(crate) fn verify_unprefixed(&self, digest: &[u8], signature: &[u8]) -> bool {
        self.key
            .verify(Pkcs1v15Sign::new_unprefixed(), digest, signature)
            .is_ok()
    }

    /// The modulus length in bits.
    pub(crate) fn bits(&self) -> usize {
        self.key.size() * 8
    }
}

/// Presents a [`SecureRandom`] as the `RngCore` the `rsa` crate wants.
///
/// `fill_bytes` cannot report errors, so a failure is latched in `failed`
/// and checked once the operation returns.
struct RandomAdapter<'a> {
    inner: &'a dyn SecureRandom,
    failed: bool,
}

impl RngCore for RandomAdapter<'_> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if self.inner.fill(dest).is_err() {
            self.failed = true;
            // nonzero so PKCS#1 padding generation still terminates
            dest.fill(0xff);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for RandomAdapter<'_> {}

impl fmt::Debug for PeerRsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerRsaKey")
            .field("bits", &self.bits())
            .finish()
    }
}

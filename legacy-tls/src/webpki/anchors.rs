use std::fmt;

use pki_types::{CertificateDer, TrustAnchor};
use webpki::anchor_from_trusted_cert;

use super::pki_error;
use crate::error::{CertificateError, CertificateRejection, Error};

/// The certificates a [`WebPkiChainBuilder`](super::WebPkiChainBuilder)
/// will accept as the end of a path.
#[derive(Clone, Default)]
pub struct RootCertStore {
    anchors: Vec<TrustAnchor<'static>>,
}

impl RootCertStore {
    /// Make a new, empty `RootCertStore`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Trust the DER certificate `der`.
    ///
    /// Fails with [`Error::InvalidCertificate`] if it cannot be parsed.
    pub fn add(&mut self, der: CertificateDer<'_>) -> Result<(), Error> {
        let anchor = anchor_from_trusted_cert(&der).map_err(|e| {
            let error = CertificateError::from(pki_error(e));
            Error::InvalidCertificate(CertificateRejection::new(vec![error]))
        })?;
        self.anchors.push(anchor.to_owned());
        Ok(())
    }

    /// Trust every certificate of `ders` that parses, skipping the rest.
    ///
    /// System and vendor bundles tend to carry a few ancient or broken
    /// entries, which should not cost the others.  Returns how many were
    /// added and how many skipped.
    pub fn add_all<'a>(
        &mut self,
        ders: impl IntoIterator<Item = CertificateDer<'a>>,
    ) -> (usize, usize) {
        let (mut added, mut skipped) = (0, 0);
        for der in ders {
            match self.add(der) {
                Ok(()) => added += 1,
                Err(_err) => {
                    debug!("Skipping unparsable root: {:?}", _err);
                    skipped += 1;
                }
            }
        }
        (added, skipped)
    }

    /// How many roots are trusted.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no roots are trusted.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub(super) fn anchors(&self) -> &[TrustAnchor<'static>] {
        &self.anchors
    }
}

impl fmt::Debug for RootCertStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootCertStore({} roots)", self.anchors.len())
    }
}

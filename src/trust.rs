use x509_parser::prelude::*;

use crate::message::Asn1Cert;
use crate::Error;

/// Verification of the server's X.509 certificate chain.
///
/// Injected via the configuration; the driver only ever calls
/// [`CertVerifier::verify_chain`] and converts a rejection into a fatal
/// alert. Implementations are read-only and shareable across handshakes.
pub trait CertVerifier: Send + Sync {
    /// Verify a chain, leaf first. `Ok(())` accepts the peer.
    fn verify_chain(&self, chain: &[Asn1Cert]) -> Result<(), Error>;
}

/// A verifier anchored on a list of trusted DER certificates.
///
/// The chain is checked for subject/issuer linkage and must end at (or
/// contain) one of the configured anchors. Policy checks beyond that —
/// expiry, name constraints, revocation — are the application's business,
/// matching the scope of the handshake layer.
pub struct RootCertVerifier {
    roots: Vec<Vec<u8>>,
}

impl RootCertVerifier {
    pub fn new(roots: Vec<Vec<u8>>) -> Self {
        RootCertVerifier { roots }
    }

    fn is_root(&self, der: &[u8]) -> bool {
        self.roots.iter().any(|r| r == der)
    }
}

impl CertVerifier for RootCertVerifier {
    fn verify_chain(&self, chain: &[Asn1Cert]) -> Result<(), Error> {
        if chain.is_empty() {
            return Err(Error::CertificateError("empty certificate chain".into()));
        }

        let mut parsed = Vec::with_capacity(chain.len());
        for cert in chain {
            let (_, x509) = X509Certificate::from_der(&cert.0)
                .map_err(|e| Error::CertificateError(format!("certificate parse: {}", e)))?;
            parsed.push(x509);
        }

        // Leaf-first order: each certificate must be issued by the next.
        for pair in parsed.windows(2) {
            if pair[0].issuer() != pair[1].subject() {
                return Err(Error::CertificateError(
                    "certificate chain linkage broken".into(),
                ));
            }
        }

        // Anchored when any element byte-matches a configured root, or the
        // top of the chain is issued by one.
        if chain.iter().any(|c| self.is_root(&c.0)) {
            return Ok(());
        }

        let top = parsed.last().unwrap();
        for root in &self.roots {
            let (_, anchor) = X509Certificate::from_der(root)
                .map_err(|e| Error::CertificateError(format!("trust anchor parse: {}", e)))?;
            if top.issuer() == anchor.subject() {
                return Ok(());
            }
        }

        Err(Error::CertificateError(
            "certificate chain does not reach a trust anchor".into(),
        ))
    }
}

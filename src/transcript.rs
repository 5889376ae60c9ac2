use sha2::{Digest, Sha256, Sha384};

use crate::message::HashAlgorithm;

/// The handshake transcript: every handshake message in canonical order,
/// serialized as unfragmented DTLS messages (RFC 6347 §4.2.6).
///
/// Each accepted or emitted message is appended exactly once; retransmits
/// and duplicates never touch it. A cookie exchange resets it, since the
/// HelloVerifyRequest and the initial ClientHello are excluded from the
/// handshake hash.
#[derive(Debug, Default)]
pub struct Transcript {
    buf: Vec<u8>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    pub fn append(&mut self, message: &[u8]) {
        self.buf.extend_from_slice(message);
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// The cumulative hash under the suite's PRF hash.
    pub fn hash(&self, algorithm: HashAlgorithm) -> Vec<u8> {
        match algorithm {
            HashAlgorithm::Sha384 => Sha384::digest(&self.buf).to_vec(),
            _ => Sha256::digest(&self.buf).to_vec(),
        }
    }
}

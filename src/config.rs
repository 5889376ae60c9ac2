use std::net::SocketAddr;
use std::sync::Arc;

use crate::crypto::leaf_certificate_info;
use crate::message::{Asn1Cert, CipherSuite, KeyExchangeAlgorithm};
use crate::psk::PskStore;
use crate::trust::CertVerifier;
use crate::ConfigError;

/// Default cap on the body bytes of one outbound handshake record, chosen
/// so a full record fits a typical 1280-byte path MTU datagram.
const DEFAULT_MAX_FRAGMENT_LENGTH: usize = 1117;

/// Long-term client credentials for certificate-based suites.
#[derive(Clone)]
pub(crate) struct Identity {
    pub private_key: Vec<u8>,
    /// DER SubjectPublicKeyInfo, when configured directly.
    pub public_key: Option<Vec<u8>>,
    /// X.509 chain, leaf first, when configured via certificates.
    pub certificate_chain: Vec<Asn1Cert>,
    /// Present our Certificate as a Raw Public Key (RFC 7250).
    pub send_raw_key: bool,
}

/// Immutable, validated handshake configuration.
///
/// Built once through [`HandshakeConfig::builder`]; every invariant the
/// driver relies on — a non-empty suite list in which each suite has
/// matching credentials — is enforced by [`HandshakeConfigBuilder::build`].
#[derive(Clone)]
pub struct HandshakeConfig {
    endpoint: SocketAddr,
    cipher_suites: Vec<CipherSuite>,
    identity: Option<Identity>,
    psk_store: Option<Arc<dyn PskStore>>,
    trust_store: Option<Arc<dyn CertVerifier>>,
    max_fragment_length: usize,
}

impl HandshakeConfig {
    /// Start building a configuration for the given server endpoint.
    pub fn builder(endpoint: SocketAddr) -> HandshakeConfigBuilder {
        HandshakeConfigBuilder {
            endpoint,
            cipher_suites: None,
            identity: None,
            psk_store: None,
            trust_store: None,
            max_fragment_length: DEFAULT_MAX_FRAGMENT_LENGTH,
        }
    }

    /// The server this configuration connects to.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// The suites offered in ClientHello, in preference order. Never empty.
    pub fn cipher_suites(&self) -> &[CipherSuite] {
        &self.cipher_suites
    }

    /// Largest handshake body chunk per outbound record.
    pub fn max_fragment_length(&self) -> usize {
        self.max_fragment_length
    }

    pub fn psk_store(&self) -> Option<&Arc<dyn PskStore>> {
        self.psk_store.as_ref()
    }

    pub fn trust_store(&self) -> Option<&Arc<dyn CertVerifier>> {
        self.trust_store.as_ref()
    }

    /// Whether our Certificate goes out as a Raw Public Key.
    pub fn send_raw_key(&self) -> bool {
        self.identity.as_ref().map(|i| i.send_raw_key).unwrap_or(false)
    }

    pub(crate) fn private_key(&self) -> Option<&[u8]> {
        self.identity.as_ref().map(|i| i.private_key.as_slice())
    }

    pub(crate) fn certificate_chain(&self) -> &[Asn1Cert] {
        self.identity
            .as_ref()
            .map(|i| i.certificate_chain.as_slice())
            .unwrap_or(&[])
    }

    /// Our SubjectPublicKeyInfo for the Raw Public Key certificate:
    /// the configured public key, or the one in the leaf certificate.
    pub(crate) fn client_spki(&self) -> Option<Vec<u8>> {
        let identity = self.identity.as_ref()?;
        if let Some(spki) = &identity.public_key {
            return Some(spki.clone());
        }
        let leaf = identity.certificate_chain.first()?;
        leaf_certificate_info(&leaf.0).ok().map(|info| info.spki_der)
    }
}

/// Builder for [`HandshakeConfig`].
///
/// Setters that validate their argument return `Result`; `build` performs
/// the cross-option checks.
pub struct HandshakeConfigBuilder {
    endpoint: SocketAddr,
    cipher_suites: Option<Vec<CipherSuite>>,
    identity: Option<Identity>,
    psk_store: Option<Arc<dyn PskStore>>,
    trust_store: Option<Arc<dyn CertVerifier>>,
    max_fragment_length: usize,
}

impl HandshakeConfigBuilder {
    /// Set the suites to offer, in preference order.
    ///
    /// Fails `InvalidArg` on an empty list or one containing the null
    /// cipher placeholder.
    pub fn supported_cipher_suites(
        mut self,
        suites: &[CipherSuite],
    ) -> Result<Self, ConfigError> {
        if suites.is_empty() {
            return Err(ConfigError::InvalidArg(
                "cipher suite list must not be empty".into(),
            ));
        }
        if suites.contains(&CipherSuite::TLS_NULL_WITH_NULL_NULL) {
            return Err(ConfigError::InvalidArg(
                "TLS_NULL_WITH_NULL_NULL is not a negotiable cipher suite".into(),
            ));
        }
        self.cipher_suites = Some(suites.to_vec());
        Ok(self)
    }

    /// Set the ECDSA identity as a PKCS#8 private key plus DER
    /// SubjectPublicKeyInfo. Enables the ECDHE_ECDSA suites.
    pub fn identity(mut self, private_key: &[u8], public_key: &[u8]) -> Result<Self, ConfigError> {
        if private_key.is_empty() {
            return Err(ConfigError::InvalidArg("private key must be given".into()));
        }
        if public_key.is_empty() {
            return Err(ConfigError::InvalidArg("public key must be given".into()));
        }
        self.identity = Some(Identity {
            private_key: private_key.to_vec(),
            public_key: Some(public_key.to_vec()),
            certificate_chain: Vec::new(),
            send_raw_key: false,
        });
        Ok(self)
    }

    /// Set the ECDSA identity as a private key plus X.509 chain (leaf
    /// first). `send_raw_key` selects the Raw Public Key wire form for our
    /// Certificate message.
    pub fn identity_with_chain(
        mut self,
        private_key: &[u8],
        certificate_chain: Vec<Asn1Cert>,
        send_raw_key: bool,
    ) -> Result<Self, ConfigError> {
        if private_key.is_empty() {
            return Err(ConfigError::InvalidArg("private key must be given".into()));
        }
        if certificate_chain.is_empty() {
            return Err(ConfigError::InvalidArg(
                "certificate chain must not be empty".into(),
            ));
        }
        self.identity = Some(Identity {
            private_key: private_key.to_vec(),
            public_key: None,
            certificate_chain,
            send_raw_key,
        });
        Ok(self)
    }

    /// Set the PSK store. Enables the PSK suites.
    pub fn psk_store(mut self, store: Arc<dyn PskStore>) -> Self {
        self.psk_store = Some(store);
        self
    }

    /// Set the verifier for the server's certificate chain.
    pub fn trust_store(mut self, verifier: Arc<dyn CertVerifier>) -> Self {
        self.trust_store = Some(verifier);
        self
    }

    /// Cap the body bytes per outbound handshake record.
    pub fn max_fragment_length(mut self, len: usize) -> Self {
        self.max_fragment_length = len;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// Without an explicit suite list, the default is derived from the
    /// configured credentials: PSK-only yields the PSK suite, an identity
    /// yields the ECDHE suite, both yield ECDHE first. Fails
    /// `InvalidState` when an enabled suite has no matching credentials.
    pub fn build(self) -> Result<HandshakeConfig, ConfigError> {
        let cipher_suites = match self.cipher_suites {
            Some(suites) => suites,
            None => {
                let mut suites = Vec::new();
                if self.identity.is_some() {
                    suites.push(CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8);
                }
                if self.psk_store.is_some() {
                    suites.push(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8);
                }
                suites
            }
        };

        if cipher_suites.is_empty() {
            return Err(ConfigError::InvalidState(
                "no cipher suite is usable: configure an identity or a PSK store".into(),
            ));
        }

        for suite in &cipher_suites {
            match suite.key_exchange_algorithm() {
                KeyExchangeAlgorithm::Psk if self.psk_store.is_none() => {
                    return Err(ConfigError::InvalidState(format!(
                        "suite {:?} requires a PSK store",
                        suite
                    )));
                }
                KeyExchangeAlgorithm::EcDiffieHellman if self.identity.is_none() => {
                    return Err(ConfigError::InvalidState(format!(
                        "suite {:?} requires an ECDSA identity",
                        suite
                    )));
                }
                _ => {}
            }
        }

        Ok(HandshakeConfig {
            endpoint: self.endpoint,
            cipher_suites,
            identity: self.identity,
            psk_store: self.psk_store,
            trust_store: self.trust_store,
            max_fragment_length: self.max_fragment_length,
        })
    }
}

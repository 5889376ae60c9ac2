//! Wire codecs for DTLS 1.2 handshake messages (RFC 6347 / RFC 5246).
//!
//! Every type follows the same contract: `parse` consumes wire bytes with
//! nom and `serialize` appends wire bytes to a `Vec<u8>`. Handshake bodies
//! whose encoding depends on negotiated parameters (the selected cipher
//! suite, the Raw Public Key flags) take a [`ParseContext`].

mod alert;
mod certificate;
mod certificate_request;
mod certificate_verify;
mod client_hello;
mod client_key_exchange;
mod extension;
mod finished;
mod handshake;
mod hello_verify_request;
mod id;
mod named_curve;
mod random;
mod server_hello;
mod server_key_exchange;
mod util;

pub use alert::{AlertDescription, AlertLevel, AlertMessage};
pub use certificate::{Asn1Cert, Certificate, CertificatePayload};
pub use certificate_request::{CertificateRequest, ClientCertificateType, DistinguishedName};
pub use certificate_verify::{CertificateVerify, DigitallySigned};
pub use client_hello::ClientHello;
pub use client_key_exchange::ClientKeyExchange;
pub use extension::{CertificateTypeExtension, Extension, ExtensionType};
pub use finished::Finished;
pub use handshake::{split_messages, Body, Handshake, Header, HEADER_LEN};
pub use hello_verify_request::HelloVerifyRequest;
pub use id::{Cookie, InvalidLength, SessionId};
pub use named_curve::{CurveType, NamedCurve};
pub use random::Random;
pub use server_hello::ServerHello;
pub use server_key_exchange::{EcdhServerParams, PskServerKeyExchange, ServerKeyExchange};

use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

/// Context needed to decode handshake bodies whose wire form depends on
/// already-negotiated parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext {
    /// The suite selected by ServerHello, once known.
    pub cipher_suite: Option<CipherSuite>,
    /// Whether the server's Certificate carries a raw SubjectPublicKeyInfo
    /// instead of an X.509 chain (RFC 7250).
    pub receive_raw_public_key: bool,
}

/// TLS cipher suites this crate negotiates (RFC 7251 / RFC 6655).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherSuite {
    /// The null placeholder; never negotiable.
    #[default]
    TLS_NULL_WITH_NULL_NULL,
    /// PSK authentication, AES-128-CCM with 8-byte tags.
    TLS_PSK_WITH_AES_128_CCM_8,
    /// ECDHE key exchange, ECDSA authentication, AES-128-CCM with 8-byte tags.
    TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8,
    /// Any other value seen on the wire.
    Unknown(u16),
}

impl CipherSuite {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0000 => CipherSuite::TLS_NULL_WITH_NULL_NULL,
            0xC0A8 => CipherSuite::TLS_PSK_WITH_AES_128_CCM_8,
            0xC0AE => CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8,
            _ => CipherSuite::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CipherSuite::TLS_NULL_WITH_NULL_NULL => 0x0000,
            CipherSuite::TLS_PSK_WITH_AES_128_CCM_8 => 0xC0A8,
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8 => 0xC0AE,
            CipherSuite::Unknown(value) => *value,
        }
    }

    /// The key-exchange algorithm this suite commits the handshake to.
    pub fn key_exchange_algorithm(&self) -> KeyExchangeAlgorithm {
        match self {
            CipherSuite::TLS_PSK_WITH_AES_128_CCM_8 => KeyExchangeAlgorithm::Psk,
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8 => {
                KeyExchangeAlgorithm::EcDiffieHellman
            }
            _ => KeyExchangeAlgorithm::Null,
        }
    }

    /// The PRF hash of this suite. Both CCM_8 suites use SHA-256.
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    /// True for suites doing elliptic-curve key agreement.
    pub fn has_ecc(&self) -> bool {
        matches!(
            self.key_exchange_algorithm(),
            KeyExchangeAlgorithm::EcDiffieHellman
        )
    }

    pub(crate) fn parse(input: &[u8]) -> IResult<&[u8], CipherSuite> {
        let (input, value) = be_u16(input)?;
        Ok((input, CipherSuite::from_u16(value)))
    }
}

/// Key-exchange algorithms, as dispatched on when building the client's
/// ServerHelloDone response flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyExchangeAlgorithm {
    /// No key exchange negotiated yet (or the null suite).
    #[default]
    Null,
    /// Ephemeral elliptic-curve Diffie-Hellman.
    EcDiffieHellman,
    /// Pre-shared key (RFC 4279).
    Psk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    #[default]
    Null,
    Unknown(u8),
}

impl CompressionMethod {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => CompressionMethod::Null,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            CompressionMethod::Null => 0x00,
            CompressionMethod::Unknown(value) => *value,
        }
    }

    pub(crate) fn parse(input: &[u8]) -> IResult<&[u8], CompressionMethod> {
        let (input, value) = be_u8(input)?;
        Ok((input, CompressionMethod::from_u8(value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    DTLS1_0,
    DTLS1_2,
    Unknown(u16),
}

impl ProtocolVersion {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0xFEFF => ProtocolVersion::DTLS1_0,
            0xFEFD => ProtocolVersion::DTLS1_2,
            _ => ProtocolVersion::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            ProtocolVersion::DTLS1_0 => 0xFEFF,
            ProtocolVersion::DTLS1_2 => 0xFEFD,
            ProtocolVersion::Unknown(value) => *value,
        }
    }

    pub(crate) fn parse(input: &[u8]) -> IResult<&[u8], ProtocolVersion> {
        let (input, value) = be_u16(input)?;
        Ok((input, ProtocolVersion::from_u16(value)))
    }
}

/// DTLS record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
    Unknown(u8),
}

impl ContentType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            20 => ContentType::ChangeCipherSpec,
            21 => ContentType::Alert,
            22 => ContentType::Handshake,
            23 => ContentType::ApplicationData,
            _ => ContentType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
            ContentType::Unknown(value) => *value,
        }
    }
}

/// DTLS handshake message types (RFC 5246 §7.4 / RFC 6347 §4.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeType {
    HelloRequest,
    ClientHello,
    ServerHello,
    HelloVerifyRequest,
    Certificate,
    ServerKeyExchange,
    CertificateRequest,
    ServerHelloDone,
    CertificateVerify,
    ClientKeyExchange,
    Finished,
    Unknown(u8),
}

impl HandshakeType {
    pub fn from_u8(value: u8) -> Self {
        use HandshakeType::*;
        match value {
            0 => HelloRequest,
            1 => ClientHello,
            2 => ServerHello,
            3 => HelloVerifyRequest,
            11 => Certificate,
            12 => ServerKeyExchange,
            13 => CertificateRequest,
            14 => ServerHelloDone,
            15 => CertificateVerify,
            16 => ClientKeyExchange,
            20 => Finished,
            _ => Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        use HandshakeType::*;
        match self {
            HelloRequest => 0,
            ClientHello => 1,
            ServerHello => 2,
            HelloVerifyRequest => 3,
            Certificate => 11,
            ServerKeyExchange => 12,
            CertificateRequest => 13,
            ServerHelloDone => 14,
            CertificateVerify => 15,
            ClientKeyExchange => 16,
            Finished => 20,
            Unknown(value) => *value,
        }
    }
}

/// Hash algorithm identifiers from the signature_algorithms registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Unknown(u8),
}

impl HashAlgorithm {
    pub fn from_u8(value: u8) -> Self {
        match value {
            4 => HashAlgorithm::Sha256,
            5 => HashAlgorithm::Sha384,
            _ => HashAlgorithm::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            HashAlgorithm::Sha256 => 4,
            HashAlgorithm::Sha384 => 5,
            HashAlgorithm::Unknown(value) => *value,
        }
    }
}

/// Signature algorithm identifiers from the signature_algorithms registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Ecdsa,
    Unknown(u8),
}

impl SignatureAlgorithm {
    pub fn from_u8(value: u8) -> Self {
        match value {
            3 => SignatureAlgorithm::Ecdsa,
            _ => SignatureAlgorithm::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            SignatureAlgorithm::Ecdsa => 3,
            SignatureAlgorithm::Unknown(value) => *value,
        }
    }
}

/// A (hash, signature) pair as carried in signature_algorithms and
/// CertificateRequest (RFC 5246 §7.4.1.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureAndHashAlgorithm {
    pub hash: HashAlgorithm,
    pub signature: SignatureAlgorithm,
}

impl SignatureAndHashAlgorithm {
    pub fn new(hash: HashAlgorithm, signature: SignatureAlgorithm) -> Self {
        SignatureAndHashAlgorithm { hash, signature }
    }

    pub fn from_u16(value: u16) -> Self {
        SignatureAndHashAlgorithm {
            hash: HashAlgorithm::from_u8((value >> 8) as u8),
            signature: SignatureAlgorithm::from_u8(value as u8),
        }
    }

    pub fn as_u16(&self) -> u16 {
        ((self.hash.as_u8() as u16) << 8) | self.signature.as_u8() as u16
    }

    pub(crate) fn parse(input: &[u8]) -> IResult<&[u8], SignatureAndHashAlgorithm> {
        let (input, value) = be_u16(input)?;
        Ok((input, SignatureAndHashAlgorithm::from_u16(value)))
    }
}

/// Certificate wire forms from the RFC 7250 certificate-type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateType {
    X509,
    RawPublicKey,
    Unknown(u8),
}

impl CertificateType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => CertificateType::X509,
            2 => CertificateType::RawPublicKey,
            _ => CertificateType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            CertificateType::X509 => 0,
            CertificateType::RawPublicKey => 2,
            CertificateType::Unknown(value) => *value,
        }
    }
}

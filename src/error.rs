use std::fmt;

use crate::message::{AlertDescription, AlertLevel, AlertMessage};

/// Errors raised while building a [`crate::HandshakeConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An individual option was rejected by its setter.
    InvalidArg(String),
    /// The combination of options cannot produce a usable configuration.
    InvalidState(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidArg(msg) => write!(f, "invalid argument: {}", msg),
            ConfigError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised while driving a handshake.
///
/// Every fatal variant maps to the alert that must go on the wire via
/// [`Error::alert`]; the `String` payload is a diagnostic for logs, never
/// sent to the peer.
#[derive(Debug)]
pub enum Error {
    /// More input was needed to decode a message.
    ParseIncomplete,
    /// A message failed to decode.
    ParseError(nom::error::ErrorKind),
    /// A message arrived that the state machine cannot accept.
    UnexpectedMessage(String),
    /// Negotiation failed: unsupported suite or curve, missing PSK, or a
    /// peer requirement the client cannot honor.
    HandshakeFailure(String),
    /// The peer's Finished verify_data did not match.
    DecryptError(String),
    /// The peer's certificate chain was rejected.
    CertificateError(String),
    /// A cryptographic operation failed.
    CryptoError(String),
    /// The peer sent a fatal alert (or close_notify).
    PeerAlert(AlertDescription),
    /// The handshake was already terminated; no further input is accepted.
    Closed,
}

impl Error {
    /// The alert this error puts on the wire, if any.
    ///
    /// `PeerAlert` and `Closed` produce no alert: the former is the peer
    /// closing on us, the latter means one was already emitted.
    pub fn alert(&self) -> Option<AlertMessage> {
        let description = match self {
            Error::ParseIncomplete | Error::ParseError(_) => AlertDescription::DecodeError,
            Error::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
            Error::HandshakeFailure(_) => AlertDescription::HandshakeFailure,
            Error::DecryptError(_) => AlertDescription::DecryptError,
            Error::CertificateError(_) => AlertDescription::BadCertificate,
            Error::CryptoError(_) => AlertDescription::InternalError,
            Error::PeerAlert(_) | Error::Closed => return None,
        };
        Some(AlertMessage::new(AlertLevel::Fatal, description))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ParseIncomplete => write!(f, "incomplete message"),
            Error::ParseError(kind) => write!(f, "parse error: {:?}", kind),
            Error::UnexpectedMessage(msg) => write!(f, "unexpected message: {}", msg),
            Error::HandshakeFailure(msg) => write!(f, "handshake failure: {}", msg),
            Error::DecryptError(msg) => write!(f, "decrypt error: {}", msg),
            Error::CertificateError(msg) => write!(f, "certificate error: {}", msg),
            Error::CryptoError(msg) => write!(f, "crypto error: {}", msg),
            Error::PeerAlert(desc) => write!(f, "peer alert: {:?}", desc),
            Error::Closed => write!(f, "handshake closed"),
        }
    }
}

impl std::error::Error for Error {}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(value: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match value {
            nom::Err::Incomplete(_) => Error::ParseIncomplete,
            nom::Err::Error(x) => Error::ParseError(x.code),
            nom::Err::Failure(x) => Error::ParseError(x.code),
        }
    }
}

use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::{be_u16, be_u8};
use nom::Err;
use nom::IResult;

use super::util::{be_u24, put_u24};
use super::{Certificate, CertificateRequest, CertificateVerify, ClientHello, ClientKeyExchange};
use super::{Finished, HandshakeType, HelloVerifyRequest, ParseContext, ServerHello};
use super::ServerKeyExchange;

/// Length of the DTLS handshake message header (RFC 6347 §4.2.2).
pub const HEADER_LEN: usize = 12;

/// The DTLS handshake message header: the TLS header extended with
/// `message_seq` and fragment bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_type: HandshakeType,
    pub length: u32,
    pub message_seq: u16,
    pub fragment_offset: u32,
    pub fragment_length: u32,
}

impl Header {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Header> {
        let (input, msg_type) = be_u8(input)?;
        let (input, length) = be_u24(input)?;
        let (input, message_seq) = be_u16(input)?;
        let (input, fragment_offset) = be_u24(input)?;
        let (input, fragment_length) = be_u24(input)?;

        if fragment_offset + fragment_length > length {
            return Err(Err::Failure(Error::new(input, ErrorKind::LengthValue)));
        }

        Ok((
            input,
            Header {
                msg_type: HandshakeType::from_u8(msg_type),
                length,
                message_seq,
                fragment_offset,
                fragment_length,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.msg_type.as_u8());
        put_u24(output, self.length);
        output.extend_from_slice(&self.message_seq.to_be_bytes());
        put_u24(output, self.fragment_offset);
        put_u24(output, self.fragment_length);
    }

    /// True when this header carries only part of its message.
    pub fn is_fragment(&self) -> bool {
        self.fragment_offset != 0 || self.fragment_length != self.length
    }
}

/// A parsed handshake message body, dispatched by message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    HelloRequest,
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    HelloVerifyRequest(HelloVerifyRequest),
    Certificate(Certificate),
    ServerKeyExchange(ServerKeyExchange),
    CertificateRequest(CertificateRequest),
    ServerHelloDone,
    CertificateVerify(CertificateVerify),
    ClientKeyExchange(ClientKeyExchange),
    Finished(Finished),
}

impl Body {
    /// Decode a complete (defragmented) body of the given type.
    ///
    /// The whole input must be consumed; trailing bytes are an encoding
    /// error.
    pub fn parse(msg_type: HandshakeType, input: &[u8], ctx: &ParseContext) -> Result<Body, crate::Error> {
        let (rest, body) = match msg_type {
            HandshakeType::HelloRequest => (input, Body::HelloRequest),
            HandshakeType::ClientHello => {
                let (rest, msg) = ClientHello::parse(input)?;
                (rest, Body::ClientHello(msg))
            }
            HandshakeType::ServerHello => {
                let (rest, msg) = ServerHello::parse(input)?;
                (rest, Body::ServerHello(msg))
            }
            HandshakeType::HelloVerifyRequest => {
                let (rest, msg) = HelloVerifyRequest::parse(input)?;
                (rest, Body::HelloVerifyRequest(msg))
            }
            HandshakeType::Certificate => {
                let (rest, msg) = Certificate::parse(input, ctx)?;
                (rest, Body::Certificate(msg))
            }
            HandshakeType::ServerKeyExchange => {
                let (rest, msg) = ServerKeyExchange::parse(input, ctx)?;
                (rest, Body::ServerKeyExchange(msg))
            }
            HandshakeType::CertificateRequest => {
                let (rest, msg) = CertificateRequest::parse(input)?;
                (rest, Body::CertificateRequest(msg))
            }
            HandshakeType::ServerHelloDone => (input, Body::ServerHelloDone),
            HandshakeType::CertificateVerify => {
                let (rest, msg) = CertificateVerify::parse(input)?;
                (rest, Body::CertificateVerify(msg))
            }
            HandshakeType::ClientKeyExchange => {
                let (rest, msg) = ClientKeyExchange::parse(input, ctx)?;
                (rest, Body::ClientKeyExchange(msg))
            }
            HandshakeType::Finished => {
                let (rest, msg) = Finished::parse(input)?;
                (rest, Body::Finished(msg))
            }
            HandshakeType::Unknown(v) => {
                return Err(crate::Error::UnexpectedMessage(format!(
                    "unknown handshake type {}",
                    v
                )))
            }
        };

        if !rest.is_empty() {
            return Err(crate::Error::ParseError(ErrorKind::LengthValue));
        }

        Ok(body)
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            Body::HelloRequest | Body::ServerHelloDone => {}
            Body::ClientHello(msg) => msg.serialize(output),
            Body::ServerHello(msg) => msg.serialize(output),
            Body::HelloVerifyRequest(msg) => msg.serialize(output),
            Body::Certificate(msg) => msg.serialize(output),
            Body::ServerKeyExchange(msg) => msg.serialize(output),
            Body::CertificateRequest(msg) => msg.serialize(output),
            Body::CertificateVerify(msg) => msg.serialize(output),
            Body::ClientKeyExchange(msg) => msg.serialize(output),
            Body::Finished(msg) => msg.serialize(output),
        }
    }

    pub fn msg_type(&self) -> HandshakeType {
        match self {
            Body::HelloRequest => HandshakeType::HelloRequest,
            Body::ClientHello(_) => HandshakeType::ClientHello,
            Body::ServerHello(_) => HandshakeType::ServerHello,
            Body::HelloVerifyRequest(_) => HandshakeType::HelloVerifyRequest,
            Body::Certificate(_) => HandshakeType::Certificate,
            Body::ServerKeyExchange(_) => HandshakeType::ServerKeyExchange,
            Body::CertificateRequest(_) => HandshakeType::CertificateRequest,
            Body::ServerHelloDone => HandshakeType::ServerHelloDone,
            Body::CertificateVerify(_) => HandshakeType::CertificateVerify,
            Body::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            Body::Finished(_) => HandshakeType::Finished,
        }
    }
}

/// One handshake message in canonical (unfragmented) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub header: Header,
    pub body: Body,
}

impl Handshake {
    /// Wrap a body with a canonical header for the given sequence number.
    pub fn new(message_seq: u16, body: Body) -> Self {
        let mut buf = Vec::new();
        body.serialize(&mut buf);
        let length = buf.len() as u32;

        Handshake {
            header: Header {
                msg_type: body.msg_type(),
                length,
                message_seq,
                fragment_offset: 0,
                fragment_length: length,
            },
            body,
        }
    }

    /// Serialize header and body; the canonical form fed to transcripts.
    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.header.serialize(output);
        self.body.serialize(output);
    }
}

/// Split a handshake record fragment into `(header, fragment bytes)`
/// pairs. A record may carry several (possibly partial) messages.
pub fn split_messages(input: &[u8]) -> Result<Vec<(Header, Vec<u8>)>, crate::Error> {
    let mut out = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let (r, header) = Header::parse(rest)?;
        let (r, fragment): (&[u8], &[u8]) = take(header.fragment_length)(r)?;
        out.push((header, fragment.to_vec()));
        rest = r;
    }

    Ok(out)
}

use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::be_u8;
use nom::Err;
use nom::IResult;

use super::{Cookie, ProtocolVersion};

/// The HelloVerifyRequest body (RFC 6347 §4.2.1): the server's stateless
/// cookie challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloVerifyRequest {
    pub server_version: ProtocolVersion,
    pub cookie: Cookie,
}

impl HelloVerifyRequest {
    pub fn new(server_version: ProtocolVersion, cookie: Cookie) -> Self {
        HelloVerifyRequest {
            server_version,
            cookie,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], HelloVerifyRequest> {
        let (input, server_version) = ProtocolVersion::parse(input)?;
        let (input, cookie_len) = be_u8(input)?;
        let (input, cookie_data) = take(cookie_len)(input)?;
        let cookie = Cookie::try_new(cookie_data)
            .map_err(|_| Err::Failure(Error::new(input, ErrorKind::LengthValue)))?;

        Ok((
            input,
            HelloVerifyRequest {
                server_version,
                cookie,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.server_version.as_u16().to_be_bytes());
        output.push(self.cookie.len() as u8);
        output.extend_from_slice(&self.cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = &[
        0xFE, 0xFD, // ProtocolVersion::DTLS1_2
        0x09, // Cookie length
        0x63, 0x6F, 0x6F, 0x6B, 0x69, 0x65, 0x34, 0x35, 0x36, // Cookie
    ];

    #[test]
    fn roundtrip() {
        let original =
            HelloVerifyRequest::new(ProtocolVersion::DTLS1_2, "cookie456".try_into().unwrap());

        let mut serialized = Vec::new();
        original.serialize(&mut serialized);
        assert_eq!(serialized, MESSAGE);

        let (rest, parsed) = HelloVerifyRequest::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, original);
    }

    #[test]
    fn cookie_truncated() {
        assert!(HelloVerifyRequest::parse(&MESSAGE[..5]).is_err());
    }
}

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use super::{KeyExchangeAlgorithm, ParseContext};

/// The ClientKeyExchange body, one variant per key-exchange algorithm.
///
/// - ECDHE: the client's ephemeral public point (RFC 4492 §5.7).
/// - PSK: the selected identity (RFC 4279 §2).
/// - NULL: empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientKeyExchange {
    Ecdh { public_point: Vec<u8> },
    Psk { identity: Vec<u8> },
    Null,
}

impl ClientKeyExchange {
    pub fn parse<'a>(input: &'a [u8], ctx: &ParseContext) -> IResult<&'a [u8], ClientKeyExchange> {
        let algorithm = ctx
            .cipher_suite
            .map(|s| s.key_exchange_algorithm())
            .unwrap_or_default();

        match algorithm {
            KeyExchangeAlgorithm::EcDiffieHellman => {
                let (input, point_len) = be_u8(input)?;
                let (input, point) = take(point_len)(input)?;
                Ok((
                    input,
                    ClientKeyExchange::Ecdh {
                        public_point: point.to_vec(),
                    },
                ))
            }
            KeyExchangeAlgorithm::Psk => {
                let (input, identity_len) = be_u16(input)?;
                let (input, identity) = take(identity_len)(input)?;
                Ok((
                    input,
                    ClientKeyExchange::Psk {
                        identity: identity.to_vec(),
                    },
                ))
            }
            KeyExchangeAlgorithm::Null => Ok((input, ClientKeyExchange::Null)),
        }
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            ClientKeyExchange::Ecdh { public_point } => {
                output.push(public_point.len() as u8);
                output.extend_from_slice(public_point);
            }
            ClientKeyExchange::Psk { identity } => {
                output.extend_from_slice(&(identity.len() as u16).to_be_bytes());
                output.extend_from_slice(identity);
            }
            ClientKeyExchange::Null => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::CipherSuite;
    use super::*;

    fn ctx(suite: CipherSuite) -> ParseContext {
        ParseContext {
            cipher_suite: Some(suite),
            ..Default::default()
        }
    }

    #[test]
    fn ecdh_roundtrip() {
        let cke = ClientKeyExchange::Ecdh {
            public_point: vec![0x04, 0xAA, 0xBB],
        };

        let mut serialized = Vec::new();
        cke.serialize(&mut serialized);
        assert_eq!(serialized, &[0x03, 0x04, 0xAA, 0xBB]);

        let (rest, parsed) = ClientKeyExchange::parse(
            &serialized,
            &ctx(CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8),
        )
        .unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, cke);
    }

    #[test]
    fn psk_roundtrip() {
        let cke = ClientKeyExchange::Psk {
            identity: b"ID".to_vec(),
        };

        let mut serialized = Vec::new();
        cke.serialize(&mut serialized);
        assert_eq!(serialized, &[0x00, 0x02, b'I', b'D']);

        let (rest, parsed) =
            ClientKeyExchange::parse(&serialized, &ctx(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8))
                .unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, cke);
    }

    #[test]
    fn null_is_empty() {
        let cke = ClientKeyExchange::Null;

        let mut serialized = Vec::new();
        cke.serialize(&mut serialized);
        assert!(serialized.is_empty());

        let (rest, parsed) =
            ClientKeyExchange::parse(&serialized, &ctx(CipherSuite::TLS_NULL_WITH_NULL_NULL))
                .unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, cke);
    }
}

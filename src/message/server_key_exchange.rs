use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::{be_u16, be_u8};
use nom::Err;
use nom::IResult;

use super::certificate_verify::DigitallySigned;
use super::{CurveType, KeyExchangeAlgorithm, NamedCurve, ParseContext};

/// The ServerKeyExchange body, whose shape depends on the negotiated key
/// exchange: signed ECDH parameters (RFC 4492 §5.4) or a PSK identity hint
/// (RFC 4279 §2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerKeyExchange {
    Ecdh(EcdhServerParams),
    PskHint(PskServerKeyExchange),
}

/// Signed ephemeral ECDH parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdhServerParams {
    pub curve_type: CurveType,
    pub named_curve: NamedCurve,
    pub public_point: Vec<u8>,
    pub signed: DigitallySigned,
}

impl EcdhServerParams {
    /// The `ServerECDHParams` bytes covered by the signature:
    /// curve_type || named_curve || point length || point.
    pub fn params_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.public_point.len());
        out.push(self.curve_type.as_u8());
        out.extend_from_slice(&self.named_curve.as_u16().to_be_bytes());
        out.push(self.public_point.len() as u8);
        out.extend_from_slice(&self.public_point);
        out
    }
}

/// The PSK identity hint message, stored verbatim for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskServerKeyExchange {
    pub identity_hint: Vec<u8>,
}

impl ServerKeyExchange {
    pub fn parse<'a>(input: &'a [u8], ctx: &ParseContext) -> IResult<&'a [u8], ServerKeyExchange> {
        let algorithm = ctx
            .cipher_suite
            .map(|s| s.key_exchange_algorithm())
            .unwrap_or_default();

        match algorithm {
            KeyExchangeAlgorithm::EcDiffieHellman => {
                let (input, curve_type) = CurveType::parse(input)?;
                if curve_type != CurveType::NamedCurve {
                    return Err(Err::Failure(Error::new(input, ErrorKind::Tag)));
                }
                let (input, named_curve) = NamedCurve::parse(input)?;
                let (input, point_len) = be_u8(input)?;
                let (input, point) = take(point_len)(input)?;
                let (input, signed) = DigitallySigned::parse(input)?;

                Ok((
                    input,
                    ServerKeyExchange::Ecdh(EcdhServerParams {
                        curve_type,
                        named_curve,
                        public_point: point.to_vec(),
                        signed,
                    }),
                ))
            }
            KeyExchangeAlgorithm::Psk => {
                let (input, hint_len) = be_u16(input)?;
                let (input, hint) = take(hint_len)(input)?;
                Ok((
                    input,
                    ServerKeyExchange::PskHint(PskServerKeyExchange {
                        identity_hint: hint.to_vec(),
                    }),
                ))
            }
            KeyExchangeAlgorithm::Null => {
                Err(Err::Failure(Error::new(input, ErrorKind::Switch)))
            }
        }
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            ServerKeyExchange::Ecdh(params) => {
                output.extend_from_slice(&params.params_bytes());
                params.signed.serialize(output);
            }
            ServerKeyExchange::PskHint(hint) => {
                output.extend_from_slice(&(hint.identity_hint.len() as u16).to_be_bytes());
                output.extend_from_slice(&hint.identity_hint);
            }
        }
    }
}

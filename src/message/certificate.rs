use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::Err;
use nom::IResult;

use super::util::{be_u24, put_u24};
use super::ParseContext;

/// One DER-encoded X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asn1Cert(pub Vec<u8>);

/// The Certificate body.
///
/// With X.509 this is the usual chain, leaf first (RFC 5246 §7.4.2). When
/// Raw Public Keys were negotiated the body instead carries a single
/// SubjectPublicKeyInfo structure (RFC 7250 §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub payload: CertificatePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificatePayload {
    /// Certificate chain, leaf first.
    X509(Vec<Asn1Cert>),
    /// DER SubjectPublicKeyInfo.
    RawPublicKey(Vec<u8>),
}

impl Certificate {
    pub fn x509(chain: Vec<Asn1Cert>) -> Self {
        Certificate {
            payload: CertificatePayload::X509(chain),
        }
    }

    pub fn raw_public_key(spki: Vec<u8>) -> Self {
        Certificate {
            payload: CertificatePayload::RawPublicKey(spki),
        }
    }

    pub fn parse<'a>(input: &'a [u8], ctx: &ParseContext) -> IResult<&'a [u8], Certificate> {
        if ctx.receive_raw_public_key {
            let (input, len) = be_u24(input)?;
            let (input, spki) = take(len)(input)?;
            return Ok((input, Certificate::raw_public_key(spki.to_vec())));
        }

        let (input, total_len) = be_u24(input)?;
        let (input, mut list) = take(total_len)(input)?;

        let mut chain = Vec::new();
        while !list.is_empty() {
            let (rest, cert_len) = be_u24(list)?;
            let (rest, cert) = take(cert_len)(rest)?;
            chain.push(Asn1Cert(cert.to_vec()));
            list = rest;
        }

        if chain.is_empty() {
            return Err(Err::Failure(Error::new(input, ErrorKind::LengthValue)));
        }

        Ok((input, Certificate::x509(chain)))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match &self.payload {
            CertificatePayload::X509(chain) => {
                let total: usize = chain.iter().map(|c| 3 + c.0.len()).sum();
                put_u24(output, total as u32);
                for cert in chain {
                    put_u24(output, cert.0.len() as u32);
                    output.extend_from_slice(&cert.0);
                }
            }
            CertificatePayload::RawPublicKey(spki) => {
                put_u24(output, spki.len() as u32);
                output.extend_from_slice(spki);
            }
        }
    }
}

use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

use super::SignatureAndHashAlgorithm;

/// A `DigitallySigned` structure (RFC 5246 §4.7): the algorithm pair
/// followed by an opaque signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitallySigned {
    pub algorithm: SignatureAndHashAlgorithm,
    pub signature: Vec<u8>,
}

impl DigitallySigned {
    pub fn new(algorithm: SignatureAndHashAlgorithm, signature: Vec<u8>) -> Self {
        DigitallySigned {
            algorithm,
            signature,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], DigitallySigned> {
        let (input, algorithm) = SignatureAndHashAlgorithm::parse(input)?;
        let (input, sig_len) = be_u16(input)?;
        let (input, signature) = take(sig_len)(input)?;

        Ok((
            input,
            DigitallySigned {
                algorithm,
                signature: signature.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.algorithm.as_u16().to_be_bytes());
        output.extend_from_slice(&(self.signature.len() as u16).to_be_bytes());
        output.extend_from_slice(&self.signature);
    }
}

/// The CertificateVerify body: the client's signature over every handshake
/// message exchanged so far (RFC 5246 §7.4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateVerify {
    pub signed: DigitallySigned,
}

impl CertificateVerify {
    pub fn new(signed: DigitallySigned) -> Self {
        CertificateVerify { signed }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], CertificateVerify> {
        let (input, signed) = DigitallySigned::parse(input)?;
        Ok((input, CertificateVerify { signed }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.signed.serialize(output);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{HashAlgorithm, SignatureAlgorithm};
    use super::*;

    const MESSAGE: &[u8] = &[
        0x04, 0x03, // ecdsa_secp256r1_sha256
        0x00, 0x03, // signature length
        0x30, 0x01, 0x00, // signature
    ];

    #[test]
    fn roundtrip() {
        let verify = CertificateVerify::new(DigitallySigned::new(
            SignatureAndHashAlgorithm::new(HashAlgorithm::Sha256, SignatureAlgorithm::Ecdsa),
            vec![0x30, 0x01, 0x00],
        ));

        let mut serialized = Vec::new();
        verify.serialize(&mut serialized);
        assert_eq!(serialized, MESSAGE);

        let (rest, parsed) = CertificateVerify::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, verify);
    }

    #[test]
    fn signature_truncated() {
        assert!(CertificateVerify::parse(&MESSAGE[..5]).is_err());
    }
}

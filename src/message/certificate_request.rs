use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use smallvec::SmallVec;

use super::SignatureAndHashAlgorithm;

/// Client certificate kinds a server may request (RFC 5246 §7.4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientCertificateType {
    RsaSign,
    DssSign,
    #[default]
    EcdsaSign,
    Unknown(u8),
}

impl ClientCertificateType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => ClientCertificateType::RsaSign,
            2 => ClientCertificateType::DssSign,
            64 => ClientCertificateType::EcdsaSign,
            _ => ClientCertificateType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            ClientCertificateType::RsaSign => 1,
            ClientCertificateType::DssSign => 2,
            ClientCertificateType::EcdsaSign => 64,
            ClientCertificateType::Unknown(value) => *value,
        }
    }
}

/// A DER-encoded distinguished name from the certificate_authorities list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName(pub Vec<u8>);

/// The CertificateRequest body (RFC 5246 §7.4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub certificate_types: SmallVec<[ClientCertificateType; 8]>,
    pub supported_signature_algorithms: SmallVec<[SignatureAndHashAlgorithm; 16]>,
    pub certificate_authorities: Vec<DistinguishedName>,
}

impl CertificateRequest {
    pub fn new(
        certificate_types: SmallVec<[ClientCertificateType; 8]>,
        supported_signature_algorithms: SmallVec<[SignatureAndHashAlgorithm; 16]>,
        certificate_authorities: Vec<DistinguishedName>,
    ) -> Self {
        CertificateRequest {
            certificate_types,
            supported_signature_algorithms,
            certificate_authorities,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], CertificateRequest> {
        let (input, cert_types_len) = be_u8(input)?;
        let (input, cert_types_data) = take(cert_types_len)(input)?;
        let certificate_types = cert_types_data
            .iter()
            .map(|&b| ClientCertificateType::from_u8(b))
            .collect();

        let (input, sig_algs_len) = be_u16(input)?;
        let (input, sig_algs_data) = take(sig_algs_len)(input)?;
        let supported_signature_algorithms = sig_algs_data
            .chunks_exact(2)
            .map(|chunk| {
                SignatureAndHashAlgorithm::from_u16(u16::from_be_bytes([chunk[0], chunk[1]]))
            })
            .collect();

        let (input, cert_auths_len) = be_u16(input)?;
        let (input, mut auths_data) = take(cert_auths_len)(input)?;
        let mut certificate_authorities = Vec::new();

        while !auths_data.is_empty() {
            let (rest, name_len) = be_u16(auths_data)?;
            let (rest, name_data) = take(name_len)(rest)?;
            certificate_authorities.push(DistinguishedName(name_data.to_vec()));
            auths_data = rest;
        }

        Ok((
            input,
            CertificateRequest {
                certificate_types,
                supported_signature_algorithms,
                certificate_authorities,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.certificate_types.len() as u8);
        for cert_type in &self.certificate_types {
            output.push(cert_type.as_u8());
        }

        let sig_algs_len = (self.supported_signature_algorithms.len() * 2) as u16;
        output.extend_from_slice(&sig_algs_len.to_be_bytes());
        for sig_alg in &self.supported_signature_algorithms {
            output.extend_from_slice(&sig_alg.as_u16().to_be_bytes());
        }

        let cert_auths_len: usize = self
            .certificate_authorities
            .iter()
            .map(|name| 2 + name.0.len())
            .sum();
        output.extend_from_slice(&(cert_auths_len as u16).to_be_bytes());
        for name in &self.certificate_authorities {
            output.extend_from_slice(&(name.0.len() as u16).to_be_bytes());
            output.extend_from_slice(&name.0);
        }
    }
}

use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::{be_u16, be_u8};
use nom::Err;
use nom::IResult;
use smallvec::SmallVec;

use super::{CertificateType, NamedCurve, SignatureAndHashAlgorithm};

/// Hello extension types this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionType {
    SupportedGroups,
    EcPointFormats,
    SignatureAlgorithms,
    ClientCertificateType,
    ServerCertificateType,
    Unknown(u16),
}

impl ExtensionType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            10 => ExtensionType::SupportedGroups,
            11 => ExtensionType::EcPointFormats,
            13 => ExtensionType::SignatureAlgorithms,
            19 => ExtensionType::ClientCertificateType,
            20 => ExtensionType::ServerCertificateType,
            _ => ExtensionType::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            ExtensionType::SupportedGroups => 10,
            ExtensionType::EcPointFormats => 11,
            ExtensionType::SignatureAlgorithms => 13,
            ExtensionType::ClientCertificateType => 19,
            ExtensionType::ServerCertificateType => 20,
            ExtensionType::Unknown(value) => *value,
        }
    }
}

/// One raw hello extension: type plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub extension_type: ExtensionType,
    pub extension_data: Vec<u8>,
}

impl Extension {
    pub fn new(extension_type: ExtensionType, extension_data: Vec<u8>) -> Self {
        Extension {
            extension_type,
            extension_data,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Extension> {
        let (input, ty) = be_u16(input)?;
        let (input, len) = be_u16(input)?;
        let (input, data) = take(len)(input)?;
        Ok((
            input,
            Extension {
                extension_type: ExtensionType::from_u16(ty),
                extension_data: data.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.extension_type.as_u16().to_be_bytes());
        output.extend_from_slice(&(self.extension_data.len() as u16).to_be_bytes());
        output.extend_from_slice(&self.extension_data);
    }

    /// Parse an extension block: a u16 total length followed by extensions.
    ///
    /// An absent block (no bytes left) parses as an empty list.
    pub fn parse_block(input: &[u8]) -> IResult<&[u8], Vec<Extension>> {
        let mut extensions = Vec::new();

        if input.is_empty() {
            return Ok((input, extensions));
        }

        let (input, block_len) = be_u16(input)?;
        let (input, block) = take(block_len)(input)?;

        let mut rest = block;
        while !rest.is_empty() {
            let (r, ext) = Extension::parse(rest)?;
            extensions.push(ext);
            rest = r;
        }

        Ok((input, extensions))
    }

    /// Serialize an extension block; writes nothing for an empty list.
    pub fn serialize_block(extensions: &[Extension], output: &mut Vec<u8>) {
        if extensions.is_empty() {
            return;
        }

        let block_len: usize = extensions.iter().map(|e| 4 + e.extension_data.len()).sum();
        output.extend_from_slice(&(block_len as u16).to_be_bytes());
        for ext in extensions {
            ext.serialize(output);
        }
    }

    /// The signature_algorithms extension advertising our ECDSA pairs.
    pub fn signature_algorithms(algorithms: &[SignatureAndHashAlgorithm]) -> Extension {
        let mut data = Vec::with_capacity(2 + algorithms.len() * 2);
        data.extend_from_slice(&((algorithms.len() * 2) as u16).to_be_bytes());
        for alg in algorithms {
            data.extend_from_slice(&alg.as_u16().to_be_bytes());
        }
        Extension::new(ExtensionType::SignatureAlgorithms, data)
    }

    /// The supported_groups (elliptic_curves) extension.
    pub fn supported_groups(curves: &[NamedCurve]) -> Extension {
        let mut data = Vec::with_capacity(2 + curves.len() * 2);
        data.extend_from_slice(&((curves.len() * 2) as u16).to_be_bytes());
        for curve in curves {
            data.extend_from_slice(&curve.as_u16().to_be_bytes());
        }
        Extension::new(ExtensionType::SupportedGroups, data)
    }

    /// The ec_point_formats extension offering uncompressed points only.
    pub fn ec_point_formats() -> Extension {
        Extension::new(ExtensionType::EcPointFormats, vec![0x01, 0x00])
    }
}

/// A client_certificate_type / server_certificate_type extension payload
/// (RFC 7250): a one-byte-length list of certificate types in preference
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateTypeExtension {
    pub certificate_types: SmallVec<[CertificateType; 2]>,
}

impl CertificateTypeExtension {
    pub fn new(certificate_types: SmallVec<[CertificateType; 2]>) -> Self {
        CertificateTypeExtension { certificate_types }
    }

    /// Whether the preferred (first) entry selects Raw Public Keys.
    pub fn prefers_raw_public_key(&self) -> bool {
        self.certificate_types
            .first()
            .map(|t| *t == CertificateType::RawPublicKey)
            .unwrap_or(false)
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], CertificateTypeExtension> {
        let (input, len) = be_u8(input)?;
        if len == 0 {
            return Err(Err::Failure(Error::new(input, ErrorKind::LengthValue)));
        }
        let (input, types) = take(len)(input)?;
        let certificate_types = types.iter().map(|&b| CertificateType::from_u8(b)).collect();
        Ok((input, CertificateTypeExtension { certificate_types }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.certificate_types.len() as u8);
        for ty in &self.certificate_types {
            output.push(ty.as_u8());
        }
    }

    /// Wrap into a hello [`Extension`] of the given direction.
    pub fn to_extension(&self, extension_type: ExtensionType) -> Extension {
        let mut data = Vec::with_capacity(1 + self.certificate_types.len());
        self.serialize(&mut data);
        Extension::new(extension_type, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn extension_roundtrip() {
        let ext = Extension::new(ExtensionType::SignatureAlgorithms, vec![0x00, 0x02, 0x04, 0x03]);

        let mut serialized = Vec::new();
        ext.serialize(&mut serialized);
        assert_eq!(serialized, &[0x00, 0x0D, 0x00, 0x04, 0x00, 0x02, 0x04, 0x03]);

        let (rest, parsed) = Extension::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, ext);
    }

    #[test]
    fn block_roundtrip() {
        let extensions = vec![
            Extension::ec_point_formats(),
            Extension::new(ExtensionType::Unknown(0xFF01), vec![0x00]),
        ];

        let mut serialized = Vec::new();
        Extension::serialize_block(&extensions, &mut serialized);

        let (rest, parsed) = Extension::parse_block(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, extensions);
    }

    #[test]
    fn empty_block_writes_nothing() {
        let mut serialized = Vec::new();
        Extension::serialize_block(&[], &mut serialized);
        assert!(serialized.is_empty());

        let (_, parsed) = Extension::parse_block(&serialized).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn certificate_type_preference() {
        let ext = CertificateTypeExtension::new(smallvec![
            CertificateType::RawPublicKey,
            CertificateType::X509
        ]);
        assert!(ext.prefers_raw_public_key());

        let mut serialized = Vec::new();
        ext.serialize(&mut serialized);
        assert_eq!(serialized, &[0x02, 0x02, 0x00]);

        let (rest, parsed) = CertificateTypeExtension::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, ext);
    }

    #[test]
    fn certificate_type_empty_list_rejected() {
        assert!(CertificateTypeExtension::parse(&[0x00]).is_err());
    }
}

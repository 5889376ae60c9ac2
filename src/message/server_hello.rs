use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::be_u8;
use nom::Err;
use nom::IResult;

use super::{CertificateTypeExtension, CipherSuite, CompressionMethod};
use super::{Extension, ExtensionType, ProtocolVersion, Random, SessionId};

/// The ServerHello body (RFC 5246 §7.4.1.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub server_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suite: CipherSuite,
    pub compression_method: CompressionMethod,
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    pub fn new(
        server_version: ProtocolVersion,
        random: Random,
        session_id: SessionId,
        cipher_suite: CipherSuite,
        compression_method: CompressionMethod,
    ) -> Self {
        ServerHello {
            server_version,
            random,
            session_id,
            cipher_suite,
            compression_method,
            extensions: Vec::new(),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ServerHello> {
        let (input, server_version) = ProtocolVersion::parse(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id_len) = be_u8(input)?;
        let (input, session_id_data) = take(session_id_len)(input)?;
        let session_id = SessionId::try_new(session_id_data)
            .map_err(|_| Err::Failure(Error::new(input, ErrorKind::LengthValue)))?;
        let (input, cipher_suite) = CipherSuite::parse(input)?;
        let (input, compression_method) = CompressionMethod::parse(input)?;
        let (input, extensions) = Extension::parse_block(input)?;

        Ok((
            input,
            ServerHello {
                server_version,
                random,
                session_id,
                cipher_suite,
                compression_method,
                extensions,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.server_version.as_u16().to_be_bytes());
        self.random.serialize(output);
        output.push(self.session_id.len() as u8);
        output.extend_from_slice(&self.session_id);
        output.extend_from_slice(&self.cipher_suite.as_u16().to_be_bytes());
        output.push(self.compression_method.as_u8());
        Extension::serialize_block(&self.extensions, output);
    }

    /// The client_certificate_type extension, if the server sent one.
    pub fn client_certificate_type_extension(&self) -> Option<CertificateTypeExtension> {
        self.certificate_type_extension(ExtensionType::ClientCertificateType)
    }

    /// The server_certificate_type extension, if the server sent one.
    pub fn server_certificate_type_extension(&self) -> Option<CertificateTypeExtension> {
        self.certificate_type_extension(ExtensionType::ServerCertificateType)
    }

    fn certificate_type_extension(&self, ty: ExtensionType) -> Option<CertificateTypeExtension> {
        self.extensions
            .iter()
            .find(|e| e.extension_type == ty)
            .and_then(|e| CertificateTypeExtension::parse(&e.extension_data).ok())
            .map(|(_, ext)| ext)
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::super::CertificateType;
    use super::*;

    const MESSAGE: &[u8] = &[
        0xFE, 0xFD, // ProtocolVersion::DTLS1_2
        // Random
        0x5F, 0x37, 0xA9, 0x4B, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D,
        0x1E, 0x1F, //
        0x01, // SessionId length
        0xAA, // SessionId
        0xC0, 0xA8, // TLS_PSK_WITH_AES_128_CCM_8
        0x00, // CompressionMethod::Null
    ];

    #[test]
    fn roundtrip() {
        let random = Random::parse(&MESSAGE[2..34]).unwrap().1;
        let server_hello = ServerHello::new(
            ProtocolVersion::DTLS1_2,
            random,
            SessionId::try_new(&[0xAA]).unwrap(),
            CipherSuite::TLS_PSK_WITH_AES_128_CCM_8,
            CompressionMethod::Null,
        );

        let mut serialized = Vec::new();
        server_hello.serialize(&mut serialized);
        assert_eq!(serialized, MESSAGE);

        let (rest, parsed) = ServerHello::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, server_hello);
    }

    #[test]
    fn raw_public_key_extensions() {
        let random = Random::parse(&MESSAGE[2..34]).unwrap().1;
        let mut server_hello = ServerHello::new(
            ProtocolVersion::DTLS1_2,
            random,
            SessionId::empty(),
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8,
            CompressionMethod::Null,
        );
        let cert_types = CertificateTypeExtension::new(smallvec![CertificateType::RawPublicKey]);
        server_hello
            .extensions
            .push(cert_types.to_extension(ExtensionType::ServerCertificateType));

        let mut serialized = Vec::new();
        server_hello.serialize(&mut serialized);

        let (_, parsed) = ServerHello::parse(&serialized).unwrap();
        assert!(parsed.client_certificate_type_extension().is_none());
        assert!(parsed
            .server_certificate_type_extension()
            .unwrap()
            .prefers_raw_public_key());
    }
}

use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::{be_u16, be_u8};
use nom::Err;
use nom::IResult;
use smallvec::smallvec;
use tinyvec::ArrayVec;

use super::util::many1;
use super::{CertificateType, CertificateTypeExtension, CipherSuite, CompressionMethod};
use super::{Cookie, Extension, ExtensionType, NamedCurve, ProtocolVersion, Random, SessionId};
use super::{HashAlgorithm, SignatureAlgorithm, SignatureAndHashAlgorithm};

/// The ClientHello body (RFC 5246 §7.4.1.2 with the DTLS cookie field from
/// RFC 6347 §4.2.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub client_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cookie: Cookie,
    pub cipher_suites: ArrayVec<[CipherSuite; 32]>,
    pub compression_methods: ArrayVec<[CompressionMethod; 4]>,
    pub extensions: Vec<Extension>,
}

impl ClientHello {
    pub fn new(
        client_version: ProtocolVersion,
        random: Random,
        session_id: SessionId,
        cookie: Cookie,
        cipher_suites: ArrayVec<[CipherSuite; 32]>,
        compression_methods: ArrayVec<[CompressionMethod; 4]>,
    ) -> Self {
        ClientHello {
            client_version,
            random,
            session_id,
            cookie,
            cipher_suites,
            compression_methods,
            extensions: Vec::new(),
        }
    }

    /// Add the standard extensions for this hello's cipher suites.
    ///
    /// Signature algorithms are always announced. Supported groups and EC
    /// point formats are added when any offered suite does elliptic-curve
    /// key agreement. When `send_raw_key` is set, both RFC 7250
    /// certificate-type extensions are attached with Raw Public Key as the
    /// preferred entry.
    pub fn with_extensions(mut self, send_raw_key: bool) -> Self {
        let has_ecc = self.cipher_suites.iter().any(|suite| suite.has_ecc());

        if has_ecc {
            self.extensions.push(Extension::supported_groups(&[
                NamedCurve::Secp256r1,
                NamedCurve::Secp384r1,
            ]));
            self.extensions.push(Extension::ec_point_formats());
        }

        self.extensions.push(Extension::signature_algorithms(&[
            SignatureAndHashAlgorithm::new(HashAlgorithm::Sha256, SignatureAlgorithm::Ecdsa),
            SignatureAndHashAlgorithm::new(HashAlgorithm::Sha384, SignatureAlgorithm::Ecdsa),
        ]));

        if send_raw_key {
            let cert_types = CertificateTypeExtension::new(smallvec![
                CertificateType::RawPublicKey,
                CertificateType::X509
            ]);
            self.extensions
                .push(cert_types.to_extension(ExtensionType::ClientCertificateType));
            self.extensions
                .push(cert_types.to_extension(ExtensionType::ServerCertificateType));
        }

        self
    }

    /// Install the cookie from a HelloVerifyRequest.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookie = cookie;
    }

    /// The encoded body length; a re-sent hello's fragment length must
    /// equal this after the cookie is installed.
    pub fn message_length(&self) -> u32 {
        let mut buf = Vec::new();
        self.serialize(&mut buf);
        buf.len() as u32
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ClientHello> {
        let (input, client_version) = ProtocolVersion::parse(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id_len) = be_u8(input)?;
        let (input, session_id_data) = take(session_id_len)(input)?;
        let session_id = SessionId::try_new(session_id_data)
            .map_err(|_| Err::Failure(Error::new(input, ErrorKind::LengthValue)))?;
        let (input, cookie_len) = be_u8(input)?;
        let (input, cookie_data) = take(cookie_len)(input)?;
        let cookie = Cookie::try_new(cookie_data)
            .map_err(|_| Err::Failure(Error::new(input, ErrorKind::LengthValue)))?;
        let (input, cipher_suites_len) = be_u16(input)?;
        let (input, input_cipher) = take(cipher_suites_len)(input)?;
        let (rest, cipher_suites) = many1(CipherSuite::parse)(input_cipher)?;
        if !rest.is_empty() {
            return Err(Err::Failure(Error::new(rest, ErrorKind::LengthValue)));
        }
        let (input, compression_methods_len) = be_u8(input)?;
        let (input, input_compression) = take(compression_methods_len)(input)?;
        let (rest, compression_methods) = many1(CompressionMethod::parse)(input_compression)?;
        if !rest.is_empty() {
            return Err(Err::Failure(Error::new(rest, ErrorKind::LengthValue)));
        }

        let (input, extensions) = Extension::parse_block(input)?;

        Ok((
            input,
            ClientHello {
                client_version,
                random,
                session_id,
                cookie,
                cipher_suites,
                compression_methods,
                extensions,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.client_version.as_u16().to_be_bytes());
        self.random.serialize(output);
        output.push(self.session_id.len() as u8);
        output.extend_from_slice(&self.session_id);
        output.push(self.cookie.len() as u8);
        output.extend_from_slice(&self.cookie);
        output.extend_from_slice(&(self.cipher_suites.len() as u16 * 2).to_be_bytes());
        for suite in &self.cipher_suites {
            output.extend_from_slice(&suite.as_u16().to_be_bytes());
        }
        output.push(self.compression_methods.len() as u8);
        for method in &self.compression_methods {
            output.push(method.as_u8());
        }

        Extension::serialize_block(&self.extensions, output);
    }

    /// The client_certificate_type extension, if present.
    pub fn client_certificate_type_extension(&self) -> Option<CertificateTypeExtension> {
        self.certificate_type_extension(ExtensionType::ClientCertificateType)
    }

    /// The server_certificate_type extension, if present.
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
    use tinyvec::array_vec;

    use super::*;

    const MESSAGE: &[u8] = &[
        0xFE, 0xFD, // ProtocolVersion::DTLS1_2
        // Random
        0x5F, 0x37, 0xA9, 0x4B, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D,
        0x1E, 0x1F, //
        0x01, // SessionId length
        0xAA, // SessionId
        0x01, // Cookie length
        0xBB, // Cookie
        0x00, 0x04, // CipherSuites length
        0xC0, 0xAE, // TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8
        0xC0, 0xA8, // TLS_PSK_WITH_AES_128_CCM_8
        0x01, // CompressionMethods length
        0x00, // CompressionMethod::Null
    ];

    fn hello() -> ClientHello {
        let random = Random::parse(&MESSAGE[2..34]).unwrap().1;
        let session_id = SessionId::try_new(&[0xAA]).unwrap();
        let cookie = Cookie::try_new(&[0xBB]).unwrap();
        let cipher_suites = array_vec![
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8,
            CipherSuite::TLS_PSK_WITH_AES_128_CCM_8
        ];
        let compression_methods = array_vec![[CompressionMethod; 4] => CompressionMethod::Null];

        ClientHello::new(
            ProtocolVersion::DTLS1_2,
            random,
            session_id,
            cookie,
            cipher_suites,
            compression_methods,
        )
    }

    #[test]
    fn roundtrip() {
        let client_hello = hello();

        let mut serialized = Vec::new();
        client_hello.serialize(&mut serialized);
        assert_eq!(serialized, MESSAGE);

        let (rest, parsed) = ClientHello::parse(&serialized).unwrap();
        assert_eq!(parsed, client_hello);
        assert!(rest.is_empty());
    }

    #[test]
    fn extensions_roundtrip() {
        let client_hello = hello().with_extensions(true);

        let mut serialized = Vec::new();
        client_hello.serialize(&mut serialized);

        let (rest, parsed) = ClientHello::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, client_hello);

        let client_types = parsed.client_certificate_type_extension().unwrap();
        assert!(client_types.prefers_raw_public_key());
        let server_types = parsed.server_certificate_type_extension().unwrap();
        assert!(server_types.prefers_raw_public_key());
    }

    #[test]
    fn cookie_changes_message_length() {
        let mut client_hello = hello();
        let before = client_hello.message_length();

        client_hello.set_cookie(Cookie::try_new(&[0xA1, 0xB2, 0xC3]).unwrap());
        assert_eq!(client_hello.message_length(), before + 2);
    }

    #[test]
    fn session_id_too_long() {
        let mut message = MESSAGE.to_vec();
        message[34] = 0x21; // SessionId length (33, over the cap)

        assert!(ClientHello::parse(&message).is_err());
    }
}

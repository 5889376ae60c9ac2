use p256::ecdsa::{
    Signature as P256Signature, SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey,
};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey};
use p384::ecdsa::{
    Signature as P384Signature, SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey,
};
use signature::{Signer, Verifier};
use x509_parser::prelude::*;

use crate::message::{DigitallySigned, HashAlgorithm, SignatureAlgorithm, SignatureAndHashAlgorithm};
use crate::Error;

/// What the driver needs from the server's leaf certificate: the key to
/// verify ServerKeyExchange with, and the subject to bind as peer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCertificateInfo {
    /// DER SubjectPublicKeyInfo.
    pub spki_der: Vec<u8>,
    /// The X.500 subject, rendered as an RFC 4514 string.
    pub subject: String,
}

/// Extract SPKI and subject from a DER X.509 certificate.
pub fn leaf_certificate_info(der: &[u8]) -> Result<LeafCertificateInfo, Error> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| Error::CertificateError(format!("leaf certificate: {}", e)))?;

    Ok(LeafCertificateInfo {
        spki_der: cert.public_key().raw.to_vec(),
        subject: cert.subject().to_string(),
    })
}

/// The verification keys this crate understands, parsed from an SPKI.
enum EcVerifyingKey {
    P256(P256VerifyingKey),
    P384(P384VerifyingKey),
}

fn parse_spki(spki_der: &[u8]) -> Result<EcVerifyingKey, Error> {
    if let Ok(key) = P256VerifyingKey::from_public_key_der(spki_der) {
        return Ok(EcVerifyingKey::P256(key));
    }
    if let Ok(key) = P384VerifyingKey::from_public_key_der(spki_der) {
        return Ok(EcVerifyingKey::P384(key));
    }
    Err(Error::CryptoError(
        "server public key is not an EC key on P-256 or P-384".into(),
    ))
}

/// Verify the server's signature over its ECDH parameters
/// (RFC 4492 §5.4): `client_random || server_random || params`.
pub fn verify_signed_params(
    spki_der: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    params: &[u8],
    signed: &DigitallySigned,
) -> Result<(), Error> {
    if signed.algorithm.signature != SignatureAlgorithm::Ecdsa {
        return Err(Error::HandshakeFailure(format!(
            "server signed ECDH params with unsupported algorithm {:?}",
            signed.algorithm.signature
        )));
    }

    let mut message = Vec::with_capacity(client_random.len() + server_random.len() + params.len());
    message.extend_from_slice(client_random);
    message.extend_from_slice(server_random);
    message.extend_from_slice(params);

    match (parse_spki(spki_der)?, signed.algorithm.hash) {
        (EcVerifyingKey::P256(key), HashAlgorithm::Sha256) => {
            let signature = P256Signature::from_der(&signed.signature)
                .map_err(|_| Error::DecryptError("malformed ECDSA signature".into()))?;
            key.verify(&message, &signature)
                .map_err(|_| Error::DecryptError("ServerKeyExchange signature mismatch".into()))
        }
        (EcVerifyingKey::P384(key), HashAlgorithm::Sha384) => {
            let signature = P384Signature::from_der(&signed.signature)
                .map_err(|_| Error::DecryptError("malformed ECDSA signature".into()))?;
            key.verify(&message, &signature)
                .map_err(|_| Error::DecryptError("ServerKeyExchange signature mismatch".into()))
        }
        (_, hash) => Err(Error::HandshakeFailure(format!(
            "hash algorithm {:?} does not match the server's curve",
            hash
        ))),
    }
}

/// Sign the concatenated handshake messages for CertificateVerify
/// (RFC 5246 §7.4.8) with our PKCS#8 ECDSA private key.
pub fn sign_handshake_messages(
    private_key_der: &[u8],
    algorithm: SignatureAndHashAlgorithm,
    messages: &[u8],
) -> Result<DigitallySigned, Error> {
    if algorithm.signature != SignatureAlgorithm::Ecdsa {
        return Err(Error::HandshakeFailure(format!(
            "cannot sign with algorithm {:?}",
            algorithm.signature
        )));
    }

    let signature = match algorithm.hash {
        HashAlgorithm::Sha256 => {
            let key = P256SigningKey::from_pkcs8_der(private_key_der)
                .map_err(|_| Error::CryptoError("private key is not PKCS#8 P-256".into()))?;
            let signature: P256Signature = key.sign(messages);
            signature.to_der().as_bytes().to_vec()
        }
        HashAlgorithm::Sha384 => {
            let key = P384SigningKey::from_pkcs8_der(private_key_der)
                .map_err(|_| Error::CryptoError("private key is not PKCS#8 P-384".into()))?;
            let signature: P384Signature = key.sign(messages);
            signature.to_der().as_bytes().to_vec()
        }
        HashAlgorithm::Unknown(v) => {
            return Err(Error::HandshakeFailure(format!(
                "cannot sign with hash algorithm {}",
                v
            )))
        }
    };

    Ok(DigitallySigned::new(algorithm, signature))
}

/// The first algorithm in the server's offered list we can honor with the
/// given private key, if any.
pub fn select_signature_algorithm(
    private_key_der: &[u8],
    offered: &[SignatureAndHashAlgorithm],
) -> Option<SignatureAndHashAlgorithm> {
    let is_p256 = P256SigningKey::from_pkcs8_der(private_key_der).is_ok();
    let is_p384 = P384SigningKey::from_pkcs8_der(private_key_der).is_ok();

    offered
        .iter()
        .find(|alg| {
            alg.signature == SignatureAlgorithm::Ecdsa
                && match alg.hash {
                    HashAlgorithm::Sha256 => is_p256,
                    HashAlgorithm::Sha384 => is_p384,
                    HashAlgorithm::Unknown(_) => false,
                }
        })
        .copied()
}

#[cfg(test)]
mod tests {
    use p256::pkcs8::{EncodePrivateKey, EncodePublicKey};
    use rand::rngs::OsRng;

    use super::*;

    fn p256_keypair() -> (Vec<u8>, Vec<u8>) {
        let secret = p256::SecretKey::random(&mut OsRng);
        let private_der = secret.to_pkcs8_der().unwrap().as_bytes().to_vec();
        let public_der = secret.public_key().to_public_key_der().unwrap().into_vec();
        (private_der, public_der)
    }

    #[test]
    fn sign_and_verify_params() {
        let (private_der, public_der) = p256_keypair();
        let alg =
            SignatureAndHashAlgorithm::new(HashAlgorithm::Sha256, SignatureAlgorithm::Ecdsa);

        let client_random = [0x01u8; 32];
        let server_random = [0x02u8; 32];
        let params = [0x03, 0x00, 0x17, 0x01, 0x04];

        let mut message = Vec::new();
        message.extend_from_slice(&client_random);
        message.extend_from_slice(&server_random);
        message.extend_from_slice(&params);
        let signed = sign_handshake_messages(&private_der, alg, &message).unwrap();

        verify_signed_params(&public_der, &client_random, &server_random, &params, &signed)
            .unwrap();
    }

    #[test]
    fn tampered_params_rejected() {
        let (private_der, public_der) = p256_keypair();
        let alg =
            SignatureAndHashAlgorithm::new(HashAlgorithm::Sha256, SignatureAlgorithm::Ecdsa);

        let client_random = [0x01u8; 32];
        let server_random = [0x02u8; 32];
        let params = [0x03, 0x00, 0x17, 0x01, 0x04];

        let mut message = Vec::new();
        message.extend_from_slice(&client_random);
        message.extend_from_slice(&server_random);
        message.extend_from_slice(&params);
        let signed = sign_handshake_messages(&private_der, alg, &message).unwrap();

        let bad_params = [0x03, 0x00, 0x17, 0x01, 0x05];
        assert!(verify_signed_params(
            &public_der,
            &client_random,
            &server_random,
            &bad_params,
            &signed
        )
        .is_err());
    }

    #[test]
    fn selects_first_supportable_algorithm() {
        let (private_der, _) = p256_keypair();

        let offered = [
            SignatureAndHashAlgorithm::new(HashAlgorithm::Sha384, SignatureAlgorithm::Ecdsa),
            SignatureAndHashAlgorithm::new(HashAlgorithm::Sha256, SignatureAlgorithm::Ecdsa),
        ];
        let selected = select_signature_algorithm(&private_der, &offered).unwrap();
        assert_eq!(selected.hash, HashAlgorithm::Sha256);

        let unsupported = [SignatureAndHashAlgorithm::new(
            HashAlgorithm::Unknown(2),
            SignatureAlgorithm::Unknown(1),
        )];
        assert!(select_signature_algorithm(&private_der, &unsupported).is_none());
    }
}

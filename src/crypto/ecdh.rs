use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{ecdh::EphemeralSecret as P256EphemeralSecret, PublicKey as P256PublicKey};
use p384::{ecdh::EphemeralSecret as P384EphemeralSecret, PublicKey as P384PublicKey};
use rand::rngs::OsRng;

use crate::message::NamedCurve;
use crate::Error;

/// Ephemeral elliptic-curve Diffie-Hellman over the server-chosen curve.
///
/// Creating the value generates the key pair; the shared secret is the raw
/// X coordinate of the agreed point, as TLS uses it for the premaster
/// secret (RFC 4492 §5.10).
pub enum Ecdhe {
    P256 { secret: P256EphemeralSecret },
    P384 { secret: P384EphemeralSecret },
}

impl Ecdhe {
    pub fn new(curve: NamedCurve) -> Result<Self, Error> {
        match curve {
            NamedCurve::Secp256r1 => Ok(Ecdhe::P256 {
                secret: P256EphemeralSecret::random(&mut OsRng),
            }),
            NamedCurve::Secp384r1 => Ok(Ecdhe::P384 {
                secret: P384EphemeralSecret::random(&mut OsRng),
            }),
            other => Err(Error::HandshakeFailure(format!(
                "unsupported elliptic curve for ECDH: {:?}",
                other
            ))),
        }
    }

    /// Our public key as an uncompressed SEC1 point.
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            Ecdhe::P256 { secret } => P256PublicKey::from(secret)
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            Ecdhe::P384 { secret } => P384PublicKey::from(secret)
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
        }
    }

    /// Agree with the peer's point and return the shared X coordinate.
    pub fn compute_secret(&self, peer_point: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Ecdhe::P256 { secret } => {
                let encoded = p256::EncodedPoint::from_bytes(peer_point).map_err(|_| {
                    Error::CryptoError("invalid peer public point for P-256".into())
                })?;
                let public = P256PublicKey::from_encoded_point(&encoded);
                if public.is_some().into() {
                    let shared = secret.diffie_hellman(&public.unwrap());
                    Ok(shared.raw_secret_bytes().as_slice().to_vec())
                } else {
                    Err(Error::CryptoError(
                        "peer public point not on curve P-256".into(),
                    ))
                }
            }
            Ecdhe::P384 { secret } => {
                let encoded = p384::EncodedPoint::from_bytes(peer_point).map_err(|_| {
                    Error::CryptoError("invalid peer public point for P-384".into())
                })?;
                let public = P384PublicKey::from_encoded_point(&encoded);
                if public.is_some().into() {
                    let shared = secret.diffie_hellman(&public.unwrap());
                    Ok(shared.raw_secret_bytes().as_slice().to_vec())
                } else {
                    Err(Error::CryptoError(
                        "peer public point not on curve P-384".into(),
                    ))
                }
            }
        }
    }

    pub fn curve(&self) -> NamedCurve {
        match self {
            Ecdhe::P256 { .. } => NamedCurve::Secp256r1,
            Ecdhe::P384 { .. } => NamedCurve::Secp384r1,
        }
    }
}

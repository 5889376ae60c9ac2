use zeroize::Zeroizing;

use crate::message::ClientKeyExchange;
use crate::Error;

use super::Ecdhe;

/// The shared output of the three key-exchange strategies: what goes on the
/// wire and what feeds the master-secret derivation.
pub struct KeyExchangeOutcome {
    pub premaster_secret: Zeroizing<Vec<u8>>,
    pub exchange: ClientKeyExchange,
}

/// ECDHE: the payload is our ephemeral public point, the premaster secret
/// the raw X coordinate of the agreed point.
pub fn ecdhe_outcome(ecdhe: &Ecdhe, server_point: &[u8]) -> Result<KeyExchangeOutcome, Error> {
    let premaster = ecdhe.compute_secret(server_point)?;
    Ok(KeyExchangeOutcome {
        premaster_secret: Zeroizing::new(premaster),
        exchange: ClientKeyExchange::Ecdh {
            public_point: ecdhe.public_key(),
        },
    })
}

/// PSK: the payload is the identity, the premaster secret the RFC 4279 §2
/// construction.
pub fn psk_outcome(identity: &str, psk: &[u8]) -> KeyExchangeOutcome {
    KeyExchangeOutcome {
        premaster_secret: Zeroizing::new(psk_premaster_secret(psk)),
        exchange: ClientKeyExchange::Psk {
            identity: identity.as_bytes().to_vec(),
        },
    }
}

/// NULL: empty payload, empty premaster secret.
pub fn null_outcome() -> KeyExchangeOutcome {
    KeyExchangeOutcome {
        premaster_secret: Zeroizing::new(Vec::new()),
        exchange: ClientKeyExchange::Null,
    }
}

/// The PSK premaster secret (RFC 4279 §2):
/// `uint16(len(Z)) || Z || uint16(len(psk)) || psk` with `Z` all zeros of
/// the key's length.
pub fn psk_premaster_secret(psk: &[u8]) -> Vec<u8> {
    let len = psk.len() as u16;
    let mut out = Vec::with_capacity(4 + 2 * psk.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&vec![0u8; psk.len()]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(psk);
    out
}

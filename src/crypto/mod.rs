//! Cryptographic operations for the DTLS 1.2 handshake.
//!
//! Everything here is synchronous and side-effect free apart from drawing
//! randomness for ephemeral keys: the driver owns all state, strategies are
//! pure over borrowed context.

mod cipher;
mod ecdh;
mod key_exchange;
mod prf;
mod signing;

pub use cipher::{CipherState, KeyMaterial, AES_128_CCM_8_KEY_BLOCK_LEN};
pub use ecdh::Ecdhe;
pub use key_exchange::{ecdhe_outcome, null_outcome, psk_outcome, KeyExchangeOutcome};
pub use key_exchange::psk_premaster_secret;
pub use prf::{calculate_master_secret, generate_verify_data, key_expansion, prf_tls12};
pub use signing::{
    leaf_certificate_info, select_signature_algorithm, sign_handshake_messages,
    verify_signed_params, LeafCertificateInfo,
};

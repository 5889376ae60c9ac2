use aes::Aes128;
use ccm::aead::generic_array::GenericArray;
use ccm::aead::{KeyInit, Payload};
use ccm::consts::{U12, U8};
use ccm::{aead::Aead, Ccm};
use zeroize::Zeroize;

use crate::message::HashAlgorithm;
use crate::Error;

use super::key_expansion;

/// AES-128-CCM-8 record protection: 16-byte key, 8-byte tag, 12-byte nonce
/// built from a 4-byte implicit salt and the 8-byte explicit part
/// (RFC 6655 §3 / RFC 7251).
type Aes128Ccm8 = Ccm<Aes128, U8, U12>;

/// Key block layout for the CCM_8 suites: two write keys and two 4-byte
/// write IVs, no MAC keys.
pub const AES_128_CCM_8_KEY_BLOCK_LEN: usize = 2 * (16 + 4);

/// One direction's record cipher: AEAD key plus the implicit nonce salt.
#[derive(Clone)]
pub struct CipherState {
    key: [u8; 16],
    fixed_iv: [u8; 4],
}

impl CipherState {
    pub fn new(key: [u8; 16], fixed_iv: [u8; 4]) -> Self {
        CipherState { key, fixed_iv }
    }

    /// The implicit salt, needed by the record layer to build nonces.
    pub fn fixed_iv(&self) -> &[u8; 4] {
        &self.fixed_iv
    }

    fn nonce(&self, explicit: &[u8; 8]) -> GenericArray<u8, U12> {
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&self.fixed_iv);
        nonce[4..].copy_from_slice(explicit);
        GenericArray::clone_from_slice(&nonce)
    }

    /// Seal a record fragment; returns the ciphertext with the 8-byte tag
    /// appended (the explicit nonce goes on the wire separately).
    pub fn encrypt(
        &self,
        explicit_nonce: &[u8; 8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let cipher = Aes128Ccm8::new_from_slice(&self.key)
            .map_err(|_| Error::CryptoError("bad AES-128-CCM key length".into()))?;
        cipher
            .encrypt(
                &self.nonce(explicit_nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| Error::CryptoError("CCM encryption failed".into()))
    }

    /// Open a record fragment (ciphertext with appended tag).
    pub fn decrypt(
        &self,
        explicit_nonce: &[u8; 8],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let cipher = Aes128Ccm8::new_from_slice(&self.key)
            .map_err(|_| Error::CryptoError("bad AES-128-CCM key length".into()))?;
        cipher
            .decrypt(
                &self.nonce(explicit_nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| Error::DecryptError("CCM authentication failed".into()))
    }
}

impl Drop for CipherState {
    fn drop(&mut self) {
        self.key.zeroize();
        self.fixed_iv.zeroize();
    }
}

impl std::fmt::Debug for CipherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherState").finish_non_exhaustive()
    }
}

/// Both directions' cipher states, split out of a key block.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub client: CipherState,
    pub server: CipherState,
}

impl KeyMaterial {
    /// Expand the master secret into the CCM_8 key block
    /// (RFC 5246 §6.3: client key, server key, client IV, server IV).
    pub fn derive(
        algorithm: HashAlgorithm,
        master_secret: &[u8],
        client_random: &[u8],
        server_random: &[u8],
    ) -> Result<KeyMaterial, Error> {
        let mut block = key_expansion(
            algorithm,
            master_secret,
            client_random,
            server_random,
            AES_128_CCM_8_KEY_BLOCK_LEN,
        )?;

        let mut client_key = [0u8; 16];
        let mut server_key = [0u8; 16];
        let mut client_iv = [0u8; 4];
        let mut server_iv = [0u8; 4];
        client_key.copy_from_slice(&block[0..16]);
        server_key.copy_from_slice(&block[16..32]);
        client_iv.copy_from_slice(&block[32..36]);
        server_iv.copy_from_slice(&block[36..40]);
        block.zeroize();

        Ok(KeyMaterial {
            client: CipherState::new(client_key, client_iv),
            server: CipherState::new(server_key, server_iv),
        })
    }
}

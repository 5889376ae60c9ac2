use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384};

use crate::message::HashAlgorithm;
use crate::Error;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;

macro_rules! p_hash {
    ($name:ident, $mac:ty) => {
        fn $name(
            secret: &[u8],
            label: &str,
            seed: &[u8],
            output_len: usize,
        ) -> Result<Vec<u8>, Error> {
            let mut result = Vec::with_capacity(output_len);

            // A(0) is the label concatenated with the seed.
            let mut input = Vec::with_capacity(label.len() + seed.len());
            input.extend_from_slice(label.as_bytes());
            input.extend_from_slice(seed);

            // A(1) = HMAC_hash(secret, A(0))
            let mut hmac =
                <$mac>::new_from_slice(secret).map_err(|e| Error::CryptoError(e.to_string()))?;
            hmac.update(&input);
            let mut a = hmac.finalize().into_bytes();

            while result.len() < output_len {
                // output block = HMAC_hash(secret, A(i) + A(0))
                let mut hmac = <$mac>::new_from_slice(secret)
                    .map_err(|e| Error::CryptoError(e.to_string()))?;
                hmac.update(&a);
                hmac.update(&input);
                let output = hmac.finalize().into_bytes();

                let remaining = output_len - result.len();
                let to_copy = remaining.min(output.len());
                result.extend_from_slice(&output[..to_copy]);

                // A(i+1) = HMAC_hash(secret, A(i))
                if result.len() < output_len {
                    let mut hmac = <$mac>::new_from_slice(secret)
                        .map_err(|e| Error::CryptoError(e.to_string()))?;
                    hmac.update(&a);
                    a = hmac.finalize().into_bytes();
                }
            }

            Ok(result)
        }
    };
}

p_hash!(p_sha256, HmacSha256);
p_hash!(p_sha384, HmacSha384);

/// TLS 1.2 PRF (RFC 5246 §5).
///
/// `PRF(secret, label, seed) = P_<hash>(secret, label + seed)`, where the
/// hash is the cipher suite's PRF hash.
pub fn prf_tls12(
    algorithm: HashAlgorithm,
    secret: &[u8],
    label: &str,
    seed: &[u8],
    output_len: usize,
) -> Result<Vec<u8>, Error> {
    match algorithm {
        HashAlgorithm::Sha256 => p_sha256(secret, label, seed, output_len),
        HashAlgorithm::Sha384 => p_sha384(secret, label, seed, output_len),
        HashAlgorithm::Unknown(v) => Err(Error::CryptoError(format!(
            "no PRF for hash algorithm {}",
            v
        ))),
    }
}

/// Master secret derivation (RFC 5246 §8.1):
/// `PRF(premaster, "master secret", client_random + server_random, 48)`.
pub fn calculate_master_secret(
    algorithm: HashAlgorithm,
    pre_master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut seed = Vec::with_capacity(client_random.len() + server_random.len());
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);

    prf_tls12(algorithm, pre_master_secret, "master secret", &seed, 48)
}

/// Key block derivation (RFC 5246 §6.3); note the reversed random order:
/// `PRF(master, "key expansion", server_random + client_random, n)`.
pub fn key_expansion(
    algorithm: HashAlgorithm,
    master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    key_material_length: usize,
) -> Result<Vec<u8>, Error> {
    let mut seed = Vec::with_capacity(client_random.len() + server_random.len());
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    prf_tls12(
        algorithm,
        master_secret,
        "key expansion",
        &seed,
        key_material_length,
    )
}

/// The 12-byte Finished verify_data (RFC 5246 §7.4.9).
///
/// `label` is `"client finished"` or `"server finished"`; `handshake_hash`
/// is the transcript hash up to but not including the Finished itself.
pub fn generate_verify_data(
    algorithm: HashAlgorithm,
    master_secret: &[u8],
    label: &str,
    handshake_hash: &[u8],
) -> Result<[u8; 12], Error> {
    let out = prf_tls12(algorithm, master_secret, label, handshake_hash, 12)?;
    let mut verify_data = [0u8; 12];
    verify_data.copy_from_slice(&out);
    Ok(verify_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = &[0x0B; 20];
    const SEED: &[u8] = &[0x5F, 0x37, 0xA9, 0x4B, 0x01, 0x02, 0x03, 0x04];

    #[test]
    fn prefix_stable() {
        let long = prf_tls12(HashAlgorithm::Sha256, SECRET, "test label", SEED, 100).unwrap();
        let short = prf_tls12(HashAlgorithm::Sha256, SECRET, "test label", SEED, 32).unwrap();
        assert_eq!(long.len(), 100);
        assert_eq!(&long[..32], &short[..]);
    }

    #[test]
    fn labels_separate_output() {
        let client =
            generate_verify_data(HashAlgorithm::Sha256, SECRET, "client finished", SEED).unwrap();
        let server =
            generate_verify_data(HashAlgorithm::Sha256, SECRET, "server finished", SEED).unwrap();
        assert_ne!(client, server);
    }

    #[test]
    fn first_block_matches_hmac_chain() {
        // Recompute the first P_SHA256 block by hand: HMAC(secret, A(1) || A(0)).
        let mut a0 = Vec::new();
        a0.extend_from_slice(b"test label");
        a0.extend_from_slice(SEED);

        let mut mac = HmacSha256::new_from_slice(SECRET).unwrap();
        mac.update(&a0);
        let a1 = mac.finalize().into_bytes();

        let mut mac = HmacSha256::new_from_slice(SECRET).unwrap();
        mac.update(&a1);
        mac.update(&a0);
        let expected = mac.finalize().into_bytes();

        let out = prf_tls12(HashAlgorithm::Sha256, SECRET, "test label", SEED, 32).unwrap();
        assert_eq!(out.as_slice(), expected.as_slice());
    }

    #[test]
    fn master_secret_is_48_bytes() {
        let master =
            calculate_master_secret(HashAlgorithm::Sha256, &[0x01; 32], &[0x02; 32], &[0x03; 32])
                .unwrap();
        assert_eq!(master.len(), 48);
    }

    #[test]
    fn key_expansion_reverses_randoms() {
        let cr = [0x02u8; 32];
        let sr = [0x03u8; 32];
        let block = key_expansion(HashAlgorithm::Sha256, &[0x01; 48], &cr, &sr, 40).unwrap();

        // Same PRF invoked directly with server_random || client_random.
        let mut seed = Vec::new();
        seed.extend_from_slice(&sr);
        seed.extend_from_slice(&cr);
        let direct =
            prf_tls12(HashAlgorithm::Sha256, &[0x01; 48], "key expansion", &seed, 40).unwrap();

        assert_eq!(block, direct);
    }
}

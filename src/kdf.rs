//! Concat KDF (NIST SP 800-56A single-step KDF) for ECDH-ES
//!
//! `OtherInfo` is built in the JWA form: AlgorithmID, PartyUInfo and
//! PartyVInfo are each a 32-bit big-endian length followed by the data, and
//! SuppPubInfo is the output length in bits as a 32-bit big-endian integer.
//! SuppPrivInfo is empty.

use crate::error::KeyEncError;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Derive `key_data_len_bits` bits from the shared secret `z`
///
/// Deterministic: the recipient repeats the derivation with the same inputs
/// to recover the key.
pub fn concat_kdf(
    z: &[u8],
    key_data_len_bits: usize,
    algorithm_id: &[u8],
    apu: &[u8],
    apv: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeyEncError> {
    if key_data_len_bits == 0 || key_data_len_bits % 8 != 0 {
        return Err(KeyEncError::Encoding(format!(
            "Concat KDF output length must be a positive multiple of 8 bits, got {}",
            key_data_len_bits
        )));
    }
    let key_data_len_bits = u32::try_from(key_data_len_bits).map_err(|_| {
        KeyEncError::Encoding("Concat KDF output length exceeds 32 bits".to_string())
    })?;
    let key_len = key_data_len_bits as usize / 8;

    let mut other_info = Vec::with_capacity(16 + algorithm_id.len() + apu.len() + apv.len());
    for field in [algorithm_id, apu, apv] {
        other_info.extend_from_slice(&len_prefix(field)?);
        other_info.extend_from_slice(field);
    }
    other_info.extend_from_slice(&key_data_len_bits.to_be_bytes());

    let digest_len = <Sha256 as Digest>::output_size();
    let rounds = key_len.div_ceil(digest_len);
    let mut derived = Zeroizing::new(Vec::with_capacity(rounds * digest_len));

    for counter in 1..=rounds as u32 {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        derived.extend_from_slice(&hasher.finalize());
    }
    derived.truncate(key_len);

    Ok(derived)
}

fn len_prefix(field: &[u8]) -> Result<[u8; 4], KeyEncError> {
    u32::try_from(field.len())
        .map(u32::to_be_bytes)
        .map_err(|_| KeyEncError::Encoding("Concat KDF info field too long".to_string()))
}

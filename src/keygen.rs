//! Random key material
//!
//! All randomness comes from the operating system. An entropy failure is
//! reported as [`KeyEncError::Entropy`] and must abort the operation.

use crate::algorithm::ContentEncryptionAlgorithm;
use crate::error::KeyEncError;
use crate::types::Cek;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use zeroize::Zeroizing;

/// Generate `len` random bytes
pub fn random_bytes(len: usize) -> Result<Zeroizing<Vec<u8>>, KeyEncError> {
    if len == 0 {
        return Err(KeyEncError::InvalidConfig(
            "requested random length must be positive".to_string(),
        ));
    }
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Generate a random CEK sized for `enc`
pub fn generate_cek(enc: ContentEncryptionAlgorithm) -> Result<Cek, KeyEncError> {
    let bytes = random_bytes(enc.key_size())?;
    Ok(Cek::from_slice(&bytes))
}

/// Per-call CSPRNG seeded from the OS, for APIs that take an `Rng`
///
/// Seeding surfaces entropy failures as errors instead of the panic that
/// `OsRng::fill_bytes` would raise inside RSA padding or EC key generation.
pub(crate) fn rng() -> Result<StdRng, KeyEncError> {
    Ok(StdRng::from_rng(OsRng)?)
}

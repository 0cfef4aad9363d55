//! AES Key Wrap per RFC 3394
//!
//! Deterministic wrapping of a key with a 128, 192 or 256-bit key-encryption
//! key. Shared by AES-KW, ECDH-ES+AxKW and PBES2.

use crate::error::KeyEncError;
use aes::cipher::generic_array::GenericArray;
use aes::{Aes128, Aes192, Aes256};
use aes_kw::Kek;
use zeroize::Zeroizing;

/// Length of the integrity check value prepended by the wrap
pub const ICV_LEN: usize = 8;

/// Smallest key the wrap accepts (two 64-bit blocks)
pub const MIN_KEY_LEN: usize = 16;

/// Wrap `plaintext` under `kek`
///
/// `plaintext` must be a multiple of 8 bytes and at least 16 bytes; the
/// result is 8 bytes longer.
pub fn wrap(kek: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, KeyEncError> {
    if plaintext.len() < MIN_KEY_LEN || plaintext.len() % 8 != 0 {
        return Err(KeyEncError::Encoding(format!(
            "Key to wrap must be a multiple of 8 bytes and at least {} bytes, got {}",
            MIN_KEY_LEN,
            plaintext.len()
        )));
    }

    let mut output = vec![0u8; plaintext.len() + ICV_LEN];
    let result = match kek.len() {
        16 => Kek::<Aes128>::new(GenericArray::from_slice(kek)).wrap(plaintext, &mut output),
        24 => Kek::<Aes192>::new(GenericArray::from_slice(kek)).wrap(plaintext, &mut output),
        32 => Kek::<Aes256>::new(GenericArray::from_slice(kek)).wrap(plaintext, &mut output),
        got => return Err(invalid_kek(got)),
    };
    result.map_err(|e| KeyEncError::Encoding(format!("Key wrap failed: {:?}", e)))?;

    Ok(output)
}

/// Unwrap `ciphertext` under `kek`, verifying the integrity check value
///
/// Any verification failure, including a malformed length, is reported as
/// [`KeyEncError::Integrity`].
pub fn unwrap(kek: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeyEncError> {
    if !matches!(kek.len(), 16 | 24 | 32) {
        return Err(invalid_kek(kek.len()));
    }
    if ciphertext.len() < MIN_KEY_LEN + ICV_LEN || ciphertext.len() % 8 != 0 {
        return Err(KeyEncError::Integrity);
    }

    let mut output = Zeroizing::new(vec![0u8; ciphertext.len() - ICV_LEN]);
    let result = match kek.len() {
        16 => Kek::<Aes128>::new(GenericArray::from_slice(kek)).unwrap(ciphertext, &mut output),
        24 => Kek::<Aes192>::new(GenericArray::from_slice(kek)).unwrap(ciphertext, &mut output),
        _ => Kek::<Aes256>::new(GenericArray::from_slice(kek)).unwrap(ciphertext, &mut output),
    };
    result.map_err(|_| KeyEncError::Integrity)?;

    Ok(output)
}

fn invalid_kek(got: usize) -> KeyEncError {
    KeyEncError::InvalidKeyLength {
        expected: if got < 16 {
            16
        } else if got < 24 {
            24
        } else {
            32
        },
        got,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn test_rfc3394_128_bit_kek() {
        let kek = h("000102030405060708090A0B0C0D0E0F");
        let key = h("00112233445566778899AABBCCDDEEFF");
        let expected = h("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5");

        assert_eq!(wrap(&kek, &key).unwrap(), expected);
        assert_eq!(unwrap(&kek, &expected).unwrap().as_slice(), key.as_slice());
    }

    #[test]
    fn test_rfc3394_256_bit_kek_256_bit_key() {
        let kek = h("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F");
        let key = h("00112233445566778899AABBCCDDEEFF000102030405060708090A0B0C0D0E0F");
        let expected = h(
            "28C9F404C4B810F4CBCCB35CFB87F8263F5786E2D80ED326CBC7F0E71A99F43BFB988B9B7A02DD21",
        );

        assert_eq!(wrap(&kek, &key).unwrap(), expected);
        assert_eq!(unwrap(&kek, &expected).unwrap().as_slice(), key.as_slice());
    }

    #[test]
    fn test_wrap_unwrap_all_lengths() {
        for kek_len in [16, 24, 32] {
            let kek = vec![0x42u8; kek_len];
            for key_len in (16..=64).step_by(8) {
                let key: Vec<u8> = (0..key_len as u8).collect();
                let wrapped = wrap(&kek, &key).unwrap();
                assert_eq!(wrapped.len(), key_len + ICV_LEN);
                assert_eq!(unwrap(&kek, &wrapped).unwrap().as_slice(), key.as_slice());
            }
        }
    }

    #[test]
    fn test_any_bit_flip_detected() {
        let kek = [0x42u8; 16];
        let key = [0xABu8; 32];
        let wrapped = wrap(&kek, &key).unwrap();

        for byte in 0..wrapped.len() {
            for bit in 0..8 {
                let mut tampered = wrapped.clone();
                tampered[byte] ^= 1 << bit;
                assert!(matches!(
                    unwrap(&kek, &tampered),
                    Err(KeyEncError::Integrity)
                ));
            }
        }
    }

    #[test]
    fn test_wrong_kek_fails() {
        let wrapped = wrap(&[0x42u8; 32], &[0xABu8; 32]).unwrap();
        assert!(matches!(
            unwrap(&[0x43u8; 32], &wrapped),
            Err(KeyEncError::Integrity)
        ));
    }

    #[test]
    fn test_invalid_plaintext_rejected() {
        let kek = [0x42u8; 16];
        // Too short
        assert!(matches!(wrap(&kek, &[0u8; 8]), Err(KeyEncError::Encoding(_))));
        // Not multiple of 8
        assert!(matches!(wrap(&kek, &[0u8; 17]), Err(KeyEncError::Encoding(_))));
    }

    #[test]
    fn test_invalid_kek_rejected() {
        assert!(matches!(
            wrap(&[0u8; 20], &[0u8; 16]),
            Err(KeyEncError::InvalidKeyLength { got: 20, .. })
        ));
        assert!(matches!(
            unwrap(&[0u8; 15], &[0u8; 24]),
            Err(KeyEncError::InvalidKeyLength { got: 15, .. })
        ));
    }

    #[test]
    fn test_malformed_ciphertext_is_integrity_failure() {
        let kek = [0x42u8; 16];
        assert!(matches!(unwrap(&kek, &[0u8; 16]), Err(KeyEncError::Integrity)));
        assert!(matches!(unwrap(&kek, &[0u8; 25]), Err(KeyEncError::Integrity)));
    }
}

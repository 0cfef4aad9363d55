//! AES key wrapping with a shared symmetric key
//!
//! - `A128KW` / `A192KW` / `A256KW`: RFC 3394 key wrap
//! - `A128GCMKW` / `A192GCMKW` / `A256GCMKW`: AES-GCM with a fresh 96-bit IV
//!   per encryption; the IV and 128-bit tag travel in the header

// Allow deprecated warnings for GenericArray::from_slice() which is the correct API for aes-gcm 0.10.x
#![allow(deprecated)]

use super::{check_cek_len, check_kek, resolve_cek, Decrypter, Encrypter};
use crate::aeskw;
use crate::algorithm::{AlgorithmFamily, ContentEncryptionAlgorithm, KeyEncryptionAlgorithm};
use crate::error::KeyEncError;
use crate::keygen;
use crate::types::{ByteSource, Cek, KeyHeader, SymmetricKey};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{AeadInPlace, KeyInit, Nonce, Tag};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use zeroize::Zeroizing;

type Aes192Gcm = AesGcm<aes::Aes192, U12>;

/// AES-GCM IV length in bytes
pub const GCM_IV_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const GCM_TAG_LEN: usize = 16;

/// AES Key Wrap (`A128KW`, `A192KW`, `A256KW`)
#[derive(Debug, Clone)]
pub struct AesKwEncrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    kek: SymmetricKey,
    key_id: Option<String>,
}

impl AesKwEncrypter {
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        kek: &[u8],
    ) -> Result<Self, KeyEncError> {
        check_kek(alg, AlgorithmFamily::AesKw, kek)?;
        Ok(AesKwEncrypter {
            alg,
            enc,
            kek: SymmetricKey::from_slice(kek),
            key_id: None,
        })
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl Encrypter for AesKwEncrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        let cek = resolve_cek(self.enc, cek)?;
        let wrapped = aeskw::wrap(self.kek.as_slice(), cek.as_slice())?;
        Ok(ByteSource::new(cek, wrapped, KeyHeader::default()))
    }
}

#[derive(Debug, Clone)]
pub struct AesKwDecrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    kek: SymmetricKey,
}

impl AesKwDecrypter {
    /// `enc` fixes the CEK length the unwrap must produce
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        kek: &[u8],
    ) -> Result<Self, KeyEncError> {
        check_kek(alg, AlgorithmFamily::AesKw, kek)?;
        Ok(AesKwDecrypter {
            alg,
            enc,
            kek: SymmetricKey::from_slice(kek),
        })
    }
}

impl Decrypter for AesKwDecrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        let cek = aeskw::unwrap(self.kek.as_slice(), encrypted_key)?;
        check_cek_len(self.enc, Cek::from_slice(&cek))
    }
}

/// AES-GCM key wrap (`A128GCMKW`, `A192GCMKW`, `A256GCMKW`)
#[derive(Debug, Clone)]
pub struct AesGcmKwEncrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    kek: SymmetricKey,
    key_id: Option<String>,
}

impl AesGcmKwEncrypter {
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        kek: &[u8],
    ) -> Result<Self, KeyEncError> {
        check_kek(alg, AlgorithmFamily::AesGcmKw, kek)?;
        Ok(AesGcmKwEncrypter {
            alg,
            enc,
            kek: SymmetricKey::from_slice(kek),
            key_id: None,
        })
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl Encrypter for AesGcmKwEncrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        let cek = resolve_cek(self.enc, cek)?;
        let iv = keygen::random_bytes(GCM_IV_LEN)?;

        let kek = self.kek.as_slice();
        let (ciphertext, tag) = match kek.len() {
            16 => seal::<Aes128Gcm>(kek, &iv, cek.as_slice())?,
            24 => seal::<Aes192Gcm>(kek, &iv, cek.as_slice())?,
            _ => seal::<Aes256Gcm>(kek, &iv, cek.as_slice())?,
        };

        let header = KeyHeader {
            iv: Some(iv.to_vec()),
            tag: Some(tag),
            ..Default::default()
        };
        Ok(ByteSource::new(cek, ciphertext, header))
    }
}

/// Decrypts with the IV and tag taken from the message header
#[derive(Debug, Clone)]
pub struct AesGcmKwDecrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    kek: SymmetricKey,
    iv: Vec<u8>,
    tag: Vec<u8>,
}

impl AesGcmKwDecrypter {
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        kek: &[u8],
        header: &KeyHeader,
    ) -> Result<Self, KeyEncError> {
        check_kek(alg, AlgorithmFamily::AesGcmKw, kek)?;

        let iv = header.iv.clone().ok_or(KeyEncError::MissingHeader("iv"))?;
        let tag = header.tag.clone().ok_or(KeyEncError::MissingHeader("tag"))?;
        if iv.len() != GCM_IV_LEN {
            return Err(KeyEncError::Encoding(format!(
                "iv must be {} bytes, got {}",
                GCM_IV_LEN,
                iv.len()
            )));
        }
        if tag.len() != GCM_TAG_LEN {
            return Err(KeyEncError::Encoding(format!(
                "tag must be {} bytes, got {}",
                GCM_TAG_LEN,
                tag.len()
            )));
        }

        Ok(AesGcmKwDecrypter {
            alg,
            enc,
            kek: SymmetricKey::from_slice(kek),
            iv,
            tag,
        })
    }
}

impl Decrypter for AesGcmKwDecrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        let kek = self.kek.as_slice();
        let cek = match kek.len() {
            16 => open::<Aes128Gcm>(kek, &self.iv, &self.tag, encrypted_key)?,
            24 => open::<Aes192Gcm>(kek, &self.iv, &self.tag, encrypted_key)?,
            _ => open::<Aes256Gcm>(kek, &self.iv, &self.tag, encrypted_key)?,
        };
        check_cek_len(self.enc, Cek::from_slice(&cek))
    }
}

fn seal<C>(kek: &[u8], iv: &[u8], cek: &[u8]) -> Result<(Vec<u8>, Vec<u8>), KeyEncError>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(kek).map_err(|_| KeyEncError::InvalidKeyLength {
        expected: C::key_size(),
        got: kek.len(),
    })?;
    let mut buffer = cek.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<C>::from_slice(iv), b"", &mut buffer)
        .map_err(|_| KeyEncError::Encoding("AES-GCM key encryption failed".to_string()))?;
    Ok((buffer, tag.to_vec()))
}

fn open<C>(
    kek: &[u8],
    iv: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeyEncError>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(kek).map_err(|_| KeyEncError::InvalidKeyLength {
        expected: C::key_size(),
        got: kek.len(),
    })?;
    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            Nonce::<C>::from_slice(iv),
            b"",
            &mut buffer,
            Tag::<C>::from_slice(tag),
        )
        .map_err(|_| KeyEncError::Integrity)?;
    Ok(buffer)
}

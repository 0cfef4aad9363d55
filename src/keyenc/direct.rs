//! Direct use of a shared symmetric key as the CEK (`dir`)

use super::{Decrypter, Encrypter};
use crate::algorithm::{ContentEncryptionAlgorithm, KeyEncryptionAlgorithm};
use crate::error::KeyEncError;
use crate::types::{ByteSource, Cek, KeyHeader};

fn check_shared_key(enc: ContentEncryptionAlgorithm, key: &[u8]) -> Result<Cek, KeyEncError> {
    if key.len() != enc.key_size() {
        return Err(KeyEncError::InvalidKeyLength {
            expected: enc.key_size(),
            got: key.len(),
        });
    }
    Ok(Cek::from_slice(key))
}

/// Returns the shared key as the CEK; produces no encrypted key
#[derive(Debug, Clone)]
pub struct DirectEncrypter {
    shared_key: Cek,
    key_id: Option<String>,
}

impl DirectEncrypter {
    /// The key length is checked against `enc` here rather than at encrypt time
    pub fn new(enc: ContentEncryptionAlgorithm, shared_key: &[u8]) -> Result<Self, KeyEncError> {
        Ok(DirectEncrypter {
            shared_key: check_shared_key(enc, shared_key)?,
            key_id: None,
        })
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl Encrypter for DirectEncrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        KeyEncryptionAlgorithm::Direct
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        if cek.is_some() {
            return Err(KeyEncError::mismatch(
                "dir",
                "the CEK is the shared key and cannot be supplied",
            ));
        }
        Ok(ByteSource::new(
            self.shared_key.clone(),
            Vec::new(),
            KeyHeader::default(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct DirectDecrypter {
    shared_key: Cek,
}

impl DirectDecrypter {
    pub fn new(enc: ContentEncryptionAlgorithm, shared_key: &[u8]) -> Result<Self, KeyEncError> {
        Ok(DirectDecrypter {
            shared_key: check_shared_key(enc, shared_key)?,
        })
    }
}

impl Decrypter for DirectDecrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        KeyEncryptionAlgorithm::Direct
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        if !encrypted_key.is_empty() {
            return Err(KeyEncError::Encoding(
                "encrypted key must be empty for dir".to_string(),
            ));
        }
        Ok(self.shared_key.clone())
    }
}

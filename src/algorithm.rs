//! JWA algorithm identifiers
//!
//! [`KeyEncryptionAlgorithm`] is the `alg` header value and selects the key
//! management mode. [`ContentEncryptionAlgorithm`] is the `enc` header value;
//! this crate only needs it for the CEK length and as the Concat KDF
//! algorithm ID of direct ECDH-ES.

use crate::error::KeyEncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key management algorithm (`alg` header parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyEncryptionAlgorithm {
    #[serde(rename = "dir")]
    Direct,
    #[serde(rename = "A128KW")]
    A128Kw,
    #[serde(rename = "A192KW")]
    A192Kw,
    #[serde(rename = "A256KW")]
    A256Kw,
    #[serde(rename = "A128GCMKW")]
    A128GcmKw,
    #[serde(rename = "A192GCMKW")]
    A192GcmKw,
    #[serde(rename = "A256GCMKW")]
    A256GcmKw,
    #[serde(rename = "RSA1_5")]
    Rsa1_5,
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
    #[serde(rename = "ECDH-ES")]
    EcdhEs,
    #[serde(rename = "ECDH-ES+A128KW")]
    EcdhEsA128Kw,
    #[serde(rename = "ECDH-ES+A192KW")]
    EcdhEsA192Kw,
    #[serde(rename = "ECDH-ES+A256KW")]
    EcdhEsA256Kw,
    #[serde(rename = "PBES2-HS256+A128KW")]
    Pbes2Hs256A128Kw,
    #[serde(rename = "PBES2-HS384+A192KW")]
    Pbes2Hs384A192Kw,
    #[serde(rename = "PBES2-HS512+A256KW")]
    Pbes2Hs512A256Kw,
}

/// Broad algorithm family, used for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    Direct,
    AesKw,
    AesGcmKw,
    RsaOaep,
    RsaPkcs1v15,
    EcdhEs,
    EcdhEsKw,
    Pbes2,
}

impl KeyEncryptionAlgorithm {
    pub const ALL: [KeyEncryptionAlgorithm; 17] = [
        Self::Direct,
        Self::A128Kw,
        Self::A192Kw,
        Self::A256Kw,
        Self::A128GcmKw,
        Self::A192GcmKw,
        Self::A256GcmKw,
        Self::Rsa1_5,
        Self::RsaOaep,
        Self::RsaOaep256,
        Self::EcdhEs,
        Self::EcdhEsA128Kw,
        Self::EcdhEsA192Kw,
        Self::EcdhEsA256Kw,
        Self::Pbes2Hs256A128Kw,
        Self::Pbes2Hs384A192Kw,
        Self::Pbes2Hs512A256Kw,
    ];

    /// Registered JWA name, exactly as it appears in the `alg` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "dir",
            Self::A128Kw => "A128KW",
            Self::A192Kw => "A192KW",
            Self::A256Kw => "A256KW",
            Self::A128GcmKw => "A128GCMKW",
            Self::A192GcmKw => "A192GCMKW",
            Self::A256GcmKw => "A256GCMKW",
            Self::Rsa1_5 => "RSA1_5",
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaOaep256 => "RSA-OAEP-256",
            Self::EcdhEs => "ECDH-ES",
            Self::EcdhEsA128Kw => "ECDH-ES+A128KW",
            Self::EcdhEsA192Kw => "ECDH-ES+A192KW",
            Self::EcdhEsA256Kw => "ECDH-ES+A256KW",
            Self::Pbes2Hs256A128Kw => "PBES2-HS256+A128KW",
            Self::Pbes2Hs384A192Kw => "PBES2-HS384+A192KW",
            Self::Pbes2Hs512A256Kw => "PBES2-HS512+A256KW",
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            Self::Direct => AlgorithmFamily::Direct,
            Self::A128Kw | Self::A192Kw | Self::A256Kw => AlgorithmFamily::AesKw,
            Self::A128GcmKw | Self::A192GcmKw | Self::A256GcmKw => AlgorithmFamily::AesGcmKw,
            Self::Rsa1_5 => AlgorithmFamily::RsaPkcs1v15,
            Self::RsaOaep | Self::RsaOaep256 => AlgorithmFamily::RsaOaep,
            Self::EcdhEs => AlgorithmFamily::EcdhEs,
            Self::EcdhEsA128Kw | Self::EcdhEsA192Kw | Self::EcdhEsA256Kw => {
                AlgorithmFamily::EcdhEsKw
            }
            Self::Pbes2Hs256A128Kw | Self::Pbes2Hs384A192Kw | Self::Pbes2Hs512A256Kw => {
                AlgorithmFamily::Pbes2
            }
        }
    }

    /// Size in bytes of the AES key-encryption key this algorithm uses, if any
    ///
    /// For AES-KW and AES-GCM-KW this is the length of the shared key; for
    /// ECDH-ES+AxKW and PBES2 it is the length of the derived KEK.
    pub fn kek_size(&self) -> Option<usize> {
        match self {
            Self::A128Kw | Self::A128GcmKw | Self::EcdhEsA128Kw | Self::Pbes2Hs256A128Kw => {
                Some(16)
            }
            Self::A192Kw | Self::A192GcmKw | Self::EcdhEsA192Kw | Self::Pbes2Hs384A192Kw => {
                Some(24)
            }
            Self::A256Kw | Self::A256GcmKw | Self::EcdhEsA256Kw | Self::Pbes2Hs512A256Kw => {
                Some(32)
            }
            _ => None,
        }
    }

    /// True when the CEK is the agreed or shared key itself (no encrypted key)
    pub fn is_direct_agreement(&self) -> bool {
        matches!(self, Self::Direct | Self::EcdhEs)
    }
}

impl fmt::Display for KeyEncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyEncryptionAlgorithm {
    type Err = KeyEncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| KeyEncError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Content encryption algorithm (`enc` header parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentEncryptionAlgorithm {
    #[serde(rename = "A128CBC-HS256")]
    A128CbcHs256,
    #[serde(rename = "A192CBC-HS384")]
    A192CbcHs384,
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,
    #[serde(rename = "A128GCM")]
    A128Gcm,
    #[serde(rename = "A192GCM")]
    A192Gcm,
    #[serde(rename = "A256GCM")]
    A256Gcm,
}

impl ContentEncryptionAlgorithm {
    pub const ALL: [ContentEncryptionAlgorithm; 6] = [
        Self::A128CbcHs256,
        Self::A192CbcHs384,
        Self::A256CbcHs512,
        Self::A128Gcm,
        Self::A192Gcm,
        Self::A256Gcm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    /// CEK length in bytes
    ///
    /// The CBC-HMAC composites use a double-length key (MAC key ‖ ENC key).
    pub fn key_size(&self) -> usize {
        match self {
            Self::A128CbcHs256 => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A256Gcm => 32,
        }
    }
}

impl fmt::Display for ContentEncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentEncryptionAlgorithm {
    type Err = KeyEncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|enc| enc.as_str() == s)
            .ok_or_else(|| KeyEncError::UnsupportedAlgorithm(s.to_string()))
    }
}

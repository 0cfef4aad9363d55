//! Unified error type for key encryption and decryption
//!
//! Every algorithm surfaces failures through [`KeyEncError`]. Callers that
//! need to branch on the failure category use [`KeyEncError::kind`].
//!
//! # Example
//!
//! ```
//! use jwe_keyenc::{ErrorKind, KeyEncError};
//!
//! let err = KeyEncError::Integrity;
//! assert_eq!(err.kind(), ErrorKind::Integrity);
//! assert!(!err.is_retryable());
//! ```

use thiserror::Error;

/// Broad failure category of a [`KeyEncError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or mismatched key material for the selected algorithm
    Configuration,
    /// The operating system entropy source failed
    Entropy,
    /// A wrap check, AEAD tag, padding or curve point did not verify
    Integrity,
    /// Malformed input or derived-material length
    Encoding,
}

/// Error type for all key management operations
///
/// The `Integrity` variant deliberately carries no detail. RSA decryption
/// maps every failure onto it so that wrong keys, tampered ciphertexts and
/// bad padding are indistinguishable to the caller.
#[derive(Debug, Error)]
pub enum KeyEncError {
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Key type does not match algorithm {algorithm}: {reason}")]
    KeyMismatch {
        algorithm: &'static str,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Entropy source failure")]
    Entropy,

    #[error("Key decryption failed")]
    Integrity,

    #[error("Invalid ephemeral public key")]
    InvalidEphemeralKey,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Missing header parameter: {0}")]
    MissingHeader(&'static str),
}

impl KeyEncError {
    /// Returns the failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedAlgorithm(_)
            | Self::InvalidKeyLength { .. }
            | Self::KeyMismatch { .. }
            | Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::Entropy => ErrorKind::Entropy,
            Self::Integrity | Self::InvalidEphemeralKey => ErrorKind::Integrity,
            Self::Encoding(_) | Self::MissingHeader(_) => ErrorKind::Encoding,
        }
    }

    /// Always false: a cryptographic failure does not change on retry
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns a suggestion for resolving this error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnsupportedAlgorithm(_) => {
                Some("Use one of the registered JWA key management algorithm names")
            }
            Self::InvalidKeyLength { .. } => {
                Some("Supply a key whose length matches the selected algorithm")
            }
            Self::KeyMismatch { .. } => {
                Some("Check that the key type matches the `alg` header value")
            }
            Self::InvalidConfig(_) => Some("Review the PBES2 iteration count and salt length"),
            Self::Entropy => Some("The system random source is unavailable; abort the operation"),
            Self::MissingHeader(_) => {
                Some("Pass every public value produced by encryption back to the decrypter")
            }
            _ => None,
        }
    }

    pub(crate) fn mismatch(algorithm: &'static str, reason: impl Into<String>) -> Self {
        Self::KeyMismatch {
            algorithm,
            reason: reason.into(),
        }
    }
}

impl From<rand::Error> for KeyEncError {
    fn from(_: rand::Error) -> Self {
        Self::Entropy
    }
}

//! Key encryption dispatch
//!
//! [`Encrypter`] and [`Decrypter`] are the contract every algorithm
//! implements. [`KeyEncrypter`] and [`KeyDecrypter`] are closed enums that
//! pick the implementation from a [`KeyEncryptionAlgorithm`] plus the key
//! material, so callers that only know the `alg` header value never name a
//! concrete type.
//!
//! # Example
//!
//! ```
//! use jwe_keyenc::{
//!     ContentEncryptionAlgorithm, DecryptionKey, Decrypter, EncryptionKey, Encrypter,
//!     KeyDecrypter, KeyEncrypter, KeyEncryptionAlgorithm,
//! };
//!
//! let kek = [0x42u8; 16];
//! let alg = KeyEncryptionAlgorithm::A128Kw;
//! let enc = ContentEncryptionAlgorithm::A128Gcm;
//!
//! let encrypter = KeyEncrypter::new(alg, enc, EncryptionKey::symmetric(&kek)).unwrap();
//! let output = encrypter.encrypt(None).unwrap();
//!
//! let decrypter =
//!     KeyDecrypter::new(alg, enc, DecryptionKey::symmetric(&kek), output.header()).unwrap();
//! let cek = decrypter.decrypt_for(alg, output.encrypted_key()).unwrap();
//! assert_eq!(&cek, output.cek());
//! ```

pub mod aes;
pub mod direct;
pub mod ecdh;
pub mod pbes2;
pub mod rsa;

use crate::algorithm::{AlgorithmFamily, ContentEncryptionAlgorithm, KeyEncryptionAlgorithm};
use crate::config::{EcdhConfig, Pbes2Config};
use crate::error::KeyEncError;
use crate::keygen;
use crate::types::{ByteSource, Cek, EcPrivateKey, EcPublicKey, KeyHeader, SymmetricKey};
use ::rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use tracing::debug;

pub use self::aes::{AesGcmKwDecrypter, AesGcmKwEncrypter, AesKwDecrypter, AesKwEncrypter};
pub use self::direct::{DirectDecrypter, DirectEncrypter};
pub use self::ecdh::{EcdhEsDecrypter, EcdhEsEncrypter};
pub use self::pbes2::{Pbes2Decrypter, Pbes2Encrypter};
pub use self::rsa::{RsaOaepDecrypter, RsaOaepEncrypter, RsaPkcs1v15Decrypter, RsaPkcs1v15Encrypter};

/// Produces a CEK and its encrypted form for one recipient
pub trait Encrypter: Send + Sync {
    /// The algorithm identifier written to the `alg` header
    fn algorithm(&self) -> KeyEncryptionAlgorithm;

    /// Opaque key identifier for the `kid` header, if configured
    fn key_id(&self) -> Option<&str>;

    /// Encrypt `cek`, or a freshly generated CEK when `None`
    ///
    /// `dir` and `ECDH-ES` determine the CEK themselves and reject a
    /// supplied one.
    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError>;
}

/// Recovers the CEK from the encrypted-key bytes
pub trait Decrypter: Send + Sync {
    fn algorithm(&self) -> KeyEncryptionAlgorithm;

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError>;

    /// Decrypt after checking the message's `alg` against this decrypter
    fn decrypt_for(
        &self,
        alg: KeyEncryptionAlgorithm,
        encrypted_key: &[u8],
    ) -> Result<Cek, KeyEncError> {
        let own = self.algorithm();
        if alg != own {
            return Err(KeyEncError::mismatch(
                own.as_str(),
                format!("message alg is {}", alg),
            ));
        }
        self.decrypt(encrypted_key)
    }
}

/// Use the supplied CEK if its length fits `enc`, otherwise generate one
pub(crate) fn resolve_cek(
    enc: ContentEncryptionAlgorithm,
    cek: Option<&Cek>,
) -> Result<Cek, KeyEncError> {
    match cek {
        Some(cek) if cek.len() != enc.key_size() => Err(KeyEncError::InvalidKeyLength {
            expected: enc.key_size(),
            got: cek.len(),
        }),
        Some(cek) => Ok(cek.clone()),
        None => keygen::generate_cek(enc),
    }
}

/// Reject a recovered CEK whose length does not match `enc`
///
/// Reported as the detail-free [`KeyEncError::Integrity`] so a wrong-size
/// key looks the same as any other failed decryption.
pub(crate) fn check_cek_len(
    enc: ContentEncryptionAlgorithm,
    cek: Cek,
) -> Result<Cek, KeyEncError> {
    if cek.len() != enc.key_size() {
        return Err(KeyEncError::Integrity);
    }
    Ok(cek)
}

/// Check that `alg` belongs to `family` and `kek` has its wrap size
pub(crate) fn check_kek(
    alg: KeyEncryptionAlgorithm,
    family: AlgorithmFamily,
    kek: &[u8],
) -> Result<(), KeyEncError> {
    if alg.family() != family {
        return Err(KeyEncError::mismatch(
            alg.as_str(),
            format!("expected a {:?} algorithm", family),
        ));
    }
    let expected = alg
        .kek_size()
        .ok_or_else(|| KeyEncError::mismatch(alg.as_str(), "no key wrap size"))?;
    if kek.len() != expected {
        return Err(KeyEncError::InvalidKeyLength {
            expected,
            got: kek.len(),
        });
    }
    Ok(())
}

/// Recipient key material for encryption
#[derive(Clone)]
pub enum EncryptionKey {
    /// Shared key for `dir`, AES-KW and AES-GCM-KW
    Symmetric(SymmetricKey),
    /// Password for PBES2
    Password(SymmetricKey),
    Rsa(RsaPublicKey),
    Ec(EcPublicKey),
}

impl EncryptionKey {
    pub fn symmetric(key: &[u8]) -> Self {
        EncryptionKey::Symmetric(SymmetricKey::from_slice(key))
    }

    pub fn password(password: impl AsRef<[u8]>) -> Self {
        EncryptionKey::Password(SymmetricKey::from_slice(password.as_ref()))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            EncryptionKey::Symmetric(_) => "symmetric",
            EncryptionKey::Password(_) => "password",
            EncryptionKey::Rsa(_) => "RSA",
            EncryptionKey::Ec(_) => "EC",
        }
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionKey::Symmetric(key) => f.debug_tuple("Symmetric").field(key).finish(),
            EncryptionKey::Password(_) => f.write_str("Password([REDACTED])"),
            EncryptionKey::Rsa(key) => f.debug_tuple("Rsa").field(key).finish(),
            EncryptionKey::Ec(key) => f.debug_tuple("Ec").field(key).finish(),
        }
    }
}

/// Recipient key material for decryption
#[derive(Clone)]
pub enum DecryptionKey {
    Symmetric(SymmetricKey),
    Password(SymmetricKey),
    Rsa(RsaPrivateKey),
    Ec(EcPrivateKey),
}

impl DecryptionKey {
    pub fn symmetric(key: &[u8]) -> Self {
        DecryptionKey::Symmetric(SymmetricKey::from_slice(key))
    }

    pub fn password(password: impl AsRef<[u8]>) -> Self {
        DecryptionKey::Password(SymmetricKey::from_slice(password.as_ref()))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            DecryptionKey::Symmetric(_) => "symmetric",
            DecryptionKey::Password(_) => "password",
            DecryptionKey::Rsa(_) => "RSA",
            DecryptionKey::Ec(_) => "EC",
        }
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptionKey::Symmetric(key) => f.debug_tuple("Symmetric").field(key).finish(),
            DecryptionKey::Password(_) => f.write_str("Password([REDACTED])"),
            DecryptionKey::Rsa(_) => f.write_str("Rsa([REDACTED])"),
            DecryptionKey::Ec(key) => f.debug_tuple("Ec").field(key).finish(),
        }
    }
}

/// Forward a call to whichever implementation the enum holds
macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Self::Direct($inner) => $body,
            Self::AesKw($inner) => $body,
            Self::AesGcmKw($inner) => $body,
            Self::RsaOaep($inner) => $body,
            Self::RsaPkcs1v15($inner) => $body,
            Self::EcdhEs($inner) => $body,
            Self::Pbes2($inner) => $body,
        }
    };
}

/// Encrypter selected from an algorithm identifier and key material
#[derive(Debug, Clone)]
pub enum KeyEncrypter {
    Direct(DirectEncrypter),
    AesKw(AesKwEncrypter),
    AesGcmKw(AesGcmKwEncrypter),
    RsaOaep(RsaOaepEncrypter),
    RsaPkcs1v15(RsaPkcs1v15Encrypter),
    EcdhEs(EcdhEsEncrypter),
    Pbes2(Pbes2Encrypter),
}

impl KeyEncrypter {
    /// Build the encrypter for `alg`
    ///
    /// Fails with [`KeyEncError::KeyMismatch`] when `key` is the wrong kind
    /// of key for `alg`, and with the implementation's own error when the
    /// key itself is unusable (wrong length, undersized modulus).
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        key: EncryptionKey,
    ) -> Result<Self, KeyEncError> {
        let encrypter = match (alg.family(), key) {
            (AlgorithmFamily::Direct, EncryptionKey::Symmetric(key)) => {
                Self::Direct(DirectEncrypter::new(enc, key.as_slice())?)
            }
            (AlgorithmFamily::AesKw, EncryptionKey::Symmetric(key)) => {
                Self::AesKw(AesKwEncrypter::new(alg, enc, key.as_slice())?)
            }
            (AlgorithmFamily::AesGcmKw, EncryptionKey::Symmetric(key)) => {
                Self::AesGcmKw(AesGcmKwEncrypter::new(alg, enc, key.as_slice())?)
            }
            (AlgorithmFamily::RsaOaep, EncryptionKey::Rsa(key)) => {
                Self::RsaOaep(RsaOaepEncrypter::new(alg, enc, key)?)
            }
            (AlgorithmFamily::RsaPkcs1v15, EncryptionKey::Rsa(key)) => {
                Self::RsaPkcs1v15(RsaPkcs1v15Encrypter::new(enc, key)?)
            }
            (AlgorithmFamily::EcdhEs | AlgorithmFamily::EcdhEsKw, EncryptionKey::Ec(key)) => {
                Self::EcdhEs(EcdhEsEncrypter::new(alg, enc, key)?)
            }
            (AlgorithmFamily::Pbes2, EncryptionKey::Password(password)) => {
                Self::Pbes2(Pbes2Encrypter::new(alg, enc, password.as_slice())?)
            }
            (_, key) => {
                return Err(KeyEncError::mismatch(
                    alg.as_str(),
                    format!("cannot encrypt with a {} key", key.kind_name()),
                ))
            }
        };
        debug!("Created key encrypter for alg {} enc {}", alg, enc);
        Ok(encrypter)
    }

    pub fn with_key_id(self, key_id: impl Into<String>) -> Self {
        match self {
            Self::Direct(e) => Self::Direct(e.with_key_id(key_id)),
            Self::AesKw(e) => Self::AesKw(e.with_key_id(key_id)),
            Self::AesGcmKw(e) => Self::AesGcmKw(e.with_key_id(key_id)),
            Self::RsaOaep(e) => Self::RsaOaep(e.with_key_id(key_id)),
            Self::RsaPkcs1v15(e) => Self::RsaPkcs1v15(e.with_key_id(key_id)),
            Self::EcdhEs(e) => Self::EcdhEs(e.with_key_id(key_id)),
            Self::Pbes2(e) => Self::Pbes2(e.with_key_id(key_id)),
        }
    }

    /// Set `apu` / `apv`; only valid for the ECDH-ES algorithms
    pub fn with_ecdh_config(self, config: EcdhConfig) -> Result<Self, KeyEncError> {
        match self {
            Self::EcdhEs(e) => Ok(Self::EcdhEs(e.with_config(config))),
            other => Err(KeyEncError::mismatch(
                other.algorithm().as_str(),
                "agreement info applies only to ECDH-ES",
            )),
        }
    }

    /// Set the PBES2 iteration count and salt length
    pub fn with_pbes2_config(self, config: Pbes2Config) -> Result<Self, KeyEncError> {
        match self {
            Self::Pbes2(e) => Ok(Self::Pbes2(e.with_config(config)?)),
            other => Err(KeyEncError::mismatch(
                other.algorithm().as_str(),
                "PBES2 settings apply only to PBES2",
            )),
        }
    }
}

impl Encrypter for KeyEncrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        dispatch!(self, e => e.algorithm())
    }

    fn key_id(&self) -> Option<&str> {
        dispatch!(self, e => e.key_id())
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        let output = dispatch!(self, e => e.encrypt(cek))?;
        debug!(
            "Encrypted CEK with {} (kid {:?}): cek {} bytes, encrypted key {} bytes",
            self.algorithm(),
            self.key_id(),
            output.cek().len(),
            output.encrypted_key().len()
        );
        Ok(output)
    }
}

/// Decrypter selected from an algorithm identifier, key material and the
/// message header
#[derive(Debug, Clone)]
pub enum KeyDecrypter {
    Direct(DirectDecrypter),
    AesKw(AesKwDecrypter),
    AesGcmKw(AesGcmKwDecrypter),
    RsaOaep(RsaOaepDecrypter),
    RsaPkcs1v15(RsaPkcs1v15Decrypter),
    EcdhEs(EcdhEsDecrypter),
    Pbes2(Pbes2Decrypter),
}

impl KeyDecrypter {
    /// Build the decrypter for `alg`
    ///
    /// `header` supplies the per-message values the algorithm needs (`iv`
    /// and `tag`, `epk`, `p2s` and `p2c`); algorithms that need none ignore it.
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        key: DecryptionKey,
        header: &KeyHeader,
    ) -> Result<Self, KeyEncError> {
        let decrypter = match (alg.family(), key) {
            (AlgorithmFamily::Direct, DecryptionKey::Symmetric(key)) => {
                Self::Direct(DirectDecrypter::new(enc, key.as_slice())?)
            }
            (AlgorithmFamily::AesKw, DecryptionKey::Symmetric(key)) => {
                Self::AesKw(AesKwDecrypter::new(alg, enc, key.as_slice())?)
            }
            (AlgorithmFamily::AesGcmKw, DecryptionKey::Symmetric(key)) => {
                Self::AesGcmKw(AesGcmKwDecrypter::new(alg, enc, key.as_slice(), header)?)
            }
            (AlgorithmFamily::RsaOaep, DecryptionKey::Rsa(key)) => {
                Self::RsaOaep(RsaOaepDecrypter::new(alg, enc, key)?)
            }
            (AlgorithmFamily::RsaPkcs1v15, DecryptionKey::Rsa(key)) => {
                Self::RsaPkcs1v15(RsaPkcs1v15Decrypter::new(enc, key)?)
            }
            (AlgorithmFamily::EcdhEs | AlgorithmFamily::EcdhEsKw, DecryptionKey::Ec(key)) => {
                Self::EcdhEs(EcdhEsDecrypter::new(alg, enc, key, header)?)
            }
            (AlgorithmFamily::Pbes2, DecryptionKey::Password(password)) => {
                Self::Pbes2(Pbes2Decrypter::new(alg, enc, password.as_slice(), header)?)
            }
            (_, key) => {
                return Err(KeyEncError::mismatch(
                    alg.as_str(),
                    format!("cannot decrypt with a {} key", key.kind_name()),
                ))
            }
        };
        debug!("Created key decrypter for alg {} enc {}", alg, enc);
        Ok(decrypter)
    }

    /// Set the accepted PBES2 iteration bound
    pub fn with_pbes2_config(self, config: Pbes2Config) -> Result<Self, KeyEncError> {
        match self {
            Self::Pbes2(d) => Ok(Self::Pbes2(d.with_config(config))),
            other => Err(KeyEncError::mismatch(
                other.algorithm().as_str(),
                "PBES2 settings apply only to PBES2",
            )),
        }
    }
}

impl Decrypter for KeyDecrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        dispatch!(self, d => d.algorithm())
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        debug!(
            "Decrypting CEK with {}: encrypted key {} bytes",
            self.algorithm(),
            encrypted_key.len()
        );
        dispatch!(self, d => d.decrypt(encrypted_key))
    }
}

//! JWE Key Management
//!
//! This crate implements the key management layer of JSON Web Encryption
//! (RFC 7516, RFC 7518 §4): producing and recovering the content encryption
//! key (CEK) for a single recipient.
//! - Direct use of a shared key (`dir`)
//! - AES Key Wrap and AES-GCM key wrap
//! - RSA-OAEP, RSA-OAEP-256 and RSA1_5
//! - ECDH-ES, directly or with AES Key Wrap, over P-256, P-384 and P-521
//! - PBES2 password-based key wrap
//!
//! Content encryption, header serialization and compact/JSON formatting are
//! left to the caller.
//!
//! # Security Features
//!
//! - **Zeroization**: CEKs, KEKs, passwords and shared secrets clear memory on drop
//! - **Constant-time selection**: RSA1_5 decryption substitutes a random key
//!   on bad padding using `subtle`
//! - **Opaque failures**: RSA decryption reports a single detail-free error
//!
//! # Example
//!
//! ```
//! use jwe_keyenc::{
//!     ContentEncryptionAlgorithm, DecryptionKey, Decrypter, EcCurve, EcPrivateKey,
//!     EncryptionKey, Encrypter, KeyDecrypter, KeyEncrypter, KeyEncryptionAlgorithm,
//! };
//!
//! # fn example() -> Result<(), jwe_keyenc::KeyEncError> {
//! let recipient = EcPrivateKey::generate(EcCurve::P256)?;
//! let alg: KeyEncryptionAlgorithm = "ECDH-ES+A128KW".parse()?;
//! let enc = ContentEncryptionAlgorithm::A128Gcm;
//!
//! // Sender
//! let encrypter = KeyEncrypter::new(alg, enc, EncryptionKey::Ec(recipient.public_key()))?;
//! let output = encrypter.encrypt(None)?;
//!
//! // Recipient
//! let decrypter = KeyDecrypter::new(alg, enc, DecryptionKey::Ec(recipient), output.header())?;
//! let cek = decrypter.decrypt(output.encrypted_key())?;
//! assert_eq!(&cek, output.cek());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod aeskw;
pub mod algorithm;
pub mod config;
pub mod error;
pub mod kdf;
pub mod keyenc;
pub mod keygen;
pub mod types;

// Re-export commonly used types
pub use algorithm::{AlgorithmFamily, ContentEncryptionAlgorithm, KeyEncryptionAlgorithm};
pub use config::{EcdhConfig, Pbes2Config};
pub use error::{ErrorKind, KeyEncError};
pub use kdf::concat_kdf;
pub use keyenc::{
    AesGcmKwDecrypter, AesGcmKwEncrypter, AesKwDecrypter, AesKwEncrypter, DecryptionKey,
    Decrypter, DirectDecrypter, DirectEncrypter, EcdhEsDecrypter, EcdhEsEncrypter, EncryptionKey,
    Encrypter, KeyDecrypter, KeyEncrypter, Pbes2Decrypter, Pbes2Encrypter, RsaOaepDecrypter,
    RsaOaepEncrypter, RsaPkcs1v15Decrypter, RsaPkcs1v15Encrypter,
};
pub use keygen::{generate_cek, random_bytes};
pub use types::{ByteSource, Cek, EcCurve, EcPrivateKey, EcPublicKey, KeyHeader, SymmetricKey};

// RSA key types used by `EncryptionKey::Rsa` / `DecryptionKey::Rsa`
pub use rsa::{RsaPrivateKey, RsaPublicKey};

//! Password-based key encryption (`PBES2-HS256+A128KW`, `PBES2-HS384+A192KW`,
//! `PBES2-HS512+A256KW`)
//!
//! The KEK is derived with PBKDF2 over the salt input `alg ‖ 0x00 ‖ p2s` and
//! then wraps the CEK with AES Key Wrap. The salt (`p2s`) and iteration count
//! (`p2c`) travel in the header.

use super::{check_cek_len, resolve_cek, Decrypter, Encrypter};
use crate::aeskw;
use crate::algorithm::{AlgorithmFamily, ContentEncryptionAlgorithm, KeyEncryptionAlgorithm};
use crate::config::{Pbes2Config, DEFAULT_ITERATIONS, MIN_SALT_LEN};
use crate::error::KeyEncError;
use crate::keygen;
use crate::types::{ByteSource, Cek, KeyHeader, SymmetricKey};
use hmac::Hmac;
use sha2::{Sha256, Sha384, Sha512};
use tracing::warn;
use zeroize::Zeroizing;

fn check_pbes2(alg: KeyEncryptionAlgorithm, password: &[u8]) -> Result<(), KeyEncError> {
    if alg.family() != AlgorithmFamily::Pbes2 {
        return Err(KeyEncError::mismatch(alg.as_str(), "not a PBES2 algorithm"));
    }
    if password.is_empty() {
        return Err(KeyEncError::mismatch(alg.as_str(), "password must not be empty"));
    }
    Ok(())
}

/// PBKDF2 with the HMAC matching `alg`, producing a KEK of `alg.kek_size()`
fn derive_kek(
    alg: KeyEncryptionAlgorithm,
    password: &[u8],
    p2s: &[u8],
    iterations: u32,
) -> Result<Zeroizing<Vec<u8>>, KeyEncError> {
    let kek_size = alg
        .kek_size()
        .ok_or_else(|| KeyEncError::mismatch(alg.as_str(), "no key wrap size"))?;

    let name = alg.as_str().as_bytes();
    let mut salt_input = Vec::with_capacity(name.len() + 1 + p2s.len());
    salt_input.extend_from_slice(name);
    salt_input.push(0x00);
    salt_input.extend_from_slice(p2s);

    let mut kek = Zeroizing::new(vec![0u8; kek_size]);
    let derived = match alg {
        KeyEncryptionAlgorithm::Pbes2Hs256A128Kw => {
            pbkdf2::pbkdf2::<Hmac<Sha256>>(password, &salt_input, iterations, &mut kek)
        }
        KeyEncryptionAlgorithm::Pbes2Hs384A192Kw => {
            pbkdf2::pbkdf2::<Hmac<Sha384>>(password, &salt_input, iterations, &mut kek)
        }
        _ => pbkdf2::pbkdf2::<Hmac<Sha512>>(password, &salt_input, iterations, &mut kek),
    };
    derived.map_err(|_| KeyEncError::Encoding("PBKDF2 key derivation failed".to_string()))?;
    Ok(kek)
}

/// Password-based encryption with a fresh random salt per call
#[derive(Debug, Clone)]
pub struct Pbes2Encrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    password: SymmetricKey,
    config: Pbes2Config,
    key_id: Option<String>,
}

impl Pbes2Encrypter {
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        password: &[u8],
    ) -> Result<Self, KeyEncError> {
        check_pbes2(alg, password)?;
        Ok(Pbes2Encrypter {
            alg,
            enc,
            password: SymmetricKey::from_slice(password),
            config: Pbes2Config::default(),
            key_id: None,
        })
    }

    /// Replace the iteration count and salt length; the config is validated
    pub fn with_config(mut self, config: Pbes2Config) -> Result<Self, KeyEncError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl Encrypter for Pbes2Encrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        let cek = resolve_cek(self.enc, cek)?;
        let p2s = keygen::random_bytes(self.config.salt_len)?;
        let kek = derive_kek(
            self.alg,
            self.password.as_slice(),
            &p2s,
            self.config.iterations,
        )?;
        let wrapped = aeskw::wrap(&kek, cek.as_slice())?;

        let header = KeyHeader {
            p2s: Some(p2s.to_vec()),
            p2c: Some(self.config.iterations),
            ..Default::default()
        };
        Ok(ByteSource::new(cek, wrapped, header))
    }
}

/// Password-based decryption using `p2s` / `p2c` from the header
#[derive(Debug, Clone)]
pub struct Pbes2Decrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    password: SymmetricKey,
    config: Pbes2Config,
    p2s: Vec<u8>,
    p2c: u32,
}

impl Pbes2Decrypter {
    /// `enc` fixes the CEK length the unwrap must produce
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        password: &[u8],
        header: &KeyHeader,
    ) -> Result<Self, KeyEncError> {
        check_pbes2(alg, password)?;
        let p2s = header.p2s.clone().ok_or(KeyEncError::MissingHeader("p2s"))?;
        let p2c = header.p2c.ok_or(KeyEncError::MissingHeader("p2c"))?;
        if p2s.len() < MIN_SALT_LEN {
            return Err(KeyEncError::Encoding(format!(
                "p2s must be at least {} bytes, got {}",
                MIN_SALT_LEN,
                p2s.len()
            )));
        }
        Ok(Pbes2Decrypter {
            alg,
            enc,
            password: SymmetricKey::from_slice(password),
            config: Pbes2Config::default(),
            p2s,
            p2c,
        })
    }

    /// Replace the accepted iteration bound
    pub fn with_config(mut self, config: Pbes2Config) -> Self {
        self.config = config;
        self
    }
}

impl Decrypter for Pbes2Decrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        self.config.check_header_iterations(self.p2c)?;
        if self.p2c < DEFAULT_ITERATIONS {
            warn!(
                alg = %self.alg,
                p2c = self.p2c,
                recommended = DEFAULT_ITERATIONS,
                "PBES2 header requests a low iteration count"
            );
        }

        let kek = derive_kek(self.alg, self.password.as_slice(), &self.p2s, self.p2c)?;
        let cek = aeskw::unwrap(&kek, encrypted_key)?;
        check_cek_len(self.enc, Cek::from_slice(&cek))
    }
}

//! Elliptic Curve Diffie-Hellman Ephemeral Static key agreement
//!
//! A fresh ephemeral key pair on the recipient's curve is generated for every
//! encryption. The shared secret `Z` feeds the Concat KDF:
//!
//! - `ECDH-ES`: the derived bytes are the CEK itself (algorithm ID is the
//!   `enc` name, length is the CEK length); the encrypted key is empty
//! - `ECDH-ES+A128KW` / `+A192KW` / `+A256KW`: the derived bytes are a KEK
//!   (algorithm ID is the `alg` name) that wraps the CEK with AES Key Wrap
//!
//! Supported curves: P-256, P-384, P-521.

use super::{check_cek_len, resolve_cek, Decrypter, Encrypter};
use crate::aeskw;
use crate::algorithm::{AlgorithmFamily, ContentEncryptionAlgorithm, KeyEncryptionAlgorithm};
use crate::config::EcdhConfig;
use crate::error::KeyEncError;
use crate::kdf::concat_kdf;
use crate::types::{ByteSource, Cek, EcPrivateKey, EcPublicKey, KeyHeader};
use zeroize::Zeroizing;

fn check_ecdh_alg(alg: KeyEncryptionAlgorithm) -> Result<(), KeyEncError> {
    match alg.family() {
        AlgorithmFamily::EcdhEs | AlgorithmFamily::EcdhEsKw => Ok(()),
        _ => Err(KeyEncError::mismatch(alg.as_str(), "not an ECDH-ES algorithm")),
    }
}

/// Compute the raw shared secret `Z` (the x-coordinate of the shared point)
///
/// Both keys must be on the same curve; a mismatch is reported as an invalid
/// ephemeral key.
fn agree(private_key: &EcPrivateKey, public_key: &EcPublicKey) -> Result<Zeroizing<Vec<u8>>, KeyEncError> {
    let z = match (private_key, public_key) {
        (EcPrivateKey::P256(sk), EcPublicKey::P256(pk)) => {
            let shared = p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            shared.raw_secret_bytes().to_vec()
        }
        (EcPrivateKey::P384(sk), EcPublicKey::P384(pk)) => {
            let shared = p384::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            shared.raw_secret_bytes().to_vec()
        }
        (EcPrivateKey::P521(sk), EcPublicKey::P521(pk)) => {
            let shared = p521::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            shared.raw_secret_bytes().to_vec()
        }
        _ => return Err(KeyEncError::InvalidEphemeralKey),
    };
    Ok(Zeroizing::new(z))
}

/// Run the Concat KDF for `alg`, returning the CEK (direct) or the KEK (+KW)
fn derive(
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    z: &[u8],
    apu: &[u8],
    apv: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeyEncError> {
    if alg.is_direct_agreement() {
        return concat_kdf(z, enc.key_size() * 8, enc.as_str().as_bytes(), apu, apv);
    }
    let kek_size = alg
        .kek_size()
        .ok_or_else(|| KeyEncError::mismatch(alg.as_str(), "no key wrap size"))?;
    concat_kdf(z, kek_size * 8, alg.as_str().as_bytes(), apu, apv)
}

/// ECDH-ES encryption to a recipient's static public key
#[derive(Debug, Clone)]
pub struct EcdhEsEncrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    recipient: EcPublicKey,
    config: EcdhConfig,
    key_id: Option<String>,
}

impl EcdhEsEncrypter {
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        recipient: EcPublicKey,
    ) -> Result<Self, KeyEncError> {
        check_ecdh_alg(alg)?;
        Ok(EcdhEsEncrypter {
            alg,
            enc,
            recipient,
            config: EcdhConfig::default(),
            key_id: None,
        })
    }

    /// Set the `apu` / `apv` agreement info fed to the KDF and the header
    pub fn with_config(mut self, config: EcdhConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl Encrypter for EcdhEsEncrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        if self.alg.is_direct_agreement() && cek.is_some() {
            return Err(KeyEncError::mismatch(
                self.alg.as_str(),
                "the CEK is the agreed key and cannot be supplied",
            ));
        }

        let ephemeral = EcPrivateKey::generate(self.recipient.curve())?;
        let z = agree(&ephemeral, &self.recipient)?;
        let apu = self.config.apu.as_deref().unwrap_or_default();
        let apv = self.config.apv.as_deref().unwrap_or_default();
        let derived = derive(self.alg, self.enc, &z, apu, apv)?;

        let header = KeyHeader {
            epk: Some(ephemeral.public_key()),
            apu: self.config.apu.clone(),
            apv: self.config.apv.clone(),
            ..Default::default()
        };

        if self.alg.is_direct_agreement() {
            return Ok(ByteSource::new(Cek::from_slice(&derived), Vec::new(), header));
        }

        let cek = resolve_cek(self.enc, cek)?;
        let wrapped = aeskw::wrap(&derived, cek.as_slice())?;
        Ok(ByteSource::new(cek, wrapped, header))
    }
}

/// ECDH-ES decryption with the recipient's static private key
#[derive(Debug, Clone)]
pub struct EcdhEsDecrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    private_key: EcPrivateKey,
    epk: EcPublicKey,
    apu: Option<Vec<u8>>,
    apv: Option<Vec<u8>>,
}

impl EcdhEsDecrypter {
    /// Reads `epk`, `apu` and `apv` from the header
    ///
    /// The `epk` must be on the private key's curve.
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        private_key: EcPrivateKey,
        header: &KeyHeader,
    ) -> Result<Self, KeyEncError> {
        check_ecdh_alg(alg)?;
        let epk = header.epk.clone().ok_or(KeyEncError::MissingHeader("epk"))?;
        if epk.curve() != private_key.curve() {
            return Err(KeyEncError::InvalidEphemeralKey);
        }
        Ok(EcdhEsDecrypter {
            alg,
            enc,
            private_key,
            epk,
            apu: header.apu.clone(),
            apv: header.apv.clone(),
        })
    }
}

impl Decrypter for EcdhEsDecrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        if self.alg.is_direct_agreement() && !encrypted_key.is_empty() {
            return Err(KeyEncError::Encoding(
                "encrypted key must be empty for ECDH-ES".to_string(),
            ));
        }

        let z = agree(&self.private_key, &self.epk)?;
        let apu = self.apu.as_deref().unwrap_or_default();
        let apv = self.apv.as_deref().unwrap_or_default();
        let derived = derive(self.alg, self.enc, &z, apu, apv)?;

        if self.alg.is_direct_agreement() {
            return Ok(Cek::from_slice(&derived));
        }
        let cek = aeskw::unwrap(&derived, encrypted_key)?;
        check_cek_len(self.enc, Cek::from_slice(&cek))
    }
}

//! RSA key encryption (`RSA-OAEP`, `RSA-OAEP-256`, `RSA1_5`)
//!
//! SHA-1 OAEP (`RSA-OAEP`) remains for interoperability; `RSA-OAEP-256`
//! uses SHA-256 for both the OAEP hash and MGF1.
//!
//! # Decryption failures
//!
//! OAEP decryption maps every failure onto [`KeyEncError::Integrity`] with no
//! detail and emits no log event, so a caller cannot tell bad padding from a
//! wrong key or a bad length.
//!
//! PKCS#1 v1.5 decryption never fails on bad padding. It draws a random key
//! of the expected CEK length up front and selects it in constant time when
//! the padding is invalid; the substitution surfaces later as a content
//! authentication failure (RFC 7516 §11.5).
//!
//! OAEP decryption also rejects a recovered key whose length does not match
//! the content encryption algorithm, with the same detail-free error.
//!
//! # Backend
//!
//! This module uses the RustCrypto `rsa` crate, which is affected by
//! RUSTSEC-2023-0071 (Marvin attack): its modular exponentiation is not
//! constant time, so decryption timing can leak information about the
//! private key. Decryption here always goes through `decrypt_blinded`,
//! which reduces but does not remove that exposure. Deployments that
//! decrypt attacker-supplied ciphertexts at volume should prefer an
//! aws-lc-rs backed RSA implementation.

use super::{check_cek_len, resolve_cek, Decrypter, Encrypter};
use crate::algorithm::{ContentEncryptionAlgorithm, KeyEncryptionAlgorithm};
use crate::error::KeyEncError;
use crate::keygen;
use crate::types::{ByteSource, Cek, KeyHeader};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

/// Smallest modulus accepted for key encryption (RFC 7518 §4.2, §4.3)
pub const MIN_RSA_KEY_BITS: usize = 2048;

fn oaep_padding(alg: KeyEncryptionAlgorithm) -> Oaep {
    match alg {
        KeyEncryptionAlgorithm::RsaOaep256 => Oaep::new::<Sha256>(),
        _ => Oaep::new::<Sha1>(),
    }
}

fn check_oaep_alg(alg: KeyEncryptionAlgorithm) -> Result<(), KeyEncError> {
    match alg {
        KeyEncryptionAlgorithm::RsaOaep | KeyEncryptionAlgorithm::RsaOaep256 => Ok(()),
        other => Err(KeyEncError::mismatch(
            other.as_str(),
            "not an RSA-OAEP algorithm",
        )),
    }
}

fn check_modulus(alg: KeyEncryptionAlgorithm, key: &impl PublicKeyParts) -> Result<(), KeyEncError> {
    let bits = key.size() * 8;
    if bits < MIN_RSA_KEY_BITS {
        return Err(KeyEncError::mismatch(
            alg.as_str(),
            format!(
                "RSA modulus of {} bits is below the minimum of {}",
                bits, MIN_RSA_KEY_BITS
            ),
        ));
    }
    Ok(())
}

fn parse_public_pem(pem: &str) -> Result<RsaPublicKey, KeyEncError> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| KeyEncError::Encoding(format!("Failed to parse RSA public key: {}", e)))
}

fn parse_private_pem(pem: &str) -> Result<RsaPrivateKey, KeyEncError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .map_err(|e| KeyEncError::Encoding(format!("Failed to parse RSA private key: {}", e)))
}

/// RSA-OAEP encryption of the CEK under the recipient public key
#[derive(Debug, Clone)]
pub struct RsaOaepEncrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    public_key: RsaPublicKey,
    key_id: Option<String>,
}

impl RsaOaepEncrypter {
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        public_key: RsaPublicKey,
    ) -> Result<Self, KeyEncError> {
        check_oaep_alg(alg)?;
        check_modulus(alg, &public_key)?;
        Ok(RsaOaepEncrypter {
            alg,
            enc,
            public_key,
            key_id: None,
        })
    }

    /// Create from a PEM-encoded SubjectPublicKeyInfo
    pub fn from_public_key_pem(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        pem: &str,
    ) -> Result<Self, KeyEncError> {
        Self::new(alg, enc, parse_public_pem(pem)?)
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl Encrypter for RsaOaepEncrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        let cek = resolve_cek(self.enc, cek)?;
        let mut rng = keygen::rng()?;
        let encrypted = self
            .public_key
            .encrypt(&mut rng, oaep_padding(self.alg), cek.as_slice())
            .map_err(|e| KeyEncError::Encoding(format!("RSA-OAEP encryption failed: {}", e)))?;
        Ok(ByteSource::new(cek, encrypted, KeyHeader::default()))
    }
}

/// RSA-OAEP decryption with the recipient private key
#[derive(Clone)]
pub struct RsaOaepDecrypter {
    alg: KeyEncryptionAlgorithm,
    enc: ContentEncryptionAlgorithm,
    private_key: RsaPrivateKey,
}

impl RsaOaepDecrypter {
    /// `enc` fixes the CEK length the decryption must produce
    pub fn new(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        private_key: RsaPrivateKey,
    ) -> Result<Self, KeyEncError> {
        check_oaep_alg(alg)?;
        check_modulus(alg, &private_key)?;
        Ok(RsaOaepDecrypter {
            alg,
            enc,
            private_key,
        })
    }

    /// Create from a PEM-encoded PKCS#8 private key
    pub fn from_private_key_pem(
        alg: KeyEncryptionAlgorithm,
        enc: ContentEncryptionAlgorithm,
        pem: &str,
    ) -> Result<Self, KeyEncError> {
        Self::new(alg, enc, parse_private_pem(pem)?)
    }
}

impl std::fmt::Debug for RsaOaepDecrypter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaOaepDecrypter")
            .field("alg", &self.alg)
            .field("enc", &self.enc)
            .finish_non_exhaustive()
    }
}

impl Decrypter for RsaOaepDecrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        self.alg
    }

    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        let mut rng = keygen::rng()?;
        let cek = self
            .private_key
            .decrypt_blinded(&mut rng, oaep_padding(self.alg), encrypted_key)
            .map(Zeroizing::new)
            .map_err(|_| KeyEncError::Integrity)?;
        check_cek_len(self.enc, Cek::from_slice(&cek))
    }
}

/// RSAES-PKCS1-v1_5 encryption of the CEK (`RSA1_5`)
#[derive(Debug, Clone)]
pub struct RsaPkcs1v15Encrypter {
    enc: ContentEncryptionAlgorithm,
    public_key: RsaPublicKey,
    key_id: Option<String>,
}

impl RsaPkcs1v15Encrypter {
    pub fn new(
        enc: ContentEncryptionAlgorithm,
        public_key: RsaPublicKey,
    ) -> Result<Self, KeyEncError> {
        check_modulus(KeyEncryptionAlgorithm::Rsa1_5, &public_key)?;
        Ok(RsaPkcs1v15Encrypter {
            enc,
            public_key,
            key_id: None,
        })
    }

    pub fn from_public_key_pem(
        enc: ContentEncryptionAlgorithm,
        pem: &str,
    ) -> Result<Self, KeyEncError> {
        Self::new(enc, parse_public_pem(pem)?)
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl Encrypter for RsaPkcs1v15Encrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        KeyEncryptionAlgorithm::Rsa1_5
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn encrypt(&self, cek: Option<&Cek>) -> Result<ByteSource, KeyEncError> {
        let cek = resolve_cek(self.enc, cek)?;
        let mut rng = keygen::rng()?;
        let encrypted = self
            .public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, cek.as_slice())
            .map_err(|e| KeyEncError::Encoding(format!("RSA1_5 encryption failed: {}", e)))?;
        Ok(ByteSource::new(cek, encrypted, KeyHeader::default()))
    }
}

/// RSAES-PKCS1-v1_5 decryption with random-key substitution on bad padding
#[derive(Clone)]
pub struct RsaPkcs1v15Decrypter {
    enc: ContentEncryptionAlgorithm,
    private_key: RsaPrivateKey,
}

impl RsaPkcs1v15Decrypter {
    /// `enc` fixes the CEK length the decrypter substitutes on failure
    pub fn new(
        enc: ContentEncryptionAlgorithm,
        private_key: RsaPrivateKey,
    ) -> Result<Self, KeyEncError> {
        check_modulus(KeyEncryptionAlgorithm::Rsa1_5, &private_key)?;
        Ok(RsaPkcs1v15Decrypter { enc, private_key })
    }

    pub fn from_private_key_pem(
        enc: ContentEncryptionAlgorithm,
        pem: &str,
    ) -> Result<Self, KeyEncError> {
        Self::new(enc, parse_private_pem(pem)?)
    }
}

impl std::fmt::Debug for RsaPkcs1v15Decrypter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPkcs1v15Decrypter")
            .field("enc", &self.enc)
            .finish_non_exhaustive()
    }
}

impl Decrypter for RsaPkcs1v15Decrypter {
    fn algorithm(&self) -> KeyEncryptionAlgorithm {
        KeyEncryptionAlgorithm::Rsa1_5
    }

    /// Returns a CEK of the expected length for any well-sized input
    ///
    /// Only an entropy failure is reported as an error.
    fn decrypt(&self, encrypted_key: &[u8]) -> Result<Cek, KeyEncError> {
        let expected = self.enc.key_size();
        // Drawn before decrypting so both outcomes do the same work
        let fallback = keygen::random_bytes(expected)?;
        let mut rng = keygen::rng()?;

        let (candidate, valid) =
            match self
                .private_key
                .decrypt_blinded(&mut rng, Pkcs1v15Encrypt, encrypted_key)
            {
                Ok(bytes) => {
                    let valid = bytes.len().ct_eq(&expected);
                    (Zeroizing::new(bytes), valid)
                }
                Err(_) => (Zeroizing::new(Vec::new()), Choice::from(0)),
            };

        let mut cek = Zeroizing::new(vec![0u8; expected]);
        for (i, out) in cek.iter_mut().enumerate() {
            let decrypted = candidate.get(i).copied().unwrap_or(0);
            *out = u8::conditional_select(&fallback[i], &decrypted, valid);
        }
        Ok(Cek::from_slice(&cek))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    fn test_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
        static KEYPAIR: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
        KEYPAIR.get_or_init(|| {
            let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
            let public_key = RsaPublicKey::from(&private_key);
            (private_key, public_key)
        })
    }

    #[test]
    fn test_rsa_oaep_roundtrip_sha1() {
        let (private_key, public_key) = test_keypair();
        let encrypter = RsaOaepEncrypter::new(
            KeyEncryptionAlgorithm::RsaOaep,
            ContentEncryptionAlgorithm::A128CbcHs256,
            public_key.clone(),
        )
        .unwrap();
        let output = encrypter.encrypt(None).unwrap();
        assert_eq!(output.encrypted_key().len(), 256);

        let decrypter = RsaOaepDecrypter::new(
            KeyEncryptionAlgorithm::RsaOaep,
            ContentEncryptionAlgorithm::A128CbcHs256,
            private_key.clone(),
        )
        .unwrap();
        let cek = decrypter.decrypt(output.encrypted_key()).unwrap();
        assert_eq!(&cek, output.cek());
    }

    #[test]
    fn test_rsa_oaep_varied_payload_sizes() {
        let (private_key, public_key) = test_keypair();

        for enc in ContentEncryptionAlgorithm::ALL {
            let encrypter = RsaOaepEncrypter::new(
                KeyEncryptionAlgorithm::RsaOaep256,
                enc,
                public_key.clone(),
            )
            .unwrap();
            let decrypter =
                RsaOaepDecrypter::new(KeyEncryptionAlgorithm::RsaOaep256, enc, private_key.clone())
                    .unwrap();
            let output = encrypter.encrypt(None).unwrap();
            let cek = decrypter.decrypt(output.encrypted_key()).unwrap();
            assert_eq!(cek.len(), enc.key_size());
            assert_eq!(&cek, output.cek());
        }
    }

    #[test]
    fn test_rsa_oaep_hash_mismatch_fails() {
        let (private_key, public_key) = test_keypair();
        let encrypter = RsaOaepEncrypter::new(
            KeyEncryptionAlgorithm::RsaOaep,
            ContentEncryptionAlgorithm::A256Gcm,
            public_key.clone(),
        )
        .unwrap();
        let output = encrypter.encrypt(None).unwrap();

        let decrypter = RsaOaepDecrypter::new(
            KeyEncryptionAlgorithm::RsaOaep256,
            ContentEncryptionAlgorithm::A256Gcm,
            private_key.clone(),
        )
        .unwrap();
        assert!(matches!(
            decrypter.decrypt(output.encrypted_key()),
            Err(KeyEncError::Integrity)
        ));
    }

    #[test]
    fn test_rsa_oaep_failures_indistinguishable() {
        let (private_key, public_key) = test_keypair();
        let encrypter = RsaOaepEncrypter::new(
            KeyEncryptionAlgorithm::RsaOaep256,
            ContentEncryptionAlgorithm::A256Gcm,
            public_key.clone(),
        )
        .unwrap();
        let output = encrypter.encrypt(None).unwrap();
        let decrypter = RsaOaepDecrypter::new(
            KeyEncryptionAlgorithm::RsaOaep256,
            ContentEncryptionAlgorithm::A256Gcm,
            private_key.clone(),
        )
        .unwrap();

        let mut corrupted = output.encrypted_key().to_vec();
        corrupted[10] ^= 0xFF;
        let truncated = &output.encrypted_key()[..100];

        let errors = [
            decrypter.decrypt(&corrupted).unwrap_err(),
            decrypter.decrypt(truncated).unwrap_err(),
            decrypter.decrypt(&[]).unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(err, KeyEncError::Integrity));
            assert_eq!(err.to_string(), "Key decryption failed");
        }
    }

    #[test]
    fn test_rsa_pem_constructors() {
        let (private_key, public_key) = test_keypair();
        let public_pem = public_key.to_public_key_pem(LineEnding::LF).unwrap();
        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();

        let encrypter = RsaOaepEncrypter::from_public_key_pem(
            KeyEncryptionAlgorithm::RsaOaep,
            ContentEncryptionAlgorithm::A128Gcm,
            &public_pem,
        )
        .unwrap();
        let decrypter = RsaOaepDecrypter::from_private_key_pem(
            KeyEncryptionAlgorithm::RsaOaep,
            ContentEncryptionAlgorithm::A128Gcm,
            &private_pem,
        )
        .unwrap();
        let output = encrypter.encrypt(None).unwrap();
        assert_eq!(&decrypter.decrypt(output.encrypted_key()).unwrap(), output.cek());

        // Completely invalid PEM
        let result = RsaOaepEncrypter::from_public_key_pem(
            KeyEncryptionAlgorithm::RsaOaep,
            ContentEncryptionAlgorithm::A128Gcm,
            "not a valid pem",
        );
        assert!(matches!(result, Err(KeyEncError::Encoding(_))));
    }

    #[test]
    fn test_non_oaep_alg_rejected() {
        let (_, public_key) = test_keypair();
        let result = RsaOaepEncrypter::new(
            KeyEncryptionAlgorithm::A128Kw,
            ContentEncryptionAlgorithm::A128Gcm,
            public_key.clone(),
        );
        assert!(matches!(result, Err(KeyEncError::KeyMismatch { .. })));
    }

    #[test]
    fn test_small_modulus_rejected() {
        let small = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let result = RsaOaepDecrypter::new(
            KeyEncryptionAlgorithm::RsaOaep,
            ContentEncryptionAlgorithm::A128Gcm,
            small,
        );
        assert!(matches!(result, Err(KeyEncError::KeyMismatch { .. })));
    }

    #[test]
    fn test_pkcs1v15_roundtrip() {
        let (private_key, public_key) = test_keypair();
        let enc = ContentEncryptionAlgorithm::A128CbcHs256;
        let encrypter = RsaPkcs1v15Encrypter::new(enc, public_key.clone())
            .unwrap()
            .with_key_id("rsa-1");
        assert_eq!(encrypter.key_id(), Some("rsa-1"));
        let output = encrypter.encrypt(None).unwrap();

        let decrypter = RsaPkcs1v15Decrypter::new(enc, private_key.clone()).unwrap();
        let cek = decrypter.decrypt(output.encrypted_key()).unwrap();
        assert_eq!(&cek, output.cek());
    }

    #[test]
    fn test_pkcs1v15_corrupted_returns_random_key() {
        let (private_key, public_key) = test_keypair();
        let enc = ContentEncryptionAlgorithm::A256Gcm;
        let output = RsaPkcs1v15Encrypter::new(enc, public_key.clone())
            .unwrap()
            .encrypt(None)
            .unwrap();
        let decrypter = RsaPkcs1v15Decrypter::new(enc, private_key.clone()).unwrap();

        let mut corrupted = output.encrypted_key().to_vec();
        corrupted[0] ^= 0xFF;
        let first = decrypter.decrypt(&corrupted).unwrap();
        let second = decrypter.decrypt(&corrupted).unwrap();

        assert_eq!(first.len(), enc.key_size());
        assert_ne!(&first, output.cek());
        // A fresh substitute each time
        assert_ne!(first, second);

        // Garbage of the wrong size also yields a key, not an error
        let garbage = decrypter.decrypt(&[0u8; 7]).unwrap();
        assert_eq!(garbage.len(), enc.key_size());
    }

    #[test]
    fn test_pkcs1v15_wrong_length_cek_substituted() {
        let (private_key, public_key) = test_keypair();
        // Encrypted for a 16-byte CEK, decrypted expecting 32 bytes
        let output = RsaPkcs1v15Encrypter::new(ContentEncryptionAlgorithm::A128Gcm, public_key.clone())
            .unwrap()
            .encrypt(None)
            .unwrap();
        let decrypter =
            RsaPkcs1v15Decrypter::new(ContentEncryptionAlgorithm::A256Gcm, private_key.clone())
                .unwrap();

        let cek = decrypter.decrypt(output.encrypted_key()).unwrap();
        assert_eq!(cek.len(), 32);
        assert_ne!(&cek.as_slice()[..16], output.cek().as_slice());
    }

    #[test]
    fn test_rsa_oaep_cek_length_bound_to_enc() {
        let (private_key, public_key) = test_keypair();
        let output = RsaOaepEncrypter::new(
            KeyEncryptionAlgorithm::RsaOaep256,
            ContentEncryptionAlgorithm::A256CbcHs512,
            public_key.clone(),
        )
        .unwrap()
        .encrypt(None)
        .unwrap();

        let decrypter = RsaOaepDecrypter::new(
            KeyEncryptionAlgorithm::RsaOaep256,
            ContentEncryptionAlgorithm::A128Gcm,
            private_key.clone(),
        )
        .unwrap();
        let err = decrypter.decrypt(output.encrypted_key()).unwrap_err();
        assert!(matches!(err, KeyEncError::Integrity));
        assert_eq!(err.to_string(), "Key decryption failed");
    }

    fn median(mut samples: Vec<Duration>) -> Duration {
        samples.sort();
        samples[samples.len() / 2]
    }

    #[test]
    fn test_pkcs1v15_decrypt_time_independent_of_padding() {
        const ROUNDS: usize = 40;

        let (private_key, public_key) = test_keypair();
        let enc = ContentEncryptionAlgorithm::A128CbcHs256;
        let output = RsaPkcs1v15Encrypter::new(enc, public_key.clone())
            .unwrap()
            .encrypt(None)
            .unwrap();
        let decrypter = RsaPkcs1v15Decrypter::new(enc, private_key.clone()).unwrap();

        let valid = output.encrypted_key().to_vec();
        let mut corrupted = valid.clone();
        corrupted[0] ^= 0xFF;

        // Warm up before timing
        decrypter.decrypt(&valid).unwrap();
        decrypter.decrypt(&corrupted).unwrap();

        let mut valid_times = Vec::with_capacity(ROUNDS);
        let mut corrupted_times = Vec::with_capacity(ROUNDS);
        for _ in 0..ROUNDS {
            let start = Instant::now();
            decrypter.decrypt(&valid).unwrap();
            valid_times.push(start.elapsed());

            let start = Instant::now();
            decrypter.decrypt(&corrupted).unwrap();
            corrupted_times.push(start.elapsed());
        }

        let valid_median = median(valid_times).as_secs_f64();
        let corrupted_median = median(corrupted_times).as_secs_f64();
        let ratio = valid_median.max(corrupted_median) / valid_median.min(corrupted_median);
        assert!(
            ratio < 1.5,
            "valid {:?}s vs corrupted {:?}s",
            valid_median,
            corrupted_median
        );
    }
}

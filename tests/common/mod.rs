//! Common test utilities for jwe-keyenc integration tests
//!
//! This module provides shared key material and tracing setup so each
//! integration test file does not regenerate RSA keys.

#![allow(dead_code)]

use rand::rngs::OsRng;
use std::sync::{Once, OnceLock};

// Re-export commonly used types
pub use jwe_keyenc::{
    ContentEncryptionAlgorithm, DecryptionKey, Decrypter, EcCurve, EcPrivateKey, EncryptionKey,
    Encrypter, KeyDecrypter, KeyEncError, KeyEncrypter, KeyEncryptionAlgorithm, KeyHeader,
    RsaPrivateKey, RsaPublicKey,
};

/// Password used by the PBES2 scenarios (RFC 7517 Appendix C)
pub const TEST_PASSWORD: &str = "Thus from my lips, by yours, my sin is purged.";

/// Install a fmt subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Shared 2048-bit RSA key pair
pub fn rsa_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
    static KEYPAIR: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
    KEYPAIR.get_or_init(|| {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation");
        let public_key = RsaPublicKey::from(&private_key);
        (private_key, public_key)
    })
}

/// Matching encryption and decryption keys for `alg`
pub fn key_pair_for(alg: KeyEncryptionAlgorithm, enc: ContentEncryptionAlgorithm) -> (EncryptionKey, DecryptionKey) {
    use jwe_keyenc::AlgorithmFamily;

    match alg.family() {
        AlgorithmFamily::Direct => {
            let key = jwe_keyenc::random_bytes(enc.key_size()).unwrap();
            (EncryptionKey::symmetric(&key), DecryptionKey::symmetric(&key))
        }
        AlgorithmFamily::AesKw | AlgorithmFamily::AesGcmKw => {
            let key = jwe_keyenc::random_bytes(alg.kek_size().unwrap()).unwrap();
            (EncryptionKey::symmetric(&key), DecryptionKey::symmetric(&key))
        }
        AlgorithmFamily::RsaOaep | AlgorithmFamily::RsaPkcs1v15 => {
            let (private_key, public_key) = rsa_keypair();
            (
                EncryptionKey::Rsa(public_key.clone()),
                DecryptionKey::Rsa(private_key.clone()),
            )
        }
        AlgorithmFamily::EcdhEs | AlgorithmFamily::EcdhEsKw => {
            let recipient = EcPrivateKey::generate(EcCurve::P256).unwrap();
            (EncryptionKey::Ec(recipient.public_key()), DecryptionKey::Ec(recipient))
        }
        AlgorithmFamily::Pbes2 => (
            EncryptionKey::password(TEST_PASSWORD),
            DecryptionKey::password(TEST_PASSWORD),
        ),
    }
}

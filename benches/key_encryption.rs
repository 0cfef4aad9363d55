use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jwe_keyenc::{
    concat_kdf, ContentEncryptionAlgorithm, DecryptionKey, Decrypter, EcCurve, EcPrivateKey,
    EncryptionKey, Encrypter, KeyDecrypter, KeyEncrypter, KeyEncryptionAlgorithm, Pbes2Config,
    RsaPrivateKey, RsaPublicKey,
};
use rand::rngs::OsRng;

const ENC: ContentEncryptionAlgorithm = ContentEncryptionAlgorithm::A256Gcm;

// Helper function to build a matching key pair for one algorithm
fn keys_for(
    alg: KeyEncryptionAlgorithm,
    rsa: &(RsaPrivateKey, RsaPublicKey),
) -> (EncryptionKey, DecryptionKey) {
    use jwe_keyenc::AlgorithmFamily;

    match alg.family() {
        AlgorithmFamily::Direct => {
            let key = [7u8; 32];
            (EncryptionKey::symmetric(&key), DecryptionKey::symmetric(&key))
        }
        AlgorithmFamily::AesKw | AlgorithmFamily::AesGcmKw => {
            let key = vec![7u8; alg.kek_size().unwrap_or(32)];
            (EncryptionKey::symmetric(&key), DecryptionKey::symmetric(&key))
        }
        AlgorithmFamily::RsaOaep | AlgorithmFamily::RsaPkcs1v15 => (
            EncryptionKey::Rsa(rsa.1.clone()),
            DecryptionKey::Rsa(rsa.0.clone()),
        ),
        AlgorithmFamily::EcdhEs | AlgorithmFamily::EcdhEsKw => {
            let recipient = EcPrivateKey::generate(EcCurve::P256).expect("EC key generation");
            (EncryptionKey::Ec(recipient.public_key()), DecryptionKey::Ec(recipient))
        }
        AlgorithmFamily::Pbes2 => (
            EncryptionKey::password("benchmark password"),
            DecryptionKey::password("benchmark password"),
        ),
    }
}

// One representative per algorithm family
const ALGORITHMS: [KeyEncryptionAlgorithm; 8] = [
    KeyEncryptionAlgorithm::Direct,
    KeyEncryptionAlgorithm::A256Kw,
    KeyEncryptionAlgorithm::A256GcmKw,
    KeyEncryptionAlgorithm::RsaOaep256,
    KeyEncryptionAlgorithm::Rsa1_5,
    KeyEncryptionAlgorithm::EcdhEs,
    KeyEncryptionAlgorithm::EcdhEsA256Kw,
    KeyEncryptionAlgorithm::Pbes2Hs256A128Kw,
];

fn build_encrypter(alg: KeyEncryptionAlgorithm, key: EncryptionKey) -> KeyEncrypter {
    let encrypter = KeyEncrypter::new(alg, ENC, key).expect("Failed to create encrypter");
    if alg == KeyEncryptionAlgorithm::Pbes2Hs256A128Kw {
        return encrypter
            .with_pbes2_config(Pbes2Config::default())
            .expect("Failed to apply PBES2 config");
    }
    encrypter
}

// Benchmark: CEK generation plus key encryption
fn bench_encrypt(c: &mut Criterion) {
    let rsa_private = RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation");
    let rsa = (rsa_private.clone(), RsaPublicKey::from(&rsa_private));
    let mut group = c.benchmark_group("encrypt");

    for alg in ALGORITHMS {
        let (encryption_key, _) = keys_for(alg, &rsa);
        let encrypter = build_encrypter(alg, encryption_key);

        group.bench_with_input(BenchmarkId::from_parameter(alg), &alg, |b, _| {
            b.iter(|| {
                let _output = encrypter.encrypt(black_box(None)).expect("Failed to encrypt");
            });
        });
    }

    group.finish();
}

// Benchmark: CEK recovery including decrypter construction from the header
fn bench_decrypt(c: &mut Criterion) {
    let rsa_private = RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation");
    let rsa = (rsa_private.clone(), RsaPublicKey::from(&rsa_private));
    let mut group = c.benchmark_group("decrypt");

    for alg in ALGORITHMS {
        let (encryption_key, decryption_key) = keys_for(alg, &rsa);
        let output = build_encrypter(alg, encryption_key)
            .encrypt(None)
            .expect("Failed to encrypt");

        group.bench_with_input(BenchmarkId::from_parameter(alg), &alg, |b, _| {
            b.iter(|| {
                let decrypter =
                    KeyDecrypter::new(alg, ENC, decryption_key.clone(), output.header())
                        .expect("Failed to create decrypter");
                let _cek = decrypter
                    .decrypt(black_box(output.encrypted_key()))
                    .expect("Failed to decrypt");
            });
        });
    }

    group.finish();
}

// Benchmark: Concat KDF for each derived key size
fn bench_concat_kdf(c: &mut Criterion) {
    let z = [0x42u8; 32];
    let mut group = c.benchmark_group("concat_kdf");

    for bits in [128usize, 256, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, &bits| {
            b.iter(|| {
                let _key = concat_kdf(black_box(&z), bits, b"A256GCM", b"Alice", b"Bob")
                    .expect("Failed to derive");
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encrypt, bench_decrypt, bench_concat_kdf);
criterion_main!(benches);

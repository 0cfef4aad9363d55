//! Key material and encryption output types
//!
//! Secret bytes use `zeroize` so that CEKs and derived keys are cleared
//! from memory on drop.

use crate::error::KeyEncError;
use crate::keygen;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Content encryption key that zeroizes on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Cek(Vec<u8>);

impl Cek {
    /// Create a CEK from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Self {
        Cek(bytes.to_vec())
    }

    /// Get a reference to the key bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Cek {
    fn from(bytes: Vec<u8>) -> Self {
        Cek(bytes)
    }
}

impl PartialEq for Cek {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Cek {}

impl fmt::Debug for Cek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cek([REDACTED; {}])", self.0.len())
    }
}

/// Long-lived symmetric secret (KEK, shared key or password) that zeroizes on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    pub fn from_slice(bytes: &[u8]) -> Self {
        SymmetricKey(bytes.to_vec())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey([REDACTED; {}])", self.0.len())
    }
}

/// Supported elliptic curves for ECDH-ES
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
    /// NIST P-521 (secp521r1)
    P521,
}

impl EcCurve {
    /// JWK `crv` name
    pub fn as_str(&self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
            EcCurve::P521 => "P-521",
        }
    }

    /// Length in bytes of one affine coordinate
    pub fn coordinate_size(&self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elliptic curve public key, validated to lie on its curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPublicKey {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl EcPublicKey {
    pub fn curve(&self) -> EcCurve {
        match self {
            EcPublicKey::P256(_) => EcCurve::P256,
            EcPublicKey::P384(_) => EcCurve::P384,
            EcPublicKey::P521(_) => EcCurve::P521,
        }
    }

    /// Parse a SEC1-encoded point (compressed or uncompressed)
    ///
    /// Fails with [`KeyEncError::InvalidEphemeralKey`] when the bytes do not
    /// describe a valid, non-identity point on `curve`.
    pub fn from_sec1_bytes(curve: EcCurve, bytes: &[u8]) -> Result<Self, KeyEncError> {
        let key = match curve {
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(bytes).map(EcPublicKey::P256),
            EcCurve::P384 => p384::PublicKey::from_sec1_bytes(bytes).map(EcPublicKey::P384),
            EcCurve::P521 => p521::PublicKey::from_sec1_bytes(bytes).map(EcPublicKey::P521),
        };
        key.map_err(|_| KeyEncError::InvalidEphemeralKey)
    }

    /// Build a key from the JWK `x` and `y` coordinates
    pub fn from_coordinates(curve: EcCurve, x: &[u8], y: &[u8]) -> Result<Self, KeyEncError> {
        let size = curve.coordinate_size();
        if x.len() != size || y.len() != size {
            return Err(KeyEncError::InvalidEphemeralKey);
        }
        let mut encoded = Vec::with_capacity(1 + 2 * size);
        encoded.push(0x04);
        encoded.extend_from_slice(x);
        encoded.extend_from_slice(y);
        Self::from_sec1_bytes(curve, &encoded)
    }

    /// Uncompressed SEC1 encoding (`0x04 ‖ x ‖ y`)
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        match self {
            EcPublicKey::P256(key) => key.to_encoded_point(false).as_bytes().to_vec(),
            EcPublicKey::P384(key) => key.to_encoded_point(false).as_bytes().to_vec(),
            EcPublicKey::P521(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    /// Affine `(x, y)` coordinates, each `curve().coordinate_size()` bytes
    pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        let encoded = self.to_sec1_bytes();
        let size = self.curve().coordinate_size();
        (encoded[1..1 + size].to_vec(), encoded[1 + size..].to_vec())
    }
}

/// Elliptic curve private key; the inner secret keys zeroize on drop
#[derive(Clone)]
pub enum EcPrivateKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl EcPrivateKey {
    /// Generate a fresh key pair on `curve`
    pub fn generate(curve: EcCurve) -> Result<Self, KeyEncError> {
        let mut rng = keygen::rng()?;
        Ok(match curve {
            EcCurve::P256 => EcPrivateKey::P256(p256::SecretKey::random(&mut rng)),
            EcCurve::P384 => EcPrivateKey::P384(p384::SecretKey::random(&mut rng)),
            EcCurve::P521 => EcPrivateKey::P521(p521::SecretKey::random(&mut rng)),
        })
    }

    /// Load a private scalar (JWK `d`, big-endian)
    pub fn from_bytes(curve: EcCurve, scalar: &[u8]) -> Result<Self, KeyEncError> {
        if scalar.len() != curve.coordinate_size() {
            return Err(KeyEncError::InvalidKeyLength {
                expected: curve.coordinate_size(),
                got: scalar.len(),
            });
        }
        let key = match curve {
            EcCurve::P256 => p256::SecretKey::from_slice(scalar).map(EcPrivateKey::P256),
            EcCurve::P384 => p384::SecretKey::from_slice(scalar).map(EcPrivateKey::P384),
            EcCurve::P521 => p521::SecretKey::from_slice(scalar).map(EcPrivateKey::P521),
        };
        key.map_err(|_| KeyEncError::mismatch("ECDH-ES", format!("invalid {} scalar", curve)))
    }

    pub fn curve(&self) -> EcCurve {
        match self {
            EcPrivateKey::P256(_) => EcCurve::P256,
            EcPrivateKey::P384(_) => EcCurve::P384,
            EcPrivateKey::P521(_) => EcCurve::P521,
        }
    }

    pub fn public_key(&self) -> EcPublicKey {
        match self {
            EcPrivateKey::P256(key) => EcPublicKey::P256(key.public_key()),
            EcPrivateKey::P384(key) => EcPublicKey::P384(key.public_key()),
            EcPrivateKey::P521(key) => EcPublicKey::P521(key.public_key()),
        }
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcPrivateKey({}, [REDACTED])", self.curve())
    }
}

/// Public per-message values a recipient needs to recover the CEK
///
/// Produced by encryption; the header layer serializes these into the JWE
/// protected header (`epk`, `apu`, `apv`, `iv`, `tag`, `p2s`, `p2c`) and
/// hands them back to the decrypter on the receiving side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyHeader {
    /// Ephemeral public key (ECDH-ES)
    pub epk: Option<EcPublicKey>,
    /// Agreement PartyUInfo (ECDH-ES)
    pub apu: Option<Vec<u8>>,
    /// Agreement PartyVInfo (ECDH-ES)
    pub apv: Option<Vec<u8>>,
    /// Initialization vector (AES-GCM-KW)
    pub iv: Option<Vec<u8>>,
    /// Authentication tag (AES-GCM-KW)
    pub tag: Option<Vec<u8>>,
    /// Salt input (PBES2)
    pub p2s: Option<Vec<u8>>,
    /// Iteration count (PBES2)
    pub p2c: Option<u32>,
}

impl KeyHeader {
    pub fn is_empty(&self) -> bool {
        *self == KeyHeader::default()
    }
}

/// Output of a single encryption: the CEK, its encrypted form, and the
/// public values for the header
///
/// The encrypted key is empty for `dir` and direct `ECDH-ES`, where the CEK
/// is the shared or agreed key itself.
pub struct ByteSource {
    cek: Cek,
    encrypted_key: Vec<u8>,
    header: KeyHeader,
}

impl ByteSource {
    pub(crate) fn new(cek: Cek, encrypted_key: Vec<u8>, header: KeyHeader) -> Self {
        ByteSource {
            cek,
            encrypted_key,
            header,
        }
    }

    /// The content encryption key for the payload cipher
    pub fn cek(&self) -> &Cek {
        &self.cek
    }

    /// Bytes for the JWE Encrypted Key segment
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    pub fn header(&self) -> &KeyHeader {
        &self.header
    }

    pub fn into_parts(self) -> (Cek, Vec<u8>, KeyHeader) {
        (self.cek, self.encrypted_key, self.header)
    }
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSource")
            .field("cek", &self.cek)
            .field("encrypted_key_len", &self.encrypted_key.len())
            .field("header", &self.header)
            .finish()
    }
}

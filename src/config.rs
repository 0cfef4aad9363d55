//! Tunable parameters for the password-based and key-agreement algorithms

use crate::error::KeyEncError;
use serde::{Deserialize, Serialize};

/// Lowest PBES2 iteration count accepted on either side (RFC 7518 §4.8.1.2)
pub const MIN_ITERATIONS: u32 = 1000;

/// Lowest PBES2 salt length in bytes (RFC 7518 §4.8.1.1)
pub const MIN_SALT_LEN: usize = 8;

pub const DEFAULT_ITERATIONS: u32 = 10_000;
pub const DEFAULT_SALT_LEN: usize = 16;
pub const DEFAULT_MAX_ITERATIONS: u32 = 1_000_000;

/// PBES2 settings
///
/// `iterations` and `salt_len` apply when encrypting. `max_iterations` bounds
/// the `p2c` a decrypter will honour, so a hostile header cannot demand an
/// arbitrarily expensive derivation.
///
/// ```
/// use jwe_keyenc::Pbes2Config;
///
/// let config: Pbes2Config = serde_json::from_str(r#"{"iterations": 50000}"#).unwrap();
/// assert_eq!(config.iterations, 50000);
/// assert_eq!(config.salt_len, 16);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pbes2Config {
    pub iterations: u32,
    pub salt_len: usize,
    pub max_iterations: u32,
}

impl Default for Pbes2Config {
    fn default() -> Self {
        Pbes2Config {
            iterations: DEFAULT_ITERATIONS,
            salt_len: DEFAULT_SALT_LEN,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Pbes2Config {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_salt_len(mut self, salt_len: usize) -> Self {
        self.salt_len = salt_len;
        self
    }

    pub fn validate(&self) -> Result<(), KeyEncError> {
        if self.iterations < MIN_ITERATIONS {
            return Err(KeyEncError::InvalidConfig(format!(
                "PBES2 iteration count {} is below the minimum of {}",
                self.iterations, MIN_ITERATIONS
            )));
        }
        if self.salt_len < MIN_SALT_LEN {
            return Err(KeyEncError::InvalidConfig(format!(
                "PBES2 salt length {} is below the minimum of {}",
                self.salt_len, MIN_SALT_LEN
            )));
        }
        if self.iterations > self.max_iterations {
            return Err(KeyEncError::InvalidConfig(format!(
                "PBES2 iteration count {} exceeds the configured maximum of {}",
                self.iterations, self.max_iterations
            )));
        }
        Ok(())
    }

    /// Check a header-supplied iteration count before deriving with it
    pub(crate) fn check_header_iterations(&self, p2c: u32) -> Result<(), KeyEncError> {
        if p2c < MIN_ITERATIONS || p2c > self.max_iterations {
            return Err(KeyEncError::InvalidConfig(format!(
                "PBES2 p2c {} outside accepted range {}..={}",
                p2c, MIN_ITERATIONS, self.max_iterations
            )));
        }
        Ok(())
    }
}

/// ECDH-ES agreement party information (`apu` / `apv`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcdhConfig {
    pub apu: Option<Vec<u8>>,
    pub apv: Option<Vec<u8>>,
}

impl EcdhConfig {
    pub fn new(apu: impl Into<Vec<u8>>, apv: impl Into<Vec<u8>>) -> Self {
        EcdhConfig {
            apu: Some(apu.into()),
            apv: Some(apv.into()),
        }
    }
}

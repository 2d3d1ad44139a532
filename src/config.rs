//! Serde-loadable defaults for key generation and private key encryption.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CertMintError, Result};
use crate::key_encryption::CipherKind;

/// Default RSA modulus size in bits.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Largest Argon2id memory cost accepted, in KiB.
pub const MAX_KDF_MEMORY_KIB: u32 = 1024 * 1024;
/// Largest Argon2id pass count accepted.
pub const MAX_KDF_ITERATIONS: u32 = 64;
/// Largest Argon2id lane count accepted.
pub const MAX_KDF_PARALLELISM: u32 = 16;

/// Argon2id cost parameters used to derive key-encryption keys from passwords.
///
/// The defaults are Argon2's recommended ones (19 MiB, 2 passes, 1 lane).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    /// Checks the parameters against Argon2's accepted ranges and the upper
    /// bounds an encrypted key container may declare.
    pub fn validate(&self) -> Result<()> {
        self.to_argon2_params(32).map(|_| ())
    }

    pub(crate) fn to_argon2_params(&self, output_len: usize) -> Result<argon2::Params> {
        if self.memory_kib > MAX_KDF_MEMORY_KIB
            || self.iterations > MAX_KDF_ITERATIONS
            || self.parallelism > MAX_KDF_PARALLELISM
        {
            return Err(CertMintError::InvalidInput(format!(
                "KDF cost {}KiB/{} passes/{} lanes exceeds the limit of {MAX_KDF_MEMORY_KIB}KiB/{MAX_KDF_ITERATIONS}/{MAX_KDF_PARALLELISM}",
                self.memory_kib, self.iterations, self.parallelism
            )));
        }
        argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(output_len),
        )
        .map_err(|e| CertMintError::InvalidInput(format!("invalid KDF parameters: {e}")))
    }
}

/// Library-wide defaults, typically loaded from a JSON file.
///
/// ```
/// use certmint::config::MintConfig;
///
/// let config = MintConfig::from_json_str(r#"{ "key_bits": 3072 }"#).unwrap();
/// assert_eq!(config.key_bits, 3072);
/// assert_eq!(config.kdf, Default::default());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MintConfig {
    pub key_bits: usize,
    pub cipher: CipherKind,
    pub kdf: KdfParams,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            cipher: CipherKind::default(),
            kdf: KdfParams::default(),
        }
    }
}

impl MintConfig {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CertMintError::InvalidInput(format!("invalid configuration: {e}")))?;
        config.kdf.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CertMintError::IoError(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}

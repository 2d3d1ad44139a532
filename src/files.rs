//! Reading and writing PEM material on disk.
//!
//! Every function reads or writes exactly the bytes produced or consumed by
//! the corresponding codec. Private key files are restricted to the owner on
//! Unix.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::cert::Certificate;
use crate::config::MintConfig;
use crate::error::{CertMintError, Result};
use crate::key::KeyPair;
use crate::key_encryption::CipherKind;

/// Writes `key` as an unencrypted PKCS#1 PEM file.
pub fn write_private_key(path: impl AsRef<Path>, key: &KeyPair) -> Result<()> {
    let pem = key.to_pem()?;
    write_secret(path.as_ref(), pem.as_bytes())
}

/// Writes `key` encrypted under `password`.
pub fn write_encrypted_private_key(
    path: impl AsRef<Path>,
    key: &KeyPair,
    password: &[u8],
    cipher: CipherKind,
) -> Result<()> {
    let pem = key.to_encrypted_pem(password, cipher)?;
    write_secret(path.as_ref(), pem.as_bytes())
}

/// Writes `key` encrypted under `password` with the cipher and KDF cost from
/// `config`.
pub fn write_encrypted_private_key_with_config(
    path: impl AsRef<Path>,
    key: &KeyPair,
    password: &[u8],
    config: &MintConfig,
) -> Result<()> {
    let pem =
        key.to_encrypted_pem_with(&mut rand_core::OsRng, password, config.cipher, &config.kdf)?;
    write_secret(path.as_ref(), pem.as_bytes())
}

pub fn read_private_key(path: impl AsRef<Path>) -> Result<KeyPair> {
    let bytes = zeroize::Zeroizing::new(read(path.as_ref())?);
    KeyPair::from_pem(&*bytes)
}

pub fn read_encrypted_private_key(path: impl AsRef<Path>, password: &[u8]) -> Result<KeyPair> {
    let bytes = read(path.as_ref())?;
    KeyPair::from_encrypted_pem(&bytes, password)
}

pub fn write_certificate(path: impl AsRef<Path>, cert: &Certificate) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, cert.to_pem()?).map_err(|e| io_error(path, e))?;
    debug!(path = %path.display(), "wrote certificate");
    Ok(())
}

pub fn read_certificate(path: impl AsRef<Path>) -> Result<Certificate> {
    Certificate::from_pem(read(path.as_ref())?)
}

fn write_secret(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| io_error(path, e))?;
    // The creation mode does not apply to a file that already exists.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_error(path, e))?;
    }
    file.write_all(bytes).map_err(|e| io_error(path, e))?;
    debug!(path = %path.display(), "wrote private key");
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> CertMintError {
    CertMintError::IoError(format!("{}: {err}", path.display()))
}

//! # CertMint - RSA keys and X.509 certificates for self-managed TLS identities
//!
//! CertMint mints RSA key pairs and the X.509 certificates derived from them,
//! built entirely on rustcrypto libraries. It is aimed at services that issue
//! and rotate their own TLS identities without an external certificate
//! authority.
//!
//! ## Key Features
//!
//! - **Key pairs**: RSA generation, PKCS#1/PKCS#8 PEM import, PKCS#1 PEM export
//! - **Encrypted keys**: password-protected PEM using Argon2id and AES-GCM;
//!   a wrong password or a tampered file always fails, never yields a key
//! - **Self-signed roots**: CA or leaf certificates signed by their own key
//! - **Issued certificates**: for another public key or for a verified CSR
//! - **Subject alternative names**: host strings are classified as IP
//!   addresses or DNS names automatically
//! - **Round trips**: PEM, DER and already-parsed `x509-cert` structures
//!
//! ## Quick Start
//!
//! ### Generating a Self-Signed Certificate
//!
//! ```rust,no_run
//! use certmint::{cert::params::CertificateTemplate, issuer, key::KeyPair};
//! use time::{Duration, OffsetDateTime};
//!
//! # fn main() -> Result<(), certmint::error::CertMintError> {
//! let key_pair = KeyPair::generate(2048)?;
//!
//! let template = CertificateTemplate::builder()
//!     .organization("Example Corp")
//!     .host("127.0.0.1")
//!     .not_after(OffsetDateTime::now_utc() + Duration::days(365))
//!     .build()?;
//!
//! let certificate = issuer::self_sign(&key_pair, &template)?;
//! println!("Certificate:\n{}", certificate.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing a Certificate from a CSR
//!
//! ```rust,no_run
//! use certmint::{
//!     cert::{CertificateWithPrivateKey, params::CertificateTemplate},
//!     csr::CertificateRequest,
//!     key::KeyPair,
//! };
//! use time::{Duration, OffsetDateTime};
//!
//! # fn main() -> Result<(), certmint::error::CertMintError> {
//! let ca_template = CertificateTemplate::builder()
//!     .organization("Example Corp")
//!     .host("ca.example.com")
//!     .not_after(OffsetDateTime::now_utc() + Duration::days(3650))
//!     .is_ca(true)
//!     .build()?;
//! let ca = CertificateWithPrivateKey::self_signed(KeyPair::generate(2048)?, &ca_template)?;
//!
//! let server_key = KeyPair::generate(2048)?;
//! let csr = CertificateRequest::build(&server_key, "Example Corp", "server.example.com")?;
//!
//! let server_cert = ca.issue_for_csr(&csr, OffsetDateTime::now_utc() + Duration::days(90))?;
//! server_cert.verify_signed_by(&ca.key.public_key())?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Storing a Private Key Under a Password
//!
//! ```rust,no_run
//! use certmint::{key::KeyPair, key_encryption::CipherKind};
//!
//! # fn main() -> Result<(), certmint::error::CertMintError> {
//! let key_pair = KeyPair::generate(2048)?;
//! let pem = key_pair.to_encrypted_pem(b"correct horse", CipherKind::Aes256Gcm)?;
//! let restored = KeyPair::from_encrypted_pem(&pem, b"correct horse")?;
//! assert_eq!(restored.public_key(), key_pair.public_key());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::CertMintError`], whose variants
//! name the failure class:
//!
//! ```rust
//! use certmint::{error::CertMintError, key::KeyPair};
//!
//! match KeyPair::from_pem("invalid pem data") {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(CertMintError::DecodingError(msg)) => println!("Failed to decode key: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation, import/export, signing and verification
//! - [`key_encryption`]: Password-encrypted private key container
//! - [`cert`]: Certificates, templates and X.509 extensions
//! - [`issuer`]: Self-signed, key-based and CSR-based issuance
//! - [`csr`]: Certificate signing requests
//! - [`files`]: Reading and writing PEM files
//! - [`config`]: Serde-loadable defaults
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure manipulation

pub mod cert;
pub mod config;
pub mod csr;
pub mod error;
pub mod files;
pub mod issuer;
pub mod key;
pub mod key_encryption;
pub mod pem_utils;
pub mod tbs_certificate;

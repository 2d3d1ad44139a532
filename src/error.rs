//! use certmint::error::CertMintError;

use thiserror::Error;

/// Result type used throughout CertMint.
pub type Result<T> = std::result::Result<T, CertMintError>;

/// Represents errors that can occur in the CertMint library.
///
/// Every fallible operation returns one of these variants so callers can
/// branch on the failure class instead of matching on message text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertMintError {
    /// Key generation failed (bad bit length or entropy failure). Not retried.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// An encrypted private key could not be opened.
    ///
    /// Wrong passwords, tampered containers and malformed containers all
    /// produce this same variant with no further detail.
    #[error("Failed to decrypt private key")]
    DecryptionError,

    /// The certificate template parameters were rejected.
    #[error("Invalid certificate template: {0}")]
    InvalidTemplate(String),

    /// The certificate signing request was rejected.
    #[error("Invalid certificate signing request: {0}")]
    InvalidCsr(String),

    /// The signer certificate cannot act as issuer.
    #[error("Certificate issuance error: {0}")]
    IssuanceError(String),

    /// A signing primitive failed.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// A signature did not verify under the given public key.
    #[error("Signature verification failed")]
    VerificationError,

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading or writing PEM material failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<der::Error> for CertMintError {
    /// Converts a `der::Error` into a `CertMintError`.
    fn from(err: der::Error) -> Self {
        CertMintError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertMintError {
    fn from(err: pem::PemError) -> Self {
        CertMintError::DecodingError(err.to_string())
    }
}

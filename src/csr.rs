use der::asn1::BitString;
use der::{Decode, Encode};
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};

use crate::cert::params::DistinguishedName;
use crate::error::{CertMintError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{der_to_pem, pem_to_der};
use crate::tbs_certificate::sha256_with_rsa;

const CSR_PEM_LABEL: &str = "CERTIFICATE REQUEST";

/// A PKCS#10 certificate signing request.
///
/// # Example
/// ```
/// use certmint::csr::CertificateRequest;
/// use certmint::key::KeyPair;
///
/// let key = KeyPair::generate(1024).unwrap();
/// let csr = CertificateRequest::build(&key, "Test Org", "test.org").unwrap();
/// csr.verify().unwrap();
/// assert_eq!(csr.public_key().unwrap(), key.public_key());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    inner: CertReq,
    der: Vec<u8>,
}

impl CertificateRequest {
    /// Builds a request for `O=<organization>, CN=<common_name>` signed by
    /// `key_pair`.
    pub fn build(key_pair: &KeyPair, organization: &str, common_name: &str) -> Result<Self> {
        let subject = DistinguishedName::builder()
            .common_name(common_name)
            .organization(organization)
            .build();
        Self::for_subject(key_pair, &subject)
    }

    /// Builds a request for an arbitrary subject signed by `key_pair`.
    pub fn for_subject(key_pair: &KeyPair, subject: &DistinguishedName) -> Result<Self> {
        let info = CertReqInfo {
            version: Version::V1,
            subject: subject.as_x509_name()?,
            public_key: key_pair.public_key().to_spki()?,
            attributes: Default::default(),
        };
        let info_der = info
            .to_der()
            .map_err(|e| CertMintError::EncodingError(e.to_string()))?;
        let signature = key_pair.sign(&info_der)?;

        let inner = CertReq {
            info,
            algorithm: sha256_with_rsa(),
            signature: BitString::from_bytes(&signature)
                .map_err(|e| CertMintError::SigningError(e.to_string()))?,
        };
        let der = inner
            .to_der()
            .map_err(|e| CertMintError::EncodingError(e.to_string()))?;
        Ok(Self { inner, der })
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertReq::from_der(der)?;
        Ok(Self {
            inner,
            der: der.to_vec(),
        })
    }

    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the request as a `CERTIFICATE REQUEST` PEM block.
    pub fn to_pem(&self) -> String {
        der_to_pem(&self.der, CSR_PEM_LABEL)
    }

    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let der = pem_to_der(pem.as_ref(), CSR_PEM_LABEL)?;
        Self::from_der(&der)
    }

    /// The parsed request structure.
    pub fn parsed(&self) -> &CertReq {
        &self.inner
    }

    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn subject_dn(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(self.subject())
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.info.public_key)
            .map_err(|e| CertMintError::InvalidCsr(e.to_string()))
    }

    /// Checks the request's signature against its own public key.
    pub fn verify(&self) -> Result<()> {
        if self.inner.algorithm.oid != const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION {
            return Err(CertMintError::InvalidCsr(format!(
                "unsupported signature algorithm {}",
                self.inner.algorithm.oid
            )));
        }
        let info_der = self
            .inner
            .info
            .to_der()
            .map_err(|e| CertMintError::EncodingError(e.to_string()))?;
        self.public_key()?
            .verify(&info_der, self.inner.signature.raw_bytes())
            .map_err(|_| CertMintError::InvalidCsr("signature does not verify".to_string()))
    }
}

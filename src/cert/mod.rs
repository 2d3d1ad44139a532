pub mod extensions;
pub mod params;

use der::{Decode, Encode, EncodePem};
use extensions::{BasicConstraints, SubjectAltName, ToAndFromX509Extension};
use params::{CertificateTemplate, DistinguishedName, ExtensionParam};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::csr::CertificateRequest;
use crate::error::{CertMintError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils;
use crate::tbs_certificate::{self, TbsCertificate};

const CERTIFICATE_PEM_LABEL: &str = "CERTIFICATE";

/// Represents an X.509 certificate.
///
/// Holds the parsed structure together with its DER encoding. The two always
/// agree: [`Certificate::from_der`] keeps the bytes it parsed and
/// [`Certificate::from_parsed`] encodes the structure it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    inner: CertificateInner,
    der: Vec<u8>,
}

impl Certificate {
    /// Wraps an already parsed certificate, e.g. one received from a peer.
    pub fn from_parsed(inner: CertificateInner) -> Result<Self> {
        let der = inner
            .to_der()
            .map_err(|e| CertMintError::EncodingError(e.to_string()))?;
        Ok(Self { inner, der })
    }

    /// The parsed certificate structure.
    pub fn parsed(&self) -> &CertificateInner {
        &self.inner
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)?;
        Ok(Self {
            inner,
            der: der.to_vec(),
        })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into a `CERTIFICATE` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CertMintError::EncodingError(e.to_string()))
    }

    /// Decodes the first `CERTIFICATE` PEM block in `pem`.
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let der = pem_utils::pem_to_der(pem.as_ref(), CERTIFICATE_PEM_LABEL)?;
        Self::from_der(&der)
    }

    /// The to-be-signed portion of the certificate.
    pub fn tbs(&self) -> Result<TbsCertificate> {
        TbsCertificate::from_tbs_certificate_inner(&self.inner.tbs_certificate)
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn subject_dn(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(self.subject())
    }

    pub fn issuer_dn(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(self.issuer())
    }

    pub fn common_name(&self) -> Result<String> {
        Ok(self.subject_dn()?.common_name)
    }

    pub fn organization(&self) -> Result<Option<String>> {
        Ok(self.subject_dn()?.organization)
    }

    /// Big-endian serial number bytes.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn not_before(&self) -> Result<OffsetDateTime> {
        tbs_certificate::from_x509_time(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> Result<OffsetDateTime> {
        tbs_certificate::from_x509_time(&self.inner.tbs_certificate.validity.not_after)
    }

    /// The SAN entries; empty when the extension is absent.
    pub fn subject_alt_name(&self) -> Result<SubjectAltName> {
        Ok(self.extension::<SubjectAltName>()?.unwrap_or_default())
    }

    /// Whether BasicConstraints marks this certificate as a CA.
    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extension::<BasicConstraints>()?
            .is_some_and(|bc| bc.is_ca))
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        self.inner.signature.raw_bytes()
    }

    /// Whether subject and issuer names are equal.
    pub fn is_self_issued(&self) -> bool {
        self.subject() == self.issuer()
    }

    /// Checks the certificate signature against `issuer_key`.
    ///
    /// Fails with [`CertMintError::VerificationError`] if the signature
    /// algorithm is not `sha256WithRSAEncryption` or the signature does not
    /// verify.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        if self.inner.signature_algorithm.oid
            != const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION
        {
            return Err(CertMintError::VerificationError);
        }
        let tbs = self
            .inner
            .tbs_certificate
            .to_der()
            .map_err(|e| CertMintError::EncodingError(e.to_string()))?;
        issuer_key.verify(&tbs, self.signature())
    }

    /// Rebuilds an issuance template from this certificate's subject, SAN
    /// entries, validity end and CA flag.
    ///
    /// Fails with [`CertMintError::InvalidTemplate`] if the certificate has
    /// already expired.
    pub fn to_template(&self) -> Result<CertificateTemplate> {
        let subject = self.subject_dn()?;
        let san = self.subject_alt_name()?;
        let extra_sans = san
            .ip_addresses
            .iter()
            .map(|ip| ip.to_string())
            .chain(san.dns_names.iter().cloned())
            .collect::<Vec<_>>();

        CertificateTemplate::builder()
            .organization(subject.organization.unwrap_or_default())
            .host(subject.common_name)
            .not_after(self.not_after()?)
            .is_ca(self.is_ca()?)
            .extra_sans(extra_sans)
            .build()
    }

    fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        let Some(extensions) = self.inner.tbs_certificate.extensions.as_ref() else {
            return Ok(None);
        };
        extensions
            .iter()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| {
                ExtensionParam {
                    oid: ext.extn_id,
                    critical: ext.critical,
                    value: ext.extn_value.as_bytes().to_vec(),
                }
                .to_extension::<E>()
            })
            .transpose()
    }
}

/// A certificate together with the key pair it was issued for.
///
/// This is the natural shape of a CA: it can issue further certificates
/// signed by `key` and naming `cert`'s subject as issuer.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Self-signs `template` with `key`.
    pub fn self_signed(key: KeyPair, template: &CertificateTemplate) -> Result<Self> {
        let cert = crate::issuer::self_sign(&key, template)?;
        Ok(Self { cert, key })
    }

    /// Issues a certificate for `subject_public_key`.
    pub fn issue(
        &self,
        template: &CertificateTemplate,
        subject_public_key: &PublicKey,
    ) -> Result<Certificate> {
        crate::issuer::issue_for_public_key(&self.key, &self.cert, template, subject_public_key)
    }

    /// Issues a leaf certificate for a verified signing request.
    pub fn issue_for_csr(
        &self,
        csr: &CertificateRequest,
        not_after: OffsetDateTime,
    ) -> Result<Certificate> {
        crate::issuer::issue_for_csr(&self.key, &self.cert, csr, not_after)
    }
}

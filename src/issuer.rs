//! Certificate issuance.
//!
//! Three entry points cover the ways a certificate gets minted: a self-signed
//! root, a certificate for somebody else's public key, and a certificate for a
//! verified signing request. All of them end in the same assemble-and-sign
//! step, which picks names and keys according to an [`IssuanceMode`].

use der::Encode;
use der::asn1::BitString;
use der::flagset::FlagSet;
use rand_core::{CryptoRngCore, OsRng};
use time::OffsetDateTime;
use tracing::{info, warn};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    KeyUsages, SubjectKeyIdentifier,
};
use crate::cert::params::{CertificateTemplate, ExtensionParam, Validity};
use crate::csr::CertificateRequest;
use crate::error::{CertMintError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::{self, TbsCertificate};

/// Serial numbers are this many random bytes.
const SERIAL_NUMBER_LEN: usize = 17;

/// How the issuer name and subject key of a new certificate are chosen.
enum IssuanceMode<'a> {
    /// Issuer is the template subject, key is the signer's own.
    SelfSigned,
    /// Issuer is the signer certificate's subject, key is supplied.
    ForPublicKey {
        signer_cert: &'a Certificate,
        subject_public_key: &'a PublicKey,
    },
    /// Like `ForPublicKey`, with the key taken from a verified request.
    ForCsr {
        signer_cert: &'a Certificate,
        subject_public_key: &'a PublicKey,
    },
}

impl IssuanceMode<'_> {
    fn name(&self) -> &'static str {
        match self {
            IssuanceMode::SelfSigned => "self-signed",
            IssuanceMode::ForPublicKey { .. } => "for-public-key",
            IssuanceMode::ForCsr { .. } => "for-csr",
        }
    }
}

/// Self-signs `template` with `signer`.
///
/// Subject and issuer are both the template subject, and the certificate
/// carries the signer's own public key.
pub fn self_sign(signer: &KeyPair, template: &CertificateTemplate) -> Result<Certificate> {
    self_sign_with_rng(&mut OsRng, signer, template)
}

/// [`self_sign`] drawing the serial number from `rng`.
pub fn self_sign_with_rng(
    rng: &mut impl CryptoRngCore,
    signer: &KeyPair,
    template: &CertificateTemplate,
) -> Result<Certificate> {
    assemble_and_sign(rng, signer, template, IssuanceMode::SelfSigned)
}

/// Issues a certificate for `subject_public_key`, signed by `signer`.
///
/// The issuer name is `signer_cert`'s subject, copied verbatim. Fails with
/// [`CertMintError::IssuanceError`] if that subject is empty.
pub fn issue_for_public_key(
    signer: &KeyPair,
    signer_cert: &Certificate,
    template: &CertificateTemplate,
    subject_public_key: &PublicKey,
) -> Result<Certificate> {
    issue_for_public_key_with_rng(&mut OsRng, signer, signer_cert, template, subject_public_key)
}

/// [`issue_for_public_key`] drawing the serial number from `rng`.
pub fn issue_for_public_key_with_rng(
    rng: &mut impl CryptoRngCore,
    signer: &KeyPair,
    signer_cert: &Certificate,
    template: &CertificateTemplate,
    subject_public_key: &PublicKey,
) -> Result<Certificate> {
    assemble_and_sign(
        rng,
        signer,
        template,
        IssuanceMode::ForPublicKey {
            signer_cert,
            subject_public_key,
        },
    )
}

/// Issues a leaf certificate for `csr`, valid until `not_after`.
///
/// The request signature is checked first. The subject is taken from the
/// request's organization and common name; the common name also becomes the
/// only SAN entry.
pub fn issue_for_csr(
    signer: &KeyPair,
    signer_cert: &Certificate,
    csr: &CertificateRequest,
    not_after: OffsetDateTime,
) -> Result<Certificate> {
    issue_for_csr_with_rng(&mut OsRng, signer, signer_cert, csr, not_after)
}

/// [`issue_for_csr`] drawing the serial number from `rng`.
pub fn issue_for_csr_with_rng(
    rng: &mut impl CryptoRngCore,
    signer: &KeyPair,
    signer_cert: &Certificate,
    csr: &CertificateRequest,
    not_after: OffsetDateTime,
) -> Result<Certificate> {
    if let Err(e) = csr.verify() {
        warn!(error = %e, "rejecting certificate signing request");
        return Err(e);
    }

    let subject = csr.subject_dn()?;
    if subject.common_name.is_empty() {
        return Err(CertMintError::InvalidCsr(
            "request subject has no common name".to_string(),
        ));
    }
    let subject_public_key = csr.public_key()?;

    // A past end date is the caller's mistake; anything else the template
    // rejects came from the request's subject.
    Validity::starting_now(not_after)?;
    let template = CertificateTemplate::builder()
        .organization(subject.organization.unwrap_or_default())
        .host(subject.common_name)
        .not_after(not_after)
        .build()
        .map_err(|e| CertMintError::InvalidCsr(e.to_string()))?;

    assemble_and_sign(
        rng,
        signer,
        &template,
        IssuanceMode::ForCsr {
            signer_cert,
            subject_public_key: &subject_public_key,
        },
    )
}

fn assemble_and_sign(
    rng: &mut impl CryptoRngCore,
    signer: &KeyPair,
    template: &CertificateTemplate,
    mode: IssuanceMode<'_>,
) -> Result<Certificate> {
    let subject = template.subject().as_x509_name()?;
    let signer_public_key = signer.public_key();

    let (issuer, subject_public_key) = match &mode {
        IssuanceMode::SelfSigned => (subject.clone(), signer_public_key.clone()),
        IssuanceMode::ForPublicKey {
            signer_cert,
            subject_public_key,
        }
        | IssuanceMode::ForCsr {
            signer_cert,
            subject_public_key,
        } => (
            resolve_issuer(signer_cert, &signer_public_key)?,
            (*subject_public_key).clone(),
        ),
    };

    let extensions = build_extensions(template, &subject_public_key, &signer_public_key)?;
    let serial_number = random_serial(rng);

    let tbs = TbsCertificate {
        serial_number: serial_number.clone(),
        issuer,
        validity: template.validity()?,
        subject,
        subject_public_key,
        extensions,
    };

    let tbs_inner = tbs.to_tbs_certificate_inner()?;
    let tbs_der = tbs_inner
        .to_der()
        .map_err(|e| CertMintError::EncodingError(e.to_string()))?;
    let signature = signer.sign(&tbs_der)?;

    let cert = Certificate::from_parsed(CertificateInner {
        tbs_certificate: tbs_inner,
        signature_algorithm: tbs_certificate::sha256_with_rsa(),
        signature: BitString::from_bytes(&signature)
            .map_err(|e| CertMintError::SigningError(e.to_string()))?,
    })?;

    let serial_hex = hex::encode(&serial_number);
    info!(
        mode = mode.name(),
        subject = template.host(),
        serial = %serial_hex,
        is_ca = template.is_ca(),
        "issued certificate"
    );
    Ok(cert)
}

/// The issuer name for certificates signed on behalf of `signer_cert`.
///
/// Issuer identity is name-based. A signer key that does not match the
/// certificate is reported but not rejected.
fn resolve_issuer(signer_cert: &Certificate, signer_public_key: &PublicKey) -> Result<Name> {
    let issuer = signer_cert.subject();
    if issuer.0.is_empty() {
        return Err(CertMintError::IssuanceError(
            "signer certificate has an empty subject".to_string(),
        ));
    }
    match signer_cert.public_key() {
        Ok(cert_key) if &cert_key == signer_public_key => {}
        _ => warn!(
            issuer = %issuer,
            "signer key does not match the signer certificate's public key"
        ),
    }
    Ok(issuer.clone())
}

fn build_extensions(
    template: &CertificateTemplate,
    subject_public_key: &PublicKey,
    signer_public_key: &PublicKey,
) -> Result<Vec<ExtensionParam>> {
    let basic_constraints = BasicConstraints {
        is_ca: template.is_ca(),
        max_path_length: None,
    };

    let mut key_usage_flags: FlagSet<KeyUsages> =
        KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment;
    if template.is_ca() {
        key_usage_flags |= KeyUsages::KeyCertSign;
        key_usage_flags |= KeyUsages::CRLSign;
    }

    let extended_key_usage = ExtendedKeyUsage {
        usage: vec![
            ExtendedKeyUsageOption::ServerAuth,
            ExtendedKeyUsageOption::ClientAuth,
        ],
    };

    let mut extensions = vec![
        ExtensionParam::from_extension(basic_constraints, true)?,
        ExtensionParam::from_extension(KeyUsage(key_usage_flags), true)?,
        ExtensionParam::from_extension(extended_key_usage, false)?,
    ];

    let san = template.subject_alt_name();
    if !san.is_empty() {
        extensions.push(ExtensionParam::from_extension(san.clone(), false)?);
    }

    extensions.push(ExtensionParam::from_extension(
        SubjectKeyIdentifier(subject_public_key.key_id()?),
        false,
    )?);
    extensions.push(ExtensionParam::from_extension(
        AuthorityKeyIdentifier {
            key_identifier: signer_public_key.key_id()?,
        },
        false,
    )?);

    Ok(extensions)
}

/// A positive serial number with no leading zero byte.
fn random_serial(rng: &mut impl CryptoRngCore) -> Vec<u8> {
    let mut serial = vec![0u8; SERIAL_NUMBER_LEN];
    rng.fill_bytes(&mut serial);
    serial[0] = (serial[0] & 0x7f) | 0x01;
    serial
}

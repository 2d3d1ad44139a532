use std::time::Duration;

use der::asn1::{AnyRef, GeneralizedTime, OctetString, UtcTime};
use der::{Any, DateTime, Encode};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::Time;

use crate::cert::params::{ExtensionParam, Validity};
use crate::error::{CertMintError, Result};
use crate::key::PublicKey;

/// First year that no longer fits an ASN.1 UTCTime.
const UTC_TIME_CUTOFF_YEAR: i32 = 2050;

/// `sha256WithRSAEncryption` with the explicit NULL parameters RFC 4055
/// requires.
pub fn sha256_with_rsa() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(Any::from(AnyRef::NULL)),
    }
}

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `issuer` - The name of the certificate issuer.
/// * `validity` - The certificate's validity period.
/// * `subject` - The name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TbsCertificate {
    /// Certificate serial number, big-endian and positive
    pub serial_number: Vec<u8>,
    /// Certificate issuer name
    pub issuer: Name,
    /// Not before / not after, at one-second precision
    pub validity: Validity,
    /// Certificate subject name
    pub subject: Name,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())
                        .map_err(|e| CertMintError::EncodingError(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.validity.not_before)?,
            not_after: to_x509_time(self.validity.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| CertMintError::EncodingError(format!("serial number: {e}")))?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: sha256_with_rsa(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Creates a `TbsCertificate` from a `TbsCertificateInner`.
    ///
    /// Only RSA subject keys and `sha256WithRSAEncryption` signatures are
    /// understood.
    pub fn from_tbs_certificate_inner(inner: &TbsCertificateInner) -> Result<Self> {
        if inner.signature.oid != const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION {
            return Err(CertMintError::DecodingError(format!(
                "unsupported signature algorithm {}",
                inner.signature.oid
            )));
        }

        let subject_public_key = PublicKey::from_x509spki(&inner.subject_public_key_info)?;

        let extensions = inner
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect::<Vec<_>>();

        Ok(Self {
            serial_number: inner.serial_number.as_bytes().into(),
            issuer: inner.issuer.clone(),
            validity: Validity {
                not_before: from_x509_time(&inner.validity.not_before)?,
                not_after: from_x509_time(&inner.validity.not_after)?,
            },
            subject: inner.subject.clone(),
            subject_public_key,
            extensions,
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    ///
    /// These are the bytes the issuer signs.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_tbs_certificate_inner()?
            .to_der()
            .map_err(|e| CertMintError::EncodingError(e.to_string()))
    }
}

/// UTCTime through 2049, GeneralizedTime afterwards (RFC 5280 4.1.2.5).
pub(crate) fn to_x509_time(t: OffsetDateTime) -> Result<Time> {
    let secs = u64::try_from(t.unix_timestamp()).map_err(|_| {
        CertMintError::EncodingError(format!("time {t} is before the Unix epoch"))
    })?;
    let date_time = DateTime::from_unix_duration(Duration::from_secs(secs))
        .map_err(|e| CertMintError::EncodingError(e.to_string()))?;

    let time = if t.year() < UTC_TIME_CUTOFF_YEAR {
        UtcTime::from_date_time(date_time).map(Time::UtcTime)
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    };
    time.map_err(|e| CertMintError::EncodingError(e.to_string()))
}

pub(crate) fn from_x509_time(t: &Time) -> Result<OffsetDateTime> {
    let secs = t.to_unix_duration().as_secs();
    let secs = i64::try_from(secs)
        .map_err(|_| CertMintError::DecodingError("time out of range".to_string()))?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| CertMintError::DecodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn times_before_2050_use_utc_time() {
        let t = datetime!(2049-12-31 23:59:59 UTC);
        assert!(matches!(to_x509_time(t).unwrap(), Time::UtcTime(_)));
        assert_eq!(from_x509_time(&to_x509_time(t).unwrap()).unwrap(), t);
    }

    #[test]
    fn times_from_2050_use_generalized_time() {
        let t = datetime!(2050-01-01 00:00:00 UTC);
        assert!(matches!(to_x509_time(t).unwrap(), Time::GeneralTime(_)));
        assert_eq!(from_x509_time(&to_x509_time(t).unwrap()).unwrap(), t);
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        let t = datetime!(2030-06-01 12:00:00.75 UTC);
        assert_eq!(
            from_x509_time(&to_x509_time(t).unwrap()).unwrap(),
            datetime!(2030-06-01 12:00:00 UTC)
        );
    }

    #[test]
    fn signature_algorithm_carries_null_parameters() {
        let der = sha256_with_rsa().to_der().unwrap();
        assert!(der.ends_with(&[0x05, 0x00]));
    }
}

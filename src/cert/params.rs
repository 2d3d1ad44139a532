use bon::{Builder, bon};
use const_oid::ObjectIdentifier;
use der::{
    Any, Tag, Tagged,
    asn1::{Ia5StringRef, PrintableStringRef, SetOfVec},
};
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::{SubjectAltName, ToAndFromX509Extension};
pub use crate::cert::extensions::ExtendedKeyUsage;
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::{CertMintError, Result};

const ID_AT_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const ID_AT_COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const ID_AT_LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const ID_AT_STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const ID_AT_ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ID_AT_ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");

/// The attribute set of a certificate that has not been issued yet.
///
/// The primary host is classified as an IP literal or a DNS name and lands in
/// the matching SAN slot. Extra SAN entries are classified the same way and
/// duplicates are dropped.
///
/// # Example
/// ```
/// use certmint::cert::params::CertificateTemplate;
/// use time::{Duration, OffsetDateTime};
///
/// let template = CertificateTemplate::builder()
///     .organization("Example Org")
///     .host("127.0.0.1")
///     .not_after(OffsetDateTime::now_utc() + Duration::days(30))
///     .build()
///     .unwrap();
/// assert_eq!(template.subject_alt_name().ip_addresses.len(), 1);
/// assert!(template.subject_alt_name().dns_names.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct CertificateTemplate {
    organization: String,
    host: String,
    not_after: OffsetDateTime,
    is_ca: bool,
    subject_alt_name: SubjectAltName,
}

#[bon]
impl CertificateTemplate {
    #[builder]
    pub fn new(
        #[builder(into)] organization: String,
        #[builder(into)] host: String,
        not_after: OffsetDateTime,
        #[builder(default)] is_ca: bool,
        #[builder(default)] extra_sans: Vec<String>,
    ) -> Result<Self> {
        if host.is_empty() {
            return Err(CertMintError::InvalidTemplate(
                "subject host must not be empty".to_string(),
            ));
        }
        // Rejects an already expired window up front; validity() checks again
        // at issuance time.
        Validity::starting_now(not_after)?;

        let mut subject_alt_name = SubjectAltName::default();
        for entry in std::iter::once(&host).chain(extra_sans.iter()) {
            subject_alt_name
                .push_classified(entry)
                .map_err(|e| CertMintError::InvalidTemplate(e.to_string()))?;
        }

        Ok(Self {
            organization,
            host,
            not_after,
            is_ca,
            subject_alt_name,
        })
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// The primary subject, a host name or an IP literal.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// `O=<organization>, CN=<host>`.
    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::builder()
            .common_name(self.host.clone())
            .organization(self.organization.clone())
            .build()
    }

    pub fn subject_alt_name(&self) -> &SubjectAltName {
        &self.subject_alt_name
    }

    /// The validity window, starting at the current time.
    pub fn validity(&self) -> Result<Validity> {
        Validity::starting_now(self.not_after)
    }
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// This struct represents the subject or issuer name in a certificate.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    #[builder(into)]
    pub common_name: String,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub locality: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 name.
    ///
    /// Empty attributes are left out. Country is encoded as a PrintableString,
    /// everything else as UTF8String.
    pub fn as_x509_name(&self) -> Result<Name> {
        let attributes = [
            (ID_AT_COUNTRY_NAME, self.country.as_deref()),
            (ID_AT_STATE_OR_PROVINCE_NAME, self.state.as_deref()),
            (ID_AT_LOCALITY_NAME, self.locality.as_deref()),
            (ID_AT_ORGANIZATION_NAME, self.organization.as_deref()),
            (ID_AT_ORGANIZATIONAL_UNIT_NAME, self.organization_unit.as_deref()),
            (ID_AT_COMMON_NAME, Some(self.common_name.as_str())),
        ];

        let mut rdns = Vec::new();
        for (oid, value) in attributes {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            let tag = if oid == ID_AT_COUNTRY_NAME {
                PrintableStringRef::new(value)
                    .map_err(|e| CertMintError::InvalidInput(format!("country {value:?}: {e}")))?;
                Tag::PrintableString
            } else {
                Tag::Utf8String
            };
            let atv = AttributeTypeAndValue {
                oid,
                value: Any::new(tag, value.as_bytes())
                    .map_err(|e| CertMintError::EncodingError(e.to_string()))?,
            };
            let set = SetOfVec::try_from(vec![atv])
                .map_err(|e| CertMintError::EncodingError(e.to_string()))?;
            rdns.push(RelativeDistinguishedName(set));
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 name.
    ///
    /// Unknown attributes are ignored. Values are read as UTF8String,
    /// PrintableString or IA5String.
    pub fn from_x509_name(x509dn: &Name) -> Result<Self> {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let slot = match attr.oid {
                    ID_AT_COMMON_NAME => {
                        dn.common_name = decode_directory_string(&attr.value)?;
                        continue;
                    }
                    ID_AT_COUNTRY_NAME => &mut dn.country,
                    ID_AT_STATE_OR_PROVINCE_NAME => &mut dn.state,
                    ID_AT_LOCALITY_NAME => &mut dn.locality,
                    ID_AT_ORGANIZATION_NAME => &mut dn.organization,
                    ID_AT_ORGANIZATIONAL_UNIT_NAME => &mut dn.organization_unit,
                    _ => continue,
                };
                *slot = Some(decode_directory_string(&attr.value)?);
            }
        }

        Ok(dn)
    }
}

fn decode_directory_string(value: &Any) -> Result<String> {
    if let Ok(s) = value.decode_as::<String>() {
        return Ok(s);
    }
    if let Ok(s) = value.decode_as::<PrintableStringRef<'_>>() {
        return Ok(s.as_str().to_string());
    }
    if let Ok(s) = value.decode_as::<Ia5StringRef<'_>>() {
        return Ok(s.as_str().to_string());
    }
    Err(CertMintError::DecodingError(format!(
        "unsupported directory string tag {}",
        value.tag()
    )))
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period from now until `not_after`.
    ///
    /// Fails with [`CertMintError::InvalidTemplate`] unless `not_after` is
    /// strictly after the current time, compared at one-second precision.
    pub fn starting_now(not_after: OffsetDateTime) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        if not_after.unix_timestamp() <= now.unix_timestamp() {
            return Err(CertMintError::InvalidTemplate(format!(
                "validity end {not_after} is not after validity start {now}"
            )));
        }
        Ok(Self {
            not_before: now,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn tomorrow() -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::days(1)
    }

    #[test]
    fn template_classifies_ip_host() {
        let template = CertificateTemplate::builder()
            .organization("Acme")
            .host("127.0.0.1")
            .not_after(tomorrow())
            .build()
            .unwrap();
        let san = template.subject_alt_name();
        assert_eq!(san.ip_addresses, vec!["127.0.0.1".parse::<std::net::IpAddr>().unwrap()]);
        assert!(san.dns_names.is_empty());
        assert!(!template.is_ca());
    }

    #[test]
    fn template_merges_and_dedupes_extra_sans() {
        let template = CertificateTemplate::builder()
            .organization("Acme")
            .host("example.com")
            .not_after(tomorrow())
            .is_ca(true)
            .extra_sans(vec![
                "www.example.com".to_string(),
                "example.com".to_string(),
                "::1".to_string(),
            ])
            .build()
            .unwrap();
        let san = template.subject_alt_name();
        assert_eq!(san.dns_names, vec!["example.com", "www.example.com"]);
        assert_eq!(san.ip_addresses.len(), 1);
        assert!(template.is_ca());
    }

    #[test]
    fn template_rejects_empty_host() {
        let result = CertificateTemplate::builder()
            .organization("Acme")
            .host("")
            .not_after(tomorrow())
            .build();
        assert!(matches!(result, Err(CertMintError::InvalidTemplate(_))));
    }

    #[test]
    fn template_rejects_past_validity_end() {
        let result = CertificateTemplate::builder()
            .organization("Acme")
            .host("example.com")
            .not_after(OffsetDateTime::now_utc() - Duration::minutes(1))
            .build();
        assert!(matches!(result, Err(CertMintError::InvalidTemplate(_))));
    }

    #[test]
    fn template_rejects_non_ascii_dns_name() {
        let result = CertificateTemplate::builder()
            .organization("Acme")
            .host("bücher.example")
            .not_after(tomorrow())
            .build();
        assert!(matches!(result, Err(CertMintError::InvalidTemplate(_))));
    }

    #[test]
    fn distinguished_name_roundtrip() {
        let dn = DistinguishedName::builder()
            .common_name("test.org")
            .organization("Test, Org")
            .country("US")
            .build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 3);
        assert_eq!(DistinguishedName::from_x509_name(&name).unwrap(), dn);
    }

    #[test]
    fn distinguished_name_reads_rfc4514_names() {
        use std::str::FromStr;

        let name = RdnSequence::from_str("CN=host.example,O=Example").unwrap();
        let dn = DistinguishedName::from_x509_name(&name).unwrap();
        assert_eq!(dn.common_name, "host.example");
        assert_eq!(dn.organization.as_deref(), Some("Example"));
        assert_eq!(dn.country, None);
    }

    #[test]
    fn validity_requires_future_end() {
        assert!(Validity::starting_now(tomorrow()).is_ok());
        assert!(matches!(
            Validity::starting_now(OffsetDateTime::now_utc()),
            Err(CertMintError::InvalidTemplate(_))
        ));
    }
}

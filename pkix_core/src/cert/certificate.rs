use crate::cert::extensions::{DistributionPoint, Extensions, KeyUsage};
use crate::cert::name::{DistinguishedName, GeneralName};
use crate::cert::oid;
use crate::cert::parser::{self, ParseError};
use chrono::{DateTime, Utc};
use const_oid::ObjectIdentifier;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlgorithmIdentifier {
    pub oid: ObjectIdentifier,
    /// DER of the parameters field when present.
    pub parameters: Option<Vec<u8>>,
}

impl AlgorithmIdentifier {
    pub fn new(oid: ObjectIdentifier) -> Self {
        Self {
            oid,
            parameters: None,
        }
    }

    pub fn name(&self) -> String {
        oid::algorithm_name(&self.oid)
    }
}

/// SubjectPublicKeyInfo in owned form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey {
    pub algorithm: ObjectIdentifier,
    /// Named curve for EC keys.
    pub curve: Option<ObjectIdentifier>,
    /// Contents of the subjectPublicKey BIT STRING.
    pub key: Vec<u8>,
    /// Modulus or field size in bits when known.
    pub bits: Option<usize>,
}

/// A parsed X.509 certificate. Equality is on the signed content.
#[derive(Clone)]
pub struct Certificate {
    pub(crate) encoded: Vec<u8>,
    pub(crate) tbs: Vec<u8>,
    pub(crate) serial: Vec<u8>,
    pub(crate) signature_algorithm: AlgorithmIdentifier,
    pub(crate) signature: Vec<u8>,
    pub(crate) issuer: DistinguishedName,
    pub(crate) subject: DistinguishedName,
    pub(crate) not_before: DateTime<Utc>,
    pub(crate) not_after: DateTime<Utc>,
    pub(crate) public_key: PublicKey,
    pub(crate) extensions: Extensions,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self, ParseError> {
        parser::parse_certificate(der)
    }

    /// Full DER encoding; empty for certificates assembled in memory.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn tbs_bytes(&self) -> &[u8] {
        &self.tbs
    }

    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial)
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn is_valid_at(&self, date: DateTime<Utc>) -> bool {
        self.not_before <= date && date <= self.not_after
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    pub fn is_ca(&self) -> bool {
        self.extensions
            .basic_constraints
            .as_ref()
            .is_some_and(|bc| bc.ca)
    }

    pub fn path_len_constraint(&self) -> Option<u32> {
        self.extensions
            .basic_constraints
            .as_ref()
            .and_then(|bc| bc.path_len)
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.extensions.key_usage
    }

    pub fn has_policy_mappings(&self) -> bool {
        self.extensions.policy_mappings.is_some()
    }

    pub fn critical_extension_oids(&self) -> impl Iterator<Item = &ObjectIdentifier> {
        self.extensions.critical.iter()
    }

    pub fn crl_distribution_points(&self) -> &[DistributionPoint] {
        self.extensions
            .crl_distribution_points
            .as_deref()
            .unwrap_or(&[])
    }

    pub fn ocsp_uris(&self) -> Vec<String> {
        self.extensions
            .authority_info_access
            .iter()
            .filter(|ad| ad.method == oid::AD_OCSP)
            .filter_map(|ad| match &ad.location {
                GeneralName::Uri(uri) => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_ocsp_no_check(&self) -> bool {
        self.extensions.ocsp_no_check
    }

    pub fn has_extended_key_usage(&self, purpose: &ObjectIdentifier) -> bool {
        self.extensions
            .extended_key_usage
            .as_ref()
            .is_some_and(|ekus| ekus.contains(purpose))
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.tbs == other.tbs && self.signature == other.signature
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("serial", &self.serial_hex())
            .finish()
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (serial {})", self.subject, self.serial_hex())
    }
}

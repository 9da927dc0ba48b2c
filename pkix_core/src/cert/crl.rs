use crate::cert::certificate::AlgorithmIdentifier;
use crate::cert::extensions::{IssuingDistributionPoint, RevocationReason};
use crate::cert::name::DistinguishedName;
use crate::cert::parser::{self, ParseError};
use chrono::{DateTime, Utc};
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevokedEntry {
    pub serial: Vec<u8>,
    pub revocation_date: DateTime<Utc>,
    pub reason: Option<RevocationReason>,
    /// Issuer of the revoked certificate. For indirect CRLs this carries the
    /// effective certificateIssuer entry extension.
    pub certificate_issuer: DistinguishedName,
    pub critical: BTreeSet<ObjectIdentifier>,
}

/// A parsed certificate revocation list.
#[derive(Clone)]
pub struct Crl {
    pub(crate) encoded: Vec<u8>,
    pub(crate) tbs: Vec<u8>,
    pub(crate) signature_algorithm: AlgorithmIdentifier,
    pub(crate) signature: Vec<u8>,
    pub(crate) issuer: DistinguishedName,
    pub(crate) this_update: DateTime<Utc>,
    pub(crate) next_update: Option<DateTime<Utc>>,
    pub(crate) revoked: Vec<RevokedEntry>,
    pub(crate) crl_number: Option<Vec<u8>>,
    pub(crate) authority_key_id: Option<Vec<u8>>,
    pub(crate) issuing_distribution_point: Option<IssuingDistributionPoint>,
    pub(crate) delta: bool,
    pub(crate) critical: BTreeSet<ObjectIdentifier>,
}

impl Crl {
    pub fn from_der(der: &[u8]) -> Result<Self, ParseError> {
        parser::parse_crl(der)
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn tbs_bytes(&self) -> &[u8] {
        &self.tbs
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

    pub fn this_update(&self) -> DateTime<Utc> {
        self.this_update
    }

    pub fn next_update(&self) -> Option<DateTime<Utc>> {
        self.next_update
    }

    pub fn revoked(&self) -> &[RevokedEntry] {
        &self.revoked
    }

    pub fn crl_number(&self) -> Option<&[u8]> {
        self.crl_number.as_deref()
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    pub fn issuing_distribution_point(&self) -> Option<&IssuingDistributionPoint> {
        self.issuing_distribution_point.as_ref()
    }

    pub fn is_delta(&self) -> bool {
        self.delta
    }

    pub fn critical_extension_oids(&self) -> &BTreeSet<ObjectIdentifier> {
        &self.critical
    }

    pub fn is_indirect(&self) -> bool {
        self.issuing_distribution_point
            .as_ref()
            .is_some_and(|idp| idp.indirect_crl)
    }

    /// Entry for `serial` issued by `certificate_issuer`, if listed.
    pub fn find_revoked(
        &self,
        serial: &[u8],
        certificate_issuer: &DistinguishedName,
    ) -> Option<&RevokedEntry> {
        self.revoked
            .iter()
            .find(|e| e.serial == serial && &e.certificate_issuer == certificate_issuer)
    }
}

impl PartialEq for Crl {
    fn eq(&self, other: &Self) -> bool {
        self.tbs == other.tbs && self.signature == other.signature
    }
}

impl Eq for Crl {}

impl fmt::Debug for Crl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crl")
            .field("issuer", &self.issuer)
            .field("this_update", &self.this_update)
            .field("next_update", &self.next_update)
            .field("entries", &self.revoked.len())
            .finish()
    }
}

//! Owned model of the certificate and CRL extensions that path validation
//! consumes.

use crate::cert::name::{DistinguishedName, GeneralName};
use const_oid::ObjectIdentifier;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u32>,
}

/// KeyUsage bit string, bit 0 being digitalSignature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyUsage(pub u16);

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: u16 = 1 << 0;
    pub const NON_REPUDIATION: u16 = 1 << 1;
    pub const KEY_ENCIPHERMENT: u16 = 1 << 2;
    pub const DATA_ENCIPHERMENT: u16 = 1 << 3;
    pub const KEY_AGREEMENT: u16 = 1 << 4;
    pub const KEY_CERT_SIGN: u16 = 1 << 5;
    pub const CRL_SIGN: u16 = 1 << 6;
    pub const ENCIPHER_ONLY: u16 = 1 << 7;
    pub const DECIPHER_ONLY: u16 = 1 << 8;

    pub fn contains(&self, bits: u16) -> bool {
        self.0 & bits == bits
    }

    pub fn key_cert_sign(&self) -> bool {
        self.contains(Self::KEY_CERT_SIGN)
    }

    pub fn crl_sign(&self) -> bool {
        self.contains(Self::CRL_SIGN)
    }

    pub fn digital_signature(&self) -> bool {
        self.contains(Self::DIGITAL_SIGNATURE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneralSubtree {
    pub base: GeneralName,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameConstraints {
    pub permitted: Option<Vec<GeneralSubtree>>,
    pub excluded: Option<Vec<GeneralSubtree>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyQualifier {
    pub id: ObjectIdentifier,
    pub qualifier: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyInformation {
    pub policy_id: ObjectIdentifier,
    pub qualifiers: Vec<PolicyQualifier>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyMapping {
    pub issuer_domain_policy: ObjectIdentifier,
    pub subject_domain_policy: ObjectIdentifier,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyConstraints {
    pub require_explicit_policy: Option<u32>,
    pub inhibit_policy_mapping: Option<u32>,
}

/// Revocation reasons of RFC 5280 5.3.1; the numeric value is the CRLReason
/// code and the ReasonFlags bit position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl RevocationReason {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Unspecified,
            1 => Self::KeyCompromise,
            2 => Self::CaCompromise,
            3 => Self::AffiliationChanged,
            4 => Self::Superseded,
            5 => Self::CessationOfOperation,
            6 => Self::CertificateHold,
            8 => Self::RemoveFromCrl,
            9 => Self::PrivilegeWithdrawn,
            10 => Self::AaCompromise,
            _ => return None,
        })
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unspecified => "unspecified",
            Self::KeyCompromise => "keyCompromise",
            Self::CaCompromise => "cACompromise",
            Self::AffiliationChanged => "affiliationChanged",
            Self::Superseded => "superseded",
            Self::CessationOfOperation => "cessationOfOperation",
            Self::CertificateHold => "certificateHold",
            Self::RemoveFromCrl => "removeFromCRL",
            Self::PrivilegeWithdrawn => "privilegeWithdrawn",
            Self::AaCompromise => "aACompromise",
        };
        f.write_str(s)
    }
}

/// ReasonFlags bit string. Bit 0 (unused) is never set; bits 1..=8 name the
/// reasons keyCompromise through aACompromise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReasonFlags(pub u16);

impl ReasonFlags {
    pub const ALL: ReasonFlags = ReasonFlags(0x01fe);

    pub fn union(self, other: ReasonFlags) -> ReasonFlags {
        ReasonFlags((self.0 | other.0) & Self::ALL.0)
    }

    pub fn intersection(self, other: ReasonFlags) -> ReasonFlags {
        ReasonFlags(self.0 & other.0 & Self::ALL.0)
    }

    pub fn is_all(&self) -> bool {
        self.0 & Self::ALL.0 == Self::ALL.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 & Self::ALL.0 == 0
    }

    /// True when `self` has a reason that `other` does not.
    pub fn adds_to(&self, other: ReasonFlags) -> bool {
        self.0 & Self::ALL.0 & !other.0 != 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DistributionPointName {
    FullName(Vec<GeneralName>),
    /// Already resolved against the CRL issuer name.
    RelativeToIssuer(DistinguishedName),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionPoint {
    pub name: Option<DistributionPointName>,
    pub reasons: Option<ReasonFlags>,
    pub crl_issuer: Option<Vec<GeneralName>>,
}

impl DistributionPoint {
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        let names: &[GeneralName] = match &self.name {
            Some(DistributionPointName::FullName(names)) => names,
            _ => &[],
        };
        names.iter().filter_map(|n| match n {
            GeneralName::Uri(uri) => Some(uri.as_str()),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssuingDistributionPoint {
    pub name: Option<DistributionPointName>,
    pub only_user_certs: bool,
    pub only_ca_certs: bool,
    pub only_some_reasons: Option<ReasonFlags>,
    pub indirect_crl: bool,
    pub only_attribute_certs: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessDescription {
    pub method: ObjectIdentifier,
    pub location: GeneralName,
}

/// Certificate extensions relevant to path processing plus the set of OIDs
/// marked critical.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extensions {
    pub basic_constraints: Option<BasicConstraints>,
    pub key_usage: Option<KeyUsage>,
    pub extended_key_usage: Option<Vec<ObjectIdentifier>>,
    pub name_constraints: Option<NameConstraints>,
    pub certificate_policies: Option<Vec<PolicyInformation>>,
    pub policy_mappings: Option<Vec<PolicyMapping>>,
    pub policy_constraints: Option<PolicyConstraints>,
    pub inhibit_any_policy: Option<u32>,
    pub authority_key_id: Option<Vec<u8>>,
    pub subject_key_id: Option<Vec<u8>>,
    pub subject_alt_names: Option<Vec<GeneralName>>,
    pub crl_distribution_points: Option<Vec<DistributionPoint>>,
    pub authority_info_access: Vec<AccessDescription>,
    pub ocsp_no_check: bool,
    pub critical: BTreeSet<ObjectIdentifier>,
}

//! Revocation status checking against CRLs (RFC 5280 6.3) and OCSP
//! responders (RFC 6960).

pub mod config;
pub mod crl;
pub mod engine;
pub mod ocsp;

use crate::cert::{Certificate, DistinguishedName, PublicKey, RevocationReason, TrustAnchor};
use chrono::{DateTime, Utc};

pub use config::{RevocationConfig, RevocationMode};
pub use engine::{RevocationContext, RevocationEngine};

/// The issuer of the certificate being checked: what its revocation
/// information must be signed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerInfo {
    pub name: DistinguishedName,
    pub public_key: PublicKey,
    pub key_id: Option<Vec<u8>>,
    /// Whether the issuer key may verify CRLs.
    pub crl_sign: bool,
}

impl IssuerInfo {
    pub fn from_anchor(anchor: &TrustAnchor) -> Self {
        Self {
            name: anchor.name().clone(),
            public_key: anchor.public_key().clone(),
            key_id: anchor
                .certificate()
                .and_then(|c| c.extensions().subject_key_id.clone()),
            crl_sign: anchor.crl_sign(),
        }
    }

    pub fn from_certificate(cert: &Certificate) -> Self {
        Self {
            name: cert.subject().clone(),
            public_key: cert.public_key().clone(),
            key_id: cert.extensions().subject_key_id.clone(),
            crl_sign: cert.key_usage().is_none_or(|ku| ku.crl_sign()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationStatus {
    Good,
    Revoked {
        reason: RevocationReason,
        revocation_time: DateTime<Utc>,
    },
    Undetermined {
        message: String,
        /// Every source that failed, failed for network reasons.
        network: bool,
    },
}

impl RevocationStatus {
    pub(crate) fn undetermined(message: impl Into<String>, network: bool) -> Self {
        RevocationStatus::Undetermined {
            message: message.into(),
            network,
        }
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, RevocationStatus::Revoked { .. })
    }

    fn outcome(&self) -> &'static str {
        match self {
            RevocationStatus::Good => "good",
            RevocationStatus::Revoked { .. } => "revoked",
            RevocationStatus::Undetermined { network: true, .. } => "network_failure",
            RevocationStatus::Undetermined { .. } => "undetermined",
        }
    }
}

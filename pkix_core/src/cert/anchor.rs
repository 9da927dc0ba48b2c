use crate::cert::certificate::{Certificate, PublicKey};
use crate::cert::extensions::NameConstraints;
use crate::cert::name::DistinguishedName;
use std::fmt;
use std::sync::Arc;

/// A point of trust: either a certificate, or a name and key trusted directly.
#[derive(Clone, Debug, PartialEq)]
pub enum TrustAnchor {
    Certificate(Arc<Certificate>),
    PublicKey {
        name: DistinguishedName,
        public_key: PublicKey,
        name_constraints: Option<NameConstraints>,
    },
}

impl TrustAnchor {
    pub fn from_certificate(cert: Certificate) -> Self {
        TrustAnchor::Certificate(Arc::new(cert))
    }

    pub fn from_public_key(name: DistinguishedName, public_key: PublicKey) -> Self {
        TrustAnchor::PublicKey {
            name,
            public_key,
            name_constraints: None,
        }
    }

    pub fn name(&self) -> &DistinguishedName {
        match self {
            TrustAnchor::Certificate(cert) => cert.subject(),
            TrustAnchor::PublicKey { name, .. } => name,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        match self {
            TrustAnchor::Certificate(cert) => cert.public_key(),
            TrustAnchor::PublicKey { public_key, .. } => public_key,
        }
    }

    pub fn certificate(&self) -> Option<&Arc<Certificate>> {
        match self {
            TrustAnchor::Certificate(cert) => Some(cert),
            TrustAnchor::PublicKey { .. } => None,
        }
    }

    /// Constraints configured on a key anchor. Extensions of an anchor
    /// certificate are not processed.
    pub fn name_constraints(&self) -> Option<&NameConstraints> {
        match self {
            TrustAnchor::Certificate(_) => None,
            TrustAnchor::PublicKey {
                name_constraints, ..
            } => name_constraints.as_ref(),
        }
    }

    /// Whether the anchor key may verify CRLs.
    pub fn crl_sign(&self) -> bool {
        match self {
            TrustAnchor::Certificate(cert) => cert.key_usage().is_none_or(|ku| ku.crl_sign()),
            TrustAnchor::PublicKey { .. } => true,
        }
    }

    pub fn is_certificate(&self, cert: &Certificate) -> bool {
        matches!(self, TrustAnchor::Certificate(anchor) if anchor.as_ref() == cert)
    }
}

impl fmt::Display for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustAnchor::Certificate(cert) => write!(f, "anchor certificate {}", cert.subject()),
            TrustAnchor::PublicKey { name, .. } => write!(f, "anchor key {name}"),
        }
    }
}

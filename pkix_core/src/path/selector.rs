use crate::cert::{Certificate, Crl, DistinguishedName, GeneralName, KeyUsage};
use crate::checker::name_constraints;
use chrono::{DateTime, Utc};
use const_oid::ObjectIdentifier;
use std::sync::Arc;

/// Criteria a certificate must satisfy. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CertSelector {
    /// An exact certificate; when set it is also used as the target itself.
    pub certificate: Option<Arc<Certificate>>,
    pub subject: Option<DistinguishedName>,
    pub issuer: Option<DistinguishedName>,
    pub serial: Option<Vec<u8>>,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
    /// Bits that must all be asserted when the certificate carries KeyUsage.
    pub key_usage: Option<KeyUsage>,
    /// Purposes that must all be present when the certificate carries
    /// ExtendedKeyUsage.
    pub extended_key_usage: Vec<ObjectIdentifier>,
    pub valid_at: Option<DateTime<Utc>>,
    pub ca_only: bool,
    /// Names the certificate's NameConstraints must permit.
    pub path_to_names: Vec<GeneralName>,
}

impl CertSelector {
    pub fn for_certificate(cert: Arc<Certificate>) -> Self {
        Self {
            certificate: Some(cert),
            ..Self::default()
        }
    }

    pub fn for_subject(subject: DistinguishedName) -> Self {
        Self {
            subject: Some(subject),
            ..Self::default()
        }
    }

    pub fn with_issuer(mut self, issuer: DistinguishedName) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn with_key_usage(mut self, bits: u16) -> Self {
        self.key_usage = Some(KeyUsage(bits));
        self
    }

    pub fn with_extended_key_usage(mut self, purpose: ObjectIdentifier) -> Self {
        self.extended_key_usage.push(purpose);
        self
    }

    pub fn with_valid_at(mut self, date: DateTime<Utc>) -> Self {
        self.valid_at = Some(date);
        self
    }

    pub fn with_ca_only(mut self) -> Self {
        self.ca_only = true;
        self
    }

    /// Subject the selector is looking for, from either the exact
    /// certificate or the subject criterion.
    pub fn target_subject(&self) -> Option<&DistinguishedName> {
        self.certificate
            .as_deref()
            .map(Certificate::subject)
            .or(self.subject.as_ref())
    }

    pub fn matches(&self, cert: &Certificate) -> bool {
        if let Some(wanted) = &self.certificate
            && wanted.as_ref() != cert
        {
            return false;
        }
        if self.subject.as_ref().is_some_and(|s| s != cert.subject()) {
            return false;
        }
        if self.issuer.as_ref().is_some_and(|i| i != cert.issuer()) {
            return false;
        }
        if self.serial.as_deref().is_some_and(|s| s != cert.serial()) {
            return false;
        }
        if let Some(skid) = &self.subject_key_id
            && cert.extensions().subject_key_id.as_ref() != Some(skid)
        {
            return false;
        }
        if let Some(akid) = &self.authority_key_id
            && cert.extensions().authority_key_id.as_ref() != Some(akid)
        {
            return false;
        }
        if let (Some(wanted), Some(actual)) = (self.key_usage, cert.key_usage())
            && !actual.contains(wanted.0)
        {
            return false;
        }
        if let Some(ekus) = &cert.extensions().extended_key_usage
            && !ekus.contains(&crate::cert::oid::ANY_EXTENDED_KEY_USAGE)
            && !self.extended_key_usage.iter().all(|p| ekus.contains(p))
        {
            return false;
        }
        if self.valid_at.is_some_and(|date| !cert.is_valid_at(date)) {
            return false;
        }
        if self.ca_only && !cert.is_ca() {
            return false;
        }
        if let Some(nc) = &cert.extensions().name_constraints
            && !self
                .path_to_names
                .iter()
                .all(|name| name_constraints::permits(nc, name))
        {
            return false;
        }
        true
    }
}

/// Criteria for CRLs held in a store.
#[derive(Debug, Clone, Default)]
pub struct CrlSelector {
    /// Any of these issuers; empty matches every issuer.
    pub issuers: Vec<DistinguishedName>,
    /// A date within `[this_update, next_update]`.
    pub date: Option<DateTime<Utc>>,
    /// The certificate whose status is being checked, for stores that index
    /// by distribution point.
    pub certificate_checking: Option<Arc<Certificate>>,
}

impl CrlSelector {
    pub fn for_issuers(issuers: Vec<DistinguishedName>) -> Self {
        Self {
            issuers,
            ..Self::default()
        }
    }

    pub fn matches(&self, crl: &Crl) -> bool {
        if !self.issuers.is_empty() && !self.issuers.contains(crl.issuer()) {
            return false;
        }
        if let Some(date) = self.date {
            if crl.this_update() > date {
                return false;
            }
            if crl.next_update().is_some_and(|next| next < date) {
                return false;
            }
        }
        true
    }
}

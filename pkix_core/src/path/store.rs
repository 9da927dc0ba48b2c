use crate::cert::{Certificate, Crl};
use crate::path::selector::{CertSelector, CrlSelector};
use std::sync::Arc;

/// Source of candidate certificates and CRLs for path building.
pub trait CertStore: Send + Sync + std::fmt::Debug {
    fn certificates(&self, selector: &CertSelector) -> Vec<Arc<Certificate>>;

    fn crls(&self, selector: &CrlSelector) -> Vec<Arc<Crl>>;
}

/// In-memory store. Results keep insertion order.
#[derive(Debug, Default, Clone)]
pub struct CollectionCertStore {
    certificates: Vec<Arc<Certificate>>,
    crls: Vec<Arc<Crl>>,
}

impl CollectionCertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_certificates(certificates: impl IntoIterator<Item = Certificate>) -> Self {
        Self {
            certificates: certificates.into_iter().map(Arc::new).collect(),
            crls: Vec::new(),
        }
    }

    pub fn add_certificate(&mut self, cert: Certificate) -> &mut Self {
        self.certificates.push(Arc::new(cert));
        self
    }

    pub fn add_crl(&mut self, crl: Crl) -> &mut Self {
        self.crls.push(Arc::new(crl));
        self
    }

    pub fn len(&self) -> usize {
        self.certificates.len() + self.crls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CertStore for CollectionCertStore {
    fn certificates(&self, selector: &CertSelector) -> Vec<Arc<Certificate>> {
        self.certificates
            .iter()
            .filter(|c| selector.matches(c))
            .cloned()
            .collect()
    }

    fn crls(&self, selector: &CrlSelector) -> Vec<Arc<Crl>> {
        self.crls
            .iter()
            .filter(|c| selector.matches(c))
            .cloned()
            .collect()
    }
}

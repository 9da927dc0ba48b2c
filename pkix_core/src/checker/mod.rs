//! The certificate checker pipeline run for every certificate of a path.

pub mod algorithm;
pub mod basic;
pub mod constraints;
pub mod key;
pub mod name_constraints;
pub mod policy;
pub(crate) mod policy_tree;
pub mod revocation;

use crate::cert::{Certificate, TrustAnchor};
use crate::crypto::{AlgorithmPolicy, SignatureVerifier};
use crate::error::{PkixError, UnrecognizedCriticalExtensionSnafu};
use crate::path::selector::CertSelector;
use crate::path::state::ValidationState;
use crate::path::store::CertStore;
use crate::revocation::{IssuerInfo, RevocationEngine};
use chrono::{DateTime, Utc};
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;
use std::sync::Arc;

pub use algorithm::AlgorithmChecker;
pub use basic::BasicChecker;
pub use constraints::ConstraintsChecker;
pub use key::KeyChecker;
pub use name_constraints::NameConstraintsChecker;
pub use policy::{PolicyChecker, PolicyParameters};
pub use policy_tree::PolicyNode;
pub use revocation::RevocationChecker;

pub type CheckResult = Result<(), PkixError>;

/// One step of path validation. Checkers are stateless; everything that
/// carries from one certificate to the next lives in `ValidationState`.
pub trait CertPathChecker: std::fmt::Debug + Send + Sync {
    /// Called before a path is processed, with the processing direction.
    fn init(&self, _forward: bool) -> CheckResult {
        Ok(())
    }

    /// Whether `check` can run target-to-anchor, seeing only the certificate
    /// and its issuer.
    fn is_forward_checking_supported(&self) -> bool {
        false
    }

    /// Critical extensions this checker processes.
    fn supported_extensions(&self) -> &[ObjectIdentifier] {
        &[]
    }

    fn check(
        &self,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        state: &mut ValidationState,
        unresolved: &mut BTreeSet<ObjectIdentifier>,
    ) -> CheckResult;
}

/// Everything a checker may consult besides the mutable state.
#[derive(Debug, Clone)]
pub struct CheckContext<'a> {
    pub date: DateTime<Utc>,
    /// 1-based position counted from the anchor; zero in forward checks,
    /// where it is not yet known.
    pub index: usize,
    pub is_target: bool,
    pub anchor: Option<&'a TrustAnchor>,
    /// Issuer of the certificate, as it was before the certificate was
    /// processed.
    pub issuer: IssuerInfo,
    pub verifier: &'a dyn SignatureVerifier,
    pub algorithms: &'a AlgorithmPolicy,
    pub target: &'a CertSelector,
    pub policy: &'a PolicyParameters,
    pub anchors: &'a [TrustAnchor],
    pub stores: &'a [Arc<dyn CertStore>],
    /// Certificates already being validated further up the call stack.
    pub stacked: &'a [Arc<Certificate>],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Every checker, then the unresolved critical extension check.
    All,
    /// Forward-capable checkers only, during target-to-anchor search.
    ForwardOnly,
    /// The remaining checkers plus the critical extension check, once a
    /// forward path is complete.
    Deferred,
}

/// Checkers in their standard order followed by caller-supplied ones.
#[derive(Debug, Clone)]
pub struct CheckerPipeline {
    checkers: Vec<Arc<dyn CertPathChecker>>,
}

impl CheckerPipeline {
    pub fn standard(
        revocation: Option<Arc<RevocationEngine>>,
        extra: &[Arc<dyn CertPathChecker>],
    ) -> Self {
        let mut checkers: Vec<Arc<dyn CertPathChecker>> = vec![
            Arc::new(AlgorithmChecker),
            Arc::new(KeyChecker),
            Arc::new(BasicChecker),
            Arc::new(NameConstraintsChecker),
            Arc::new(ConstraintsChecker),
            Arc::new(PolicyChecker),
        ];
        if let Some(engine) = revocation {
            checkers.push(Arc::new(RevocationChecker::new(engine)));
        }
        checkers.extend(extra.iter().cloned());
        Self { checkers }
    }

    pub fn checkers(&self) -> &[Arc<dyn CertPathChecker>] {
        &self.checkers
    }

    pub fn init(&self, forward: bool) -> CheckResult {
        self.checkers.iter().try_for_each(|c| c.init(forward))
    }

    pub fn run(
        &self,
        phase: Phase,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        state: &mut ValidationState,
    ) -> CheckResult {
        let mut unresolved: BTreeSet<ObjectIdentifier> =
            cert.critical_extension_oids().copied().collect();
        for checker in &self.checkers {
            let selected = match phase {
                Phase::All => true,
                Phase::ForwardOnly => checker.is_forward_checking_supported(),
                Phase::Deferred => !checker.is_forward_checking_supported(),
            };
            if selected {
                checker.check(cert, ctx, state, &mut unresolved)?;
            }
        }
        if phase == Phase::ForwardOnly {
            return Ok(());
        }
        for checker in &self.checkers {
            for oid in checker.supported_extensions() {
                unresolved.remove(oid);
            }
        }
        if !unresolved.is_empty() {
            return UnrecognizedCriticalExtensionSnafu {
                subject: cert.subject().to_string(),
                oids: unresolved.iter().map(|o| o.to_string()).collect::<Vec<_>>(),
            }
            .fail();
        }
        state.certs_processed += 1;
        Ok(())
    }
}

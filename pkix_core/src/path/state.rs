//! Per-branch search state. Cloned at every fork of the depth-first search;
//! the policy tree and accumulated name constraints are shared until written.

use crate::cert::{
    Certificate, DistinguishedName, GeneralName, NameConstraints, PublicKey, TrustAnchor,
};
use crate::checker::name_constraints;
use crate::checker::policy::PolicyParameters;
use crate::checker::policy_tree::{PolicyNode, PolicyTree};
use crate::revocation::IssuerInfo;
use std::sync::Arc;

/// RFC 5280 6.1.2 policy variables. `None` counters are unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyState {
    pub explicit_policy: Option<u32>,
    pub policy_mapping: Option<u32>,
    pub inhibit_any_policy: Option<u32>,
    pub(crate) tree: Option<Arc<PolicyTree>>,
}

impl PolicyState {
    pub fn new(params: &PolicyParameters) -> Self {
        let initial = |constrained: bool| if constrained { Some(0) } else { None };
        Self {
            explicit_policy: initial(params.explicit_policy_required),
            policy_mapping: initial(params.policy_mapping_inhibited),
            inhibit_any_policy: initial(params.any_policy_inhibited),
            tree: Some(Arc::new(PolicyTree::new())),
        }
    }

    pub fn tree(&self) -> Option<PolicyNode> {
        self.tree.as_ref().map(|t| t.to_node())
    }

    pub fn has_valid_policy(&self) -> bool {
        self.tree.is_some()
    }
}

pub(crate) fn is_zero(counter: Option<u32>) -> bool {
    counter == Some(0)
}

pub(crate) fn decrement(counter: &mut Option<u32>) {
    if let Some(value) = counter {
        *value = value.saturating_sub(1);
    }
}

/// Lowers `counter` to `limit` when `limit` is tighter.
pub(crate) fn tighten(counter: &mut Option<u32>, limit: u32) {
    if counter.is_none_or(|current| limit < current) {
        *counter = Some(limit);
    }
}

/// Accumulated NameConstraints. A name must be permitted by every entry
/// (intersection of permitted subtrees) and excluded by none (union of
/// excluded subtrees).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameConstraintsState {
    constraints: Vec<Arc<NameConstraints>>,
}

impl NameConstraintsState {
    pub fn from_anchor(anchor: &TrustAnchor) -> Self {
        let mut state = Self::default();
        if let Some(nc) = anchor.name_constraints() {
            state.add(nc.clone());
        }
        state
    }

    pub fn add(&mut self, constraints: NameConstraints) {
        self.constraints.push(Arc::new(constraints));
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn permits(&self, name: &GeneralName) -> bool {
        self.constraints
            .iter()
            .all(|nc| name_constraints::permits(nc, name))
    }
}

/// Anchor-to-target validation state (RFC 5280 6.1.2).
#[derive(Debug, Clone)]
pub struct ValidationState {
    pub working_issuer_name: DistinguishedName,
    pub working_public_key: PublicKey,
    pub working_key_id: Option<Vec<u8>>,
    /// Non-self-issued CA certificates that may still follow; `None` while
    /// no pathLenConstraint has applied.
    pub remaining_ca_certs: Option<u32>,
    pub policy: PolicyState,
    pub name_constraints: NameConstraintsState,
    pub crl_sign: bool,
    pub certs_processed: usize,
}

impl ValidationState {
    pub fn new(anchor: &TrustAnchor, params: &PolicyParameters) -> Self {
        Self {
            working_issuer_name: anchor.name().clone(),
            working_public_key: anchor.public_key().clone(),
            working_key_id: anchor
                .certificate()
                .and_then(|c| c.extensions().subject_key_id.clone()),
            remaining_ca_certs: None,
            policy: PolicyState::new(params),
            name_constraints: NameConstraintsState::from_anchor(anchor),
            crl_sign: anchor.crl_sign(),
            certs_processed: 0,
        }
    }

    /// State seeded from a known issuer only. Forward-direction checks use
    /// it; they must not rely on anything accumulated from the anchor.
    pub fn for_issuer(issuer: &IssuerInfo) -> Self {
        Self {
            working_issuer_name: issuer.name.clone(),
            working_public_key: issuer.public_key.clone(),
            working_key_id: issuer.key_id.clone(),
            remaining_ca_certs: None,
            policy: PolicyState::new(&PolicyParameters::default()),
            name_constraints: NameConstraintsState::default(),
            crl_sign: issuer.crl_sign,
            certs_processed: 0,
        }
    }

    /// Issuer of the next certificate, as seen by revocation checking.
    pub fn issuer(&self) -> IssuerInfo {
        IssuerInfo {
            name: self.working_issuer_name.clone(),
            public_key: self.working_public_key.clone(),
            key_id: self.working_key_id.clone(),
            crl_sign: self.crl_sign,
        }
    }

    /// Makes `cert` the working certificate.
    pub fn advance(&mut self, cert: &Certificate) {
        self.working_issuer_name = cert.subject().clone();
        self.working_public_key = cert.public_key().clone();
        self.working_key_id = cert.extensions().subject_key_id.clone();
        self.crl_sign = cert.key_usage().is_none_or(|ku| ku.crl_sign());
    }
}

/// Target-to-anchor search state.
#[derive(Debug, Clone)]
pub struct ForwardState {
    /// Issuer name of the most recently added certificate.
    pub issuer_name: DistinguishedName,
    /// Non-self-issued intermediates added so far.
    pub intermediates: u32,
    /// Names of the certificates added so far that NameConstraints of a
    /// later CA must permit.
    pub constrained_names: Arc<Vec<GeneralName>>,
}

impl ForwardState {
    pub fn new(target: &Certificate) -> Self {
        Self {
            issuer_name: target.issuer().clone(),
            intermediates: 0,
            constrained_names: Arc::new(names_of(target)),
        }
    }

    /// Records `cert` as the new top of the forward path.
    pub fn advance(&mut self, cert: &Certificate) {
        self.issuer_name = cert.issuer().clone();
        if !cert.is_self_issued() {
            self.intermediates += 1;
            Arc::make_mut(&mut self.constrained_names).extend(names_of(cert));
        }
    }
}

/// Subject DN, subjectAltNames and legacy emailAddress attributes.
pub(crate) fn names_of(cert: &Certificate) -> Vec<GeneralName> {
    let mut names = Vec::new();
    if !cert.subject().is_empty() {
        names.push(GeneralName::Directory(cert.subject().clone()));
    }
    names.extend(
        cert.subject()
            .email_addresses()
            .into_iter()
            .map(GeneralName::Rfc822),
    );
    if let Some(alt) = &cert.extensions().subject_alt_names {
        names.extend(alt.iter().cloned());
    }
    names
}

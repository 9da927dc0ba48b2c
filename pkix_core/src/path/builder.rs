//! Depth-first certification path search, target-to-anchor (forward) or
//! anchor-to-target (reverse).

use crate::cert::{Certificate, DistinguishedName, PublicKey, TrustAnchor};
use crate::checker::{
    CertPathChecker, CheckContext, CheckerPipeline, Phase, PolicyNode, PolicyParameters,
};
use crate::config::PathConfig;
use crate::crypto::{AlgorithmPolicy, AwsLcVerifier, SignatureVerifier};
use crate::error::{
    BuildFailure, InvalidKeyUsageSnafu, InvalidNameConstraintsSnafu, LoopDetectedSnafu,
    NoPathFoundSnafu, NoTrustAnchorSnafu, NotCaCertificateSnafu, PathTooLongSnafu, PkixError,
    SignatureInvalidSnafu,
};
use crate::path::selector::CertSelector;
use crate::path::state::{ForwardState, ValidationState};
use crate::path::store::CertStore;
use crate::path::vertex::AdjacencyList;
use crate::revocation::{IssuerInfo, RevocationContext, RevocationEngine};
use crate::validator::{self, PathFailure};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::{KeyValue, global};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Intermediates allowed on one branch regardless of configuration.
pub const MAX_SEARCH_DEPTH: usize = 64;

#[derive(Debug, Clone)]
struct BuildMetrics {
    build_total: Counter<u64>,
}

impl BuildMetrics {
    fn init(meter: &Meter) -> Self {
        Self {
            build_total: meter.u64_counter("path_build_total").build(),
        }
    }
}

fn metrics() -> &'static BuildMetrics {
    static METRICS: OnceCell<BuildMetrics> = OnceCell::new();
    METRICS.get_or_init(|| {
        let meter = global::meter("pkix_core.path");
        BuildMetrics::init(&meter)
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildDirection {
    /// Target to anchor.
    #[default]
    Forward,
    /// Anchor to target.
    Reverse,
}

/// Everything a build needs. `stacked` lists certificates whose own
/// validation is in progress; they are never used as candidates.
#[derive(Debug, Clone)]
pub struct BuildParameters {
    pub target: CertSelector,
    pub anchors: Vec<TrustAnchor>,
    pub stores: Vec<Arc<dyn CertStore>>,
    pub direction: BuildDirection,
    pub date: DateTime<Utc>,
    /// Maximum number of intermediate certificates; `None` is unlimited.
    pub max_path_length: Option<usize>,
    pub policy: PolicyParameters,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub algorithms: AlgorithmPolicy,
    pub revocation: Option<Arc<RevocationEngine>>,
    /// Run after the standard checkers.
    pub checkers: Vec<Arc<dyn CertPathChecker>>,
    pub stacked: Vec<Arc<Certificate>>,
}

impl BuildParameters {
    pub fn new(target: CertSelector, anchors: Vec<TrustAnchor>) -> Self {
        let config = PathConfig::default();
        Self {
            target,
            anchors,
            stores: Vec::new(),
            direction: config.direction,
            date: Utc::now(),
            max_path_length: config.max_path_length,
            policy: config.policy,
            verifier: Arc::new(AwsLcVerifier),
            algorithms: AlgorithmPolicy::default(),
            revocation: None,
            checkers: Vec::new(),
            stacked: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: &PathConfig) -> Self {
        self.direction = config.direction;
        self.max_path_length = config.max_path_length;
        self.policy = config.policy.clone();
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CertStore>) -> Self {
        self.stores.push(store);
        self
    }

    pub fn with_direction(mut self, direction: BuildDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_algorithms(mut self, algorithms: AlgorithmPolicy) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_revocation(mut self, engine: Arc<RevocationEngine>) -> Self {
        self.revocation = Some(engine);
        self
    }

    pub fn with_checker(mut self, checker: Arc<dyn CertPathChecker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub(crate) fn inputs(&self) -> SearchInputs<'_> {
        SearchInputs {
            target: &self.target,
            anchors: &self.anchors,
            stores: &self.stores,
            direction: self.direction,
            date: self.date,
            max_path_length: self.max_path_length,
            policy: &self.policy,
            verifier: self.verifier.as_ref(),
            algorithms: &self.algorithms,
            revocation: self.revocation.clone(),
            checkers: &self.checkers,
            stacked: &self.stacked,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Target first; the last certificate is issued by the trust anchor.
    /// Empty when the target is itself an anchor certificate.
    pub path: Vec<Arc<Certificate>>,
    pub trust_anchor: TrustAnchor,
    pub policy_tree: Option<PolicyNode>,
    /// Public key of the target.
    pub public_key: PublicKey,
    pub adjacency: AdjacencyList,
}

/// Borrowed build inputs, shared by top-level builds and the nested builds
/// made for CRL signers.
#[derive(Clone)]
pub(crate) struct SearchInputs<'a> {
    pub target: &'a CertSelector,
    pub anchors: &'a [TrustAnchor],
    pub stores: &'a [Arc<dyn CertStore>],
    pub direction: BuildDirection,
    pub date: DateTime<Utc>,
    pub max_path_length: Option<usize>,
    pub policy: &'a PolicyParameters,
    pub verifier: &'a dyn SignatureVerifier,
    pub algorithms: &'a AlgorithmPolicy,
    pub revocation: Option<Arc<RevocationEngine>>,
    pub checkers: &'a [Arc<dyn CertPathChecker>],
    pub stacked: &'a [Arc<Certificate>],
}

static NO_POLICY_CONSTRAINTS: PolicyParameters = PolicyParameters {
    initial_policies: BTreeSet::new(),
    explicit_policy_required: false,
    policy_mapping_inhibited: false,
    any_policy_inhibited: false,
    reject_policy_qualifiers: false,
};

impl<'a> SearchInputs<'a> {
    pub fn for_crl_signer(
        target: &'a CertSelector,
        ctx: &RevocationContext<'a>,
        stacked: &'a [Arc<Certificate>],
    ) -> Self {
        Self {
            target,
            anchors: ctx.anchors,
            stores: ctx.stores,
            direction: BuildDirection::Forward,
            date: ctx.date,
            max_path_length: PathConfig::default().max_path_length,
            policy: &NO_POLICY_CONSTRAINTS,
            verifier: ctx.verifier,
            algorithms: ctx.algorithms,
            revocation: ctx.revocation.clone(),
            checkers: &[],
            stacked,
        }
    }

    pub fn context(
        &self,
        index: usize,
        is_target: bool,
        anchor: Option<&'a TrustAnchor>,
        issuer: IssuerInfo,
    ) -> CheckContext<'a> {
        CheckContext {
            date: self.date,
            index,
            is_target,
            anchor,
            issuer,
            verifier: self.verifier,
            algorithms: self.algorithms,
            target: self.target,
            policy: self.policy,
            anchors: self.anchors,
            stores: self.stores,
            stacked: self.stacked,
        }
    }

    pub fn pipeline(&self) -> CheckerPipeline {
        CheckerPipeline::standard(self.revocation.clone(), self.checkers)
    }
}

/// Entry point for path building.
#[derive(Debug, Default)]
pub struct PathBuilder;

impl PathBuilder {
    pub fn build(params: &BuildParameters) -> Result<BuildResult, BuildFailure> {
        search(params.inputs())
    }
}

pub(crate) fn search(inputs: SearchInputs<'_>) -> Result<BuildResult, BuildFailure> {
    let direction = inputs.direction;
    let mut search = Search::new(inputs);
    let outcome = search.run();
    let label = if outcome.is_ok() { "success" } else { "failure" };
    metrics().build_total.add(
        1,
        &[
            KeyValue::new("outcome", label),
            KeyValue::new("direction", format!("{direction:?}").to_lowercase()),
        ],
    );
    outcome
}

struct Failure {
    error: PkixError,
    path_length: usize,
    certificate: Option<String>,
}

/// A candidate path under construction, with the adjacency vertex of each
/// certificate.
#[derive(Clone, Default)]
struct Branch {
    certs: Vec<Arc<Certificate>>,
    vertices: Vec<usize>,
}

impl Branch {
    fn push(&mut self, cert: Arc<Certificate>, vertex: usize) {
        self.certs.push(cert);
        self.vertices.push(vertex);
    }

    fn pop(&mut self) {
        self.certs.pop();
        self.vertices.pop();
    }

    fn len(&self) -> usize {
        self.certs.len()
    }
}

struct Search<'a> {
    inputs: SearchInputs<'a>,
    pipeline: CheckerPipeline,
    adjacency: AdjacencyList,
    best: Option<Failure>,
}

impl<'a> Search<'a> {
    fn new(inputs: SearchInputs<'a>) -> Self {
        let pipeline = inputs.pipeline();
        Self {
            inputs,
            pipeline,
            adjacency: AdjacencyList::new(),
            best: None,
        }
    }

    fn run(&mut self) -> Result<BuildResult, BuildFailure> {
        let targets = self.targets();
        tracing::debug!(target: "pkix_core::path", "Building {:?} from {} target candidate(s) and {} anchor(s)", self.inputs.direction, targets.len(), self.inputs.anchors.len());
        if let Some(result) = self.anchor_target(&targets) {
            return Ok(result);
        }

        let found = match self.inputs.direction {
            BuildDirection::Forward => self.forward(&targets),
            BuildDirection::Reverse => self.reverse(),
        };
        match found {
            Some(result) => {
                tracing::debug!(target: "pkix_core::path", "Built a path of {} certificate(s) to {}", result.path.len(), result.trust_anchor);
                Ok(result)
            }
            None => Err(self.failure(targets.is_empty())),
        }
    }

    fn failure(&mut self, no_targets: bool) -> BuildFailure {
        let adjacency = std::mem::take(&mut self.adjacency);
        let failure = self.best.take().unwrap_or_else(|| Failure {
            error: NoPathFoundSnafu {
                message: if no_targets {
                    "no certificate matches the target selector"
                } else {
                    "no candidate certificate was found"
                },
            }
            .build(),
            path_length: 0,
            certificate: None,
        });
        tracing::debug!(target: "pkix_core::path", "Path building failed: {}", failure.error);
        BuildFailure {
            error: failure.error,
            path_length: failure.path_length,
            certificate: failure.certificate,
            adjacency,
        }
    }

    /// Keeps the most specific failure; later failures win ties.
    fn record(&mut self, error: PkixError, path_length: usize, cert: &Certificate) {
        if self
            .best
            .as_ref()
            .is_none_or(|best| error.specificity() >= best.error.specificity())
        {
            self.best = Some(Failure {
                error,
                path_length,
                certificate: Some(cert.subject().to_string()),
            });
        }
    }

    fn reject(&mut self, vertex: usize, error: PkixError, path_length: usize, cert: &Certificate) {
        tracing::trace!(target: "pkix_core::path", "Rejected {}: {error}", cert.subject());
        self.adjacency.reject(vertex, &error);
        self.record(error, path_length, cert);
    }

    fn query(&self, selector: &CertSelector) -> Vec<Arc<Certificate>> {
        let mut found: Vec<Arc<Certificate>> = Vec::new();
        for store in self.inputs.stores {
            for cert in store.certificates(selector) {
                if !found.contains(&cert) {
                    found.push(cert);
                }
            }
        }
        found
    }

    fn targets(&self) -> Vec<Arc<Certificate>> {
        match &self.inputs.target.certificate {
            Some(cert) => vec![cert.clone()],
            None => self.query(self.inputs.target),
        }
    }

    fn is_stacked(&self, cert: &Certificate) -> bool {
        self.inputs.stacked.iter().any(|c| c.as_ref() == cert)
    }

    /// A target that is itself an anchor certificate needs no path.
    fn anchor_target(&mut self, targets: &[Arc<Certificate>]) -> Option<BuildResult> {
        let anchors = self.inputs.anchors;
        for target in targets {
            if let Some(anchor) = anchors.iter().find(|a| a.is_certificate(target)) {
                match validator::walk(&self.inputs, &self.pipeline, Phase::All, anchor, &[]) {
                    Ok(state) => return Some(self.result(Vec::new(), anchor, state)),
                    Err(failure) => self.record(failure.error, 0, target),
                }
            }
        }
        None
    }

    fn result(
        &mut self,
        path: Vec<Arc<Certificate>>,
        anchor: &TrustAnchor,
        state: ValidationState,
    ) -> BuildResult {
        let public_key = path
            .first()
            .map(|c| c.public_key().clone())
            .unwrap_or_else(|| anchor.public_key().clone());
        BuildResult {
            path,
            trust_anchor: anchor.clone(),
            policy_tree: state.policy.tree(),
            public_key,
            adjacency: std::mem::take(&mut self.adjacency),
        }
    }

    /// Rejects `cert` if it already occurs in the branch. One repetition is
    /// tolerated when policy mapping is allowed and a certificate after the
    /// earlier occurrence maps policies.
    fn check_loop(&self, certs: &[Arc<Certificate>], cert: &Certificate) -> Result<(), PkixError> {
        let looped = || {
            LoopDetectedSnafu {
                subject: cert.subject().to_string(),
            }
            .fail()
        };
        if self.is_stacked(cert) {
            return looped();
        }
        let mut occurrences = certs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_ref() == cert)
            .map(|(pos, _)| pos);
        let Some(first) = occurrences.next() else {
            return Ok(());
        };
        if occurrences.next().is_some() || self.inputs.policy.policy_mapping_inhibited {
            return looped();
        }
        if !certs[first + 1..].iter().any(|c| c.has_policy_mappings()) {
            return looped();
        }
        Ok(())
    }

    /// Applies the configured length limit, and [`MAX_SEARCH_DEPTH`] when
    /// the length is unlimited.
    fn exceeds_max_length(&self, intermediates: usize, cert: &Certificate) -> Result<(), PkixError> {
        let max = self
            .inputs
            .max_path_length
            .map_or(MAX_SEARCH_DEPTH, |max| max.min(MAX_SEARCH_DEPTH));
        if intermediates >= max {
            return PathTooLongSnafu {
                subject: cert.subject().to_string(),
            }
            .fail();
        }
        Ok(())
    }

    // Forward search

    fn forward(&mut self, targets: &[Arc<Certificate>]) -> Option<BuildResult> {
        if let Err(e) = self.pipeline.init(true) {
            self.best = Some(Failure {
                error: e,
                path_length: 0,
                certificate: None,
            });
            return None;
        }
        for target in targets {
            if self.is_stacked(target) {
                continue;
            }
            let vertex = self.adjacency.add(target, 0);
            let mut branch = Branch::default();
            branch.push(target.clone(), vertex);
            let state = ForwardState::new(target);
            if let Some(result) = self.extend_forward(&mut branch, &state) {
                return Some(result);
            }
        }
        None
    }

    fn extend_forward(&mut self, branch: &mut Branch, state: &ForwardState) -> Option<BuildResult> {
        let Some(current) = branch.certs.last().cloned() else {
            return None;
        };

        let anchors = self.inputs.anchors;
        let mut matched_anchor = false;
        for anchor in anchors {
            if anchor.name() != current.issuer() && anchor.certificate().is_some() {
                continue;
            }
            if anchor.name() != current.issuer()
                && self
                    .inputs
                    .verifier
                    .verify(
                        anchor.public_key(),
                        current.signature_algorithm(),
                        current.tbs_bytes(),
                        current.signature(),
                    )
                    .is_err()
            {
                continue;
            }
            matched_anchor = true;
            if let Some(result) = self.complete_forward(branch, anchor) {
                return Some(result);
            }
        }

        let selector = CertSelector::for_subject(current.issuer().clone())
            .with_valid_at(self.inputs.date)
            .with_ca_only();
        let candidates = self.sort_forward(&current, self.query(&selector));
        if candidates.is_empty() && !matched_anchor {
            self.record(
                NoTrustAnchorSnafu {
                    subject: current.subject().to_string(),
                }
                .build(),
                branch.len(),
                &current,
            );
        }

        for candidate in candidates {
            let depth = branch.len();
            let vertex = self.adjacency.add(&candidate, depth);
            if let Err(e) = self.accept_forward(branch, state, &candidate) {
                self.reject(vertex, e, depth, &candidate);
                continue;
            }
            let mut next = state.clone();
            next.advance(&candidate);
            branch.push(candidate, vertex);
            if let Some(result) = self.extend_forward(branch, &next) {
                return Some(result);
            }
            branch.pop();
        }
        None
    }

    /// Forward candidates closest to the target first, then those whose
    /// key identifier the current certificate names, then those issued by a
    /// trust anchor. Store order breaks ties.
    fn sort_forward(
        &self,
        current: &Certificate,
        mut candidates: Vec<Arc<Certificate>>,
    ) -> Vec<Arc<Certificate>> {
        let target_subject = self.target_subject(current);
        let akid = current.extensions().authority_key_id.as_ref();
        let anchors = self.inputs.anchors;
        candidates.sort_by_key(|c| {
            let prefix = c.subject().common_prefix_len(&target_subject);
            let key_match = akid.is_some() && c.extensions().subject_key_id.as_ref() == akid;
            let anchored = anchors.iter().any(|a| a.name() == c.issuer());
            Reverse((prefix, key_match, anchored))
        });
        candidates
    }

    fn target_subject(&self, fallback: &Certificate) -> DistinguishedName {
        self.inputs
            .target
            .target_subject()
            .cloned()
            .unwrap_or_else(|| fallback.subject().clone())
    }

    /// Checks that only need the candidate and the certificate it would
    /// issue.
    fn accept_forward(
        &self,
        branch: &Branch,
        state: &ForwardState,
        candidate: &Certificate,
    ) -> Result<(), PkixError> {
        let subject = || candidate.subject().to_string();
        self.check_loop(&branch.certs, candidate)?;
        self.exceeds_max_length(branch.len() - 1, candidate)?;
        if !candidate.is_ca() {
            return NotCaCertificateSnafu { subject: subject() }.fail();
        }
        if candidate.key_usage().is_some_and(|ku| !ku.key_cert_sign()) {
            return InvalidKeyUsageSnafu {
                subject: subject(),
                message: "keyCertSign is not asserted",
            }
            .fail();
        }
        if let Some(limit) = candidate.path_len_constraint() {
            if state.intermediates > limit {
                return PathTooLongSnafu { subject: subject() }.fail();
            }
        }
        if let Some(nc) = &candidate.extensions().name_constraints {
            if let Some(name) = state
                .constrained_names
                .iter()
                .find(|name| !crate::checker::name_constraints::permits(nc, name))
            {
                return InvalidNameConstraintsSnafu {
                    subject: subject(),
                    message: format!("{name} below it is not permitted"),
                }
                .fail();
            }
        }

        let Some(current) = branch.certs.last() else {
            return Ok(());
        };
        self.inputs
            .verifier
            .verify(
                candidate.public_key(),
                current.signature_algorithm(),
                current.tbs_bytes(),
                current.signature(),
            )
            .map_err(|e| {
                SignatureInvalidSnafu {
                    subject: current.subject().to_string(),
                    message: e.to_string(),
                }
                .build()
            })?;
        let issuer = IssuerInfo::from_certificate(candidate);
        self.forward_checks(current, branch.len() == 1, issuer)
    }

    fn forward_checks(
        &self,
        cert: &Certificate,
        is_target: bool,
        issuer: IssuerInfo,
    ) -> Result<(), PkixError> {
        let mut state = ValidationState::for_issuer(&issuer);
        let ctx = self.inputs.context(0, is_target, None, issuer);
        self.pipeline.run(Phase::ForwardOnly, cert, &ctx, &mut state)
    }

    /// Links the top of the branch to `anchor` and runs the deferred
    /// checkers over the finished path.
    fn complete_forward(&mut self, branch: &Branch, anchor: &'a TrustAnchor) -> Option<BuildResult> {
        let current = branch.certs.last()?.clone();
        let top = branch.vertices.last().copied().unwrap_or_default();
        let depth = branch.len();
        let checked = self
            .inputs
            .verifier
            .verify(
                anchor.public_key(),
                current.signature_algorithm(),
                current.tbs_bytes(),
                current.signature(),
            )
            .map_err(|e| {
                SignatureInvalidSnafu {
                    subject: current.subject().to_string(),
                    message: e.to_string(),
                }
                .build()
            })
            .and_then(|_| {
                self.forward_checks(&current, depth == 1, IssuerInfo::from_anchor(anchor))
            });
        if let Err(e) = checked {
            self.reject(top, e, depth, &current);
            return None;
        }

        if let Err(e) = self.pipeline.init(false) {
            self.record(e, depth, &current);
            return None;
        }
        match validator::walk(
            &self.inputs,
            &self.pipeline,
            Phase::Deferred,
            anchor,
            &branch.certs,
        ) {
            Ok(state) => {
                let path = branch.certs.clone();
                Some(self.result(path, anchor, state))
            }
            Err(PathFailure { error, index }) => {
                let failed = &branch.certs[index];
                tracing::debug!(target: "pkix_core::path", "Final pass rejected the path at {}: {error}", failed.subject());
                self.adjacency.reject(top, &error);
                let failed = failed.clone();
                self.record(error, depth, &failed);
                None
            }
        }
    }

    // Reverse search

    fn reverse(&mut self) -> Option<BuildResult> {
        if let Err(e) = self.pipeline.init(false) {
            self.best = Some(Failure {
                error: e,
                path_length: 0,
                certificate: None,
            });
            return None;
        }
        let anchors = self.inputs.anchors;
        for anchor in anchors {
            let state = ValidationState::new(anchor, self.inputs.policy);
            let mut branch = Branch::default();
            if let Some(result) = self.extend_reverse(anchor, &mut branch, &state) {
                return Some(result);
            }
        }
        None
    }

    fn reverse_candidates(&self, issuer: &DistinguishedName) -> Vec<Arc<Certificate>> {
        let selector = CertSelector::default()
            .with_issuer(issuer.clone())
            .with_valid_at(self.inputs.date);
        let mut candidates = self.query(&selector);
        if let Some(target) = &self.inputs.target.certificate {
            if target.issuer() == issuer && !candidates.contains(target) {
                candidates.insert(0, target.clone());
            }
        }
        let target = self.inputs.target;
        let target_subject = target.target_subject().cloned();
        candidates.sort_by_key(|c| {
            let prefix = target_subject
                .as_ref()
                .map(|s| c.subject().common_prefix_len(s))
                .unwrap_or_default();
            Reverse((target.matches(c), prefix))
        });
        candidates
    }

    fn extend_reverse(
        &mut self,
        anchor: &'a TrustAnchor,
        branch: &mut Branch,
        state: &ValidationState,
    ) -> Option<BuildResult> {
        let issuer_name = state.working_issuer_name.clone();
        let candidates = self.reverse_candidates(&issuer_name);
        for candidate in candidates {
            let depth = branch.len();
            let vertex = self.adjacency.add(&candidate, depth);
            if let Err(e) = self.check_loop(&branch.certs, &candidate) {
                self.reject(vertex, e, depth, &candidate);
                continue;
            }

            if self.inputs.target.matches(&candidate) {
                let mut next = state.clone();
                match self.step_reverse(anchor, &candidate, depth, true, &mut next) {
                    Ok(()) => {
                        let mut path = branch.certs.clone();
                        path.push(candidate);
                        path.reverse();
                        return Some(self.result(path, anchor, next));
                    }
                    Err(e) => {
                        self.reject(vertex, e, depth, &candidate);
                        continue;
                    }
                }
            }

            if !candidate.is_ca() {
                continue;
            }
            if let Err(e) = self.exceeds_max_length(depth, &candidate) {
                self.reject(vertex, e, depth, &candidate);
                continue;
            }
            let mut next = state.clone();
            if let Err(e) = self.step_reverse(anchor, &candidate, depth, false, &mut next) {
                self.reject(vertex, e, depth, &candidate);
                continue;
            }
            branch.push(candidate, vertex);
            if let Some(result) = self.extend_reverse(anchor, branch, &next) {
                return Some(result);
            }
            branch.pop();
        }
        None
    }

    fn step_reverse(
        &self,
        anchor: &'a TrustAnchor,
        cert: &Certificate,
        depth: usize,
        is_target: bool,
        state: &mut ValidationState,
    ) -> Result<(), PkixError> {
        let ctx = self
            .inputs
            .context(depth + 1, is_target, Some(anchor), state.issuer());
        self.pipeline.run(Phase::All, cert, &ctx, state)
    }
}

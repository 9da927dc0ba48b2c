//! Validation of an already assembled certification path.

use crate::cert::{Certificate, PublicKey, TrustAnchor};
use crate::checker::{CheckerPipeline, Phase, PolicyNode};
use crate::error::{NoPathFoundSnafu, NoTrustAnchorSnafu, PkixError};
use crate::path::builder::{BuildParameters, SearchInputs};
use crate::path::state::ValidationState;
use std::sync::Arc;

/// Outcome of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub trust_anchor: TrustAnchor,
    pub policy_tree: Option<PolicyNode>,
    /// Public key of the target.
    pub public_key: PublicKey,
}

/// A pipeline failure and the position, counted from the target, of the
/// certificate that caused it.
#[derive(Debug)]
pub(crate) struct PathFailure {
    pub error: PkixError,
    pub index: usize,
}

/// Runs `pipeline` over `path` (target first) in anchor-to-target order.
pub(crate) fn walk<'a>(
    inputs: &SearchInputs<'a>,
    pipeline: &CheckerPipeline,
    phase: Phase,
    anchor: &'a TrustAnchor,
    path: &[Arc<Certificate>],
) -> Result<ValidationState, PathFailure> {
    let mut state = ValidationState::new(anchor, inputs.policy);
    for (pos, cert) in path.iter().rev().enumerate() {
        let index = path.len() - 1 - pos;
        let ctx = inputs.context(pos + 1, index == 0, Some(anchor), state.issuer());
        pipeline
            .run(phase, cert, &ctx, &mut state)
            .map_err(|error| PathFailure { error, index })?;
    }
    Ok(state)
}

/// Validates paths assembled elsewhere, using the anchors, stores and
/// checkers of a [`BuildParameters`]. The direction is ignored.
#[derive(Debug, Default)]
pub struct CertPathValidator;

impl CertPathValidator {
    /// `path` runs from the target to the certificate issued by an anchor.
    pub fn validate(
        path: &[Arc<Certificate>],
        params: &BuildParameters,
    ) -> Result<ValidationResult, PkixError> {
        let Some(top) = path.last() else {
            return NoPathFoundSnafu {
                message: "the certification path is empty",
            }
            .fail();
        };
        let inputs = params.inputs();
        let pipeline = inputs.pipeline();
        pipeline.init(false)?;

        let mut best: Option<PkixError> = None;
        for anchor in inputs.anchors {
            if !issued_by(top, anchor, &inputs) {
                continue;
            }
            match walk(&inputs, &pipeline, Phase::All, anchor, path) {
                Ok(state) => {
                    tracing::debug!(target: "pkix_core::path", "Validated {} certificate(s) against {anchor}", path.len());
                    return Ok(ValidationResult {
                        trust_anchor: anchor.clone(),
                        policy_tree: state.policy.tree(),
                        public_key: path[0].public_key().clone(),
                    });
                }
                Err(PathFailure { error, index }) => {
                    tracing::debug!(target: "pkix_core::path", "Path rejected at {} under {anchor}: {error}", path[index].subject());
                    if best
                        .as_ref()
                        .is_none_or(|b| error.specificity() >= b.specificity())
                    {
                        best = Some(error);
                    }
                }
            }
        }
        match best {
            Some(error) => Err(error),
            None => NoTrustAnchorSnafu {
                subject: top.subject().to_string(),
            }
            .fail(),
        }
    }
}

fn issued_by(cert: &Certificate, anchor: &TrustAnchor, inputs: &SearchInputs<'_>) -> bool {
    if anchor.name() == cert.issuer() {
        return true;
    }
    anchor.certificate().is_none()
        && inputs
            .verifier
            .verify(
                anchor.public_key(),
                cert.signature_algorithm(),
                cert.tbs_bytes(),
                cert.signature(),
            )
            .is_ok()
}

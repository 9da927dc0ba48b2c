use crate::cert::{Certificate, PublicKey};
use crate::checker::{CertPathChecker, CheckContext, CheckResult};
use crate::error::AlgorithmDisabledSnafu;
use crate::path::state::ValidationState;
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;

/// Rejects disabled signature algorithms and keys below the configured
/// size floor, before any signature is verified.
#[derive(Debug, Default)]
pub struct AlgorithmChecker;

fn describe_key(key: &PublicKey) -> String {
    match key.bits {
        Some(bits) => format!("{} key of {bits} bits", key.algorithm),
        None => format!("{} key", key.algorithm),
    }
}

impl CertPathChecker for AlgorithmChecker {
    fn is_forward_checking_supported(&self) -> bool {
        true
    }

    fn check(
        &self,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        _state: &mut ValidationState,
        _unresolved: &mut BTreeSet<ObjectIdentifier>,
    ) -> CheckResult {
        let algorithm = cert.signature_algorithm();
        if !ctx.algorithms.permits(algorithm) {
            return AlgorithmDisabledSnafu {
                subject: cert.subject().to_string(),
                algorithm: algorithm.name(),
            }
            .fail();
        }
        for key in [&ctx.issuer.public_key, cert.public_key()] {
            if !ctx.algorithms.permits_key(key) {
                return AlgorithmDisabledSnafu {
                    subject: cert.subject().to_string(),
                    algorithm: describe_key(key),
                }
                .fail();
            }
        }
        Ok(())
    }
}

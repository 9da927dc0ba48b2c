use crate::cert::Certificate;
use crate::checker::{CertPathChecker, CheckContext, CheckResult};
use crate::error::{RevokedSnafu, UndeterminedRevocationStatusSnafu};
use crate::path::state::ValidationState;
use crate::revocation::{RevocationContext, RevocationEngine, RevocationStatus};
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Asks the revocation engine about each certificate. Only needs the
/// issuer, so it also runs during target-to-anchor search.
#[derive(Debug)]
pub struct RevocationChecker {
    engine: Arc<RevocationEngine>,
}

impl RevocationChecker {
    pub fn new(engine: Arc<RevocationEngine>) -> Self {
        Self { engine }
    }
}

impl CertPathChecker for RevocationChecker {
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
        let config = self.engine.config();
        if config.only_end_entity && !ctx.is_target {
            return Ok(());
        }
        let revocation_ctx = RevocationContext {
            date: ctx.date,
            stacked: ctx.stacked,
            anchors: ctx.anchors,
            stores: ctx.stores,
            verifier: ctx.verifier,
            algorithms: ctx.algorithms,
            revocation: Some(self.engine.clone()),
        };
        match self
            .engine
            .check_revocation(cert, &ctx.issuer, &revocation_ctx)?
        {
            RevocationStatus::Good => Ok(()),
            RevocationStatus::Revoked {
                reason,
                revocation_time,
            } => RevokedSnafu {
                subject: cert.subject().to_string(),
                reason,
                revocation_time,
            }
            .fail(),
            RevocationStatus::Undetermined {
                message,
                network: true,
            } if config.soft_fail => {
                tracing::warn!(target: "pkix_core::checker", "Revocation status of {} unknown, soft-failing: {message}", cert.subject());
                Ok(())
            }
            RevocationStatus::Undetermined { message, network } => {
                UndeterminedRevocationStatusSnafu {
                    subject: cert.subject().to_string(),
                    message,
                    network,
                }
                .fail()
            }
        }
    }
}

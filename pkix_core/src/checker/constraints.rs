use crate::cert::{Certificate, oid};
use crate::checker::{CertPathChecker, CheckContext, CheckResult};
use crate::error::{NotCaCertificateSnafu, PathTooLongSnafu};
use crate::path::state::{ValidationState, decrement, is_zero, tighten};
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;

/// BasicConstraints of intermediates (RFC 5280 6.1.4 (k)-(m)) and merging
/// of their NameConstraints into the state (6.1.4 (g)).
#[derive(Debug, Default)]
pub struct ConstraintsChecker;

impl CertPathChecker for ConstraintsChecker {
    fn supported_extensions(&self) -> &[ObjectIdentifier] {
        &[oid::BASIC_CONSTRAINTS]
    }

    fn check(
        &self,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        state: &mut ValidationState,
        _unresolved: &mut BTreeSet<ObjectIdentifier>,
    ) -> CheckResult {
        if ctx.is_target {
            return Ok(());
        }
        if !cert.is_ca() {
            return NotCaCertificateSnafu {
                subject: cert.subject().to_string(),
            }
            .fail();
        }
        if !cert.is_self_issued() {
            if is_zero(state.remaining_ca_certs) {
                return PathTooLongSnafu {
                    subject: cert.subject().to_string(),
                }
                .fail();
            }
            decrement(&mut state.remaining_ca_certs);
        }
        if let Some(limit) = cert.path_len_constraint() {
            tighten(&mut state.remaining_ca_certs, limit);
        }
        if let Some(nc) = &cert.extensions().name_constraints {
            state.name_constraints.add(nc.clone());
        }
        Ok(())
    }
}

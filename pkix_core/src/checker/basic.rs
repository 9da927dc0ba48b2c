use crate::cert::Certificate;
use crate::checker::{CertPathChecker, CheckContext, CheckResult};
use crate::error::{ExpiredSnafu, NameChainingSnafu, NotYetValidSnafu, SignatureInvalidSnafu};
use crate::path::state::ValidationState;
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;

/// Signature, validity period and issuer/subject chaining (RFC 5280
/// 6.1.3 (a)). Makes the certificate the new working certificate.
#[derive(Debug, Default)]
pub struct BasicChecker;

impl CertPathChecker for BasicChecker {
    fn check(
        &self,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        state: &mut ValidationState,
        _unresolved: &mut BTreeSet<ObjectIdentifier>,
    ) -> CheckResult {
        let subject = cert.subject().to_string();
        ctx.verifier
            .verify(
                &ctx.issuer.public_key,
                cert.signature_algorithm(),
                cert.tbs_bytes(),
                cert.signature(),
            )
            .map_err(|e| {
                SignatureInvalidSnafu {
                    subject: subject.clone(),
                    message: e.to_string(),
                }
                .build()
            })?;

        if ctx.date < cert.not_before() {
            return NotYetValidSnafu {
                subject,
                not_before: cert.not_before(),
            }
            .fail();
        }
        if ctx.date > cert.not_after() {
            return ExpiredSnafu {
                subject,
                not_after: cert.not_after(),
            }
            .fail();
        }
        if cert.issuer() != &state.working_issuer_name {
            return NameChainingSnafu {
                subject,
                expected: state.working_issuer_name.to_string(),
                actual: cert.issuer().to_string(),
            }
            .fail();
        }

        state.advance(cert);
        Ok(())
    }
}

use crate::cert::{Certificate, oid};
use crate::checker::{CertPathChecker, CheckContext, CheckResult};
use crate::error::InvalidKeyUsageSnafu;
use crate::path::state::ValidationState;
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;

/// KeyUsage of intermediate CAs, and the usage the caller asked of the
/// target.
#[derive(Debug, Default)]
pub struct KeyChecker;

const SUPPORTED: &[ObjectIdentifier] = &[
    oid::KEY_USAGE,
    oid::EXTENDED_KEY_USAGE,
    oid::SUBJECT_ALT_NAME,
];

impl CertPathChecker for KeyChecker {
    fn supported_extensions(&self) -> &[ObjectIdentifier] {
        SUPPORTED
    }

    fn check(
        &self,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        _state: &mut ValidationState,
        _unresolved: &mut BTreeSet<ObjectIdentifier>,
    ) -> CheckResult {
        let subject = cert.subject().to_string();
        if !ctx.is_target {
            if cert.key_usage().is_some_and(|ku| !ku.key_cert_sign()) {
                return InvalidKeyUsageSnafu {
                    subject,
                    message: "keyCertSign is not asserted",
                }
                .fail();
            }
            return Ok(());
        }

        if let (Some(wanted), Some(actual)) = (ctx.target.key_usage, cert.key_usage())
            && !actual.contains(wanted.0)
        {
            return InvalidKeyUsageSnafu {
                subject,
                message: format!("key usage {:#06x} lacks {:#06x}", actual.0, wanted.0),
            }
            .fail();
        }
        if let Some(purposes) = &cert.extensions().extended_key_usage
            && !purposes.contains(&oid::ANY_EXTENDED_KEY_USAGE)
        {
            for wanted in &ctx.target.extended_key_usage {
                if !purposes.contains(wanted) {
                    return InvalidKeyUsageSnafu {
                        subject,
                        message: format!("extended key usage {wanted} is missing"),
                    }
                    .fail();
                }
            }
        }
        Ok(())
    }
}

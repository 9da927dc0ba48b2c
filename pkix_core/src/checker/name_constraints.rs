//! NameConstraints matching (RFC 5280 4.2.1.10) and the checker that
//! applies the accumulated subtrees to each certificate's names.

use crate::cert::{Certificate, GeneralName, GeneralSubtree, NameConstraints, oid};
use crate::checker::{CertPathChecker, CheckContext, CheckResult};
use crate::error::InvalidNameConstraintsSnafu;
use crate::path::state::{ValidationState, names_of};
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;

/// True when `name` lies in no excluded subtree and, if `constraints`
/// permits any subtree of the same name form, in at least one of those.
pub(crate) fn permits(constraints: &NameConstraints, name: &GeneralName) -> bool {
    if same_form(&constraints.excluded, name)
        .into_iter()
        .any(|base| within(name, base))
    {
        return false;
    }
    let permitted = same_form(&constraints.permitted, name);
    permitted.is_empty() || permitted.into_iter().any(|base| within(name, base))
}

/// Subtree bases in `subtrees` of the same name form as `name`.
fn same_form<'a>(
    subtrees: &'a Option<Vec<GeneralSubtree>>,
    name: &GeneralName,
) -> Vec<&'a GeneralName> {
    subtrees
        .iter()
        .flatten()
        .map(|s| &s.base)
        .filter(|base| same_name_form(base, name))
        .collect()
}

fn same_name_form(a: &GeneralName, b: &GeneralName) -> bool {
    match (a, b) {
        // IPv4 subtrees carry address and mask, 8 bytes; IPv6 carry 32.
        (GeneralName::IpAddress(base), GeneralName::IpAddress(addr)) => {
            base.len() == addr.len() * 2
        }
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

fn within(name: &GeneralName, base: &GeneralName) -> bool {
    match (name, base) {
        (GeneralName::Directory(name), GeneralName::Directory(base)) => name.is_within(base),
        (GeneralName::Dns(name), GeneralName::Dns(base)) => dns_within(name, base),
        (GeneralName::Rfc822(name), GeneralName::Rfc822(base)) => mailbox_within(name, base),
        (GeneralName::Uri(name), GeneralName::Uri(base)) => match uri_host(name) {
            Some(host) => host_within(&host, base),
            None => false,
        },
        (GeneralName::IpAddress(addr), GeneralName::IpAddress(base)) => ip_within(addr, base),
        (GeneralName::RegisteredId(name), GeneralName::RegisteredId(base)) => name == base,
        _ => false,
    }
}

fn dns_within(name: &str, base: &str) -> bool {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    let base = base.trim_end_matches('.').to_ascii_lowercase();
    if base.is_empty() {
        return true;
    }
    if base.starts_with('.') {
        return name.ends_with(&base);
    }
    name == base || name.ends_with(&format!(".{base}"))
}

/// `base` is a mailbox, a host, or `.domain` for any host below it.
fn mailbox_within(name: &str, base: &str) -> bool {
    let Some((_, host)) = name.rsplit_once('@') else {
        return false;
    };
    if base.contains('@') {
        return name.eq_ignore_ascii_case(base);
    }
    host_within(host, base)
}

fn host_within(host: &str, base: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    if base.starts_with('.') {
        host.ends_with(&base)
    } else {
        host == base
    }
}

fn uri_host(uri: &str) -> Option<String> {
    let parsed = url::Url::parse(uri).ok()?;
    parsed.host_str().map(str::to_string)
}

fn ip_within(addr: &[u8], base: &[u8]) -> bool {
    let (network, mask) = base.split_at(addr.len());
    addr.iter()
        .zip(network)
        .zip(mask)
        .all(|((a, n), m)| a & m == n & m)
}

/// Checks the subject DN, subjectAltNames and emailAddress attributes of
/// every certificate against the subtrees accumulated so far. Self-issued
/// intermediates are exempt.
#[derive(Debug, Default)]
pub struct NameConstraintsChecker;

impl CertPathChecker for NameConstraintsChecker {
    fn supported_extensions(&self) -> &[ObjectIdentifier] {
        &[oid::NAME_CONSTRAINTS]
    }

    fn check(
        &self,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        state: &mut ValidationState,
        _unresolved: &mut BTreeSet<ObjectIdentifier>,
    ) -> CheckResult {
        if state.name_constraints.is_empty() || (cert.is_self_issued() && !ctx.is_target) {
            return Ok(());
        }
        for name in names_of(cert) {
            if !state.name_constraints.permits(&name) {
                tracing::debug!(target: "pkix_core::checker", "{name} of {} is outside the permitted subtrees", cert.subject());
                return InvalidNameConstraintsSnafu {
                    subject: cert.subject().to_string(),
                    message: format!("{name} is not permitted"),
                }
                .fail();
            }
        }
        Ok(())
    }
}

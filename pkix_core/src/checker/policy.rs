//! Certificate policy processing, RFC 5280 6.1.3 (d)-(f), 6.1.4 (a), (b),
//! (h)-(j) and the 6.1.5 wrap-up.

use crate::cert::oid::{self, ANY_POLICY};
use crate::cert::{Certificate, PolicyInformation};
use crate::checker::policy_tree::{PolicyTree, TreeNode};
use crate::checker::{CertPathChecker, CheckContext, CheckResult};
use crate::error::InvalidPolicySnafu;
use crate::path::state::{PolicyState, ValidationState, decrement, is_zero, tighten};
use const_oid::ObjectIdentifier;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Policy inputs of RFC 5280 6.1.1 (c), (e)-(g).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyParameters {
    /// Acceptable policies; empty means anyPolicy.
    pub initial_policies: BTreeSet<ObjectIdentifier>,
    pub explicit_policy_required: bool,
    pub policy_mapping_inhibited: bool,
    pub any_policy_inhibited: bool,
    /// Fail when a critical certificatePolicies extension carries
    /// qualifiers.
    pub reject_policy_qualifiers: bool,
}

impl PolicyParameters {
    fn accepts_any(&self) -> bool {
        self.initial_policies.is_empty() || self.initial_policies.contains(&ANY_POLICY)
    }
}

#[derive(Debug, Default)]
pub struct PolicyChecker;

const SUPPORTED: &[ObjectIdentifier] = &[
    oid::CERTIFICATE_POLICIES,
    oid::POLICY_MAPPINGS,
    oid::POLICY_CONSTRAINTS,
    oid::INHIBIT_ANY_POLICY,
];

impl CertPathChecker for PolicyChecker {
    fn supported_extensions(&self) -> &[ObjectIdentifier] {
        SUPPORTED
    }

    fn check(
        &self,
        cert: &Certificate,
        ctx: &CheckContext<'_>,
        state: &mut ValidationState,
        _unresolved: &mut BTreeSet<ObjectIdentifier>,
    ) -> CheckResult {
        let policy = &mut state.policy;
        let subject = cert.subject().to_string();
        let fail = |message: String| {
            InvalidPolicySnafu {
                subject: subject.clone(),
                message,
            }
            .fail()
        };

        if let Some(message) = process_policies(cert, ctx, policy) {
            return fail(message);
        }

        if ctx.is_target {
            wrap_up(cert, ctx, policy);
            if is_zero(policy.explicit_policy) && policy.tree.is_none() {
                return fail("No acceptable policy remains for the path".to_string());
            }
            return Ok(());
        }

        if is_zero(policy.explicit_policy) && policy.tree.is_none() {
            return fail("An explicit policy is required".to_string());
        }
        if let Some(message) = process_mappings(cert, policy) {
            return fail(message);
        }
        prepare_next(cert, policy);
        Ok(())
    }
}

/// 6.1.3 (d) and (e). Returns an error message on failure.
fn process_policies(
    cert: &Certificate,
    ctx: &CheckContext<'_>,
    state: &mut PolicyState,
) -> Option<String> {
    let Some(policies) = &cert.extensions().certificate_policies else {
        state.tree = None;
        return None;
    };
    let critical = cert.extensions().critical.contains(&oid::CERTIFICATE_POLICIES);
    if ctx.policy.reject_policy_qualifiers
        && critical
        && policies.iter().any(|p| !p.qualifiers.is_empty())
    {
        return Some("Critical certificatePolicies carries policy qualifiers".to_string());
    }
    let Some(tree) = state.tree.as_mut() else {
        return None;
    };
    let tree = Arc::make_mut(tree);
    let parents = tree.deepest().to_vec();
    let mut row: Vec<TreeNode> = Vec::new();

    for info in policies.iter().filter(|p| p.policy_id != ANY_POLICY) {
        let matched: Vec<usize> = parents
            .iter()
            .enumerate()
            .filter(|(_, n)| n.expected.contains(&info.policy_id))
            .map(|(i, _)| i)
            .collect();
        let attach_to = if matched.is_empty() {
            parents
                .iter()
                .enumerate()
                .filter(|(_, n)| n.is_any_policy())
                .map(|(i, _)| i)
                .collect()
        } else {
            matched
        };
        for parent in attach_to {
            row.push(leaf(parent, info, critical));
        }
    }

    let any_allowed =
        !is_zero(state.inhibit_any_policy) || (!ctx.is_target && cert.is_self_issued());
    if any_allowed && let Some(any) = policies.iter().find(|p| p.policy_id == ANY_POLICY) {
        for (index, parent) in parents.iter().enumerate() {
            for expected in &parent.expected {
                let present = row
                    .iter()
                    .any(|n| n.parent == Some(index) && &n.valid_policy == expected);
                if !present {
                    row.push(TreeNode::child(
                        index,
                        *expected,
                        any.qualifiers.clone(),
                        BTreeSet::from([*expected]),
                        critical,
                    ));
                }
            }
        }
    }

    tree.push_row(row);
    if !tree.prune() {
        state.tree = None;
    }
    None
}

fn leaf(parent: usize, info: &PolicyInformation, critical: bool) -> TreeNode {
    TreeNode::child(
        parent,
        info.policy_id,
        info.qualifiers.clone(),
        BTreeSet::from([info.policy_id]),
        critical,
    )
}

/// 6.1.4 (a) and (b).
fn process_mappings(cert: &Certificate, state: &mut PolicyState) -> Option<String> {
    let Some(mappings) = &cert.extensions().policy_mappings else {
        return None;
    };
    if mappings
        .iter()
        .any(|m| m.issuer_domain_policy == ANY_POLICY || m.subject_domain_policy == ANY_POLICY)
    {
        return Some("Policy mapping to or from anyPolicy".to_string());
    }
    let Some(tree) = state.tree.as_mut() else {
        return None;
    };

    let mut mapped: BTreeMap<ObjectIdentifier, BTreeSet<ObjectIdentifier>> = BTreeMap::new();
    for m in mappings {
        mapped
            .entry(m.issuer_domain_policy)
            .or_default()
            .insert(m.subject_domain_policy);
    }

    let tree = Arc::make_mut(tree);
    let depth = tree.depth();
    if is_zero(state.policy_mapping) {
        let marked: Vec<(usize, usize)> = tree
            .deepest()
            .iter()
            .enumerate()
            .filter(|(_, n)| mapped.contains_key(&n.valid_policy))
            .map(|(i, _)| (depth, i))
            .collect();
        if !marked.is_empty() && !tree.remove(&marked) {
            state.tree = None;
        }
        return None;
    }

    let any_node = tree
        .deepest()
        .iter()
        .find(|n| n.is_any_policy())
        .cloned();
    let Some(row) = tree.row_mut(depth) else {
        return None;
    };
    for (issuer_policy, subject_policies) in &mapped {
        let mut found = false;
        for node in row.iter_mut().filter(|n| &n.valid_policy == issuer_policy) {
            node.expected = subject_policies.clone();
            found = true;
        }
        if !found && let Some(any) = &any_node {
            row.push(TreeNode {
                valid_policy: *issuer_policy,
                qualifiers: any.qualifiers.clone(),
                expected: subject_policies.clone(),
                critical: any.critical,
                parent: any.parent,
            });
        }
    }
    None
}

/// 6.1.4 (h)-(j).
fn prepare_next(cert: &Certificate, state: &mut PolicyState) {
    if !cert.is_self_issued() {
        decrement(&mut state.explicit_policy);
        decrement(&mut state.policy_mapping);
        decrement(&mut state.inhibit_any_policy);
    }
    let extensions = cert.extensions();
    if let Some(pc) = &extensions.policy_constraints {
        if let Some(require) = pc.require_explicit_policy {
            tighten(&mut state.explicit_policy, require);
        }
        if let Some(inhibit) = pc.inhibit_policy_mapping {
            tighten(&mut state.policy_mapping, inhibit);
        }
    }
    if let Some(skip) = extensions.inhibit_any_policy {
        tighten(&mut state.inhibit_any_policy, skip);
    }
}

/// 6.1.5 (a), (b) and (g).
fn wrap_up(cert: &Certificate, ctx: &CheckContext<'_>, state: &mut PolicyState) {
    decrement(&mut state.explicit_policy);
    if cert
        .extensions()
        .policy_constraints
        .as_ref()
        .and_then(|pc| pc.require_explicit_policy)
        == Some(0)
    {
        state.explicit_policy = Some(0);
    }

    if ctx.policy.accepts_any() {
        return;
    }
    let Some(tree) = state.tree.as_mut() else {
        return;
    };
    if !intersect(Arc::make_mut(tree), &ctx.policy.initial_policies) {
        state.tree = None;
    }
}

/// Restricts the tree to `initial`, RFC 5280 6.1.5 (g)(iii). Returns false
/// when nothing remains.
fn intersect(tree: &mut PolicyTree, initial: &BTreeSet<ObjectIdentifier>) -> bool {
    let below_any = |tree: &PolicyTree, depth: usize, node: &TreeNode| -> bool {
        depth > 0
            && node
                .parent
                .is_some_and(|p| tree.row(depth - 1)[p].is_any_policy())
    };

    let mut marked = Vec::new();
    for depth in 1..=tree.depth() {
        for (i, node) in tree.row(depth).iter().enumerate() {
            if below_any(tree, depth, node)
                && !node.is_any_policy()
                && !initial.contains(&node.valid_policy)
            {
                marked.push((depth, i));
            }
        }
    }
    if !marked.is_empty() && !tree.remove(&marked) {
        return false;
    }

    let depth = tree.depth();
    let Some(any_index) = tree.deepest().iter().position(TreeNode::is_any_policy) else {
        return tree.prune();
    };
    let any = tree.deepest()[any_index].clone();
    let mut present = BTreeSet::new();
    for d in 1..=depth {
        for node in tree.row(d) {
            if below_any(tree, d, node) {
                present.insert(node.valid_policy);
            }
        }
    }
    let Some(row) = tree.row_mut(depth) else {
        return false;
    };
    row.remove(any_index);
    if let Some(parent) = any.parent {
        for policy in initial.iter().filter(|p| !present.contains(*p)) {
            row.push(TreeNode::child(
                parent,
                *policy,
                any.qualifiers.clone(),
                BTreeSet::from([*policy]),
                any.critical,
            ));
        }
    }
    tree.prune()
}

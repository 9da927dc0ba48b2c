//! The RFC 5280 valid_policy_tree, stored as one row of nodes per depth.
//! Nodes refer to their parent by index into the previous row.

use crate::cert::extensions::PolicyQualifier;
use crate::cert::oid::ANY_POLICY;
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TreeNode {
    pub valid_policy: ObjectIdentifier,
    pub qualifiers: Vec<PolicyQualifier>,
    pub expected: BTreeSet<ObjectIdentifier>,
    pub critical: bool,
    pub parent: Option<usize>,
}

impl TreeNode {
    pub fn child(
        parent: usize,
        valid_policy: ObjectIdentifier,
        qualifiers: Vec<PolicyQualifier>,
        expected: BTreeSet<ObjectIdentifier>,
        critical: bool,
    ) -> Self {
        Self {
            valid_policy,
            qualifiers,
            expected,
            critical,
            parent: Some(parent),
        }
    }

    pub fn is_any_policy(&self) -> bool {
        self.valid_policy == ANY_POLICY
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PolicyTree {
    rows: Vec<Vec<TreeNode>>,
}

impl PolicyTree {
    /// A single anyPolicy root at depth zero.
    pub fn new() -> Self {
        Self {
            rows: vec![vec![TreeNode {
                valid_policy: ANY_POLICY,
                qualifiers: Vec::new(),
                expected: BTreeSet::from([ANY_POLICY]),
                critical: false,
                parent: None,
            }]],
        }
    }

    pub fn depth(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn row(&self, depth: usize) -> &[TreeNode] {
        self.rows.get(depth).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_mut(&mut self, depth: usize) -> Option<&mut Vec<TreeNode>> {
        self.rows.get_mut(depth)
    }

    pub fn deepest(&self) -> &[TreeNode] {
        self.row(self.depth())
    }

    pub fn push_row(&mut self, row: Vec<TreeNode>) {
        self.rows.push(row);
    }

    /// Removes the marked nodes together with their descendants, then prunes.
    /// Returns false when the tree became empty.
    pub fn remove(&mut self, marked: &[(usize, usize)]) -> bool {
        let keep: Vec<Vec<bool>> = self
            .rows
            .iter()
            .enumerate()
            .map(|(depth, row)| {
                (0..row.len())
                    .map(|i| !marked.contains(&(depth, i)))
                    .collect()
            })
            .collect();
        self.rebuild(&keep);
        self.prune()
    }

    /// Deletes nodes above the deepest row that have no children, repeatedly.
    /// Returns false when the root itself was deleted.
    pub fn prune(&mut self) -> bool {
        let deepest = self.depth();
        let mut keep: Vec<Vec<bool>> = self.rows.iter().map(|r| vec![true; r.len()]).collect();
        for depth in (0..deepest).rev() {
            let (upper, lower) = keep.split_at_mut(depth + 1);
            let children = &self.rows[depth + 1];
            for (i, flag) in upper[depth].iter_mut().enumerate() {
                *flag = children
                    .iter()
                    .zip(lower[0].iter())
                    .any(|(child, kept)| *kept && child.parent == Some(i));
            }
        }
        self.rebuild(&keep);
        !self.rows[0].is_empty()
    }

    fn rebuild(&mut self, keep: &[Vec<bool>]) {
        let mut remap: Vec<Vec<Option<usize>>> = Vec::with_capacity(self.rows.len());
        let mut rows = Vec::with_capacity(self.rows.len());
        for (depth, row) in self.rows.iter().enumerate() {
            let mut map = vec![None; row.len()];
            let mut out = Vec::new();
            for (i, node) in row.iter().enumerate() {
                let parent = match node.parent {
                    None => None,
                    Some(p) => match remap[depth - 1][p] {
                        Some(mapped) => Some(mapped),
                        None => continue,
                    },
                };
                if !keep[depth][i] {
                    continue;
                }
                map[i] = Some(out.len());
                out.push(TreeNode {
                    parent,
                    ..node.clone()
                });
            }
            remap.push(map);
            rows.push(out);
        }
        self.rows = rows;
    }

    pub fn to_node(&self) -> PolicyNode {
        self.node_at(0, 0)
    }

    fn node_at(&self, depth: usize, index: usize) -> PolicyNode {
        let node = &self.rows[depth][index];
        let children = self
            .row(depth + 1)
            .iter()
            .enumerate()
            .filter(|(_, c)| c.parent == Some(index))
            .map(|(i, _)| self.node_at(depth + 1, i))
            .collect();
        PolicyNode {
            valid_policy: node.valid_policy,
            qualifiers: node.qualifiers.clone(),
            expected_policies: node.expected.clone(),
            critical: node.critical,
            depth,
            children,
        }
    }
}

/// Immutable view of a valid policy tree node returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyNode {
    pub valid_policy: ObjectIdentifier,
    pub qualifiers: Vec<PolicyQualifier>,
    pub expected_policies: BTreeSet<ObjectIdentifier>,
    /// Whether the certificatePolicies extension that produced this node
    /// was critical.
    pub critical: bool,
    pub depth: usize,
    pub children: Vec<PolicyNode>,
}

impl PolicyNode {
    /// Valid policies of the nodes at `depth`.
    pub fn policies_at(&self, depth: usize) -> BTreeSet<ObjectIdentifier> {
        let mut out = BTreeSet::new();
        self.collect_at(depth, &mut out);
        out
    }

    fn collect_at(&self, depth: usize, out: &mut BTreeSet<ObjectIdentifier>) {
        if self.depth == depth {
            out.insert(self.valid_policy);
        } else if self.depth < depth {
            for child in &self.children {
                child.collect_at(depth, out);
            }
        }
    }

    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(PolicyNode::max_depth)
            .max()
            .unwrap_or(self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.1");
    const P2: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.2");

    fn leaf(parent: usize, policy: ObjectIdentifier) -> TreeNode {
        TreeNode::child(parent, policy, Vec::new(), BTreeSet::from([policy]), false)
    }

    #[test]
    fn test_prune_removes_childless_ancestors() {
        let mut tree = PolicyTree::new();
        tree.push_row(vec![leaf(0, P1), leaf(0, P2)]);
        tree.push_row(vec![leaf(1, P2)]);
        assert!(tree.prune());
        assert_eq!(tree.row(1).len(), 1);
        assert_eq!(tree.row(1)[0].valid_policy, P2);
        assert_eq!(tree.row(2)[0].parent, Some(0));
    }

    #[test]
    fn test_empty_row_kills_tree() {
        let mut tree = PolicyTree::new();
        tree.push_row(Vec::new());
        assert!(!tree.prune());
    }

    #[test]
    fn test_remove_cascades_to_descendants() {
        let mut tree = PolicyTree::new();
        tree.push_row(vec![leaf(0, P1), leaf(0, P2)]);
        tree.push_row(vec![leaf(0, P1), leaf(1, P2)]);
        assert!(tree.remove(&[(1, 0)]));
        assert_eq!(tree.row(1).len(), 1);
        assert_eq!(tree.row(2).len(), 1);
        assert_eq!(tree.to_node().policies_at(2), BTreeSet::from([P2]));
        assert_eq!(tree.to_node().max_depth(), 2);
    }
}

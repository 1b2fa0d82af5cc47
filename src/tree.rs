//! Query tree: the internal representation built by the visitor (§4.1) and
//! simplified per the invariants in §3. Grounded on `querynode.h`'s
//! `QueryExpr`/`QueryNode` split, translated from raw-pointer parent/child
//! links into an arena of indices (§9 design note: "store nodes in an
//! arena, refer to parents/children by indices").

use crate::term::{NodeOptions, QueryTerm};

/// One of the ten non-terminal operators `spec.md` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    And,
    Or,
    Any,
    Near,
    Within,
    Onear,
    Phrase,
    Rank,
    Andnot,
    Equiv,
}

impl NodeKind {
    /// Base option bits this operator contributes, before any per-query
    /// override from the option string (§6) or upward propagation of
    /// `CONSTR`/`CHKVAL` from children.
    pub fn base_options(self) -> NodeOptions {
        use NodeOptions as O;
        match self {
            NodeKind::And => O::AND | O::COMPLETE,
            NodeKind::Or => O::OR,
            NodeKind::Any => O::ANY,
            NodeKind::Near => O::LIMIT | O::COMPLETE | O::CONSTR | O::CHKVAL,
            NodeKind::Within => O::ORDERED | O::LIMIT | O::COMPLETE | O::CONSTR | O::CHKVAL,
            NodeKind::Onear => O::ORDERED | O::LIMIT | O::COMPLETE | O::CONSTR | O::CHKVAL,
            NodeKind::Phrase => O::ORDERED | O::EXACT | O::COMPLETE,
            NodeKind::Rank => O::ONLY_1,
            NodeKind::Andnot => O::ONLY_1,
            NodeKind::Equiv => O::OR,
        }
    }
}

/// A reference to a query tree node's child: either a leaf term or another
/// non-terminal, both addressed by arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Term(usize),
    Node(usize),
}

#[derive(Debug)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub options: NodeOptions,
    pub weight: i32,
    /// Threshold computed bottom-up by `compute_thresholds` (§4.1).
    pub threshold: i32,
    /// NEAR/WITHIN/ONEAR/PHRASE proximity limit; meaningful iff `LIMIT` is set.
    pub limit: u32,
    pub children: Vec<Child>,
    pub parent: Option<(usize, usize)>,
    /// Assigned during Match Object compilation (§4.2); `None` until then.
    pub node_idx: Option<usize>,
}

impl TreeNode {
    fn new(kind: NodeKind) -> Self {
        TreeNode {
            kind,
            options: kind.base_options(),
            weight: 0,
            threshold: 0,
            limit: 0,
            children: Vec::new(),
            parent: None,
            node_idx: None,
        }
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }
}

/// Owns every term and node created for one query. Immutable after
/// `simplify`, except for `node_idx`/`threshold` assigned later by Match
/// Object construction (§3, "Lifetimes").
#[derive(Debug, Default)]
pub struct QueryTree {
    pub nodes: Vec<TreeNode>,
    pub terms: Vec<QueryTerm>,
    pub root: Option<Child>,
    /// Per-query global option overrides (§6), ORed into the root's options
    /// after the tree is fully built.
    pub global_options: NodeOptions,
    pub global_limit: Option<u32>,
}

impl QueryTree {
    pub fn new() -> Self {
        QueryTree::default()
    }

    pub fn push_node(&mut self, kind: NodeKind) -> usize {
        self.nodes.push(TreeNode::new(kind));
        self.nodes.len() - 1
    }

    pub fn push_term(&mut self, mut term: QueryTerm) -> usize {
        term.idx = self.terms.len();
        self.terms.push(term);
        self.terms.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Apply per-query global options parsed from the option string to the
    /// root non-terminal, per §4.1. A single-term root has nothing to OR
    /// options into (terms don't carry NEAR/WITHIN semantics), so the
    /// override is silently dropped in that case, matching the "proximity
    /// is meaningless" single-term carve-out of §4.5.
    pub fn apply_global_options(&mut self) {
        if let Some(Child::Node(root_idx)) = self.root {
            self.nodes[root_idx].options |= self.global_options;
            if let Some(limit) = self.global_limit {
                self.nodes[root_idx].limit = limit;
            }
        }
    }

    /// Simplification per §3: arity ≥ 2 after simplification; arity-1 nodes
    /// replaced by their child; `ONLY_1` keeps only the first child;
    /// dangling (arity 0) non-terminals are removed.
    pub fn simplify(&mut self) {
        if let Some(root) = self.root.take() {
            self.root = self.simplify_child(root);
            self.relink_parents();
        }
    }

    fn simplify_child(&mut self, child: Child) -> Option<Child> {
        match child {
            Child::Term(_) => Some(child),
            Child::Node(idx) => {
                self.simplify_node(idx);
                let arity = self.nodes[idx].arity();
                match arity {
                    0 => None,
                    1 => Some(self.nodes[idx].children[0]),
                    _ => Some(Child::Node(idx)),
                }
            }
        }
    }

    fn simplify_node(&mut self, idx: usize) {
        let only_1 = self.nodes[idx].options.contains(NodeOptions::ONLY_1);
        let original: Vec<Child> = self.nodes[idx].children.clone();
        let mut kept = Vec::with_capacity(original.len());
        for (i, child) in original.into_iter().enumerate() {
            if only_1 && i > 0 {
                continue;
            }
            if let Some(simplified) = self.simplify_child(child) {
                kept.push(simplified);
            }
        }
        self.nodes[idx].children = kept;
    }

    /// Re-derive `parent`/`child_no` back-links after simplification has
    /// rewired the child arrays (§9: "back-link is `(parent_idx, child_no)`").
    fn relink_parents(&mut self) {
        for node in &mut self.nodes {
            node.parent = None;
        }
        if let Some(Child::Node(root)) = self.root {
            self.relink_from(root);
        }
    }

    fn relink_from(&mut self, idx: usize) {
        let children = self.nodes[idx].children.clone();
        for (child_no, child) in children.into_iter().enumerate() {
            if let Child::Node(child_idx) = child {
                self.nodes[child_idx].parent = Some((idx, child_no));
                self.relink_from(child_idx);
            }
        }
    }

    /// Threshold computation, bottom-up (§4.1): AND sums child weights;
    /// OR/ANY take a saturating max, modeled as the raw sum (an
    /// "effectively large" value that any single child satisfies);
    /// everything else takes the minimum child weight. Also propagates
    /// `CONSTR | CHKVAL` upward from children to parents.
    pub fn compute_thresholds(&mut self) {
        if let Some(root) = self.root {
            self.threshold_of(root);
        }
    }

    fn threshold_of(&mut self, child: Child) -> (i32, NodeOptions) {
        match child {
            Child::Term(t) => (self.terms[t].weight, self.terms[t].options),
            Child::Node(idx) => {
                let children: Vec<Child> = self.nodes[idx].children.clone();
                let mut weights = Vec::with_capacity(children.len());
                let mut propagated = NodeOptions::NONE;
                for c in children {
                    let (w, opts) = self.threshold_of(c);
                    weights.push(w);
                    if opts.intersects(NodeOptions::CONSTR | NodeOptions::CHKVAL) {
                        propagated.insert(NodeOptions::CONSTR | NodeOptions::CHKVAL);
                    }
                }
                let node = &mut self.nodes[idx];
                let sum: i32 = weights.iter().sum();
                node.threshold = if node.options.intersects(NodeOptions::OR | NodeOptions::ANY) {
                    sum
                } else if node.options.contains(NodeOptions::AND) {
                    sum
                } else {
                    weights.iter().copied().min().unwrap_or(0)
                };
                if node.weight == 0 {
                    node.weight = node.threshold;
                }
                node.options.insert(propagated);
                (node.weight, node.options)
            }
        }
    }

    pub fn has_constraints(&self) -> bool {
        match self.root {
            Some(Child::Node(idx)) => self.nodes[idx].options.contains(NodeOptions::CONSTR),
            _ => false,
        }
    }

    /// A query with exactly one term and no operator wrapping it — the
    /// degenerate case where proximity is meaningless (§4.5, §8).
    pub fn is_single_term(&self) -> bool {
        matches!(self.root, Some(Child::Term(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(tree: &mut QueryTree, s: &str) -> Child {
        let ucs4: Vec<u32> = s.chars().map(|c| c as u32).collect();
        Child::Term(tree.push_term(QueryTerm::new(ucs4, s.len(), "default")))
    }

    #[test]
    fn arity_one_node_collapses_to_child() {
        let mut tree = QueryTree::new();
        let and_idx = tree.push_node(NodeKind::And);
        let a = term(&mut tree, "a");
        tree.nodes[and_idx].children.push(a);
        tree.root = Some(Child::Node(and_idx));
        tree.simplify();
        assert_eq!(tree.root, Some(a));
    }

    #[test]
    fn only_1_drops_trailing_children() {
        let mut tree = QueryTree::new();
        let rank_idx = tree.push_node(NodeKind::Rank);
        let a = term(&mut tree, "a");
        let b = term(&mut tree, "b");
        tree.nodes[rank_idx].children.push(a);
        tree.nodes[rank_idx].children.push(b);
        tree.root = Some(Child::Node(rank_idx));
        tree.simplify();
        assert_eq!(tree.root, Some(a));
    }

    #[test]
    fn dangling_nonterminal_is_removed() {
        let mut tree = QueryTree::new();
        let and_idx = tree.push_node(NodeKind::And);
        let empty_or = tree.push_node(NodeKind::Or);
        let a = term(&mut tree, "a");
        let b = term(&mut tree, "b");
        tree.nodes[and_idx].children.push(Child::Node(empty_or));
        tree.nodes[and_idx].children.push(a);
        tree.nodes[and_idx].children.push(b);
        tree.root = Some(Child::Node(and_idx));
        tree.simplify();
        match tree.root {
            Some(Child::Node(idx)) => assert_eq!(tree.nodes[idx].arity(), 2),
            _ => panic!("expected the AND node to survive with arity 2"),
        }
    }

    #[test]
    fn and_threshold_sums_children() {
        let mut tree = QueryTree::new();
        let and_idx = tree.push_node(NodeKind::And);
        let a = term(&mut tree, "a");
        let b = term(&mut tree, "b");
        tree.nodes[and_idx].children.push(a);
        tree.nodes[and_idx].children.push(b);
        tree.root = Some(Child::Node(and_idx));
        tree.compute_thresholds();
        assert_eq!(tree.nodes[and_idx].threshold, 200);
    }
}

//! Query visitor API (§6): the host traverses its own query representation
//! and drives a `QueryVisitor` implementation through prefix-order
//! callbacks. `TreeBuilder` is the one implementation this crate ships,
//! turning those callbacks into a `QueryTree` (§4.1).

use crate::rewriter::RewriterRegistry;
use crate::term::{NodeOptions, QueryTerm};
use crate::tree::{Child, NodeKind, QueryTree};

/// One of the operators a host query can present at a non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Any,
    Near(u32),
    Within(u32),
    Onear(u32),
    Phrase,
    Rank,
    Andnot,
    Equiv,
}

impl Operator {
    fn kind(self) -> NodeKind {
        match self {
            Operator::And => NodeKind::And,
            Operator::Or => NodeKind::Or,
            Operator::Any => NodeKind::Any,
            Operator::Near(_) => NodeKind::Near,
            Operator::Within(_) => NodeKind::Within,
            Operator::Onear(_) => NodeKind::Onear,
            Operator::Phrase => NodeKind::Phrase,
            Operator::Rank => NodeKind::Rank,
            Operator::Andnot => NodeKind::Andnot,
            Operator::Equiv => NodeKind::Equiv,
        }
    }

    fn limit(self) -> Option<u32> {
        match self {
            Operator::Near(n) | Operator::Within(n) | Operator::Onear(n) => Some(n),
            _ => None,
        }
    }
}

/// Callbacks a host's query representation drives as it walks its own tree
/// in prefix order. `enter_op`/`leave_op` bracket a non-terminal's children;
/// `keyword` is a leaf.
pub trait QueryVisitor {
    fn enter_op(&mut self, op: Operator, index_name: &str);
    fn leave_op(&mut self);
    fn keyword(&mut self, bytes: &[u8], is_prefix: bool, is_special: bool, index_name: &str);
}

/// Decides whether a named index is searched at all for this query; an
/// index the host doesn't recognize contributes nothing rather than
/// erroring (§6, "UsefulIndex").
pub trait UsefulIndex {
    fn is_useful(&self, index_name: &str) -> bool;
}

impl<F: Fn(&str) -> bool> UsefulIndex for F {
    fn is_useful(&self, index_name: &str) -> bool {
        self(index_name)
    }
}

/// Sentinel node index meaning "this subtree's index isn't useful; skip
/// everything under it without allocating tree nodes for it".
const IGNORED: usize = usize::MAX;

/// Builds a `QueryTree` by receiving `QueryVisitor` callbacks from a host's
/// own traversal. One `TreeBuilder` is used for exactly one query.
pub struct TreeBuilder<'a> {
    tree: QueryTree,
    stack: Vec<usize>,
    useful_index: &'a dyn UsefulIndex,
    rewriters: &'a RewriterRegistry,
    has_expansions: bool,
    has_reductions: bool,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(useful_index: &'a dyn UsefulIndex, rewriters: &'a RewriterRegistry) -> Self {
        TreeBuilder {
            tree: QueryTree::new(),
            stack: Vec::new(),
            useful_index,
            rewriters,
            has_expansions: false,
            has_reductions: false,
        }
    }

    /// Consumes the builder once the host's traversal has finished, running
    /// simplification and threshold computation (§4.1).
    pub fn finish(mut self) -> QueryTree {
        self.tree.simplify();
        self.tree.apply_global_options();
        self.tree.compute_thresholds();
        self.tree
    }

    /// Returns the raw, unsimplified tree, for callers that still need to
    /// fold in per-query option-string overrides (§6) before running
    /// `simplify`/`apply_global_options`/`compute_thresholds` themselves.
    pub fn into_tree(self) -> QueryTree {
        self.tree
    }

    pub fn has_expansions(&self) -> bool {
        self.has_expansions
    }

    pub fn has_reductions(&self) -> bool {
        self.has_reductions
    }

    fn current_parent(&self) -> Option<usize> {
        self.stack.last().copied()
    }

    fn attach(&mut self, child: Child) {
        match self.current_parent() {
            Some(parent) if parent != IGNORED => {
                self.tree.nodes[parent].children.push(child);
            }
            Some(_) => {}
            None => self.tree.root = Some(child),
        }
    }
}

impl QueryVisitor for TreeBuilder<'_> {
    fn enter_op(&mut self, op: Operator, index_name: &str) {
        if !self.useful_index.is_useful(index_name) {
            self.stack.push(IGNORED);
            return;
        }
        let idx = self.tree.push_node(op.kind());
        if let Some(limit) = op.limit() {
            self.tree.nodes[idx].options.insert(NodeOptions::LIMIT);
            self.tree.nodes[idx].limit = limit;
        }
        self.attach(Child::Node(idx));
        self.stack.push(idx);
    }

    fn leave_op(&mut self) {
        self.stack.pop();
    }

    fn keyword(&mut self, bytes: &[u8], is_prefix: bool, is_special: bool, index_name: &str) {
        if !self.useful_index.is_useful(index_name) {
            return;
        }
        let ucs4: Vec<u32> = String::from_utf8_lossy(bytes).chars().map(|c| c as u32).collect();
        let mut term = QueryTerm::new(ucs4, bytes.len(), index_name);
        if is_prefix {
            term.options.insert(NodeOptions::PREFIX);
        }
        if is_special {
            term.options.insert(NodeOptions::SPECIALTOKEN);
        }
        if let Some(entry) = self.rewriters.lookup(index_name) {
            if entry.for_query {
                self.has_expansions = true;
            }
            if entry.for_document {
                self.has_reductions = true;
            }
        }
        let term_idx = self.tree.push_term(term);
        self.attach(Child::Term(term_idx));
    }
}

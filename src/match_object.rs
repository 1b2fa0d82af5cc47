//! Match Object compilation (§4.2): the per-language, streaming-ready
//! dictionary the matcher scans documents against. Grounded on `matchobject.h`
//! and `hashbase.h`'s `Fast_HashTable` (32 buckets, each bucket's chain kept
//! sorted longest-term-first so a greedy longest-match scan needs no
//! backtracking).

use crate::rewriter::{ReduceMatcher, RewriterRegistry};
use crate::tree::{Child, QueryTree};

const BUCKET_COUNT: usize = 32;

fn bucket_of(first_codepoint: u32) -> usize {
    (first_codepoint as usize) & (BUCKET_COUNT - 1)
}

/// One language-variant spelling of a query term, produced by expanding the
/// term through its registered rewriter (§4.3). Several `ExpandedTerm`s can
/// point back at the same `term_idx` when a rewriter returns more than one
/// form (e.g. a compound splitter).
#[derive(Debug, Clone)]
pub struct ExpandedTerm {
    pub term_idx: usize,
    pub ucs4: Vec<u32>,
}

/// Bucket hash over first UCS-4 code point, mirroring `Fast_HashTable`:
/// fixed power-of-two bucket count, each chain sorted longest-first so the
/// matcher's greedy scan tries the longest candidate term first.
#[derive(Debug, Default)]
pub struct TermHash {
    buckets: Vec<Vec<usize>>,
}

impl TermHash {
    fn new() -> Self {
        TermHash { buckets: vec![Vec::new(); BUCKET_COUNT] }
    }

    fn insert(&mut self, expanded: &[ExpandedTerm], expanded_idx: usize) {
        let cp = expanded[expanded_idx].ucs4.first().copied().unwrap_or(0);
        let bucket = &mut self.buckets[bucket_of(cp)];
        bucket.push(expanded_idx);
        bucket.sort_by_key(|&i| std::cmp::Reverse(expanded[i].ucs4.len()));
    }

    /// Candidate expanded-term indices for a token starting with
    /// `first_codepoint`, longest term first.
    pub fn lookup(&self, first_codepoint: u32) -> &[usize] {
        &self.buckets[bucket_of(first_codepoint)]
    }
}

/// The compiled, per-language form of a `QueryTree`: a flat term hash for
/// streaming lookup, a post-order non-terminal vector for bottom-up
/// candidate promotion, and the side tables (wildcard terms, special-token
/// terms, reduce matcher) the matcher consults while scanning.
#[derive(Debug)]
pub struct MatchObject {
    pub langid: i32,
    /// Arena node index -> compiled, dense node index (post-order).
    node_idx_of: Vec<Option<usize>>,
    /// Compiled node index -> arena node index, i.e. the inverse of
    /// `node_idx_of`; this is the order the matcher walks bottom-up.
    pub nonterm_vector: Vec<usize>,
    pub expanded_terms: Vec<ExpandedTerm>,
    pub term_hash: TermHash,
    /// Expanded-term indices with no fixed first code point (`WILD`);
    /// scanned on every token regardless of its first character.
    pub wildcard_terms: Vec<usize>,
    /// Expanded-term indices flagged `SPECIALTOKEN`; scanned by the
    /// special-token registry ahead of normal tokenization (§4.4).
    pub special_token_terms: Vec<usize>,
    pub reduce_matcher: ReduceMatcher,
}

impl MatchObject {
    pub fn compile(tree: &QueryTree, langid: i32, rewriters: &RewriterRegistry) -> MatchObject {
        let mut node_idx_of = vec![None; tree.nodes.len()];
        let mut nonterm_vector = Vec::new();
        if let Some(root) = tree.root {
            assign_post_order(tree, root, &mut node_idx_of, &mut nonterm_vector);
        }

        let mut expanded_terms = Vec::new();
        let mut term_hash = TermHash::new();
        let mut wildcard_terms = Vec::new();
        let mut special_token_terms = Vec::new();
        let mut reduce_matcher = ReduceMatcher::new();

        for (term_idx, term) in tree.terms.iter().enumerate() {
            let entry = rewriters.lookup(&term.index_name);
            let mut forms = match entry {
                Some(e) if e.for_query => e.rewriter.rewrite(langid, &term.ucs4),
                _ => Vec::new(),
            };
            if forms.is_empty() {
                forms.push(term.ucs4.clone());
            }
            forms.sort();
            forms.dedup();

            for ucs4 in forms {
                let expanded_idx = expanded_terms.len();
                if let Some(e) = entry {
                    if e.for_document {
                        for reduced in e.rewriter.rewrite(langid, &ucs4) {
                            reduce_matcher.insert(reduced, term_idx);
                        }
                    }
                }
                expanded_terms.push(ExpandedTerm { term_idx, ucs4 });

                if term.is_wildcard() {
                    wildcard_terms.push(expanded_idx);
                } else if term.is_special_token() {
                    special_token_terms.push(expanded_idx);
                } else {
                    term_hash.insert(&expanded_terms, expanded_idx);
                }
            }
        }

        MatchObject {
            langid,
            node_idx_of,
            nonterm_vector,
            expanded_terms,
            term_hash,
            wildcard_terms,
            special_token_terms,
            reduce_matcher,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nonterm_vector.len()
    }

    /// Compiled node index for an arena node, or `None` if `arena_idx` was
    /// pruned by simplification (shouldn't happen for a tree this object
    /// was compiled from, but checked rather than indexed blindly).
    pub fn compiled_index(&self, arena_idx: usize) -> Option<usize> {
        self.node_idx_of.get(arena_idx).copied().flatten()
    }

    pub fn arena_index(&self, node_idx: usize) -> usize {
        self.nonterm_vector[node_idx]
    }
}

fn assign_post_order(
    tree: &QueryTree,
    child: Child,
    node_idx_of: &mut [Option<usize>],
    nonterm_vector: &mut Vec<usize>,
) {
    if let Child::Node(arena_idx) = child {
        let children = tree.nodes[arena_idx].children.clone();
        for c in children {
            assign_post_order(tree, c, node_idx_of, nonterm_vector);
        }
        node_idx_of[arena_idx] = Some(nonterm_vector.len());
        nonterm_vector.push(arena_idx);
    }
}

//! The streaming matcher (§4.4): feeds one document token at a time,
//! promoting completed candidates up through the query tree until they
//! either reach the root (a finished match, ready for ranking) or expire
//! out of their node's working set. Grounded on `Matcher.h`'s per-token
//! dispatch loop and `mcand.cpp`'s accept/promote cycle.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{MatcherConfig, StemConfig};
use crate::match_object::MatchObject;
use crate::matcher::candidate::{Accept, Candidate, CandidateRef, Elem, KeyOcc};
use crate::matcher::working_set::WorkingSet;
use crate::term::QueryTerm;
use crate::token::Token;
use crate::tree::{Child, QueryTree};
use crate::wildcard::wildcard_match;

pub struct MatchEngine<'a> {
    tree: &'a QueryTree,
    match_object: &'a MatchObject,
    config: MatcherConfig,
    stem: StemConfig,
    working_sets: Vec<WorkingSet>,
    ever_completed: Vec<bool>,
    term_parents: Vec<Option<(usize, usize)>>,
    single_term_root: Option<usize>,
    candidates_created: usize,
    completed: Vec<CandidateRef>,
}

impl<'a> MatchEngine<'a> {
    pub fn new(
        tree: &'a QueryTree,
        match_object: &'a MatchObject,
        config: MatcherConfig,
        stem: StemConfig,
    ) -> Self {
        let node_count = match_object.node_count();
        let single_term_root = match tree.root {
            Some(Child::Term(t)) => Some(t),
            _ => None,
        };
        MatchEngine {
            tree,
            match_object,
            config,
            stem,
            working_sets: (0..node_count).map(|_| WorkingSet::new()).collect(),
            ever_completed: vec![false; node_count],
            term_parents: compute_term_parents(tree),
            single_term_root,
            candidates_created: 0,
            completed: Vec::new(),
        }
    }

    /// Consumes the whole token stream for one document, returning every
    /// candidate that reached the root with its proximity constraints
    /// satisfied. `doc` is the raw document byte stream, scanned once ahead
    /// of tokenization for special-token terms (§4.4).
    pub fn run(mut self, tokens: &[Token], doc: &[u8]) -> Vec<CandidateRef> {
        self.feed_special(doc, tokens);
        for token in tokens {
            self.age_out_all(token.word_pos);
            self.feed(token);
        }
        self.completed
    }

    fn age_out_all(&mut self, current_pos: usize) {
        for (node_idx, ws) in self.working_sets.iter_mut().enumerate() {
            ws.age_out(
                current_pos,
                self.config.winsize,
                self.config.winsize_fallback_multiplier,
                self.ever_completed[node_idx],
            );
        }
    }

    /// A raw-byte scan for special-token terms (§4.4), run ahead of normal
    /// tokenization so a special token can match even when the wordfolder
    /// would otherwise split or discard it. Each hit's word position is
    /// approximated from the token whose byte range it falls in.
    fn feed_special(&mut self, doc: &[u8], tokens: &[Token]) {
        let hits: Vec<(usize, Option<usize>, usize, usize, usize)> = self
            .match_object
            .special_token_terms
            .iter()
            .flat_map(|&exp_idx| {
                let expanded = &self.match_object.expanded_terms[exp_idx];
                let term_idx = expanded.term_idx;
                let pattern: Vec<u8> = expanded.ucs4.iter().map(|&cp| cp as u8).collect();
                find_all(doc, &pattern)
                    .into_iter()
                    .map(move |byte_pos| (term_idx, Some(exp_idx), word_pos_at(tokens, byte_pos), byte_pos, pattern.len()))
                    .collect::<Vec<_>>()
            })
            .collect();

        for (term_idx, exp_idx, word_pos, byte_pos, byte_len) in hits {
            self.accept_term_occurrence(term_idx, exp_idx, word_pos, byte_pos, byte_len, true);
        }
    }

    fn feed(&mut self, token: &Token) {
        let first = token.first_codepoint();
        let slice = token.as_slice();
        let bucket = self.match_object.term_hash.lookup(first);
        let literal_candidates: Vec<usize> =
            bucket.iter().chain(self.match_object.wildcard_terms.iter()).copied().collect();

        for exp_idx in literal_candidates {
            let expanded = &self.match_object.expanded_terms[exp_idx];
            let term = &self.tree.terms[expanded.term_idx];
            if !term_matches(term, &expanded.ucs4, slice, &self.stem) {
                continue;
            }
            let exact = expanded.ucs4.len() == slice.len();
            term.stats.record(exact);
            let term_idx = expanded.term_idx;
            self.accept_term_occurrence(term_idx, Some(exp_idx), token.word_pos, token.byte_pos, token.byte_len, exact);
        }

        // Document-side reductions (§4.3): a token whose reduced form was
        // registered by a rewriter matches every query term that reduces to
        // the same form, even with no literal overlap.
        let reduced: Vec<usize> = self.match_object.reduce_matcher.lookup(slice).to_vec();
        for term_idx in reduced {
            let exact = self.tree.terms[term_idx].len() == slice.len();
            self.accept_term_occurrence(term_idx, None, token.word_pos, token.byte_pos, token.byte_len, exact);
        }
    }

    fn accept_term_occurrence(
        &mut self,
        term_idx: usize,
        expanded_idx: Option<usize>,
        word_pos: usize,
        byte_pos: usize,
        byte_len: usize,
        exact: bool,
    ) {
        let weight = self.tree.terms[term_idx].weight;
        let occ = KeyOcc { expanded_idx, term_idx, word_pos, byte_pos, byte_len, weight, is_exact: exact };

        match self.term_parents[term_idx] {
            Some((parent_idx, child_no)) => self.offer(parent_idx, child_no, Elem::Key(occ)),
            None if self.single_term_root == Some(term_idx) => {
                if self.completed.len() < self.config.need_complete_cnt.saturating_mul(8).max(1) {
                    self.completed.push(Candidate::single(occ));
                }
            }
            None => {}
        }
    }

    fn offer(&mut self, arena_idx: usize, child_no: usize, elem: Elem) {
        let node_idx = match self.match_object.compiled_index(arena_idx) {
            Some(n) => n,
            None => return,
        };
        let word_pos = elem.start_word_pos();
        let winsize = self.config.winsize;

        let mut target: Option<CandidateRef> = None;
        for c in self.working_sets[node_idx].iter() {
            match c.borrow().accept(child_no, word_pos, winsize) {
                Accept::Ok => {
                    target = Some(Rc::clone(c));
                    break;
                }
                Accept::Exists => return,
                Accept::Overlap | Accept::Expired => continue,
            }
        }

        let candidate = match target {
            Some(c) => c,
            None => {
                if self.candidates_created >= self.config.max_match_candidates {
                    return;
                }
                let node = &self.tree.nodes[arena_idx];
                let c = Rc::new(RefCell::new(Candidate::new(arena_idx, node)));
                self.candidates_created += 1;
                self.working_sets[node_idx].push(Rc::clone(&c));
                c
            }
        };
        candidate.borrow_mut().fill(child_no, elem);

        let (complete, valid) = {
            let c = candidate.borrow();
            let limit = self.tree.nodes[arena_idx].limit;
            (c.is_complete(), c.is_complete() && c.satisfies_limit(limit))
        };

        if complete && valid {
            self.working_sets[node_idx].remove(&candidate);
            self.ever_completed[node_idx] = true;
            self.promote(arena_idx, candidate);
        }
    }

    fn promote(&mut self, arena_idx: usize, candidate: CandidateRef) {
        match self.tree.nodes[arena_idx].parent {
            Some((parent_idx, child_no)) => self.offer(parent_idx, child_no, Elem::Sub(candidate)),
            None => {
                if self.completed.len() < self.config.need_complete_cnt.saturating_mul(8).max(1) {
                    self.completed.push(candidate);
                }
            }
        }
    }
}

/// §4.4's three-rule per-token dispatch: EXACT-gate, then wildcard, then
/// stem-extension. `expanded` is the term's (possibly rewritten) spelling;
/// `slice` is the document token being tested against it.
fn term_matches(term: &QueryTerm, expanded: &[u32], slice: &[u32], stem: &StemConfig) -> bool {
    if term.is_exact_only() && slice.len() != expanded.len() {
        return false;
    }
    if term.is_wildcard() {
        return wildcard_match(slice, expanded);
    }
    if slice.len() < expanded.len() {
        return false;
    }
    if !term.is_prefix() {
        let within_extend = if expanded.len() > stem.min_length {
            slice.len() <= expanded.len() + stem.max_extend
        } else {
            slice.len() == expanded.len()
        };
        if !within_extend {
            return false;
        }
    }
    &slice[..expanded.len()] == expanded
}

fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits = Vec::new();
    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        match haystack[start..].windows(needle.len()).position(|w| w == needle) {
            Some(offset) => {
                let byte_pos = start + offset;
                hits.push(byte_pos);
                start = byte_pos + needle.len();
            }
            None => break,
        }
    }
    hits
}

/// Approximate word position of a raw byte offset, via the last token whose
/// range starts at or before it. `tokens` is assumed sorted ascending by
/// `byte_pos`, true of any ordinary tokenization.
fn word_pos_at(tokens: &[Token], byte_pos: usize) -> usize {
    if tokens.is_empty() {
        return 0;
    }
    let idx = tokens.partition_point(|t| t.byte_pos <= byte_pos);
    tokens[idx.saturating_sub(1).min(tokens.len() - 1)].word_pos
}

fn compute_term_parents(tree: &QueryTree) -> Vec<Option<(usize, usize)>> {
    let mut parents = vec![None; tree.terms.len()];
    for (arena_idx, node) in tree.nodes.iter().enumerate() {
        for (child_no, child) in node.children.iter().enumerate() {
            if let Child::Term(t) = *child {
                parents[t] = Some((arena_idx, child_no));
            }
        }
    }
    parents
}

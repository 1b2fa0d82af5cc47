//! Proximity ranking (§4.5): turns the engine's completed root candidates
//! into one document-level relevance score. Grounded on `mcand.cpp`'s
//! `rank()` and the per-document aggregation that picks the best few
//! candidates rather than summing every match in the document.

use crate::config::ProximityConfig;
use crate::matcher::CandidateRef;
use crate::tree::QueryTree;

/// 4/5 geometric decay applied per rank position beyond the best match.
const RANK_DECAY: f64 = 0.8;
/// Only the best few candidates move the document rank; a document with
/// hundreds of matches shouldn't outscore one with three excellent ones.
const TOP_N_CANDIDATES: usize = 3;

/// Rank contribution of a single candidate, before document aggregation:
/// `elem_weight << 11 - word_distance << 8 - start_pos / 256`. Tighter
/// clusters (`word_distance` small) and earlier occurrences (`start_pos`
/// small) rank higher for the same accumulated weight.
pub fn candidate_rank(candidate: &CandidateRef) -> i64 {
    let c = candidate.borrow();
    let elem_weight = i64::from(c.weight);
    let span = c.end_pos.saturating_sub(c.start_pos);
    let arity_gaps = c.arity().max(1) - 1;
    let word_distance = i64::try_from(span.saturating_sub(arity_gaps)).unwrap_or(i64::MAX);
    let start_pos = i64::try_from(c.start_pos).unwrap_or(0);
    (elem_weight << 11) - (word_distance << 8) - (start_pos / 256)
}

fn aggregate(candidates: &[CandidateRef], config: &ProximityConfig) -> i64 {
    if candidates.is_empty() {
        return 0;
    }
    let mut ranks: Vec<i64> = candidates.iter().map(candidate_rank).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let mut total = 0.0_f64;
    let mut decay = 1.0_f64;
    for &r in ranks.iter().take(TOP_N_CANDIDATES) {
        total += r as f64 * decay;
        decay *= RANK_DECAY;
    }
    (total * config.normalized_factor()) as i64
}

/// Document-level proximity rank (§4.5, §8):
/// - a single-term query carries no proximity structure at all, so it
///   always scores the flat `noconstraint_offset` regardless of how many
///   times the term occurs;
/// - a query with no `CONSTR` non-terminal at its root (bare `OR`/`ANY`)
///   gets the offset added on top of whatever proximity score it earns,
///   since satisfying a window was never required for it to match;
/// - everything else scores purely on the aggregated candidate ranks, with
///   no candidates at all producing a rank of zero.
pub fn document_rank(tree: &QueryTree, candidates: &[CandidateRef], config: &ProximityConfig) -> i64 {
    if tree.is_single_term() {
        return config.noconstraint_offset;
    }

    let scaled = aggregate(candidates, config);
    if tree.has_constraints() {
        scaled
    } else {
        scaled + config.noconstraint_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProximityConfig;
    use crate::match_object::MatchObject;
    use crate::matcher::MatchEngine;
    use crate::rewriter::RewriterRegistry;
    use crate::term::QueryTerm;
    use crate::token::Token;
    use crate::tree::{Child, NodeKind};

    fn push_term(tree: &mut QueryTree, s: &str) -> Child {
        let ucs4: Vec<u32> = s.chars().map(|c| c as u32).collect();
        Child::Term(tree.push_term(QueryTerm::new(ucs4, s.len(), "default")))
    }

    fn token(word: &str, word_pos: usize, byte_pos: usize) -> Token {
        let ucs4: Vec<u32> = word.chars().map(|c| c as u32).collect();
        Token::new(ucs4, byte_pos, word.len(), word_pos)
    }

    #[test]
    fn single_term_query_always_scores_the_offset() {
        let mut tree = QueryTree::new();
        tree.root = Some(push_term(&mut tree, "dog"));
        tree.compute_thresholds();
        let config = ProximityConfig::default();
        assert_eq!(document_rank(&tree, &[], &config), config.noconstraint_offset);
    }

    #[test]
    fn constrained_root_with_no_candidates_scores_zero() {
        // NEAR carries CONSTR in its own base options, unlike ANDNOT/RANK
        // (ONLY_1), which simplify away into their surviving child and so
        // never reach `document_rank` as a non-terminal themselves.
        let mut tree = QueryTree::new();
        let near_idx = tree.push_node(NodeKind::Near);
        tree.nodes[near_idx].limit = 4;
        let a = push_term(&mut tree, "dog");
        let b = push_term(&mut tree, "cat");
        tree.nodes[near_idx].children.push(a);
        tree.nodes[near_idx].children.push(b);
        tree.root = Some(Child::Node(near_idx));
        tree.simplify();
        tree.compute_thresholds();
        assert!(tree.has_constraints());
        let config = ProximityConfig::default();
        assert_eq!(document_rank(&tree, &[], &config), 0);
    }

    #[test]
    fn or_query_gets_offset_added_even_with_matches() {
        let mut tree = QueryTree::new();
        let or_idx = tree.push_node(NodeKind::Or);
        let a = push_term(&mut tree, "dog");
        let b = push_term(&mut tree, "cat");
        tree.nodes[or_idx].children.push(a);
        tree.nodes[or_idx].children.push(b);
        tree.root = Some(Child::Node(or_idx));
        tree.simplify();
        tree.compute_thresholds();
        assert!(!tree.has_constraints());

        let rewriters = RewriterRegistry::new();
        let mo = MatchObject::compile(&tree, 0, &rewriters);
        let tokens = vec![token("a", 0, 0), token("dog", 1, 2)];
        let engine = MatchEngine::new(
            &tree,
            &mo,
            crate::config::MatcherConfig::default(),
            crate::config::StemConfig::default(),
        );
        let completed = engine.run(&tokens, b"a dog");
        assert!(!completed.is_empty());

        let config = ProximityConfig::default();
        let rank = document_rank(&tree, &completed, &config);
        assert!(rank > config.noconstraint_offset);
    }
}

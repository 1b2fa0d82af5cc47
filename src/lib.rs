//! Juniper: dynamic, query-biased summarization and proximity ranking.
//!
//! A caller's boolean query engine has already decided a document matches;
//! Juniper's job starts there. Given a query tree (built through the
//! [`visitor`] seam) and a document's token stream, it finds where the
//! query's terms occur close together ([`matcher`], [`rank`]) and builds a
//! highlighted teaser around the best of those occurrences ([`summary`]).
//! Indexing, persistence, tokenization policy, and boolean evaluation all
//! stay with the caller — this crate runs once per query per document, at
//! read time, purely to explain and illustrate a match that already
//! happened.

pub mod config;
pub mod debug_parser;
pub mod error;
pub mod match_object;
pub mod matcher;
pub mod option_string;
pub mod rank;
pub mod rewriter;
pub mod summary;
pub mod term;
pub mod token;
pub mod tree;
pub mod visitor;
pub mod wildcard;

pub use config::JuniperConfig;
pub use error::{Error, InternalError, Result, UserError};
pub use matcher::CandidateRef;
pub use option_string::QueryOptions;
pub use rewriter::{Rewriter, RewriterRegistry};
pub use token::Token;
pub use tree::QueryTree;
pub use visitor::{Operator, QueryVisitor, TreeBuilder, UsefulIndex};

use matcher::MatchEngine;

/// Outcome of analysing one document against one query (§5): every
/// completed candidate the matcher found, and the document-level proximity
/// rank derived from them.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub candidates: Vec<CandidateRef>,
    pub rank: i64,
}

/// One compiled query, ready to analyse any number of documents. Roughly
/// the original `QueryHandle`: owns the simplified tree with the
/// option-string overrides already folded in, plus the configuration those
/// overrides adjusted.
pub struct Query {
    tree: QueryTree,
    config: JuniperConfig,
}

impl Query {
    /// Builds a query tree from a host's own traversal (`drive` calls
    /// `enter_op`/`keyword`/`leave_op` on the visitor it's given) and folds
    /// in the per-query option-string overrides (§4.1, §6) before the tree
    /// is simplified and its thresholds computed.
    pub fn build(
        options: &str,
        mut config: JuniperConfig,
        useful_index: &dyn UsefulIndex,
        rewriters: &RewriterRegistry,
        drive: impl FnOnce(&mut dyn QueryVisitor),
    ) -> Query {
        let parsed = QueryOptions::parse(options);

        let mut builder = TreeBuilder::new(useful_index, rewriters);
        drive(&mut builder);
        let mut tree = builder.into_tree();

        apply_tree_overrides(&mut tree, &parsed);
        tree.simplify();
        tree.apply_global_options();
        tree.compute_thresholds();

        apply_config_overrides(&mut config, &parsed);

        Query { tree, config }
    }

    pub fn tree(&self) -> &QueryTree {
        &self.tree
    }

    pub fn config(&self) -> &JuniperConfig {
        &self.config
    }

    /// Runs the streaming matcher over one document's token stream for one
    /// language, then ranks the outcome (§4.4, §4.5). `doc` is the raw
    /// document text, scanned for special-token terms ahead of the per-token
    /// loop. The Match Object is compiled fresh per call: a query is rarely
    /// re-analysed against the same language/document pair within one
    /// request.
    pub fn analyse(&self, doc: &str, tokens: &[Token], langid: i32, rewriters: &RewriterRegistry) -> Analysis {
        let match_object = match_object::MatchObject::compile(&self.tree, langid, rewriters);
        let engine = MatchEngine::new(&self.tree, &match_object, self.config.matcher, self.config.stem);
        let candidates = engine.run(tokens, doc.as_bytes());
        let rank = rank::document_rank(&self.tree, &candidates, &self.config.proximity);
        Analysis { candidates, rank }
    }

    /// Builds the highlighted teaser for a document already analysed by
    /// [`Query::analyse`] (§4.6).
    pub fn teaser(&self, doc: &str, analysis: &Analysis) -> String {
        summary::summarize(doc, &analysis.candidates, &self.config.dynsum)
    }
}

fn apply_tree_overrides(tree: &mut QueryTree, parsed: &QueryOptions) {
    if let Some(limit) = parsed.near.or(parsed.within).or(parsed.onear) {
        tree.global_limit = Some(limit);
    }
}

fn apply_config_overrides(config: &mut JuniperConfig, parsed: &QueryOptions) {
    if let Some(v) = parsed.dynlength {
        config.dynsum.length = v.max(0) as usize;
    }
    if let Some(v) = parsed.dynmatches {
        config.dynsum.max_matches = v.max(0) as usize;
    }
    if let Some(v) = parsed.dynsurmax {
        config.dynsum.surround_max = v.max(0) as usize;
    }
    if let Some(v) = parsed.stemmin {
        config.stem.min_length = v;
    }
    if let Some(v) = parsed.stemext {
        config.stem.max_extend = v;
    }
    if let Some(v) = parsed.winsize {
        config.matcher.winsize = v;
    }
    if let Some(v) = parsed.winsize_fallback_multiplier {
        config.matcher.winsize_fallback_multiplier = v;
    }
    if let Some(v) = parsed.max_match_candidates {
        config.matcher.max_match_candidates = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn useful_always(_: &str) -> bool {
        true
    }

    fn token(word: &str, word_pos: usize, byte_pos: usize) -> Token {
        let ucs4: Vec<u32> = word.chars().map(|c| c as u32).collect();
        Token::new(ucs4, byte_pos, word.len(), word_pos)
    }

    #[test]
    fn end_to_end_near_query_produces_a_teaser() {
        let rewriters = RewriterRegistry::new();
        let useful = &useful_always as &dyn UsefulIndex;
        let query = Query::build("near.4_dynlength.64", JuniperConfig::default(), useful, &rewriters, |v| {
            v.enter_op(Operator::Near(10), "default");
            v.keyword(b"dog", false, false, "default");
            v.keyword(b"house", false, false, "default");
            v.leave_op();
        });

        assert_eq!(query.tree.nodes[0].limit, 4);

        let doc = "the dog ran to the house at dusk";
        let tokens: Vec<Token> = doc
            .split_whitespace()
            .scan(0usize, |byte_pos, w| {
                let start = doc[*byte_pos..].find(w).map(|i| i + *byte_pos).unwrap_or(*byte_pos);
                *byte_pos = start + w.len();
                Some((w, start))
            })
            .enumerate()
            .map(|(i, (w, pos))| token(w, i, pos))
            .collect();

        let analysis = query.analyse(doc, &tokens, 0, &rewriters);
        assert_eq!(analysis.candidates.len(), 1);

        let teaser = query.teaser(doc, &analysis);
        assert!(teaser.contains("<b>dog</b>"));
        assert!(teaser.contains("<b>house</b>"));
    }
}

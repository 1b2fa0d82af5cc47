//! Term rewriting (§4.3): language-variant expansion at query time and
//! reduced-form matching at document time, grounded on `rewriter.h`'s
//! `IRewriter`/`Rewriter` split. The host owns the actual linguistic
//! knowledge (stemmer, compound splitter, …); this crate only defines the
//! seam it plugs into and the registry keyed by index name.

use std::sync::Arc;

use rustc_hash::FxHashMap;

/// One language-specific expansion or reduction of a term. A rewriter
/// implementation is free to return zero, one, or several variants.
pub trait Rewriter: Send + Sync {
    /// Expands `ucs4` for query time: every variant returned is ORed into
    /// the term's matching alternatives (§4.3, "for_query").
    fn rewrite(&self, langid: i32, ucs4: &[u32]) -> Vec<Vec<u32>>;

    /// True if this rewriter should run while building the query-time Match
    /// Object (expansion).
    fn for_query(&self) -> bool;

    /// True if this rewriter should also run against indexed document terms
    /// (reduction, e.g. stemming both sides to a common root) so the
    /// reduce-matcher table in the Match Object maps a reduced form back to
    /// every query term that reduces to it.
    fn for_document(&self) -> bool;
}

#[derive(Clone)]
pub struct RewriterEntry {
    pub rewriter: Arc<dyn Rewriter>,
    pub for_query: bool,
    pub for_document: bool,
}

/// Maps index name to the rewriter registered for it. A query with no
/// registered rewriter for an index matches terms literally.
#[derive(Default, Clone)]
pub struct RewriterRegistry {
    by_index: FxHashMap<String, RewriterEntry>,
}

impl RewriterRegistry {
    pub fn new() -> Self {
        RewriterRegistry::default()
    }

    pub fn register(&mut self, index_name: impl Into<String>, rewriter: Arc<dyn Rewriter>) {
        let for_query = rewriter.for_query();
        let for_document = rewriter.for_document();
        self.by_index.insert(index_name.into(), RewriterEntry { rewriter, for_query, for_document });
    }

    pub fn lookup(&self, index_name: &str) -> Option<&RewriterEntry> {
        self.by_index.get(index_name)
    }
}

/// A table mapping a reduced form (e.g. a stem) back to every query term
/// index that reduces to it, used by the matcher to accept a document token
/// that doesn't match any query term literally but shares its reduced form
/// (§4.3).
#[derive(Debug, Default, Clone)]
pub struct ReduceMatcher {
    by_reduced: FxHashMap<Vec<u32>, Vec<usize>>,
}

impl ReduceMatcher {
    pub fn new() -> Self {
        ReduceMatcher::default()
    }

    pub fn insert(&mut self, reduced: Vec<u32>, term_idx: usize) {
        self.by_reduced.entry(reduced).or_default().push(term_idx);
    }

    pub fn lookup(&self, reduced: &[u32]) -> &[usize] {
        self.by_reduced.get(reduced).map(Vec::as_slice).unwrap_or(&[])
    }
}

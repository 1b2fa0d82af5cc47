//! Match candidates, grounded on `mcand.cpp`'s `MatchCandidate`. A candidate
//! accumulates, slot by slot, the occurrences that satisfy one non-terminal's
//! children. Once a child slot is itself a completed candidate for a deeper
//! non-terminal, it's referenced by `Rc` rather than copied — the "published
//! as a child of another candidate" sharing the design note calls for.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::term::NodeOptions;
use crate::tree::TreeNode;

/// Most non-terminals have a handful of children at most; this keeps small
/// candidates off the heap entirely.
pub type ElemSlots = SmallVec<[Option<Elem>; 4]>;

pub type CandidateRef = Rc<RefCell<Candidate>>;

/// A single query-term occurrence in the document token stream.
/// `expanded_idx` is `None` for an occurrence accepted through the reduce
/// matcher (§4.3), which resolves straight to a `term_idx` with no
/// particular expanded spelling behind it.
#[derive(Debug, Clone, Copy)]
pub struct KeyOcc {
    pub expanded_idx: Option<usize>,
    pub term_idx: usize,
    pub word_pos: usize,
    pub byte_pos: usize,
    pub byte_len: usize,
    pub weight: i32,
    pub is_exact: bool,
}

#[derive(Debug, Clone)]
pub enum Elem {
    Key(KeyOcc),
    Sub(CandidateRef),
}

impl Elem {
    pub fn start_word_pos(&self) -> usize {
        match self {
            Elem::Key(k) => k.word_pos,
            Elem::Sub(c) => c.borrow().start_pos,
        }
    }

    pub fn end_word_pos(&self) -> usize {
        match self {
            Elem::Key(k) => k.word_pos,
            Elem::Sub(c) => c.borrow().end_pos,
        }
    }

    pub fn weight(&self) -> i32 {
        match self {
            Elem::Key(k) => k.weight,
            Elem::Sub(c) => c.borrow().weight,
        }
    }
}

/// Outcome of offering a new occurrence to an existing candidate's slot,
/// mirroring the `EXISTS`/`OVERLAP`/`OK`/`EXPIRED` states `mcand.cpp`'s
/// `accept()` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// Slot accepted the occurrence.
    Ok,
    /// This exact occurrence is already in that slot; ignore.
    Exists,
    /// The slot is filled with something else; start a fresh candidate
    /// instead of mutating this one.
    Overlap,
    /// The candidate is older than the matcher's window; evict it first.
    Expired,
}

/// A partially or fully matched instance of one non-terminal's children,
/// addressed by the arena index of the node it belongs to.
#[derive(Debug)]
pub struct Candidate {
    pub arena_idx: usize,
    pub options: NodeOptions,
    pub elems: ElemSlots,
    pub nelems: usize,
    pub start_pos: usize,
    pub end_pos: usize,
    pub weight: i32,
}

impl Candidate {
    /// Wraps a bare occurrence for the degenerate single-term query (§4.5,
    /// §8): there's no non-terminal above it, so it's its own candidate.
    pub fn single(occ: KeyOcc) -> CandidateRef {
        let weight = occ.weight;
        let pos = occ.word_pos;
        Rc::new(RefCell::new(Candidate {
            arena_idx: usize::MAX,
            options: NodeOptions::NONE,
            elems: ElemSlots::from_elem(Some(Elem::Key(occ)), 1),
            nelems: 1,
            start_pos: pos,
            end_pos: pos,
            weight,
        }))
    }

    pub fn new(arena_idx: usize, node: &TreeNode) -> Self {
        Candidate {
            arena_idx,
            options: node.options,
            elems: ElemSlots::from_elem(None, node.arity().max(1)),
            nelems: 0,
            start_pos: usize::MAX,
            end_pos: 0,
            weight: 0,
        }
    }

    pub fn arity(&self) -> usize {
        self.elems.len()
    }

    /// Whether offering an occurrence at `word_pos` for `child_no` should be
    /// accepted, already seen, conflicting, or the candidate has aged out.
    pub fn accept(&self, child_no: usize, word_pos: usize, winsize: usize) -> Accept {
        if self.start_pos != usize::MAX && word_pos.saturating_sub(self.start_pos) > winsize {
            return Accept::Expired;
        }
        match &self.elems[child_no] {
            None => Accept::Ok,
            Some(existing) if existing.start_word_pos() == word_pos => Accept::Exists,
            Some(_) => Accept::Overlap,
        }
    }

    pub fn fill(&mut self, child_no: usize, elem: Elem) {
        let start = elem.start_word_pos();
        let end = elem.end_word_pos();
        self.weight += elem.weight();
        self.start_pos = self.start_pos.min(start);
        self.end_pos = self.end_pos.max(end);
        self.elems[child_no] = Some(elem);
        self.nelems += 1;
    }

    /// A candidate for `OR`/`ANY` only needs one child present to justify a
    /// highlight; everything else (`AND`, the `LIMIT`/`ORDERED` operators,
    /// `PHRASE`) needs every slot filled. Juniper scores proximity on
    /// documents a boolean query already matched, so a partial `OR` is still
    /// a legitimate place to point a reader at, not a retrieval decision.
    pub fn is_complete(&self) -> bool {
        if self.nelems == 0 {
            return false;
        }
        if self.options.intersects(NodeOptions::OR | NodeOptions::ANY) {
            true
        } else {
            self.nelems == self.arity()
        }
    }

    /// Positional validation for `LIMIT`/`ORDERED`/`EXACT` nodes (§4.4,
    /// invariant #7): for `LIMIT`, the average inter-child gap —
    /// `(word_length - sum of each child's own word_length) / (arity - 1)`
    /// — must not exceed `limit`; children must appear in declared order
    /// when `ORDERED`, and must be exactly adjacent when `EXACT` (phrase
    /// matching).
    pub fn satisfies_limit(&self, limit: u32) -> bool {
        if self.options.contains(NodeOptions::LIMIT) {
            let word_length = self.end_pos.saturating_sub(self.start_pos);
            let children_length: usize = self
                .elems
                .iter()
                .flatten()
                .map(|e| e.end_word_pos().saturating_sub(e.start_word_pos()))
                .sum();
            let gap = word_length.saturating_sub(children_length);
            let gaps = self.arity().saturating_sub(1);
            if gap > (limit as usize).saturating_mul(gaps) {
                return false;
            }
        }
        if self.options.contains(NodeOptions::ORDERED) || self.options.contains(NodeOptions::EXACT)
        {
            let mut prev: Option<usize> = None;
            for elem in self.elems.iter().flatten() {
                let pos = elem.start_word_pos();
                if let Some(p) = prev {
                    if pos <= p {
                        return false;
                    }
                    if self.options.contains(NodeOptions::EXACT) && pos != p + 1 {
                        return false;
                    }
                }
                prev = Some(pos);
            }
        }
        true
    }
}

//! The streaming token matcher (§4.4): the largest piece of this crate,
//! split into the candidate data model, the per-node working sets that
//! hold in-progress candidates, and the engine that drives both from a
//! document's token stream.

pub mod candidate;
pub mod engine;
pub mod working_set;

pub use candidate::{Accept, Candidate, CandidateRef, Elem, KeyOcc};
pub use engine::MatchEngine;
pub use working_set::WorkingSet;

//! Summary / teaser generation (§4.6): the last stage of the pipeline,
//! turning ranked candidates into the highlighted text a caller shows next
//! to a search result. Grounded on milli's `matches/mod.rs` for the overall
//! crop-and-highlight shape, adapted to Juniper's window-budget and
//! continuation rules.

pub mod descriptor;
pub mod emit;

pub use descriptor::{build_descriptor, leaf_occurrences, MatchWindow, SummaryDescriptor};
pub use emit::render;

use crate::config::SummaryConfig;
use crate::matcher::CandidateRef;

/// Builds the descriptor and renders it in one call — the entry point most
/// callers want (§5, `GetTeaser`).
pub fn summarize(doc: &str, candidates: &[CandidateRef], config: &SummaryConfig) -> String {
    let descriptor = build_descriptor(doc, candidates, config);
    render(doc, &descriptor, config)
}

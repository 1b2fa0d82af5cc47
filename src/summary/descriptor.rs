//! Summary descriptor construction (§4.6): turns ranked candidates into a
//! plan of which byte windows of the document to show, grounded on milli's
//! `matches/mod.rs` (`MatcherBuilder`/`FormatOptions`) for the match-picking
//! and windowing shape, adapted to Juniper's word-completion and
//! accidental-match-folding rules from the original teaser builder.

use crate::config::{Fallback, SummaryConfig, MAX_SCAN_WORD, MIN_CONTINUATION, MIN_SURROUND_LEN};
use crate::matcher::{CandidateRef, Elem, KeyOcc};
use crate::rank::candidate_rank;

/// One contiguous slice of the document to emit, with the byte ranges
/// inside it that should be wrapped in highlight markup.
#[derive(Debug, Clone, Default)]
pub struct MatchWindow {
    pub start_byte: usize,
    pub end_byte: usize,
    pub highlights: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct SummaryDescriptor {
    pub windows: Vec<MatchWindow>,
    /// Set when the whole document fit inside `length` and needed no
    /// cropping — only highlight markup and no continuation markers.
    pub whole_document: bool,
}

/// Recursively collects every leaf term occurrence feeding a candidate,
/// flattening nested `Elem::Sub` candidates depth-first.
pub fn leaf_occurrences(candidate: &CandidateRef) -> Vec<KeyOcc> {
    let c = candidate.borrow();
    let mut out = Vec::new();
    for elem in c.elems.iter().flatten() {
        match elem {
            Elem::Key(k) => out.push(*k),
            Elem::Sub(sub) => out.extend(leaf_occurrences(sub)),
        }
    }
    out
}

pub fn build_descriptor(doc: &str, candidates: &[CandidateRef], config: &SummaryConfig) -> SummaryDescriptor {
    if doc.len() <= config.length {
        let ranges: Vec<(usize, usize)> =
            candidates.iter().flat_map(leaf_occurrences).map(|k| (k.byte_pos, k.byte_pos + k.byte_len)).collect();
        return SummaryDescriptor {
            whole_document: true,
            windows: vec![MatchWindow { start_byte: 0, end_byte: doc.len(), highlights: merge_ranges(ranges) }],
        };
    }

    let mut ranked: Vec<&CandidateRef> = candidates.iter().collect();
    ranked.sort_by_key(|c| std::cmp::Reverse(candidate_rank(c)));

    let per_elem = (config.length / config.max_matches.max(1)).max(MIN_SURROUND_LEN).min(config.surround_max.max(MIN_SURROUND_LEN));

    let mut chosen: Vec<MatchWindow> = Vec::new();
    let mut used_budget = 0usize;

    for c in ranked {
        if chosen.len() >= config.max_matches {
            break;
        }
        let occs = leaf_occurrences(c);
        if occs.is_empty() {
            continue;
        }
        let min_byte = occs.iter().map(|o| o.byte_pos).min().unwrap();
        let max_byte = occs.iter().map(|o| o.byte_pos + o.byte_len).max().unwrap();
        let span = max_byte.saturating_sub(min_byte);
        let half_budget = per_elem.saturating_sub(span) / 2;

        let mut start = snap_to_word_start(doc, min_byte.saturating_sub(half_budget), config);
        let mut end = snap_to_word_end(doc, (max_byte + half_budget).min(doc.len()), config);
        if end <= start {
            start = min_byte;
            end = max_byte.min(doc.len());
        }

        if chosen.iter().any(|w| ranges_overlap((w.start_byte, w.end_byte), (start, end))) {
            continue;
        }
        if !chosen.is_empty() && used_budget + (end - start) > config.length {
            continue;
        }
        used_budget += end - start;

        let highlights = merge_ranges(occs.iter().map(|o| (o.byte_pos, o.byte_pos + o.byte_len)).collect());
        chosen.push(MatchWindow { start_byte: start, end_byte: end, highlights });
    }

    chosen.sort_by_key(|w| w.start_byte);
    fold_adjacent_windows(&mut chosen);

    if chosen.is_empty() {
        match config.fallback {
            Fallback::Prefix => SummaryDescriptor {
                whole_document: false,
                windows: vec![MatchWindow {
                    start_byte: 0,
                    end_byte: snap_to_word_end(doc, config.length.min(doc.len()), config),
                    highlights: Vec::new(),
                }],
            },
            Fallback::None => SummaryDescriptor::default(),
        }
    } else {
        SummaryDescriptor { whole_document: false, windows: chosen }
    }
}

/// Merges windows that are close enough that a continuation between them
/// would just restate a handful of skipped words (§4.6's accidental-match
/// folding): anything under `MIN_CONTINUATION` bytes apart is one window.
fn fold_adjacent_windows(windows: &mut Vec<MatchWindow>) {
    let mut folded: Vec<MatchWindow> = Vec::with_capacity(windows.len());
    for w in windows.drain(..) {
        if let Some(last) = folded.last_mut() {
            if w.start_byte.saturating_sub(last.end_byte) < MIN_CONTINUATION {
                last.end_byte = last.end_byte.max(w.end_byte);
                last.highlights.extend(w.highlights);
                last.highlights = merge_ranges(std::mem::take(&mut last.highlights));
                continue;
            }
        }
        folded.push(w);
    }
    *windows = folded;
}

fn ranges_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for r in ranges {
        if let Some(last) = merged.last_mut() {
            if r.0 <= last.1 {
                last.1 = last.1.max(r.1);
                continue;
            }
        }
        merged.push(r);
    }
    merged
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Extends `pos` backward to the nearest word boundary, scanning at most
/// `MAX_SCAN_WORD` bytes before giving up and cutting mid-word (§4.6).
fn snap_to_word_start(doc: &str, pos: usize, config: &SummaryConfig) -> usize {
    let pos = floor_char_boundary(doc, pos.min(doc.len()));
    let scan_from = ceil_char_boundary(doc, pos.saturating_sub(MAX_SCAN_WORD));
    let slice = &doc[scan_from..pos];
    match slice.char_indices().rev().find(|&(_, c)| config.is_separator(c) || c.is_whitespace()) {
        Some((i, c)) => scan_from + i + c.len_utf8(),
        None => pos,
    }
}

fn snap_to_word_end(doc: &str, pos: usize, config: &SummaryConfig) -> usize {
    let pos = ceil_char_boundary(doc, pos.min(doc.len()));
    let scan_to = floor_char_boundary(doc, (pos + MAX_SCAN_WORD).min(doc.len()));
    let slice = &doc[pos..scan_to];
    match slice.char_indices().find(|&(_, c)| config.is_separator(c) || c.is_whitespace()) {
        Some((i, _)) => pos + i,
        None => pos,
    }
}

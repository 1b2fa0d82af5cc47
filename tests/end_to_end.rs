//! Black-box scenarios exercising the public API end to end: building a
//! query through the visitor seam, analysing a document, and rendering the
//! resulting teaser, mirroring the shape of the teacher's own `tests/`
//! directories (whole-pipeline coverage, not per-module unit checks).

use juniper::{
    token, Analysis, JuniperConfig, Operator, Query, QueryVisitor, RewriterRegistry, Token,
    UsefulIndex,
};
use juniper::config::Fallback;

fn useful_always(_: &str) -> bool {
    true
}

fn useful() -> &'static dyn UsefulIndex {
    &useful_always as &dyn UsefulIndex
}

/// Whitespace-tokenizes `doc`, keeping byte positions aligned with the
/// original text, the same scheme the crate's own unit tests and debug bin
/// use.
fn tokenize(doc: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut byte_pos = 0;
    for (word_pos, word) in doc.split_whitespace().enumerate() {
        let start = doc[byte_pos..].find(word).map(|i| i + byte_pos).unwrap_or(byte_pos);
        let ucs4: Vec<u32> = word.chars().map(|c| c as u32).collect();
        tokens.push(Token::new(ucs4, start, word.len(), word_pos));
        byte_pos = start + word.len();
    }
    tokens
}

fn analyse(query: &Query, doc: &str) -> (Analysis, RewriterRegistry) {
    let rewriters = RewriterRegistry::new();
    let tokens = tokenize(doc);
    let analysis = query.analyse(doc, &tokens, 0, &rewriters);
    (analysis, rewriters)
}

#[test]
fn or_query_respects_max_matches_window_budget() {
    // Long enough that the whole-document shortcut doesn't apply once
    // `dynlength` is overridden down to 20, forcing real window selection.
    let doc = "alpha beta gamma dog delta epsilon zeta eta theta iota kappa lambda house mu nu xi";
    assert!(doc.len() > 20);

    let query = Query::build("dynlength.20_dynmatches.1", JuniperConfig::default(), useful(), &RewriterRegistry::new(), |v| {
        v.enter_op(Operator::Or, "default");
        v.keyword(b"dog", false, false, "default");
        v.keyword(b"house", false, false, "default");
        v.leave_op();
    });

    let (analysis, _rewriters) = analyse(&query, doc);
    assert_eq!(analysis.candidates.len(), 2, "each OR occurrence completes its own candidate");

    let teaser = query.teaser(doc, &analysis);
    let has_dog = teaser.contains("<b>dog</b>");
    let has_house = teaser.contains("<b>house</b>");
    assert!(has_dog ^ has_house, "max_matches.1 should keep exactly one highlighted window, got: {teaser}");
    assert!(teaser.contains("..."), "a cropped teaser should carry continuation markers");
}

#[test]
fn phrase_requires_exact_adjacency() {
    let build_phrase = |v: &mut dyn QueryVisitor| {
        v.enter_op(Operator::Phrase, "default");
        v.keyword(b"quick", false, false, "default");
        v.keyword(b"fox", false, false, "default");
        v.leave_op();
    };

    let adjacent_query = Query::build("", JuniperConfig::default(), useful(), &RewriterRegistry::new(), build_phrase);
    let (adjacent, _) = analyse(&adjacent_query, "the quick fox jumps");
    assert_eq!(adjacent.candidates.len(), 1, "adjacent phrase words should complete the PHRASE node");

    let separated_query = Query::build("", JuniperConfig::default(), useful(), &RewriterRegistry::new(), build_phrase);
    let (separated, _) = analyse(&separated_query, "the quick brown fox jumps");
    assert!(separated.candidates.is_empty(), "a word between phrase terms must break the match");
}

#[test]
fn degenerate_and_of_one_term_always_scores_the_offset() {
    let query = Query::build("", JuniperConfig::default(), useful(), &RewriterRegistry::new(), |v| {
        v.enter_op(Operator::And, "default");
        v.keyword(b"foo", false, false, "default");
        v.leave_op();
    });
    assert!(query.tree().is_single_term(), "AND(foo) must simplify away to a bare term");

    let (analysis, _) = analyse(&query, "some unrelated text with foo repeated foo foo in it");
    assert_eq!(analysis.rank, query.config().proximity.noconstraint_offset);
}

#[test]
fn constrained_root_with_no_matching_candidate_scores_zero_and_falls_back_to_prefix() {
    let mut config = JuniperConfig::default();
    config.dynsum.length = 10;
    config.dynsum.fallback = Fallback::Prefix;

    let query = Query::build("", config, useful(), &RewriterRegistry::new(), |v| {
        v.enter_op(Operator::Near(4), "default");
        v.keyword(b"dog", false, false, "default");
        v.keyword(b"cat", false, false, "default");
        v.leave_op();
    });
    assert!(query.tree().has_constraints());

    let doc = "the dog ran all the way down the long and winding road at dusk";
    assert!(doc.len() > query.config().dynsum.length);
    let (analysis, _) = analyse(&query, doc);

    assert!(analysis.candidates.is_empty(), "cat never occurs, so NEAR never completes");
    assert_eq!(analysis.rank, 0);

    let teaser = query.teaser(doc, &analysis);
    assert!(doc.starts_with(teaser.trim_end_matches("...")));
}

#[test]
fn interlinear_reading_form_matches_even_though_visible_text_differs() {
    // A document rendering a kanji anchor with its reading annotated inline,
    // the way a CJK wordfolder would hand it to a caller before tokenizing.
    let text = format!(
        "see {}{}{}{}{} here",
        token::IA_ANCHOR,
        "\u{6F22}\u{5B57}",
        token::IA_SEPARATOR,
        "kanji",
        token::IA_TERMINATOR,
    );
    let segments = token::split_interlinear(&text);

    let reading = segments.iter().find_map(|seg| match seg {
        token::Segment::Annotated { reading, .. } => Some(*reading),
        _ => None,
    });
    assert_eq!(reading, Some("kanji"));

    // The host indexes both the anchor and its reading at the same word
    // position; build a token stream reflecting that and query for the
    // reading spelling, which the visible document text never literally
    // contains.
    let anchor_ucs4: Vec<u32> = "\u{6F22}\u{5B57}".chars().map(|c| c as u32).collect();
    let reading_ucs4: Vec<u32> = "kanji".chars().map(|c| c as u32).collect();
    let tokens = vec![
        Token::new("see".chars().map(|c| c as u32).collect(), 0, 3, 0),
        Token::new(anchor_ucs4, 4, 6, 1),
        Token::new(reading_ucs4, 4, 5, 1),
        Token::new("here".chars().map(|c| c as u32).collect(), 11, 4, 2),
    ];

    let query = Query::build("", JuniperConfig::default(), useful(), &RewriterRegistry::new(), |v| {
        v.keyword("kanji".as_bytes(), false, false, "default");
    });

    let rewriters = RewriterRegistry::new();
    let analysis = query.analyse(&text, &tokens, 0, &rewriters);
    assert_eq!(analysis.candidates.len(), 1);
}

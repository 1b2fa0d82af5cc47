//! Small debug CLI: parses a query in the tiny textual language from
//! `debug_parser`, analyses a document read from stdin against it, and
//! prints the proximity rank and teaser. Exists for manual poking at the
//! matcher, not as a supported interface — hence no `clap`, just
//! positional argv.
//!
//! ```text
//! juniper-debug 'NEAR/4(dog, house)' < document.txt
//! ```

use std::io::Read;

use juniper::{debug_parser, JuniperConfig, Query, QueryVisitor, RewriterRegistry, Token};

fn main() {
    tracing_subscriber::fmt::init();

    let program = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: juniper-debug '<query program>' < document.txt");
            std::process::exit(2);
        }
    };

    let mut doc = String::new();
    if std::io::stdin().read_to_string(&mut doc).is_err() {
        eprintln!("failed to read document text from stdin");
        std::process::exit(2);
    }

    let ast = match debug_parser::parse(&program) {
        Ok(ast) => ast,
        Err(err) => {
            eprintln!("query parse error: {err}");
            std::process::exit(1);
        }
    };

    let rewriters = RewriterRegistry::new();
    let useful_always = |_: &str| true;
    let query = Query::build(
        "",
        JuniperConfig::default(),
        &useful_always,
        &rewriters,
        |visitor: &mut dyn QueryVisitor| debug_parser::drive(&ast, visitor),
    );
    let tokens = tokenize(&doc);
    let analysis = query.analyse(&doc, &tokens, 0, &rewriters);
    let teaser = query.teaser(&doc, &analysis);

    println!("rank: {}", analysis.rank);
    println!("candidates: {}", analysis.candidates.len());
    println!("teaser: {teaser}");
}

/// A whitespace tokenizer just good enough for manual experimentation; the
/// real wordfolding/annotation handling lives in `juniper::token`.
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

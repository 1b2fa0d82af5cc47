//! A tiny textual query language for tests and the debug binary. §6 scopes
//! a full debug query language out, but carves out a minimal parser for
//! exercising the visitor seam without a real host query implementation.
//!
//! ```text
//! query := term | op "(" query ("," query)* ")"
//! op    := "AND" | "OR" | "ANY" | "PHRASE" | "RANK" | "ANDNOT" | "EQUIV"
//!        | "NEAR/" NUMBER | "WITHIN/" NUMBER | "ONEAR/" NUMBER
//! term  := WORD ["*"]
//! ```
//!
//! e.g. `NEAR/4(dog, house*)` or `AND(cat, OR(dog, wolf))`.

use crate::error::{Result, UserError};
use crate::visitor::{Operator, QueryVisitor};

#[derive(Debug, Clone)]
pub enum DebugAst {
    Term { word: String, is_prefix: bool },
    Op { op: Operator, children: Vec<DebugAst> },
}

pub fn parse(input: &str) -> Result<DebugAst> {
    let mut parser = Parser { chars: input.char_indices().collect(), pos: 0, src: input };
    let ast = parser.parse_query()?;
    parser.skip_ws();
    if parser.pos != parser.chars.len() {
        return Err(UserError::DebugParse(format!("trailing input at byte {}", parser.byte_pos())).into());
    }
    Ok(ast)
}

/// Drives a `QueryVisitor` over a parsed program the way a real host query
/// would traverse its own tree, bridging the debug language into the same
/// seam production callers use.
pub fn drive(ast: &DebugAst, visitor: &mut dyn QueryVisitor) {
    match ast {
        DebugAst::Term { word, is_prefix } => {
            visitor.keyword(word.as_bytes(), *is_prefix, false, "default");
        }
        DebugAst::Op { op, children } => {
            visitor.enter_op(*op, "default");
            for child in children {
                drive(child, visitor);
            }
            visitor.leave_op();
        }
    }
}

struct Parser<'a> {
    chars: Vec<(usize, char)>,
    pos: usize,
    src: &'a str,
}

impl Parser<'_> {
    fn byte_pos(&self) -> usize {
        self.chars.get(self.pos).map(|&(i, _)| i).unwrap_or(self.src.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_word(&mut self) -> String {
        let mut word = String::new();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            word.push(self.bump().unwrap());
        }
        word
    }

    fn parse_number(&mut self) -> Result<u32> {
        let mut digits = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            digits.push(self.bump().unwrap());
        }
        digits
            .parse::<u32>()
            .map_err(|_| UserError::DebugParse(format!("expected a number at byte {}", self.byte_pos())).into())
    }

    fn expect(&mut self, want: char) -> Result<()> {
        if self.bump() == Some(want) {
            Ok(())
        } else {
            Err(UserError::DebugParse(format!("expected '{want}' at byte {}", self.byte_pos())).into())
        }
    }

    fn parse_children(&mut self) -> Result<Vec<DebugAst>> {
        self.expect('(')?;
        let mut children = vec![self.parse_query()?];
        self.skip_ws();
        while self.peek() == Some(',') {
            self.bump();
            children.push(self.parse_query()?);
            self.skip_ws();
        }
        self.skip_ws();
        self.expect(')')?;
        Ok(children)
    }

    fn parse_query(&mut self) -> Result<DebugAst> {
        self.skip_ws();
        let word = self.parse_word();
        if word.is_empty() {
            return Err(UserError::DebugParse(format!("expected a term or operator at byte {}", self.byte_pos())).into());
        }

        if self.peek() == Some('/') {
            self.bump();
            let limit = self.parse_number()?;
            let op = match word.as_str() {
                "NEAR" => Operator::Near(limit),
                "WITHIN" => Operator::Within(limit),
                "ONEAR" => Operator::Onear(limit),
                other => return Err(UserError::DebugParse(format!("'{other}' doesn't take a limit")).into()),
            };
            self.skip_ws();
            let children = self.parse_children()?;
            return Ok(DebugAst::Op { op, children });
        }

        self.skip_ws();
        if self.peek() == Some('(') {
            let op = match word.as_str() {
                "AND" => Operator::And,
                "OR" => Operator::Or,
                "ANY" => Operator::Any,
                "PHRASE" => Operator::Phrase,
                "RANK" => Operator::Rank,
                "ANDNOT" => Operator::Andnot,
                "EQUIV" => Operator::Equiv,
                other => return Err(UserError::DebugParse(format!("unknown operator '{other}'")).into()),
            };
            let children = self.parse_children()?;
            return Ok(DebugAst::Op { op, children });
        }

        let is_prefix = self.peek() == Some('*');
        if is_prefix {
            self.bump();
        }
        Ok(DebugAst::Term { word, is_prefix })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::RewriterRegistry;
    use crate::tree::Child;
    use crate::visitor::TreeBuilder;

    fn build(input: &str) -> crate::tree::QueryTree {
        let ast = parse(input).expect("parses");
        let rewriters = RewriterRegistry::new();
        let useful = &(|_: &str| true) as &dyn crate::visitor::UsefulIndex;
        let mut builder = TreeBuilder::new(useful, &rewriters);
        drive(&ast, &mut builder);
        builder.finish()
    }

    #[test]
    fn bare_term_parses() {
        let ast = parse("dog").unwrap();
        matches!(ast, DebugAst::Term { ref word, is_prefix: false } if word == "dog");
    }

    #[test]
    fn prefix_term_parses() {
        let ast = parse("hous*").unwrap();
        match ast {
            DebugAst::Term { word, is_prefix } => {
                assert_eq!(word, "hous");
                assert!(is_prefix);
            }
            _ => panic!("expected a term"),
        }
    }

    #[test]
    fn near_with_limit_builds_a_limited_node() {
        let tree = build("NEAR/4(dog, house)");
        match tree.root {
            Some(Child::Node(idx)) => assert_eq!(tree.nodes[idx].limit, 4),
            _ => panic!("expected a NEAR node root"),
        }
    }

    #[test]
    fn nested_operators_parse() {
        let tree = build("AND(cat, OR(dog, wolf))");
        match tree.root {
            Some(Child::Node(idx)) => assert_eq!(tree.nodes[idx].arity(), 2),
            _ => panic!("expected an AND node root"),
        }
    }

    #[test]
    fn malformed_input_is_a_user_error() {
        assert!(parse("AND(cat, dog").is_err());
        assert!(parse("NEAR(cat, dog)").is_err());
    }
}

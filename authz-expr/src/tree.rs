// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

//! An alternative consumer of the tokenizer grammar: instead of folding a
//! boolean, [`parse`] builds an immutable [`Node`] tree, with same-operator
//! flattening and single-child unwrapping over byte strings carrying a
//! `quoted` flag.

use crate::error::{ExpressionError, ExpressionErrorKind};
use crate::matcher::resolved;
use crate::parser::MAX_NESTING_DEPTH;
use crate::quoting::quote_raw;
use crate::tokenizer::Tokenizer;

/// One node of a parsed access expression.
///
/// `And`/`Or` always have at least two children — a scope with a single
/// child is returned as that child directly, never wrapped — and no `And`
/// node ever has an `And` child (nor any `Or`/`Or`): same-operator siblings
/// at one nesting level are flattened into a single multi-child node.
/// Parentheses leave no trace here; a parenthesized subexpression is
/// indistinguishable in the tree from the same subexpression unparenthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A leaf authorization, holding the unescaped bytes and whether the
    /// original form was quoted.
    Authorization { bytes: Vec<u8>, quoted: bool },
    /// 2+ children, all joined by `&`.
    And(Vec<Node>),
    /// 2+ children, all joined by `|`.
    Or(Vec<Node>),
    /// The unique node for the empty expression.
    Empty,
}

impl Node {
    /// The minimal byte form that reproduces this node: leaves emit their
    /// quoted or bare form, internal nodes emit children joined by `&`/`|`,
    /// parenthesizing any child whose outermost operator differs from the
    /// parent's.
    pub fn to_expression_bytes(&self) -> Vec<u8> {
        match self {
            Node::Empty => Vec::new(),
            Node::Authorization { bytes, .. } => quote_raw(bytes),
            Node::And(children) => join(children, b'&'),
            Node::Or(children) => join(children, b'|'),
        }
    }

    /// `str` convenience wrapper around [`Node::to_expression_bytes`]. Panics
    /// if the reconstructed expression is not valid UTF-8, which cannot
    /// happen for a tree built from UTF-8 input.
    pub fn to_expression_string(&self) -> String {
        String::from_utf8(self.to_expression_bytes())
            .expect("expression reconstructed from UTF-8 input stays UTF-8")
    }

    /// Walks the tree's authorization leaves left-to-right, delivering their
    /// unescaped bytes to `sink` (including duplicates). Used by tests to
    /// check parity against [`crate::find_authorizations`]'s single-pass walk.
    #[cfg(test)]
    fn walk_authorizations(&self, sink: &mut dyn FnMut(&[u8])) {
        match self {
            Node::Empty => {}
            Node::Authorization { bytes, .. } => sink(bytes),
            Node::And(children) | Node::Or(children) => {
                for child in children {
                    child.walk_authorizations(sink);
                }
            }
        }
    }
}

fn join(children: &[Node], op: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(op);
        }
        let needs_parens = matches!(
            (op, child),
            (b'&', Node::Or(_)) | (b'|', Node::And(_))
        );
        if needs_parens {
            out.push(b'(');
            out.extend(child.to_expression_bytes());
            out.push(b')');
        } else {
            out.extend(child.to_expression_bytes());
        }
    }
    out
}

/// Parses `input` into a [`Node`] tree. The empty byte sequence is a valid
/// expression and parses to [`Node::Empty`].
pub fn parse(input: &[u8]) -> Result<Node, ExpressionError> {
    if input.is_empty() {
        return Ok(Node::Empty);
    }
    let mut tok = Tokenizer::new(input);
    let node = parse_node(&mut tok, 0)?;
    if !tok.at_end() {
        return Err(match tok.peek() {
            Ok(b')') => ExpressionErrorKind::UnbalancedParen.into(),
            Ok(_) => ExpressionErrorKind::UnexpectedCharacter(tok.pos()).into(),
            Err(e) => e,
        });
    }
    Ok(node)
}

fn check_depth(depth: u32) -> Result<(), ExpressionError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ExpressionErrorKind::TooDeeplyNested(MAX_NESTING_DEPTH).into());
    }
    Ok(())
}

fn parse_term(tok: &mut Tokenizer, depth: u32) -> Result<Node, ExpressionError> {
    if tok.at_end() {
        return Err(ExpressionErrorKind::UnexpectedEnd.into());
    }
    if tok.peek()? == b'(' {
        check_depth(depth + 1)?;
        tok.expect(b'(')?;
        let node = parse_node(tok, depth + 1)?;
        if tok.at_end() || tok.peek()? != b')' {
            return Err(ExpressionErrorKind::MissingCloseParen.into());
        }
        tok.advance();
        Ok(node)
    } else {
        let token = tok.next_authorization()?;
        let bytes = resolved(tok.input(), &token).into_owned();
        Ok(Node::Authorization {
            bytes,
            quoted: token.quoted,
        })
    }
}

fn parse_node(tok: &mut Tokenizer, depth: u32) -> Result<Node, ExpressionError> {
    let mut children = vec![parse_term(tok, depth)?];
    let mut op: Option<u8> = None;
    loop {
        if tok.at_end() {
            break;
        }
        let b = tok.peek()?;
        if b == b')' {
            break;
        }
        if b != b'&' && b != b'|' {
            return Err(ExpressionErrorKind::UnexpectedCharacter(tok.pos()).into());
        }
        match op {
            None => op = Some(b),
            Some(prev) if prev != b => {
                return Err(ExpressionErrorKind::MixedOperators(tok.pos()).into())
            }
            _ => {}
        }
        tok.advance();
        children.push(parse_term(tok, depth)?);
    }
    if children.len() == 1 {
        return Ok(children.pop().expect("just checked len == 1"));
    }
    let op = op.expect("2+ children implies an operator was recorded");
    // A parenthesized child sharing this node's operator carries no grouping
    // information of its own (parens are structural only) — splice its
    // children in directly rather than nesting, so same-operator runs stay a
    // single flat node regardless of which subexpressions were parenthesized.
    let mut flattened = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::And(grandchildren) if op == b'&' => flattened.extend(grandchildren),
            Node::Or(grandchildren) if op == b'|' => flattened.extend(grandchildren),
            other => flattened.push(other),
        }
    }
    Ok(match op {
        b'&' => Node::And(flattened),
        b'|' => Node::Or(flattened),
        _ => unreachable!("only '&' and '|' are ever recorded as operators"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_label_is_a_bare_leaf() {
        assert_eq!(
            parse(b"label1").unwrap(),
            Node::Authorization {
                bytes: b"label1".to_vec(),
                quoted: false
            }
        );
    }

    #[test]
    fn empty_input_is_the_empty_node() {
        assert_eq!(parse(b"").unwrap(), Node::Empty);
    }

    #[test]
    fn same_operator_siblings_flatten() {
        let node = parse(b"A&B&C").unwrap();
        match node {
            Node::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn parens_are_structural_only() {
        assert_eq!(parse(b"(label2|label3)").unwrap(), parse(b"label2|label3").unwrap());
        assert_eq!(
            parse(b"((((label2))))").unwrap(),
            parse(b"label2").unwrap()
        );
    }

    #[test]
    fn mixing_operators_is_rejected_without_grouping() {
        assert!(parse(b"A&B|C").is_err());
        assert!(parse(b"A&(B|C)").is_ok());
    }

    #[test]
    fn quoted_leaf_carries_unescaped_bytes_and_the_quoted_flag() {
        let node = parse(br#""hello \"world""#).unwrap();
        assert_eq!(
            node,
            Node::Authorization {
                bytes: b"hello \"world".to_vec(),
                quoted: true
            }
        );
    }

    #[test]
    fn to_expression_bytes_round_trips_bare_terms() {
        let node = parse(b"A&(B|C)").unwrap();
        assert_eq!(node.to_expression_string(), "A&(B|C)");
    }

    #[test]
    fn to_expression_bytes_quotes_special_leaves() {
        let node = parse(br#"A&"has space""#).unwrap();
        assert_eq!(node.to_expression_string(), r#"A&"has space""#);
    }

    #[test]
    fn to_expression_bytes_does_not_over_parenthesize_same_operator() {
        let node = parse(b"A&B&(C&D)").unwrap();
        assert_eq!(node.to_expression_string(), "A&B&C&D");
    }

    #[test]
    fn same_operator_parenthesized_child_flattens_into_the_parent() {
        let node = parse(b"A&B&(C&D)").unwrap();
        assert_eq!(node, parse(b"A&B&C&D").unwrap());
        match node {
            Node::And(children) => assert_eq!(children.len(), 4),
            other => panic!("expected a flat And with 4 children, got {other:?}"),
        }
    }

    #[test]
    fn same_operator_parenthesized_child_flattens_on_either_side() {
        assert_eq!(
            parse(b"(A|B)|C").unwrap(),
            parse(b"A|B|C").unwrap()
        );
        assert_eq!(
            parse(b"A|(B|C)").unwrap(),
            parse(b"A|B|C").unwrap()
        );
    }

    #[test]
    fn find_authorizations_matches_tree_walk_order() {
        let expr = "(CAT&\"🦖\")|(CAT&\"🦕\")".as_bytes();
        let node = parse(expr).unwrap();
        let mut walked = Vec::new();
        node.walk_authorizations(&mut |b| walked.push(b.to_vec()));

        let mut found = Vec::new();
        crate::find_authorizations(expr, |b| found.push(b.to_vec())).unwrap();

        assert_eq!(walked, found);
        assert_eq!(
            walked,
            vec![
                b"CAT".to_vec(),
                "🦖".as_bytes().to_vec(),
                b"CAT".to_vec(),
                "🦕".as_bytes().to_vec(),
            ]
        );
    }
}

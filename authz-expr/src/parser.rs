// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

//! The hot path: a single recursive-descent pass over the expression bytes
//! that simultaneously validates the grammar and folds a boolean result,
//! without ever materializing a parse tree. [`crate::tree`] is a separate
//! consumer of the same tokenizer for callers that want the tree; the two are
//! kept apart deliberately (see the crate's design notes) so that validation
//! plus evaluation stays a single linear pass with no allocation for bare
//! tokens.

use crate::error::{ExpressionError, ExpressionErrorKind};
use crate::tokenizer::{AuthToken, Tokenizer};

/// Deepest allowed parenthesis nesting. Bounds recursion depth so adversarial
/// input (e.g. thousands of nested `(`) cannot overflow the host stack.
pub(crate) const MAX_NESTING_DEPTH: u32 = 1000;

/// Evaluates `input` against `predicate`, which is invoked once per
/// authorization token encountered (in left-to-right order) and decides
/// whether that single authorization is held.
///
/// Returns `Ok(true)`/`Ok(false)` for any syntactically valid expression —
/// including the empty expression, which is always `Ok(true)` — and `Err`
/// for anything else. A `Ok(_)` return attests that `input` is a valid access
/// expression.
pub(crate) fn evaluate(
    input: &[u8],
    predicate: &mut dyn FnMut(&[u8], &AuthToken) -> bool,
) -> Result<bool, ExpressionError> {
    if input.is_empty() {
        return Ok(true);
    }
    let mut tok = Tokenizer::new(input);
    let result = parse_node(&mut tok, 0, predicate)?;
    if !tok.at_end() {
        return Err(trailing_byte_error(&tok));
    }
    Ok(result)
}

fn trailing_byte_error(tok: &Tokenizer) -> ExpressionError {
    match tok.peek() {
        Ok(b')') => ExpressionErrorKind::UnbalancedParen.into(),
        Ok(_) => ExpressionErrorKind::UnexpectedCharacter(tok.pos()).into(),
        Err(e) => e,
    }
}

fn check_depth(depth: u32) -> Result<(), ExpressionError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ExpressionErrorKind::TooDeeplyNested(MAX_NESTING_DEPTH).into());
    }
    Ok(())
}

/// `node := term (("&" term)+ | ("|" term)+)?`
///
/// Parses one term, then repeatedly parses `<op> term` so long as the
/// recorded operator keeps matching. Folding continues regardless of whether
/// the boolean outcome is already fixed, so that the remainder of the node is
/// still syntactically validated (and, for [`crate::find_authorizations`],
/// every authorization token is still visited).
fn parse_node(
    tok: &mut Tokenizer,
    depth: u32,
    predicate: &mut dyn FnMut(&[u8], &AuthToken) -> bool,
) -> Result<bool, ExpressionError> {
    let mut result = parse_term(tok, depth, predicate)?;
    let mut op: Option<u8> = None;
    loop {
        if tok.at_end() {
            return Ok(result);
        }
        let b = tok.peek()?;
        if b == b')' {
            return Ok(result);
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
        let rhs = parse_term(tok, depth, predicate)?;
        result = if b == b'&' { result && rhs } else { result || rhs };
    }
}

/// `term := "(" node ")" | authorization`
fn parse_term(
    tok: &mut Tokenizer,
    depth: u32,
    predicate: &mut dyn FnMut(&[u8], &AuthToken) -> bool,
) -> Result<bool, ExpressionError> {
    if tok.at_end() {
        return Err(ExpressionErrorKind::UnexpectedEnd.into());
    }
    if tok.peek()? == b'(' {
        check_depth(depth + 1)?;
        tok.expect(b'(')?;
        let value = parse_node(tok, depth + 1, predicate)?;
        if tok.at_end() || tok.peek()? != b')' {
            return Err(ExpressionErrorKind::MissingCloseParen.into());
        }
        tok.advance();
        Ok(value)
    } else {
        let token = tok.next_authorization()?;
        Ok(predicate(tok.input(), &token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    fn eval(expr: &str, held: &[&str]) -> Result<bool, ExpressionError> {
        let held: HashSet<Vec<u8>> = held.iter().map(|s| s.as_bytes().to_vec()).collect();
        evaluate(expr.as_bytes(), &mut |buf, tok| {
            let resolved = crate::matcher::resolved(buf, tok);
            held.contains(resolved.as_ref())
        })
    }

    #[rstest]
    #[case("label1", &["label1"], true)]
    #[case("label1|label2", &["label1"], true)]
    #[case("label1&label2", &["label1"], false)]
    #[case("label1&label2", &["label1", "label2"], true)]
    #[case("label1&(label2|label3)", &["label1"], false)]
    #[case("label1&(label2|label3)", &["label1", "label3"], true)]
    #[case("(label2|label3)", &["label2"], true)]
    #[case("(label2&label3)", &["label2"], false)]
    #[case("((label2|label3))", &["label2"], true)]
    #[case("(((((label2&label3)))))", &["label2"], false)]
    fn evaluates_grammar_scenarios(#[case] expr: &str, #[case] held: &[&str], #[case] expected: bool) {
        assert_eq!(eval(expr, held).unwrap(), expected);
    }

    #[test]
    fn empty_expression_is_true() {
        assert_eq!(eval("", &[]).unwrap(), true);
    }

    #[test]
    fn mixed_operators_without_grouping_is_rejected() {
        let err = eval("A&B|C", &[]).unwrap_err();
        assert!(matches!(err.kind, ExpressionErrorKind::MixedOperators(_)));
    }

    #[test]
    fn mixed_operators_with_grouping_is_accepted() {
        assert!(eval("A&(B|C)", &["A", "C"]).unwrap());
    }

    #[test]
    fn unbalanced_close_paren_is_rejected() {
        let err = eval("(A)B)", &["A", "B"]).unwrap_err();
        assert_eq!(err.kind, ExpressionErrorKind::UnbalancedParen);
    }

    #[test]
    fn missing_close_paren_is_rejected() {
        let err = eval("(A&B", &["A", "B"]).unwrap_err();
        assert_eq!(err.kind, ExpressionErrorKind::MissingCloseParen);
    }

    #[test]
    fn whitespace_anywhere_is_rejected() {
        assert!(eval("A & B", &["A", "B"]).is_err());
        assert!(eval(" ", &[]).is_err());
    }

    #[test]
    fn quoted_unicode_authorizations_match() {
        assert_eq!(
            eval(r#"(CAT&"🦖")|(CAT&"🦕")"#, &["CAT", "🦖", "🦕"]).unwrap(),
            true
        );
    }

    #[test]
    fn deeply_nested_parens_are_rejected_past_the_limit() {
        let mut expr = String::new();
        for _ in 0..(MAX_NESTING_DEPTH + 10) {
            expr.push('(');
        }
        expr.push('A');
        for _ in 0..(MAX_NESTING_DEPTH + 10) {
            expr.push(')');
        }
        let err = eval(&expr, &["A"]).unwrap_err();
        assert!(matches!(err.kind, ExpressionErrorKind::TooDeeplyNested(_)));
    }

    #[test]
    fn syntax_is_validated_even_when_and_outcome_is_already_false() {
        // `label1` is absent, so the `&` chain is false after the first term,
        // but `B|C` trailing a mixed operator must still be caught.
        let err = eval("label1&B|C", &["label1"]).unwrap_err();
        assert!(matches!(err.kind, ExpressionErrorKind::MixedOperators(_)));
    }
}

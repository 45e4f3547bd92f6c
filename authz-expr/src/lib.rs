// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

//! Parses and evaluates access expressions: compact boolean formulas over
//! authorization tokens combined with `&`, `|`, and parenthesization.
//!
//! The core is [`Evaluator::can_access`] (and the free function
//! [`check_authorization`]): a byte-oriented recursive-descent pass that
//! simultaneously validates an expression against the grammar and decides
//! its boolean value, without ever materializing a parse tree. [`parse`]
//! builds a tree on demand for callers that need to inspect or re-serialize
//! an expression; [`find_authorizations`] walks the same grammar collecting
//! every authorization token in left-to-right order; [`quote`]/[`unquote`]
//! round-trip arbitrary byte sequences into and out of expression syntax.
//!
//! ```
//! use authz_expr::{AuthorizationSet, Evaluator};
//!
//! let evaluator = Evaluator::single(AuthorizationSet::new(["label1", "label5"]));
//! assert!(evaluator.can_access("label1|label5").unwrap());
//! // the grammar permits no whitespace anywhere
//! assert!(evaluator.can_access("label1 | label5").is_err());
//! ```

mod authorizations;
mod error;
mod evaluator;
mod matcher;
mod parser;
mod quoting;
mod tokenizer;
mod tree;

#[cfg(feature = "caching")]
pub mod caching;

pub use authorizations::{AuthorizationSet, Authorizer};
pub use error::{ExpressionError, ExpressionErrorKind};
pub use evaluator::Evaluator;
pub use quoting::{quote, quote_str, unquote, unquote_str};
pub use tree::{parse, Node};

/// Validates `expression` against the access-expression grammar without
/// evaluating it against any authorization set.
///
/// `validate` and [`Evaluator::can_access`] share the same acceptance set: a
/// successful `validate` guarantees that a subsequent `can_access` call on
/// the same bytes will not raise.
pub fn validate(expression: impl AsRef<[u8]>) -> Result<(), ExpressionError> {
    parser::evaluate(expression.as_ref(), &mut |_, _| true).map(|_| ())
}

/// Walks `expression`'s authorization tokens left-to-right, delivering each
/// one's unescaped bytes to `sink` (including duplicates). Performs the same
/// single linear pass as [`Evaluator::can_access`] — no parse tree is built,
/// and no allocation happens for bare (unquoted) tokens.
pub fn find_authorizations<F>(
    expression: impl AsRef<[u8]>,
    mut sink: F,
) -> Result<(), ExpressionError>
where
    F: FnMut(&[u8]),
{
    parser::evaluate(expression.as_ref(), &mut |buf, token| {
        sink(matcher::resolved(buf, token).as_ref());
        true
    })?;
    Ok(())
}

/// Parses and evaluates `expression` against `authorizations` in one call.
///
/// A convenience wrapper for the common case of a single one-shot check,
/// building a throwaway [`Evaluator`] internally.
///
/// ```
/// use authz_expr::check_authorization;
///
/// let tokens: &[&[u8]] = &[b"label1", "label 🕺".as_bytes()];
/// let result = check_authorization("label1|label5", tokens).unwrap();
/// assert!(result);
/// ```
pub fn check_authorization<T>(
    expression: impl AsRef<[u8]>,
    authorizations: &[T],
) -> Result<bool, ExpressionError>
where
    T: Clone + Into<Vec<u8>>,
{
    let set = AuthorizationSet::new(authorizations.iter().cloned());
    Evaluator::single(set).can_access(expression)
}

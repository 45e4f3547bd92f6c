// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

use thiserror::Error;

/// The specific reason an access expression failed to validate.
///
/// Every variant that names a position carries a byte offset into the
/// original expression, not a character offset — the grammar is byte-oriented
/// and offsets are only meaningful against the original byte slice.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected character at byte {0}")]
    UnexpectedCharacter(usize),
    #[error("missing closing parenthesis")]
    MissingCloseParen,
    #[error("unbalanced parenthesis")]
    UnbalancedParen,
    #[error("mixed '&' and '|' operators at byte {0}")]
    MixedOperators(usize),
    #[error("empty authorization")]
    EmptyAuthorization,
    #[error("bad escape sequence at byte {0}")]
    BadEscape(usize),
    #[error("unterminated quoted authorization starting at byte {0}")]
    UnterminatedQuote(usize),
    #[error("expression nesting exceeds the maximum depth of {0}")]
    TooDeeplyNested(u32),
}

/// A single error category surfaced to callers: the access expression is
/// invalid. [`ExpressionErrorKind`] carries the machine-readable detail.
///
/// This is recoverable: callers may catch it, surface it to users, or reject
/// the input. It never indicates a defect in this crate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid access expression: {kind}")]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
}

impl From<ExpressionErrorKind> for ExpressionError {
    fn from(kind: ExpressionErrorKind) -> Self {
        ExpressionError { kind }
    }
}

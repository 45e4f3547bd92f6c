// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

use crate::error::{ExpressionError, ExpressionErrorKind};
use crate::matcher::checked_unescape;
use crate::tokenizer::is_valid_auth_char;

/// Quotes `term` if needed so it can be embedded in an access expression as a
/// single authorization, without validating or escaping emptiness checks.
/// Used internally on bytes already known to be non-empty (e.g. an
/// already-parsed [`crate::tree::Node::Authorization`]).
pub(crate) fn quote_raw(term: &[u8]) -> Vec<u8> {
    if term.iter().all(|&b| is_valid_auth_char(b)) {
        return term.to_vec();
    }
    let mut out = Vec::with_capacity(term.len() + 2);
    out.push(b'"');
    for &b in term {
        if b == b'"' || b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b'"');
    out
}

/// Quotes `term` so it can be embedded in an access expression as a single
/// authorization.
///
/// If every byte of `term` is already valid in a bare authorization, `term`
/// is returned unchanged — `quote` is idempotent on already-bare terms.
/// Otherwise the term is wrapped in `"..."`, escaping `"` and `\` as `\"` and
/// `\\`.
///
/// Fails with [`ExpressionErrorKind::EmptyAuthorization`] if `term` is empty.
pub fn quote(term: &[u8]) -> Result<Vec<u8>, ExpressionError> {
    if term.is_empty() {
        return Err(ExpressionErrorKind::EmptyAuthorization.into());
    }
    Ok(quote_raw(term))
}

/// `str` convenience wrapper around [`quote`].
pub fn quote_str(term: &str) -> Result<String, ExpressionError> {
    let bytes = quote(term.as_bytes())?;
    // `quote` only ever introduces ASCII bytes (`"` and `\`) around valid
    // UTF-8 input, so the result is always valid UTF-8.
    Ok(String::from_utf8(bytes).expect("quote() preserves UTF-8 validity"))
}

/// Reverses [`quote`]: if `term` begins and ends with `"`, strips the
/// delimiters and unescapes the interior; otherwise returns `term` unchanged.
///
/// Fails with [`ExpressionErrorKind::EmptyAuthorization`] if `term` is empty
/// or is the literal `""`, and with [`ExpressionErrorKind::BadEscape`] if the
/// interior contains a trailing lone `\` or an escape of anything other than
/// `"`/`\` — `term` is caller-supplied and may not have passed through the
/// tokenizer, so the interior cannot be assumed well-formed the way a
/// parsed token's raw bytes can.
pub fn unquote(term: &[u8]) -> Result<Vec<u8>, ExpressionError> {
    if term.is_empty() || term == b"\"\"" {
        return Err(ExpressionErrorKind::EmptyAuthorization.into());
    }
    if term.len() >= 2 && term[0] == b'"' && term[term.len() - 1] == b'"' {
        Ok(checked_unescape(&term[1..term.len() - 1])?)
    } else {
        Ok(term.to_vec())
    }
}

/// `str` convenience wrapper around [`unquote`].
pub fn unquote_str(term: &str) -> Result<String, ExpressionError> {
    let bytes = unquote(term.as_bytes())?;
    // Unescaping only ever drops ASCII backslash bytes from valid UTF-8
    // input, so the result is always valid UTF-8.
    Ok(String::from_utf8(bytes).expect("unquote() preserves UTF-8 validity"))
}

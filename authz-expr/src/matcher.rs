// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

use crate::error::ExpressionErrorKind;
use crate::tokenizer::AuthToken;

/// Unescapes a quoted authorization's interior bytes: `\"` → `"`, `\\` → `\`.
/// The tokenizer has already rejected any other escape, so this never needs
/// to validate — it only needs to copy. Only safe to call on bytes that have
/// already passed through [`crate::tokenizer::Tokenizer`]; for bytes from an
/// untrusted caller, use [`checked_unescape`] instead.
///
/// Grounded on the scan-and-copy shape of `scottlamb-http-auth`'s
/// `ParamValue::append_unescaped`: walk for the next backslash, copy the run
/// before it, then copy the single escaped byte and skip past it.
pub(crate) fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' {
            out.push(raw[i + 1]);
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

/// Bounds-checked counterpart to [`unescape`] for bytes that did not come
/// through the tokenizer — [`crate::quoting::unquote`] accepts arbitrary
/// caller-supplied terms, so a trailing lone `\` or an escape of anything
/// other than `"`/`\` must be rejected rather than indexed past the slice.
pub(crate) fn checked_unescape(raw: &[u8]) -> Result<Vec<u8>, ExpressionErrorKind> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' {
            match raw.get(i + 1) {
                Some(b'"') => out.push(b'"'),
                Some(b'\\') => out.push(b'\\'),
                _ => return Err(ExpressionErrorKind::BadEscape(i)),
            }
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Returns the unescaped, unquoted form of `token` as it appears in `buf`,
/// allocating only when the quoted token actually contains an escape.
pub(crate) fn resolved<'b>(buf: &'b [u8], token: &AuthToken) -> std::borrow::Cow<'b, [u8]> {
    let raw = token.raw(buf);
    if !token.quoted || !raw.contains(&b'\\') {
        std::borrow::Cow::Borrowed(raw)
    } else {
        std::borrow::Cow::Owned(unescape(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_handles_both_escapes() {
        assert_eq!(unescape(br#"a\"b\\c"#), b"a\"b\\c");
    }

    #[test]
    fn unescape_noop_without_backslash() {
        assert_eq!(unescape(b"plain"), b"plain");
    }

    #[test]
    fn checked_unescape_handles_both_escapes() {
        assert_eq!(checked_unescape(br#"a\"b\\c"#).unwrap(), b"a\"b\\c");
    }

    #[test]
    fn checked_unescape_rejects_trailing_backslash() {
        let err = checked_unescape(b"a\\").unwrap_err();
        assert_eq!(err, ExpressionErrorKind::BadEscape(1));
    }

    #[test]
    fn checked_unescape_rejects_unknown_escape() {
        let err = checked_unescape(br#"a\nb"#).unwrap_err();
        assert_eq!(err, ExpressionErrorKind::BadEscape(1));
    }

    #[test]
    fn resolved_borrows_when_no_escapes_present() {
        let buf = b"\"plain\"";
        let token = AuthToken {
            start: 1,
            len: 5,
            quoted: true,
        };
        match resolved(buf, &token) {
            std::borrow::Cow::Borrowed(b) => assert_eq!(b, b"plain"),
            std::borrow::Cow::Owned(_) => panic!("expected borrowed"),
        }
    }

    #[test]
    fn resolved_allocates_when_escapes_present() {
        let buf = br#""a\"b""#;
        let token = AuthToken {
            start: 1,
            len: 4,
            quoted: true,
        };
        match resolved(buf, &token) {
            std::borrow::Cow::Owned(b) => assert_eq!(b, b"a\"b"),
            std::borrow::Cow::Borrowed(_) => panic!("expected owned"),
        }
    }
}

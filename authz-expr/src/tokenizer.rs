// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

use crate::error::{ExpressionError, ExpressionErrorKind};

/// A span `[start, start+len)` into the byte buffer backing the [`Tokenizer`]
/// that produced it, plus a flag recording whether the authorization was
/// written in quoted form. The bytes themselves are not copied; callers index
/// back into the original buffer with the offsets carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AuthToken {
    pub start: usize,
    pub len: usize,
    pub quoted: bool,
}

impl AuthToken {
    /// The raw (still possibly escaped) bytes this token spans in `buf`.
    pub fn raw<'b>(&self, buf: &'b [u8]) -> &'b [u8] {
        &buf[self.start..self.start + self.len]
    }
}

/// True for the bytes permitted in a bare (unquoted) authorization: ASCII
/// letters, digits, underscore, hyphen-minus, dot, colon, and forward slash.
/// Any other byte — including every byte with the high bit set — requires
/// quoting.
pub(crate) fn is_valid_auth_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':' | b'/')
}

/// A cursor over a byte slice yielding authorization tokens and single-byte
/// operator/structural bytes, with bounds checking on every step.
///
/// Unlike a typical text lexer, the tokenizer does not skip whitespace: the
/// grammar this crate implements permits none, so any whitespace byte is left
/// in place for the caller to trip over as an unexpected character.
pub(crate) struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer { input, pos: 0 }
    }

    /// The full buffer this tokenizer was constructed over.
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// The current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    /// Returns the current byte without advancing.
    pub fn peek(&self) -> Result<u8, ExpressionError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or_else(|| ExpressionErrorKind::UnexpectedEnd.into())
    }

    pub fn advance(&mut self) {
        #[cfg(feature = "trace")]
        if let Some(&b) = self.input.get(self.pos) {
            log::trace!("tokenizer: advance past {:?} at {}", b as char, self.pos);
        }
        self.pos += 1;
    }

    /// Consumes `byte` or fails with `UnexpectedCharacter`.
    pub fn expect(&mut self, byte: u8) -> Result<(), ExpressionError> {
        let found = self.peek()?;
        if found != byte {
            return Err(ExpressionErrorKind::UnexpectedCharacter(self.pos).into());
        }
        self.advance();
        Ok(())
    }

    /// Parses one authorization token starting at the current index: either a
    /// maximal run of bare-authorization bytes, or a `"`-delimited quoted
    /// form permitting only the `\"` and `\\` escapes.
    pub fn next_authorization(&mut self) -> Result<AuthToken, ExpressionError> {
        if self.at_end() {
            return Err(ExpressionErrorKind::UnexpectedEnd.into());
        }
        if self.input[self.pos] == b'"' {
            self.next_quoted_authorization()
        } else {
            self.next_bare_authorization()
        }
    }

    fn next_bare_authorization(&mut self) -> Result<AuthToken, ExpressionError> {
        let start = self.pos;
        while !self.at_end() && is_valid_auth_char(self.input[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ExpressionErrorKind::UnexpectedCharacter(start).into());
        }
        #[cfg(feature = "trace")]
        log::trace!(
            "tokenizer: bare authorization [{}, {})",
            start,
            self.pos
        );
        Ok(AuthToken {
            start,
            len: self.pos - start,
            quoted: false,
        })
    }

    fn next_quoted_authorization(&mut self) -> Result<AuthToken, ExpressionError> {
        let open_quote = self.pos;
        self.pos += 1; // consume opening '"'
        let content_start = self.pos;
        loop {
            if self.at_end() {
                return Err(ExpressionErrorKind::UnterminatedQuote(open_quote).into());
            }
            match self.input[self.pos] {
                b'"' => break,
                b'\\' => {
                    let escape_pos = self.pos;
                    self.pos += 1;
                    if self.at_end() {
                        return Err(ExpressionErrorKind::UnterminatedQuote(open_quote).into());
                    }
                    match self.input[self.pos] {
                        b'"' | b'\\' => self.pos += 1,
                        _ => return Err(ExpressionErrorKind::BadEscape(escape_pos).into()),
                    }
                }
                _ => self.pos += 1,
            }
        }
        let content_len = self.pos - content_start;
        if content_len == 0 {
            return Err(ExpressionErrorKind::EmptyAuthorization.into());
        }
        self.pos += 1; // consume closing '"'
        #[cfg(feature = "trace")]
        log::trace!(
            "tokenizer: quoted authorization [{}, {})",
            content_start,
            content_start + content_len
        );
        Ok(AuthToken {
            start: content_start,
            len: content_len,
            quoted: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_authorization_stops_at_operator() {
        let mut tok = Tokenizer::new(b"label1&label2");
        let t = tok.next_authorization().unwrap();
        assert_eq!(t.raw(tok.input()), b"label1");
        assert!(!t.quoted);
        assert_eq!(tok.peek().unwrap(), b'&');
    }

    #[test]
    fn bare_authorization_allows_path_like_chars() {
        let mut tok = Tokenizer::new(b"a/b:c-d.e_f9");
        let t = tok.next_authorization().unwrap();
        assert_eq!(t.raw(tok.input()), b"a/b:c-d.e_f9");
        assert!(tok.at_end());
    }

    #[test]
    fn quoted_authorization_unescapes_lazily() {
        let mut tok = Tokenizer::new(br#""hello \"world\\""#);
        let t = tok.next_authorization().unwrap();
        assert!(t.quoted);
        assert_eq!(t.raw(tok.input()), br#"hello \"world\\"#);
        assert!(tok.at_end());
    }

    #[test]
    fn empty_quoted_authorization_is_an_error() {
        let mut tok = Tokenizer::new(br#""""#);
        let err = tok.next_authorization().unwrap_err();
        assert_eq!(err.kind, ExpressionErrorKind::EmptyAuthorization);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let mut tok = Tokenizer::new(br#""abc"#);
        let err = tok.next_authorization().unwrap_err();
        assert_eq!(err.kind, ExpressionErrorKind::UnterminatedQuote(0));
    }

    #[test]
    fn bad_escape_is_an_error() {
        let mut tok = Tokenizer::new(br#""a\nb""#);
        let err = tok.next_authorization().unwrap_err();
        assert_eq!(err.kind, ExpressionErrorKind::BadEscape(2));
    }

    #[test]
    fn whitespace_is_not_a_valid_auth_char() {
        let mut tok = Tokenizer::new(b" label");
        let err = tok.next_authorization().unwrap_err();
        assert_eq!(err.kind, ExpressionErrorKind::UnexpectedCharacter(0));
    }

    #[test]
    fn high_bit_bytes_require_quoting() {
        assert!(!is_valid_auth_char(0x80));
        assert!(!is_valid_auth_char(0xFF));
    }
}

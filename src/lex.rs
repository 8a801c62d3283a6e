// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::fmt;
use std::sync::Arc;

/// Prefix stripped from identifiers so `Math.sin` and `sin` name the same thing.
pub const MATH_PREFIX: &str = "Math.";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }

    pub fn split_at(self, idx: usize) -> (Self, Self) {
        let mut l = self.clone();
        let mut r = self;
        l.len = idx;
        r.len -= idx;
        r.start += idx;
        (l, r)
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,

    // unsupported tokens
    XEqual,
    XPipe,
    XBang,
    XAmpersand,
    XQuestion,
    XColon,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen => false,

            // unsupported tokens
            Self::XEqual
            | Self::XPipe
            | Self::XBang
            | Self::XAmpersand
            | Self::XQuestion
            | Self::XColon
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a `-` or `+` following this token is a sign rather than a
    /// binary operator.
    const fn expects_operand(prev: Option<Self>) -> bool {
        matches!(
            prev,
            None | Some(Self::Op(_)) | Some(Self::Comma) | Some(Self::OpenParen)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

const fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$'
}

const fn is_ident_continue(byte: u8) -> bool {
    is_ident_start(byte) || byte.is_ascii_digit()
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    pos: usize,
    prev: Option<TokTyp>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            pos: 0,
            prev: None,
            has_errored: false,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn span(&self, start: usize, len: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, len)
    }

    pub fn trim_whitespace(&mut self) {
        while let Some(byte) = self.peek_at(0) {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Consumes `len` bytes as a token of type `typ`.
    fn take(&mut self, typ: TokTyp, len: usize) -> Tok {
        let tok = Tok {
            typ,
            loc: self.span(self.pos, len),
        };
        self.pos += len;
        tok
    }

    fn consume_symbol(&mut self, byte: u8) -> Option<Tok> {
        let next = self.peek_at(1);
        let (typ, len) = match byte {
            b'+' if TokTyp::expects_operand(self.prev) => (TokTyp::Op(OperatorTyp::Pos), 1),
            b'-' if TokTyp::expects_operand(self.prev) => (TokTyp::Op(OperatorTyp::Neg), 1),
            b'+' => (TokTyp::Op(OperatorTyp::Add), 1),
            b'-' => (TokTyp::Op(OperatorTyp::Sub), 1),
            b'*' if next == Some(b'*') => (TokTyp::Op(OperatorTyp::Exp), 2),
            b'*' => (TokTyp::Op(OperatorTyp::Mul), 1),
            b'/' => (TokTyp::Op(OperatorTyp::Div), 1),
            b'%' => (TokTyp::Op(OperatorTyp::Rem), 1),
            b'^' => (TokTyp::Op(OperatorTyp::Exp), 1),
            b'<' if next == Some(b'=') => (TokTyp::Op(OperatorTyp::Le), 2),
            b'<' => (TokTyp::Op(OperatorTyp::Lt), 1),
            b'>' if next == Some(b'=') => (TokTyp::Op(OperatorTyp::Ge), 2),
            b'>' => (TokTyp::Op(OperatorTyp::Gt), 1),
            b'=' | b'!' if next == Some(b'=') => {
                let typ = if byte == b'=' {
                    OperatorTyp::Eq
                } else {
                    OperatorTyp::Ne
                };
                // strict and loose equality are the same thing for numbers
                let len = if self.peek_at(2) == Some(b'=') { 3 } else { 2 };
                (TokTyp::Op(typ), len)
            }
            b',' => (TokTyp::Comma, 1),
            b'(' => (TokTyp::OpenParen, 1),
            b')' => (TokTyp::CloseParen, 1),

            b'=' => (TokTyp::XEqual, 1),
            b'!' => (TokTyp::XBang, 1),
            b'|' => (TokTyp::XPipe, 1),
            b'&' => (TokTyp::XAmpersand, 1),
            b'?' => (TokTyp::XQuestion, 1),
            b':' => (TokTyp::XColon, 1),
            b'[' => (TokTyp::XOpenSquareBracket, 1),
            b']' => (TokTyp::XCloseSquareBracket, 1),
            b'{' => (TokTyp::XOpenCurly, 1),
            b'}' => (TokTyp::XCloseCurly, 1),
            _ => return None,
        };
        Some(self.take(typ, len))
    }

    fn consume_number(&mut self) -> Tok {
        let mut len = 0;
        while let Some(byte) = self.peek_at(len) {
            if byte.is_ascii_digit() || byte == b'.' {
                len += 1;
            } else {
                break;
            }
        }
        // exponent, only when digits actually follow
        if let Some(b'e' | b'E') = self.peek_at(len) {
            let sign = usize::from(matches!(self.peek_at(len + 1), Some(b'+' | b'-')));
            if self
                .peek_at(len + 1 + sign)
                .map(|byte| byte.is_ascii_digit())
                .unwrap_or(false)
            {
                len += 1 + sign;
                while let Some(true) = self.peek_at(len).map(|byte| byte.is_ascii_digit()) {
                    len += 1;
                }
            }
        }
        self.take(TokTyp::Number, len)
    }

    fn consume_ident(&mut self) -> Tok {
        let mut len = 0;
        loop {
            while let Some(true) = self.peek_at(len).map(is_ident_continue) {
                len += 1;
            }
            // dotted names like `Math.sin`
            match (self.peek_at(len), self.peek_at(len + 1)) {
                (Some(b'.'), Some(byte)) if is_ident_start(byte) => len += 1,
                _ => break,
            }
        }
        let mut tok = self.take(TokTyp::Ident, len);
        if tok.loc.get().starts_with(MATH_PREFIX) {
            let (_, rest) = tok.loc.split_at(MATH_PREFIX.len());
            tok.loc = rest;
        }
        tok
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let byte = self.peek_at(0)?;
        let tok = if byte.is_ascii_digit() || byte == b'.' {
            self.consume_number()
        } else if is_ident_start(byte) {
            self.consume_ident()
        } else if let Some(tok) = self.consume_symbol(byte) {
            tok
        } else {
            self.has_errored = true;
            // report the whole (possibly multibyte) character
            let len = self.src[self.pos..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            return Some(Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: self.span(self.pos, len),
            }));
        };

        if tok.typ.is_unsupported() {
            self.has_errored = true;
            return Some(Err(LexErr {
                typ: LexErrTyp::Unsupported(tok.typ),
                loc: tok.loc,
            }));
        }
        self.prev = Some(tok.typ);
        Some(Ok(tok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Result<(TokTyp, String), LexErrTyp>> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src)
            .map(|tok| {
                tok.map(|tok| (tok.typ, tok.loc.get().to_string()))
                    .map_err(|err| err.typ)
            })
            .collect()
    }

    fn typs(src: &str) -> Vec<TokTyp> {
        lex(src)
            .into_iter()
            .map(|tok| tok.expect("lexes").0)
            .collect()
    }

    #[test]
    fn sign_depends_on_position() {
        use OperatorTyp::*;
        assert_eq!(
            typs("-x-1"),
            [
                TokTyp::Op(Neg),
                TokTyp::Ident,
                TokTyp::Op(Sub),
                TokTyp::Number
            ]
        );
        assert_eq!(
            typs("2*(-x)"),
            [
                TokTyp::Number,
                TokTyp::Op(Mul),
                TokTyp::OpenParen,
                TokTyp::Op(Neg),
                TokTyp::Ident,
                TokTyp::CloseParen
            ]
        );
    }

    #[test]
    fn math_prefix_is_stripped() {
        let toks = lex("Math.sin(x) + Math.PI");
        assert_eq!(toks[0], Ok((TokTyp::Ident, "sin".to_string())));
        assert_eq!(toks[5], Ok((TokTyp::Ident, "PI".to_string())));
    }

    #[test]
    fn numbers_with_exponents() {
        let toks = lex("2.5e-3*x");
        assert_eq!(toks[0], Ok((TokTyp::Number, "2.5e-3".to_string())));
        assert_eq!(typs("2e")[0], TokTyp::Number);
        assert_eq!(typs("2e").len(), 2);
    }

    #[test]
    fn multi_char_operators() {
        use OperatorTyp::*;
        assert_eq!(
            typs("x**2 <= 1 === 1 != 0"),
            [
                TokTyp::Ident,
                TokTyp::Op(Exp),
                TokTyp::Number,
                TokTyp::Op(Le),
                TokTyp::Number,
                TokTyp::Op(Eq),
                TokTyp::Number,
                TokTyp::Op(Ne),
                TokTyp::Number
            ]
        );
    }

    #[test]
    fn unsupported_and_invalid_stop_lexing() {
        let toks = lex("x !! 1");
        assert_eq!(toks.last(), Some(&Err(LexErrTyp::Unsupported(TokTyp::XBang))));
        assert_eq!(toks.len(), 2);

        let toks = lex("x # 1");
        assert_eq!(toks.last(), Some(&Err(LexErrTyp::InvalidChar)));

        let toks = lex("x·2");
        assert_eq!(toks.last(), Some(&Err(LexErrTyp::InvalidChar)));
    }
}

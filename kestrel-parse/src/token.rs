use crate::keywords::KEYWORDS;

use kestrel_ast::{Literal, PunctKind, Token, TokenKind, TokenStream};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
    lex_error::{LexError, LexErrorKind},
};
use kestrel_types::Span;
use num_bigint::BigUint;
use num_traits::{Num, ToPrimitive};
use std::{path::PathBuf, sync::Arc};
use unicode_xid::UnicodeXID;

struct Lexer<'a, 'e> {
    src: &'a Arc<str>,
    path: Option<Arc<PathBuf>>,
    pos: usize,
    handler: &'e Handler,
}

impl<'a, 'e> Lexer<'a, 'e> {
    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn span(&self, start: usize) -> Span {
        Span::new(self.src.clone(), start, self.pos, self.path.clone()).unwrap_or_else(Span::dummy)
    }

    fn error(&self, kind: LexErrorKind, start: usize) -> ErrorEmitted {
        let error = LexError {
            span: self.span(start),
            kind,
        };
        self.handler.emit_err(CompileError::Lex { error })
    }

    fn skip_trivia(&mut self) -> Result<(), ErrorEmitted> {
        loop {
            match (self.peek_char(), self.peek_nth(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match self.bump() {
                            Some('*') if self.peek_char() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.error(LexErrorKind::UnclosedMultilineComment, start))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ErrorEmitted> {
        self.skip_trivia()?;
        let start = self.pos;
        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some('b') if self.peek_nth(1) == Some('"') => {
                self.bump();
                self.lex_byte_string(start)?
            }
            Some(c) if c == '_' || c.is_xid_start() => {
                self.bump();
                while matches!(self.peek_char(), Some(c) if c.is_xid_continue()) {
                    self.bump();
                }
                match KEYWORDS.get(&self.src[start..self.pos]) {
                    Some(keyword) => TokenKind::Keyword(*keyword),
                    None => TokenKind::Ident,
                }
            }
            Some(c) if c.is_ascii_digit() => self.lex_number(start)?,
            Some('"') => {
                self.bump();
                let value = self.lex_quoted('"', start, LexErrorKind::UnclosedStringLiteral)?;
                TokenKind::Literal(Literal::String(value))
            }
            Some('\'') => {
                self.bump();
                let value = self.lex_quoted('\'', start, LexErrorKind::UnclosedCharLiteral)?;
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => TokenKind::Literal(Literal::Char(c)),
                    _ => return Err(self.error(LexErrorKind::ExpectedSingleCharacter, start)),
                }
            }
            Some(c) => {
                let rest = &self.src[self.pos..];
                match PunctKind::BY_LENGTH
                    .iter()
                    .find(|punct| rest.starts_with(punct.as_str()))
                {
                    Some(punct) => {
                        self.pos += punct.as_str().len();
                        TokenKind::Punct(*punct)
                    }
                    None => {
                        self.bump();
                        let kind = LexErrorKind::UnrecognizedCharacter { character: c };
                        return Err(self.error(kind, start));
                    }
                }
            }
        };
        Ok(Token {
            kind,
            span: self.span(start),
        })
    }

    /// Reads up to the closing `quote`, the opening one already consumed.
    fn lex_quoted(
        &mut self,
        quote: char,
        start: usize,
        unclosed: LexErrorKind,
    ) -> Result<String, ErrorEmitted> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(unclosed.clone(), start)),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    let escape_start = self.pos - 1;
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some(other) => {
                            return Err(self.error(
                                LexErrorKind::InvalidEscapeSequence { escape: other },
                                escape_start,
                            ))
                        }
                        None => return Err(self.error(unclosed.clone(), start)),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn lex_byte_string(&mut self, start: usize) -> Result<TokenKind, ErrorEmitted> {
        self.bump();
        let value = self.lex_quoted('"', start, LexErrorKind::UnclosedStringLiteral)?;
        if !value.is_ascii() {
            return Err(self.error(LexErrorKind::NonAsciiByteString, start));
        }
        Ok(TokenKind::Literal(Literal::ByteString(value.into_bytes())))
    }

    fn eat_digits(&mut self, radix: u32) {
        while matches!(self.peek_char(), Some(c) if c.is_digit(radix)) {
            self.bump();
        }
    }

    fn lex_number(&mut self, start: usize) -> Result<TokenKind, ErrorEmitted> {
        let is_hex = self.peek_char() == Some('0') && matches!(self.peek_nth(1), Some('x' | 'X'));
        let literal = if is_hex {
            self.pos += 2;
            let digits_start = self.pos;
            self.eat_digits(16);
            BigUint::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map(Literal::Int)
                .map_err(|_| self.error(LexErrorKind::InvalidNumericLiteral, start))?
        } else {
            self.eat_digits(10);
            let mut is_float = false;
            let has_fraction = self.peek_char() == Some('.')
                && matches!(self.peek_nth(1), Some(c) if c.is_ascii_digit());
            if has_fraction {
                is_float = true;
                self.bump();
                self.eat_digits(10);
            }
            let exponent_digit = match (self.peek_char(), self.peek_nth(1), self.peek_nth(2)) {
                (Some('e' | 'E'), Some(d), _) if d.is_ascii_digit() => Some(1),
                (Some('e' | 'E'), Some('+' | '-'), Some(d)) if d.is_ascii_digit() => Some(2),
                _ => None,
            };
            if let Some(skip) = exponent_digit {
                is_float = true;
                self.pos += skip;
                self.eat_digits(10);
            }
            let text = &self.src[start..self.pos];
            if is_float {
                text.parse::<f64>()
                    .map(Literal::Float)
                    .map_err(|_| self.error(LexErrorKind::InvalidNumericLiteral, start))?
            } else {
                BigUint::from_str_radix(text, 10)
                    .map(Literal::Int)
                    .map_err(|_| self.error(LexErrorKind::InvalidNumericLiteral, start))?
            }
        };
        let is_imaginary = matches!(self.peek_char(), Some('i' | 'j'))
            && !matches!(self.peek_nth(1), Some(c) if c.is_xid_continue());
        let literal = if is_imaginary {
            self.bump();
            match literal {
                Literal::Int(value) => Literal::Imaginary(value.to_f64().unwrap_or(f64::INFINITY)),
                Literal::Float(value) => Literal::Imaginary(value),
                other => other,
            }
        } else {
            literal
        };
        if matches!(self.peek_char(), Some(c) if c.is_xid_continue()) {
            self.eat_digits(36);
            return Err(self.error(LexErrorKind::InvalidNumericLiteral, start));
        }
        Ok(TokenKind::Literal(literal))
    }
}

/// Splits `src` into tokens.
///
/// Comments are dropped. The first lexical error is emitted to `handler` and ends lexing.
pub fn lex(
    handler: &Handler,
    src: &Arc<str>,
    path: Option<Arc<PathBuf>>,
) -> Result<TokenStream, ErrorEmitted> {
    let mut lexer = Lexer {
        src,
        path: path.clone(),
        pos: 0,
        handler,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(TokenStream::new(tokens, Span::from_string(src.clone(), path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use kestrel_ast::Keyword;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let handler = Handler::default();
        let stream = lex(&handler, &Arc::from(src), None).unwrap();
        stream.tokens().iter().map(|t| t.kind.clone()).collect()
    }

    fn lex_error(src: &str) -> LexErrorKind {
        let handler = Handler::default();
        assert!(lex(&handler, &Arc::from(src), None).is_err());
        let (errors, _) = handler.consume();
        match errors.into_iter().next() {
            Some(CompileError::Lex { error }) => error.kind,
            other => panic!("expected a lex error, got {other:?}"),
        }
    }

    #[test]
    fn lex_declaration() {
        assert_eq!(
            kinds("integer x := 5; // trailing"),
            vec![
                TokenKind::Keyword(Keyword::Integer),
                TokenKind::Ident,
                TokenKind::Punct(PunctKind::ColonEq),
                TokenKind::Literal(Literal::Int(BigUint::from(5u32))),
                TokenKind::Punct(PunctKind::Semicolon),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn longest_punctuation_wins() {
        assert_eq!(
            kinds("a **= b << c -> d"),
            vec![
                TokenKind::Ident,
                TokenKind::Punct(PunctKind::StarStarEq),
                TokenKind::Ident,
                TokenKind::Punct(PunctKind::Shl),
                TokenKind::Ident,
                TokenKind::Punct(PunctKind::Arrow),
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(
            kinds("0x1F 2.5 1e3 3i 1.5j"),
            vec![
                TokenKind::Literal(Literal::Int(BigUint::from(31u32))),
                TokenKind::Literal(Literal::Float(2.5)),
                TokenKind::Literal(Literal::Float(1000.0)),
                TokenKind::Literal(Literal::Imaginary(3.0)),
                TokenKind::Literal(Literal::Imaginary(1.5)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn member_access_on_integer_is_not_a_float() {
        assert_matches!(
            kinds("5.x").as_slice(),
            [
                TokenKind::Literal(Literal::Int(_)),
                TokenKind::Punct(PunctKind::Dot),
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_like_literals() {
        assert_eq!(
            kinds(r#""a\n\"b" 'c' '\'' b"xy""#),
            vec![
                TokenKind::Literal(Literal::String("a\n\"b".into())),
                TokenKind::Literal(Literal::Char('c')),
                TokenKind::Literal(Literal::Char('\'')),
                TokenKind::Literal(Literal::ByteString(b"xy".to_vec())),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_elided() {
        assert_eq!(
            kinds("/* a\n block */ x /* y */"),
            vec![TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn token_positions() {
        let handler = Handler::default();
        let stream = lex(&handler, &Arc::from("a\n  bb"), None).unwrap();
        let pos = stream.tokens()[1].span.start_pos();
        assert_eq!((pos.line, pos.col), (2, 3));
    }

    #[test]
    fn lexical_errors() {
        assert_eq!(lex_error("a $ b"), LexErrorKind::UnrecognizedCharacter { character: '$' });
        assert_eq!(lex_error("\"abc"), LexErrorKind::UnclosedStringLiteral);
        assert_eq!(lex_error("/* abc"), LexErrorKind::UnclosedMultilineComment);
        assert_eq!(lex_error("'ab'"), LexErrorKind::ExpectedSingleCharacter);
        assert_eq!(lex_error("\"\\q\""), LexErrorKind::InvalidEscapeSequence { escape: 'q' });
        assert_eq!(lex_error("12abc"), LexErrorKind::InvalidNumericLiteral);
    }
}

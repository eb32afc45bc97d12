use kestrel_types::{Span, Spanned};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("{}", kind)]
pub struct LexError {
    pub span: Span,
    pub kind: LexErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    #[error("Unrecognized character `{character}`.")]
    UnrecognizedCharacter { character: char },
    #[error("Unclosed multi-line comment.")]
    UnclosedMultilineComment,
    #[error("Unclosed string literal.")]
    UnclosedStringLiteral,
    #[error("Unclosed char literal.")]
    UnclosedCharLiteral,
    #[error("Char literals must contain exactly one character.")]
    ExpectedSingleCharacter,
    #[error("Invalid escape sequence `\\{escape}`.")]
    InvalidEscapeSequence { escape: char },
    #[error("Invalid numeric literal.")]
    InvalidNumericLiteral,
    #[error("Byte strings may only contain ASCII characters.")]
    NonAsciiByteString,
}

impl Spanned for LexError {
    fn span(&self) -> Span {
        self.span.clone()
    }
}

use crate::priv_prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PunctKind {
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    EqEq,
    BangEq,
    Lt,
    Le,
    Gt,
    Ge,
    ColonEq,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    StarStarEq,
    SlashEq,
    PercentEq,
    AmpersandEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    Dot,
    Arrow,
    Comma,
    Semicolon,
    Colon,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
}

impl PunctKind {
    pub fn as_str(self) -> &'static str {
        use PunctKind::*;
        match self {
            Plus => "+",
            Minus => "-",
            Star => "*",
            StarStar => "**",
            Slash => "/",
            Percent => "%",
            Ampersand => "&",
            Pipe => "|",
            Caret => "^",
            Tilde => "~",
            Shl => "<<",
            Shr => ">>",
            EqEq => "==",
            BangEq => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            ColonEq => ":=",
            Eq => "=",
            PlusEq => "+=",
            MinusEq => "-=",
            StarEq => "*=",
            StarStarEq => "**=",
            SlashEq => "/=",
            PercentEq => "%=",
            AmpersandEq => "&=",
            PipeEq => "|=",
            CaretEq => "^=",
            ShlEq => "<<=",
            ShrEq => ">>=",
            Dot => ".",
            Arrow => "->",
            Comma => ",",
            Semicolon => ";",
            Colon => ":",
            OpenParen => "(",
            CloseParen => ")",
            OpenBracket => "[",
            CloseBracket => "]",
            OpenBrace => "{",
            CloseBrace => "}",
        }
    }

    /// All punctuation, longest spelling first, for maximal-munch lexing.
    pub const BY_LENGTH: &'static [PunctKind] = &[
        PunctKind::StarStarEq,
        PunctKind::ShlEq,
        PunctKind::ShrEq,
        PunctKind::StarStar,
        PunctKind::Shl,
        PunctKind::Shr,
        PunctKind::EqEq,
        PunctKind::BangEq,
        PunctKind::Le,
        PunctKind::Ge,
        PunctKind::ColonEq,
        PunctKind::PlusEq,
        PunctKind::MinusEq,
        PunctKind::StarEq,
        PunctKind::SlashEq,
        PunctKind::PercentEq,
        PunctKind::AmpersandEq,
        PunctKind::PipeEq,
        PunctKind::CaretEq,
        PunctKind::Arrow,
        PunctKind::Plus,
        PunctKind::Minus,
        PunctKind::Star,
        PunctKind::Slash,
        PunctKind::Percent,
        PunctKind::Ampersand,
        PunctKind::Pipe,
        PunctKind::Caret,
        PunctKind::Tilde,
        PunctKind::Lt,
        PunctKind::Gt,
        PunctKind::Eq,
        PunctKind::Dot,
        PunctKind::Comma,
        PunctKind::Semicolon,
        PunctKind::Colon,
        PunctKind::OpenParen,
        PunctKind::CloseParen,
        PunctKind::OpenBracket,
        PunctKind::CloseBracket,
        PunctKind::OpenBrace,
        PunctKind::CloseBrace,
    ];

    /// The binary operator a compound assignment applies before storing.
    pub fn compound_op(self) -> Option<BinaryOp> {
        use PunctKind::*;
        let op = match self {
            PlusEq => BinaryOp::Add,
            MinusEq => BinaryOp::Sub,
            StarEq => BinaryOp::Mul,
            StarStarEq => BinaryOp::Pow,
            SlashEq => BinaryOp::Div,
            PercentEq => BinaryOp::Mod,
            AmpersandEq => BinaryOp::BitAnd,
            PipeEq => BinaryOp::BitOr,
            CaretEq => BinaryOp::BitXor,
            ShlEq => BinaryOp::Shl,
            ShrEq => BinaryOp::Shr,
            _ => return None,
        };
        Some(op)
    }

    /// `:=`, `=` or a compound assignment.
    pub fn is_assignment(self) -> bool {
        matches!(self, PunctKind::ColonEq | PunctKind::Eq) || self.compound_op().is_some()
    }
}

impl fmt::Display for PunctKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    Literal(Literal),
    Punct(PunctKind),
    Eof,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn is_punct(&self, kind: PunctKind) -> bool {
        self.kind == TokenKind::Punct(kind)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Text used in diagnostics about this token.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => self.span.as_str().to_string(),
        }
    }
}

impl Spanned for Token {
    fn span(&self) -> Span {
        self.span.clone()
    }
}

/// The tokens of one source buffer, always terminated by a single `Eof` token.
#[derive(Clone, Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    span: Span,
}

impl TokenStream {
    /// Builds a stream, appending the `Eof` sentinel if it is missing.
    pub fn new(mut tokens: Vec<Token>, span: Span) -> TokenStream {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: span.end_point(),
            });
        }
        TokenStream { tokens, span }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }
}

impl Spanned for TokenStream {
    fn span(&self) -> Span {
        self.span.clone()
    }
}

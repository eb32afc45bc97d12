use crate::Parse;

use core::ops::BitOr;
use kestrel_ast::{
    ClassDecl, Expr, FunctionDecl, Keyword, NodeId, NodeMeta, PunctKind, Token, TokenKind,
    TokenStream,
};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
    parser_error::{ParseError, ParseErrorKind},
};
use kestrel_types::{Ident, Span, Spanned};

pub type ParseResult<T> = Result<T, ErrorEmitted>;

/// The syntactic position the parser is in.
///
/// Flags combine; constructs that are only legal in some positions check them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context(u8);

impl Context {
    pub const GLOBAL: Context = Context(1 << 0);
    pub const LOCAL: Context = Context(1 << 1);
    pub const CLASS: Context = Context(1 << 2);
    pub const FUNCTION: Context = Context(1 << 3);
    pub const LOOP: Context = Context(1 << 4);
    pub const IF: Context = Context(1 << 5);
    pub const TRY: Context = Context(1 << 6);
    pub const EXPRESSION: Context = Context(1 << 7);

    pub fn contains(self, other: Context) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Context) -> bool {
        self.0 & other.0 != 0
    }

    pub fn without(self, other: Context) -> Context {
        Context(self.0 & !other.0)
    }
}

impl BitOr for Context {
    type Output = Context;

    fn bitor(self, rhs: Context) -> Context {
        Context(self.0 | rhs.0)
    }
}

pub struct Parser<'a, 'e> {
    tokens: &'a [Token],
    prev_span: Span,
    handler: &'e Handler,
    next_id: u32,
    context: Context,
    classes: Vec<ClassDecl>,
    functions: Vec<FunctionDecl>,
}

impl<'a, 'e> Parser<'a, 'e> {
    pub fn new(handler: &'e Handler, token_stream: &'a TokenStream) -> Parser<'a, 'e> {
        Parser {
            tokens: token_stream.tokens(),
            prev_span: token_stream.span().end_point(),
            handler,
            next_id: 0,
            context: Context::GLOBAL,
            classes: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn parse<T: Parse>(&mut self) -> ParseResult<T> {
        T::parse(self)
    }

    /// Parses a `T` and fails unless every token was consumed.
    pub fn parse_to_end<T: Parse>(mut self) -> ParseResult<T> {
        let value = self.parse()?;
        if !self.is_at_end() {
            return Err(self.emit_error(ParseErrorKind::UnexpectedTrailingToken));
        }
        Ok(value)
    }

    pub fn emit_error(&mut self, kind: ParseErrorKind) -> ErrorEmitted {
        let span = self.current().span.clone();
        self.emit_error_with_span(kind, span)
    }

    pub fn emit_error_with_span(&mut self, kind: ParseErrorKind, span: Span) -> ErrorEmitted {
        let error = ParseError { span, kind };
        self.handler.emit_err(CompileError::Parse { error })
    }

    /// The current token. The stream always ends in `Eof`, which is never consumed.
    pub fn current(&self) -> &'a Token {
        &self.tokens[0]
    }

    /// The token `n` positions after the current one, clamped to `Eof`.
    pub fn lookahead(&self, n: usize) -> &'a Token {
        let index = n.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub fn prev_span(&self) -> &Span {
        &self.prev_span
    }

    pub fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.prev_span = token.span.clone();
            self.tokens = &self.tokens[1..];
        }
        token
    }

    pub fn peek_punct(&self, kind: PunctKind) -> bool {
        self.current().is_punct(kind)
    }

    pub fn peek_keyword(&self, keyword: Keyword) -> bool {
        self.current().is_keyword(keyword)
    }

    pub fn take_punct(&mut self, kind: PunctKind) -> Option<Span> {
        self.peek_punct(kind).then(|| self.advance().span.clone())
    }

    /// Takes the current token if it is one of `kinds`.
    pub fn take_punct_of(&mut self, kinds: &[PunctKind]) -> Option<(PunctKind, Span)> {
        match &self.current().kind {
            TokenKind::Punct(kind) if kinds.contains(kind) => {
                let kind = *kind;
                Some((kind, self.advance().span.clone()))
            }
            _ => None,
        }
    }

    pub fn take_keyword(&mut self, keyword: Keyword) -> Option<Span> {
        self.peek_keyword(keyword)
            .then(|| self.advance().span.clone())
    }

    pub fn take_ident(&mut self) -> Option<Ident> {
        match self.current().kind {
            TokenKind::Ident => Some(Ident::new(self.advance().span.clone())),
            _ => None,
        }
    }

    /// Consumes the current token unconditionally.
    pub fn bump(&mut self) -> &'a Token {
        self.advance()
    }

    pub fn expect_punct(&mut self, kind: PunctKind) -> ParseResult<Span> {
        match self.take_punct(kind) {
            Some(span) => Ok(span),
            None => Err(self.expected(kind.as_str())),
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<Span> {
        match self.take_keyword(keyword) {
            Some(span) => Ok(span),
            None => Err(self.expected(keyword.as_str())),
        }
    }

    pub fn expect_ident(&mut self) -> ParseResult<Ident> {
        match self.take_ident() {
            Some(ident) => Ok(ident),
            None if self.is_at_end() => Err(self.emit_error(ParseErrorKind::UnexpectedEof)),
            None => Err(self.emit_error(ParseErrorKind::ExpectedIdent)),
        }
    }

    fn expected(&mut self, expected: &str) -> ErrorEmitted {
        let found = self.current().describe();
        self.emit_error(ParseErrorKind::ExpectedToken {
            expected: expected.to_string(),
            found,
        })
    }

    pub fn context(&self) -> Context {
        self.context
    }

    /// Runs `f` with `context` in place of the current one.
    pub fn with_context<T>(&mut self, context: Context, f: impl FnOnce(&mut Self) -> T) -> T {
        let outer = std::mem::replace(&mut self.context, context);
        let res = f(self);
        self.context = outer;
        res
    }

    /// Span from `start` up to the end of the last consumed token.
    pub fn span_from(&self, start: &Span) -> Span {
        Span::join(start.clone(), &self.prev_span)
    }

    pub fn meta(&mut self, span: Span) -> NodeMeta {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        NodeMeta::new(id, span)
    }

    /// A deep copy of `expr` whose nodes all get fresh ids.
    pub fn fresh_copy(&mut self, expr: &Expr) -> Expr {
        let mut copy = expr.clone();
        copy.for_each_meta_mut(&mut |meta| {
            *meta = NodeMeta::new(NodeId::new(self.next_id), meta.span.clone());
            self.next_id += 1;
        });
        copy
    }

    /// Number of node ids handed out so far.
    pub fn node_count(&self) -> u32 {
        self.next_id
    }

    /// Classes and functions are collected at program level wherever they are declared.
    pub(crate) fn hoist_class(&mut self, class: ClassDecl) {
        self.classes.push(class);
    }

    pub(crate) fn hoist_function(&mut self, function: FunctionDecl) {
        self.functions.push(function);
    }

    pub(crate) fn take_declarations(&mut self) -> (Vec<ClassDecl>, Vec<FunctionDecl>) {
        (
            std::mem::take(&mut self.classes),
            std::mem::take(&mut self.functions),
        )
    }

    pub fn current_span(&self) -> Span {
        self.current().span()
    }
}

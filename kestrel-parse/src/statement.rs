use crate::{
    expr::parse_nested,
    item::{parse_class, parse_function_rest},
    parser::Context,
    ty::{looks_like_generic_declaration, parse_type},
    Parse, ParseResult, Parser,
};

use kestrel_ast::{
    AssignKind, ElseBranch, Expr, IfStatement, Keyword, PunctKind, ScopeBlock, Statement,
    StatementKind, TokenKind, TypeRef, VarDecl,
};
use kestrel_error::parser_error::ParseErrorKind;

impl Parse for ScopeBlock {
    fn parse(parser: &mut Parser) -> ParseResult<ScopeBlock> {
        let start = parser.expect_punct(PunctKind::OpenBrace)?;
        let mut statements = Vec::new();
        loop {
            if parser.take_punct(PunctKind::CloseBrace).is_some() {
                break;
            }
            if parser.is_at_end() {
                return Err(parser.emit_error(ParseErrorKind::UnexpectedEof));
            }
            if let Some(statement) = parse_statement(parser)? {
                statements.push(statement);
            }
        }
        let span = parser.span_from(&start);
        let meta = parser.meta(span);
        Ok(ScopeBlock::new(meta, statements))
    }
}

/// Parses a block nested in the current one, adding `extra` to the context.
///
/// Nested blocks are never at program level, so `GLOBAL` is dropped.
pub(crate) fn parse_nested_block(parser: &mut Parser, extra: Context) -> ParseResult<ScopeBlock> {
    let context = parser.context().without(Context::GLOBAL) | Context::LOCAL | extra;
    parser.with_context(context, |parser| parser.parse())
}

/// Parses one statement. Class and function declarations are hoisted into the
/// parser and yield `None`.
pub(crate) fn parse_statement(parser: &mut Parser) -> ParseResult<Option<Statement>> {
    let start = parser.current_span();
    let token = parser.current();
    let kind = match &token.kind {
        TokenKind::Keyword(Keyword::Class) => {
            if !parser.context().intersects(Context::GLOBAL | Context::CLASS) {
                return Err(parser.emit_error(ParseErrorKind::MisplacedClassDeclaration));
            }
            let class = parse_class(parser)?;
            parser.hoist_class(class);
            return Ok(None);
        }
        TokenKind::Keyword(Keyword::If) => {
            parser.bump();
            StatementKind::If(parse_if_rest(parser)?)
        }
        TokenKind::Keyword(Keyword::While) => {
            parser.bump();
            let condition = parse_condition(parser)?;
            let body = parse_nested_block(parser, Context::LOOP)?;
            StatementKind::While { condition, body }
        }
        TokenKind::Keyword(Keyword::Try) => {
            parser.bump();
            let body = parse_nested_block(parser, Context::TRY)?;
            parser.expect_keyword(Keyword::Catch)?;
            let handler = parse_nested_block(parser, Context::TRY)?;
            StatementKind::Try { body, handler }
        }
        TokenKind::Keyword(Keyword::Return) => {
            if !parser.context().contains(Context::FUNCTION) {
                return Err(parser.emit_error(ParseErrorKind::ReturnOutsideFunction));
            }
            parser.bump();
            let value = if parser.peek_punct(PunctKind::Semicolon) {
                None
            } else {
                Some(parse_nested(parser)?)
            };
            parser.expect_punct(PunctKind::Semicolon)?;
            StatementKind::Return(value)
        }
        TokenKind::Keyword(keyword @ (Keyword::Break | Keyword::Continue)) => {
            if !parser.context().contains(Context::LOOP) {
                return Err(parser.emit_error(ParseErrorKind::OutsideLoop {
                    keyword: keyword.as_str(),
                }));
            }
            parser.bump();
            parser.expect_punct(PunctKind::Semicolon)?;
            match keyword {
                Keyword::Break => StatementKind::Break,
                _ => StatementKind::Continue,
            }
        }
        TokenKind::Punct(PunctKind::OpenBrace) => {
            StatementKind::Block(parse_nested_block(parser, Context::default())?)
        }
        TokenKind::Keyword(keyword) if keyword.starts_type() => {
            return parse_declaration(parser);
        }
        TokenKind::Ident => {
            let next = parser.lookahead(1);
            let is_declaration = match &next.kind {
                TokenKind::Ident => true,
                TokenKind::Punct(PunctKind::OpenBracket) => looks_like_generic_declaration(parser),
                _ => false,
            };
            if is_declaration {
                return parse_declaration(parser);
            }
            StatementKind::Expr(parse_expression_statement(parser)?)
        }
        TokenKind::Eof => return Err(parser.emit_error(ParseErrorKind::UnexpectedEof)),
        _ => StatementKind::Expr(parse_expression_statement(parser)?),
    };
    let span = parser.span_from(&start);
    Ok(Some(Statement {
        meta: parser.meta(span),
        kind,
    }))
}

fn parse_expression_statement(parser: &mut Parser) -> ParseResult<Expr> {
    let context = parser.context().without(Context::EXPRESSION);
    let expr = parser.with_context(context, |parser| parser.parse::<Expr>())?;
    parser.expect_punct(PunctKind::Semicolon)?;
    Ok(expr)
}

fn parse_condition(parser: &mut Parser) -> ParseResult<Expr> {
    parser.expect_punct(PunctKind::OpenParen)?;
    let condition = parse_nested(parser)?;
    parser.expect_punct(PunctKind::CloseParen)?;
    Ok(condition)
}

/// Everything after the `if` keyword, including any `else` chain.
fn parse_if_rest(parser: &mut Parser) -> ParseResult<IfStatement> {
    let condition = parse_condition(parser)?;
    let then_block = parse_nested_block(parser, Context::IF)?;
    let else_branch = if parser.take_keyword(Keyword::Else).is_some() {
        if parser.take_keyword(Keyword::If).is_some() {
            Some(ElseBranch::If(Box::new(parse_if_rest(parser)?)))
        } else {
            Some(ElseBranch::Block(parse_nested_block(parser, Context::IF)?))
        }
    } else {
        None
    };
    Ok(IfStatement {
        condition,
        then_block,
        else_branch,
    })
}

/// `Type name ...`: either a function declaration or a variable declaration.
fn parse_declaration(parser: &mut Parser) -> ParseResult<Option<Statement>> {
    let start = parser.current_span();
    let ty = parse_type(parser, true)?;
    let name = parser.expect_ident()?;
    if parser.peek_punct(PunctKind::OpenParen) {
        if !parser.context().contains(Context::GLOBAL) {
            return Err(parser.emit_error_with_span(
                ParseErrorKind::MisplacedFunctionDeclaration,
                start,
            ));
        }
        let function = parse_function_rest(parser, start, ty, name, None, None)?;
        parser.hoist_function(function);
        return Ok(None);
    }
    if ty.is_void() {
        return Err(parser.emit_error_with_span(ParseErrorKind::MisplacedVoid, ty.meta.span));
    }
    let init = parse_initializer(parser)?;
    parser.expect_punct(PunctKind::Semicolon)?;
    let span = parser.span_from(&start);
    Ok(Some(Statement {
        meta: parser.meta(span),
        kind: StatementKind::VarDecl(VarDecl { ty, name, init }),
    }))
}

/// An optional `:= value` or `= value`.
pub(crate) fn parse_initializer(parser: &mut Parser) -> ParseResult<Option<(AssignKind, Expr)>> {
    let kind = if parser.take_punct(PunctKind::ColonEq).is_some() {
        AssignKind::Value
    } else if parser.take_punct(PunctKind::Eq).is_some() {
        AssignKind::Reference
    } else {
        return Ok(None);
    };
    Ok(Some((kind, parse_nested(parser)?)))
}

/// Parameters after the opening parenthesis, up to and including the closing one.
pub(crate) fn parse_params(parser: &mut Parser) -> ParseResult<Vec<kestrel_ast::Param>> {
    let mut params = Vec::new();
    if parser.take_punct(PunctKind::CloseParen).is_some() {
        return Ok(params);
    }
    loop {
        let start = parser.current_span();
        let ty: TypeRef = parser.parse()?;
        let name = parser.expect_ident()?;
        let span = parser.span_from(&start);
        params.push(kestrel_ast::Param {
            meta: parser.meta(span),
            ty,
            name,
        });
        if parser.take_punct(PunctKind::Comma).is_some() {
            continue;
        }
        if parser.take_punct(PunctKind::CloseParen).is_some() {
            return Ok(params);
        }
        return Err(parser.emit_error(ParseErrorKind::ExpectedCommaOrCloseParen));
    }
}

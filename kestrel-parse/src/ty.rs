use crate::{Parse, ParseResult, Parser};

use kestrel_ast::{Keyword, Modifiers, PunctKind, TokenKind, TypeKind, TypeRef};
use kestrel_error::parser_error::ParseErrorKind;

impl Parse for TypeRef {
    fn parse(parser: &mut Parser) -> ParseResult<TypeRef> {
        parse_type(parser, false)
    }
}

/// Parses `[const] [reference] [nullable] base`; `void` only when `allow_void` is set.
pub(crate) fn parse_type(parser: &mut Parser, allow_void: bool) -> ParseResult<TypeRef> {
    let start = parser.current_span();
    let modifiers = parse_modifiers(parser)?;
    let kind = match parser.current().kind.clone() {
        TokenKind::Keyword(Keyword::Void) => {
            if !allow_void || modifiers != Modifiers::NONE {
                return Err(parser.emit_error(ParseErrorKind::MisplacedVoid));
            }
            parser.bump();
            TypeKind::Void
        }
        TokenKind::Keyword(Keyword::Array) => {
            parser.bump();
            TypeKind::Array(parse_type_args(parser)?.unwrap_or_default())
        }
        TokenKind::Keyword(Keyword::Keymap) => {
            parser.bump();
            TypeKind::Keymap(parse_type_args(parser)?.unwrap_or_default())
        }
        TokenKind::Keyword(keyword) => match keyword.primitive() {
            Some(primitive) => {
                parser.bump();
                TypeKind::Primitive(primitive)
            }
            None => return Err(parser.emit_error(ParseErrorKind::ExpectedType)),
        },
        TokenKind::Ident => {
            let name = parser.expect_ident()?;
            match parse_type_args(parser)? {
                Some(args) => TypeKind::GenericClass(name, args),
                None => TypeKind::Class(name),
            }
        }
        TokenKind::Eof => return Err(parser.emit_error(ParseErrorKind::UnexpectedEof)),
        _ => return Err(parser.emit_error(ParseErrorKind::ExpectedType)),
    };
    let span = parser.span_from(&start);
    Ok(TypeRef {
        meta: parser.meta(span),
        kind,
        modifiers,
    })
}

fn parse_modifiers(parser: &mut Parser) -> ParseResult<Modifiers> {
    let mut modifiers = Modifiers::default();
    loop {
        let (flag, keyword) = if parser.peek_keyword(Keyword::Const) {
            (&mut modifiers.is_const, Keyword::Const)
        } else if parser.peek_keyword(Keyword::Reference) {
            (&mut modifiers.is_reference, Keyword::Reference)
        } else if parser.peek_keyword(Keyword::Nullable) {
            (&mut modifiers.is_nullable, Keyword::Nullable)
        } else {
            return Ok(modifiers);
        };
        if *flag {
            return Err(parser.emit_error(ParseErrorKind::DuplicateModifier {
                modifier: keyword.as_str(),
            }));
        }
        *flag = true;
        parser.bump();
    }
}

/// Parses an optional `[T, ...]` argument list.
fn parse_type_args(parser: &mut Parser) -> ParseResult<Option<Vec<TypeRef>>> {
    if parser.take_punct(PunctKind::OpenBracket).is_none() {
        return Ok(None);
    }
    let mut args = Vec::new();
    if parser.take_punct(PunctKind::CloseBracket).is_some() {
        return Ok(Some(args));
    }
    loop {
        args.push(parse_type(parser, false)?);
        if parser.take_punct(PunctKind::Comma).is_some() {
            continue;
        }
        if parser.take_punct(PunctKind::CloseBracket).is_some() {
            return Ok(Some(args));
        }
        return Err(parser.emit_error(ParseErrorKind::ExpectedCommaOrCloseBracket));
    }
}

/// Whether the tokens starting at the current one look like a generic type
/// followed by a declared name, e.g. `Box[integer] b`.
pub(crate) fn looks_like_generic_declaration(parser: &Parser) -> bool {
    if !parser.lookahead(1).is_punct(PunctKind::OpenBracket) {
        return false;
    }
    let mut depth = 0usize;
    let mut n = 1;
    loop {
        let token = parser.lookahead(n);
        match &token.kind {
            TokenKind::Punct(PunctKind::OpenBracket) => depth += 1,
            TokenKind::Punct(PunctKind::CloseBracket) => {
                depth -= 1;
                if depth == 0 {
                    return parser.lookahead(n + 1).kind == TokenKind::Ident;
                }
            }
            TokenKind::Punct(
                PunctKind::Semicolon | PunctKind::OpenBrace | PunctKind::CloseBrace,
            )
            | TokenKind::Eof => return false,
            _ => {}
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{parse, parse_err};
    use assert_matches::assert_matches;
    use kestrel_ast::PrimitiveKind;

    #[test]
    fn parse_primitive() {
        let ty = parse::<TypeRef>("integer");
        assert_matches!(ty.kind, TypeKind::Primitive(PrimitiveKind::Integer));
        assert_eq!(ty.modifiers, Modifiers::NONE);
    }

    #[test]
    fn parse_modifiers_in_any_order() {
        let ty = parse::<TypeRef>("nullable const reference string");
        assert_eq!(
            ty.modifiers,
            Modifiers {
                is_const: true,
                is_reference: true,
                is_nullable: true,
            }
        );
    }

    #[test]
    fn parse_collections() {
        let ty = parse::<TypeRef>("keymap[string, array[double]]");
        assert_matches!(
            &ty.kind,
            TypeKind::Keymap(args) if args.len() == 2
                && matches!(&args[1].kind, TypeKind::Array(inner) if inner.len() == 1)
        );
        assert_eq!(ty.to_string(), "keymap[string, array[double]]");
    }

    #[test]
    fn parse_generic_class() {
        let ty = parse::<TypeRef>("reference Pair[integer, Box[T]]");
        assert_matches!(&ty.kind, TypeKind::GenericClass(name, args) if name.as_str() == "Pair" && args.len() == 2);
        assert!(ty.modifiers.is_reference);
    }

    #[test]
    fn void_is_rejected_outside_return_types() {
        assert_eq!(parse_err::<TypeRef>("void"), ParseErrorKind::MisplacedVoid);
        assert_eq!(
            parse_err::<TypeRef>("const const integer"),
            ParseErrorKind::DuplicateModifier { modifier: "const" }
        );
    }
}

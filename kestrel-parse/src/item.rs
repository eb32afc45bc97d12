use crate::{
    parser::Context,
    statement::{parse_initializer, parse_params, parse_statement},
    ty::parse_type,
    Parse, ParseResult, Parser,
};

use kestrel_ast::{
    Access, BinaryOp, ClassDecl, FieldDecl, FunctionDecl, Keyword, MethodDecl, OperatorName,
    Program, PunctKind, ScopeBlock, TokenKind, TypeRef, UnaryOp,
};
use kestrel_error::parser_error::ParseErrorKind;
use kestrel_types::{Ident, Span};

impl Parse for Program {
    fn parse(parser: &mut Parser) -> ParseResult<Program> {
        let mut statements = Vec::new();
        parser.with_context(Context::GLOBAL, |parser| {
            while !parser.is_at_end() {
                if let Some(statement) = parse_statement(parser)? {
                    statements.push(statement);
                }
            }
            Ok(())
        })?;
        let (classes, functions) = parser.take_declarations();
        Ok(Program {
            classes,
            functions,
            statements,
            node_count: parser.node_count(),
        })
    }
}

/// Everything after a function's name: the parameter list and the body.
pub(crate) fn parse_function_rest(
    parser: &mut Parser,
    start: Span,
    return_type: TypeRef,
    name: Ident,
    owner: Option<Ident>,
    operator: Option<OperatorName>,
) -> ParseResult<FunctionDecl> {
    parser.expect_punct(PunctKind::OpenParen)?;
    let params = parse_params(parser)?;
    let body = parse_body(parser)?;
    let span = parser.span_from(&start);
    Ok(FunctionDecl {
        meta: parser.meta(span),
        return_type,
        name,
        params,
        body,
        owner,
        operator,
    })
}

/// Function and method bodies start a fresh local context.
fn parse_body(parser: &mut Parser) -> ParseResult<ScopeBlock> {
    parser.with_context(Context::LOCAL | Context::FUNCTION, |parser| parser.parse())
}

pub(crate) fn parse_class(parser: &mut Parser) -> ParseResult<ClassDecl> {
    let start = parser.expect_keyword(Keyword::Class)?;
    let name = parser.expect_ident()?;
    let generics = parse_generic_params(parser)?;
    let superclass = match parser.take_keyword(Keyword::Extends) {
        Some(_) => Some(parser.parse::<TypeRef>()?),
        None => None,
    };
    parser.expect_punct(PunctKind::OpenBrace)?;
    let (fields, methods) = parser.with_context(Context::CLASS, |parser| parse_members(parser, &name))?;
    let span = parser.span_from(&start);
    Ok(ClassDecl {
        meta: parser.meta(span),
        name,
        generics,
        superclass,
        fields,
        methods,
    })
}

fn parse_generic_params(parser: &mut Parser) -> ParseResult<Vec<Ident>> {
    let mut generics = Vec::new();
    if parser.take_punct(PunctKind::OpenBracket).is_none() {
        return Ok(generics);
    }
    loop {
        generics.push(parser.expect_ident()?);
        if parser.take_punct(PunctKind::Comma).is_some() {
            continue;
        }
        if parser.take_punct(PunctKind::CloseBracket).is_some() {
            return Ok(generics);
        }
        return Err(parser.emit_error(ParseErrorKind::ExpectedCommaOrCloseBracket));
    }
}

#[derive(Default)]
struct MemberModifiers {
    access: Option<(Access, Span)>,
    is_static: Option<Span>,
    is_virtual: Option<Span>,
    is_overload: Option<Span>,
}

impl MemberModifiers {
    fn parse(parser: &mut Parser) -> ParseResult<MemberModifiers> {
        let mut modifiers = MemberModifiers::default();
        loop {
            let TokenKind::Keyword(keyword) = parser.current().kind else {
                return Ok(modifiers);
            };
            let access = match keyword {
                Keyword::Public => Some(Access::Public),
                Keyword::Private => Some(Access::Private),
                Keyword::Protected => Some(Access::Protected),
                _ => None,
            };
            let duplicate = match (keyword, access) {
                (_, Some(_)) => modifiers.access.is_some(),
                (Keyword::Static, _) => modifiers.is_static.is_some(),
                (Keyword::Virtual, _) => modifiers.is_virtual.is_some(),
                (Keyword::Overload, _) => modifiers.is_overload.is_some(),
                _ => return Ok(modifiers),
            };
            if duplicate {
                return Err(parser.emit_error(ParseErrorKind::DuplicateModifier {
                    modifier: keyword.as_str(),
                }));
            }
            let span = parser.bump().span.clone();
            match (keyword, access) {
                (_, Some(access)) => modifiers.access = Some((access, span)),
                (Keyword::Static, _) => modifiers.is_static = Some(span),
                (Keyword::Virtual, _) => modifiers.is_virtual = Some(span),
                _ => modifiers.is_overload = Some(span),
            }
        }
    }

    /// The first modifier written, if any.
    fn first(&self) -> Option<(&'static str, Span)> {
        [
            self.access
                .as_ref()
                .map(|(access, span)| (access.as_str(), span.clone())),
            self.is_static.clone().map(|span| ("static", span)),
            self.is_virtual.clone().map(|span| ("virtual", span)),
            self.is_overload.clone().map(|span| ("overload", span)),
        ]
        .into_iter()
        .flatten()
        .min_by_key(|(_, span)| span.start())
    }
}

fn parse_members(
    parser: &mut Parser,
    class_name: &Ident,
) -> ParseResult<(Vec<FieldDecl>, Vec<MethodDecl>)> {
    let mut fields = Vec::new();
    let mut methods = Vec::new();
    loop {
        if parser.take_punct(PunctKind::CloseBrace).is_some() {
            return Ok((fields, methods));
        }
        match &parser.current().kind {
            TokenKind::Keyword(Keyword::Class) => {
                let class = parse_class(parser)?;
                parser.hoist_class(class);
                continue;
            }
            TokenKind::Keyword(keyword @ (Keyword::If | Keyword::While)) => {
                return Err(parser.emit_error(ParseErrorKind::StatementInClassBody {
                    keyword: keyword.as_str(),
                }));
            }
            TokenKind::Eof => return Err(parser.emit_error(ParseErrorKind::UnexpectedEof)),
            TokenKind::Ident | TokenKind::Keyword(_) => {}
            _ => return Err(parser.emit_error(ParseErrorKind::ExpectedClassMember)),
        }

        let start = parser.current_span();
        let modifiers = MemberModifiers::parse(parser)?;
        match parser.current().kind {
            TokenKind::Ident => {}
            TokenKind::Keyword(keyword) if keyword.starts_type() => {}
            _ => return Err(parser.emit_error(ParseErrorKind::ExpectedClassMember)),
        }
        let ty = parse_type(parser, true)?;

        if parser.peek_keyword(Keyword::Operator) {
            if let Some((modifier, span)) = modifiers.first() {
                return Err(parser.emit_error_with_span(
                    ParseErrorKind::MisplacedModifier {
                        modifier,
                        member: "operator functions",
                    },
                    span,
                ));
            }
            let function = parse_operator(parser, start, ty, class_name)?;
            parser.hoist_function(function);
            continue;
        }

        let name = parser.expect_ident()?;
        let access = modifiers
            .access
            .as_ref()
            .map(|(access, _)| *access)
            .unwrap_or_default();
        if parser.take_punct(PunctKind::OpenParen).is_some() {
            let params = parse_params(parser)?;
            let body = parse_body(parser)?;
            let span = parser.span_from(&start);
            methods.push(MethodDecl {
                meta: parser.meta(span),
                access,
                is_static: modifiers.is_static.is_some(),
                is_virtual: modifiers.is_virtual.is_some(),
                is_overload: modifiers.is_overload.is_some(),
                return_type: ty,
                name,
                params,
                body,
            });
            continue;
        }

        if ty.is_void() {
            return Err(parser.emit_error_with_span(ParseErrorKind::MisplacedVoid, ty.meta.span));
        }
        if let Some((modifier, span)) = modifiers
            .is_virtual
            .clone()
            .map(|span| ("virtual", span))
            .or_else(|| modifiers.is_overload.clone().map(|span| ("overload", span)))
        {
            return Err(parser.emit_error_with_span(
                ParseErrorKind::MisplacedModifier {
                    modifier,
                    member: "fields",
                },
                span,
            ));
        }
        let init = parse_initializer(parser)?;
        parser.expect_punct(PunctKind::Semicolon)?;
        let span = parser.span_from(&start);
        fields.push(FieldDecl {
            meta: parser.meta(span),
            access,
            is_static: modifiers.is_static.is_some(),
            ty,
            name,
            init,
        });
    }
}

/// Overloadable operator symbols as written after the `operator` keyword.
const OPERATOR_PUNCTS: &[(PunctKind, BinaryOp)] = &[
    (PunctKind::Plus, BinaryOp::Add),
    (PunctKind::Minus, BinaryOp::Sub),
    (PunctKind::Star, BinaryOp::Mul),
    (PunctKind::Slash, BinaryOp::Div),
    (PunctKind::Percent, BinaryOp::Mod),
    (PunctKind::StarStar, BinaryOp::Pow),
    (PunctKind::Ampersand, BinaryOp::BitAnd),
    (PunctKind::Pipe, BinaryOp::BitOr),
    (PunctKind::Caret, BinaryOp::BitXor),
    (PunctKind::Shl, BinaryOp::Shl),
    (PunctKind::Shr, BinaryOp::Shr),
    (PunctKind::EqEq, BinaryOp::Eq),
    (PunctKind::BangEq, BinaryOp::Ne),
    (PunctKind::Lt, BinaryOp::Lt),
    (PunctKind::Le, BinaryOp::Le),
    (PunctKind::Gt, BinaryOp::Gt),
    (PunctKind::Ge, BinaryOp::Ge),
];

/// What was written after `operator`, before the parameter count decides the arity.
enum OperatorSymbol {
    Binary(BinaryOp),
    /// `-` and `+` are binary with two parameters and unary with one.
    Signed(BinaryOp, UnaryOp),
    Unary(UnaryOp),
    Index,
}

fn parse_operator_symbol(parser: &mut Parser) -> ParseResult<OperatorSymbol> {
    let token = parser.current();
    let symbol = match &token.kind {
        TokenKind::Punct(PunctKind::Minus) => OperatorSymbol::Signed(BinaryOp::Sub, UnaryOp::Neg),
        TokenKind::Punct(PunctKind::Plus) => OperatorSymbol::Signed(BinaryOp::Add, UnaryOp::Pos),
        TokenKind::Punct(PunctKind::Tilde) => OperatorSymbol::Unary(UnaryOp::BitNot),
        TokenKind::Keyword(Keyword::Not) => OperatorSymbol::Unary(UnaryOp::Not),
        TokenKind::Keyword(Keyword::And) => OperatorSymbol::Binary(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => OperatorSymbol::Binary(BinaryOp::Or),
        TokenKind::Keyword(Keyword::Xor) => OperatorSymbol::Binary(BinaryOp::Xor),
        TokenKind::Punct(PunctKind::OpenBracket) => {
            parser.bump();
            parser.expect_punct(PunctKind::CloseBracket)?;
            return Ok(OperatorSymbol::Index);
        }
        TokenKind::Punct(punct) => match OPERATOR_PUNCTS.iter().find(|(p, _)| p == punct) {
            Some((_, op)) => OperatorSymbol::Binary(*op),
            None => return Err(parser.emit_error(ParseErrorKind::ExpectedOperator)),
        },
        _ => return Err(parser.emit_error(ParseErrorKind::ExpectedOperator)),
    };
    parser.bump();
    Ok(symbol)
}

/// `Type operator OP (params) { ... }`, starting at the `operator` keyword.
fn parse_operator(
    parser: &mut Parser,
    start: Span,
    return_type: TypeRef,
    class_name: &Ident,
) -> ParseResult<FunctionDecl> {
    parser.expect_keyword(Keyword::Operator)?;
    let symbol_span = parser.current_span();
    let symbol = parse_operator_symbol(parser)?;
    parser.expect_punct(PunctKind::OpenParen)?;
    let params = parse_params(parser)?;

    let operator = match (symbol, params.len()) {
        (OperatorSymbol::Signed(op, _), 2) | (OperatorSymbol::Binary(op), 2) => {
            OperatorName::Binary(op)
        }
        (OperatorSymbol::Signed(_, op), 1) | (OperatorSymbol::Unary(op), 1) => {
            OperatorName::Unary(op)
        }
        (OperatorSymbol::Index, 2) => OperatorName::Index,
        (symbol, _) => {
            let (operator, expected) = match symbol {
                OperatorSymbol::Binary(op) => (op.symbol(), "2"),
                OperatorSymbol::Signed(op, _) => (op.symbol(), "1 or 2"),
                OperatorSymbol::Unary(op) => (op.symbol(), "1"),
                OperatorSymbol::Index => ("[]", "2"),
            };
            return Err(parser.emit_error_with_span(
                ParseErrorKind::OperatorArity {
                    operator: operator.to_string(),
                    expected,
                },
                symbol_span,
            ));
        }
    };

    let body = parse_body(parser)?;
    let span = parser.span_from(&start);
    Ok(FunctionDecl {
        meta: parser.meta(span),
        return_type,
        name: Ident::new_with_override(&operator.mangled(), symbol_span),
        params,
        body,
        owner: Some(class_name.clone()),
        operator: Some(operator),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{parse_program, parse_program_err};
    use assert_matches::assert_matches;
    use kestrel_ast::{StatementKind, TypeKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn class_with_members() {
        let program = parse_program(
            "class Node[T] extends Base[T] {
                private T value;
                protected static integer count := 0;
                public virtual T get() { return value; }
                overload public void reset() { }
            }",
        );
        let class = program.class("Node").expect("class");
        assert_eq!(class.generics.len(), 1);
        assert_matches!(
            class.superclass.as_ref().map(|ty| &ty.kind),
            Some(TypeKind::GenericClass(name, args)) if name.as_str() == "Base" && args.len() == 1
        );
        assert_eq!(class.fields.len(), 2);
        assert_eq!(class.fields[0].access, Access::Private);
        assert!(class.fields[1].is_static);
        assert_eq!(class.methods.len(), 2);
        assert!(class.methods[0].is_virtual);
        assert!(class.methods[1].is_overload);
        assert_eq!(class.methods[1].access, Access::Public);
    }

    #[test]
    fn operators_are_hoisted_with_mangled_names() {
        let program = parse_program(
            "class V {
                V operator +(V a, V b) { return a; }
                V operator -(V a) { return a; }
                integer operator [](V v, integer i) { return i; }
                boolean operator not(V v) { return false; }
            }",
        );
        let names = program
            .functions
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["operator_add", "operator_neg", "operator_index", "operator_not"]
        );
        assert!(program
            .functions
            .iter()
            .all(|f| f.owner.as_ref().map(Ident::as_str) == Some("V")));
        assert_eq!(program.functions[1].operator, Some(OperatorName::Unary(UnaryOp::Neg)));
    }

    #[test]
    fn operator_arity_is_checked() {
        assert_eq!(
            parse_program_err("class V { V operator *(V a) { return a; } }"),
            ParseErrorKind::OperatorArity {
                operator: "*".into(),
                expected: "2"
            }
        );
        assert_eq!(
            parse_program_err("class V { V operator ~(V a, V b) { return a; } }"),
            ParseErrorKind::OperatorArity {
                operator: "~".into(),
                expected: "1"
            }
        );
        assert_eq!(
            parse_program_err("class V { static V operator +(V a, V b) { return a; } }"),
            ParseErrorKind::MisplacedModifier {
                modifier: "static",
                member: "operator functions"
            }
        );
        assert_eq!(
            parse_program_err("class V { virtual integer x; }"),
            ParseErrorKind::MisplacedModifier {
                modifier: "virtual",
                member: "fields"
            }
        );
    }

    #[test]
    fn nested_classes_are_hoisted() {
        let program = parse_program("class Outer { class Inner { } integer x; }");
        let names = program
            .classes
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Inner", "Outer"]);
        assert_eq!(program.class("Outer").map(|c| c.fields.len()), Some(1));
    }

    #[test]
    fn functions_are_hoisted_out_of_statements() {
        let program = parse_program(
            "integer twice(integer x) { return x * 2; }
             integer y := twice(3);",
        );
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.statements.len(), 1);
        assert_matches!(program.statements[0].kind, StatementKind::VarDecl(_));
        assert_eq!(program.functions[0].owner, None);
    }

    #[test]
    fn member_errors() {
        assert_eq!(
            parse_program_err("class A { if (x) { } }"),
            ParseErrorKind::StatementInClassBody { keyword: "if" }
        );
        assert_eq!(
            parse_program_err("class A { while (x) { } }"),
            ParseErrorKind::StatementInClassBody { keyword: "while" }
        );
        assert_eq!(
            parse_program_err("class A { return; }"),
            ParseErrorKind::ExpectedClassMember
        );
        assert_eq!(
            parse_program_err("class A { private public integer x; }"),
            ParseErrorKind::DuplicateModifier { modifier: "public" }
        );
        assert_eq!(
            parse_program_err("class A { void x; }"),
            ParseErrorKind::MisplacedVoid
        );
    }

    #[test]
    fn program_print_then_parse_is_identity() {
        let src = "class Pair[K, V] extends Base {
                private K key;
                public static integer count := 0;
                protected virtual V value(reference const K k) { return lookup(k); }
                Pair[K, V] operator ==(Pair[K, V] a, Pair[K, V] b) { return a; }
            }
            integer f(integer x) {
                if (x < 0) { return -x; } else if (x == 0) { return 1; } else { }
                while (x > 1 and x < 100) { x := x * 2; if (x == 8) { break; } }
                try { g(x); } catch { { } }
                return x;
            }
            nullable string s := null;
            keymap[string, array[integer]] m := {\"a\": [1, 2]};
            reference integer r = x;
            f(3);";
        let program = parse_program(src);
        let printed = program.to_string();
        let reparsed = parse_program(&printed);
        assert_eq!(program, reparsed, "printed as:\n{printed}");
    }
}

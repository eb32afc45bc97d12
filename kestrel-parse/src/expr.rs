use crate::{parser::Context, ty::parse_type, Parse, ParseResult, Parser};

use kestrel_ast::{
    AssignKind, BinaryOp, Expr, ExprKind, KeymapPair, Keyword, Literal, MemberAccess, PunctKind,
    TokenKind, UnaryOp,
};
use kestrel_error::parser_error::ParseErrorKind;
use kestrel_types::{Span, Spanned};

impl Parse for Expr {
    fn parse(parser: &mut Parser) -> ParseResult<Expr> {
        parse_assignment(parser)
    }
}

/// Parses an expression nested inside another construct, where assignment is not allowed.
pub(crate) fn parse_nested(parser: &mut Parser) -> ParseResult<Expr> {
    let context = parser.context() | Context::EXPRESSION;
    parser.with_context(context, parse_assignment)
}

fn binary(parser: &mut Parser, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = Span::join(lhs.span(), &rhs.span());
    Expr {
        meta: parser.meta(span),
        kind: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    }
}

fn unary(parser: &mut Parser, op: UnaryOp, operand: Expr, start: &Span) -> Expr {
    let span = parser.span_from(start);
    Expr {
        meta: parser.meta(span),
        kind: ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
    }
}

const ASSIGNMENT_PUNCTS: &[PunctKind] = &[
    PunctKind::ColonEq,
    PunctKind::Eq,
    PunctKind::PlusEq,
    PunctKind::MinusEq,
    PunctKind::StarEq,
    PunctKind::StarStarEq,
    PunctKind::SlashEq,
    PunctKind::PercentEq,
    PunctKind::AmpersandEq,
    PunctKind::PipeEq,
    PunctKind::CaretEq,
    PunctKind::ShlEq,
    PunctKind::ShrEq,
];

fn parse_assignment(parser: &mut Parser) -> ParseResult<Expr> {
    let target = parse_logical_or(parser)?;
    let Some((punct, punct_span)) = parser.take_punct_of(ASSIGNMENT_PUNCTS) else {
        return Ok(target);
    };
    if parser.context().contains(Context::EXPRESSION) {
        return Err(parser.emit_error_with_span(ParseErrorKind::NestedAssignment, punct_span));
    }
    if !matches!(
        target.kind,
        ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
    ) {
        return Err(parser.emit_error_with_span(ParseErrorKind::UnassignableExpression, target.span()));
    }
    let value = parse_assignment(parser)?;
    let (kind, value) = match punct {
        PunctKind::ColonEq => (AssignKind::Value, value),
        PunctKind::Eq => (AssignKind::Reference, value),
        compound => {
            let op = compound
                .compound_op()
                .ok_or_else(|| parser.emit_error_with_span(ParseErrorKind::ExpectedExpression, punct_span))?;
            let lhs = parser.fresh_copy(&target);
            (AssignKind::Value, binary(parser, op, lhs, value))
        }
    };
    let span = Span::join(target.span(), &value.span());
    Ok(Expr {
        meta: parser.meta(span),
        kind: ExprKind::Assign {
            kind,
            target: Box::new(target),
            value: Box::new(value),
        },
    })
}

/// One left-associative binary level: `next (op next)*`.
fn parse_left_assoc(
    parser: &mut Parser,
    ops: &[(TokenKind, BinaryOp)],
    next: fn(&mut Parser) -> ParseResult<Expr>,
) -> ParseResult<Expr> {
    let mut expr = next(parser)?;
    loop {
        let Some(op) = take_op(parser, ops) else {
            return Ok(expr);
        };
        let rhs = next(parser)?;
        expr = binary(parser, op, expr, rhs);
    }
}

fn take_op(parser: &mut Parser, ops: &[(TokenKind, BinaryOp)]) -> Option<BinaryOp> {
    let op = ops
        .iter()
        .find(|(token, _)| &parser.current().kind == token)
        .map(|(_, op)| *op)?;
    parser.bump();
    Some(op)
}

fn parse_logical_or(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[(TokenKind::Keyword(Keyword::Or), BinaryOp::Or)],
        parse_logical_xor,
    )
}

fn parse_logical_xor(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[(TokenKind::Keyword(Keyword::Xor), BinaryOp::Xor)],
        parse_logical_and,
    )
}

fn parse_logical_and(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[(TokenKind::Keyword(Keyword::And), BinaryOp::And)],
        parse_bit_or,
    )
}

fn parse_bit_or(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[(TokenKind::Punct(PunctKind::Pipe), BinaryOp::BitOr)],
        parse_bit_xor,
    )
}

fn parse_bit_xor(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[(TokenKind::Punct(PunctKind::Caret), BinaryOp::BitXor)],
        parse_bit_and,
    )
}

fn parse_bit_and(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[(TokenKind::Punct(PunctKind::Ampersand), BinaryOp::BitAnd)],
        parse_equality,
    )
}

fn parse_equality(parser: &mut Parser) -> ParseResult<Expr> {
    parse_comparison_chain(
        parser,
        &[
            (TokenKind::Punct(PunctKind::EqEq), BinaryOp::Eq),
            (TokenKind::Punct(PunctKind::BangEq), BinaryOp::Ne),
        ],
        parse_relational,
    )
}

fn parse_relational(parser: &mut Parser) -> ParseResult<Expr> {
    parse_comparison_chain(
        parser,
        &[
            (TokenKind::Punct(PunctKind::Lt), BinaryOp::Lt),
            (TokenKind::Punct(PunctKind::Le), BinaryOp::Le),
            (TokenKind::Punct(PunctKind::Gt), BinaryOp::Gt),
            (TokenKind::Punct(PunctKind::Ge), BinaryOp::Ge),
        ],
        parse_shift,
    )
}

/// Parses `a op b op c ...` and rewrites it as `(a op b) and ((b op c) and ...)`.
///
/// Every inner operand appears in two comparisons; its second occurrence is a
/// fresh copy so that each node keeps a unique id.
fn parse_comparison_chain(
    parser: &mut Parser,
    ops: &[(TokenKind, BinaryOp)],
    next: fn(&mut Parser) -> ParseResult<Expr>,
) -> ParseResult<Expr> {
    let first = next(parser)?;
    let mut operands = vec![first];
    let mut operators = Vec::new();
    while let Some(op) = take_op(parser, ops) {
        operators.push(op);
        operands.push(next(parser)?);
    }
    if operators.is_empty() {
        return Ok(operands.remove(0));
    }

    let mut comparisons = Vec::with_capacity(operators.len());
    let mut operands = operands.into_iter();
    let mut lhs = operands.next();
    for (op, rhs) in operators.into_iter().zip(operands) {
        let Some(left) = lhs.take() else { break };
        let shared = parser.fresh_copy(&rhs);
        comparisons.push(binary(parser, op, left, rhs));
        lhs = Some(shared);
    }

    let mut comparisons = comparisons.into_iter().rev();
    let Some(mut expr) = comparisons.next() else {
        return Err(parser.emit_error(ParseErrorKind::ExpectedExpression));
    };
    for comparison in comparisons {
        expr = binary(parser, BinaryOp::And, comparison, expr);
    }
    Ok(expr)
}

fn parse_shift(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[
            (TokenKind::Punct(PunctKind::Shl), BinaryOp::Shl),
            (TokenKind::Punct(PunctKind::Shr), BinaryOp::Shr),
        ],
        parse_additive,
    )
}

fn parse_additive(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[
            (TokenKind::Punct(PunctKind::Plus), BinaryOp::Add),
            (TokenKind::Punct(PunctKind::Minus), BinaryOp::Sub),
        ],
        parse_multiplicative,
    )
}

fn parse_multiplicative(parser: &mut Parser) -> ParseResult<Expr> {
    parse_left_assoc(
        parser,
        &[
            (TokenKind::Punct(PunctKind::Star), BinaryOp::Mul),
            (TokenKind::Punct(PunctKind::Slash), BinaryOp::Div),
            (TokenKind::Punct(PunctKind::Percent), BinaryOp::Mod),
        ],
        parse_sign,
    )
}

fn parse_sign(parser: &mut Parser) -> ParseResult<Expr> {
    let start = parser.current_span();
    let op = match parser.current().kind {
        TokenKind::Punct(PunctKind::Minus) => UnaryOp::Neg,
        TokenKind::Punct(PunctKind::Plus) => UnaryOp::Pos,
        TokenKind::Punct(PunctKind::Tilde) => UnaryOp::BitNot,
        TokenKind::Punct(PunctKind::Ampersand) => UnaryOp::Ref,
        _ => return parse_power(parser),
    };
    parser.bump();
    let operand = parse_sign(parser)?;
    Ok(unary(parser, op, operand, &start))
}

/// `a ** b ** c` groups as `a ** (b ** c)`.
fn parse_power(parser: &mut Parser) -> ParseResult<Expr> {
    let mut operands = vec![parse_not(parser)?];
    while parser.take_punct(PunctKind::StarStar).is_some() {
        operands.push(parse_not(parser)?);
    }
    let mut operands = operands.into_iter().rev();
    let Some(mut expr) = operands.next() else {
        return Err(parser.emit_error(ParseErrorKind::ExpectedExpression));
    };
    for base in operands {
        expr = binary(parser, BinaryOp::Pow, base, expr);
    }
    Ok(expr)
}

fn parse_not(parser: &mut Parser) -> ParseResult<Expr> {
    let start = parser.current_span();
    if parser.take_keyword(Keyword::Not).is_none() {
        return parse_allocation(parser);
    }
    let operand = parse_not(parser)?;
    Ok(unary(parser, UnaryOp::Not, operand, &start))
}

fn parse_allocation(parser: &mut Parser) -> ParseResult<Expr> {
    let start = parser.current_span();
    if parser.take_keyword(Keyword::New).is_some() {
        let ty = parse_type(parser, false)?;
        let span = parser.span_from(&start);
        return Ok(Expr {
            meta: parser.meta(span),
            kind: ExprKind::New { ty },
        });
    }
    if parser.take_keyword(Keyword::Delete).is_some() {
        if parser.peek_keyword(Keyword::New) || parser.peek_keyword(Keyword::Delete) {
            return Err(parser.emit_error(ParseErrorKind::StackedAllocation));
        }
        let operand = parse_postfix(parser)?;
        return Ok(unary(parser, UnaryOp::Delete, operand, &start));
    }
    parse_postfix(parser)
}

fn parse_postfix(parser: &mut Parser) -> ParseResult<Expr> {
    let start = parser.current_span();
    let mut expr = parse_primary(parser)?;
    loop {
        let kind = if parser.take_punct(PunctKind::Dot).is_some() {
            ExprKind::Member {
                target: Box::new(expr),
                access: MemberAccess::Dot,
                name: parser.expect_ident()?,
            }
        } else if parser.take_punct(PunctKind::Arrow).is_some() {
            ExprKind::Member {
                target: Box::new(expr),
                access: MemberAccess::Arrow,
                name: parser.expect_ident()?,
            }
        } else if parser.take_punct(PunctKind::OpenBracket).is_some() {
            let index = parse_nested(parser)?;
            parser.expect_punct(PunctKind::CloseBracket)?;
            ExprKind::Index {
                target: Box::new(expr),
                index: Box::new(index),
            }
        } else if parser.take_punct(PunctKind::OpenParen).is_some() {
            let args = parse_call_args(parser)?;
            ExprKind::Call {
                callee: Box::new(expr),
                args,
            }
        } else {
            return Ok(expr);
        };
        let span = parser.span_from(&start);
        expr = Expr {
            meta: parser.meta(span),
            kind,
        };
    }
}

/// Arguments after the opening parenthesis, up to and including the closing one.
fn parse_call_args(parser: &mut Parser) -> ParseResult<Vec<Expr>> {
    let mut args = Vec::new();
    if parser.take_punct(PunctKind::CloseParen).is_some() {
        return Ok(args);
    }
    loop {
        args.push(parse_nested(parser)?);
        if parser.take_punct(PunctKind::Comma).is_some() {
            continue;
        }
        if parser.take_punct(PunctKind::CloseParen).is_some() {
            return Ok(args);
        }
        return Err(parser.emit_error(ParseErrorKind::ExpectedCommaOrCloseParen));
    }
}

fn parse_primary(parser: &mut Parser) -> ParseResult<Expr> {
    let start = parser.current_span();
    let kind = match &parser.current().kind {
        TokenKind::Ident => ExprKind::Ident(parser.expect_ident()?),
        TokenKind::Literal(literal) => {
            let literal = literal.clone();
            parser.bump();
            ExprKind::Literal(literal)
        }
        TokenKind::Keyword(keyword) => {
            let kind = match keyword {
                Keyword::This => ExprKind::This,
                Keyword::True => ExprKind::Literal(Literal::Bool(true)),
                Keyword::False => ExprKind::Literal(Literal::Bool(false)),
                Keyword::Null => ExprKind::Literal(Literal::Null),
                Keyword::Undefined => ExprKind::Literal(Literal::Undefined),
                _ => return Err(parser.emit_error(ParseErrorKind::ExpectedExpression)),
            };
            parser.bump();
            kind
        }
        TokenKind::Punct(PunctKind::OpenParen) => {
            parser.bump();
            let inner = parse_nested(parser)?;
            parser.expect_punct(PunctKind::CloseParen)?;
            return Ok(inner);
        }
        TokenKind::Punct(PunctKind::OpenBracket) => {
            parser.bump();
            ExprKind::List(parse_list_elements(parser)?)
        }
        TokenKind::Punct(PunctKind::OpenBrace) => {
            parser.bump();
            ExprKind::Keymap(parse_keymap_pairs(parser)?)
        }
        TokenKind::Eof => return Err(parser.emit_error(ParseErrorKind::UnexpectedEof)),
        _ => return Err(parser.emit_error(ParseErrorKind::ExpectedExpression)),
    };
    let span = parser.span_from(&start);
    Ok(Expr {
        meta: parser.meta(span),
        kind,
    })
}

fn parse_list_elements(parser: &mut Parser) -> ParseResult<Vec<Expr>> {
    let mut elems = Vec::new();
    if parser.take_punct(PunctKind::CloseBracket).is_some() {
        return Ok(elems);
    }
    loop {
        elems.push(parse_nested(parser)?);
        if parser.take_punct(PunctKind::Comma).is_some() {
            continue;
        }
        if parser.take_punct(PunctKind::CloseBracket).is_some() {
            return Ok(elems);
        }
        return Err(parser.emit_error(ParseErrorKind::ExpectedCommaOrCloseBracket));
    }
}

fn parse_keymap_pairs(parser: &mut Parser) -> ParseResult<Vec<KeymapPair>> {
    let mut pairs = Vec::new();
    if parser.take_punct(PunctKind::CloseBrace).is_some() {
        return Ok(pairs);
    }
    loop {
        let start = parser.current_span();
        let key = parse_nested(parser)?;
        parser.expect_punct(PunctKind::Colon)?;
        let value = parse_nested(parser)?;
        let span = parser.span_from(&start);
        pairs.push(KeymapPair {
            meta: parser.meta(span),
            key,
            value,
        });
        if parser.take_punct(PunctKind::Comma).is_some() {
            continue;
        }
        if parser.take_punct(PunctKind::CloseBrace).is_some() {
            return Ok(pairs);
        }
        return Err(parser.emit_error(ParseErrorKind::ExpectedCommaOrCloseBrace));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{parse, parse_err};
    use assert_matches::assert_matches;
    use num_bigint::BigUint;
    use num_traits::ToPrimitive;
    use pretty_assertions::assert_eq;

    fn op_of(expr: &Expr) -> Option<BinaryOp> {
        match &expr.kind {
            ExprKind::Binary { op, .. } => Some(*op),
            _ => None,
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse::<Expr>("1 + 2 * 3");
        assert_eq!(expr.to_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse::<Expr>("a ** b ** c");
        assert_eq!(expr.to_string(), "(a ** (b ** c))");
    }

    #[test]
    fn sign_binds_looser_than_power() {
        assert_eq!(parse::<Expr>("-a ** 2").to_string(), "(-(a ** 2))");
        assert_eq!(parse::<Expr>("- -a").to_string(), "(-(-a))");
    }

    #[test]
    fn logical_levels() {
        let expr = parse::<Expr>("a or b xor c and not d");
        assert_eq!(expr.to_string(), "(a or (b xor (c and (not d))))");
    }

    #[test]
    fn bitwise_levels() {
        let expr = parse::<Expr>("a | b ^ c & d == e << 1");
        assert_eq!(expr.to_string(), "(a | (b ^ (c & (d == (e << 1)))))");
    }

    #[test]
    fn chained_equality_is_right_leaning_conjunction() {
        let expr = parse::<Expr>("a == b == c == d");
        assert_eq!(
            expr.to_string(),
            "((a == b) and ((b == c) and (c == d)))"
        );
    }

    #[test]
    fn chained_comparison_copies_get_fresh_ids() {
        let expr = parse::<Expr>("x < f(y) <= z");
        let ExprKind::Binary { op: BinaryOp::And, lhs, rhs } = &expr.kind else {
            panic!("expected a conjunction, got {expr}");
        };
        let (ExprKind::Binary { rhs: first_use, .. }, ExprKind::Binary { lhs: second_use, .. }) =
            (&lhs.kind, &rhs.kind)
        else {
            panic!("expected two comparisons");
        };
        assert_eq!(first_use, second_use);
        assert_ne!(first_use.id(), second_use.id());
    }

    #[test]
    fn postfix_chain() {
        let expr = parse::<Expr>("a.b->c[1](2, 3)");
        assert_matches!(expr.kind, ExprKind::Call { ref args, .. } if args.len() == 2);
        assert_eq!(expr.to_string(), "a.b->c[1](2, 3)");
    }

    #[test]
    fn allocation() {
        assert_matches!(parse::<Expr>("new Box[integer]").kind, ExprKind::New { .. });
        assert_matches!(
            parse::<Expr>("delete a.b").kind,
            ExprKind::Unary { op: UnaryOp::Delete, .. }
        );
        assert_eq!(parse_err::<Expr>("delete new A"), ParseErrorKind::StackedAllocation);
    }

    #[test]
    fn collection_literals() {
        assert_matches!(parse::<Expr>("[1, 2, 3]").kind, ExprKind::List(ref elems) if elems.len() == 3);
        assert_matches!(
            parse::<Expr>("{\"a\": 1, \"b\": 2}").kind,
            ExprKind::Keymap(ref pairs) if pairs.len() == 2
        );
        assert_matches!(parse::<Expr>("[]").kind, ExprKind::List(ref elems) if elems.is_empty());
    }

    #[test]
    fn assignment_chain_is_right_associative() {
        let expr = parse::<Expr>("a := b = c");
        assert_matches!(
            &expr.kind,
            ExprKind::Assign { kind: AssignKind::Value, value, .. }
                if matches!(value.kind, ExprKind::Assign { kind: AssignKind::Reference, .. })
        );
    }

    #[test]
    fn compound_assignment_is_decomposed() {
        let expr = parse::<Expr>("x.y **= 2");
        assert_eq!(expr.to_string(), "x.y := (x.y ** 2)");
        let ExprKind::Assign { target, value, .. } = &expr.kind else {
            panic!("expected an assignment");
        };
        let ExprKind::Binary { lhs, .. } = &value.kind else {
            panic!("expected a binary value");
        };
        assert_ne!(target.id(), lhs.id());
    }

    #[test]
    fn assignment_errors() {
        assert_eq!(parse_err::<Expr>("1 := 2"), ParseErrorKind::UnassignableExpression);
        assert_eq!(parse_err::<Expr>("f(a := 2)"), ParseErrorKind::NestedAssignment);
        assert_eq!(parse_err::<Expr>("(a = b)"), ParseErrorKind::NestedAssignment);
    }

    #[test]
    fn literals() {
        assert_matches!(
            parse::<Expr>("42").kind,
            ExprKind::Literal(Literal::Int(ref v)) if *v == BigUint::from(42u32)
        );
        assert_matches!(parse::<Expr>("null").kind, ExprKind::Literal(Literal::Null));
        assert_matches!(parse::<Expr>("undefined").kind, ExprKind::Literal(Literal::Undefined));
        assert_matches!(parse::<Expr>("true").kind, ExprKind::Literal(Literal::Bool(true)));
    }

    #[test]
    fn print_then_parse_is_identity() {
        let sources = [
            "a := b + c * -d",
            "x < y <= z",
            "not a and b or c xor d",
            "f(1, \"two\\n\", 'c', b\"xy\", 2.5, 3i)",
            "m[k] := {1: [2, 3], 4: []}",
            "p = &q.r",
            "this->next.value ** 2 ** n % 7",
            "delete nodes[i]",
            "(new Box[integer]).value",
        ];
        for src in sources {
            let expr = parse::<Expr>(src);
            let printed = expr.to_string();
            let reparsed = parse::<Expr>(&printed);
            assert_eq!(expr, reparsed, "{src} printed as {printed}");
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Value {
        Int(i64),
        Bool(bool),
    }

    /// Evaluates the integer and boolean subset of expressions, with `i` bound to `i_value`.
    fn eval(expr: &Expr, i_value: i64) -> Value {
        match &expr.kind {
            ExprKind::Ident(name) if name.as_str() == "i" => Value::Int(i_value),
            ExprKind::Literal(Literal::Int(v)) => Value::Int(v.to_i64().unwrap()),
            ExprKind::Literal(Literal::Bool(b)) => Value::Bool(*b),
            ExprKind::Binary { op, lhs, rhs } => match (op, eval(lhs, i_value), eval(rhs, i_value)) {
                (BinaryOp::And, Value::Bool(a), Value::Bool(b)) => Value::Bool(a && b),
                (BinaryOp::Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(a || b),
                (BinaryOp::Lt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
                (BinaryOp::Le, Value::Int(a), Value::Int(b)) => Value::Bool(a <= b),
                (BinaryOp::Gt, Value::Int(a), Value::Int(b)) => Value::Bool(a > b),
                (BinaryOp::Ge, Value::Int(a), Value::Int(b)) => Value::Bool(a >= b),
                (BinaryOp::Eq, a, b) => Value::Bool(a == b),
                (BinaryOp::Ne, a, b) => Value::Bool(a != b),
                (BinaryOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a + b),
                other => panic!("cannot evaluate {other:?}"),
            },
            _ => panic!("cannot evaluate {expr}"),
        }
    }

    #[test]
    fn chained_comparison_truth_table() {
        let explicit = parse::<Expr>("4 < i and i <= 5");
        let chained = parse::<Expr>("4 < i <= 5");
        assert_eq!(op_of(&chained), Some(BinaryOp::And));
        for i in 0..=10 {
            assert_eq!(eval(&explicit, i), eval(&chained, i), "i = {i}");
        }
        assert_eq!(eval(&chained, 5), Value::Bool(true));
        assert_eq!(eval(&chained, 4), Value::Bool(false));
    }

    #[test]
    fn longer_chain_truth_table() {
        let explicit = parse::<Expr>("1 <= i and i < 9 and 9 > 2");
        let chained = parse::<Expr>("1 <= i < 9 > 2");
        for i in 0..=10 {
            assert_eq!(eval(&explicit, i), eval(&chained, i), "i = {i}");
        }
    }
}

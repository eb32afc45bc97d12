mod call;
mod member;
mod operator;

use crate::{
    semantic_analysis::{namespace::DeclId, resolve_type, TypeCheckContext},
    type_system::{accepts_argument, assignable, promotion, Ty, TyKind},
};

use kestrel_ast::{AssignKind, Expr, ExprKind, KeymapPair, Literal, PrimitiveKind};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
    type_error::TypeError,
};
use kestrel_types::{Ident, Span, Spanned};
use num_traits::ToPrimitive;

/// Infers the type of `expr` and checks every node below it.
///
/// The outcome is recorded on the node; an expression whose operand failed
/// fails too, without a second diagnostic.
pub(crate) fn type_check_expr(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
) -> Result<Ty, ErrorEmitted> {
    if let Some(cached) = ctx.decorations.cached(expr.id()) {
        return cached;
    }
    let result = type_check_expr_kind(handler, ctx.by_ref(), expr);
    ctx.decorations.record(expr.id(), result)
}

fn type_check_expr_kind(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
) -> Result<Ty, ErrorEmitted> {
    match &expr.kind {
        ExprKind::Ident(name) => type_check_ident(handler, ctx, expr, name),
        ExprKind::This => match ctx.self_class() {
            Some(class) if ctx.is_instance() => Ok(ctx.self_type(class)),
            _ => Err(handler.emit_err(CompileError::ThisOutsideInstanceMethod { span: expr.span() })),
        },
        ExprKind::Literal(literal) => Ok(literal_type(literal)),
        ExprKind::List(elems) => type_check_list(handler, ctx, elems),
        ExprKind::Keymap(pairs) => type_check_keymap(handler, ctx, pairs),
        ExprKind::Binary { op, lhs, rhs } => {
            operator::type_check_binary(handler, ctx, expr, *op, lhs, rhs)
        }
        ExprKind::Unary { op, operand } => {
            operator::type_check_unary(handler, ctx, expr, *op, operand)
        }
        ExprKind::New { ty } => {
            let ty = resolve_type(handler, ctx.by_ref(), ty)?;
            match ty.kind {
                TyKind::Class(_) | TyKind::GenericClass(..) => Ok(ty),
                _ => Err(handler.emit_err(CompileError::NewOfNonClass {
                    ty: ty.to_string(),
                    span: expr.span(),
                })),
            }
        }
        ExprKind::Member {
            target,
            access,
            name,
        } => member::type_check_member(handler, ctx, expr, target, *access, name),
        ExprKind::Index { target, index } => {
            operator::type_check_index(handler, ctx, expr, target, index)
        }
        ExprKind::Call { callee, args } => call::type_check_call(handler, ctx, expr, callee, args),
        ExprKind::Assign {
            kind,
            target,
            value,
        } => type_check_assign(handler, ctx, *kind, target, value),
    }
}

/// Type of a literal. Integers take the narrowest of `integer`, `long` and
/// `extended` that holds their value.
pub(crate) fn literal_type(literal: &Literal) -> Ty {
    match literal {
        Literal::Int(value) => {
            let kind = if value.to_i32().is_some() {
                PrimitiveKind::Integer
            } else if value.to_i64().is_some() {
                PrimitiveKind::Long
            } else {
                PrimitiveKind::Extended
            };
            Ty::primitive(kind)
        }
        Literal::Float(_) => Ty::primitive(PrimitiveKind::Float),
        Literal::Imaginary(_) => Ty::primitive(PrimitiveKind::Complex),
        Literal::String(_) => Ty::primitive(PrimitiveKind::String),
        Literal::Char(_) => Ty::primitive(PrimitiveKind::Char),
        Literal::ByteString(_) => Ty::primitive(PrimitiveKind::ByteString),
        Literal::Bool(_) => Ty::boolean(),
        Literal::Null => Ty::new(TyKind::Null),
        Literal::Undefined => Ty::new(TyKind::Undefined),
    }
}

/// Resolves a bare name: a variable, then a field of the current class chain.
fn type_check_ident(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
    name: &Ident,
) -> Result<Ty, ErrorEmitted> {
    if let Some(binding) = ctx.env().get(name) {
        return binding.clone();
    }
    if let Some(class) = ctx.self_class() {
        if let Some((owner, index, ty)) = member::lookup_field(&ctx, class, name) {
            let field = &ctx.class_decl(owner).fields[index];
            if !ctx.is_accessible(owner, field.access) {
                return Err(handler.emit_err(CompileError::InaccessibleMember {
                    class_name: ctx.class_decl(owner).name.clone(),
                    name: name.clone(),
                    access: field.access.as_str(),
                    span: expr.span(),
                }));
            }
            if !field.is_static && !ctx.is_instance() {
                return Err(handler.emit_err(CompileError::InstanceMemberInStaticContext {
                    name: name.clone(),
                    span: expr.span(),
                }));
            }
            let decl = DeclId::Field(owner, index);
            ctx.decorations.mark_used(decl);
            ctx.decorations.set_resolution(expr.id(), decl);
            return ty;
        }
    }
    if ctx.registry().is_class_name(name) {
        return Err(handler.emit_err(CompileError::ClassNameAsValue {
            name: name.clone(),
            span: expr.span(),
        }));
    }
    Err(handler.emit_err(CompileError::UnknownVariable {
        name: name.clone(),
        span: expr.span(),
    }))
}

/// Checks every expression of a list before reporting any failure.
pub(crate) fn type_check_all(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    exprs: &[Expr],
) -> Result<Vec<Ty>, ErrorEmitted> {
    exprs
        .iter()
        .map(|expr| type_check_expr(handler, ctx.by_ref(), expr))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Folds the element types of a collection literal into one type.
///
/// The first element decides; primitive elements widen it along the promotion
/// lattice, and any other element must be assignable to it.
fn unify_elements(
    handler: &Handler,
    elems: impl IntoIterator<Item = (Ty, Span)>,
) -> Result<Ty, ErrorEmitted> {
    let mut elems = elems.into_iter();
    let Some((first, _)) = elems.next() else {
        return Ok(Ty::new(TyKind::Undefined));
    };
    let mut unified = first.decay();
    for (ty, span) in elems {
        let ty = ty.decay();
        let widened = match (unified.as_primitive(), ty.as_primitive()) {
            (Some(a), Some(b)) if ty.modifiers == unified.modifiers => promotion::common(a, b),
            _ => None,
        };
        if let Some(kind) = widened {
            unified = Ty::primitive(kind).with_modifiers(unified.modifiers);
        } else if !assignable(&ty, &unified) {
            return Err(handler.emit_err(CompileError::TypeError(TypeError::MismatchedType {
                expected: unified.to_string(),
                received: ty.to_string(),
                help_text: "All elements of a collection literal must share one type.".into(),
                span,
            })));
        }
    }
    Ok(unified)
}

fn type_check_list(
    handler: &Handler,
    ctx: TypeCheckContext,
    elems: &[Expr],
) -> Result<Ty, ErrorEmitted> {
    let tys = type_check_all(handler, ctx, elems)?;
    let elem = unify_elements(handler, tys.into_iter().zip(elems.iter().map(Spanned::span)))?;
    Ok(Ty::array(elem))
}

fn type_check_keymap(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    pairs: &[KeymapPair],
) -> Result<Ty, ErrorEmitted> {
    let mut keys = Vec::with_capacity(pairs.len());
    let mut values = Vec::with_capacity(pairs.len());
    let mut failed = None;
    for pair in pairs {
        let key = type_check_expr(handler, ctx.by_ref(), &pair.key);
        let value = type_check_expr(handler, ctx.by_ref(), &pair.value);
        let pair_result = match (key, value) {
            (Ok(key), Ok(value)) => {
                keys.push((key.clone(), pair.key.span()));
                values.push((value.clone(), pair.value.span()));
                Ok(Ty::keymap(key, value))
            }
            (Err(err), _) | (_, Err(err)) => Err(err),
        };
        if let Err(err) = ctx.decorations.record(pair.meta.id, pair_result) {
            failed = Some(err);
        }
    }
    if let Some(err) = failed {
        return Err(err);
    }
    let key = unify_elements(handler, keys)?;
    let value = unify_elements(handler, values)?;
    Ok(Ty::keymap(key, value))
}

/// The type a place or value presents when bound by reference, or `None`
/// when it can't be bound.
pub(crate) fn reference_source(expr: &Expr, ty: &Ty) -> Option<Ty> {
    if expr.is_place() {
        Some(ty.as_reference())
    } else if ty.is_reference() {
        Some(ty.clone())
    } else {
        None
    }
}

/// Checks storing `value` into a binding of type `target` with `kind`.
///
/// Shared by assignments, variable initialisers and field initialisers.
pub(crate) fn check_store(
    handler: &Handler,
    kind: AssignKind,
    target: &Ty,
    target_name: &str,
    value: &Expr,
    value_ty: &Ty,
) -> Result<(), ErrorEmitted> {
    let source = match kind {
        AssignKind::Value => {
            if target.is_reference() {
                return Err(handler.emit_err(CompileError::ValueAssignmentToReference {
                    target: target_name.to_string(),
                    span: value.span(),
                }));
            }
            value_ty.decay()
        }
        AssignKind::Reference => {
            if !target.is_reference() {
                return Err(handler.emit_err(CompileError::ReferenceAssignmentToValue {
                    target: target_name.to_string(),
                    span: value.span(),
                }));
            }
            reference_source(value, value_ty).ok_or_else(|| {
                handler.emit_err(CompileError::ReferenceNeedsPlace { span: value.span() })
            })?
        }
    };
    if assignable(&source, target) {
        return Ok(());
    }
    Err(handler.emit_err(CompileError::TypeError(TypeError::MismatchedType {
        expected: target.to_string(),
        received: source.to_string(),
        help_text: String::new(),
        span: value.span(),
    })))
}

fn type_check_assign(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    kind: AssignKind,
    target: &Expr,
    value: &Expr,
) -> Result<Ty, ErrorEmitted> {
    let target_ty = type_check_expr(handler, ctx.by_ref(), target);
    let value_ty = type_check_expr(handler, ctx.by_ref(), value);
    let (target_ty, value_ty) = (target_ty?, value_ty?);
    if target_ty.is_const() {
        return Err(handler.emit_err(CompileError::AssignmentToConst {
            target: target.to_string(),
            span: target.span(),
        }));
    }
    check_store(handler, kind, &target_ty, &target.to_string(), value, &value_ty)?;
    Ok(target_ty)
}

/// Whether an argument expression of type `arg` may be passed for `param`.
pub(crate) fn accepts(param: &Ty, arg: &Ty, arg_expr: &Expr) -> bool {
    accepts_argument(param, arg, arg_expr.is_place())
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{analyze, errors_of, type_of_last_statement};
    use assert_matches::assert_matches;
    use kestrel_error::{error::CompileError, type_error::TypeError};
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_types() {
        assert_eq!(type_of_last_statement("integer x; x := 1;"), "integer");
        assert_eq!(type_of_last_statement("3000000000;"), "long");
        assert_eq!(type_of_last_statement("10000000000000000000;"), "extended");
        assert_eq!(type_of_last_statement("1.5;"), "float");
        assert_eq!(type_of_last_statement("2i;"), "complex");
        assert_eq!(type_of_last_statement("b\"ab\";"), "bytes");
        assert_eq!(type_of_last_statement("'c';"), "char");
        assert_eq!(type_of_last_statement("null;"), "null");
    }

    #[test]
    fn collection_literals() {
        assert_eq!(type_of_last_statement("[1, 2, 3];"), "array[integer]");
        assert_eq!(type_of_last_statement("[1, 2.5];"), "array[float]");
        assert_eq!(type_of_last_statement("[];"), "array[undefined]");
        assert_eq!(
            type_of_last_statement("keymap[string, array[integer]] k := {\"a\": [1], \"b\": []};"),
            "keymap[string, array[integer]]"
        );
        assert_eq!(
            type_of_last_statement("keymap[string, integer] k := {};"),
            "keymap[undefined, undefined]"
        );
        assert_matches!(
            errors_of("array[integer] a := [1, \"two\"];").as_slice(),
            [CompileError::TypeError(TypeError::MismatchedType { .. })]
        );
    }

    #[test]
    fn names() {
        assert_matches!(
            errors_of("x := 1;").as_slice(),
            [CompileError::UnknownVariable { .. }]
        );
        assert_matches!(
            errors_of("class A { } integer x := A;").as_slice(),
            [CompileError::ClassNameAsValue { .. }]
        );
        assert_matches!(
            errors_of("this;").as_slice(),
            [CompileError::ThisOutsideInstanceMethod { .. }, CompileError::UnusedExpression { .. }]
        );
    }

    #[test]
    fn failed_declaration_type_is_quiet_afterwards() {
        let errors = errors_of("Missing m; m := 1; m := 2;");
        assert_matches!(errors.as_slice(), [CompileError::UnknownType { .. }]);
    }

    #[test]
    fn assignment_rules() {
        assert_matches!(
            errors_of("const integer x := 5; x := 6;").as_slice(),
            [CompileError::AssignmentToConst { target, .. }] if target == "x"
        );
        assert_matches!(
            errors_of("integer x := 5; reference integer y = x; y := 6;").as_slice(),
            [CompileError::ValueAssignmentToReference { .. }]
        );
        assert_matches!(
            errors_of("integer x := 5; x = 6;").as_slice(),
            [CompileError::ReferenceAssignmentToValue { .. }]
        );
        assert_matches!(
            errors_of("integer x; reference integer y = x; y = 6;").as_slice(),
            [CompileError::ReferenceNeedsPlace { .. }]
        );
        assert_matches!(
            errors_of("integer x; reference integer y = x; integer z; y = z;").as_slice(),
            []
        );
        assert_matches!(
            errors_of("integer x; x := 2.5;").as_slice(),
            [CompileError::TypeError(TypeError::MismatchedType { .. })]
        );
        assert_matches!(errors_of("double d; d := 2;").as_slice(), []);
    }

    #[test]
    fn nullable_and_undefined() {
        assert_matches!(
            errors_of("class A { } nullable A a := null; A b := undefined;").as_slice(),
            []
        );
        assert_matches!(
            errors_of("class A { } A a := null;").as_slice(),
            [CompileError::TypeError(TypeError::MismatchedType { .. })]
        );
    }

    #[test]
    fn new_allocates_classes_only() {
        let result = analyze("class A { } A a := new A;");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_matches!(
            errors_of("integer i := new integer;").as_slice(),
            [CompileError::NewOfNonClass { .. }]
        );
    }
}

use super::{accepts, reference_source, type_check_expr};
use crate::{
    semantic_analysis::{
        namespace::{ClassLookup, DeclId, ProgramDecls},
        TypeCheckContext,
    },
    type_system::{assignable, promotion, Ty, TyKind, TypeSubstMap},
};

use kestrel_ast::{BinaryCategory, BinaryOp, Expr, OperatorName, PrimitiveKind, UnaryOp};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
    type_error::TypeError,
};
use kestrel_types::{Ident, Spanned};

pub(super) fn type_check_binary(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<Ty, ErrorEmitted> {
    let lhs_ty = type_check_expr(handler, ctx.by_ref(), lhs);
    let rhs_ty = type_check_expr(handler, ctx.by_ref(), rhs);
    let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);
    if let Some(ty) = builtin_binary(op, &lhs_ty.decay(), &rhs_ty.decay()) {
        return Ok(ty);
    }
    let operands = [(lhs, &lhs_ty), (rhs, &rhs_ty)];
    if let Some(ty) = resolve_operator(&mut ctx, expr, OperatorName::Binary(op), &operands) {
        return Ok(ty);
    }
    Err(handler.emit_err(CompileError::UnsupportedOperator {
        operator: op.symbol().to_string(),
        operands: format!("`{lhs_ty}` and `{rhs_ty}`"),
        span: expr.span(),
    }))
}

/// Result type of a binary operator on built-in operand types, or `None`
/// when the operands need a user-defined overload.
fn builtin_binary(op: BinaryOp, lhs: &Ty, rhs: &Ty) -> Option<Ty> {
    let prims = lhs.as_primitive().zip(rhs.as_primitive());
    let numeric = prims.filter(|(a, b)| a.is_numeric() && b.is_numeric());
    match op.category() {
        BinaryCategory::Arithmetic if op == BinaryOp::Div => {
            let (a, b) = numeric?;
            promotion::division(a, b).map(Ty::primitive)
        }
        BinaryCategory::Arithmetic if op.is_bitwise() => {
            let (a, b) = prims.filter(|(a, b)| a.is_integer_family() && b.is_integer_family())?;
            promotion::common(a, b).map(Ty::primitive)
        }
        BinaryCategory::Arithmetic => {
            if let Some((a, b)) = numeric {
                return promotion::common(a, b).map(Ty::primitive);
            }
            let concatenates = op == BinaryOp::Add
                && lhs == rhs
                && (lhs.is_collection()
                    || matches!(
                        lhs.as_primitive(),
                        Some(PrimitiveKind::String | PrimitiveKind::ByteString)
                    ));
            concatenates.then(|| lhs.clone())
        }
        BinaryCategory::Logical => {
            (lhs.is_boolean() && rhs.is_boolean()).then(Ty::boolean)
        }
        BinaryCategory::Comparison if op.is_ordering() => {
            let comparable = match prims {
                Some((a, b)) if a.is_numeric() && b.is_numeric() => {
                    promotion::common(a, b).is_some()
                }
                Some((PrimitiveKind::String, PrimitiveKind::String))
                | Some((PrimitiveKind::Char, PrimitiveKind::Char)) => true,
                _ => false,
            };
            comparable.then(Ty::boolean)
        }
        BinaryCategory::Comparison => {
            let comparable = match (&lhs.kind, &rhs.kind) {
                (TyKind::Primitive(a), TyKind::Primitive(b)) => promotion::common(*a, *b).is_some(),
                (TyKind::Array(_) | TyKind::Keymap(..), _) => lhs == rhs,
                (TyKind::Null, TyKind::Null) => true,
                (TyKind::Null, _) => rhs.modifiers.is_nullable,
                (_, TyKind::Null) => lhs.modifiers.is_nullable,
                _ => false,
            };
            comparable.then(Ty::boolean)
        }
    }
}

pub(super) fn type_check_unary(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
    op: UnaryOp,
    operand: &Expr,
) -> Result<Ty, ErrorEmitted> {
    let ty = type_check_expr(handler, ctx.by_ref(), operand)?;
    match op {
        UnaryOp::Ref => {
            return reference_source(operand, &ty).ok_or_else(|| {
                handler.emit_err(CompileError::ReferenceNeedsPlace {
                    span: operand.span(),
                })
            })
        }
        UnaryOp::Delete => {
            return match ty.kind {
                TyKind::Class(_) | TyKind::GenericClass(..) => Ok(Ty::void()),
                _ => Err(handler.emit_err(CompileError::DeleteOfNonClass {
                    ty: ty.to_string(),
                    span: operand.span(),
                })),
            }
        }
        UnaryOp::Neg | UnaryOp::Pos | UnaryOp::BitNot | UnaryOp::Not => {}
    }
    let builtin = ty.decay().as_primitive().filter(|kind| match op {
        UnaryOp::Neg | UnaryOp::Pos => kind.is_numeric(),
        UnaryOp::BitNot => kind.is_integer_family(),
        _ => *kind == PrimitiveKind::Boolean,
    });
    if let Some(kind) = builtin {
        return Ok(Ty::primitive(kind));
    }
    if let Some(result) = resolve_operator(&mut ctx, expr, OperatorName::Unary(op), &[(operand, &ty)]) {
        return Ok(result);
    }
    Err(handler.emit_err(CompileError::UnsupportedOperator {
        operator: op.symbol().to_string(),
        operands: format!("`{ty}`"),
        span: expr.span(),
    }))
}

pub(super) fn type_check_index(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
    target: &Expr,
    index: &Expr,
) -> Result<Ty, ErrorEmitted> {
    let target_ty = type_check_expr(handler, ctx.by_ref(), target);
    let index_ty = type_check_expr(handler, ctx.by_ref(), index);
    let (target_ty, index_ty) = (target_ty?, index_ty?);
    let (expected, mut result) = match &target_ty.kind {
        TyKind::Array(elem) => {
            let is_integer = index_ty
                .as_primitive()
                .is_some_and(PrimitiveKind::is_integer_family);
            (
                (!is_integer).then(|| "integer".to_string()),
                elem.as_ref().clone(),
            )
        }
        TyKind::Keymap(key, value) => (
            (!assignable(&index_ty.decay(), key)).then(|| key.to_string()),
            value.as_ref().clone(),
        ),
        TyKind::Class(_) | TyKind::GenericClass(..) => {
            let operands = [(target, &target_ty), (index, &index_ty)];
            return resolve_operator(&mut ctx, expr, OperatorName::Index, &operands).ok_or_else(|| {
                handler.emit_err(CompileError::NotIndexable {
                    ty: target_ty.to_string(),
                    span: target.span(),
                })
            });
        }
        _ => {
            return Err(handler.emit_err(CompileError::NotIndexable {
                ty: target_ty.to_string(),
                span: target.span(),
            }))
        }
    };
    if let Some(expected) = expected {
        return Err(handler.emit_err(CompileError::TypeError(TypeError::MismatchedType {
            expected,
            received: index_ty.to_string(),
            help_text: "Index has the wrong type.".into(),
            span: index.span(),
        })));
    }
    // Elements of a constant collection are constant.
    result.modifiers.is_const |= target_ty.is_const();
    Ok(result)
}

/// Finds the overload of `operator` that accepts `operands`.
///
/// Candidates are the functions registered under the operator's mangled name,
/// in declaration order. The type parameters of a generic owner class are
/// inferred from the operands and substituted into the result type. On
/// success the expression is linked to the chosen function.
fn resolve_operator(
    ctx: &mut TypeCheckContext,
    expr: &Expr,
    operator: OperatorName,
    operands: &[(&Expr, &Ty)],
) -> Option<Ty> {
    let program = ctx.program();
    let candidates = ctx.registry().functions_named(&operator.mangled());
    let (id, ret) = candidates.iter().find_map(|id| {
        let decl = program.function_decl(*id);
        if decl.params.len() != operands.len() {
            return None;
        }
        let params = decl
            .params
            .iter()
            .map(|param| ctx.decorations.type_of(param.ty.meta.id).cloned())
            .collect::<Option<Vec<_>>>()?;
        let ret = ctx.decorations.type_of(decl.return_type.meta.id)?;
        let generics = owner_generics(ctx, decl.owner.as_ref());
        let mut subst = TypeSubstMap::new();
        for (param, (_, arg)) in params.iter().zip(operands) {
            subst.bind(generics, param, arg);
        }
        let accepted = params
            .iter()
            .zip(operands)
            .all(|(param, (arg_expr, arg))| accepts(&subst.subst(param), arg, arg_expr));
        accepted.then(|| (*id, subst.subst(ret)))
    })?;
    ctx.decorations.set_resolution(expr.id(), DeclId::Function(id));
    ctx.decorations.mark_used(DeclId::Function(id));
    tracing::trace!("{} resolved to {}", operator, program.function_decl(id).name);
    Some(ret)
}

fn owner_generics<'a>(ctx: &TypeCheckContext<'a>, owner: Option<&Ident>) -> &'a [Ident] {
    match owner.map(|name| ctx.registry().lookup_class(name)) {
        Some(ClassLookup::Found(class)) => &ctx.class_decl(class).generics,
        _ => &[],
    }
}

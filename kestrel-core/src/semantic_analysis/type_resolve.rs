use crate::{
    semantic_analysis::{
        namespace::{ClassId, ClassLookup, DeclId},
        TypeCheckContext,
    },
    type_system::{Ty, TyKind},
};

use kestrel_ast::{TypeKind, TypeRef};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
};
use kestrel_types::{Ident, Spanned};

/// Resolves a type reference in the type parameter context of `ctx`.
///
/// The outcome is memoized on the node: every type reference sits in exactly
/// one context, so it is resolved once.
pub(crate) fn resolve_type(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    type_ref: &TypeRef,
) -> Result<Ty, ErrorEmitted> {
    if let Some(cached) = ctx.decorations.cached(type_ref.meta.id) {
        return cached;
    }
    let result = resolve_type_kind(handler, ctx.by_ref(), type_ref)
        .map(|ty| ty.with_modifiers(type_ref.modifiers));
    ctx.decorations.record(type_ref.meta.id, result)
}

fn resolve_type_kind(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    type_ref: &TypeRef,
) -> Result<Ty, ErrorEmitted> {
    match &type_ref.kind {
        TypeKind::Primitive(kind) => Ok(Ty::primitive(*kind)),
        TypeKind::Void => Ok(Ty::void()),
        TypeKind::Array(args) => {
            let mut args = resolve_args(handler, ctx.by_ref(), args)?;
            check_collection_arity(handler, type_ref, "array", args.len(), 1)?;
            Ok(Ty::array(args.remove(0)))
        }
        TypeKind::Keymap(args) => {
            let mut args = resolve_args(handler, ctx.by_ref(), args)?;
            check_collection_arity(handler, type_ref, "keymap", args.len(), 2)?;
            let value = args.remove(1);
            Ok(Ty::keymap(args.remove(0), value))
        }
        TypeKind::Class(name) => {
            if is_generic_alias(&mut ctx, type_ref, name) {
                return Ok(Ty::new(TyKind::GenericParam(name.clone())));
            }
            let id = lookup(handler, &ctx, name, type_ref)?;
            let decl = ctx.class_decl(id);
            if decl.is_generic() {
                return Err(handler.emit_err(CompileError::MissingTypeArguments {
                    name: name.clone(),
                    expected: decl.generics.len(),
                    span: type_ref.span(),
                }));
            }
            ctx.decorations.mark_used(DeclId::Class(id));
            Ok(Ty::new(TyKind::Class(name.clone())))
        }
        TypeKind::GenericClass(name, args) => {
            if ctx.generics().contains(name) {
                ctx.decorations.set_generic_alias(type_ref.meta.id, true);
                return Err(handler.emit_err(CompileError::NotGeneric {
                    name: name.clone(),
                    span: type_ref.span(),
                }));
            }
            let resolved = resolve_args(handler, ctx.by_ref(), args);
            let id = lookup(handler, &ctx, name, type_ref)?;
            let args = resolved?;
            let decl = ctx.class_decl(id);
            if !decl.is_generic() {
                return Err(handler.emit_err(CompileError::NotGeneric {
                    name: name.clone(),
                    span: type_ref.span(),
                }));
            }
            if decl.generics.len() != args.len() {
                return Err(handler.emit_err(CompileError::IncorrectNumberOfTypeArguments {
                    name: name.clone(),
                    given: args.len(),
                    expected: decl.generics.len(),
                    span: type_ref.span(),
                }));
            }
            ctx.decorations.mark_used(DeclId::Class(id));
            if args.iter().all(Ty::is_concrete) {
                ctx.decorations.add_instantiation(name, args.clone());
            }
            Ok(Ty::new(TyKind::GenericClass(name.clone(), args)))
        }
    }
}

/// Resolves every argument before reporting the first failure.
fn resolve_args(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    args: &[TypeRef],
) -> Result<Vec<Ty>, ErrorEmitted> {
    args.iter()
        .map(|arg| resolve_type(handler, ctx.by_ref(), arg))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

fn check_collection_arity(
    handler: &Handler,
    type_ref: &TypeRef,
    collection: &'static str,
    given: usize,
    expected: usize,
) -> Result<(), ErrorEmitted> {
    if given == expected {
        return Ok(());
    }
    Err(handler.emit_err(CompileError::BadCollectionArity {
        collection,
        given,
        expected,
        span: type_ref.span(),
    }))
}

/// Whether a bare name denotes a type parameter of the enclosing class.
fn is_generic_alias(ctx: &mut TypeCheckContext, type_ref: &TypeRef, name: &Ident) -> bool {
    if let Some(is_alias) = ctx.decorations.generic_alias(type_ref.meta.id) {
        return is_alias;
    }
    let is_alias = ctx.generics().contains(name);
    ctx.decorations.set_generic_alias(type_ref.meta.id, is_alias);
    is_alias
}

fn lookup(
    handler: &Handler,
    ctx: &TypeCheckContext,
    name: &Ident,
    type_ref: &TypeRef,
) -> Result<ClassId, ErrorEmitted> {
    match ctx.registry().lookup_class(name) {
        ClassLookup::Found(id) => Ok(id),
        ClassLookup::Missing => Err(handler.emit_err(CompileError::UnknownType {
            name: name.clone(),
            span: type_ref.span(),
        })),
        ClassLookup::Ambiguous => Err(handler.emit_err(CompileError::AmbiguousType {
            name: name.clone(),
            span: type_ref.span(),
        })),
    }
}

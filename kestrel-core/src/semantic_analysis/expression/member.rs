use super::type_check_expr;
use crate::{
    semantic_analysis::{
        namespace::{ClassId, ClassLookup, DeclId},
        TypeCheckContext,
    },
    type_system::{Ty, TypeSubstMap},
};

use kestrel_ast::{Expr, ExprKind, MemberAccess, Modifiers};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
};
use kestrel_types::{Ident, Spanned};

/// Finds field `name` in `class` or its ancestors, nearest first.
///
/// Returns the declaring class, the field index and the field type seen from
/// `class`.
pub(super) fn lookup_field(
    ctx: &TypeCheckContext,
    class: ClassId,
    name: &Ident,
) -> Option<(ClassId, usize, Result<Ty, ErrorEmitted>)> {
    lookup_field_with(ctx, class, name, &TypeSubstMap::new())
}

fn lookup_field_with(
    ctx: &TypeCheckContext,
    class: ClassId,
    name: &Ident,
    receiver: &TypeSubstMap,
) -> Option<(ClassId, usize, Result<Ty, ErrorEmitted>)> {
    ctx.decorations
        .class_chain(class)
        .into_iter()
        .find_map(|(owner, subst)| {
            let (index, field) = ctx.class_decl(owner).field(name)?;
            let subst = subst.then(receiver);
            let ty = ctx
                .decorations
                .cached(field.ty.meta.id)?
                .map(|ty| subst.subst(&ty));
            Some((owner, index, ty))
        })
}

/// The class a receiver expression names when it is used for static access,
/// as in `Counter.total`.
pub(super) fn static_receiver(ctx: &TypeCheckContext, target: &Expr) -> Option<ClassId> {
    let ExprKind::Ident(name) = &target.kind else {
        return None;
    };
    if ctx.env().contains(name) {
        return None;
    }
    if let Some(class) = ctx.self_class() {
        if lookup_field(ctx, class, name).is_some() {
            return None;
        }
    }
    match ctx.registry().lookup_class(name) {
        ClassLookup::Found(id) => Some(id),
        ClassLookup::Missing | ClassLookup::Ambiguous => None,
    }
}

/// What a member access is applied to.
pub(super) enum Receiver {
    /// A class name: only static members are reachable.
    Static(ClassId),
    /// A value of a class type, with the substitution its type arguments induce.
    Instance {
        class: ClassId,
        subst: TypeSubstMap,
        modifiers: Modifiers,
    },
}

impl Receiver {
    pub(super) fn class(&self) -> ClassId {
        match self {
            Receiver::Static(class) | Receiver::Instance { class, .. } => *class,
        }
    }

    pub(super) fn subst(&self) -> TypeSubstMap {
        match self {
            Receiver::Static(_) => TypeSubstMap::new(),
            Receiver::Instance { subst, .. } => subst.clone(),
        }
    }
}

/// Checks the left-hand side of `.` or `->` and finds its class.
pub(super) fn type_check_receiver(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    target: &Expr,
    access: MemberAccess,
) -> Result<Receiver, ErrorEmitted> {
    if let Some(class) = static_receiver(&ctx, target) {
        let ty = ctx.self_type(class).decay();
        ctx.decorations.record(target.id(), Ok(ty))?;
        ctx.decorations.set_resolution(target.id(), DeclId::Class(class));
        ctx.decorations.mark_used(DeclId::Class(class));
        return Ok(Receiver::Static(class));
    }
    let ty = type_check_expr(handler, ctx.by_ref(), target)?;
    if access == MemberAccess::Arrow && !ty.is_reference() {
        return Err(handler.emit_err(CompileError::ArrowOnNonReference {
            ty: ty.to_string(),
            span: target.span(),
        }));
    }
    let Some(class) = ctx.class_of(&ty) else {
        return Err(handler.emit_err(CompileError::MemberAccessOnNonClass {
            ty: ty.to_string(),
            span: target.span(),
        }));
    };
    Ok(Receiver::Instance {
        class,
        subst: ctx.receiver_subst(class, &ty),
        modifiers: ty.modifiers,
    })
}

pub(super) fn type_check_member(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
    target: &Expr,
    access: MemberAccess,
    name: &Ident,
) -> Result<Ty, ErrorEmitted> {
    let receiver = type_check_receiver(handler, ctx.by_ref(), target, access)?;
    let class = receiver.class();
    let Some((owner, index, ty)) = lookup_field_with(&ctx, class, name, &receiver.subst()) else {
        return Err(handler.emit_err(CompileError::UnknownField {
            class_name: ctx.class_decl(class).name.to_string(),
            name: name.clone(),
            span: name.span(),
        }));
    };
    let field = &ctx.class_decl(owner).fields[index];
    if !ctx.is_accessible(owner, field.access) {
        return Err(handler.emit_err(CompileError::InaccessibleMember {
            class_name: ctx.class_decl(owner).name.clone(),
            name: name.clone(),
            access: field.access.as_str(),
            span: name.span(),
        }));
    }
    if matches!(receiver, Receiver::Static(_)) && !field.is_static {
        return Err(handler.emit_err(CompileError::InstanceMemberInStaticContext {
            name: name.clone(),
            span: name.span(),
        }));
    }
    let decl = DeclId::Field(owner, index);
    ctx.decorations.mark_used(decl);
    ctx.decorations.set_resolution(expr.id(), decl);
    let mut ty = ty?;
    if let Receiver::Instance { modifiers, .. } = receiver {
        // Fields of a constant object are constant.
        ty.modifiers.is_const |= modifiers.is_const;
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{errors_of, type_of_last_statement};
    use assert_matches::assert_matches;
    use kestrel_error::error::CompileError;
    use pretty_assertions::assert_eq;

    const SHAPES: &str = "
        class Shape {
            public double width;
            protected double height;
            private integer id;
            static integer count;
        }
        class Square extends Shape {
            double area() { return width * height; }
        }
    ";

    #[test]
    fn field_through_superclass() {
        assert_eq!(
            type_of_last_statement(&format!("{SHAPES} Square s; s.width;")),
            "double"
        );
    }

    #[test]
    fn access_levels() {
        let errors = errors_of(&format!(
            "{SHAPES} class Peek extends Shape {{ integer ident() {{ return id; }} }}
             Square s; s.width := 1.0; s.height := 2.0;"
        ));
        let inaccessible = errors
            .iter()
            .filter_map(|err| match err {
                CompileError::InaccessibleMember { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(inaccessible, ["id", "height"]);
    }

    #[test]
    fn static_fields_through_class_name() {
        assert_matches!(errors_of(&format!("{SHAPES} Shape.count := 3;")).as_slice(), []);
        assert_matches!(
            errors_of(&format!("{SHAPES} Shape.width := 3.0;")).as_slice(),
            [CompileError::InstanceMemberInStaticContext { .. }]
        );
    }

    #[test]
    fn arrow_needs_reference() {
        let src = "class P { integer x; } P p; reference P r = p; r->x := 1; p->x := 2;";
        assert_matches!(
            errors_of(src).as_slice(),
            [CompileError::ArrowOnNonReference { .. }]
        );
    }

    #[test]
    fn unknown_and_non_class_members() {
        assert_matches!(
            errors_of("class P { } P p; p.y := 1;").as_slice(),
            [CompileError::UnknownField { .. }]
        );
        assert_matches!(
            errors_of("integer i; i.y := 1;").as_slice(),
            [CompileError::MemberAccessOnNonClass { .. }]
        );
    }

    #[test]
    fn generic_field_types_are_substituted() {
        let src = "class Box[T] { T value; } class IntBox extends Box[integer] { }
                   Box[string] b; b.value; IntBox i; i.value;";
        assert_eq!(type_of_last_statement(src), "integer");
    }

    #[test]
    fn fields_of_a_directly_instantiated_class() {
        let boxes = "class Box[T] { T value; } class Pair[K, V] { K key; V value; }";
        assert_eq!(
            type_of_last_statement(&format!("{boxes} Box[string] b; string s := b.value;")),
            "string"
        );
        assert_eq!(
            type_of_last_statement(&format!("{boxes} Pair[char, long] p; long v := p.value;")),
            "long"
        );
        assert_matches!(
            errors_of(&format!("{boxes} Box[string] b; b.value := 1;")).as_slice(),
            [CompileError::TypeError(_)]
        );
    }
}

//! Validation of superclass chains and of the members a class inherits.

use crate::{
    decoration::{InheritanceMark, SuperclassLink},
    semantic_analysis::{
        namespace::{ClassId, ClassLookup},
        resolve_type, TypeCheckContext,
    },
    type_system::{strict_signature, Ty, TypeSubstMap},
};

use kestrel_ast::{Access, ClassDecl, MethodDecl, Modifiers, TypeKind};
use kestrel_error::{
    error::CompileError,
    handler::Handler,
    warning::{CompileWarning, Warning},
};
use kestrel_types::Spanned;

/// Validates the inheritance of `class`, memoized per class.
///
/// Validating a class first validates its superclass, so shared ancestors are
/// checked once for the whole program. A class found in progress again is part
/// of a cycle, which the class that closed the cycle has already reported.
pub(crate) fn check_inheritance(handler: &Handler, mut ctx: TypeCheckContext, class: ClassId) -> bool {
    match ctx.decorations.inheritance_mark(class) {
        InheritanceMark::Done(valid) => return valid,
        InheritanceMark::InProgress => return false,
        InheritanceMark::Unvisited => {}
    }
    ctx.decorations
        .set_inheritance_mark(class, InheritanceMark::InProgress);
    let superclass_valid = check_superclass(handler, ctx.by_ref(), class);
    let members_valid = check_members(handler, ctx.by_ref(), class, superclass_valid);
    let valid = superclass_valid && members_valid;
    ctx.decorations
        .set_inheritance_mark(class, InheritanceMark::Done(valid));
    tracing::trace!(
        "inheritance of {} is {}",
        ctx.class_decl(class).name,
        if valid { "valid" } else { "invalid" }
    );
    valid
}

/// The class `class` names in its `extends` clause, if that name is a class.
fn declared_superclass(ctx: &TypeCheckContext, class: ClassId) -> Option<ClassId> {
    let superclass = ctx.class_decl(class).superclass.as_ref()?;
    match &superclass.kind {
        TypeKind::Class(name) | TypeKind::GenericClass(name, _) => {
            match ctx.registry().lookup_class(name) {
                ClassLookup::Found(id) => Some(id),
                ClassLookup::Missing | ClassLookup::Ambiguous => None,
            }
        }
        _ => None,
    }
}

/// Whether following `extends` clauses from `class` leads back to `class`.
fn in_cycle(ctx: &TypeCheckContext, class: ClassId) -> bool {
    let mut seen = vec![class];
    let mut current = class;
    while let Some(next) = declared_superclass(ctx, current) {
        if next == class {
            return true;
        }
        if seen.contains(&next) {
            return false;
        }
        seen.push(next);
        current = next;
    }
    false
}

fn check_superclass(handler: &Handler, mut ctx: TypeCheckContext, class: ClassId) -> bool {
    let decl = ctx.class_decl(class);
    let Some(superclass) = &decl.superclass else {
        return true;
    };
    let name = match &superclass.kind {
        TypeKind::Class(name) | TypeKind::GenericClass(name, _)
            if superclass.modifiers == Modifiers::NONE && !decl.generics.contains(name) =>
        {
            name
        }
        _ => {
            handler.emit_err(CompileError::SuperclassNotAClass {
                class_name: decl.name.clone(),
                superclass: superclass.to_string(),
                span: superclass.span(),
            });
            return false;
        }
    };
    if ctx.registry().lookup_class(name) == ClassLookup::Missing {
        handler.emit_err(CompileError::UnknownSuperclass {
            class_name: decl.name.clone(),
            superclass: name.clone(),
            span: superclass.span(),
        });
        return false;
    }
    if in_cycle(&ctx, class) {
        handler.emit_err(CompileError::InheritanceCycle {
            class_name: decl.name.clone(),
            span: decl.name.span(),
        });
        return false;
    }
    let Ok(ty) = resolve_type(
        handler,
        ctx.by_ref().with_generics(&decl.generics),
        superclass,
    ) else {
        return false;
    };
    let Some(super_id) = ctx.class_of(&ty) else {
        return false;
    };
    if !check_inheritance(handler, ctx.by_ref(), super_id) {
        handler.emit_err(CompileError::InvalidSuperclass {
            class_name: decl.name.clone(),
            superclass: name.clone(),
            span: superclass.span(),
        });
        return false;
    }
    let subst = ctx.receiver_subst(super_id, &ty);
    ctx.decorations.set_superclass(
        class,
        SuperclassLink {
            class: super_id,
            subst,
        },
    );
    true
}

fn check_members(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    class: ClassId,
    superclass_valid: bool,
) -> bool {
    let decl = ctx.class_decl(class);
    let mut valid = check_member_names(handler, decl);
    let ancestors = if superclass_valid {
        ctx.decorations
            .class_chain(class)
            .into_iter()
            .skip(1)
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };

    for field in &decl.fields {
        let inherited = ancestors.iter().find_map(|(id, _)| {
            let ancestor = ctx.class_decl(*id);
            ancestor
                .field(&field.name)
                .filter(|(_, f)| f.access != Access::Private)
                .map(|_| ancestor)
        });
        if let Some(ancestor) = inherited {
            handler.emit_err(CompileError::FieldRedeclared {
                class_name: decl.name.clone(),
                name: field.name.clone(),
                ancestor: ancestor.name.clone(),
                span: field.name.span(),
            });
            valid = false;
        }
    }

    for method in &decl.methods {
        if method.access == Access::Private && method.is_virtual {
            handler.emit_err(CompileError::PrivateVirtual {
                name: method.name.clone(),
                span: method.name.span(),
            });
            valid = false;
        }
        if method.is_overload && method.is_virtual {
            handler.emit_err(CompileError::OverloadAlsoVirtual {
                name: method.name.clone(),
                span: method.name.span(),
            });
            valid = false;
        }
        if method.is_overload && decl.superclass.is_none() {
            handler.emit_err(CompileError::OverloadInRootClass {
                class_name: decl.name.clone(),
                name: method.name.clone(),
                span: method.name.span(),
            });
            valid = false;
            continue;
        }
        if method.is_static || !superclass_valid || decl.superclass.is_none() {
            continue;
        }
        valid &= check_override(handler, ctx.by_ref(), decl, method, &ancestors);
    }
    valid
}

/// Fields must have distinct names, and no method may share a field's name.
fn check_member_names(handler: &Handler, decl: &ClassDecl) -> bool {
    let mut valid = true;
    let fields = &decl.fields;
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.name == field.name) {
            handler.emit_err(CompileError::MemberRedeclared {
                class_name: decl.name.clone(),
                name: field.name.clone(),
                span: field.name.span(),
            });
            valid = false;
        }
    }
    for method in &decl.methods {
        if fields.iter().any(|f| f.name == method.name) {
            handler.emit_err(CompileError::MemberRedeclared {
                class_name: decl.name.clone(),
                name: method.name.clone(),
                span: method.name.span(),
            });
            valid = false;
        }
    }
    valid
}

/// Resolved parameter and return types of a method, `None` if any failed to resolve.
pub(crate) fn method_signature(ctx: &TypeCheckContext, method: &MethodDecl) -> Option<(Vec<Ty>, Ty)> {
    let params = method
        .params
        .iter()
        .map(|param| ctx.decorations.type_of(param.ty.meta.id).cloned())
        .collect::<Option<Vec<_>>>()?;
    let ret = ctx.decorations.type_of(method.return_type.meta.id).cloned()?;
    Some((params, ret))
}

/// Matches `method` against the overridable methods of its ancestors.
///
/// The nearest ancestor method with the same name and a strictly equal
/// signature, after substituting the ancestor's type parameters, is the one
/// overridden.
fn check_override(
    handler: &Handler,
    ctx: TypeCheckContext,
    decl: &ClassDecl,
    method: &MethodDecl,
    ancestors: &[(ClassId, TypeSubstMap)],
) -> bool {
    let Some((params, ret)) = method_signature(&ctx, method) else {
        return true;
    };
    let overridden = ancestors.iter().find_map(|(id, subst)| {
        ctx.class_decl(*id)
            .methods
            .iter()
            .filter(|m| m.name == method.name && m.is_overridable() && !m.is_static)
            .find_map(|m| {
                let (m_params, m_ret) = method_signature(&ctx, m)?;
                let m_params = m_params.iter().map(|p| subst.subst(p)).collect::<Vec<_>>();
                strict_signature(&m_params, &params).then(|| (m, subst.subst(&m_ret)))
            })
    });

    match overridden {
        Some((base, base_ret)) if method.is_overload => {
            let mut valid = true;
            if base.access != method.access {
                handler.emit_err(CompileError::OverloadAccessMismatch {
                    name: method.name.clone(),
                    expected: base.access.as_str(),
                    found: method.access.as_str(),
                    span: method.name.span(),
                });
                valid = false;
            }
            if base_ret != ret {
                handler.emit_err(CompileError::OverloadReturnTypeMismatch {
                    name: method.name.clone(),
                    expected: base_ret.to_string(),
                    found: ret.to_string(),
                    span: method.return_type.span(),
                });
                valid = false;
            }
            valid
        }
        Some(_) => {
            handler.emit_warn(CompileWarning {
                span: method.name.span(),
                warning_content: Warning::MethodShadowsVirtual {
                    class_name: decl.name.clone(),
                    name: method.name.clone(),
                },
            });
            true
        }
        None if method.is_overload => {
            handler.emit_err(CompileError::OverloadWithoutVirtual {
                name: method.name.clone(),
                span: method.name.span(),
            });
            false
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{analyze, errors_of};
    use assert_matches::assert_matches;
    use kestrel_error::{error::CompileError, warning::Warning};
    use pretty_assertions::assert_eq;

    #[test]
    fn cycle_is_reported_once_per_class() {
        let result = analyze("class A extends B { } class B extends A { } class C extends A { }");
        assert!(!result.analysis.is_valid());
        let cycles = result
            .errors
            .iter()
            .filter_map(|err| match err {
                CompileError::InheritanceCycle { class_name, .. } => Some(class_name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(cycles, ["A", "B"]);
        assert!(result.errors.iter().any(|err| matches!(
            err,
            CompileError::InvalidSuperclass { class_name, .. } if class_name.as_str() == "C"
        )));
    }

    #[test]
    fn self_extension_is_a_cycle() {
        let errors = errors_of("class A extends A { }");
        assert_matches!(errors.as_slice(), [CompileError::InheritanceCycle { .. }]);
    }

    #[test]
    fn superclass_errors() {
        assert_matches!(
            errors_of("class A extends Missing { }").as_slice(),
            [CompileError::UnknownSuperclass { .. }]
        );
        assert_matches!(
            errors_of("class A extends integer { }").as_slice(),
            [CompileError::SuperclassNotAClass { .. }]
        );
        assert_matches!(
            errors_of("class Box[T] { } class A extends Box { }").as_slice(),
            [CompileError::MissingTypeArguments { .. }]
        );
        assert_matches!(
            errors_of("class Box[T] { } class A extends Box[integer, long] { }").as_slice(),
            [CompileError::IncorrectNumberOfTypeArguments {
                given: 2,
                expected: 1,
                ..
            }]
        );
        assert_matches!(
            errors_of("class Box[T] { } class A[U] extends Box[U] { }").as_slice(),
            []
        );
    }

    #[test]
    fn inherited_fields_cannot_be_redeclared() {
        let errors = errors_of(
            "class A { integer x; private integer y; }
             class B extends A { integer x; integer y; }",
        );
        assert_matches!(
            errors.as_slice(),
            [CompileError::FieldRedeclared { name, ancestor, .. }]
                if name.as_str() == "x" && ancestor.as_str() == "A"
        );
    }

    #[test]
    fn duplicate_members() {
        let errors = errors_of("class A { integer x; long x; void x() { } }");
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|err| matches!(err, CompileError::MemberRedeclared { .. })));
    }

    #[test]
    fn overload_matches_inherited_virtual() {
        let result = analyze(
            "class Animal { virtual string speak() { return \"\"; } }
             class Dog extends Animal { overload string speak() { return \"woof\"; } }",
        );
        assert!(result.errors.is_empty(), "{:?}", result.errors);
    }

    #[test]
    fn overload_through_generic_superclass() {
        let errors = errors_of(
            "class Base[T] { virtual void put(T value) { } }
             class Ints extends Base[integer] { overload void put(integer value) { } }",
        );
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn overload_errors() {
        assert_matches!(
            errors_of("class A { overload void f() { } }").as_slice(),
            [CompileError::OverloadInRootClass { .. }]
        );
        assert_matches!(
            errors_of("class A { virtual void f() { } } class B extends A { overload void f(integer x) { } }")
                .as_slice(),
            [CompileError::OverloadWithoutVirtual { .. }]
        );
        assert_matches!(
            errors_of("class A { virtual void f() { } } class B extends A { private overload void f() { } }")
                .as_slice(),
            [CompileError::OverloadAccessMismatch {
                expected: "public",
                found: "private",
                ..
            }]
        );
        assert_matches!(
            errors_of("class A { virtual void f() { } } class B extends A { overload integer f() { return 1; } }")
                .as_slice(),
            [CompileError::OverloadReturnTypeMismatch { .. }]
        );
        assert_matches!(
            errors_of("class A { virtual void f() { } } class B extends A { virtual overload void f() { } }")
                .as_slice(),
            [CompileError::OverloadAlsoVirtual { .. }]
        );
        assert_matches!(
            errors_of("class A { private virtual void f() { } }").as_slice(),
            [CompileError::PrivateVirtual { .. }]
        );
    }

    #[test]
    fn shadowing_a_virtual_method_warns() {
        let result = analyze("class A { virtual void f() { } } class B extends A { void f() { } }");
        assert!(result.errors.is_empty());
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w.warning_content, Warning::MethodShadowsVirtual { .. })));
    }
}

use crate::{
    decoration::Decorations,
    semantic_analysis::{
        namespace::{ClassId, DeclId, ProgramDecls},
        TypeCheckContext,
    },
    type_system::{display_list, strict_signature, Ty},
};

use indexmap::IndexMap;
use itertools::Itertools;
use kestrel_ast::{Access, Param};
use kestrel_error::{error::CompileError, handler::Handler};
use kestrel_types::{Ident, Span, Spanned};

/// One declaration of an overload set.
struct OverloadMember {
    decl: DeclId,
    /// `None` when a parameter type failed to resolve.
    signature: Option<Vec<Ty>>,
    span: Span,
}

fn signature(decorations: &Decorations, params: &[Param]) -> Option<Vec<Ty>> {
    params
        .iter()
        .map(|param| decorations.type_of(param.ty.meta.id).cloned())
        .collect()
}

/// Checks that no two free or operator functions share both name and signature.
pub(crate) fn check_function_overloads(handler: &Handler, ctx: TypeCheckContext) -> bool {
    let program = ctx.program();
    let mut valid = true;
    for (name, ids) in ctx.registry().function_groups() {
        let members = ids
            .iter()
            .map(|id| {
                let decl = program.function_decl(*id);
                OverloadMember {
                    decl: DeclId::Function(*id),
                    signature: signature(ctx.decorations, &decl.params),
                    span: decl.name.span(),
                }
            })
            .collect::<Vec<_>>();
        let display_name = match program.function_decl(ids[0]).operator {
            Some(operator) => format!("operator {operator}"),
            None => name.to_string(),
        };
        valid &= check_set(handler, ctx.decorations, &display_name, &members);
    }
    valid
}

/// Checks the methods of `class`: one signature per name, and the rules for
/// static methods.
pub(crate) fn check_method_overloads(handler: &Handler, ctx: TypeCheckContext, class: ClassId) -> bool {
    let decl = ctx.class_decl(class);
    let mut valid = true;
    let mut groups: IndexMap<&Ident, Vec<OverloadMember>> = IndexMap::new();
    for (index, method) in decl.methods.iter().enumerate() {
        if method.is_static {
            valid &= check_static_method(handler, method.access, method.is_virtual, method.is_overload, &method.name);
        }
        groups.entry(&method.name).or_default().push(OverloadMember {
            decl: DeclId::Method(class, index),
            signature: signature(ctx.decorations, &method.params),
            span: method.name.span(),
        });
    }
    for (name, members) in &groups {
        let display_name = format!("{}.{}", decl.name, name);
        valid &= check_set(handler, ctx.decorations, &display_name, members);
    }
    valid
}

fn check_static_method(
    handler: &Handler,
    access: Access,
    is_virtual: bool,
    is_overload: bool,
    name: &Ident,
) -> bool {
    let mut valid = true;
    if access != Access::Public {
        handler.emit_err(CompileError::StaticMethodNotPublic {
            name: name.clone(),
            span: name.span(),
        });
        valid = false;
    }
    if is_virtual {
        handler.emit_err(CompileError::StaticMethodVirtual {
            name: name.clone(),
            span: name.span(),
        });
        valid = false;
    }
    if is_overload {
        handler.emit_err(CompileError::StaticMethodOverload {
            name: name.clone(),
            span: name.span(),
        });
        valid = false;
    }
    valid
}

/// Numbers the members of one overload set and reports each member whose
/// signature strictly repeats an earlier one.
fn check_set(
    handler: &Handler,
    decorations: &mut Decorations,
    name: &str,
    members: &[OverloadMember],
) -> bool {
    for (index, member) in members.iter().enumerate() {
        decorations.set_overload_index(member.decl, index);
    }
    let mut reported = Vec::new();
    for ((_, first), (index, second)) in members.iter().enumerate().tuple_combinations() {
        if reported.contains(&index) {
            continue;
        }
        let (Some(a), Some(b)) = (&first.signature, &second.signature) else {
            continue;
        };
        if strict_signature(a, b) {
            handler.emit_err(CompileError::DuplicateOverload {
                name: name.to_string(),
                signature: display_list(b),
                span: second.span.clone(),
            });
            reported.push(index);
        }
    }
    reported.is_empty()
}

#[cfg(test)]
mod tests {
    use crate::test_utils::errors_of;
    use assert_matches::assert_matches;
    use kestrel_error::error::CompileError;

    #[test]
    fn distinct_signatures_are_accepted() {
        let errors = errors_of(
            "void f(integer a) { } void f(integer a, integer b) { } void f(long a) { }
             f(1); f(1, 2); f(3000000000);",
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn identical_signatures_are_rejected() {
        let errors = errors_of("void f(integer a) { } void f(integer b) { }");
        assert_matches!(
            errors.as_slice(),
            [CompileError::DuplicateOverload { name, signature, .. }]
                if name == "f" && signature == "integer"
        );
    }

    #[test]
    fn modifiers_distinguish_signatures() {
        let errors = errors_of("void f(integer a) { } void f(const integer a) { }");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn three_copies_report_two_duplicates() {
        let errors = errors_of("void f() { } void f() { } void f() { }");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn duplicate_methods() {
        let errors = errors_of("class A { void m(string s) { } integer m(string t) { return 1; } }");
        assert_matches!(
            errors.as_slice(),
            [CompileError::DuplicateOverload { name, .. }] if name == "A.m"
        );
    }

    #[test]
    fn duplicate_operators() {
        let errors = errors_of(
            "class V { V operator +(V a, V b) { return a; } V operator +(V c, V d) { return c; } }",
        );
        assert_matches!(
            errors.as_slice(),
            [CompileError::DuplicateOverload { name, .. }] if name == "operator +"
        );
    }

    #[test]
    fn static_method_rules() {
        let errors = errors_of("class A { private static void f() { } static virtual void g() { } }");
        assert_matches!(
            errors.as_slice(),
            [
                CompileError::StaticMethodNotPublic { .. },
                CompileError::StaticMethodVirtual { .. }
            ]
        );
    }
}

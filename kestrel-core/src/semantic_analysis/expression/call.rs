use super::{
    accepts,
    member::{type_check_receiver, Receiver},
    type_check_all, type_check_expr,
};
use crate::{
    semantic_analysis::{
        namespace::{ClassId, DeclId, ProgramDecls},
        TypeCheckContext,
    },
    type_system::{display_list, Ty, TypeSubstMap},
};

use kestrel_ast::{Access, Expr, ExprKind, Param, TypeRef};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
};
use kestrel_types::{Ident, Spanned};

/// A declaration a call may resolve to, with its signature as seen from the
/// call site. The signature is an error when one of its types failed to resolve.
struct Candidate {
    decl: DeclId,
    signature: Result<(Vec<Ty>, Ty), ErrorEmitted>,
}

/// Everything found while collecting the methods a call can reach.
#[derive(Default)]
struct MethodLookup {
    candidates: Vec<Candidate>,
    /// Whether the chain declares any method with the name.
    any_named: bool,
    /// An instance method that was skipped because there is no instance.
    excluded_instance: bool,
    /// The nearest method that was skipped because of its access level.
    inaccessible: Option<(ClassId, Access)>,
}

fn resolved_signature(
    ctx: &TypeCheckContext,
    params: &[Param],
    return_type: &TypeRef,
    subst: &TypeSubstMap,
) -> Option<Result<(Vec<Ty>, Ty), ErrorEmitted>> {
    let mut tys = Vec::with_capacity(params.len());
    for param in params {
        match ctx.decorations.cached(param.ty.meta.id)? {
            Ok(ty) => tys.push(subst.subst(&ty)),
            Err(err) => return Some(Err(err)),
        }
    }
    let ret = ctx.decorations.cached(return_type.meta.id)?;
    Some(ret.map(|ret| (tys, subst.subst(&ret))))
}

/// Methods named `name` in `class` and its ancestors, nearest class first and
/// in declaration order within a class.
fn method_candidates(
    ctx: &TypeCheckContext,
    class: ClassId,
    name: &Ident,
    receiver: &TypeSubstMap,
    instance: bool,
) -> MethodLookup {
    let mut lookup = MethodLookup::default();
    for (owner, subst) in ctx.decorations.class_chain(class) {
        let subst = subst.then(receiver);
        for (index, method) in ctx.class_decl(owner).methods.iter().enumerate() {
            if &method.name != name {
                continue;
            }
            lookup.any_named = true;
            if !ctx.is_accessible(owner, method.access) {
                lookup.inaccessible.get_or_insert((owner, method.access));
                continue;
            }
            if !method.is_static && !instance {
                lookup.excluded_instance = true;
                continue;
            }
            let Some(signature) =
                resolved_signature(ctx, &method.params, &method.return_type, &subst)
            else {
                continue;
            };
            lookup.candidates.push(Candidate {
                decl: DeclId::Method(owner, index),
                signature,
            });
        }
    }
    lookup
}

/// Free functions named `name`, in declaration order. Operator overloads are
/// only reachable through their operators.
fn function_candidates(ctx: &TypeCheckContext, name: &Ident) -> Vec<Candidate> {
    let program = ctx.program();
    ctx.registry()
        .functions_named(name.as_str())
        .iter()
        .filter_map(|id| {
            let decl = program.function_decl(*id);
            if decl.operator.is_some() {
                return None;
            }
            let signature =
                resolved_signature(ctx, &decl.params, &decl.return_type, &TypeSubstMap::new())?;
            Some(Candidate {
                decl: DeclId::Function(*id),
                signature,
            })
        })
        .collect()
}

pub(super) fn type_check_call(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    expr: &Expr,
    callee: &Expr,
    args: &[Expr],
) -> Result<Ty, ErrorEmitted> {
    let arg_tys = type_check_all(handler, ctx.by_ref(), args);
    let lookup = match &callee.kind {
        ExprKind::Ident(name) => lookup_bare(handler, &ctx, callee, name),
        ExprKind::Member {
            target,
            access,
            name,
        } => type_check_receiver(handler, ctx.by_ref(), target, *access)
            .and_then(|receiver| lookup_method(handler, &ctx, receiver, name)),
        _ => {
            let _ = type_check_expr(handler, ctx.by_ref(), callee);
            Err(handler.emit_err(CompileError::NotCallable {
                span: callee.span(),
            }))
        }
    };
    ctx.decorations.set_valid(callee.id(), lookup.is_ok());
    let (display_name, candidates) = lookup?;
    let arg_tys = arg_tys?;

    let mut unresolved = None;
    let mut chosen = None;
    for candidate in candidates {
        let (params, ret) = match candidate.signature {
            Ok(signature) => signature,
            Err(err) => {
                unresolved.get_or_insert(err);
                continue;
            }
        };
        let matches = params.len() == args.len()
            && params
                .iter()
                .zip(args.iter().zip(&arg_tys))
                .all(|(param, (arg, arg_ty))| accepts(param, arg_ty, arg));
        if matches {
            chosen = Some((candidate.decl, ret));
            break;
        }
    }
    let Some((decl, ret)) = chosen else {
        // A declaration with an unresolved signature might have matched.
        if let Some(err) = unresolved {
            return Err(err);
        }
        return Err(handler.emit_err(CompileError::NoMatchingOverload {
            name: display_name,
            arguments: display_list(&arg_tys),
            span: expr.span(),
        }));
    };
    tracing::trace!(call = %expr, ?decl, "resolved call");
    ctx.decorations.set_resolution(expr.id(), decl);
    ctx.decorations.mark_used(decl);
    Ok(ret)
}

/// Candidates for a call by bare name: methods of the current class chain,
/// then free functions.
fn lookup_bare(
    handler: &Handler,
    ctx: &TypeCheckContext,
    callee: &Expr,
    name: &Ident,
) -> Result<(String, Vec<Candidate>), ErrorEmitted> {
    if ctx.env().contains(name) {
        return Err(handler.emit_err(CompileError::NotCallable {
            span: callee.span(),
        }));
    }
    let methods = match ctx.self_class() {
        Some(class) => {
            method_candidates(ctx, class, name, &TypeSubstMap::new(), ctx.is_instance())
        }
        None => MethodLookup::default(),
    };
    let functions = function_candidates(ctx, name);
    if !methods.any_named && functions.is_empty() {
        return Err(handler.emit_err(CompileError::UnknownFunction {
            name: name.clone(),
            span: callee.span(),
        }));
    }
    if methods.candidates.is_empty() && functions.is_empty() && methods.excluded_instance {
        return Err(handler.emit_err(CompileError::InstanceMemberInStaticContext {
            name: name.clone(),
            span: callee.span(),
        }));
    }
    let mut candidates = methods.candidates;
    candidates.extend(functions);
    Ok((name.to_string(), candidates))
}

/// Candidates for `receiver.name(...)`.
fn lookup_method(
    handler: &Handler,
    ctx: &TypeCheckContext,
    receiver: Receiver,
    name: &Ident,
) -> Result<(String, Vec<Candidate>), ErrorEmitted> {
    let class = receiver.class();
    let instance = matches!(receiver, Receiver::Instance { .. });
    let lookup = method_candidates(ctx, class, name, &receiver.subst(), instance);
    let class_name = &ctx.class_decl(class).name;
    if !lookup.any_named {
        return Err(handler.emit_err(CompileError::UnknownField {
            class_name: class_name.to_string(),
            name: name.clone(),
            span: name.span(),
        }));
    }
    if lookup.candidates.is_empty() {
        if lookup.excluded_instance {
            return Err(handler.emit_err(CompileError::InstanceMemberInStaticContext {
                name: name.clone(),
                span: name.span(),
            }));
        }
        if let Some((owner, access)) = lookup.inaccessible {
            return Err(handler.emit_err(CompileError::InaccessibleMember {
                class_name: ctx.class_decl(owner).name.clone(),
                name: name.clone(),
                access: access.as_str(),
                span: name.span(),
            }));
        }
    }
    Ok((format!("{class_name}.{name}"), lookup.candidates))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{analyze, errors_of, type_of_last_statement};
    use assert_matches::assert_matches;
    use kestrel_error::error::CompileError;
    use pretty_assertions::assert_eq;

    #[test]
    fn call_resolves_and_counts_usage() {
        let result = analyze("integer f(integer x) { return x * 2; } integer y := f(3);");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.usage_of_function("f"), 1);
    }

    #[test]
    fn first_matching_overload_wins() {
        let src = "long f(long x) { return x; } integer f(integer x) { return x; } f(1);";
        assert_eq!(type_of_last_statement(src), "long");
    }

    #[test]
    fn call_errors() {
        assert_matches!(
            errors_of("g(1);").as_slice(),
            [CompileError::UnknownFunction { .. }]
        );
        assert_matches!(
            errors_of("void f(string s) { } f(1);").as_slice(),
            [CompileError::NoMatchingOverload { name, arguments, .. }]
                if name == "f" && arguments == "integer"
        );
        assert_matches!(
            errors_of("integer f; f(1);").as_slice(),
            [CompileError::NotCallable { .. }]
        );
        assert_matches!(
            errors_of("[1](2);").as_slice(),
            [CompileError::NotCallable { .. }]
        );
    }

    #[test]
    fn reference_parameters_bind_places() {
        let src = "void inc(reference integer n) { } integer i; inc(i); inc(3);";
        assert_matches!(
            errors_of(src).as_slice(),
            [CompileError::NoMatchingOverload { .. }]
        );
    }

    #[test]
    fn methods() {
        let src = "
            class Counter {
                private integer n;
                static integer created;
                void bump() { n := n + 1; }
                integer twice() { bump(); bump(); return n; }
                static Counter make() { created := created + 1; return new Counter; }
            }
            Counter c := Counter.make();
            c.bump();
            c.twice();
        ";
        let result = analyze(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(type_of_last_statement(src), "integer");
    }

    #[test]
    fn method_errors() {
        let src = "
            class A {
                private void hidden() { }
                void open() { }
                static void make() { open(); }
            }
            A a; a.hidden(); a.missing(); A.open();
        ";
        let errors = errors_of(src);
        assert_matches!(
            errors.as_slice(),
            [
                CompileError::InstanceMemberInStaticContext { .. },
                CompileError::InaccessibleMember { .. },
                CompileError::UnknownField { .. },
                CompileError::InstanceMemberInStaticContext { .. },
            ]
        );
    }

    #[test]
    fn inherited_and_generic_methods() {
        let src = "
            class List[T] { T first() { return undefined; } }
            class Names extends List[string] { }
            Names n; n.first();
        ";
        assert_eq!(type_of_last_statement(src), "string");
    }

    #[test]
    fn methods_of_a_directly_instantiated_class() {
        let boxed = "
            class Box[T] {
                T value;
                T get() { return value; }
                void set(T v) { value := v; }
            }
            Box[string] b;
        ";
        assert_eq!(type_of_last_statement(&format!("{boxed} b.get();")), "string");
        assert_matches!(errors_of(&format!("{boxed} b.set(\"x\");")).as_slice(), []);
        assert_matches!(
            errors_of(&format!("{boxed} b.set(1);")).as_slice(),
            [CompileError::NoMatchingOverload { name, arguments, .. }]
                if name == "Box.set" && arguments == "integer"
        );
    }
}

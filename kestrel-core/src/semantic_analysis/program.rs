use crate::{
    build_config::BuildConfig,
    decoration::Decorations,
    semantic_analysis::{
        code_block::{type_check_body, type_check_statements},
        environment::Environment,
        expression::{check_store, type_check_expr},
        inheritance::check_inheritance,
        namespace::{ClassId, ClassLookup, DeclRegistry, FunctionId, ProgramDecls},
        overload::{check_function_overloads, check_method_overloads},
        resolve_type, TypeCheckContext,
    },
};

use kestrel_ast::{MethodDecl, Param, Program, TypeRef};
use kestrel_error::{error::CompileError, handler::Handler};
use kestrel_types::{Ident, Spanned};

/// The outcome of analysing one program.
#[derive(Debug)]
pub struct Analysis {
    pub decorations: Decorations,
    pub registry: DeclRegistry,
    classes_valid: bool,
    functions_valid: bool,
    statements_valid: bool,
}

impl Analysis {
    /// Whether every class, every function and every top-level statement is valid.
    pub fn is_valid(&self) -> bool {
        self.classes_valid && self.functions_valid && self.statements_valid
    }

    pub fn classes_valid(&self) -> bool {
        self.classes_valid
    }

    pub fn functions_valid(&self) -> bool {
        self.functions_valid
    }

    pub fn statements_valid(&self) -> bool {
        self.statements_valid
    }
}

/// Analyses `program`, reporting every semantic error to `handler`.
///
/// Declarations are checked before bodies: all signatures are resolved first,
/// then inheritance and overload sets, so bodies may use any declaration
/// regardless of where it appears.
pub fn analyze(handler: &Handler, program: &Program, config: &BuildConfig) -> Analysis {
    let registry = DeclRegistry::new(handler, program);
    let mut decorations = Decorations::new(program.classes.len());
    let mut class_valid = DeclRegistry::class_ids(program)
        .map(|id| {
            let decl = program.class_decl(id);
            let unique = !matches!(registry.lookup_class(&decl.name), ClassLookup::Ambiguous);
            check_generic_params(handler, &decl.generics) && unique
        })
        .collect::<Vec<_>>();
    let mut function_valid = vec![true; program.functions.len()];

    let (function_overloads_valid, statements_valid) = {
        let mut ctx = TypeCheckContext::from_program(program, &registry, &mut decorations, config);

        tracing::debug!("resolving declaration signatures");
        for id in DeclRegistry::class_ids(program) {
            class_valid[id.index()] &= resolve_class_signatures(handler, ctx.by_ref(), id);
        }
        for id in DeclRegistry::function_ids(program) {
            function_valid[id.index()] &= resolve_function_signature(handler, ctx.by_ref(), id);
        }

        tracing::debug!("validating inheritance");
        for id in DeclRegistry::class_ids(program) {
            class_valid[id.index()] &= check_inheritance(handler, ctx.by_ref(), id);
        }

        tracing::debug!("validating overload sets");
        let function_overloads_valid = check_function_overloads(handler, ctx.by_ref());
        for id in DeclRegistry::class_ids(program) {
            class_valid[id.index()] &= check_method_overloads(handler, ctx.by_ref(), id);
        }

        tracing::debug!("checking bodies");
        for id in DeclRegistry::class_ids(program) {
            class_valid[id.index()] &= type_check_class_body(handler, ctx.by_ref(), id);
        }
        for id in DeclRegistry::function_ids(program) {
            function_valid[id.index()] &= type_check_function(handler, ctx.by_ref(), id);
        }

        let statements_valid = type_check_statements(handler, &mut ctx, &program.statements);
        (function_overloads_valid, statements_valid)
    };

    for (class, valid) in program.classes.iter().zip(&class_valid) {
        decorations.set_valid(class.meta.id, *valid);
    }
    for (function, valid) in program.functions.iter().zip(&function_valid) {
        decorations.set_valid(function.meta.id, *valid);
    }
    let analysis = Analysis {
        decorations,
        registry,
        classes_valid: class_valid.iter().all(|valid| *valid),
        functions_valid: function_overloads_valid && function_valid.iter().all(|valid| *valid),
        statements_valid,
    };
    tracing::info!(
        "analysis finished: {} error(s), program is {}",
        handler.error_count(),
        if analysis.is_valid() { "valid" } else { "invalid" }
    );
    analysis
}

/// Type parameter names must be distinct within one class.
fn check_generic_params(handler: &Handler, generics: &[Ident]) -> bool {
    let mut valid = true;
    for (index, param) in generics.iter().enumerate() {
        if generics[..index].contains(param) {
            handler.emit_err(CompileError::DuplicateGenericParameter {
                name: param.clone(),
                span: param.span(),
            });
            valid = false;
        }
    }
    valid
}

fn resolve_all<'t>(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    types: impl IntoIterator<Item = &'t TypeRef>,
) -> bool {
    types
        .into_iter()
        .map(|ty| resolve_type(handler, ctx.by_ref(), ty).is_ok())
        .fold(true, |valid, ok| valid && ok)
}

fn signature_types<'t>(params: &'t [Param], return_type: &'t TypeRef) -> impl Iterator<Item = &'t TypeRef> {
    params.iter().map(|param| &param.ty).chain([return_type])
}

/// Resolves field types and method signatures in the type parameter context of the class.
fn resolve_class_signatures(handler: &Handler, ctx: TypeCheckContext, class: ClassId) -> bool {
    let decl = ctx.class_decl(class);
    let mut ctx = ctx.with_generics(&decl.generics);
    let fields_valid = resolve_all(handler, ctx.by_ref(), decl.fields.iter().map(|field| &field.ty));
    let methods_valid = decl
        .methods
        .iter()
        .map(|method| {
            resolve_all(
                handler,
                ctx.by_ref(),
                signature_types(&method.params, &method.return_type),
            )
        })
        .fold(true, |valid, ok| valid && ok);
    fields_valid && methods_valid
}

/// Operator functions see the type parameters of their owning class.
fn function_context(ctx: TypeCheckContext, function: FunctionId) -> TypeCheckContext {
    let decl = ctx.program().function_decl(function);
    let owner = decl
        .owner
        .as_ref()
        .and_then(|owner| match ctx.registry().lookup_class(owner) {
            ClassLookup::Found(id) => Some(id),
            ClassLookup::Missing | ClassLookup::Ambiguous => None,
        });
    match owner {
        Some(owner) => ctx.with_self_class(owner, false),
        None => ctx,
    }
}

fn resolve_function_signature(handler: &Handler, ctx: TypeCheckContext, function: FunctionId) -> bool {
    let decl = ctx.program().function_decl(function);
    let ctx = function_context(ctx, function);
    resolve_all(handler, ctx, signature_types(&decl.params, &decl.return_type))
}

/// Binds the parameters of a function or method.
fn parameter_env(handler: &Handler, ctx: &mut TypeCheckContext, params: &[Param]) -> (Environment, bool) {
    let mut env = Environment::new();
    let mut valid = true;
    for param in params {
        if env.contains(&param.name) {
            handler.emit_err(CompileError::VariableRedeclared {
                name: param.name.clone(),
                span: param.name.span(),
            });
            valid = false;
            continue;
        }
        let ty = resolve_type(handler, ctx.by_ref(), &param.ty);
        env.insert(param.name.clone(), ty);
    }
    (env, valid)
}

fn type_check_class_body(handler: &Handler, mut ctx: TypeCheckContext, class: ClassId) -> bool {
    let decl = ctx.class_decl(class);
    tracing::trace!("checking body of class {}", decl.name);
    let mut valid = true;
    for field in &decl.fields {
        let Some((kind, init)) = &field.init else {
            continue;
        };
        let mut field_ctx = ctx.by_ref().with_self_class(class, !field.is_static);
        let target = resolve_type(handler, field_ctx.by_ref(), &field.ty);
        let value = type_check_expr(handler, field_ctx.by_ref(), init);
        valid &= match (target, value) {
            (Ok(target), Ok(value)) => {
                check_store(handler, *kind, &target, field.name.as_str(), init, &value).is_ok()
            }
            _ => false,
        };
    }
    for method in &decl.methods {
        valid &= type_check_method(handler, ctx.by_ref(), class, method);
    }
    valid
}

fn type_check_method(
    handler: &Handler,
    ctx: TypeCheckContext,
    class: ClassId,
    method: &MethodDecl,
) -> bool {
    let mut ctx = ctx.with_self_class(class, !method.is_static);
    let (env, params_valid) = parameter_env(handler, &mut ctx, &method.params);
    let return_type = resolve_type(handler, ctx.by_ref(), &method.return_type);
    let ctx = ctx.with_env(env).with_return_type(return_type);
    let name = format!("{}.{}", ctx.class_decl(class).name, method.name);
    let body_valid = type_check_body(handler, ctx, &name, &method.body);
    params_valid && body_valid
}

fn type_check_function(handler: &Handler, ctx: TypeCheckContext, function: FunctionId) -> bool {
    let decl = ctx.program().function_decl(function);
    tracing::trace!("checking body of function {}", decl.name);
    let mut ctx = function_context(ctx, function);
    let (env, params_valid) = parameter_env(handler, &mut ctx, &decl.params);
    let return_type = resolve_type(handler, ctx.by_ref(), &decl.return_type);
    let ctx = ctx.with_env(env).with_return_type(return_type);
    let name = match decl.operator {
        Some(operator) => format!("operator {operator}"),
        None => decl.name.to_string(),
    };
    let body_valid = type_check_body(handler, ctx, &name, &decl.body);
    params_valid && body_valid
}

#[cfg(test)]
mod tests {
    use crate::test_utils::analyze;
    use assert_matches::assert_matches;
    use kestrel_error::error::CompileError;

    #[test]
    fn bodies_see_later_declarations() {
        let result = analyze(
            "integer twice(integer x) { return helper(x) * 2; }
             integer helper(integer x) { return x; }
             Later l := new Later;
             class Later { }",
        );
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.analysis.is_valid());
    }

    #[test]
    fn functions_see_parameters_only() {
        let result = analyze("integer g; integer f() { return g; }");
        assert_matches!(result.errors.as_slice(), [CompileError::UnknownVariable { .. }]);
        assert!(!result.analysis.functions_valid());
        assert!(result.analysis.statements_valid());
    }

    #[test]
    fn duplicate_parameters() {
        assert_matches!(
            analyze("void f(integer a, string a) { }").errors.as_slice(),
            [CompileError::VariableRedeclared { .. }]
        );
    }

    #[test]
    fn duplicate_generic_parameters() {
        let result = analyze("class Pair[T, T] { }");
        assert_matches!(
            result.errors.as_slice(),
            [CompileError::DuplicateGenericParameter { .. }]
        );
        assert!(!result.analysis.classes_valid());
    }

    #[test]
    fn redeclared_classes_are_invalid() {
        let result = analyze("class A { } class A { }");
        assert_matches!(result.errors.as_slice(), [CompileError::ClassRedeclared { .. }]);
        assert!(!result.analysis.classes_valid());
    }

    #[test]
    fn field_initialisers() {
        let result = analyze(
            "class C {
                integer a := 1;
                static integer s := 2;
                integer b := a + s;
                static integer t := a;
                string u := 3;
            }",
        );
        assert_matches!(
            result.errors.as_slice(),
            [
                CompileError::InstanceMemberInStaticContext { .. },
                CompileError::TypeError(_),
            ]
        );
    }

    #[test]
    fn operator_functions_see_class_generics() {
        let result = analyze(
            "class Box[T] {
                T value;
                Box[T] operator +(Box[T] a, Box[T] b) { return a; }
            }
            Box[integer] x; Box[integer] y := x + x;",
        );
        assert!(result.errors.is_empty(), "{:?}", result.errors);
    }
}

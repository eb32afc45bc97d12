//! Declarations that nothing in the program uses.

use crate::{
    build_config::BuildConfig,
    decoration::Decorations,
    semantic_analysis::{DeclId, DeclRegistry, ProgramDecls},
};

use kestrel_ast::Program;
use kestrel_error::{
    handler::Handler,
    warning::{CompileWarning, Warning},
};
use kestrel_types::Spanned;

/// Collects every free function, operator function, class and non-virtual
/// method whose usage counter is zero.
///
/// A warning is emitted for each one when enabled in `config`. Methods that
/// may be overridden are never reported, since calls can reach them through a
/// subclass.
pub fn report(
    handler: &Handler,
    program: &Program,
    decorations: &Decorations,
    config: &BuildConfig,
) -> Vec<DeclId> {
    let mut dead = Vec::new();
    let mut warn = |decl: DeclId, span, warning_content| {
        dead.push(decl);
        if config.dead_code_warnings {
            handler.emit_warn(CompileWarning {
                span,
                warning_content,
            });
        }
    };

    for id in DeclRegistry::function_ids(program) {
        let decl = DeclId::Function(id);
        if decorations.usage(decl) > 0 {
            continue;
        }
        let function = program.function_decl(id);
        let warning = match function.operator {
            Some(operator) => Warning::DeadOperator {
                name: format!("operator {operator}"),
            },
            None => Warning::DeadFunction {
                name: function.name.clone(),
            },
        };
        warn(decl, function.name.span(), warning);
    }

    for id in DeclRegistry::class_ids(program) {
        let class = program.class_decl(id);
        if decorations.usage(DeclId::Class(id)) == 0 {
            warn(
                DeclId::Class(id),
                class.name.span(),
                Warning::DeadClass {
                    name: class.name.clone(),
                },
            );
        }
        for (index, method) in class.methods.iter().enumerate() {
            let decl = DeclId::Method(id, index);
            if method.is_overridable() || decorations.usage(decl) > 0 {
                continue;
            }
            warn(
                decl,
                method.name.span(),
                Warning::DeadMethod {
                    class_name: class.name.clone(),
                    name: method.name.clone(),
                },
            );
        }
    }

    tracing::debug!("{} unused declaration(s)", dead.len());
    dead
}

#[cfg(test)]
mod tests {
    use crate::test_utils::analyze;
    use pretty_assertions::assert_eq;

    #[test]
    fn unused_declarations_are_reported() {
        let result = analyze(
            "class Used { void called() { } void idle() { } virtual void hook() { } }
             class Idle { }
             integer unused() { return 1; }
             Used u; u.called();",
        );
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let warnings = result
            .warnings
            .iter()
            .map(|w| w.warning_content.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            warnings,
            [
                "Function \"unused\" is never called.",
                "Method \"Used.idle\" is never called.",
                "Class \"Idle\" is never used.",
            ]
        );
        assert_eq!(result.dead.len(), 3);
    }

    #[test]
    fn operators_are_reported_by_symbol() {
        let result = analyze("class V { V operator -(V a) { return a; } } V v;");
        assert!(result
            .warnings
            .iter()
            .any(|w| w.warning_content.to_string() == "Operator \"operator -\" is never used."));
    }
}

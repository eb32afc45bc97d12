use crate::{
    semantic_analysis::{
        expression::{accepts, check_store, type_check_expr},
        resolve_type, TypeCheckContext,
    },
    type_system::Ty,
};

use kestrel_ast::{ElseBranch, Expr, ExprKind, IfStatement, ScopeBlock, Statement, StatementKind, UnaryOp, VarDecl};
use kestrel_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
    type_error::TypeError,
    warning::{CompileWarning, Warning},
};
use kestrel_types::{Ident, Spanned};

/// Checks the body of a function or method.
///
/// Parameters must already be bound in the environment of `ctx`. A body with a
/// non-void return type must contain at least one `return`.
pub(crate) fn type_check_body(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    name: &str,
    body: &ScopeBlock,
) -> bool {
    let mut valid = type_check_block(handler, ctx.by_ref(), body);
    if let Some(Ok(return_type)) = ctx.return_type() {
        if !return_type.is_void() && !body.contains_return() {
            handler.emit_err(CompileError::MissingReturn {
                name: name.to_string(),
                span: body.span(),
            });
            valid = false;
        }
    }
    valid
}

/// Checks a nested block in its own copy of the environment.
pub(crate) fn type_check_block(handler: &Handler, mut ctx: TypeCheckContext, block: &ScopeBlock) -> bool {
    let valid = type_check_statements(handler, &mut ctx, &block.statements);
    ctx.decorations.set_valid(block.meta.id, valid)
}

/// Checks a statement list, binding its declarations in `ctx` as they appear.
///
/// Every statement is checked even after an earlier one failed.
pub(crate) fn type_check_statements(
    handler: &Handler,
    ctx: &mut TypeCheckContext,
    statements: &[Statement],
) -> bool {
    let mut declared = Vec::new();
    let mut terminated = false;
    let mut valid = true;
    for statement in statements {
        if terminated {
            if ctx.config().unreachable_warnings {
                handler.emit_warn(CompileWarning {
                    span: statement.span(),
                    warning_content: Warning::UnreachableStatement,
                });
            }
            // Only the first unreachable statement of a block is reported.
            terminated = false;
        }
        let statement_valid = type_check_statement(handler, ctx, &mut declared, statement);
        valid &= ctx.decorations.set_valid(statement.id(), statement_valid);
        if statement.is_terminator() {
            terminated = true;
        }
    }
    valid
}

fn type_check_statement(
    handler: &Handler,
    ctx: &mut TypeCheckContext,
    declared: &mut Vec<Ident>,
    statement: &Statement,
) -> bool {
    match &statement.kind {
        StatementKind::VarDecl(decl) => type_check_var_decl(handler, ctx, declared, decl),
        StatementKind::Expr(expr) => {
            let valid = type_check_expr(handler, ctx.by_ref(), expr).is_ok();
            if !has_effect(expr) {
                handler.emit_err(CompileError::UnusedExpression { span: expr.span() });
                return false;
            }
            valid
        }
        StatementKind::If(if_statement) => type_check_if(handler, ctx.by_ref(), if_statement),
        StatementKind::While { condition, body } => {
            let condition_valid = type_check_condition(handler, ctx.by_ref(), condition);
            let body_valid = type_check_block(handler, ctx.by_ref().with_loop(), body);
            condition_valid && body_valid
        }
        StatementKind::Try {
            body,
            handler: catch,
        } => {
            let body_valid = type_check_block(handler, ctx.by_ref(), body);
            let catch_valid = type_check_block(handler, ctx.by_ref(), catch);
            body_valid && catch_valid
        }
        StatementKind::Return(value) => {
            type_check_return(handler, ctx.by_ref(), statement, value.as_ref()).is_ok()
        }
        StatementKind::Break | StatementKind::Continue => {
            if ctx.in_loop() {
                return true;
            }
            let keyword = match statement.kind {
                StatementKind::Break => "break",
                _ => "continue",
            };
            handler.emit_err(CompileError::JumpOutsideLoop {
                keyword,
                span: statement.span(),
            });
            false
        }
        StatementKind::Block(block) => type_check_block(handler, ctx.by_ref(), block),
    }
}

/// Only assignments, calls and `delete` may stand alone.
fn has_effect(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Assign { .. }
            | ExprKind::Call { .. }
            | ExprKind::Unary {
                op: UnaryOp::Delete,
                ..
            }
    )
}

fn type_check_var_decl(
    handler: &Handler,
    ctx: &mut TypeCheckContext,
    declared: &mut Vec<Ident>,
    decl: &VarDecl,
) -> bool {
    let ty = resolve_type(handler, ctx.by_ref(), &decl.ty);
    let mut valid = ty.is_ok();
    match (&decl.init, &ty) {
        (Some((kind, init)), _) => {
            // The initialiser can't see the variable it initialises.
            let value_ty = type_check_expr(handler, ctx.by_ref(), init);
            valid &= match (&ty, value_ty) {
                (Ok(ty), Ok(value_ty)) => {
                    check_store(handler, *kind, ty, decl.name.as_str(), init, &value_ty).is_ok()
                }
                _ => false,
            };
        }
        (None, Ok(ty)) if ty.is_const() => {
            handler.emit_err(CompileError::ConstWithoutInitializer {
                name: decl.name.clone(),
                span: decl.name.span(),
            });
            valid = false;
        }
        (None, Ok(ty)) if ty.is_reference() => {
            handler.emit_err(CompileError::ReferenceWithoutInitializer {
                name: decl.name.clone(),
                span: decl.name.span(),
            });
            valid = false;
        }
        (None, _) => {}
    }
    if declared.contains(&decl.name) {
        handler.emit_err(CompileError::VariableRedeclared {
            name: decl.name.clone(),
            span: decl.name.span(),
        });
        return false;
    }
    declared.push(decl.name.clone());
    ctx.env_mut().insert(decl.name.clone(), ty);
    valid
}

fn type_check_condition(handler: &Handler, ctx: TypeCheckContext, condition: &Expr) -> bool {
    let Ok(ty) = type_check_expr(handler, ctx, condition) else {
        return false;
    };
    if ty.decay().is_boolean() {
        return true;
    }
    handler.emit_err(CompileError::TypeError(TypeError::NonBooleanCondition {
        received: ty.to_string(),
        span: condition.span(),
    }));
    false
}

fn type_check_if(handler: &Handler, mut ctx: TypeCheckContext, if_statement: &IfStatement) -> bool {
    let condition_valid = type_check_condition(handler, ctx.by_ref(), &if_statement.condition);
    let then_valid = type_check_block(handler, ctx.by_ref(), &if_statement.then_block);
    let else_valid = match &if_statement.else_branch {
        Some(ElseBranch::Block(block)) => type_check_block(handler, ctx.by_ref(), block),
        Some(ElseBranch::If(nested)) => type_check_if(handler, ctx.by_ref(), nested),
        None => true,
    };
    condition_valid && then_valid && else_valid
}

fn type_check_return(
    handler: &Handler,
    mut ctx: TypeCheckContext,
    statement: &Statement,
    value: Option<&Expr>,
) -> Result<(), ErrorEmitted> {
    let value_ty = value.map(|value| type_check_expr(handler, ctx.by_ref(), value));
    let return_type: Ty = match ctx.return_type() {
        None => {
            return Err(handler.emit_err(CompileError::ReturnOutsideFunction {
                span: statement.span(),
            }))
        }
        Some(return_type) => return_type.clone()?,
    };
    match (value, value_ty) {
        (None, _) if return_type.is_void() => Ok(()),
        (None, _) => Err(handler.emit_err(CompileError::MissingReturnValue {
            expected: return_type.to_string(),
            span: statement.span(),
        })),
        (Some(_), _) if return_type.is_void() => {
            Err(handler.emit_err(CompileError::ReturnValueInVoidFunction {
                span: statement.span(),
            }))
        }
        (Some(value), Some(value_ty)) => {
            let value_ty = value_ty?;
            if accepts(&return_type, &value_ty, value) {
                return Ok(());
            }
            Err(handler.emit_err(CompileError::TypeError(TypeError::MismatchedType {
                expected: return_type.to_string(),
                received: value_ty.to_string(),
                help_text: String::new(),
                span: value.span(),
            })))
        }
        (Some(_), None) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{analyze, errors_of, errors_of_program, parse};
    use assert_matches::assert_matches;
    use kestrel_ast::StatementKind;
    use kestrel_error::{error::CompileError, type_error::TypeError, warning::Warning};
    use pretty_assertions::assert_eq;

    #[test]
    fn inner_declarations_do_not_leak() {
        assert_matches!(
            errors_of("if (true) { integer x := 1; } x := 2;").as_slice(),
            [CompileError::UnknownVariable { .. }]
        );
    }

    #[test]
    fn redeclaration_and_shadowing() {
        assert_matches!(
            errors_of("integer x; string x;").as_slice(),
            [CompileError::VariableRedeclared { .. }]
        );
        assert_matches!(errors_of("integer x; { string x := \"s\"; }").as_slice(), []);
    }

    #[test]
    fn initialiser_does_not_see_its_variable() {
        assert_matches!(
            errors_of("integer x := x;").as_slice(),
            [CompileError::UnknownVariable { .. }]
        );
    }

    #[test]
    fn declarations_needing_initialisers() {
        assert_matches!(
            errors_of("const integer x;").as_slice(),
            [CompileError::ConstWithoutInitializer { .. }]
        );
        assert_matches!(
            errors_of("reference integer r;").as_slice(),
            [CompileError::ReferenceWithoutInitializer { .. }]
        );
    }

    #[test]
    fn conditions_must_be_boolean() {
        assert_matches!(
            errors_of("integer i; if (i) { } while (i > 0) { i := i - 1; }").as_slice(),
            [CompileError::TypeError(TypeError::NonBooleanCondition { received, .. })]
                if received == "integer"
        );
    }

    #[test]
    fn jumps_need_a_loop() {
        assert_matches!(
            errors_of("while (true) { if (false) { break; } continue; }").as_slice(),
            []
        );

        // The parser rejects a top-level `break`, so lift one out of its loop.
        let mut program = parse("while (true) { break; }");
        let StatementKind::While { body, .. } = program.statements.remove(0).kind else {
            panic!("expected a loop");
        };
        program.statements.extend(body.statements);
        assert_matches!(
            errors_of_program(&program).as_slice(),
            [CompileError::JumpOutsideLoop { keyword: "break", .. }]
        );
    }

    #[test]
    fn returns() {
        let mut program = parse("integer f() { return 1; }");
        let body = program.functions.remove(0).body;
        program.statements.extend(body.statements);
        assert_matches!(
            errors_of_program(&program).as_slice(),
            [CompileError::ReturnOutsideFunction { .. }]
        );
        assert_matches!(
            errors_of("void f() { return 1; }").as_slice(),
            [CompileError::ReturnValueInVoidFunction { .. }]
        );
        assert_matches!(
            errors_of("integer f() { return; }").as_slice(),
            [CompileError::MissingReturnValue { .. }]
        );
        assert_matches!(
            errors_of("integer f() { return \"s\"; }").as_slice(),
            [CompileError::TypeError(TypeError::MismatchedType { .. })]
        );
        assert_matches!(
            errors_of("integer f(boolean b) { if (b) { return 1; } }").as_slice(),
            []
        );
        assert_matches!(
            errors_of("integer f() { integer x := 1; }").as_slice(),
            [CompileError::MissingReturn { name, .. }] if name == "f"
        );
        assert_matches!(
            errors_of("double f() { return 1; }").as_slice(),
            []
        );
    }

    #[test]
    fn unreachable_statements_warn_once_per_block() {
        let result = analyze("void f() { return; integer x; integer y; }");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let unreachable = result
            .warnings
            .iter()
            .filter(|w| w.warning_content == Warning::UnreachableStatement)
            .count();
        assert_eq!(unreachable, 1);
    }

    #[test]
    fn statement_validity_is_recorded() {
        let result = analyze("integer a := 1; a := \"s\";");
        let decorations = &result.analysis.decorations;
        let statements = &result.program.statements;
        assert_eq!(decorations.validity(statements[0].id()), Some(true));
        assert_eq!(decorations.validity(statements[1].id()), Some(false));
        assert!(!result.analysis.is_valid());
    }
}

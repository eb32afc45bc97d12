//! Source rendering of syntax nodes.
//!
//! Every binary, unary and allocation expression is parenthesized, so the
//! output parses back to a structurally equal tree.

use crate::priv_prelude::*;

const INDENT: &str = "    ";

fn comma_separated<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut write_item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_item(f, item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Ident(name) => write!(f, "{name}"),
            ExprKind::This => f.write_str("this"),
            ExprKind::Literal(literal) => write!(f, "{literal}"),
            ExprKind::List(elems) => {
                f.write_str("[")?;
                comma_separated(f, elems, |f, elem| write!(f, "{elem}"))?;
                f.write_str("]")
            }
            ExprKind::Keymap(pairs) => {
                f.write_str("{")?;
                comma_separated(f, pairs, |f, pair| write!(f, "{}: {}", pair.key, pair.value))?;
                f.write_str("}")
            }
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::Unary { op, operand } if op.is_word() => write!(f, "({op} {operand})"),
            ExprKind::Unary { op, operand } => write!(f, "({op}{operand})"),
            ExprKind::New { ty } => write!(f, "(new {ty})"),
            ExprKind::Member {
                target,
                access,
                name,
            } => write!(f, "{target}{}{name}", access.symbol()),
            ExprKind::Index { target, index } => write!(f, "{target}[{index}]"),
            ExprKind::Call { callee, args } => {
                write!(f, "{callee}(")?;
                comma_separated(f, args, |f, arg| write!(f, "{arg}"))?;
                f.write_str(")")
            }
            ExprKind::Assign {
                kind,
                target,
                value,
            } => write!(f, "{target} {} {value}", kind.symbol()),
        }
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &ScopeBlock, depth: usize) -> fmt::Result {
    f.write_str("{\n")?;
    for statement in &block.statements {
        write_statement(f, statement, depth + 1)?;
    }
    write_indent(f, depth)?;
    f.write_str("}")
}

fn write_init(f: &mut fmt::Formatter<'_>, init: &Option<(AssignKind, Expr)>) -> fmt::Result {
    match init {
        Some((kind, value)) => write!(f, " {} {value}", kind.symbol()),
        None => Ok(()),
    }
}

fn write_if(f: &mut fmt::Formatter<'_>, if_statement: &IfStatement, depth: usize) -> fmt::Result {
    write!(f, "if ({}) ", if_statement.condition)?;
    write_block(f, &if_statement.then_block, depth)?;
    match &if_statement.else_branch {
        Some(ElseBranch::Block(block)) => {
            f.write_str(" else ")?;
            write_block(f, block, depth)
        }
        Some(ElseBranch::If(nested)) => {
            f.write_str(" else ")?;
            write_if(f, nested, depth)
        }
        None => Ok(()),
    }
}

fn write_statement(f: &mut fmt::Formatter<'_>, statement: &Statement, depth: usize) -> fmt::Result {
    write_indent(f, depth)?;
    match &statement.kind {
        StatementKind::VarDecl(decl) => {
            write!(f, "{} {}", decl.ty, decl.name)?;
            write_init(f, &decl.init)?;
            f.write_str(";")?;
        }
        StatementKind::Expr(expr) => write!(f, "{expr};")?,
        StatementKind::If(if_statement) => write_if(f, if_statement, depth)?,
        StatementKind::While { condition, body } => {
            write!(f, "while ({condition}) ")?;
            write_block(f, body, depth)?;
        }
        StatementKind::Try { body, handler } => {
            f.write_str("try ")?;
            write_block(f, body, depth)?;
            f.write_str(" catch ")?;
            write_block(f, handler, depth)?;
        }
        StatementKind::Return(Some(value)) => write!(f, "return {value};")?,
        StatementKind::Return(None) => f.write_str("return;")?,
        StatementKind::Break => f.write_str("break;")?,
        StatementKind::Continue => f.write_str("continue;")?,
        StatementKind::Block(block) => write_block(f, block, depth)?,
    }
    f.write_str("\n")
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Param]) -> fmt::Result {
    f.write_str("(")?;
    comma_separated(f, params, |f, param| write!(f, "{} {}", param.ty, param.name))?;
    f.write_str(")")
}

fn write_function(f: &mut fmt::Formatter<'_>, function: &FunctionDecl, depth: usize) -> fmt::Result {
    write_indent(f, depth)?;
    match function.operator {
        Some(operator) => write!(f, "{} operator {operator}", function.return_type)?,
        None => write!(f, "{} {}", function.return_type, function.name)?,
    }
    write_params(f, &function.params)?;
    f.write_str(" ")?;
    write_block(f, &function.body, depth)?;
    f.write_str("\n")
}

fn write_class(
    f: &mut fmt::Formatter<'_>,
    class: &ClassDecl,
    operators: &[&FunctionDecl],
) -> fmt::Result {
    write!(f, "class {}", class.name)?;
    if class.is_generic() {
        f.write_str("[")?;
        comma_separated(f, &class.generics, |f, name| write!(f, "{name}"))?;
        f.write_str("]")?;
    }
    if let Some(superclass) = &class.superclass {
        write!(f, " extends {superclass}")?;
    }
    f.write_str(" {\n")?;
    for field in &class.fields {
        write_indent(f, 1)?;
        f.write_str(field.access.as_str())?;
        if field.is_static {
            f.write_str(" static")?;
        }
        write!(f, " {} {}", field.ty, field.name)?;
        write_init(f, &field.init)?;
        f.write_str(";\n")?;
    }
    for method in &class.methods {
        write_indent(f, 1)?;
        f.write_str(method.access.as_str())?;
        if method.is_static {
            f.write_str(" static")?;
        }
        if method.is_virtual {
            f.write_str(" virtual")?;
        }
        if method.is_overload {
            f.write_str(" overload")?;
        }
        write!(f, " {} {}", method.return_type, method.name)?;
        write_params(f, &method.params)?;
        f.write_str(" ")?;
        write_block(f, &method.body, 1)?;
        f.write_str("\n")?;
    }
    for operator in operators {
        write_function(f, operator, 1)?;
    }
    f.write_str("}\n")
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

impl fmt::Display for ScopeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_function(f, self, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            let operators = self
                .functions
                .iter()
                .filter(|function| function.owner.as_ref() == Some(&class.name))
                .collect::<Vec<_>>();
            write_class(f, class, &operators)?;
        }
        for function in self.functions.iter().filter(|function| function.owner.is_none()) {
            write_function(f, function, 0)?;
        }
        for statement in &self.statements {
            write_statement(f, statement, 0)?;
        }
        Ok(())
    }
}

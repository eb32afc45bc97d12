use crate::priv_prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDecl {
    pub ty: TypeRef,
    pub name: Ident,
    pub init: Option<(AssignKind, Expr)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStatement {
    pub condition: Expr,
    pub then_block: ScopeBlock,
    pub else_branch: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ElseBranch {
    Block(ScopeBlock),
    If(Box<IfStatement>),
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatementKind {
    VarDecl(VarDecl),
    Expr(Expr),
    If(IfStatement),
    While { condition: Expr, body: ScopeBlock },
    Try { body: ScopeBlock, handler: ScopeBlock },
    Return(Option<Expr>),
    Break,
    Continue,
    Block(ScopeBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub meta: NodeMeta,
    pub kind: StatementKind,
}

impl Statement {
    pub fn id(&self) -> NodeId {
        self.meta.id
    }

    /// Whether control never falls through to the next statement of the same block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::Return(_) | StatementKind::Break | StatementKind::Continue
        )
    }
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}

/// A braced statement list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeBlock {
    pub meta: NodeMeta,
    pub statements: Vec<Statement>,
    /// Indices into `statements` of the local variable declarations.
    pub locals: Vec<usize>,
}

impl ScopeBlock {
    pub fn new(meta: NodeMeta, statements: Vec<Statement>) -> ScopeBlock {
        let locals = statements
            .iter()
            .enumerate()
            .filter(|(_, statement)| matches!(statement.kind, StatementKind::VarDecl(_)))
            .map(|(i, _)| i)
            .collect();
        ScopeBlock {
            meta,
            statements,
            locals,
        }
    }

    pub fn local_decls(&self) -> impl Iterator<Item = &VarDecl> {
        self.locals
            .iter()
            .filter_map(|&i| match &self.statements.get(i)?.kind {
                StatementKind::VarDecl(decl) => Some(decl),
                _ => None,
            })
    }

    /// Whether any statement in this block, at any depth, is a `return`.
    pub fn contains_return(&self) -> bool {
        self.statements.iter().any(|statement| match &statement.kind {
            StatementKind::Return(_) => true,
            StatementKind::If(if_statement) => if_statement.contains_return(),
            StatementKind::While { body, .. } | StatementKind::Block(body) => {
                body.contains_return()
            }
            StatementKind::Try { body, handler } => {
                body.contains_return() || handler.contains_return()
            }
            StatementKind::VarDecl(_)
            | StatementKind::Expr(_)
            | StatementKind::Break
            | StatementKind::Continue => false,
        })
    }
}

impl IfStatement {
    fn contains_return(&self) -> bool {
        self.then_block.contains_return()
            || match &self.else_branch {
                Some(ElseBranch::Block(block)) => block.contains_return(),
                Some(ElseBranch::If(nested)) => nested.contains_return(),
                None => false,
            }
    }
}

impl Spanned for ScopeBlock {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}

use crate::priv_prelude::*;

pub mod op;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssignKind {
    /// `:=`, copies into existing storage.
    Value,
    /// `=`, rebinds a reference.
    Reference,
}

impl AssignKind {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignKind::Value => ":=",
            AssignKind::Reference => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberAccess {
    Dot,
    Arrow,
}

impl MemberAccess {
    pub fn symbol(self) -> &'static str {
        match self {
            MemberAccess::Dot => ".",
            MemberAccess::Arrow => "->",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeymapPair {
    pub meta: NodeMeta,
    pub key: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub meta: NodeMeta,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Ident(Ident),
    This,
    Literal(Literal),
    List(Vec<Expr>),
    Keymap(Vec<KeymapPair>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    New {
        ty: TypeRef,
    },
    Member {
        target: Box<Expr>,
        access: MemberAccess,
        name: Ident,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Assign {
        kind: AssignKind,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        self.meta.id
    }

    /// Identifiers, `this`, member and index accesses denote storage.
    pub fn is_place(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. } | ExprKind::This
        )
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self.kind, ExprKind::Assign { .. })
    }

    /// Visits the meta of this node and of every node below it, types included.
    pub fn for_each_meta_mut(&mut self, f: &mut impl FnMut(&mut NodeMeta)) {
        f(&mut self.meta);
        match &mut self.kind {
            ExprKind::Ident(_) | ExprKind::This | ExprKind::Literal(_) => {}
            ExprKind::List(elems) => {
                for elem in elems {
                    elem.for_each_meta_mut(f);
                }
            }
            ExprKind::Keymap(pairs) => {
                for pair in pairs {
                    f(&mut pair.meta);
                    pair.key.for_each_meta_mut(f);
                    pair.value.for_each_meta_mut(f);
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.for_each_meta_mut(f);
                rhs.for_each_meta_mut(f);
            }
            ExprKind::Unary { operand, .. } => operand.for_each_meta_mut(f),
            ExprKind::New { ty } => ty.for_each_meta_mut(f),
            ExprKind::Member { target, .. } => target.for_each_meta_mut(f),
            ExprKind::Index { target, index } => {
                target.for_each_meta_mut(f);
                index.for_each_meta_mut(f);
            }
            ExprKind::Call { callee, args } => {
                callee.for_each_meta_mut(f);
                for arg in args {
                    arg.for_each_meta_mut(f);
                }
            }
            ExprKind::Assign { target, value, .. } => {
                target.for_each_meta_mut(f);
                value.for_each_meta_mut(f);
            }
        }
    }
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}

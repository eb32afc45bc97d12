pub mod expr;
pub mod item;
pub mod keywords;
pub mod literal;
pub mod node;
mod printer;
mod priv_prelude;
pub mod program;
pub mod statement;
pub mod token;
pub mod ty;

pub use crate::{
    expr::{
        op::{BinaryCategory, BinaryOp, OperatorName, UnaryCategory, UnaryOp},
        AssignKind, Expr, ExprKind, KeymapPair, MemberAccess,
    },
    item::{Access, ClassDecl, FieldDecl, FunctionDecl, MethodDecl, Param},
    keywords::Keyword,
    literal::Literal,
    node::{NodeId, NodeMeta},
    program::Program,
    statement::{ElseBranch, IfStatement, ScopeBlock, Statement, StatementKind, VarDecl},
    token::{PunctKind, Token, TokenKind, TokenStream},
    ty::{Modifiers, PrimitiveKind, TypeCategory, TypeKind, TypeRef},
};

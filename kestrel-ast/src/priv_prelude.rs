pub use {
    crate::{
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
        ty::{Modifiers, PrimitiveKind, TypeKind, TypeRef},
    },
    kestrel_types::{Ident, Span, Spanned},
    num_bigint::BigUint,
    serde::Serialize,
    std::fmt,
};

use kestrel_types::{Span, Spanned};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    #[error("Expected a statement.")]
    ExpectedStatement,
    #[error("Expected an expression.")]
    ExpectedExpression,
    #[error("Expected an identifier.")]
    ExpectedIdent,
    #[error("Expected a type.")]
    ExpectedType,
    #[error("Expected `{expected}`, found `{found}`.")]
    ExpectedToken { expected: String, found: String },
    #[error("Expected a comma or closing parenthesis in the argument list.")]
    ExpectedCommaOrCloseParen,
    #[error("Expected a comma or closing bracket.")]
    ExpectedCommaOrCloseBracket,
    #[error("Expected a comma or closing brace in this keymap literal.")]
    ExpectedCommaOrCloseBrace,
    #[error("Expected a class member declaration.")]
    ExpectedClassMember,
    #[error("Expected an overloadable operator.")]
    ExpectedOperator,
    #[error("Modifier `{modifier}` appears more than once.")]
    DuplicateModifier { modifier: &'static str },
    #[error("This expression cannot be assigned to.")]
    UnassignableExpression,
    #[error("Assignments are not allowed inside another expression.")]
    NestedAssignment,
    #[error("`{keyword}` may only be used inside a loop.")]
    OutsideLoop { keyword: &'static str },
    #[error("`return` may only be used inside a function.")]
    ReturnOutsideFunction,
    #[error("Functions may only be declared at program level or inside a class.")]
    MisplacedFunctionDeclaration,
    #[error("Classes may only be declared at program level or inside a class.")]
    MisplacedClassDeclaration,
    #[error("`{keyword}` is not allowed directly inside a class body.")]
    StatementInClassBody { keyword: &'static str },
    #[error("Allocation operators cannot be stacked.")]
    StackedAllocation,
    #[error("`void` is only allowed as a function return type.")]
    MisplacedVoid,
    #[error("Operator `{operator}` takes {expected} parameter(s).")]
    OperatorArity {
        operator: String,
        expected: &'static str,
    },
    #[error("`{modifier}` cannot be applied to {member}.")]
    MisplacedModifier {
        modifier: &'static str,
        member: &'static str,
    },
    #[error("Unexpected end of input.")]
    UnexpectedEof,
    #[error("Unexpected token after the end of the program.")]
    UnexpectedTrailingToken,
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Hash)]
#[error("{}", kind)]
pub struct ParseError {
    pub span: Span,
    pub kind: ParseErrorKind,
}

impl Spanned for ParseError {
    fn span(&self) -> Span {
        self.span.clone()
    }
}

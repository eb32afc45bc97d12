use crate::lex_error::LexError;
use crate::parser_error::ParseError;
use crate::type_error::TypeError;

use kestrel_types::{Ident, Span, Spanned};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompileError {
    #[error("{error}")]
    Lex { error: LexError },
    #[error("{error}")]
    Parse { error: ParseError },
    #[error("{0}")]
    TypeError(TypeError),

    // Type references.
    #[error("Could not find type \"{name}\" in this scope.")]
    UnknownType { name: Ident, span: Span },
    #[error("Class \"{name}\" is declared more than once.")]
    ClassRedeclared { name: Ident, span: Span },
    #[error("Type \"{name}\" is ambiguous: more than one class has this name.")]
    AmbiguousType { name: Ident, span: Span },
    #[error("Class \"{name}\" is not generic and does not take type arguments.")]
    NotGeneric { name: Ident, span: Span },
    #[error("Generic class \"{name}\" needs {expected} type argument(s).")]
    MissingTypeArguments {
        name: Ident,
        expected: usize,
        span: Span,
    },
    #[error("\"{name}\" expects {expected} type argument(s), but {given} were provided.")]
    IncorrectNumberOfTypeArguments {
        name: Ident,
        given: usize,
        expected: usize,
        span: Span,
    },
    #[error("`{collection}` expects {expected} type argument(s), but {given} were provided.")]
    BadCollectionArity {
        collection: &'static str,
        given: usize,
        expected: usize,
        span: Span,
    },
    #[error("Generic parameter \"{name}\" is declared more than once.")]
    DuplicateGenericParameter { name: Ident, span: Span },

    // Inheritance.
    #[error("Class \"{class_name}\" extends \"{superclass}\", which does not exist.")]
    UnknownSuperclass {
        class_name: Ident,
        superclass: Ident,
        span: Span,
    },
    #[error("Class \"{class_name}\" is part of an inheritance cycle.")]
    InheritanceCycle { class_name: Ident, span: Span },
    #[error("Class \"{class_name}\" extends \"{superclass}\", which is itself invalid.")]
    InvalidSuperclass {
        class_name: Ident,
        superclass: Ident,
        span: Span,
    },
    #[error("Superclass \"{superclass}\" of \"{class_name}\" must be a plain or generic class type.")]
    SuperclassNotAClass {
        class_name: Ident,
        superclass: String,
        span: Span,
    },
    #[error("Field \"{name}\" of \"{class_name}\" redeclares a field inherited from \"{ancestor}\".")]
    FieldRedeclared {
        class_name: Ident,
        name: Ident,
        ancestor: Ident,
        span: Span,
    },
    #[error("Member \"{name}\" is declared more than once in class \"{class_name}\".")]
    MemberRedeclared {
        class_name: Ident,
        name: Ident,
        span: Span,
    },
    #[error("Method \"{name}\" cannot be both private and virtual.")]
    PrivateVirtual { name: Ident, span: Span },
    #[error("Method \"{name}\" is marked `overload`, but class \"{class_name}\" has no superclass.")]
    OverloadInRootClass {
        class_name: Ident,
        name: Ident,
        span: Span,
    },
    #[error("Method \"{name}\" is marked `overload`, but it matches no inherited virtual method.")]
    OverloadWithoutVirtual { name: Ident, span: Span },
    #[error("Method \"{name}\" cannot be marked both `overload` and `virtual`.")]
    OverloadAlsoVirtual { name: Ident, span: Span },
    #[error("Method \"{name}\" must keep the access level `{expected}` of the method it overloads, found `{found}`.")]
    OverloadAccessMismatch {
        name: Ident,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
    #[error("Method \"{name}\" must keep the return type `{expected}` of the method it overloads, found `{found}`.")]
    OverloadReturnTypeMismatch {
        name: Ident,
        expected: String,
        found: String,
        span: Span,
    },

    // Overload sets.
    #[error("\"{name}\" is declared more than once with the signature ({signature}).")]
    DuplicateOverload {
        name: String,
        signature: String,
        span: Span,
    },
    #[error("Static method \"{name}\" must be public.")]
    StaticMethodNotPublic { name: Ident, span: Span },
    #[error("Static method \"{name}\" cannot be virtual.")]
    StaticMethodVirtual { name: Ident, span: Span },
    #[error("Static method \"{name}\" cannot be marked `overload`.")]
    StaticMethodOverload { name: Ident, span: Span },

    // Names and scopes.
    #[error("Variable \"{name}\" does not exist in this scope.")]
    UnknownVariable { name: Ident, span: Span },
    #[error("Variable \"{name}\" is already declared in this block.")]
    VariableRedeclared { name: Ident, span: Span },
    #[error("`this` can only be used inside an instance method.")]
    ThisOutsideInstanceMethod { span: Span },
    #[error("\"{name}\" is a class, not a value.")]
    ClassNameAsValue { name: Ident, span: Span },
    #[error("Instance member \"{name}\" cannot be used from a static context.")]
    InstanceMemberInStaticContext { name: Ident, span: Span },

    // Expressions.
    #[error("Operator `{operator}` is not supported for {operands}.")]
    UnsupportedOperator {
        operator: String,
        operands: String,
        span: Span,
    },
    #[error("Value assignment `:=` cannot target the reference \"{target}\"; use `=`.")]
    ValueAssignmentToReference { target: String, span: Span },
    #[error("Reference assignment `=` needs a reference target, found \"{target}\"; use `:=`.")]
    ReferenceAssignmentToValue { target: String, span: Span },
    #[error("Cannot assign to constant \"{target}\".")]
    AssignmentToConst { target: String, span: Span },
    #[error("Constant \"{name}\" must be initialized where it is declared.")]
    ConstWithoutInitializer { name: Ident, span: Span },
    #[error("Reference \"{name}\" must be bound where it is declared.")]
    ReferenceWithoutInitializer { name: Ident, span: Span },
    #[error("A reference can only be bound to a variable, field, element or another reference.")]
    ReferenceNeedsPlace { span: Span },
    #[error("Class \"{class_name}\" has no member named \"{name}\".")]
    UnknownField {
        class_name: String,
        name: Ident,
        span: Span,
    },
    #[error("Member \"{name}\" of \"{class_name}\" is {access} and cannot be accessed here.")]
    InaccessibleMember {
        class_name: Ident,
        name: Ident,
        access: &'static str,
        span: Span,
    },
    #[error("`->` needs a reference on its left-hand side, found `{ty}`.")]
    ArrowOnNonReference { ty: String, span: Span },
    #[error("Type `{ty}` has no members.")]
    MemberAccessOnNonClass { ty: String, span: Span },
    #[error("Could not find function \"{name}\" in this scope.")]
    UnknownFunction { name: Ident, span: Span },
    #[error("No declaration of \"{name}\" accepts the arguments ({arguments}).")]
    NoMatchingOverload {
        name: String,
        arguments: String,
        span: Span,
    },
    #[error("This expression cannot be called.")]
    NotCallable { span: Span },
    #[error("Type `{ty}` cannot be indexed.")]
    NotIndexable { ty: String, span: Span },
    #[error("`new` can only allocate class instances, found `{ty}`.")]
    NewOfNonClass { ty: String, span: Span },
    #[error("`delete` can only release class instances, found `{ty}`.")]
    DeleteOfNonClass { ty: String, span: Span },
    #[error("This expression has no effect; only assignments, calls and `delete` may stand alone.")]
    UnusedExpression { span: Span },

    // Control flow.
    #[error("`{keyword}` can only be used inside a loop.")]
    JumpOutsideLoop { keyword: &'static str, span: Span },
    #[error("`return` can only be used inside a function.")]
    ReturnOutsideFunction { span: Span },
    #[error("This function must return a value of type `{expected}`.")]
    MissingReturnValue { expected: String, span: Span },
    #[error("A function returning `void` cannot return a value.")]
    ReturnValueInVoidFunction { span: Span },
    #[error("Function \"{name}\" declares a return type but never returns.")]
    MissingReturn { name: String, span: Span },
}

impl Spanned for CompileError {
    fn span(&self) -> Span {
        use CompileError::*;
        match self {
            Lex { error } => error.span(),
            Parse { error } => error.span(),
            TypeError(err) => err.span(),
            UnknownType { span, .. }
            | ClassRedeclared { span, .. }
            | AmbiguousType { span, .. }
            | NotGeneric { span, .. }
            | MissingTypeArguments { span, .. }
            | IncorrectNumberOfTypeArguments { span, .. }
            | BadCollectionArity { span, .. }
            | DuplicateGenericParameter { span, .. }
            | UnknownSuperclass { span, .. }
            | InheritanceCycle { span, .. }
            | InvalidSuperclass { span, .. }
            | SuperclassNotAClass { span, .. }
            | FieldRedeclared { span, .. }
            | MemberRedeclared { span, .. }
            | PrivateVirtual { span, .. }
            | OverloadInRootClass { span, .. }
            | OverloadWithoutVirtual { span, .. }
            | OverloadAlsoVirtual { span, .. }
            | OverloadAccessMismatch { span, .. }
            | OverloadReturnTypeMismatch { span, .. }
            | DuplicateOverload { span, .. }
            | StaticMethodNotPublic { span, .. }
            | StaticMethodVirtual { span, .. }
            | StaticMethodOverload { span, .. }
            | UnknownVariable { span, .. }
            | VariableRedeclared { span, .. }
            | ThisOutsideInstanceMethod { span }
            | ClassNameAsValue { span, .. }
            | InstanceMemberInStaticContext { span, .. }
            | UnsupportedOperator { span, .. }
            | ValueAssignmentToReference { span, .. }
            | ReferenceAssignmentToValue { span, .. }
            | AssignmentToConst { span, .. }
            | ConstWithoutInitializer { span, .. }
            | ReferenceWithoutInitializer { span, .. }
            | ReferenceNeedsPlace { span }
            | UnknownField { span, .. }
            | InaccessibleMember { span, .. }
            | ArrowOnNonReference { span, .. }
            | MemberAccessOnNonClass { span, .. }
            | UnknownFunction { span, .. }
            | NoMatchingOverload { span, .. }
            | NotCallable { span }
            | NotIndexable { span, .. }
            | NewOfNonClass { span, .. }
            | DeleteOfNonClass { span, .. }
            | UnusedExpression { span }
            | JumpOutsideLoop { span, .. }
            | ReturnOutsideFunction { span }
            | MissingReturnValue { span, .. }
            | ReturnValueInVoidFunction { span }
            | MissingReturn { span, .. } => span.clone(),
        }
    }
}

impl From<TypeError> for CompileError {
    fn from(other: TypeError) -> CompileError {
        CompileError::TypeError(other)
    }
}

impl From<LexError> for CompileError {
    fn from(error: LexError) -> CompileError {
        CompileError::Lex { error }
    }
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> CompileError {
        CompileError::Parse { error }
    }
}

impl CompileError {
    /// `path:line:col` of the start of this error, or `line:col` when the source has no path.
    pub fn location(&self) -> String {
        location_string(&self.span())
    }
}

pub fn location_string(span: &Span) -> String {
    let pos = span.start_pos();
    match span.path() {
        Some(path) => format!("{}:{}", path.display(), pos),
        None => pos.to_string(),
    }
}

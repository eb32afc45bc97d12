use core::fmt;

use kestrel_types::{Ident, Span, Spanned};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompileWarning {
    pub span: Span,
    pub warning_content: Warning,
}

impl Spanned for CompileWarning {
    fn span(&self) -> Span {
        self.span.clone()
    }
}

impl CompileWarning {
    pub fn to_friendly_warning_string(&self) -> String {
        self.warning_content.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Warning {
    UnreachableStatement,
    DeadFunction { name: Ident },
    DeadOperator { name: String },
    DeadClass { name: Ident },
    DeadMethod { class_name: Ident, name: Ident },
    MethodShadowsVirtual { class_name: Ident, name: Ident },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Warning::*;
        match self {
            UnreachableStatement => write!(f, "This statement is unreachable."),
            DeadFunction { name } => write!(f, "Function \"{name}\" is never called."),
            DeadOperator { name } => write!(f, "Operator \"{name}\" is never used."),
            DeadClass { name } => write!(f, "Class \"{name}\" is never used."),
            DeadMethod { class_name, name } => {
                write!(f, "Method \"{class_name}.{name}\" is never called.")
            }
            MethodShadowsVirtual { class_name, name } => write!(
                f,
                "Method \"{class_name}.{name}\" matches an inherited virtual method \
                 but is not marked `overload`."
            ),
        }
    }
}

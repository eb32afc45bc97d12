use kestrel_types::{Span, Spanned};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeError {
    #[error(
        "Mismatched types.\n\
         expected: {expected}\n\
         found:    {received}.\n\
         {help}",
         help = if !help_text.is_empty() { format!("help: {}", help_text) } else { String::new() }
    )]
    MismatchedType {
        expected: String,
        received: String,
        help_text: String,
        span: Span,
    },
    #[error("The type of this expression cannot be determined.")]
    UnknownType { span: Span },
    #[error("Condition must be of type `boolean`, found `{received}`.")]
    NonBooleanCondition { received: String, span: Span },
}

impl Spanned for TypeError {
    fn span(&self) -> Span {
        use TypeError::*;
        match self {
            MismatchedType { span, .. } => span.clone(),
            UnknownType { span } => span.clone(),
            NonBooleanCondition { span, .. } => span.clone(),
        }
    }
}

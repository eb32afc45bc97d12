//! Type checking for Kestrel.
mod code_block;
mod environment;
mod expression;
mod inheritance;
pub mod namespace;
mod overload;
mod program;
mod type_check_context;
mod type_resolve;

pub use environment::Environment;
pub use namespace::{ClassId, ClassLookup, DeclId, DeclRegistry, FunctionId, ProgramDecls};
pub use program::{analyze, Analysis};
pub use type_check_context::TypeCheckContext;
pub(crate) use type_resolve::resolve_type;

pub mod compat;
pub mod promotion;
mod subst;
mod ty;

pub use compat::{accepts_argument, assignable, strict, strict_signature};
pub use promotion::common;
pub use subst::TypeSubstMap;
pub use ty::{display_list, Ty, TyKind};

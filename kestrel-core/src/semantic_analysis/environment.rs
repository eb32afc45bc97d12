use crate::type_system::Ty;

use kestrel_error::handler::ErrorEmitted;
use kestrel_types::Ident;

/// Variables visible at a point of the program.
///
/// Cloning is cheap, so every nested block works on its own copy and its
/// declarations never reach the enclosing block. A variable whose declared
/// type failed to resolve is still bound, to its error, so later uses stay
/// quiet.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    bindings: im::HashMap<Ident, Result<Ty, ErrorEmitted>>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    pub fn get(&self, name: &Ident) -> Option<&Result<Ty, ErrorEmitted>> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &Ident) -> bool {
        self.bindings.contains_key(name)
    }

    /// Binds `name`, shadowing any outer binding of the same name.
    pub fn insert(&mut self, name: Ident, ty: Result<Ty, ErrorEmitted>) {
        self.bindings.insert(name, ty);
    }
}

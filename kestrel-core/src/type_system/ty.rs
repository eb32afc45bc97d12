use core::fmt;

use kestrel_ast::{Modifiers, PrimitiveKind};
use kestrel_types::Ident;

/// A resolved type.
///
/// Equality is structural over the base type and its modifiers, with no
/// promotion. This is the "strict match" used for signature comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ty {
    pub kind: TyKind,
    pub modifiers: Modifiers,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TyKind {
    Primitive(PrimitiveKind),
    Array(Box<Ty>),
    Keymap(Box<Ty>, Box<Ty>),
    Class(Ident),
    GenericClass(Ident, Vec<Ty>),
    /// A type parameter of the enclosing generic class.
    GenericParam(Ident),
    /// Type of the `null` literal.
    Null,
    /// Type of the `undefined` literal.
    Undefined,
    Void,
}

impl Ty {
    pub fn new(kind: TyKind) -> Ty {
        Ty {
            kind,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Ty {
        Ty::new(TyKind::Primitive(kind))
    }

    pub fn boolean() -> Ty {
        Ty::primitive(PrimitiveKind::Boolean)
    }

    pub fn void() -> Ty {
        Ty::new(TyKind::Void)
    }

    pub fn array(elem: Ty) -> Ty {
        Ty::new(TyKind::Array(Box::new(elem)))
    }

    pub fn keymap(key: Ty, value: Ty) -> Ty {
        Ty::new(TyKind::Keymap(Box::new(key), Box::new(value)))
    }

    pub fn with_modifiers(self, modifiers: Modifiers) -> Ty {
        Ty { modifiers, ..self }
    }

    pub fn is_reference(&self) -> bool {
        self.modifiers.is_reference
    }

    pub fn is_const(&self) -> bool {
        self.modifiers.is_const
    }

    pub fn is_void(&self) -> bool {
        self.kind == TyKind::Void
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TyKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.as_primitive() == Some(PrimitiveKind::Boolean)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, TyKind::Array(_) | TyKind::Keymap(..))
    }

    /// Whether no type parameter occurs anywhere in this type.
    pub fn is_concrete(&self) -> bool {
        match &self.kind {
            TyKind::GenericParam(_) => false,
            TyKind::Array(elem) => elem.is_concrete(),
            TyKind::Keymap(key, value) => key.is_concrete() && value.is_concrete(),
            TyKind::GenericClass(_, args) => args.iter().all(Ty::is_concrete),
            _ => true,
        }
    }

    /// The class name of a plain or generic class type.
    pub fn class_name(&self) -> Option<&Ident> {
        match &self.kind {
            TyKind::Class(name) | TyKind::GenericClass(name, _) => Some(name),
            _ => None,
        }
    }

    /// The same type as a value: without `reference` and `const`.
    ///
    /// A copy owns fresh storage, so it is neither an alias nor read-only.
    pub fn decay(&self) -> Ty {
        Ty {
            kind: self.kind.clone(),
            modifiers: Modifiers {
                is_const: false,
                is_reference: false,
                ..self.modifiers
            },
        }
    }

    /// The same type seen through a reference to it.
    pub fn as_reference(&self) -> Ty {
        Ty {
            kind: self.kind.clone(),
            modifiers: Modifiers {
                is_reference: true,
                ..self.modifiers
            },
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.modifiers)?;
        match &self.kind {
            TyKind::Primitive(kind) => write!(f, "{kind}"),
            TyKind::Array(elem) => write!(f, "array[{elem}]"),
            TyKind::Keymap(key, value) => write!(f, "keymap[{key}, {value}]"),
            TyKind::Class(name) | TyKind::GenericParam(name) => write!(f, "{name}"),
            TyKind::GenericClass(name, args) => {
                write!(f, "{name}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
            TyKind::Null => f.write_str("null"),
            TyKind::Undefined => f.write_str("undefined"),
            TyKind::Void => f.write_str("void"),
        }
    }
}

/// Renders a list of types as `a, b, c`, as used in signature diagnostics.
pub fn display_list<'a>(tys: impl IntoIterator<Item = &'a Ty>) -> String {
    tys.into_iter()
        .map(Ty::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

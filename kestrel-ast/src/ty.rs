use crate::priv_prelude::*;
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Extended,
    Float,
    Double,
    Complex,
    Char,
    String,
    ByteString,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        use PrimitiveKind::*;
        match self {
            Boolean => "boolean",
            Byte => "byte",
            Short => "short",
            Integer => "integer",
            Long => "long",
            Extended => "extended",
            Float => "float",
            Double => "double",
            Complex => "complex",
            Char => "char",
            String => "string",
            ByteString => "bytes",
        }
    }

    pub fn is_integer_family(self) -> bool {
        use PrimitiveKind::*;
        matches!(self, Byte | Short | Integer | Long | Extended)
    }

    pub fn is_float_family(self) -> bool {
        use PrimitiveKind::*;
        matches!(self, Float | Double | Complex)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer_family() || self.is_float_family()
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Modifiers {
    pub is_const: bool,
    pub is_reference: bool,
    pub is_nullable: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        is_const: false,
        is_reference: false,
        is_nullable: false,
    };
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        if self.is_reference {
            f.write_str("reference ")?;
        }
        if self.is_nullable {
            f.write_str("nullable ")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// `array[T]`; the argument count is checked during resolution.
    Array(Vec<TypeRef>),
    /// `keymap[K, V]`; the argument count is checked during resolution.
    Keymap(Vec<TypeRef>),
    Class(Ident),
    GenericClass(Ident, Vec<TypeRef>),
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeCategory {
    Primitive,
    Collection,
    Class,
    GenericClass,
    Void,
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub meta: NodeMeta,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
}

impl TypeRef {
    pub fn category(&self) -> TypeCategory {
        match &self.kind {
            TypeKind::Primitive(_) => TypeCategory::Primitive,
            TypeKind::Array(_) | TypeKind::Keymap(_) => TypeCategory::Collection,
            TypeKind::Class(_) => TypeCategory::Class,
            TypeKind::GenericClass(..) => TypeCategory::GenericClass,
            TypeKind::Void => TypeCategory::Void,
        }
    }

    /// The name written for this type, e.g. `integer`, `array` or the class name.
    pub fn base_name(&self) -> &str {
        match &self.kind {
            TypeKind::Primitive(kind) => kind.as_str(),
            TypeKind::Array(_) => "array",
            TypeKind::Keymap(_) => "keymap",
            TypeKind::Class(name) | TypeKind::GenericClass(name, _) => name.as_str(),
            TypeKind::Void => "void",
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match &self.kind {
            TypeKind::Array(args) | TypeKind::Keymap(args) | TypeKind::GenericClass(_, args) => {
                args
            }
            _ => &[],
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    pub(crate) fn for_each_meta_mut(&mut self, f: &mut impl FnMut(&mut NodeMeta)) {
        f(&mut self.meta);
        match &mut self.kind {
            TypeKind::Array(args) | TypeKind::Keymap(args) | TypeKind::GenericClass(_, args) => {
                for arg in args {
                    arg.for_each_meta_mut(f);
                }
            }
            TypeKind::Primitive(_) | TypeKind::Class(_) | TypeKind::Void => {}
        }
    }
}

impl Spanned for TypeRef {
    fn span(&self) -> Span {
        self.meta.span.clone()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifiers, self.base_name())?;
        if let TypeKind::Array(args) | TypeKind::Keymap(args) | TypeKind::GenericClass(_, args) =
            &self.kind
        {
            f.write_str("[")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

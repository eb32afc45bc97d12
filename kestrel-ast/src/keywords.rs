use crate::priv_prelude::*;
use strum::{EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    // Declarations.
    Class,
    Extends,
    Public,
    Private,
    Protected,
    Static,
    Virtual,
    Overload,
    Operator,
    // Type modifiers and builtin types.
    Const,
    Reference,
    Nullable,
    Void,
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
    Bytes,
    Array,
    Keymap,
    // Control flow.
    If,
    Else,
    While,
    Try,
    Catch,
    Return,
    Break,
    Continue,
    // Expressions.
    New,
    Delete,
    This,
    True,
    False,
    Null,
    Undefined,
    And,
    Or,
    Xor,
    Not,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The primitive type this keyword names, if any.
    pub fn primitive(self) -> Option<PrimitiveKind> {
        use Keyword::*;
        let kind = match self {
            Boolean => PrimitiveKind::Boolean,
            Byte => PrimitiveKind::Byte,
            Short => PrimitiveKind::Short,
            Integer => PrimitiveKind::Integer,
            Long => PrimitiveKind::Long,
            Extended => PrimitiveKind::Extended,
            Float => PrimitiveKind::Float,
            Double => PrimitiveKind::Double,
            Complex => PrimitiveKind::Complex,
            Char => PrimitiveKind::Char,
            String => PrimitiveKind::String,
            Bytes => PrimitiveKind::ByteString,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this keyword can begin a type reference.
    pub fn starts_type(self) -> bool {
        use Keyword::*;
        self.primitive().is_some()
            || matches!(self, Const | Reference | Nullable | Void | Array | Keymap)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

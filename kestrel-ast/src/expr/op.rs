use crate::priv_prelude::*;
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryCategory {
    Arithmetic,
    Logical,
    Comparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn category(self) -> BinaryCategory {
        use BinaryOp::*;
        match self {
            Add | Sub | Mul | Div | Mod | Pow | BitAnd | BitOr | BitXor | Shl | Shr => {
                BinaryCategory::Arithmetic
            }
            And | Or | Xor => BinaryCategory::Logical,
            Eq | Ne | Lt | Le | Gt | Ge => BinaryCategory::Comparison,
        }
    }

    pub fn is_bitwise(self) -> bool {
        use BinaryOp::*;
        matches!(self, BitAnd | BitOr | BitXor | Shl | Shr)
    }

    pub fn is_ordering(self) -> bool {
        use BinaryOp::*;
        matches!(self, Lt | Le | Gt | Ge)
    }

    /// Canonical mnemonic used to build the mangled overload name.
    pub fn mnemonic(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Mod => "mod",
            Pow => "pow",
            BitAnd => "band",
            BitOr => "bor",
            BitXor => "bxor",
            Shl => "shl",
            Shr => "shr",
            And => "and",
            Or => "or",
            Xor => "xor",
            Eq => "eq",
            Ne => "ne",
            Lt => "lt",
            Le => "le",
            Gt => "gt",
            Ge => "ge",
        }
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "**",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            Shl => "<<",
            Shr => ">>",
            And => "and",
            Or => "or",
            Xor => "xor",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryCategory {
    Arithmetic,
    Logical,
    Allocation,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize)]
pub enum UnaryOp {
    Neg,
    Pos,
    BitNot,
    Not,
    /// `&expr`, binds a reference to a place.
    Ref,
    Delete,
}

impl UnaryOp {
    pub fn category(self) -> UnaryCategory {
        match self {
            UnaryOp::Neg | UnaryOp::Pos | UnaryOp::BitNot => UnaryCategory::Arithmetic,
            UnaryOp::Not => UnaryCategory::Logical,
            UnaryOp::Ref => UnaryCategory::Reference,
            UnaryOp::Delete => UnaryCategory::Allocation,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Pos => "pos",
            UnaryOp::BitNot => "bnot",
            UnaryOp::Not => "not",
            UnaryOp::Ref => "ref",
            UnaryOp::Delete => "delete",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "not",
            UnaryOp::Ref => "&",
            UnaryOp::Delete => "delete",
        }
    }

    /// Keyword operators need a space before their operand when printed.
    pub fn is_word(self) -> bool {
        matches!(self, UnaryOp::Not | UnaryOp::Delete)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An operator a class may overload with an `operator` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperatorName {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Index,
}

impl OperatorName {
    /// Name under which the overload is registered, `operator_<mnemonic>`.
    pub fn mangled(self) -> String {
        let mnemonic = match self {
            OperatorName::Binary(op) => op.mnemonic(),
            OperatorName::Unary(op) => op.mnemonic(),
            OperatorName::Index => "index",
        };
        format!("operator_{mnemonic}")
    }

    pub fn arity(self) -> usize {
        match self {
            OperatorName::Unary(_) => 1,
            OperatorName::Binary(_) | OperatorName::Index => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OperatorName::Binary(op) => op.symbol(),
            OperatorName::Unary(op) => op.symbol(),
            OperatorName::Index => "[]",
        }
    }
}

impl fmt::Display for OperatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use strum::IntoEnumIterator;

    #[test]
    fn mangled_names_are_distinct() {
        let names = BinaryOp::iter()
            .map(OperatorName::Binary)
            .chain(
                [UnaryOp::Neg, UnaryOp::Pos, UnaryOp::BitNot, UnaryOp::Not]
                    .into_iter()
                    .map(OperatorName::Unary),
            )
            .chain(std::iter::once(OperatorName::Index))
            .map(OperatorName::mangled)
            .collect::<Vec<_>>();
        let unique = names.iter().collect::<BTreeSet<_>>();
        assert_eq!(unique.len(), names.len());
        assert_eq!(OperatorName::Binary(BinaryOp::Add).mangled(), "operator_add");
        assert_eq!(OperatorName::Index.mangled(), "operator_index");
    }

    #[test]
    fn categories() {
        assert_eq!(BinaryOp::Pow.category(), BinaryCategory::Arithmetic);
        assert_eq!(BinaryOp::Xor.category(), BinaryCategory::Logical);
        assert_eq!(BinaryOp::Ge.category(), BinaryCategory::Comparison);
        assert_eq!(UnaryOp::Delete.category(), UnaryCategory::Allocation);
        assert_eq!(UnaryOp::Ref.category(), UnaryCategory::Reference);
    }
}

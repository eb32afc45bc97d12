use kestrel_ast::Keyword;

/// Reserved words, looked up after an identifier has been scanned.
pub static KEYWORDS: phf::Map<&'static str, Keyword> = phf::phf_map! {
    "class" => Keyword::Class,
    "extends" => Keyword::Extends,
    "public" => Keyword::Public,
    "private" => Keyword::Private,
    "protected" => Keyword::Protected,
    "static" => Keyword::Static,
    "virtual" => Keyword::Virtual,
    "overload" => Keyword::Overload,
    "operator" => Keyword::Operator,
    "const" => Keyword::Const,
    "reference" => Keyword::Reference,
    "nullable" => Keyword::Nullable,
    "void" => Keyword::Void,
    "boolean" => Keyword::Boolean,
    "byte" => Keyword::Byte,
    "short" => Keyword::Short,
    "integer" => Keyword::Integer,
    "long" => Keyword::Long,
    "extended" => Keyword::Extended,
    "float" => Keyword::Float,
    "double" => Keyword::Double,
    "complex" => Keyword::Complex,
    "char" => Keyword::Char,
    "string" => Keyword::String,
    "bytes" => Keyword::Bytes,
    "array" => Keyword::Array,
    "keymap" => Keyword::Keymap,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "try" => Keyword::Try,
    "catch" => Keyword::Catch,
    "return" => Keyword::Return,
    "break" => Keyword::Break,
    "continue" => Keyword::Continue,
    "new" => Keyword::New,
    "delete" => Keyword::Delete,
    "this" => Keyword::This,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "undefined" => Keyword::Undefined,
    "and" => Keyword::And,
    "or" => Keyword::Or,
    "xor" => Keyword::Xor,
    "not" => Keyword::Not,
};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_keyword_is_reserved() {
        for keyword in Keyword::iter() {
            assert_eq!(KEYWORDS.get(keyword.as_str()), Some(&keyword));
        }
        assert_eq!(KEYWORDS.len(), Keyword::iter().count());
    }
}

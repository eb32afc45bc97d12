use crate::priv_prelude::*;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Literal {
    Int(BigUint),
    Float(f64),
    Imaginary(f64),
    String(String),
    Char(char),
    ByteString(Vec<u8>),
    Bool(bool),
    Null,
    Undefined,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::Imaginary(value) => write!(f, "{value:?}i"),
            Literal::String(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    write_escaped(f, c, '"')?;
                }
                f.write_str("\"")
            }
            Literal::Char(value) => {
                f.write_str("'")?;
                write_escaped(f, *value, '\'')?;
                f.write_str("'")
            }
            Literal::ByteString(bytes) => {
                f.write_str("b\"")?;
                for b in bytes {
                    write_escaped(f, char::from(*b), '"')?;
                }
                f.write_str("\"")
            }
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Null => f.write_str("null"),
            Literal::Undefined => f.write_str("undefined"),
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, c: char, quote: char) -> fmt::Result {
    match c {
        '\n' => f.write_str("\\n"),
        '\t' => f.write_str("\\t"),
        '\r' => f.write_str("\\r"),
        '\0' => f.write_str("\\0"),
        '\\' => f.write_str("\\\\"),
        c if c == quote => write!(f, "\\{c}"),
        c => write!(f, "{c}"),
    }
}

mod expr;
mod item;
mod keywords;
mod parser;
mod statement;
#[cfg(test)]
mod test_utils;
mod token;
mod ty;

pub use crate::{
    keywords::KEYWORDS,
    parser::{Context, ParseResult, Parser},
    token::lex,
};

use kestrel_ast::Program;
use kestrel_error::handler::{ErrorEmitted, Handler};
use std::{path::PathBuf, sync::Arc};

pub trait Parse: Sized {
    fn parse(parser: &mut Parser) -> ParseResult<Self>;
}

/// Lexes and parses a whole source file. Parsing stops at the first error.
pub fn parse_file(
    handler: &Handler,
    src: Arc<str>,
    path: Option<Arc<PathBuf>>,
) -> Result<Program, ErrorEmitted> {
    let ts = lex(handler, &src, path)?;
    Parser::new(handler, &ts).parse_to_end()
}

#[cfg(test)]
mod tests {
    use crate::*;
    use kestrel_error::error::CompileError;

    #[test]
    fn parse_invalid() {
        // none of these may panic
        for src in [
            "class A extends { integer",
            "integer f(integer x { return x; }",
            "while (",
            "a := := b;",
            "class [T] {}",
            "x ** ** y;",
            "\"unterminated",
        ] {
            let handler = Handler::default();
            assert!(parse_file(&handler, src.into(), None).is_err(), "{src}");
            assert!(handler.has_errors());
        }
    }

    #[test]
    fn lex_errors_are_not_parse_errors() {
        let handler = Handler::default();
        let _ = parse_file(&handler, "integer a := 1 $ 2;".into(), None);
        let (errors, _) = handler.consume();
        assert!(matches!(errors.as_slice(), [CompileError::Lex { .. }]));
    }

    #[test]
    fn parse_stops_at_first_error() {
        let handler = Handler::default();
        let _ = parse_file(&handler, "integer a := ;\ninteger b := ;".into(), None);
        assert_eq!(handler.error_count(), 1);
    }
}

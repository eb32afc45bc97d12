use crate::{lex, Parse, Parser};

use kestrel_ast::Program;
use kestrel_error::{
    error::CompileError,
    handler::Handler,
    parser_error::{ParseError, ParseErrorKind},
};
use std::sync::Arc;

pub fn parse<T>(input: &str) -> T
where
    T: Parse,
{
    let handler = Handler::default();
    let ts = lex(&handler, &Arc::from(input), None).unwrap();
    let r = Parser::new(&handler, &ts).parse_to_end();

    if handler.has_errors() {
        panic!("{:?}", handler.consume());
    }

    r.unwrap_or_else(|_| panic!("Parse error: {:?}", handler.consume()))
}

pub fn parse_err<T>(input: &str) -> ParseErrorKind
where
    T: Parse,
{
    let handler = Handler::default();
    let ts = lex(&handler, &Arc::from(input), None).unwrap();
    let r = Parser::new(&handler, &ts).parse_to_end::<T>();
    assert!(r.is_err(), "expected {input:?} to fail to parse");
    first_parse_error(handler).kind
}

pub fn parse_program(input: &str) -> Program {
    parse::<Program>(input)
}

pub fn parse_program_err(input: &str) -> ParseErrorKind {
    parse_err::<Program>(input)
}

/// The full error, including its span.
pub fn parse_program_error(input: &str) -> ParseError {
    let handler = Handler::default();
    let r = crate::parse_file(&handler, Arc::from(input), None);
    assert!(r.is_err(), "expected {input:?} to fail to parse");
    first_parse_error(handler)
}

fn first_parse_error(handler: Handler) -> ParseError {
    let (errors, _) = handler.consume();
    match errors.into_iter().next() {
        Some(CompileError::Parse { error }) => error,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

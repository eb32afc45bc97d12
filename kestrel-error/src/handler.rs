use crate::{error::CompileError, warning::CompileWarning};

use core::cell::RefCell;

/// A handler with which you can emit diagnostics.
#[derive(Default, Debug)]
pub struct Handler {
    /// The inner handler.
    /// This construction is used to avoid `&mut` all over the compiler.
    inner: RefCell<HandlerInner>,
}

/// Contains the actual data for `Handler`.
/// Modelled this way to afford an API using interior mutability.
#[derive(Default, Debug)]
struct HandlerInner {
    /// The sink through which errors will be emitted.
    errors: Vec<CompileError>,
    /// The sink through which warnings will be emitted.
    warnings: Vec<CompileWarning>,
}

impl Handler {
    /// Emit the error `err`.
    pub fn emit_err(&self, err: CompileError) -> ErrorEmitted {
        self.inner.borrow_mut().errors.push(err);
        ErrorEmitted { _priv: () }
    }

    /// Emit the warning `warn`.
    pub fn emit_warn(&self, warn: CompileWarning) {
        self.inner.borrow_mut().warnings.push(warn);
    }

    pub fn has_errors(&self) -> bool {
        !self.inner.borrow().errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.inner.borrow().errors.len()
    }

    /// Extract all the errors from this handler.
    pub fn consume(self) -> (Vec<CompileError>, Vec<CompileWarning>) {
        let inner = self.inner.into_inner();
        (inner.errors, inner.warnings)
    }
}

/// Proof that an error was emitted through a `Handler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorEmitted {
    _priv: (),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warning::Warning;
    use kestrel_types::{Ident, Span};

    fn unknown(name: &str) -> CompileError {
        CompileError::UnknownVariable {
            name: Ident::new_no_span(name),
            span: Span::dummy(),
        }
    }

    #[test]
    fn errors_and_warnings_are_kept_apart() {
        let handler = Handler::default();
        assert!(!handler.has_errors());
        handler.emit_err(unknown("a"));
        handler.emit_warn(CompileWarning {
            span: Span::dummy(),
            warning_content: Warning::UnreachableStatement,
        });
        handler.emit_err(unknown("b"));
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 2);
        let (errors, warnings) = handler.consume();
        assert_eq!(errors.len(), 2);
        assert_eq!(warnings.len(), 1);
    }
}

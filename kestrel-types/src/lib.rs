pub mod ident;
pub use ident::*;

pub mod span;
pub use span::*;

/// Anything that can be traced back to a region of source text.
pub trait Spanned {
    fn span(&self) -> Span;
}

impl<T: Spanned> Spanned for Box<T> {
    fn span(&self) -> Span {
        (**self).span()
    }
}

impl<T: Spanned> Spanned for Vec<T> {
    fn span(&self) -> Span {
        Span::join_all(self.iter().map(|t| t.span()))
    }
}

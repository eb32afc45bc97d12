use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::{fmt, path::PathBuf, sync::Arc};

/// A line and column pair, both 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A byte range into a shared source buffer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    src: Arc<str>,
    start: usize,
    end: usize,
    path: Option<Arc<PathBuf>>,
}

impl Span {
    pub fn new(src: Arc<str>, start: usize, end: usize, path: Option<Arc<PathBuf>>) -> Option<Span> {
        src.get(start..end)?;
        Some(Span {
            src,
            start,
            end,
            path,
        })
    }

    /// A span covering all of `src`.
    pub fn from_string(src: Arc<str>, path: Option<Arc<PathBuf>>) -> Span {
        let end = src.len();
        Span {
            src,
            start: 0,
            end,
            path,
        }
    }

    pub fn dummy() -> Span {
        Span {
            src: Arc::from(""),
            start: 0,
            end: 0,
            path: None,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.src.is_empty() && self.path.is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.src[self.start..self.end]
    }

    pub fn src(&self) -> &Arc<str> {
        &self.src
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn path(&self) -> Option<&Arc<PathBuf>> {
        self.path.as_ref()
    }

    /// Joins two spans over the same buffer. A dummy span on either side yields the other one.
    pub fn join(lhs: Span, rhs: &Span) -> Span {
        if lhs.is_dummy() {
            return rhs.clone();
        }
        if rhs.is_dummy() || !Arc::ptr_eq(&lhs.src, &rhs.src) {
            return lhs;
        }
        Span {
            start: lhs.start.min(rhs.start),
            end: lhs.end.max(rhs.end),
            ..lhs
        }
    }

    pub fn join_all(spans: impl IntoIterator<Item = Span>) -> Span {
        spans
            .into_iter()
            .reduce(|acc, s| Span::join(acc, &s))
            .unwrap_or_else(Span::dummy)
    }

    /// The position right after this span, as an empty span.
    pub fn end_point(&self) -> Span {
        Span {
            start: self.end,
            ..self.clone()
        }
    }

    pub fn start_pos(&self) -> LineCol {
        line_col(&self.src, self.start)
    }

    pub fn end_pos(&self) -> LineCol {
        line_col(&self.src, self.end)
    }
}

fn line_col(src: &str, offset: usize) -> LineCol {
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    LineCol {
        line,
        col: before[line_start..].chars().count() + 1,
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Span")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("as_str", &self.as_str())
            .finish()
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pos = self.start_pos();
        let mut state = serializer.serialize_struct("Span", 2)?;
        state.serialize_field("line", &pos.line)?;
        state.serialize_field("col", &pos.col)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_and_column_are_one_based() {
        let src: Arc<str> = Arc::from("ab\ncde\n  f");
        let span = Span::new(src.clone(), 9, 10, None).unwrap();
        assert_eq!(span.as_str(), "f");
        assert_eq!(span.start_pos(), LineCol { line: 3, col: 3 });

        let span = Span::new(src, 0, 1, None).unwrap();
        assert_eq!(span.start_pos(), LineCol { line: 1, col: 1 });
    }

    #[test]
    fn out_of_range_span_is_rejected() {
        assert!(Span::new(Arc::from("abc"), 2, 9, None).is_none());
    }

    #[test]
    fn join_covers_both_sides() {
        let src: Arc<str> = Arc::from("let x = 1;");
        let a = Span::new(src.clone(), 4, 5, None).unwrap();
        let b = Span::new(src, 8, 9, None).unwrap();
        assert_eq!(Span::join(a, &b).as_str(), "x = 1");
    }
}

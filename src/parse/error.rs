/// A script line the grammar could not classify.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed line at column {column}: {expected}")]
pub struct ParseError {
    column: usize,
    expected: String,
}

impl ParseError {
    pub(crate) fn new(offset: usize, expected: impl Into<String>) -> Self {
        Self {
            column: offset + 1,
            expected: expected.into(),
        }
    }

    /// 1-based column in the trimmed line.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }
}

use super::{Error, ErrorKind};

/// A physical column written more than once: either declared twice in one
/// target type or covered by more than one mapping group.
#[derive(Debug)]
pub(super) struct DuplicateColumnError {
    column: Box<str>,
    owner: Box<str>,
}

impl std::error::Error for DuplicateColumnError {}

impl core::fmt::Display for DuplicateColumnError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "duplicate column `{}` in {}", self.column, self.owner)
    }
}

impl Error {
    /// Creates a duplicate column error.
    pub fn duplicate_column(column: impl Into<String>, owner: impl Into<String>) -> Error {
        Error::from(ErrorKind::DuplicateColumn(DuplicateColumnError {
            column: column.into().into(),
            owner: owner.into().into(),
        }))
    }

    /// Returns `true` if this error, or its root cause, is a duplicate column error.
    pub fn is_duplicate_column(&self) -> bool {
        matches!(self.root().kind(), ErrorKind::DuplicateColumn(_))
    }
}

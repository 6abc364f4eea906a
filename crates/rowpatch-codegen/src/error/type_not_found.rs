use super::{Error, ErrorKind};

/// Error when a type reference cannot be resolved to a struct declaration.
#[derive(Debug)]
pub(super) struct TypeNotFoundError {
    name: Box<str>,
}

impl std::error::Error for TypeNotFoundError {}

impl core::fmt::Display for TypeNotFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "type not found: {}", self.name)
    }
}

impl Error {
    /// Creates a type not found error for the given (possibly qualified) name.
    pub fn type_not_found(name: impl Into<String>) -> Error {
        Error::from(ErrorKind::TypeNotFound(TypeNotFoundError {
            name: name.into().into(),
        }))
    }

    /// Returns `true` if this error, or its root cause, is a type not found error.
    pub fn is_type_not_found(&self) -> bool {
        matches!(self.root().kind(), ErrorKind::TypeNotFound(_))
    }
}

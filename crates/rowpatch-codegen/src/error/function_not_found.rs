use super::{Error, ErrorKind};

/// Error when the conversion function cannot be located.
#[derive(Debug)]
pub(super) struct FunctionNotFoundError {
    receiver: Option<Box<str>>,
    name: Box<str>,
}

impl std::error::Error for FunctionNotFoundError {}

impl core::fmt::Display for FunctionNotFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("function not found: ")?;
        if let Some(receiver) = &self.receiver {
            write!(f, "{receiver}::")?;
        }
        f.write_str(&self.name)
    }
}

impl Error {
    /// Creates a function not found error.
    ///
    /// `receiver` is the `impl` self type the function was searched on, if any.
    pub fn function_not_found(receiver: Option<&str>, name: impl Into<String>) -> Error {
        Error::from(ErrorKind::FunctionNotFound(FunctionNotFoundError {
            receiver: receiver.map(Into::into),
            name: name.into().into(),
        }))
    }

    /// Returns `true` if this error, or its root cause, is a function not found error.
    pub fn is_function_not_found(&self) -> bool {
        matches!(self.root().kind(), ErrorKind::FunctionNotFound(_))
    }
}

use super::{Error, ErrorKind};

/// A target field whose value expression falls outside the recognized
/// grammar. The field is left out of every mapping group.
#[derive(Debug)]
pub(super) struct UnrecognizedExpressionError {
    target: Box<str>,
    expr: Box<str>,
}

impl std::error::Error for UnrecognizedExpressionError {}

impl core::fmt::Display for UnrecognizedExpressionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unrecognized expression for `{}`: `{}`",
            self.target, self.expr
        )
    }
}

impl Error {
    /// Creates an unrecognized expression error for the given target path.
    pub fn unrecognized_expression(target: impl Into<String>, expr: impl Into<String>) -> Error {
        Error::from(ErrorKind::UnrecognizedExpression(
            UnrecognizedExpressionError {
                target: target.into().into(),
                expr: expr.into().into(),
            },
        ))
    }

    /// Returns `true` if this error, or its root cause, is an unrecognized expression.
    pub fn is_unrecognized_expression(&self) -> bool {
        matches!(self.root().kind(), ErrorKind::UnrecognizedExpression(_))
    }
}

mod cyclic_embedding;
mod duplicate_column;
mod function_not_found;
mod type_not_found;
mod unrecognized_expression;
mod untracked_field;

use cyclic_embedding::CyclicEmbeddingError;
use duplicate_column::DuplicateColumnError;
use function_not_found::FunctionNotFoundError;
use std::sync::Arc;
use type_not_found::TypeNotFoundError;
use unrecognized_expression::UnrecognizedExpressionError;
use untracked_field::UntrackedFieldError;

/// Shorthand for a `Result` with the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// An error produced while inferring or rendering a patch function.
///
/// Errors are cheap to clone so that soft errors can be collected as
/// diagnostics and also logged.
#[derive(Clone)]
pub struct Error {
    inner: Arc<ErrorInner>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

#[derive(Debug)]
enum ErrorKind {
    Parse(syn::Error),
    TypeNotFound(TypeNotFoundError),
    FunctionNotFound(FunctionNotFoundError),
    CyclicEmbedding(CyclicEmbeddingError),
    UnrecognizedExpression(UnrecognizedExpressionError),
    DuplicateColumn(DuplicateColumnError),
    UntrackedField(UntrackedFieldError),
    Adhoc(Box<str>),

    /// Context on an error the run continued past
    Recovered(Box<str>),
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed before the cause: `context: cause`.
    pub fn context(self, message: impl core::fmt::Display) -> Error {
        Error {
            inner: Arc::new(ErrorInner {
                kind: ErrorKind::Adhoc(message.to_string().into()),
                cause: Some(self),
            }),
        }
    }

    /// Adds context to an error the run recovered from, making it a soft
    /// diagnostic.
    pub(crate) fn recovered(self, message: impl core::fmt::Display) -> Error {
        Error {
            inner: Arc::new(ErrorInner {
                kind: ErrorKind::Recovered(message.to_string().into()),
                cause: Some(self),
            }),
        }
    }

    /// Returns `true` if the run cannot continue after this error.
    ///
    /// Unrecognized expressions, duplicate columns and untracked fields are
    /// soft, as is any error the run recovered from: they are reported as
    /// diagnostics and the affected columns show up as missing.
    pub fn is_fatal(&self) -> bool {
        let recovered = self
            .chain()
            .any(|err| matches!(err.kind(), ErrorKind::Recovered(_)));

        !recovered
            && !matches!(
                self.root().kind(),
                ErrorKind::UnrecognizedExpression(_)
                    | ErrorKind::DuplicateColumn(_)
                    | ErrorKind::UntrackedField(_)
            )
    }

    fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) = &err.inner.cause {
            err = cause;
        }
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut next = Some(self);
        core::iter::from_fn(move || {
            let err = next?;
            next = err.inner.cause.as_ref();
            Some(err)
        })
    }

    fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Parse(err) => Some(err),
            _ => self
                .inner
                .cause
                .as_ref()
                .map(|cause| cause as &(dyn std::error::Error + 'static)),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            f.debug_struct("Error")
                .field("kind", &self.inner.kind)
                .field("cause", &self.inner.cause)
                .finish()
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Parse(err) => write!(f, "parse error: {err}"),
            TypeNotFound(err) => core::fmt::Display::fmt(err, f),
            FunctionNotFound(err) => core::fmt::Display::fmt(err, f),
            CyclicEmbedding(err) => core::fmt::Display::fmt(err, f),
            UnrecognizedExpression(err) => core::fmt::Display::fmt(err, f),
            DuplicateColumn(err) => core::fmt::Display::fmt(err, f),
            UntrackedField(err) => core::fmt::Display::fmt(err, f),
            Adhoc(message) | Recovered(message) => f.write_str(message),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Arc::new(ErrorInner { kind, cause: None }),
        }
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Error {
        Error::from(ErrorKind::Parse(err))
    }
}

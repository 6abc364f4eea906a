use super::{Error, ErrorKind};

/// A guard trigger with no matching field in the change-tracking type. The
/// patch is still rendered, but its guard will not compile.
#[derive(Debug)]
pub(super) struct UntrackedFieldError {
    ty: Box<str>,
    field: Box<str>,
}

impl std::error::Error for UntrackedFieldError {}

impl core::fmt::Display for UntrackedFieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "change-tracking type `{}` has no field `{}`",
            self.ty, self.field
        )
    }
}

impl Error {
    /// Creates an untracked field error.
    pub fn untracked_field(ty: impl Into<String>, field: impl Into<String>) -> Error {
        Error::from(ErrorKind::UntrackedField(UntrackedFieldError {
            ty: ty.into().into(),
            field: field.into().into(),
        }))
    }

    /// Returns `true` if this error, or its root cause, is an untracked field error.
    pub fn is_untracked_field(&self) -> bool {
        matches!(self.root().kind(), ErrorKind::UntrackedField(_))
    }
}

use std::fmt;

/// A column value that could not be serialized.
#[derive(Debug)]
pub struct Error {
    column: Box<str>,
    path: Option<Box<str>>,
    source: serde_json::Error,
}

impl Error {
    pub(crate) fn new(column: &str, source: serde_json::Error) -> Error {
        Error {
            column: column.into(),
            path: None,
            source,
        }
    }

    /// A merge-set path; the column is filled in when the set is merged.
    pub(crate) fn at_path(path: &str, source: serde_json::Error) -> Error {
        Error {
            column: "".into(),
            path: Some(path.into()),
            source,
        }
    }

    pub(crate) fn in_column(mut self, column: &str) -> Error {
        self.column = column.into();
        self
    }

    /// Column the value was written to
    pub fn column(&self) -> &str {
        &self.column
    }

    /// JSON path inside the column, for merge-set writes
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(
                f,
                "failed to serialize `{}.{path}`: {}",
                self.column, self.source
            ),
            None => write!(f, "failed to serialize `{}`: {}", self.column, self.source),
        }
    }
}

use std::fmt;

/// A read path rooted at the conversion function's parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceExpression {
    /// Parameter name the path starts from
    pub root: String,

    /// Field path below the parameter, e.g. `["account", "namespace"]`
    pub path: Vec<String>,

    /// Conversions applied after the read, innermost first. Only used for
    /// human-readable comments.
    pub conversions: Vec<Conversion>,
}

/// A conversion applied to a read value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// `value.name()`, `value.name(..)`
    Method { name: String, args: bool },

    /// `path(value)`
    Wrap(String),

    /// `value as ty`
    Cast(String),

    /// `value?`
    Try,
}

impl SourceExpression {
    pub(crate) fn param(root: &str) -> Self {
        Self {
            root: root.to_string(),
            path: vec![],
            conversions: vec![],
        }
    }

    /// The top-level source field whose change triggers this read.
    pub fn trigger(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    /// `account.namespace`
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }

    pub(crate) fn field(mut self, name: impl Into<String>) -> Self {
        self.path.push(name.into());
        self
    }

    pub(crate) fn convert(mut self, conversion: Conversion) -> Self {
        self.conversions.push(conversion);
        self
    }
}

impl fmt::Display for SourceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.root.clone();
        for segment in &self.path {
            out.push('.');
            out.push_str(segment);
        }

        for conversion in &self.conversions {
            out = match conversion {
                Conversion::Method { name, args: false } => format!("{out}.{name}()"),
                Conversion::Method { name, args: true } => format!("{out}.{name}(..)"),
                Conversion::Wrap(path) => format!("{path}({out})"),
                Conversion::Cast(ty) => format!("{out} as {ty}"),
                Conversion::Try => format!("{out}?"),
            };
        }

        f.write_str(&out)
    }
}

/// A helper call whose value depends on several source fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRead {
    /// Helper name
    pub name: String,

    /// The call as written, for comments: `user.full_address()`
    pub call: String,

    /// Top-level source fields read, in source declaration order
    pub reads: Vec<String>,

    /// False when the helper body was not available and `reads` was
    /// inferred from the helper's name
    pub inspected: bool,
}

/// Where a target value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Field(SourceExpression),
    Method(MethodRead),
}

impl Source {
    /// Source fields whose presence makes the target value change.
    pub fn triggers(&self) -> Vec<&str> {
        match self {
            Source::Field(expr) => expr.trigger().into_iter().collect(),
            Source::Method(method) => method.reads.iter().map(String::as_str).collect(),
        }
    }

    /// Name used to order JSON sub-fields: the dotted field path or the
    /// helper name.
    pub fn sort_name(&self) -> String {
        match self {
            Source::Field(expr) => expr.dotted(),
            Source::Method(method) => method.name.clone(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Field(expr) => fmt::Display::fmt(expr, f),
            Source::Method(method) => f.write_str(&method.call),
        }
    }
}

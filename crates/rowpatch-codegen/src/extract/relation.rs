use crate::bindings::Source;

/// One target value paired with the source it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelation {
    /// Rust field path of the value inside the converted row, e.g.
    /// `["account", "namespace"]` or `["meta", "0", "nickname"]`
    pub target: Vec<String>,

    /// What the value reads
    pub source: Source,

    /// How the value sits in the target literal
    pub shape: Shape,

    /// Position of first appearance in the function body
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A top-level column
    Direct,

    /// A column inside an embedded literal; `field` is the outermost embedded
    /// target field
    Embedded { field: String },

    /// An embedded target field assigned a whole value rather than a literal
    EmbeddedWhole,

    /// A key inside a JSON container column
    Json {
        /// Field path of the container column
        container: Vec<String>,

        /// External key path inside the container
        path: Vec<String>,
    },
}

impl RawRelation {
    /// `account.namespace`
    pub fn target_dotted(&self) -> String {
        self.target.join(".")
    }

    /// Dotted JSON key path, for JSON relations.
    pub fn json_path(&self) -> Option<String> {
        match &self.shape {
            Shape::Json { path, .. } => Some(path.join(".")),
            _ => None,
        }
    }

    /// Nested object the JSON key lives in; empty for top-level keys.
    pub fn json_object(&self) -> Option<String> {
        match &self.shape {
            Shape::Json { path, .. } => Some(path[..path.len().saturating_sub(1)].join(".")),
            _ => None,
        }
    }
}

use serde::Deserialize;

/// Configuration for inference and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Call paths recognized as single-column JSON constructors, e.g. `Json(..)`.
    ///
    /// Matched against the last segment of the call path as well as the full path.
    pub json_constructors: Vec<String>,

    /// Call paths recognized as JSON array constructors, e.g. `JsonArray(..)`.
    pub json_array_constructors: Vec<String>,

    /// Declared field type wrappers marking a JSON container, e.g. `Json<T>`.
    pub json_wrappers: Vec<String>,

    /// Suffix appended to the source type name to find its change-tracking mirror.
    pub changes_suffix: String,

    /// Method on the source value returning the change-tracking mirror.
    pub changes_method: String,

    /// Path of the patch map type used by generated code.
    pub patch_type: String,

    /// Path of the JSON merge-set builder used by generated code.
    pub merge_set_type: String,

    /// Suffix appended to the conversion function name to name the generated function.
    pub fn_suffix: String,

    /// Fail inference when two mapping groups write the same column.
    pub deny_duplicate_columns: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            json_constructors: vec!["Json".to_string()],
            json_array_constructors: vec!["JsonArray".to_string()],
            json_wrappers: vec!["Json".to_string(), "JsonArray".to_string()],
            changes_suffix: "Changes".to_string(),
            changes_method: "changes".to_string(),
            patch_type: "rowpatch::Patch".to_string(),
            merge_set_type: "rowpatch::JsonMergeSet".to_string(),
            fn_suffix: "_patch".to_string(),
            deny_duplicate_columns: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a JSON constructor call path
    pub fn json_constructor(mut self, path: impl Into<String>) -> Self {
        self.json_constructors.push(path.into());
        self
    }

    /// Add a JSON array constructor call path
    pub fn json_array_constructor(mut self, path: impl Into<String>) -> Self {
        self.json_array_constructors.push(path.into());
        self
    }

    /// Add a JSON container type wrapper
    pub fn json_wrapper(mut self, name: impl Into<String>) -> Self {
        self.json_wrappers.push(name.into());
        self
    }

    /// Set the change-tracking type suffix
    pub fn changes_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.changes_suffix = suffix.into();
        self
    }

    /// Set the change-tracking accessor method
    pub fn changes_method(mut self, method: impl Into<String>) -> Self {
        self.changes_method = method.into();
        self
    }

    /// Set the patch map type path
    pub fn patch_type(mut self, path: impl Into<String>) -> Self {
        self.patch_type = path.into();
        self
    }

    /// Set the JSON merge-set type path
    pub fn merge_set_type(mut self, path: impl Into<String>) -> Self {
        self.merge_set_type = path.into();
        self
    }

    /// Set the generated function name suffix
    pub fn fn_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.fn_suffix = suffix.into();
        self
    }

    /// Fail on columns written by more than one group
    pub fn deny_duplicate_columns(mut self, deny: bool) -> Self {
        self.deny_duplicate_columns = deny;
        self
    }

    pub(crate) fn is_json_constructor(&self, path: &syn::Path) -> bool {
        path_matches(path, &self.json_constructors)
    }

    pub(crate) fn is_json_array_constructor(&self, path: &syn::Path) -> bool {
        path_matches(path, &self.json_array_constructors)
    }

    pub(crate) fn is_json_wrapper(&self, ty: &syn::Type) -> bool {
        let syn::Type::Path(ty) = ty else {
            return false;
        };

        path_matches(&ty.path, &self.json_wrappers)
    }
}

/// Matches either the full `a::b::C` rendering of `path` or its last segment.
fn path_matches(path: &syn::Path, candidates: &[String]) -> bool {
    let Some(last) = path.segments.last() else {
        return false;
    };

    let full = path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");

    candidates
        .iter()
        .any(|candidate| *candidate == full || last.ident == candidate.as_str())
}

use crate::Error;

use indexmap::IndexMap;
use serde::Serialize;

/// Partial writes into a JSON object column.
///
/// Each entry sets one dotted path (`profile.bio`). Applying the set to a
/// stored object leaves every other key untouched.
#[derive(Debug, Default)]
pub struct JsonMergeSet {
    entries: IndexMap<String, serde_json::Value>,

    /// First serialization failure
    error: Option<Error>,
}

impl JsonMergeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `path` to `value`. A later write to the same path replaces the
    /// earlier one.
    pub fn set(&mut self, path: &str, value: impl Serialize) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(path.to_string(), value);
            }
            Err(err) => {
                self.error.get_or_insert_with(|| Error::at_path(path, err));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&serde_json::Value> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths set, in write order
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> + '_ {
        self.entries.iter().map(|(path, value)| (path.as_str(), value))
    }

    /// Apply the writes to `target`, creating intermediate objects as needed.
    /// A non-object found on the way is replaced by an object.
    pub fn apply(&self, target: &mut serde_json::Value) {
        for (path, value) in &self.entries {
            let mut node = &mut *target;

            for key in path.split('.') {
                if !node.is_object() {
                    *node = serde_json::Value::Object(serde_json::Map::new());
                }

                node = match node {
                    serde_json::Value::Object(map) => {
                        map.entry(key).or_insert(serde_json::Value::Null)
                    }
                    other => other,
                };
            }

            *node = value.clone();
        }
    }

    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

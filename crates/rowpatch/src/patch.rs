use crate::{Error, JsonMergeSet};

use indexmap::IndexMap;
use serde::Serialize;

/// Column writes of a partial row update.
#[derive(Debug, Default)]
pub struct Patch {
    columns: IndexMap<String, Value>,

    /// First serialization failure
    error: Option<Error>,
}

/// A value written to one column.
#[derive(Debug)]
pub enum Value {
    /// Replace the stored value
    Set(serde_json::Value),

    /// Merge paths into the stored JSON object
    Merge(JsonMergeSet),
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` to `column`, replacing any earlier write.
    pub fn set(&mut self, column: &str, value: impl Serialize) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.columns.insert(column.to_string(), Value::Set(value));
            }
            Err(err) => {
                self.error.get_or_insert_with(|| Error::new(column, err));
            }
        }
    }

    /// Merge `merge` into the JSON object stored in `column`.
    pub fn merge(&mut self, column: &str, mut merge: JsonMergeSet) {
        if let Some(err) = merge.take_error() {
            self.error.get_or_insert_with(|| err.in_column(column));
        }
        self.columns.insert(column.to_string(), Value::Merge(merge));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns written, in write order
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.columns.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Fails with the first value that could not be serialized.
    pub fn check(&self) -> Result<(), &Error> {
        match &self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply the writes to a stored row held as a JSON object.
    pub fn apply(&self, row: &mut serde_json::Map<String, serde_json::Value>) {
        for (column, value) in &self.columns {
            match value {
                Value::Set(value) => {
                    row.insert(column.clone(), value.clone());
                }
                Value::Merge(merge) => {
                    let stored = row.entry(column.clone()).or_insert(serde_json::Value::Null);
                    merge.apply(stored);
                }
            }
        }
    }
}

use serde::{Deserialize, Serialize};

/// A value stored as a single JSON column.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

/// A sequence stored as a single JSON array column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonArray<T>(pub Vec<T>);

impl<T> Default for JsonArray<T> {
    fn default() -> Self {
        Self(vec![])
    }
}

impl<T> FromIterator<T> for JsonArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

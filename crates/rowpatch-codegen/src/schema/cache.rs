use super::TypeDeclaration;

use indexmap::IndexMap;
use std::sync::Arc;

/// Memo of resolved types keyed by the requested type name.
///
/// A cache lives for one run and is passed by reference into the resolver;
/// nothing is shared between runs.
#[derive(Debug, Default)]
pub struct TypeCache {
    types: IndexMap<String, Arc<TypeDeclaration>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<TypeDeclaration>> {
        self.types.get(name).cloned()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, ty: Arc<TypeDeclaration>) {
        self.types.insert(name.into(), ty);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

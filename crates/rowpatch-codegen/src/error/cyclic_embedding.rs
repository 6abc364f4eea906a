use super::{Error, ErrorKind};

/// Error when a type embeds itself, directly or through other embedded types.
#[derive(Debug)]
pub(super) struct CyclicEmbeddingError {
    cycle: Vec<String>,
}

impl std::error::Error for CyclicEmbeddingError {}

impl core::fmt::Display for CyclicEmbeddingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "cyclic embedding: {}", self.cycle.join(" -> "))
    }
}

impl Error {
    /// Creates a cyclic embedding error. `cycle` lists the type names along
    /// the embedding chain, ending with the repeated type.
    pub fn cyclic_embedding(cycle: Vec<String>) -> Error {
        Error::from(ErrorKind::CyclicEmbedding(CyclicEmbeddingError { cycle }))
    }

    /// Returns `true` if this error, or its root cause, is a cyclic embedding error.
    pub fn is_cyclic_embedding(&self) -> bool {
        matches!(self.root().kind(), ErrorKind::CyclicEmbedding(_))
    }
}

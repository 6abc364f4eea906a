//! Fixtures shared by the integration tests.

use proc_macro2::TokenStream;
use rowpatch_codegen::{
    Config, GeneratedArtifact, Inference, MappingGroup, Request, Result, Workspace,
};

/// A single-module workspace holding the types and the conversion function
/// under test.
pub struct Fixture {
    workspace: Workspace,
    config: Config,
}

impl Fixture {
    pub fn new(tokens: TokenStream) -> Self {
        Self {
            workspace: Workspace::from_tokens(tokens).unwrap(),
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Add another module to the workspace.
    pub fn module(mut self, module: &str, tokens: TokenStream) -> Self {
        self.workspace
            .add_file(module, syn::parse2(tokens).unwrap());
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn try_infer(&self, request: &Request) -> Result<Inference> {
        rowpatch_codegen::infer(&self.workspace, request, &self.config)
    }

    pub fn infer(&self, function: &str) -> Inference {
        match self.try_infer(&Request::new(function)) {
            Ok(inference) => inference,
            Err(err) => panic!("inference of `{function}` failed: {err}"),
        }
    }

    pub fn generate(&self, function: &str) -> GeneratedArtifact {
        match rowpatch_codegen::generate(&self.workspace, &Request::new(function), &self.config) {
            Ok(artifact) => artifact,
            Err(err) => panic!("generating `{function}` failed: {err}"),
        }
    }
}

/// Columns written by each group, in output order.
pub fn group_columns(groups: &[MappingGroup]) -> Vec<Vec<&str>> {
    groups.iter().map(MappingGroup::columns).collect()
}

/// Guard triggers of each group, in output order.
pub fn group_triggers(groups: &[MappingGroup]) -> Vec<Vec<&str>> {
    groups.iter().map(MappingGroup::triggers).collect()
}

/// Every non-empty subset of `items`, each in the order of `items`.
pub fn subsets<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    assert!(items.len() < 16, "too many items to enumerate");

    (1..1u32 << items.len())
        .map(|mask| {
            items
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, item)| item.clone())
                .collect()
        })
        .collect()
}

/// Byte offset of `needle` in `text`, failing the test when it is absent.
pub fn offset_of(text: &str, needle: &str) -> usize {
    match text.find(needle) {
        Some(offset) => offset,
        None => panic!("`{needle}` not found in:\n{text}"),
    }
}

/// Asserts that `needles` appear in `text` in the given order.
#[macro_export]
macro_rules! assert_in_order {
    ($text:expr, [ $( $needle:expr ),+ $(,)? ]) => {{
        let text: &str = &$text;
        let offsets = [ $( $crate::offset_of(text, $needle) ),+ ];
        assert!(
            offsets.windows(2).all(|pair| pair[0] < pair[1]),
            "out of order: {:?}\n{}",
            offsets,
            text
        );
    }};
}

pub mod bindings;
pub use bindings::{Bindings, Source};

pub mod classify;
pub use classify::{MappingGroup, MappingKind, Member};

mod config;
pub use config::Config;

pub mod env;
pub use env::{Environment, FunctionBody, Workspace};

mod error;
pub use error::{Error, Result};

pub mod extract;
pub use extract::RawRelation;

pub mod render;
pub use render::GeneratedArtifact;

pub mod schema;
pub use schema::{TypeCache, TypeDeclaration};

mod util;

use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Which conversion function to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Conversion function name
    pub function: String,

    /// Type whose `impl` blocks hold the function; `None` for free functions
    pub receiver: Option<String>,

    /// Source type; defaults to the function's parameter type
    pub source: Option<String>,

    /// Target type; defaults to the function's return type
    pub target: Option<String>,
}

impl Request {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            receiver: None,
            source: None,
            target: None,
        }
    }

    /// Look the function up in the `impl` blocks of `receiver`
    pub fn receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    /// Override the source type
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Override the target type
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// The inferred mapping of one conversion function.
#[derive(Debug)]
pub struct Inference {
    pub conversion: FunctionBody,
    pub source: Arc<TypeDeclaration>,
    pub target: Arc<TypeDeclaration>,

    /// Change-tracking mirror of the source type, when it could be found
    pub changes: Option<Arc<TypeDeclaration>>,

    /// Mapping groups in output order
    pub groups: Vec<MappingGroup>,

    /// Target columns no group writes, in declaration order
    pub missing_columns: Vec<String>,

    /// Soft errors: unrecognized expressions, unresolved embedded types and
    /// duplicate writers
    pub diagnostics: Vec<Error>,
}

/// Infer the mapping between the source and target types of a conversion
/// function.
pub fn infer(env: &dyn Environment, request: &Request, config: &Config) -> Result<Inference> {
    let conversion =
        env::find_conversion_function(env, request.receiver.as_deref(), &request.function)?;

    let mut cache = TypeCache::new();
    let source_name = request.source.as_deref().unwrap_or(&conversion.source);
    let target_name = request.target.as_deref().unwrap_or(&conversion.target);

    let source = schema::resolve_type(env, &mut cache, config, source_name)
        .map_err(|err| err.context(format!("source type of `{}`", conversion.name)))?;
    let target = schema::resolve_type(env, &mut cache, config, target_name)
        .map_err(|err| err.context(format!("target type of `{}`", conversion.name)))?;

    check_unique_columns(&target)?;

    let mut diagnostics = vec![];
    diagnostics.extend(source.unresolved.iter().cloned());
    diagnostics.extend(target.unresolved.iter().cloned());

    let changes = match schema::change_tracking_of(env, &mut cache, config, &source) {
        Ok(changes) => Some(changes),
        Err(err) if err.is_type_not_found() => {
            let err = err.recovered(format!("change-tracking type of `{}`", source.name));
            tracing::warn!(error = %err, "guards are rendered without checking the change-tracking type");
            diagnostics.push(err);
            None
        }
        Err(err) => return Err(err),
    };

    let extraction = extract::extract(env, &mut cache, config, &conversion, &source, &target);
    diagnostics.extend(extraction.diagnostics);

    let groups = classify::classify(extraction.relations, &target);
    let missing_columns = classify::missing_columns(&groups, &target);

    if let Some(changes) = &changes {
        let untracked: IndexSet<&str> = groups
            .iter()
            .flat_map(MappingGroup::triggers)
            .filter(|trigger| changes.field(trigger).is_none())
            .collect();

        for trigger in untracked {
            let err = Error::untracked_field(&changes.name, trigger);
            tracing::warn!(error = %err, "guard will not compile");
            diagnostics.push(err);
        }
    }

    for column in render::duplicate_writers(&groups) {
        let err = Error::duplicate_column(&column, format!("patch for `{}`", conversion.name));
        if config.deny_duplicate_columns {
            return Err(err);
        }
        tracing::warn!(error = %err, "keeping the first writer");
        diagnostics.push(err);
    }

    tracing::debug!(
        function = %conversion.name,
        groups = groups.len(),
        missing = ?missing_columns,
        diagnostics = diagnostics.len(),
        "inferred mapping"
    );

    Ok(Inference {
        conversion,
        source,
        target,
        changes,
        groups,
        missing_columns,
        diagnostics,
    })
}

/// Infer the mapping and render the patch function.
pub fn generate(env: &dyn Environment, request: &Request, config: &Config) -> Result<GeneratedArtifact> {
    let inference = infer(env, request, config)?;
    Ok(render::render(
        &inference.groups,
        &inference.target,
        &inference.conversion,
        config,
    ))
}

fn check_unique_columns(target: &TypeDeclaration) -> Result<()> {
    let mut seen = IndexMap::new();

    for column in target.columns() {
        if let Some(previous) = seen.insert(column.name.clone(), column.access.join(".")) {
            return Err(Error::duplicate_column(&column.name, &target.name).context(format!(
                "`{previous}` and `{}` map to the same column",
                column.access.join(".")
            )));
        }
    }

    Ok(())
}

mod attr;

mod cache;
pub use cache::TypeCache;

mod field;
pub use field::{FieldDeclaration, FieldKind};

pub(crate) mod name;

mod ty;
pub use ty::{Column, TypeDeclaration};

use crate::{env::Environment, Config, Error, Result};

use std::sync::Arc;

/// Resolve a struct type by name, flattening embedded fields recursively.
///
/// Results are memoized in `cache`. An embedded field whose type cannot be
/// found stays unflattened and is recorded in
/// [`TypeDeclaration::unresolved`]; a type that embeds itself fails with a
/// cyclic embedding error.
pub fn resolve_type(
    env: &dyn Environment,
    cache: &mut TypeCache,
    config: &Config,
    name: &str,
) -> Result<Arc<TypeDeclaration>> {
    Resolver {
        env,
        cache,
        config,
        visiting: vec![],
    }
    .resolve(name)
}

/// Resolve the change-tracking mirror of `source`: the type named
/// `<Source><changes_suffix>` with one optional field per source field.
pub fn change_tracking_of(
    env: &dyn Environment,
    cache: &mut TypeCache,
    config: &Config,
    source: &TypeDeclaration,
) -> Result<Arc<TypeDeclaration>> {
    let name = format!("{}{}", source.name, config.changes_suffix);
    resolve_type(env, cache, config, &name)
}

struct Resolver<'a> {
    env: &'a dyn Environment,
    cache: &'a mut TypeCache,
    config: &'a Config,

    /// Types currently being resolved, outermost first
    visiting: Vec<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<Arc<TypeDeclaration>> {
        let key = normalize(name);

        if let Some(ty) = self.cache.get(&key) {
            return Ok(ty);
        }

        if let Some(start) = self.visiting.iter().position(|visiting| *visiting == key) {
            let mut cycle = self.visiting[start..].to_vec();
            cycle.push(key);
            return Err(Error::cyclic_embedding(cycle));
        }

        let env = self.env;
        let item = env
            .find_struct(&key)
            .ok_or_else(|| Error::type_not_found(&key))?;

        let syn::Fields::Named(named) = &item.fields else {
            return Err(Error::type_not_found(&key).context("expected a struct with named fields"));
        };

        self.visiting.push(key.clone());
        let resolved = self.resolve_fields(&key, item, named);
        self.visiting.pop();

        let ty = Arc::new(resolved?);
        tracing::debug!(ty = %key, fields = ty.fields.len(), "resolved type");
        self.cache.insert(key, ty.clone());
        Ok(ty)
    }

    fn resolve_fields(
        &mut self,
        name: &str,
        item: &syn::ItemStruct,
        named: &syn::FieldsNamed,
    ) -> Result<TypeDeclaration> {
        let rename_rule = attr::serde_rename_all(&item.attrs);
        let config = self.config;
        let mut fields = vec![];
        let mut unresolved = vec![];

        for node in &named.named {
            let Some(mut field) =
                FieldDeclaration::from_ast(node, rename_rule, |ty| config.is_json_wrapper(ty))
            else {
                continue;
            };

            if let FieldKind::Embedded { ty, fields: nested, .. } = &mut field.kind {
                match self.resolve(ty) {
                    Ok(embedded) => {
                        *nested = Some(embedded.fields.clone());
                        unresolved.extend(embedded.unresolved.iter().cloned());
                    }
                    Err(err) if err.is_type_not_found() => {
                        tracing::warn!(ty = %name, field = %field.name, error = %err, "embedded type not resolved; leaving field unflattened");
                        unresolved
                            .push(err.recovered(format!("embedded field `{name}.{}`", field.name)));
                    }
                    Err(err) => return Err(err),
                }
            }

            fields.push(field);
        }

        Ok(TypeDeclaration {
            name: name.to_string(),
            fields,
            unresolved,
        })
    }
}

fn normalize(name: &str) -> String {
    let mut name = name.trim_start_matches("::");
    for prefix in ["crate::", "self::"] {
        while let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }
    name.to_string()
}

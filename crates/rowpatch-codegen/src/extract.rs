mod relation;
pub use relation::{RawRelation, Shape};

use crate::{
    bindings::{Bindings, Helpers, Source},
    env::{Environment, FunctionBody},
    schema::{self, FieldDeclaration, FieldKind, TypeCache, TypeDeclaration},
    util, Config, Error,
};

use indexmap::IndexMap;

/// Relations found in a conversion function, plus the expressions that could
/// not be attributed to a source field.
#[derive(Debug, Default)]
pub struct Extraction {
    pub relations: Vec<RawRelation>,
    pub diagnostics: Vec<Error>,
}

/// Walk the literal returned by `function` and produce one relation per
/// target value.
///
/// Values outside the recognized expression grammar are reported as
/// unrecognized expression diagnostics and produce no relation.
pub fn extract(
    env: &dyn Environment,
    cache: &mut TypeCache,
    config: &Config,
    function: &FunctionBody,
    source: &TypeDeclaration,
    target: &TypeDeclaration,
) -> Extraction {
    let bindings = Bindings::collect(&function.param, &function.block);

    let mut extractor = Extractor {
        env,
        cache,
        config,
        source,
        bindings: &bindings,
        helpers: Helpers::new(env, source),
        out: Extraction::default(),
        order: 0,
    };

    match extractor.terminal(&function.block) {
        Some(syn::Expr::Struct(lit)) if is_target_literal(lit, target) => {
            extractor.walk_struct(lit, &target.fields, &[], None);
        }
        Some(expr) => {
            extractor.unrecognized(&[target.ident().to_string()], expr);
        }
        None => {
            let err = Error::unrecognized_expression(target.ident(), format!("fn {}", function.name))
                .context("conversion function has no tail expression");
            tracing::warn!(function = %function.name, error = %err, "no relations extracted");
            extractor.out.diagnostics.push(err);
        }
    }

    tracing::debug!(
        function = %function.name,
        relations = extractor.out.relations.len(),
        diagnostics = extractor.out.diagnostics.len(),
        "extracted relations"
    );

    extractor.out
}

struct Extractor<'a> {
    env: &'a dyn Environment,
    cache: &'a mut TypeCache,
    config: &'a Config,
    source: &'a TypeDeclaration,
    bindings: &'a Bindings,
    helpers: Helpers<'a>,
    out: Extraction,

    /// Next relation order
    order: usize,
}

impl<'a> Extractor<'a> {
    /// The returned expression with `Ok(..)`, `Some(..)`, `Box::new(..)`,
    /// references and locals unwrapped.
    fn terminal(&self, block: &'a syn::Block) -> Option<&'a syn::Expr> {
        let mut expr = match block.stmts.last()? {
            syn::Stmt::Expr(syn::Expr::Return(ret), _) => ret.expr.as_deref()?,
            syn::Stmt::Expr(expr, None) => expr,
            _ => return None,
        };

        loop {
            expr = self.bindings.follow(expr);

            let syn::Expr::Call(call) = expr else {
                return Some(expr);
            };
            let syn::Expr::Path(func) = &*call.func else {
                return Some(expr);
            };

            let wrapper = util::path_string(&func.path);
            if call.args.len() == 1 && matches!(wrapper.as_str(), "Ok" | "Some" | "Box::new") {
                expr = &call.args[0];
            } else {
                return Some(expr);
            }
        }
    }

    fn walk_struct(
        &mut self,
        lit: &'a syn::ExprStruct,
        fields: &'a [FieldDeclaration],
        access: &[String],
        embedded: Option<&str>,
    ) {
        for value in &lit.fields {
            let syn::Member::Named(ident) = &value.member else {
                continue;
            };
            let name = ident.to_string();

            let mut target = access.to_vec();
            target.push(name.clone());

            let Some(field) = fields.iter().find(|field| field.name == name) else {
                tracing::warn!(target = %target.join("."), "literal sets a field the target type does not declare");
                continue;
            };

            let shape = match embedded {
                Some(field) => Shape::Embedded {
                    field: field.to_string(),
                },
                None => Shape::Direct,
            };

            match &field.kind {
                FieldKind::Embedded {
                    fields: Some(nested),
                    ..
                } => match self.bindings.follow(&value.expr) {
                    syn::Expr::Struct(inner) => {
                        self.walk_struct(inner, nested, &target, Some(embedded.unwrap_or(&name)));
                    }
                    _ => self.read(&target, &value.expr, Shape::EmbeddedWhole),
                },
                FieldKind::Json => self.json_field(&target, &value.expr, shape),
                _ => self.read(&target, &value.expr, shape),
            }
        }
    }

    /// A value assigned to a JSON container field: a literal, a JSON
    /// constructor wrapping a literal, or a whole-column value.
    fn json_field(&mut self, target: &[String], expr: &'a syn::Expr, shape: Shape) {
        match self.bindings.follow(expr) {
            syn::Expr::Struct(lit) => {
                self.walk_json(lit, target, &[], target.to_vec());
                return;
            }
            syn::Expr::Call(call) if call.args.len() == 1 => {
                if let syn::Expr::Path(func) = &*call.func {
                    if self.config.is_json_constructor(&func.path) {
                        if let syn::Expr::Struct(lit) = self.bindings.follow(&call.args[0]) {
                            let mut access = target.to_vec();
                            access.push("0".to_string());
                            self.walk_json(lit, target, &[], access);
                            return;
                        }
                    }
                }
            }
            _ => {}
        }

        self.read(target, expr, shape);
    }

    fn walk_json(
        &mut self,
        lit: &'a syn::ExprStruct,
        container: &[String],
        path: &[String],
        access: Vec<String>,
    ) {
        let keys = self.json_keys(lit);

        for value in &lit.fields {
            let syn::Member::Named(ident) = &value.member else {
                continue;
            };
            let name = ident.to_string();

            let mut json_path = path.to_vec();
            json_path.push(keys.get(&name).cloned().unwrap_or_else(|| name.clone()));

            let mut target = access.clone();
            target.push(name);

            match self.bindings.follow(&value.expr) {
                syn::Expr::Struct(nested) => self.walk_json(nested, container, &json_path, target),
                _ => self.read(
                    &target,
                    &value.expr,
                    Shape::Json {
                        container: container.to_vec(),
                        path: json_path,
                    },
                ),
            }
        }
    }

    /// External JSON keys of the literal's struct by field name. Empty when
    /// the struct cannot be resolved; keys then default to field names.
    fn json_keys(&mut self, lit: &syn::ExprStruct) -> IndexMap<String, String> {
        let name = lit
            .path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");

        match schema::resolve_type(self.env, self.cache, self.config, &name) {
            Ok(ty) => ty
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.json_key.clone()))
                .collect(),
            Err(err) => {
                tracing::debug!(ty = %name, error = %err, "JSON object type not resolved; using field names as keys");
                IndexMap::new()
            }
        }
    }

    fn read(&mut self, target: &[String], expr: &'a syn::Expr, shape: Shape) {
        let source = self.source_of(expr).filter(|source| self.reachable(source));

        let Some(source) = source else {
            self.unrecognized(target, expr);
            return;
        };

        let relation = RawRelation {
            target: target.to_vec(),
            source,
            shape,
            order: self.order,
        };
        self.order += 1;

        tracing::debug!(
            target = %relation.target_dotted(),
            source = %relation.source,
            shape = ?relation.shape,
            order = relation.order,
            "relation"
        );
        self.out.relations.push(relation);
    }

    fn source_of(&mut self, expr: &'a syn::Expr) -> Option<Source> {
        // The array constructor stores the collection as is; element
        // transforms are resolved with the collection read.
        if let syn::Expr::Call(call) = self.bindings.follow(expr) {
            if let syn::Expr::Path(func) = &*call.func {
                if call.args.len() == 1 && self.config.is_json_array_constructor(&func.path) {
                    return self.bindings.resolve(&call.args[0], &mut self.helpers);
                }
            }
        }

        self.bindings.resolve(expr, &mut self.helpers)
    }

    /// Reads must start at a field of the source type.
    fn reachable(&self, source: &Source) -> bool {
        match source {
            Source::Field(read) => read
                .trigger()
                .is_some_and(|trigger| self.source.field(trigger).is_some()),
            Source::Method(read) => !read.reads.is_empty(),
        }
    }

    fn unrecognized(&mut self, target: &[String], expr: &syn::Expr) {
        let err = Error::unrecognized_expression(target.join("."), util::compact(expr));
        tracing::warn!(error = %err, "target value not mapped");
        self.out.diagnostics.push(err);
    }
}

fn is_target_literal(lit: &syn::ExprStruct, target: &TypeDeclaration) -> bool {
    lit.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "Self" || segment.ident == target.ident())
}

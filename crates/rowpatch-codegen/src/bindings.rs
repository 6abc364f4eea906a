mod helpers;
pub(crate) use helpers::Helpers;

mod source;
pub use source::{Conversion, MethodRead, Source, SourceExpression};

use crate::util;

use indexmap::{IndexMap, IndexSet};
use syn::visit::Visit;

/// Local variables of a conversion function body and the expression each was
/// first bound to.
///
/// Only the first binding of a name is kept; later reassignments, including
/// those inside branches, are ignored.
#[derive(Debug, Clone)]
pub struct Bindings {
    /// The conversion function's parameter
    param: String,

    /// Local name to bound expression, in order of first binding
    locals: IndexMap<String, syn::Expr>,
}

impl Bindings {
    /// Collect the bindings of `block`, walking nested blocks and branches in
    /// source order.
    pub fn collect(param: &str, block: &syn::Block) -> Self {
        let mut collector = Collector {
            param,
            locals: IndexMap::new(),
            declared: IndexSet::new(),
        };
        collector.visit_block(block);

        tracing::trace!(locals = ?collector.locals.keys().collect::<Vec<_>>(), "collected bindings");

        Self {
            param: param.to_string(),
            locals: collector.locals,
        }
    }

    /// Strip parentheses, references and dereferences, and follow locals to
    /// the expression they are bound to.
    pub(crate) fn follow<'b>(&'b self, mut expr: &'b syn::Expr) -> &'b syn::Expr {
        let mut visiting = vec![];

        loop {
            expr = strip(expr);

            let Some(name) = local_name(expr) else {
                return expr;
            };

            if name == self.param || visiting.contains(&name) {
                return expr;
            }

            match self.locals.get(&name) {
                Some(bound) => {
                    visiting.push(name);
                    expr = bound;
                }
                None => return expr,
            }
        }
    }

    /// Resolve a value expression to the source it reads.
    ///
    /// Returns `None` when the expression is outside the recognized grammar.
    pub(crate) fn resolve(&self, expr: &syn::Expr, helpers: &mut Helpers<'_>) -> Option<Source> {
        self.resolve_in(expr, helpers, &mut vec![])
    }

    fn resolve_in(
        &self,
        expr: &syn::Expr,
        helpers: &mut Helpers<'_>,
        visiting: &mut Vec<String>,
    ) -> Option<Source> {
        match strip(expr) {
            syn::Expr::Path(path) => {
                let name = path.path.get_ident()?.to_string();

                if name == self.param {
                    return Some(Source::Field(SourceExpression::param(&self.param)));
                }

                if visiting.contains(&name) {
                    return None;
                }

                let bound = self.locals.get(&name)?;
                visiting.push(name);
                let resolved = self.resolve_in(bound, helpers, visiting);
                visiting.pop();
                resolved
            }
            syn::Expr::Field(field) => {
                let member = match &field.member {
                    syn::Member::Named(ident) => ident.to_string(),
                    syn::Member::Unnamed(index) => index.index.to_string(),
                };

                match self.resolve_in(&field.base, helpers, visiting)? {
                    Source::Field(read) => Some(Source::Field(read.field(member))),
                    // `user.address().city` still depends on what the helper reads
                    Source::Method(read) => Some(Source::Method(read)),
                }
            }
            syn::Expr::MethodCall(call) => {
                let method = call.method.to_string();

                let receiver = if self.is_param(&call.receiver) {
                    Source::Method(helpers.method(&self.param, &method)?)
                } else {
                    match self.resolve_in(&call.receiver, helpers, visiting)? {
                        Source::Field(read) => Source::Field(read.convert(Conversion::Method {
                            name: method.clone(),
                            args: !call.args.is_empty(),
                        })),
                        read => read,
                    }
                };

                self.with_args(receiver, &method, call, helpers, visiting)
            }
            // `|tag| user.label(tag)` as an argument of an iterator adapter
            syn::Expr::Closure(closure) => self.resolve_in(&closure.body, helpers, visiting),
            syn::Expr::Call(call) => {
                let syn::Expr::Path(func) = &*call.func else {
                    return None;
                };

                if call.args.len() != 1 {
                    return None;
                }
                let arg = &call.args[0];

                if self.is_param(arg) {
                    // `helper(user)` or `User::helper(user)`
                    return match func.path.get_ident() {
                        Some(ident) => helpers.function(&self.param, &ident.to_string()),
                        None => {
                            let method = func.path.segments.last()?.ident.to_string();
                            helpers.method(&self.param, &method)
                        }
                    }
                    .map(Source::Method);
                }

                match self.resolve_in(arg, helpers, visiting)? {
                    Source::Field(read) => Some(Source::Field(
                        read.convert(Conversion::Wrap(util::path_string(&func.path))),
                    )),
                    Source::Method(read) => Some(Source::Method(read)),
                }
            }
            syn::Expr::Try(expr) => match self.resolve_in(&expr.expr, helpers, visiting)? {
                Source::Field(read) => Some(Source::Field(read.convert(Conversion::Try))),
                read => Some(read),
            },
            syn::Expr::Cast(cast) => match self.resolve_in(&cast.expr, helpers, visiting)? {
                Source::Field(read) => Some(Source::Field(
                    read.convert(Conversion::Cast(util::type_string(&cast.ty))),
                )),
                read => Some(read),
            },
            _ => None,
        }
    }

    /// Fold the source fields read by the arguments of `call` into the read
    /// of its receiver. Arguments that do not depend on the parameter are
    /// ignored; an argument that does but cannot be resolved makes the whole
    /// call unrecognized.
    fn with_args(
        &self,
        receiver: Source,
        method: &str,
        call: &syn::ExprMethodCall,
        helpers: &mut Helpers<'_>,
        visiting: &mut Vec<String>,
    ) -> Option<Source> {
        let mut fields: IndexSet<String> =
            receiver.triggers().into_iter().map(str::to_string).collect();
        let mut inspected = !matches!(&receiver, Source::Method(read) if !read.inspected);
        let mut name = None;
        let mut extended = false;

        for arg in &call.args {
            if !self.depends_on_param(arg, &mut vec![]) {
                continue;
            }

            let read = self.resolve_in(arg, helpers, visiting)?;
            if read.triggers().is_empty() {
                // The whole source value is passed along
                return None;
            }

            for trigger in read.triggers() {
                extended |= fields.insert(trigger.to_string());
            }

            if let Source::Method(read) = &read {
                inspected &= read.inspected;
                name.get_or_insert_with(|| read.name.clone());
            }
        }

        if !extended {
            return Some(receiver);
        }

        let name = name.unwrap_or_else(|| method.to_string());
        Some(Source::Method(helpers.combined(
            &name,
            util::compact(call),
            fields,
            inspected,
        )))
    }

    /// Whether `expr` mentions the parameter, directly or through locals.
    fn depends_on_param(&self, expr: &syn::Expr, visiting: &mut Vec<String>) -> bool {
        let mut names = Names::default();
        names.visit_expr(expr);

        names.idents.into_iter().any(|name| {
            if name == self.param {
                return true;
            }
            if visiting.contains(&name) {
                return false;
            }
            let Some(bound) = self.locals.get(&name) else {
                return false;
            };

            visiting.push(name);
            let depends = self.depends_on_param(bound, visiting);
            visiting.pop();
            depends
        })
    }

    fn is_param(&self, expr: &syn::Expr) -> bool {
        local_name(strip(expr)).is_some_and(|name| name == self.param)
    }
}

/// Remove parentheses, invisible groups, `&` and `*`.
pub(crate) fn strip(mut expr: &syn::Expr) -> &syn::Expr {
    loop {
        expr = match expr {
            syn::Expr::Paren(paren) => &paren.expr,
            syn::Expr::Group(group) => &group.expr,
            syn::Expr::Reference(reference) => &reference.expr,
            syn::Expr::Unary(syn::ExprUnary {
                op: syn::UnOp::Deref(_),
                expr,
                ..
            }) => expr,
            _ => return expr,
        };
    }
}

fn local_name(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Path(path) if path.qself.is_none() => {
            path.path.get_ident().map(ToString::to_string)
        }
        _ => None,
    }
}

/// The single name bound by `pat`, looking through `Some(..)`, `Ok(..)`,
/// type ascriptions and references.
fn pattern_name(pat: &syn::Pat) -> Option<String> {
    match pat {
        // `None` and unit variants parse as identifiers too
        syn::Pat::Ident(ident) if ident.subpat.is_none() => {
            let name = ident.ident.to_string();
            (!name.starts_with(char::is_uppercase)).then_some(name)
        }
        syn::Pat::Type(ty) => pattern_name(&ty.pat),
        syn::Pat::Reference(reference) => pattern_name(&reference.pat),
        syn::Pat::Paren(paren) => pattern_name(&paren.pat),
        syn::Pat::TupleStruct(tuple) if tuple.elems.len() == 1 => {
            let last = tuple.path.segments.last()?;
            if last.ident == "Some" || last.ident == "Ok" {
                pattern_name(&tuple.elems[0])
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Single-identifier paths in an expression, including those inside macro
/// arguments.
#[derive(Default)]
struct Names {
    idents: IndexSet<String>,
}

impl Names {
    fn scan_tokens(&mut self, tokens: proc_macro2::TokenStream) {
        for token in tokens {
            match token {
                proc_macro2::TokenTree::Ident(ident) => {
                    self.idents.insert(ident.to_string());
                }
                proc_macro2::TokenTree::Group(group) => self.scan_tokens(group.stream()),
                _ => {}
            }
        }
    }
}

impl<'ast> Visit<'ast> for Names {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        if let Some(ident) = node.get_ident() {
            self.idents.insert(ident.to_string());
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_macro(&mut self, node: &'ast syn::Macro) {
        self.scan_tokens(node.tokens.clone());
    }
}

struct Collector<'p> {
    param: &'p str,
    locals: IndexMap<String, syn::Expr>,

    /// `let x;` declarations waiting for their first assignment
    declared: IndexSet<String>,
}

impl Collector<'_> {
    fn bind(&mut self, pat: &syn::Pat, expr: &syn::Expr) {
        let Some(name) = pattern_name(pat) else {
            return;
        };

        if name == self.param {
            tracing::debug!(local = %name, "local shadows the parameter; ignored");
            return;
        }

        self.locals.entry(name).or_insert_with(|| expr.clone());
    }
}

impl<'ast> Visit<'ast> for Collector<'_> {
    fn visit_local(&mut self, node: &'ast syn::Local) {
        match &node.init {
            Some(init) => self.bind(&node.pat, &init.expr),
            None => {
                if let Some(name) = pattern_name(&node.pat) {
                    self.declared.insert(name);
                }
            }
        }
        syn::visit::visit_local(self, node);
    }

    fn visit_expr_assign(&mut self, node: &'ast syn::ExprAssign) {
        if let Some(name) = local_name(&node.left) {
            if self.declared.shift_remove(&name) {
                self.locals.entry(name).or_insert_with(|| (*node.right).clone());
            }
        }
        syn::visit::visit_expr_assign(self, node);
    }

    // `if let` and `while let` conditions
    fn visit_expr_let(&mut self, node: &'ast syn::ExprLet) {
        self.bind(&node.pat, &node.expr);
        syn::visit::visit_expr_let(self, node);
    }

    fn visit_expr_match(&mut self, node: &'ast syn::ExprMatch) {
        for arm in &node.arms {
            self.bind(&arm.pat, &node.expr);
        }
        syn::visit::visit_expr_match(self, node);
    }

    // Closure parameters are not locals of the conversion function.
    fn visit_expr_closure(&mut self, _: &'ast syn::ExprClosure) {}

    fn visit_item(&mut self, _: &'ast syn::Item) {}
}

use super::MethodRead;
use crate::{env::Environment, schema::TypeDeclaration};

use indexmap::{IndexMap, IndexSet};
use proc_macro2::{TokenStream, TokenTree};
use syn::visit::Visit;

/// Works out which source fields a helper reads.
///
/// Helpers are methods on the source type (`user.full_address()`) or free
/// functions taking the source value (`full_address(user)`). Inspectable
/// bodies are scanned for field reads, following calls into other helpers;
/// helpers without a body read the field their name points at
/// (`get_city()` reads `city`).
pub(crate) struct Helpers<'a> {
    env: &'a dyn Environment,
    source: &'a TypeDeclaration,

    /// Memoized reads per helper; `None` when nothing could be attributed
    memo: IndexMap<HelperKey, Option<Reads>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum HelperKey {
    Method(String),
    Function(String),
}

#[derive(Debug, Clone)]
struct Reads {
    fields: IndexSet<String>,
    inspected: bool,
}

impl<'a> Helpers<'a> {
    pub(crate) fn new(env: &'a dyn Environment, source: &'a TypeDeclaration) -> Self {
        Self {
            env,
            source,
            memo: IndexMap::new(),
        }
    }

    /// `receiver.name()` on the source value.
    pub(crate) fn method(&mut self, receiver: &str, name: &str) -> Option<MethodRead> {
        let reads = self.reads(HelperKey::Method(name.to_string()), &mut vec![])?;
        Some(self.method_read(name, format!("{receiver}.{name}()"), reads))
    }

    /// `name(receiver)` taking the source value.
    pub(crate) fn function(&mut self, receiver: &str, name: &str) -> Option<MethodRead> {
        let reads = self.reads(HelperKey::Function(name.to_string()), &mut vec![])?;
        Some(self.method_read(name, format!("{name}({receiver})"), reads))
    }

    /// A call whose value depends on all of `fields`, e.g. a conversion that
    /// takes another source field as an argument.
    pub(crate) fn combined(
        &self,
        name: &str,
        call: String,
        fields: IndexSet<String>,
        inspected: bool,
    ) -> MethodRead {
        self.method_read(name, call, Reads { fields, inspected })
    }

    fn method_read(&self, name: &str, call: String, reads: Reads) -> MethodRead {
        // Declaration order keeps guards stable when helper bodies are reordered.
        let fields = self
            .source
            .fields
            .iter()
            .filter(|field| reads.fields.contains(&field.name))
            .map(|field| field.name.clone())
            .collect();

        MethodRead {
            name: name.to_string(),
            call,
            reads: fields,
            inspected: reads.inspected,
        }
    }

    fn reads(&mut self, key: HelperKey, visiting: &mut Vec<HelperKey>) -> Option<Reads> {
        if let Some(reads) = self.memo.get(&key) {
            return reads.clone();
        }

        if visiting.contains(&key) {
            // Recursive helpers contribute nothing beyond what the outer
            // call already collects.
            return Some(Reads {
                fields: IndexSet::new(),
                inspected: true,
            });
        }

        visiting.push(key.clone());
        let reads = self.compute(&key, visiting);
        visiting.pop();

        // A helper inside a call cycle misses what the helpers still on the
        // stack read; only the outermost result is complete.
        if visiting.is_empty() {
            tracing::debug!(helper = ?key, reads = ?reads.as_ref().map(|reads| &reads.fields), "helper reads");
            self.memo.insert(key, reads.clone());
        }
        reads
    }

    fn compute(&mut self, key: &HelperKey, visiting: &mut Vec<HelperKey>) -> Option<Reads> {
        let body = match key {
            HelperKey::Method(name) => self
                .env
                .find_method(&self.source.name, name)
                .filter(|method| method.sig.receiver().is_some())
                .map(|method| ("self".to_string(), &method.block)),
            HelperKey::Function(name) => {
                self.env.find_function(None, name).and_then(|item| {
                    let Some(syn::FnArg::Typed(arg)) = item.sig.inputs.first() else {
                        return None;
                    };
                    let syn::Pat::Ident(ident) = &*arg.pat else {
                        return None;
                    };
                    Some((ident.ident.to_string(), item.block))
                })
            }
        };

        let Some((receiver, block)) = body else {
            let name = match key {
                HelperKey::Method(name) | HelperKey::Function(name) => name,
            };
            return self.inferred(name);
        };

        let mut scan = Scan {
            receiver: &receiver,
            fields: IndexSet::new(),
            calls: vec![],
        };
        scan.visit_block(block);

        let Scan { fields, calls, .. } = scan;
        let mut fields: IndexSet<String> = fields
            .into_iter()
            .filter(|field| self.source.field(field).is_some())
            .collect();

        for call in calls {
            if let Some(nested) = self.reads(call, visiting) {
                fields.extend(nested.fields);
            }
        }

        Some(Reads {
            fields,
            inspected: true,
        })
    }

    /// Reads of a helper whose body is not available: `get_x` and `x` read
    /// field `x`.
    fn inferred(&self, name: &str) -> Option<Reads> {
        let field = name.strip_prefix("get_").unwrap_or(name);

        self.source.field(field).map(|field| Reads {
            fields: IndexSet::from([field.name.clone()]),
            inspected: false,
        })
    }
}

/// Collects `receiver.field` reads and helper calls in a body.
struct Scan<'r> {
    receiver: &'r str,
    fields: IndexSet<String>,
    calls: Vec<HelperKey>,
}

impl Scan<'_> {
    fn is_receiver(&self, expr: &syn::Expr) -> bool {
        match expr {
            syn::Expr::Path(path) => path.path.is_ident(self.receiver),
            syn::Expr::Paren(paren) => self.is_receiver(&paren.expr),
            syn::Expr::Reference(reference) => self.is_receiver(&reference.expr),
            syn::Expr::Unary(syn::ExprUnary {
                op: syn::UnOp::Deref(_),
                expr,
                ..
            }) => self.is_receiver(expr),
            _ => false,
        }
    }

    /// Macro arguments are not parsed as expressions; scan the raw tokens for
    /// `receiver . ident` sequences instead.
    fn scan_tokens(&mut self, tokens: TokenStream) {
        let tokens: Vec<TokenTree> = tokens.into_iter().collect();

        for (i, token) in tokens.iter().enumerate() {
            match token {
                TokenTree::Group(group) => self.scan_tokens(group.stream()),
                TokenTree::Ident(ident) if ident == self.receiver => {
                    let dot = matches!(tokens.get(i + 1), Some(TokenTree::Punct(p)) if p.as_char() == '.');
                    let Some(TokenTree::Ident(member)) = tokens.get(i + 2) else {
                        continue;
                    };
                    if !dot {
                        continue;
                    }

                    let called = matches!(
                        tokens.get(i + 3),
                        Some(TokenTree::Group(group)) if group.delimiter() == proc_macro2::Delimiter::Parenthesis
                    );
                    if called {
                        self.calls.push(HelperKey::Method(member.to_string()));
                    } else {
                        self.fields.insert(member.to_string());
                    }
                }
                _ => {}
            }
        }
    }
}

impl<'ast> Visit<'ast> for Scan<'_> {
    fn visit_expr_field(&mut self, node: &'ast syn::ExprField) {
        if self.is_receiver(&node.base) {
            if let syn::Member::Named(ident) = &node.member {
                self.fields.insert(ident.to_string());
            }
        }
        syn::visit::visit_expr_field(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        if self.is_receiver(&node.receiver) {
            self.calls.push(HelperKey::Method(node.method.to_string()));
        }
        syn::visit::visit_expr_method_call(self, node);
    }

    fn visit_expr_call(&mut self, node: &'ast syn::ExprCall) {
        if let syn::Expr::Path(func) = &*node.func {
            let passes_receiver = node.args.first().is_some_and(|arg| self.is_receiver(arg));
            if passes_receiver {
                if let Some(ident) = func.path.get_ident() {
                    self.calls.push(HelperKey::Function(ident.to_string()));
                } else if func.path.segments.len() == 2 {
                    // `Self::helper(self)` / `User::helper(user)`
                    let method = func.path.segments[1].ident.to_string();
                    self.calls.push(HelperKey::Method(method));
                }
            }
        }
        syn::visit::visit_expr_call(self, node);
    }

    fn visit_macro(&mut self, node: &'ast syn::Macro) {
        self.scan_tokens(node.tokens.clone());
    }
}

use crate::{util, Error, Result};

use proc_macro2::TokenStream;

/// Lookup interface over the source code being analyzed.
///
/// Locating items across files and modules is the environment's job; the
/// engine only asks for items by name.
pub trait Environment {
    /// Find a named-field struct by (possibly qualified) name.
    fn find_struct(&self, name: &str) -> Option<&syn::ItemStruct>;

    /// Find a function. With a receiver, searches `impl` blocks (inherent and
    /// trait impls) whose self type matches; without one, searches free
    /// functions.
    fn find_function(&self, receiver: Option<&str>, name: &str) -> Option<FnItem<'_>>;

    /// Find a method defined in any `impl` block of `receiver`.
    fn find_method(&self, receiver: &str, name: &str) -> Option<&syn::ImplItemFn> {
        self.find_function(Some(receiver), name)
            .and_then(|item| item.method)
    }
}

/// A function found by an [`Environment`].
#[derive(Debug, Clone, Copy)]
pub struct FnItem<'a> {
    pub sig: &'a syn::Signature,
    pub block: &'a syn::Block,

    /// Self type of the enclosing `impl` block, if any
    pub self_ty: Option<&'a syn::Type>,

    /// The method item when the function is defined in an `impl` block
    pub method: Option<&'a syn::ImplItemFn>,
}

/// How the generated code invokes the conversion function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStyle {
    /// `user_to_row(user)`
    Free,

    /// `user.to_row()`; carries the receiver as written (`&self`, `self`)
    Method { receiver: String },

    /// `UserRow::from(user)`
    Associated { self_ty: String },
}

/// The conversion function, with its single parameter resolved.
#[derive(Debug, Clone)]
pub struct FunctionBody {
    /// Function identifier
    pub name: String,

    /// Parameter name; `self` for methods
    pub param: String,

    /// Parameter type as written, with `Self` replaced
    pub param_ty: String,

    /// Source type name, references stripped
    pub source: String,

    /// Target type name, `Self` and `Result<T, _>` resolved
    pub target: String,

    /// Return type as written, with `Self` replaced
    pub output: String,

    /// How to call the function from generated code
    pub call: CallStyle,

    /// Function body
    pub block: syn::Block,
}

impl FunctionBody {
    /// Unqualified source type name
    pub fn source_ident(&self) -> &str {
        util::last_segment(&self.source)
    }
}

/// Locate the conversion function and resolve its parameter and result types.
pub fn find_conversion_function(
    env: &dyn Environment,
    receiver: Option<&str>,
    name: &str,
) -> Result<FunctionBody> {
    let item = env
        .find_function(receiver, name)
        .ok_or_else(|| Error::function_not_found(receiver, name))?;

    let self_ty = item.self_ty.map(util::type_string);
    let resolve_self = |ty: &syn::Type| {
        let rendered = util::type_string(ty);
        match &self_ty {
            Some(self_ty) => replace_self(&rendered, self_ty),
            None => rendered,
        }
    };

    let mut inputs = item.sig.inputs.iter();
    let (Some(input), None) = (inputs.next(), inputs.next()) else {
        return Err(Error::function_not_found(receiver, name)
            .context(format!("`{name}` must take exactly one parameter")));
    };

    let (param, param_ty, call) = match input {
        syn::FnArg::Receiver(recv) => {
            let Some(self_ty) = &self_ty else {
                return Err(Error::function_not_found(receiver, name));
            };

            let written = match (&recv.reference, recv.mutability) {
                (Some(_), Some(_)) => "&mut self",
                (Some(_), None) => "&self",
                (None, _) => "self",
            };

            let param_ty = match &recv.reference {
                Some(_) => format!("&{self_ty}"),
                None => self_ty.clone(),
            };

            (
                "self".to_string(),
                param_ty,
                CallStyle::Method {
                    receiver: written.to_string(),
                },
            )
        }
        syn::FnArg::Typed(pat) => {
            let syn::Pat::Ident(ident) = &*pat.pat else {
                return Err(Error::function_not_found(receiver, name)
                    .context(format!("`{name}` parameter must be a plain identifier")));
            };

            let call = match &self_ty {
                Some(self_ty) => CallStyle::Associated {
                    self_ty: self_ty.clone(),
                },
                None => CallStyle::Free,
            };

            (ident.ident.to_string(), resolve_self(&pat.ty), call)
        }
    };

    let source = strip_reference(&param_ty);

    let (target, output) = match &item.sig.output {
        syn::ReturnType::Type(_, ty) => (resolve_self(unwrap_result(ty)), resolve_self(ty)),
        syn::ReturnType::Default => {
            return Err(Error::function_not_found(receiver, name)
                .context(format!("`{name}` must return the target type")));
        }
    };

    Ok(FunctionBody {
        name: name.to_string(),
        param,
        param_ty,
        source: without_generics(&source),
        target: without_generics(&target),
        output,
        call,
        block: item.block.clone(),
    })
}

/// `Result<T, E>`, `Option<T>` and `Box<T>` unwrap to `T`.
fn unwrap_result(ty: &syn::Type) -> &syn::Type {
    if let Some(name) = util::type_name(ty) {
        if matches!(util::last_segment(&name), "Result" | "Option" | "Box") {
            if let Some(inner) = util::first_type_argument(ty) {
                return unwrap_result(inner);
            }
        }
    }
    ty
}

fn replace_self(rendered: &str, self_ty: &str) -> String {
    rendered
        .split("::")
        .map(|part| match part {
            "Self" => self_ty.to_string(),
            part => part
                .strip_prefix("&Self")
                .map(|rest| format!("&{self_ty}{rest}"))
                .unwrap_or_else(|| part.to_string()),
        })
        .collect::<Vec<_>>()
        .join("::")
}

fn strip_reference(ty: &str) -> String {
    let ty = ty.trim_start_matches('&');
    let ty = ty.strip_prefix("mut ").unwrap_or(ty);
    match ty.strip_prefix('\'') {
        Some(rest) => rest
            .split_once(' ')
            .map(|(_, ty)| ty.to_string())
            .unwrap_or_default(),
        None => ty.to_string(),
    }
}

fn without_generics(ty: &str) -> String {
    ty.split('<').next().unwrap_or(ty).to_string()
}

/// An [`Environment`] over parsed source files held in memory.
#[derive(Debug, Default)]
pub struct Workspace {
    files: Vec<SourceFile>,
}

#[derive(Debug)]
struct SourceFile {
    /// Module path of the file, e.g. `models::user`; empty for the crate root
    module: String,
    file: syn::File,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a workspace from a single module given as tokens.
    pub fn from_tokens(tokens: TokenStream) -> Result<Self> {
        let mut workspace = Self::new();
        workspace.add_file("", syn::parse2(tokens)?);
        Ok(workspace)
    }

    /// Add an already parsed file under `module`.
    pub fn add_file(&mut self, module: impl Into<String>, file: syn::File) -> &mut Self {
        self.files.push(SourceFile {
            module: module.into(),
            file,
        });
        self
    }

    /// Parse `src` and add it under `module`.
    pub fn parse_str(&mut self, module: impl Into<String>, src: &str) -> Result<&mut Self> {
        let file = syn::parse_file(src)?;
        Ok(self.add_file(module, file))
    }

    /// Every item paired with the module path it lives in, inline modules included.
    fn items(&self) -> Vec<(String, &syn::Item)> {
        fn walk<'a>(module: &str, items: &'a [syn::Item], out: &mut Vec<(String, &'a syn::Item)>) {
            for item in items {
                out.push((module.to_string(), item));

                if let syn::Item::Mod(item_mod) = item {
                    if let Some((_, content)) = &item_mod.content {
                        let nested = if module.is_empty() {
                            item_mod.ident.to_string()
                        } else {
                            format!("{module}::{}", item_mod.ident)
                        };
                        walk(&nested, content, out);
                    }
                }
            }
        }

        let mut out = vec![];
        for file in &self.files {
            walk(&file.module, &file.file.items, &mut out);
        }
        out
    }

    fn impls<'a>(&'a self, receiver: &str) -> impl Iterator<Item = &'a syn::ItemImpl> + 'a {
        let (module, ident) = split_name(receiver);
        let ident = ident.to_string();
        let module = module.map(str::to_string);

        self.items()
            .into_iter()
            .filter_map(move |(item_module, item)| match item {
                syn::Item::Impl(item_impl)
                    if module_matches(&item_module, module.as_deref())
                        && util::type_name(&item_impl.self_ty)
                            .is_some_and(|name| util::last_segment(&name) == ident) =>
                {
                    Some(item_impl)
                }
                _ => None,
            })
    }
}

impl Environment for Workspace {
    fn find_struct(&self, name: &str) -> Option<&syn::ItemStruct> {
        let (module, ident) = split_name(name);

        self.items()
            .into_iter()
            .find_map(|(item_module, item)| match item {
                syn::Item::Struct(item)
                    if item.ident == ident && module_matches(&item_module, module) =>
                {
                    Some(item)
                }
                _ => None,
            })
    }

    fn find_function(&self, receiver: Option<&str>, name: &str) -> Option<FnItem<'_>> {
        match receiver {
            Some(receiver) => self.impls(receiver).find_map(|item_impl| {
                item_impl.items.iter().find_map(|item| match item {
                    syn::ImplItem::Fn(method) if method.sig.ident == name => Some(FnItem {
                        sig: &method.sig,
                        block: &method.block,
                        self_ty: Some(&item_impl.self_ty),
                        method: Some(method),
                    }),
                    _ => None,
                })
            }),
            None => {
                let (module, ident) = split_name(name);

                self.items()
                    .into_iter()
                    .find_map(|(item_module, item)| match item {
                        syn::Item::Fn(item)
                            if item.sig.ident == ident && module_matches(&item_module, module) =>
                        {
                            Some(FnItem {
                                sig: &item.sig,
                                block: &item.block,
                                self_ty: None,
                                method: None,
                            })
                        }
                        _ => None,
                    })
            }
        }
    }
}

/// Split `a::b::Name` into `(Some("a::b"), "Name")`, dropping `crate::`,
/// `self::` and `super::` prefixes.
fn split_name(name: &str) -> (Option<&str>, &str) {
    let mut name = name.trim_start_matches("::");
    for prefix in ["crate::", "self::", "super::"] {
        while let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }

    match name.rsplit_once("::") {
        Some((module, ident)) => (Some(module), ident),
        None => (None, name),
    }
}

fn module_matches(item_module: &str, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => {
            item_module == wanted || item_module.ends_with(&format!("::{wanted}"))
        }
    }
}

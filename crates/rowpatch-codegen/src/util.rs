use quote::ToTokens;

/// Renders a type the way it would be written by hand: `&'a models::User`,
/// `Json<Meta>`, `Vec<(i64, String)>`.
pub(crate) fn type_string(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Reference(ty) => {
            let mut out = String::from("&");
            if let Some(lifetime) = &ty.lifetime {
                out.push_str(&format!("'{} ", lifetime.ident));
            }
            if ty.mutability.is_some() {
                out.push_str("mut ");
            }
            out.push_str(&type_string(&ty.elem));
            out
        }
        syn::Type::Paren(ty) => type_string(&ty.elem),
        syn::Type::Group(ty) => type_string(&ty.elem),
        syn::Type::Path(ty) if ty.qself.is_none() => path_string(&ty.path),
        syn::Type::Slice(ty) => format!("[{}]", type_string(&ty.elem)),
        syn::Type::Tuple(ty) => {
            let elems: Vec<_> = ty.elems.iter().map(type_string).collect();
            format!("({})", elems.join(", "))
        }
        other => compact(other),
    }
}

/// Renders a path including generic arguments.
pub(crate) fn path_string(path: &syn::Path) -> String {
    let mut out = String::new();
    if path.leading_colon.is_some() {
        out.push_str("::");
    }

    for (i, segment) in path.segments.iter().enumerate() {
        if i > 0 {
            out.push_str("::");
        }
        out.push_str(&segment.ident.to_string());

        if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
            let args: Vec<_> = args
                .args
                .iter()
                .map(|arg| match arg {
                    syn::GenericArgument::Type(ty) => type_string(ty),
                    syn::GenericArgument::Lifetime(lifetime) => format!("'{}", lifetime.ident),
                    other => compact(other),
                })
                .collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
    }

    out
}

/// Returns the path of the named type behind references, without generic
/// arguments: `&models::User` -> `models::User`.
pub(crate) fn type_name(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Reference(ty) => type_name(&ty.elem),
        syn::Type::Paren(ty) => type_name(&ty.elem),
        syn::Type::Group(ty) => type_name(&ty.elem),
        syn::Type::Path(ty) if ty.qself.is_none() => Some(
            ty.path
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect::<Vec<_>>()
                .join("::"),
        ),
        _ => None,
    }
}

/// Returns the first generic type argument of the last path segment:
/// `Json<Meta>` -> `Meta`.
pub(crate) fn first_type_argument(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(ty) = ty else {
        return None;
    };

    let syn::PathArguments::AngleBracketed(args) = &ty.path.segments.last()?.arguments else {
        return None;
    };

    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Last `::` separated segment of a type name.
pub(crate) fn last_segment(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Renders an expression or other syntax node on one line for diagnostics
/// and comments.
pub(crate) fn compact(node: &impl ToTokens) -> String {
    let raw = node.to_token_stream().to_string();
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = chars.peek().copied();
            let tight_prev = matches!(prev, Some('.' | '&' | '(' | '[' | '!' | ':' | '<'));
            let tight_next = matches!(next, Some('.' | '(' | ')' | '[' | ']' | ',' | ':' | '!' | '<' | '>' | '?'));
            if tight_prev || tight_next {
                continue;
            }
        }
        out.push(c);
    }

    out
}

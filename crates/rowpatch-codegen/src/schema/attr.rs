use super::name::RenameRule;

/// Annotations recognized on a struct field.
#[derive(Debug, Default)]
pub(crate) struct FieldAttr {
    /// `#[column("name")]` or `#[column(name = "name")]`
    pub(crate) column: Option<String>,

    /// `#[embedded]` or `#[embedded(prefix = "acc_")]`; holds the prefix
    pub(crate) embedded: Option<String>,

    /// `#[json]`
    pub(crate) json: bool,

    /// `#[serde(rename = "key")]`
    pub(crate) rename: Option<String>,
}

/// `#[column(...)]` arguments.
#[derive(Debug)]
struct Column {
    name: syn::LitStr,
}

impl syn::parse::Parse for Column {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        // Allowed syntax:
        //
        // #[column("name")]
        // #[column(name = "name")]
        let lookahead = input.lookahead1();

        let name = if lookahead.peek(syn::LitStr) {
            input.parse()?
        } else if lookahead.peek(kw::name) {
            let _: kw::name = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            input.parse()?
        } else {
            return Err(lookahead.error());
        };

        if !input.is_empty() {
            return Err(input.error("unexpected tokens after column name"));
        }

        Ok(Self { name })
    }
}

/// `#[embedded(...)]` arguments.
#[derive(Debug)]
struct Embedded {
    prefix: syn::LitStr,
}

impl syn::parse::Parse for Embedded {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let _: kw::prefix = input.parse()?;
        let _: syn::Token![=] = input.parse()?;
        let prefix = input.parse()?;

        if !input.is_empty() {
            return Err(input.error("unexpected tokens after embedded prefix"));
        }

        Ok(Self { prefix })
    }
}

mod kw {
    syn::custom_keyword!(name);
    syn::custom_keyword!(prefix);
}

impl FieldAttr {
    /// Collect annotations. Ill-formed annotations are logged and ignored so
    /// the field falls back to its default mapping.
    pub(crate) fn from_ast(field: &syn::Field) -> Self {
        let mut attrs = Self::default();
        let field_name = field
            .ident
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        for attr in &field.attrs {
            if attr.path().is_ident("column") {
                match attr.parse_args::<Column>() {
                    Ok(column) if attrs.column.is_none() => {
                        attrs.column = Some(column.name.value());
                    }
                    Ok(_) => {
                        tracing::warn!(field = %field_name, "duplicate #[column] attribute; keeping the first");
                    }
                    Err(err) => {
                        tracing::warn!(field = %field_name, error = %err, "ignoring ill-formed #[column] attribute");
                    }
                }
            } else if attr.path().is_ident("embedded") {
                let prefix = match &attr.meta {
                    syn::Meta::Path(_) => String::new(),
                    _ => match attr.parse_args::<Embedded>() {
                        Ok(embedded) => embedded.prefix.value(),
                        Err(err) => {
                            tracing::warn!(field = %field_name, error = %err, "ignoring ill-formed #[embedded] prefix");
                            String::new()
                        }
                    },
                };
                attrs.embedded.get_or_insert(prefix);
            } else if attr.path().is_ident("json") {
                attrs.json = true;
            } else if attr.path().is_ident("serde") {
                if attrs.rename.is_none() {
                    attrs.rename = serde_rename(attr);
                }
            }
        }

        if attrs.embedded.is_some() && attrs.json {
            tracing::warn!(
                field = %field_name,
                "field is both #[embedded] and #[json]; treating it as embedded"
            );
            attrs.json = false;
        }

        attrs
    }
}

/// `#[serde(rename = "key")]` on a field.
fn serde_rename(attr: &syn::Attribute) -> Option<String> {
    let mut rename = None;

    let res = attr.parse_nested_meta(|meta| {
        if meta.input.peek(syn::Token![=]) {
            let value = meta.value()?;
            if meta.path.is_ident("rename") {
                let lit: syn::LitStr = value.parse()?;
                rename = Some(lit.value());
            } else {
                let _: syn::Expr = value.parse()?;
            }
        } else if meta.input.peek(syn::token::Paren) {
            let _content;
            syn::parenthesized!(_content in meta.input);
        }
        Ok(())
    });

    match res {
        Ok(()) => rename,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring ill-formed #[serde] attribute");
            None
        }
    }
}

/// `#[serde(rename_all = "...")]` on a struct.
pub(crate) fn serde_rename_all(attrs: &[syn::Attribute]) -> Option<RenameRule> {
    let mut rule = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let res = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                let lit: syn::LitStr = meta.value()?.parse()?;
                match RenameRule::from_str(&lit.value()) {
                    Some(parsed) => rule = Some(parsed),
                    None => {
                        tracing::warn!(rule = %lit.value(), "unknown serde rename_all rule");
                    }
                }
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let _content;
                syn::parenthesized!(_content in meta.input);
            }
            Ok(())
        });

        if let Err(err) = res {
            tracing::warn!(error = %err, "ignoring ill-formed #[serde] attribute");
        }
    }

    rule
}

use super::{attr::FieldAttr, name, name::RenameRule};
use crate::util;

/// A field of a struct type, with its storage mapping resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// Field identifier
    pub name: String,

    /// Declared type as written
    pub declared_type: String,

    /// Storage column name; the snake_case field name unless annotated
    pub physical_column: String,

    /// External key when the field is serialized inside a JSON object
    pub json_key: String,

    /// How the field maps to storage
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// One column
    Column,

    /// A sub-struct flattened into the parent's columns
    Embedded {
        /// Name of the embedded type
        ty: String,

        /// Prefix applied to every flattened column
        prefix: String,

        /// Flattened fields; `None` when the embedded type could not be resolved
        fields: Option<Vec<FieldDeclaration>>,
    },

    /// A structured value stored in one column
    Json,
}

impl FieldDeclaration {
    /// Build a field from its syntax. The embedded field list is filled in by
    /// the resolver.
    pub(crate) fn from_ast(
        field: &syn::Field,
        rename_rule: Option<RenameRule>,
        json_wrapper: impl Fn(&syn::Type) -> bool,
    ) -> Option<Self> {
        let ident = field.ident.as_ref()?.to_string();
        let attrs = FieldAttr::from_ast(field);

        let physical_column = attrs
            .column
            .clone()
            .unwrap_or_else(|| name::column_name(&ident));
        let json_key = name::json_key(&ident, attrs.rename.as_deref(), rename_rule);

        let kind = if let Some(prefix) = attrs.embedded {
            FieldKind::Embedded {
                ty: util::type_name(&field.ty).unwrap_or_else(|| util::type_string(&field.ty)),
                prefix,
                fields: None,
            }
        } else if attrs.json || json_wrapper(&field.ty) {
            FieldKind::Json
        } else {
            FieldKind::Column
        };

        Some(Self {
            declared_type: util::type_string(&field.ty),
            name: ident,
            physical_column,
            json_key,
            kind,
        })
    }

    pub fn embedded_prefix(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Embedded { prefix, .. } => Some(prefix),
            _ => None,
        }
    }

    /// Flattened fields of an embedded field, if resolved
    pub fn embedded_fields(&self) -> Option<&[FieldDeclaration]> {
        match &self.kind {
            FieldKind::Embedded {
                fields: Some(fields),
                ..
            } => Some(fields),
            _ => None,
        }
    }

    pub fn is_json_container(&self) -> bool {
        matches!(self.kind, FieldKind::Json)
    }
}

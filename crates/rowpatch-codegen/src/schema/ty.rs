use super::FieldDeclaration;
use crate::{util, Error};

/// A struct type with its fields in declaration order.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    /// Type name as it was requested
    pub name: String,

    /// Fields, in declaration order, with embedded fields resolved
    pub fields: Vec<FieldDeclaration>,

    /// Embedded types that could not be resolved. The affected fields stay
    /// unflattened.
    pub unresolved: Vec<Error>,
}

/// A physical storage column of a flattened type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Physical column name, prefixes applied
    pub name: String,

    /// Rust field path from the root value, e.g. `["account", "namespace"]`
    pub access: Vec<String>,

    /// Index in the flattened column list
    pub position: usize,

    /// True when the column stores a JSON container
    pub json: bool,
}

impl TypeDeclaration {
    /// Unqualified type name
    pub fn ident(&self) -> &str {
        util::last_segment(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Every physical column, embedded fields flattened, in declaration order.
    pub fn columns(&self) -> Vec<Column> {
        fn walk(
            fields: &[FieldDeclaration],
            prefix: &str,
            access: &mut Vec<String>,
            out: &mut Vec<Column>,
        ) {
            for field in fields {
                access.push(field.name.clone());

                match field.embedded_fields() {
                    Some(nested) => {
                        let prefix = format!("{prefix}{}", field.embedded_prefix().unwrap_or(""));
                        walk(nested, &prefix, access, out);
                    }
                    None => out.push(Column {
                        name: format!("{prefix}{}", field.physical_column),
                        access: access.clone(),
                        position: out.len(),
                        json: field.is_json_container(),
                    }),
                }

                access.pop();
            }
        }

        let mut out = vec![];
        walk(&self.fields, "", &mut vec![], &mut out);
        out
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().into_iter().map(|column| column.name).collect()
    }
}

use crate::{
    bindings::Source,
    extract::{RawRelation, Shape},
    schema::{Column, TypeDeclaration},
};

use indexmap::{IndexMap, IndexSet};

/// Relations that are written together under one presence guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingGroup {
    pub kind: MappingKind,

    /// Writes, never empty
    pub members: Vec<Member>,

    /// Smallest column position among the members
    pub position: usize,

    /// Smallest relation order among the members
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingKind {
    /// One source field to one column
    OneToOne,

    /// Reads below one source field spread over several columns
    OneToMany { trigger: String },

    /// Many source fields merged into one JSON container column
    ManyToOne { column: String },

    /// A column computed by a helper reading several source fields
    MethodCall { method: String },

    /// An embedded target field sourced entirely from one source field
    EmbeddedOneToMany { field: String, trigger: String },
}

/// One column (or JSON key) write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub relation: RawRelation,

    /// Physical column written
    pub column: String,

    /// Field path of the written value inside the converted row
    pub access: Vec<String>,

    /// Dotted JSON key path for JSON container members
    pub json_path: Option<String>,

    /// Position of `column` in the target's column list
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    /// Groups of one relation, keyed by relation order
    Single(usize),
    Trigger(String),
    Method { target: String, method: String },
    Embedded { field: String, trigger: String },
    Json(String),
}

impl MappingGroup {
    /// Source fields whose presence guards the whole group, in first
    /// appearance order.
    pub fn triggers(&self) -> Vec<&str> {
        let mut triggers = IndexSet::new();
        for member in &self.members {
            triggers.extend(member.relation.source.triggers());
        }
        triggers.into_iter().collect()
    }

    /// Columns written by the group, without repeats.
    pub fn columns(&self) -> Vec<&str> {
        let columns: IndexSet<&str> = self
            .members
            .iter()
            .map(|member| member.column.as_str())
            .collect();
        columns.into_iter().collect()
    }

    pub fn is_json(&self) -> bool {
        matches!(self.kind, MappingKind::ManyToOne { .. })
    }
}

/// Bucket relations into mapping groups and resolve their physical columns.
///
/// Groups come back sorted by `(position, order)`. Members of a JSON
/// container group are sorted by nested object name, then by source name.
pub fn classify(relations: Vec<RawRelation>, target: &TypeDeclaration) -> Vec<MappingGroup> {
    let columns = target.columns();
    let mut buckets: IndexMap<GroupKey, (MappingKind, Vec<Member>)> = IndexMap::new();

    for relation in relations {
        let resolved = resolve_columns(&relation, &columns);
        if resolved.is_empty() {
            tracing::warn!(target = %relation.target_dotted(), "no column for relation");
            continue;
        }

        let (key, kind) = group_key(&relation, &resolved);

        let members = resolved
            .into_iter()
            .map(|column| Member {
                json_path: relation.json_path(),
                access: match &relation.shape {
                    Shape::EmbeddedWhole => column.access.clone(),
                    _ => relation.target.clone(),
                },
                column: column.name.clone(),
                position: column.position,
                relation: relation.clone(),
            })
            .collect::<Vec<_>>();

        buckets
            .entry(key)
            .or_insert_with(|| (kind, vec![]))
            .1
            .extend(members);
    }

    let mut groups: Vec<_> = buckets
        .into_values()
        .map(|(kind, mut members)| {
            if matches!(kind, MappingKind::ManyToOne { .. }) {
                members.sort_by_cached_key(|member| {
                    (
                        member.relation.json_object().unwrap_or_default(),
                        member.relation.source.sort_name(),
                    )
                });
            } else {
                members.sort_by_key(|member| (member.position, member.relation.order));
            }

            MappingGroup {
                position: members.iter().map(|member| member.position).min().unwrap_or(0),
                order: members
                    .iter()
                    .map(|member| member.relation.order)
                    .min()
                    .unwrap_or(0),
                kind,
                members,
            }
        })
        .collect();

    groups.sort_by_key(|group| (group.position, group.order));

    for group in &groups {
        tracing::debug!(
            kind = ?group.kind,
            columns = ?group.columns(),
            triggers = ?group.triggers(),
            "mapping group"
        );
    }

    groups
}

/// Target columns not written by any group, in declaration order.
pub fn missing_columns(groups: &[MappingGroup], target: &TypeDeclaration) -> Vec<String> {
    let written: IndexSet<&str> = groups.iter().flat_map(MappingGroup::columns).collect();

    target
        .column_names()
        .into_iter()
        .filter(|column| !written.contains(column.as_str()))
        .collect()
}

fn resolve_columns<'c>(relation: &RawRelation, columns: &'c [Column]) -> Vec<&'c Column> {
    match &relation.shape {
        Shape::Direct | Shape::Embedded { .. } => columns
            .iter()
            .filter(|column| column.access == relation.target)
            .collect(),
        Shape::EmbeddedWhole => columns
            .iter()
            .filter(|column| column.access.starts_with(&relation.target))
            .collect(),
        Shape::Json { container, .. } => columns
            .iter()
            .filter(|column| column.access == *container)
            .collect(),
    }
}

fn group_key(relation: &RawRelation, columns: &[&Column]) -> (GroupKey, MappingKind) {
    if let Shape::Json { .. } = &relation.shape {
        let column = columns[0].name.clone();
        return (
            GroupKey::Json(column.clone()),
            MappingKind::ManyToOne { column },
        );
    }

    let read = match &relation.source {
        Source::Method(method) => {
            return (
                GroupKey::Method {
                    target: relation.target_dotted(),
                    method: method.name.clone(),
                },
                MappingKind::MethodCall {
                    method: method.name.clone(),
                },
            );
        }
        Source::Field(read) => read,
    };

    // `reachable` guarantees a trigger for every extracted relation
    let trigger = read.trigger().unwrap_or_default().to_string();

    match &relation.shape {
        Shape::EmbeddedWhole => {
            let field = relation.target_dotted();
            (
                GroupKey::Embedded {
                    field: field.clone(),
                    trigger: trigger.clone(),
                },
                MappingKind::EmbeddedOneToMany { field, trigger },
            )
        }
        Shape::Embedded { field } if read.path.len() > 1 => (
            GroupKey::Embedded {
                field: field.clone(),
                trigger: trigger.clone(),
            },
            MappingKind::EmbeddedOneToMany {
                field: field.clone(),
                trigger,
            },
        ),
        Shape::Direct if read.path.len() > 1 => (
            GroupKey::Trigger(trigger.clone()),
            MappingKind::OneToMany { trigger },
        ),
        _ => (GroupKey::Single(relation.order), MappingKind::OneToOne),
    }
}

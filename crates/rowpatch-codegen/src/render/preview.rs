use super::plan;
use crate::classify::{MappingGroup, MappingKind};

use indexmap::{IndexMap, IndexSet};

/// What the generated function would write for a given set of changed
/// source fields.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Columns written, in output order
    pub columns: Vec<String>,

    /// JSON paths set per container column
    pub json: IndexMap<String, Vec<String>>,
}

/// Evaluate the guards of `groups` with the source fields in `present`
/// marked as changed.
pub fn preview(groups: &[MappingGroup], present: &[&str]) -> Preview {
    let present: IndexSet<&str> = present.iter().copied().collect();
    let fires = |triggers: Vec<&str>| triggers.iter().any(|trigger| present.contains(trigger));

    let mut out = Preview::default();
    let mut columns = IndexSet::new();

    for planned in plan(groups).writes {
        match &planned.group.kind {
            MappingKind::ManyToOne { column } => {
                let paths: Vec<_> = planned
                    .members
                    .iter()
                    .filter(|member| fires(member.relation.source.triggers()))
                    .filter_map(|member| member.json_path.clone())
                    .collect();

                if !paths.is_empty() {
                    columns.insert(column.clone());
                    out.json.insert(column.clone(), paths);
                }
            }
            _ => {
                let triggers = planned
                    .members
                    .iter()
                    .flat_map(|member| member.relation.source.triggers())
                    .collect();

                if fires(triggers) {
                    columns.extend(planned.members.iter().map(|member| member.column.clone()));
                }
            }
        }
    }

    out.columns = columns.into_iter().collect();
    out
}

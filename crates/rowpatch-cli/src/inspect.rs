use crate::{Config, Selection};
use anyhow::Result;
use clap::Parser;
use console::style;
use rowpatch_codegen::{infer, MappingGroup, MappingKind};

#[derive(Parser, Debug)]
pub struct InspectCommand {
    #[command(flatten)]
    selection: Selection,
}

impl InspectCommand {
    pub(crate) fn run(self, config: &Config) -> Result<()> {
        let workspace = self.selection.workspace(config)?;
        let inference = infer(&workspace, &self.selection.request(), &config.codegen)?;

        println!();
        println!(
            "  {}",
            style(format!(
                "Mapping for `{}` ({} -> {})",
                inference.conversion.name, inference.source.name, inference.target.name
            ))
            .cyan()
            .bold()
            .underlined()
        );
        println!();

        if inference.groups.is_empty() {
            println!("  {}", style("No target column depends on the source.").magenta().dim());
        }

        for group in &inference.groups {
            println!("  {}", style(kind_label(group)).bold());
            for member in &group.members {
                let column = match &member.json_path {
                    Some(path) => format!("{}.{path}", member.column),
                    None => member.column.clone(),
                };
                println!(
                    "    {} {} {}",
                    column,
                    style("<-").dim(),
                    member.relation.source
                );
            }
        }

        if !inference.missing_columns.is_empty() {
            println!();
            println!(
                "  {} {}",
                style("Missing columns:").yellow().bold(),
                inference.missing_columns.join(", ")
            );
        }

        if !inference.diagnostics.is_empty() {
            println!();
            println!("  {}", style("Diagnostics:").yellow().bold());
            for diagnostic in &inference.diagnostics {
                println!("    {} {diagnostic}", style("!").yellow());
            }
        }
        println!();

        Ok(())
    }
}

fn kind_label(group: &MappingGroup) -> String {
    match &group.kind {
        MappingKind::OneToOne => "one-to-one".to_string(),
        MappingKind::OneToMany { trigger } => format!("one-to-many from `{trigger}`"),
        MappingKind::ManyToOne { column } => format!("many-to-one into `{column}` (json)"),
        MappingKind::MethodCall { method } => format!("computed by `{method}`"),
        MappingKind::EmbeddedOneToMany { field, trigger } => {
            format!("embedded `{field}` from `{trigger}`")
        }
    }
}

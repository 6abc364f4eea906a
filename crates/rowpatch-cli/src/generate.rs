use crate::{Config, Selection};
use anyhow::Result;
use clap::Parser;
use console::style;
use rowpatch_codegen::{infer, render};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct GenerateCommand {
    #[command(flatten)]
    selection: Selection,

    /// File to write; defaults to `<output>/<function><fn_suffix>.rs` when an
    /// output directory is configured, stdout otherwise
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Fail when two mapping groups write the same column
    #[arg(long)]
    deny_duplicates: bool,
}

impl GenerateCommand {
    pub(crate) fn run(self, config: &Config) -> Result<()> {
        let mut codegen = config.codegen.clone();
        if self.deny_duplicates {
            codegen = codegen.deny_duplicate_columns(true);
        }

        let workspace = self.selection.workspace(config)?;
        let inference = infer(&workspace, &self.selection.request(), &codegen)?;
        let artifact = render::render(
            &inference.groups,
            &inference.target,
            &inference.conversion,
            &codegen,
        );

        let out = self.out.clone().or_else(|| {
            config
                .output
                .as_ref()
                .map(|dir| dir.join(format!("{}{}.rs", inference.conversion.name, codegen.fn_suffix)))
        });

        let Some(out) = out else {
            print!("{}", artifact.text);
            report(&inference.diagnostics, &artifact.missing_columns);
            return Ok(());
        };

        if let Some(dir) = out.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&out, &artifact.text)?;

        eprintln!();
        eprintln!(
            "  {} {}",
            style("✓").green().bold(),
            style(format!(
                "Generated patch for `{}`: {}",
                inference.conversion.name,
                out.display()
            ))
            .dim()
        );
        report(&inference.diagnostics, &artifact.missing_columns);
        eprintln!();

        Ok(())
    }
}

/// Print warnings to stderr so generated code on stdout stays clean.
fn report(diagnostics: &[rowpatch_codegen::Error], missing_columns: &[String]) {
    if !missing_columns.is_empty() {
        eprintln!(
            "  {} {}",
            style("!").yellow().bold(),
            style(format!("Columns never written: {}", missing_columns.join(", "))).yellow()
        );
    }

    for diagnostic in diagnostics {
        eprintln!("  {} {}", style("!").yellow().bold(), style(diagnostic).yellow());
    }
}

use anyhow::{Context, Result};
use rowpatch_codegen::Workspace;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Parse every `.rs` file under `paths` into a workspace.
///
/// A file's module path is derived from its location below the directory it
/// was found in: `models/user.rs` becomes `models::user`, `models/mod.rs`
/// becomes `models`, and `lib.rs` / `main.rs` are the crate root.
pub fn load_workspace(paths: &[PathBuf]) -> Result<Workspace> {
    let mut workspace = Workspace::new();
    let mut files = 0;

    for path in paths {
        if path.is_dir() {
            for file in rust_files(path)? {
                let module = module_path(path, &file);
                add_file(&mut workspace, &file, module)?;
                files += 1;
            }
        } else {
            add_file(&mut workspace, path, String::new())?;
            files += 1;
        }
    }

    tracing::debug!(files, "loaded sources");
    Ok(workspace)
}

fn add_file(workspace: &mut Workspace, path: &Path, module: String) -> Result<()> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    workspace
        .parse_str(module, &src)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(())
}

/// `.rs` files below `dir`, sorted for a stable lookup order.
fn rust_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = vec![];

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to read directory {}", dir.display()))?;

        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "rs") {
            out.push(entry.into_path());
        }
    }

    Ok(out)
}

fn module_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file).with_extension("");

    let mut segments: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();

    if matches!(
        segments.last().map(String::as_str),
        Some("mod" | "lib" | "main")
    ) {
        segments.pop();
    }

    segments.join("::")
}

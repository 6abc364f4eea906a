use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "rowpatch.toml";

/// Configuration for rowpatch CLI operations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Source files or directories scanned for types and functions
    pub sources: Vec<PathBuf>,

    /// Directory generated files are written to; stdout when unset
    pub output: Option<PathBuf>,

    /// Inference and rendering options
    pub codegen: rowpatch_codegen::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("src")],
            output: None,
            codegen: rowpatch_codegen::Config::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source paths
    pub fn sources(mut self, sources: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output directory
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set the codegen configuration
    pub fn codegen(mut self, codegen: rowpatch_codegen::Config) -> Self {
        self.codegen = codegen;
        self
    }

    /// Load a configuration file. Relative paths in the file are resolved
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut config: Config = contents
            .parse()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.sources = config.sources.iter().map(|source| base.join(source)).collect();
            config.output = config.output.map(|output| base.join(output));
        }

        Ok(config)
    }

    /// Load `path` if given, otherwise `rowpatch.toml` when it exists, otherwise
    /// the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

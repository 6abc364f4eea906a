mod config;
mod generate;
mod inspect;
mod sources;

pub use config::*;
pub use generate::GenerateCommand;
pub use inspect::InspectCommand;
pub use sources::load_workspace;

use anyhow::Result;
use clap::Parser;
use rowpatch_codegen::{Request, Workspace};
use std::path::PathBuf;

/// rowpatch CLI library for building custom command-line tools
#[derive(Debug, Default)]
pub struct RowpatchCli {
    /// Explicit configuration; discovered from `--config` or `rowpatch.toml`
    /// when unset
    config: Option<Config>,
}

impl RowpatchCli {
    /// Create a new RowpatchCli that discovers its configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new RowpatchCli instance with a custom configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// Parse and execute CLI commands from command-line arguments
    pub fn parse_and_run(&self) -> Result<()> {
        let cli = Cli::parse();
        self.run(cli)
    }

    /// Parse and execute CLI commands from an iterator of arguments
    pub fn parse_from<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::parse_from(args);
        self.run(cli)
    }

    fn run(&self, cli: Cli) -> Result<()> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => Config::discover(cli.config.as_deref())?,
        };

        match cli.command {
            Command::Generate(cmd) => cmd.run(&config),
            Command::Inspect(cmd) => cmd.run(&config),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rowpatch")]
#[command(about = "rowpatch - generate change-aware patch functions from conversion functions")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Generate the patch function for a conversion function
    Generate(GenerateCommand),

    /// Print the inferred mapping without generating code
    Inspect(InspectCommand),
}

/// Which conversion function to analyze, and where to look for it.
#[derive(clap::Args, Debug)]
pub struct Selection {
    /// Conversion function name
    function: String,

    /// Type whose `impl` blocks define the function
    #[arg(short, long)]
    receiver: Option<String>,

    /// Source type, when it differs from the parameter type
    #[arg(long)]
    source: Option<String>,

    /// Target type, when it differs from the return type
    #[arg(long)]
    target: Option<String>,

    /// Source files or directories; replaces `sources` from the configuration
    #[arg(short, long = "path")]
    paths: Vec<PathBuf>,
}

impl Selection {
    fn request(&self) -> Request {
        let mut request = Request::new(&self.function);
        if let Some(receiver) = &self.receiver {
            request = request.receiver(receiver);
        }
        if let Some(source) = &self.source {
            request = request.source(source);
        }
        if let Some(target) = &self.target {
            request = request.target(target);
        }
        request
    }

    fn workspace(&self, config: &Config) -> Result<Workspace> {
        if self.paths.is_empty() {
            load_workspace(&config.sources)
        } else {
            load_workspace(&self.paths)
        }
    }
}

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ROWPATCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match rowpatch_cli::RowpatchCli::new().parse_and_run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rowpatch: {err:#}");
            ExitCode::FAILURE
        }
    }
}

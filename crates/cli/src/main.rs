mod commands;

use std::process::ExitCode;

use cmdtree::{Command, Stage};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    init_tracing();
    load_env_file();

    let root = commands::build();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match dispatch(&root, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Run failures were already reported on the command's streams.
            if err.stage() != Some(Stage::Run) {
                eprintln!("Error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Execute the deepest command named by the leading args, so that its own
/// flags are in scope.
fn dispatch(root: &Command, args: &[String]) -> cmdtree::Result<()> {
    let (target, rest) = root.find(args);
    tracing::debug!(command = %target.command_path(), "dispatching");
    target.execute_from(rest)
}

fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "failed to load .env"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(error) if error.not_found() => {}
        Err(_) => debug!("could not parse .env; continuing with the process environment"),
    }

    let result = match commands::run(&cli).await {
        Ok(payload) => output::render(&payload, cli.pretty),
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            output::render_error(&error, cli.pretty);
            ExitCode::from(error.exit_code())
        }
    }
}

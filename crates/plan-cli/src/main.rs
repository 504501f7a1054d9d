//! `plan` command-line tool
//!
//! Offline commands (`seed`, `validate`, `canonicalize`, `hash`, `encode`)
//! work on files or stdin. `fetch` and `move` talk to a plan store configured
//! through `--config`, `PLAN_SYNC_*` variables and flags, in that order.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut stdout = std::io::stdout().lock();
    match commands::run(cli.command, &mut stdout).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

use clap::Parser;
use medagent_console::{Cli, Outcome, init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await? {
        Outcome::Completed => Ok(ExitCode::SUCCESS),
        Outcome::Failed => Ok(ExitCode::FAILURE),
    }
}

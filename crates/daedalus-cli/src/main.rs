//! Daedalus CLI - Entry point

use std::process::ExitCode;

use anyhow::Context;
use tracing::error;

use daedalus_cli::{watch, Args, CliError, Command, Session, HELP, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = match Args::parse() {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print!("{HELP}");
            return Ok(ExitCode::SUCCESS);
        }
        Ok(Command::Version) => {
            println!("daedalus {VERSION}");
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Use --help for usage information");
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut session = Session::new(args).context("failed to start")?;
    daedalus_telemetry::try_init_logging(&session.config().logging).context("failed to initialize logging")?;

    if session.args().watch {
        watch(session).await?;
        return Ok(ExitCode::SUCCESS);
    }

    match session.run() {
        Ok(outcome) if outcome.failed => Ok(ExitCode::FAILURE),
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err @ CliError::OutOfDate { .. }) => {
            error!(error = %err, "Check failed");
            eprintln!("{err}");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

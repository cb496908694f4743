use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use libmpv_setup::{ConsoleReporter, Pipeline, Reporter, SetupConfig, SetupError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: libmpv-setup setup-lib

Commands:
  setup-lib   Download and configure libmpv libraries automatically.";

#[derive(Debug, Parser)]
#[command(name = "libmpv-setup", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download and configure libmpv libraries automatically.
    SetupLib,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn setup_lib(reporter: &ConsoleReporter) -> Result<()> {
    let config = SetupConfig::from_env().context("could not read the current directory")?;
    tracing::debug!(?config, "setup-lib");

    let pipeline = Pipeline::new(&config, reporter)?;
    pipeline.run()?;
    Ok(())
}

/// `SetupError` messages already embed their causes; anything else gets the
/// full anyhow chain.
fn error_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<SetupError>() {
        Some(setup) => setup.to_string(),
        None => format!("{e:#}"),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
    };

    let Some(Command::SetupLib) = cli.command else {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    };

    init_tracing();
    let reporter = ConsoleReporter;
    match setup_lib(&reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.error(&error_message(&e));
            ExitCode::FAILURE
        }
    }
}

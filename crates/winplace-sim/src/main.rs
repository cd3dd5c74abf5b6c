#![warn(missing_docs)]

//! Entry point for the `winplace-sim` binary.

mod cli;
mod error;
mod run;
mod scenario;

use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

/// Run and map failures to exit code 1.
fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli { log, command } = Cli::parse();
    let env_filter = logging::env_filter_from_spec(&log.spec());
    registry()
        .with(env_filter)
        .with(fmt::layer().without_time())
        .try_init()
        .ok();

    match command {
        Commands::Run(args) => run::run(&args),
        Commands::Check(args) => run::check(&args),
    }
}

//! Command-line interface definitions for winplace-sim.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;

/// Command-line interface for the `winplace-sim` binary.
#[derive(Parser, Debug)]
#[command(
    name = "winplace-sim",
    about = "Replay window placement scenarios on a simulated desktop",
    version
)]
pub struct Cli {
    /// Logging controls shared across workspace binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level simulator commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario and print the resulting frame and aspects.
    Run(RunArgs),
    /// Parse and validate a scenario without running it.
    Check(CheckArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Scenario file in RON syntax.
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,

    /// Persist aspects here on `Save` steps and at the end of the run.
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Restore aspects from this file instead of the scenario's own record.
    #[arg(long, value_name = "PATH")]
    pub aspects: Option<PathBuf>,

    /// Placement configuration overriding the scenario's `cfg`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Virtual time to let timers run after the last step.
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = "1s",
        value_name = "DURATION"
    )]
    pub settle: Duration,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Scenario file in RON syntax.
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,
}

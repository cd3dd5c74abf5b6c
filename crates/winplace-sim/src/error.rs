//! Error handling for the winplace-sim crate.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for simulator operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while loading or running a scenario.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Errors surfaced by the placement library.
    #[error("placement error: {0}")]
    Placement(#[from] winplace::Error),
    /// The scenario file is not valid RON.
    #[error("scenario parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The run report could not be rendered as RON.
    #[error("report serialization error: {0}")]
    Serialize(#[from] ron::Error),
    /// The scenario parsed but cannot be run.
    #[error("invalid scenario: {0}")]
    Scenario(String),
}

impl Error {
    /// Helper to build a scenario error from an arbitrary message.
    pub fn scenario<M: Into<String>>(msg: M) -> Self {
        Self::Scenario(msg.into())
    }
}

//! Error type for the placement crate.

use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the placement crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors surfaced at the edges of the placement engine.
///
/// Geometry and timer paths never fail; they degrade to a no-op instead.
/// Errors only arise from monitor lookups, persistence and configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested monitor index is not (or no longer) connected.
    #[error("screen {index} not found")]
    ScreenNotFound {
        /// Ordinal that failed to resolve.
        index: usize,
    },

    /// Filesystem failure while reading or writing persisted state.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// RON parse failure.
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON serialization failure.
    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// A persisted aspects record violates its invariants.
    #[error("invalid window aspects: {0}")]
    InvalidAspects(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an I/O error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

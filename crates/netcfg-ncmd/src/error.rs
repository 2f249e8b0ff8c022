//! Error types for the configuration applier.

use netcfg_common::NetCfgError;
use netcfg_emit::EmitError;
use netcfg_model::ModelError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for applier operations.
pub type NcmdResult<T> = Result<T, NcmdError>;

/// Errors raised while loading, rendering or applying a configuration.
#[derive(Debug, Error)]
pub enum NcmdError {
    /// The configuration file could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The edit list is not valid JSON.
    #[error("Invalid edits: {0}")]
    Edits(#[from] serde_json::Error),

    /// An edit addresses a root this applier does not manage.
    #[error("Unsupported edit root '{root}' in {xpath}")]
    UnsupportedRoot {
        /// First node of the path.
        root: String,
        /// The offending path.
        xpath: String,
    },

    /// An edit could not be put into its tree, or a walk failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Rendered output could not be combined with the file it updates.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Executing the command sequence failed.
    #[error(transparent)]
    Command(#[from] NetCfgError),
}

impl NcmdError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

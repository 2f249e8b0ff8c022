//! Error types for netcfg operations.
//!
//! This module defines the error type shared by the shell primitive, the
//! command executor and the remote execution boundary. All errors implement
//! `std::error::Error` via `thiserror`.

use std::io;
use thiserror::Error;

/// Result type alias for netcfg operations.
pub type NetCfgResult<T> = Result<T, NetCfgError>;

/// Errors that can occur while running configuration commands.
#[derive(Debug, Error)]
pub enum NetCfgError {
    /// Failed to execute a shell command (spawn error).
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// The remote executor rejected or aborted a request.
    #[error("Remote execution failed after {completed} result(s): {message}")]
    Remote {
        /// Number of results returned before the failure.
        completed: usize,
        /// Error message.
        message: String,
        /// Output of the failing step, when the executor returned one.
        output: String,
    },

    /// Request or reply could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl NetCfgError {
    /// Creates a remote execution error.
    pub fn remote(
        completed: usize,
        message: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::Remote {
            completed,
            message: message.into(),
            output: output.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the output captured before the failure, if any.
    pub fn output(&self) -> &[u8] {
        match self {
            NetCfgError::ShellCommandFailed { output, .. } | NetCfgError::Remote { output, .. } => {
                output.as_bytes()
            }
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetCfgError::invalid_config("frr.auto_restart", "unknown mode 'bounce'");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for frr.auto_restart: unknown mode 'bounce'"
        );
    }

    #[test]
    fn test_remote_error() {
        let err = NetCfgError::remote(2, "exit status 1", "no such file");
        assert_eq!(
            err.to_string(),
            "Remote execution failed after 2 result(s): exit status 1"
        );
        assert_eq!(err.output(), b"no such file");
    }

    #[test]
    fn test_shell_command_failed() {
        let err = NetCfgError::ShellCommandFailed {
            command: "sysctl -p /etc/sysctl.d/30-beluganos.conf".to_string(),
            exit_code: 255,
            output: "sysctl: cannot stat".to_string(),
        };
        assert!(err.to_string().contains("sysctl -p"));
        assert!(err.to_string().contains("exit code 255"));
        assert_eq!(err.output(), b"sysctl: cannot stat");
    }

    #[test]
    fn test_output_empty_for_other_errors() {
        assert!(NetCfgError::internal("bug").output().is_empty());
    }
}

// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the Siril pipe client.
//!
//! This module provides strongly-typed errors for the transport and session
//! layers, using `thiserror` for ergonomic error definitions. The `asiril`
//! binary wraps these in `anyhow` at its rim.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by a pipe endpoint.
///
/// `NotReadMode`, `NotWriteMode` and `NotConnected` are programming errors:
/// they indicate a misuse of the endpoint and are never retried. IO errors
/// during an established connection surface as `Io`.
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("Pipe not in read mode")]
    NotReadMode,

    #[error("Pipe not in write mode")]
    NotWriteMode,

    #[error("Pipe not connected")]
    NotConnected,

    #[error("Pipe connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Pipe IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a Siril session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Siril reported an error for a command. This is the expected,
    /// recoverable-by-caller failure mode: it carries both the offending
    /// command and Siril's own message.
    #[error("Siril error from command: `{command}` error: `{message}`")]
    Command { command: String, message: String },

    /// The siril-cli executable could not be located. Raised at session
    /// construction, before any pipe is touched.
    #[error("Siril CLI executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("Pipe error: {0}")]
    Pipe(#[from] PipeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The producer loop has terminated; no further commands can be sent.
    #[error("Command producer is closed")]
    ProducerClosed,

    /// The event queue ended before a terminal event arrived.
    #[error("Event stream closed while awaiting completion of `{0}`")]
    EventStreamClosed(String),

    #[error("Siril did not report ready within {0:?}")]
    ReadyTimeout(Duration),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Create a command error from the failing command text and Siril's
    /// reported message.
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Whether this error was reported by Siril itself (as opposed to a
    /// transport or process failure).
    pub fn is_command_error(&self) -> bool {
        matches!(self, Self::Command { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = SessionError::command("stack rej 3 3", "no sequence loaded");
        assert_eq!(
            err.to_string(),
            "Siril error from command: `stack rej 3 3` error: `no sequence loaded`"
        );
        assert!(err.is_command_error());
    }

    #[test]
    fn test_command_error_empty_fields() {
        let err = SessionError::command("", "");
        assert_eq!(err.to_string(), "Siril error from command: `` error: ``");
    }

    #[test]
    fn test_pipe_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let pipe_err: PipeError = io_err.into();
        let session_err: SessionError = pipe_err.into();
        assert!(matches!(session_err, SessionError::Pipe(PipeError::Io(_))));
        assert!(!session_err.is_command_error());
    }

    #[test]
    fn test_mode_error_messages() {
        assert_eq!(PipeError::NotReadMode.to_string(), "Pipe not in read mode");
        assert_eq!(PipeError::NotWriteMode.to_string(), "Pipe not in write mode");
        assert_eq!(PipeError::NotConnected.to_string(), "Pipe not connected");
    }
}

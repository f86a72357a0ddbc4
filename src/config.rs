// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session and transport configuration.
//!
//! Everything a session needs is threaded through these structs; there is no
//! process-global state. Configuration can be built in code or loaded from a
//! JSON file (all fields optional, falling back to defaults).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resources::SirilResource;

/// Default path of the pipe Siril writes events to.
#[cfg(unix)]
pub const DEFAULT_EVENT_PIPE: &str = "/tmp/siril_command.out";
#[cfg(windows)]
pub const DEFAULT_EVENT_PIPE: &str = r"\\.\pipe\siril_command.out";

/// Default path of the pipe Siril reads commands from.
#[cfg(unix)]
pub const DEFAULT_COMMAND_PIPE: &str = "/tmp/siril_command.in";
#[cfg(windows)]
pub const DEFAULT_COMMAND_PIPE: &str = r"\\.\pipe\siril_command.in";

/// Location and connection behavior of the two pipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Pipe this client reads events from (Siril's output pipe).
    pub event_pipe: PathBuf,
    /// Pipe this client writes commands to (Siril's input pipe).
    pub command_pipe: PathBuf,
    /// How long to wait for a pipe to appear before giving up.
    /// `None` waits indefinitely.
    pub connect_timeout_secs: Option<f64>,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            event_pipe: PathBuf::from(DEFAULT_EVENT_PIPE),
            command_pipe: PathBuf::from(DEFAULT_COMMAND_PIPE),
            connect_timeout_secs: None,
        }
    }
}

impl PipeConfig {
    /// Pipe paths placed under `dir`, for sessions that must not collide on
    /// the default `/tmp` names.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            event_pipe: dir.join("siril_command.out"),
            command_pipe: dir.join("siril_command.in"),
            connect_timeout_secs: None,
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs_f64)
    }
}

/// Full configuration of a Siril session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SirilConfig {
    /// Path to the siril-cli executable. When unset, well-known install
    /// locations are probed.
    pub executable: Option<PathBuf>,
    /// Working directory passed to Siril via `-d`.
    pub working_directory: Option<PathBuf>,
    /// How long to wait for Siril's `ready` event after spawn.
    /// `None` waits indefinitely.
    pub ready_timeout_secs: Option<f64>,
    pub pipe: PipeConfig,
    pub resources: SirilResource,
}

impl SirilConfig {
    /// Load configuration from a JSON file.
    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_secs.map(Duration::from_secs_f64)
    }
}

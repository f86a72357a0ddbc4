// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! async-siril - a typed async client for Siril's command pipes.
//!
//! [Siril](https://siril.org) is an astronomical image processor. Started
//! with `--pipe` it reads commands from one named pipe and reports events
//! on another; this crate drives that protocol from tokio.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`event`] - Parser for Siril's event lines (log, progress, status, ready)
//! - [`pipe`] - Pipe transport plus the consumer and producer loops
//! - [`session`] - The [`SirilCli`] orchestrator: process lifecycle and the
//!   one-command-in-flight request/response protocol
//! - [`command`] - Typed commands and the line-formatting rules
//! - [`types`] - Shared enums for stacking, registration and file formats
//! - [`resources`] - CPU/memory limits, including container-aware detection
//! - [`config`] - Session configuration with a JSON loader
//! - [`helpers`] - Stacking heuristics
//! - [`conversion`] - Reader for Siril's conversion records
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,ignore
//! use async_siril::command::{Cd, Load};
//! use async_siril::config::SirilConfig;
//! use async_siril::session::SirilCli;
//!
//! let mut session = SirilCli::new(SirilConfig::default()).await?;
//! session.start().await?;
//! session.command(Cd::new("/data/lights")).await?;
//! session.command(Load::new("light_00001")).await?;
//! session.close().await?;
//! ```

pub mod command;
pub mod config;
pub mod conversion;
pub mod error;
pub mod event;
pub mod helpers;
pub mod pipe;
pub mod resources;
pub mod session;
pub mod types;

pub use command::{SirilCommand, SirilSetting};
pub use config::{PipeConfig, SirilConfig};
pub use error::{PipeError, SessionError};
pub use event::{EventKind, SirilEvent};
pub use resources::SirilResource;
pub use session::SirilCli;

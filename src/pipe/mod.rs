// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Named-pipe transport and the two protocol loops.
//!
//! Siril's pipe mode exposes two unidirectional line channels:
//!
//! ```text
//! ┌─────────────┐  siril_command.out   ┌─────────────┐
//! │             │──────events─────────►│   Consumer  │
//! │    Siril    │                      │   /Producer │
//! │             │◄─────commands────────│   (client)  │
//! └─────────────┘  siril_command.in    └─────────────┘
//! ```
//!
//! - [`transport::LineTransport`] is the seam between the loops and the OS;
//!   [`transport::PipeEndpoint`] is its production implementation (FIFOs on
//!   unix, named pipes on Windows, selected at compile time).
//! - [`consumer::EventConsumer`] owns the read end: it reconnects across
//!   Siril restarts, signals the ready handshake, and fans events into an
//!   unbounded queue.
//! - [`producer::CommandProducer`] owns the write end: it connects once and
//!   drains an unbounded command queue in strict submission order.
//!
//! Correlation between commands and events is purely positional: at most one
//! command is in flight at a time, so every event up to the next terminal
//! status belongs to it. The session layer enforces that discipline.

pub mod consumer;
pub mod producer;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

/// Which side of the protocol an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeDirection {
    /// Events flowing from Siril to us.
    Read,
    /// Commands flowing from us to Siril.
    Write,
}

pub use consumer::EventConsumer;
pub use producer::{CommandProducer, ProducerClosed};
pub use transport::{LineTransport, PipeEndpoint};

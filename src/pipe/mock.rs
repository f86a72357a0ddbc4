// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Scripted in-memory transport for protocol tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::PipeError;

use super::transport::LineTransport;
use super::PipeDirection;

/// In-memory `LineTransport`: inbound lines come from a channel the test
/// feeds, outbound lines are recorded on a channel the test drains.
pub(crate) struct MockTransport {
    direction: PipeDirection,
    incoming: mpsc::UnboundedReceiver<String>,
    written: mpsc::UnboundedSender<String>,
    connected: bool,
    closed: Arc<AtomicBool>,
}

/// The test's side of a [`MockTransport`].
pub(crate) struct MockRemote {
    /// Feed inbound lines; dropping this sender is EOF.
    pub lines: mpsc::UnboundedSender<String>,
    /// Observe outbound writes.
    pub written: mpsc::UnboundedReceiver<String>,
    /// Set once the transport has been closed.
    pub closed: Arc<AtomicBool>,
}

pub(crate) fn mock_pair(direction: PipeDirection) -> (MockTransport, MockRemote) {
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    let (written_tx, written_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        MockTransport {
            direction,
            incoming: lines_rx,
            written: written_tx,
            connected: false,
            closed: closed.clone(),
        },
        MockRemote {
            lines: lines_tx,
            written: written_rx,
            closed,
        },
    )
}

#[async_trait]
impl LineTransport for MockTransport {
    async fn connect(&mut self) -> Result<(), PipeError> {
        self.connected = true;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, PipeError> {
        if self.direction != PipeDirection::Read {
            return Err(PipeError::NotReadMode);
        }
        if !self.connected {
            return Err(PipeError::NotConnected);
        }
        Ok(self.incoming.recv().await)
    }

    async fn write_line(&mut self, line: &str) -> Result<(), PipeError> {
        if self.direction != PipeDirection::Write {
            return Err(PipeError::NotWriteMode);
        }
        if !self.connected {
            return Err(PipeError::NotConnected);
        }
        self.written
            .send(line.to_string())
            .map_err(|_| PipeError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PipeError> {
        self.connected = false;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

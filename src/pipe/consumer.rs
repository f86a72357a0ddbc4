// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Event read loop.
//!
//! Owns the read transport for the life of a session. Siril may not have
//! created its output pipe yet when we start, and it recreates the pipe when
//! it restarts, so the loop treats connect failures, read errors AND EOF as
//! reasons to go back to connecting rather than as fatal.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::PipeError;
use crate::event::SirilEvent;

use super::transport::LineTransport;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Background task reading events from Siril's output pipe.
///
/// The `ready` line resolves the one-shot handshake signal and is not
/// queued; every other event lands in the queue returned by
/// [`take_events`](Self::take_events) in arrival order. The first EOF
/// resolves the one-shot closed signal.
pub struct EventConsumer {
    events: Option<mpsc::UnboundedReceiver<SirilEvent>>,
    ready: Option<oneshot::Receiver<()>>,
    closed: Option<oneshot::Receiver<()>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl EventConsumer {
    /// Start the read loop on `transport`.
    pub fn spawn<T: LineTransport + 'static>(transport: T) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (closed_tx, closed_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run(transport, events_tx, ready_tx, closed_tx, shutdown_rx));

        Self {
            events: Some(events_rx),
            ready: Some(ready_rx),
            closed: Some(closed_rx),
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Take the event queue. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SirilEvent>> {
        self.events.take()
    }

    /// Wait for Siril's `ready` handshake. Single-use.
    pub async fn ready(&mut self) -> Result<(), PipeError> {
        match self.ready.take() {
            Some(rx) => rx.await.map_err(|_| PipeError::NotConnected),
            None => Ok(()),
        }
    }

    /// Wait for the peer to close the pipe (EOF). Single-use.
    pub async fn closed(&mut self) -> Result<(), PipeError> {
        match self.closed.take() {
            Some(rx) => rx.await.map_err(|_| PipeError::NotConnected),
            None => Ok(()),
        }
    }

    /// Stop the loop and close the transport. Idempotent.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for EventConsumer {
    fn drop(&mut self) {
        // Dropping the shutdown sender also ends the loop at its next
        // suspension point; abort covers a loop blocked in transport IO.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<T: LineTransport>(
    mut transport: T,
    events: mpsc::UnboundedSender<SirilEvent>,
    ready: oneshot::Sender<()>,
    closed: oneshot::Sender<()>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ready = Some(ready);
    let mut closed = Some(closed);

    'outer: loop {
        let connected = tokio::select! {
            _ = &mut shutdown => break 'outer,
            result = transport.connect() => result,
        };
        match connected {
            Ok(()) => info!("event pipe connected"),
            // A configured connect timeout is a hard stop, not a retry.
            Err(err @ PipeError::ConnectTimeout(_)) => {
                warn!(error = %err, "event pipe connect timed out");
                if let Some(tx) = closed.take() {
                    let _ = tx.send(());
                }
                break 'outer;
            }
            Err(err) => {
                warn!(error = %err, "event pipe connect failed, retrying");
                tokio::select! {
                    _ = &mut shutdown => break 'outer,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => continue 'outer,
                }
            }
        }

        loop {
            let line = tokio::select! {
                _ = &mut shutdown => break 'outer,
                line = transport.read_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    let event = SirilEvent::parse(&line);
                    trace!(event = %event, "event received");
                    if event.is_ready() {
                        if let Some(tx) = ready.take() {
                            debug!("siril reported ready");
                            let _ = tx.send(());
                        }
                        continue;
                    }
                    if events.send(event).is_err() {
                        // Nobody is listening any more.
                        break 'outer;
                    }
                }
                Ok(None) => {
                    debug!("event pipe closed by peer");
                    if let Some(tx) = closed.take() {
                        let _ = tx.send(());
                    }
                    let _ = transport.close().await;
                    tokio::select! {
                        _ = &mut shutdown => break 'outer,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => break,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "event pipe read failed, reconnecting");
                    let _ = transport.close().await;
                    tokio::select! {
                        _ = &mut shutdown => break 'outer,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => break,
                    }
                }
            }
        }
    }

    let _ = transport.close().await;
    info!("event consumer stopped");
}

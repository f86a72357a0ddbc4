// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Command write loop.
//!
//! Connects once, then drains an unbounded queue in strict submission
//! order. A write failure is fatal to the loop: pipe writes either succeed
//! or the session is over, so there is no retry. The transport is closed on
//! every exit path.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::PipeError;

use super::transport::LineTransport;

/// The write loop has terminated; no further commands can be sent.
#[derive(Debug, Error)]
#[error("Command producer is closed")]
pub struct ProducerClosed;

const STOP_GRACE: Duration = Duration::from_secs(5);

/// Background task writing commands to Siril's input pipe.
pub struct CommandProducer {
    queue: mpsc::UnboundedSender<String>,
    shutdown: Option<oneshot::Sender<()>>,
    closed: Option<oneshot::Receiver<()>>,
    task: Option<JoinHandle<()>>,
}

impl CommandProducer {
    /// Start the write loop on `transport`.
    pub fn spawn<T: LineTransport + 'static>(transport: T) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (closed_tx, closed_rx) = oneshot::channel();

        let task = tokio::spawn(run(transport, queue_rx, shutdown_rx, closed_tx));

        Self {
            queue: queue_tx,
            shutdown: Some(shutdown_tx),
            closed: Some(closed_rx),
            task: Some(task),
        }
    }

    /// Enqueue one command line. Never blocks on IO; ordering follows call
    /// order.
    pub fn send(&self, line: impl Into<String>) -> Result<(), ProducerClosed> {
        self.queue.send(line.into()).map_err(|_| ProducerClosed)
    }

    /// Wait for the loop to finish (queue drained or write failure).
    /// Single-use.
    pub async fn closed(&mut self) {
        if let Some(rx) = self.closed.take() {
            let _ = rx.await;
        }
    }

    /// Stop the loop and close the transport. Idempotent. Commands already
    /// queued are still written first; a write blocked on an absent reader
    /// is abandoned after a grace period.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for CommandProducer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<T: LineTransport>(
    mut transport: T,
    queue: mpsc::UnboundedReceiver<String>,
    shutdown: oneshot::Receiver<()>,
    closed: oneshot::Sender<()>,
) {
    if let Err(err) = pump(&mut transport, queue, shutdown).await {
        error!(error = %err, "command pipe write loop failed");
    }
    // Close runs whether the loop drained, failed or was stopped.
    let _ = transport.close().await;
    let _ = closed.send(());
    info!("command producer stopped");
}

async fn pump<T: LineTransport>(
    transport: &mut T,
    mut queue: mpsc::UnboundedReceiver<String>,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<(), PipeError> {
    // Connect once; blocks until Siril attaches its read end.
    tokio::select! {
        _ = &mut shutdown => return Ok(()),
        result = transport.connect() => result?,
    }
    info!("command pipe connected");

    loop {
        // Biased so queued commands drain before a shutdown is honored;
        // the `exit` command must reach Siril even when stop follows it
        // immediately.
        let line = tokio::select! {
            biased;
            line = queue.recv() => match line {
                Some(line) => line,
                None => return Ok(()),
            },
            _ = &mut shutdown => return Ok(()),
        };
        debug!(command = %line, "sending command");
        transport.write_line(&line).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::mock::mock_pair;
    use crate::pipe::PipeDirection;

    #[tokio::test]
    async fn test_commands_written_in_order() {
        let (transport, mut remote) = mock_pair(PipeDirection::Write);
        let mut producer = CommandProducer::spawn(transport);

        producer.send("cd '/data'").unwrap();
        producer.send("load light_00001").unwrap();
        producer.send("close").unwrap();

        assert_eq!(remote.written.recv().await.unwrap(), "cd '/data'");
        assert_eq!(remote.written.recv().await.unwrap(), "load light_00001");
        assert_eq!(remote.written.recv().await.unwrap(), "close");

        producer.stop().await;
    }

    #[tokio::test]
    async fn test_stop_closes_transport_and_rejects_sends() {
        let (transport, remote) = mock_pair(PipeDirection::Write);
        let mut producer = CommandProducer::spawn(transport);

        producer.stop().await;
        assert!(remote.closed.load(std::sync::atomic::Ordering::SeqCst));
        assert!(!producer.is_running());

        assert!(producer.send("ping").is_err());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (transport, _remote) = mock_pair(PipeDirection::Write);
        let mut producer = CommandProducer::spawn(transport);

        producer.stop().await;
        producer.stop().await;
    }

    #[tokio::test]
    async fn test_closed_resolves_after_stop() {
        let (transport, _remote) = mock_pair(PipeDirection::Write);
        let mut producer = CommandProducer::spawn(transport);

        producer.stop().await;
        producer.closed().await;
    }
}

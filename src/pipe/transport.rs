// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cross-platform line transport over Siril's pipes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace};

use crate::error::PipeError;

use super::PipeDirection;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

pub trait PipeIo: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl<T> PipeIo for T where T: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

pub type PipeStream = Box<dyn PipeIo>;

const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A connection that carries newline-delimited text in one direction.
///
/// This is the seam between the protocol loops and the OS: production code
/// uses [`PipeEndpoint`], tests script a mock.
#[async_trait]
pub trait LineTransport: Send {
    /// Establish the connection. Idempotent; waits for the peer to create
    /// its end of the pipe.
    async fn connect(&mut self) -> Result<(), PipeError>;

    /// Read one line, without its terminator. `Ok(None)` means the peer
    /// closed the pipe.
    async fn read_line(&mut self) -> Result<Option<String>, PipeError>;

    /// Write one line followed by a newline and flush it.
    async fn write_line(&mut self, line: &str) -> Result<(), PipeError>;

    /// Close the connection. Safe to call when not connected; a closed
    /// transport may be connected again.
    async fn close(&mut self) -> Result<(), PipeError>;
}

/// One end of a Siril command pipe.
///
/// On unix the pipe is a FIFO created by Siril; opening it blocks until the
/// other side attaches, so `connect` first polls for the path to appear and
/// then opens through `tokio::fs` (which runs the blocking open off the
/// scheduler). On Windows it is a named pipe opened as a client, retried
/// while Siril has not created it yet.
pub struct PipeEndpoint {
    path: PathBuf,
    direction: PipeDirection,
    connect_timeout: Option<Duration>,
    stream: Option<BufReader<PipeStream>>,
}

impl PipeEndpoint {
    pub fn new(path: impl AsRef<Path>, direction: PipeDirection) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            direction,
            connect_timeout: None,
            stream: None,
        }
    }

    /// Bound the wait in `connect`. Without one, `connect` waits for the
    /// pipe indefinitely.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn direction(&self) -> PipeDirection {
        self.direction
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    #[cfg(unix)]
    async fn open_stream(&self) -> Result<PipeStream, PipeError> {
        // Siril creates the FIFOs itself; wait for them to appear.
        while !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            trace!(path = %self.path.display(), "waiting for pipe to appear");
            tokio::time::sleep(CONNECT_POLL_INTERVAL).await;
        }

        let file = match self.direction {
            PipeDirection::Read => {
                tokio::fs::OpenOptions::new()
                    .read(true)
                    .open(&self.path)
                    .await?
            }
            // Blocks until Siril opens its read end.
            PipeDirection::Write => {
                tokio::fs::OpenOptions::new()
                    .write(true)
                    .open(&self.path)
                    .await?
            }
        };
        Ok(Box::new(file))
    }

    #[cfg(windows)]
    async fn open_stream(&self) -> Result<PipeStream, PipeError> {
        let name = self.path.to_string_lossy();
        loop {
            match ClientOptions::new().open(name.as_ref()) {
                Ok(client) => return Ok(Box::new(client)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    trace!(path = %self.path.display(), "waiting for pipe to appear");
                    tokio::time::sleep(CONNECT_POLL_INTERVAL).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[async_trait]
impl LineTransport for PipeEndpoint {
    async fn connect(&mut self) -> Result<(), PipeError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, self.open_stream())
                .await
                .map_err(|_| PipeError::ConnectTimeout(limit))??,
            None => self.open_stream().await?,
        };

        debug!(path = %self.path.display(), direction = ?self.direction, "pipe connected");
        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, PipeError> {
        if self.direction != PipeDirection::Read {
            return Err(PipeError::NotReadMode);
        }
        let stream = self.stream.as_mut().ok_or(PipeError::NotConnected)?;

        let mut buf = Vec::new();
        let n = stream.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        // Siril's output is not guaranteed to be UTF-8 (localized messages).
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    async fn write_line(&mut self, line: &str) -> Result<(), PipeError> {
        if self.direction != PipeDirection::Write {
            return Err(PipeError::NotWriteMode);
        }
        let stream = self.stream.as_mut().ok_or(PipeError::NotConnected)?;

        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PipeError> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            debug!(path = %self.path.display(), "pipe closed");
        }
        Ok(())
    }
}

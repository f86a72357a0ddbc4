// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session orchestrator: owns the Siril process and the request/response
//! protocol on top of the consumer and producer loops.
//!
//! The pipe protocol has no correlation ids. The only way to match events
//! to commands is to keep at most one command in flight, which `command`
//! enforces by taking `&mut self`: the compiler rules out interleaved
//! commands on the same session.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::command::{Capabilities, Requires, Set, SetCpu, SirilCommand, SirilSetting};
use crate::config::SirilConfig;
use crate::error::SessionError;
use crate::event::SirilEvent;
use crate::pipe::{CommandProducer, EventConsumer, PipeDirection, PipeEndpoint};

/// Oldest Siril this client's command set is known to work with.
const MINIMUM_SIRIL_VERSION: &str = "1.2.0";

const STOP_WAIT: Duration = Duration::from_secs(5);

/// Well-known install locations probed when no executable override is set.
#[cfg(target_os = "windows")]
const WELL_KNOWN_PATHS: &[&str] = &[
    "C:/msys64/mingw64/bin/siril-cli.exe",
    "C:/Program Files/Siril/bin/siril-cli.exe",
];
#[cfg(target_os = "macos")]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/Applications/Siril.app/Contents/MacOS/siril-cli",
    "/opt/homebrew/bin/siril-cli",
    "/usr/local/bin/siril-cli",
];
#[cfg(all(unix, not(target_os = "macos")))]
const WELL_KNOWN_PATHS: &[&str] = &["/usr/local/bin/siril-cli", "/usr/bin/siril-cli"];

/// A Siril process driven over its command pipes.
///
/// `new` resolves the executable and probes its version without touching
/// any pipe; `start` spawns the process, completes the ready handshake and
/// issues the session-initialization commands. `close` asks Siril to exit
/// and tears everything down; dropping a running session kills the process
/// as a last resort.
pub struct SirilCli {
    config: SirilConfig,
    executable: PathBuf,
    version: String,
    consumer: Option<EventConsumer>,
    producer: Option<CommandProducer>,
    events: Option<mpsc::UnboundedReceiver<SirilEvent>>,
    child: Option<Child>,
    log_tasks: Vec<JoinHandle<()>>,
}

impl SirilCli {
    /// Resolve the executable and capture its self-reported version.
    pub async fn new(config: SirilConfig) -> Result<Self, SessionError> {
        let executable = find_siril_cli(config.executable.as_deref())?;
        let version = probe_version(&executable).await?;
        debug!(executable = %executable.display(), version = %version, "siril-cli resolved");
        Ok(Self {
            config,
            executable,
            version,
            consumer: None,
            producer: None,
            events: None,
            child: None,
            log_tasks: Vec::new(),
        })
    }

    /// The first line of `siril-cli --version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Spawn Siril in pipe mode, await its ready handshake, then run the
    /// session-initialization commands (minimum version check, capability
    /// query, resource limits).
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.is_running() {
            return Ok(());
        }

        let pipe = &self.config.pipe;
        let read = PipeEndpoint::new(&pipe.event_pipe, PipeDirection::Read)
            .with_connect_timeout(pipe.connect_timeout());
        let write = PipeEndpoint::new(&pipe.command_pipe, PipeDirection::Write)
            .with_connect_timeout(pipe.connect_timeout());

        let mut command = Command::new(&self.executable);
        if let Some(dir) = &self.config.working_directory {
            command.arg("-d").arg(dir);
        }
        command
            .arg("--pipe")
            .arg("--inpipe")
            .arg(&pipe.command_pipe)
            .arg("--outpipe")
            .arg(&pipe.event_pipe)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        info!(executable = %self.executable.display(), pid = child.id(), "siril started");

        if let Some(stdout) = child.stdout.take() {
            self.log_tasks.push(tokio::spawn(forward_logs(stdout, "stdout")));
        }
        if let Some(stderr) = child.stderr.take() {
            self.log_tasks.push(tokio::spawn(forward_logs(stderr, "stderr")));
        }

        let mut consumer = EventConsumer::spawn(read);
        let producer = CommandProducer::spawn(write);
        self.events = consumer.take_events();
        self.consumer = Some(consumer);
        self.producer = Some(producer);
        self.child = Some(child);

        if let Err(err) = self.wait_ready().await {
            self.stop().await;
            return Err(err);
        }
        info!("siril ready");

        if let Err(err) = self.init_session().await {
            self.stop().await;
            return Err(err);
        }
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), SessionError> {
        let consumer = self.consumer.as_mut().ok_or(SessionError::ProducerClosed)?;
        match self.config.ready_timeout() {
            Some(limit) => tokio::time::timeout(limit, consumer.ready())
                .await
                .map_err(|_| SessionError::ReadyTimeout(limit))??,
            None => consumer.ready().await?,
        }
        Ok(())
    }

    async fn init_session(&mut self) -> Result<(), SessionError> {
        self.command(Requires::new(MINIMUM_SIRIL_VERSION)).await?;
        self.command(Capabilities).await?;

        let resources = self.config.resources.clone();
        if let Some(count) = resources.cpu_limit {
            self.command(SetCpu { count }).await?;
        }
        if let Some(amount) = resources.memory_limit_gb {
            self.set(SirilSetting::MemMode, 1).await?;
            self.set(SirilSetting::MemAmount, amount).await?;
        } else {
            self.set(SirilSetting::MemMode, 0).await?;
        }
        self.set(SirilSetting::MemRatio, resources.memory_percent)
            .await?;
        Ok(())
    }

    /// Run one command and wait for its terminal status event.
    ///
    /// The literal `exit` command is special: Siril closes its pipes
    /// instead of reporting a status, so it is sent and the session is
    /// stopped locally without awaiting a terminal event.
    pub async fn command<C: SirilCommand>(&mut self, command: C) -> Result<(), SessionError> {
        let line = command.render();
        if line == "exit" {
            if let Some(producer) = &self.producer {
                let _ = producer.send(line);
            }
            self.stop().await;
            return Ok(());
        }
        self.run_command(line).await
    }

    /// Run several commands sequentially through the same protocol.
    pub async fn command_all<C, I>(&mut self, commands: I) -> Result<(), SessionError>
    where
        C: SirilCommand,
        I: IntoIterator<Item = C>,
    {
        for command in commands {
            self.command(command).await?;
        }
        Ok(())
    }

    /// Like [`command`](Self::command), but a Siril-reported error becomes
    /// `Ok(false)` instead of an error. Transport and process failures
    /// still propagate.
    pub async fn failable_command<C: SirilCommand>(
        &mut self,
        command: C,
    ) -> Result<bool, SessionError> {
        match self.command(command).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_command_error() => {
                debug!(error = %err, "command failed, continuing");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Change one Siril setting via the `set` command.
    pub async fn set(
        &mut self,
        setting: SirilSetting,
        value: impl fmt::Display,
    ) -> Result<(), SessionError> {
        self.command(Set::new(setting, value)).await
    }

    async fn run_command(&mut self, line: String) -> Result<(), SessionError> {
        let producer = self.producer.as_ref().ok_or(SessionError::ProducerClosed)?;
        let events = self
            .events
            .as_mut()
            .ok_or_else(|| SessionError::EventStreamClosed(line.clone()))?;

        producer
            .send(line.clone())
            .map_err(|_| SessionError::ProducerClosed)?;

        loop {
            let event = events
                .recv()
                .await
                .ok_or_else(|| SessionError::EventStreamClosed(line.clone()))?;
            if event.errored() {
                return Err(SessionError::command(
                    line,
                    event.message().unwrap_or_default(),
                ));
            }
            if event.completed() {
                debug!(command = %line, "command completed");
                return Ok(());
            }
            if let Some(percent) = event.progress() {
                trace!(command = %line, percent, "progress");
            } else if let Some(message) = event.message() {
                info!(target: "siril", "{message}");
            }
        }
    }

    /// Ask Siril to exit, then stop the loops and reap the process.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if !self.is_running() {
            return Ok(());
        }
        if let Some(producer) = &self.producer {
            let _ = producer.send("exit");
        }
        // Give Siril a moment to drop its end of the pipe.
        if let Some(consumer) = self.consumer.as_mut() {
            let _ = tokio::time::timeout(STOP_WAIT, consumer.closed()).await;
        }
        self.stop().await;
        Ok(())
    }

    /// Stop both loops, terminate the process and drop the log forwarders.
    /// Idempotent.
    pub async fn stop(&mut self) {
        if let Some(mut consumer) = self.consumer.take() {
            consumer.stop().await;
        }
        if let Some(mut producer) = self.producer.take() {
            producer.stop().await;
        }
        self.events = None;

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(STOP_WAIT, child.wait()).await {
                Ok(Ok(status)) => info!(%status, "siril exited"),
                Ok(Err(err)) => warn!(error = %err, "failed to reap siril"),
                Err(_) => {
                    warn!("siril did not exit in time, killing it");
                    let _ = child.kill().await;
                }
            }
        }

        for task in self.log_tasks.drain(..) {
            task.abort();
        }
        info!("siril session stopped");
    }
}

impl Drop for SirilCli {
    fn drop(&mut self) {
        // Last-resort cleanup; `close` is the orderly path.
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

fn find_siril_cli(overridden: Option<&Path>) -> Result<PathBuf, SessionError> {
    if let Some(path) = overridden {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(SessionError::ExecutableNotFound(path.to_path_buf()));
    }
    for candidate in WELL_KNOWN_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }
    Err(SessionError::ExecutableNotFound(PathBuf::from("siril-cli")))
}

async fn probe_version(executable: &Path) -> Result<String, SessionError> {
    let output = Command::new(executable).arg("--version").output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

async fn forward_logs(stream: impl AsyncRead + Unpin, name: &'static str) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        info!(target: "siril", stream = name, "{line}");
    }
    trace!(stream = name, "log stream ended");
}

//! Shell client
//!
//! Used by shell implementations (and tests) to connect to the running
//! orchestrator, report events and receive surface commands.

use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tracing::debug;

use super::protocol::{ShellCommand, ShellEvent, ShellReply};
use super::socket_path;
use crate::error::{OrbitError, Result};
use crate::session::{CaptureEvent, ControlIntent, SurfaceEvent};

/// Default connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Shell end of the orchestrator connection
pub struct ShellClient {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl ShellClient {
    /// Connect to the orchestrator at the default socket path
    pub async fn connect() -> Result<Self> {
        Self::connect_to(&socket_path(), CONNECT_TIMEOUT).await
    }

    /// Connect to a specific socket with a custom timeout
    pub async fn connect_to(path: &Path, timeout: Duration) -> Result<Self> {
        if !path.exists() {
            return Err(OrbitError::ipc(format!("Orbit is not running ({:?} missing)", path)));
        }

        let stream = tokio::time::timeout(timeout, UnixStream::connect(path))
            .await
            .map_err(|_| OrbitError::ipc("Connection timed out"))?
            .map_err(|e| OrbitError::ipc(format!("Failed to connect to Orbit: {}", e)))?;

        debug!("Connected to Orbit at {:?}", path);

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Send one event
    pub async fn send(&mut self, event: &ShellEvent) -> Result<()> {
        tokio::time::timeout(IO_TIMEOUT, self.writer.write_all(&event.to_bytes()))
            .await
            .map_err(|_| OrbitError::ipc("Write timed out"))?
            .map_err(|e| OrbitError::ipc(format!("Failed to send event: {}", e)))
    }

    /// Announce the shell; must be the first event
    pub async fn hello(&mut self, tray: bool) -> Result<()> {
        self.send(&ShellEvent::Hello { tray }).await
    }

    pub async fn intent(&mut self, intent: ControlIntent) -> Result<()> {
        self.send(&ShellEvent::Intent { intent }).await
    }

    pub async fn capture(&mut self, event: CaptureEvent) -> Result<()> {
        self.send(&ShellEvent::Capture { event }).await
    }

    pub async fn surface(&mut self, event: SurfaceEvent) -> Result<()> {
        self.send(&ShellEvent::Surface { event }).await
    }

    /// Answer a request received as [`ShellCommand::Request`]
    pub async fn reply(&mut self, id: u64, reply: ShellReply) -> Result<()> {
        self.send(&ShellEvent::Reply { id, reply }).await
    }

    /// Next command from the orchestrator; `None` once it hangs up
    pub async fn next_command(&mut self) -> Result<Option<ShellCommand>> {
        loop {
            let line = self
                .reader
                .next_line()
                .await
                .map_err(|e| OrbitError::ipc(format!("Failed to read command: {}", e)))?;
            let Some(line) = line else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(ShellCommand::from_bytes(trimmed.as_bytes())?));
        }
    }

    /// Like [`ShellClient::next_command`] but gives up after `timeout`
    pub async fn next_command_timeout(&mut self, timeout: Duration) -> Result<Option<ShellCommand>> {
        tokio::time::timeout(timeout, self.next_command())
            .await
            .map_err(|_| OrbitError::ipc("Read timed out"))?
    }
}

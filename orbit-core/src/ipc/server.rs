//! Shell server
//!
//! Listens on a Unix socket for the shell. One shell is served at a time:
//! its events go to the session controller, its replies to the
//! [`ShellLink`], and queued commands are written back on the same
//! connection.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use super::bridge::ShellLink;
use super::protocol::{ShellCommand, ShellEvent};
use crate::error::{OrbitError, Result};
use crate::session::{ControllerEvent, ControllerHandle};

/// How often the accept loop checks for shutdown
const ACCEPT_TIMEOUT: Duration = Duration::from_millis(100);

/// Unix socket server for the shell
pub struct ShellServer {
    /// Path to the Unix socket
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    link: Arc<ShellLink>,
    commands: mpsc::UnboundedReceiver<ShellCommand>,
    controller: ControllerHandle,
    shutdown_tx: broadcast::Sender<()>,
}

impl ShellServer {
    /// Create a server; `commands` is the receiver paired with `link`
    pub fn new(
        socket_path: impl Into<PathBuf>,
        link: Arc<ShellLink>,
        commands: mpsc::UnboundedReceiver<ShellCommand>,
        controller: ControllerHandle,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            socket_path: socket_path.into(),
            listener: None,
            link,
            commands,
            controller,
            shutdown_tx,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Start listening for connections
    pub async fn start(&mut self) -> Result<()> {
        // Remove existing socket if present
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .map_err(|e| OrbitError::ipc(format!("Failed to remove old socket: {}", e)))?;
        }

        if let Some(parent) = self.socket_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    OrbitError::ipc(format!("Failed to create socket directory: {}", e))
                })?;
            }
        }

        let listener = UnixListener::bind(&self.socket_path).map_err(|e| {
            OrbitError::ipc(format!(
                "Failed to bind socket at {:?}: {}",
                self.socket_path, e
            ))
        })?;

        // Owner-only; the shell runs as the same user
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&self.socket_path, permissions).map_err(|e| {
            warn!("Failed to set socket permissions: {}", e);
            OrbitError::ipc(format!("Failed to set socket permissions: {}", e))
        })?;

        info!("Shell server listening on {:?}", self.socket_path);
        self.listener = Some(listener);

        Ok(())
    }

    /// Sender that stops [`ShellServer::run`] when signalled
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Serve shells until shutdown is signalled
    pub async fn run(&mut self) -> Result<()> {
        let mut shutdown = self.shutdown_tx.subscribe();
        loop {
            if !matches!(shutdown.try_recv(), Err(broadcast::error::TryRecvError::Empty)) {
                debug!("Shell server shutting down");
                return Ok(());
            }
            if !self.accept_one().await? {
                return Ok(());
            }
        }
    }

    /// Accept and serve one connection
    ///
    /// Returns true if the server should continue, false if it should shut down
    pub async fn accept_one(&mut self) -> Result<bool> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| OrbitError::ipc("Server not started"))?;

        // Accept with timeout to allow checking for shutdown
        let stream = match tokio::time::timeout(ACCEPT_TIMEOUT, listener.accept()).await {
            Ok(Ok((stream, _addr))) => stream,
            Ok(Err(e)) => {
                error!("Failed to accept connection: {}", e);
                return Ok(true);
            }
            Err(_) => return Ok(true),
        };

        info!("Shell connected");
        Ok(self.serve(stream).await)
    }

    /// Serve one shell until it disconnects or shutdown is signalled
    async fn serve(&mut self, stream: UnixStream) -> bool {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        let mut shutdown = self.shutdown_tx.subscribe();

        // Commands queued while no shell was connected are stale
        let mut stale = 0;
        while self.commands.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!("Discarded {} stale shell commands", stale);
        }
        self.link.set_connected(true);
        let mut greeted = false;

        let keep_running = loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => break false,

                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match ShellEvent::from_bytes(trimmed.as_bytes()) {
                            Ok(event) => {
                                greeted |= matches!(event, ShellEvent::Hello { .. });
                                if !self.route(event).await {
                                    break false;
                                }
                            }
                            Err(e) => warn!("Invalid shell message: {}", e),
                        }
                    }
                    Ok(None) => {
                        info!("Shell disconnected");
                        break true;
                    }
                    Err(e) => {
                        error!("Error reading from shell: {}", e);
                        break true;
                    }
                },

                Some(command) = self.commands.recv() => {
                    if let Err(e) = writer.write_all(&command.to_bytes()).await {
                        error!("Failed to send shell command: {}", e);
                        break true;
                    }
                }
            }
        };

        self.link.set_connected(false);
        // Connections that never said hello own no surfaces
        if keep_running
            && greeted
            && self
                .controller
                .send(ControllerEvent::ShellDisconnected)
                .await
                .is_err()
        {
            return false;
        }
        keep_running
    }

    /// Route one shell event; false once the controller is gone
    async fn route(&self, event: ShellEvent) -> bool {
        let forwarded = match event {
            ShellEvent::Hello { tray } => {
                debug!("Shell hello (tray: {})", tray);
                self.controller.send(ControllerEvent::ShellConnected { tray }).await
            }
            ShellEvent::Intent { intent } => self.controller.send(intent).await,
            ShellEvent::Capture { event } => self.controller.send(event).await,
            ShellEvent::Surface { event } => self.controller.send(event).await,
            ShellEvent::Reply { id, reply } => {
                self.link.resolve(id, reply);
                Ok(())
            }
        };

        match forwarded {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Clean up the socket file
    pub fn cleanup(&self) {
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            } else {
                debug!("Removed socket file {:?}", self.socket_path);
            }
        }
    }
}

impl Drop for ShellServer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

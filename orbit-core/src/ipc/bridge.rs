//! Orchestrator side of the shell connection
//!
//! [`ShellLink`] turns collaborator calls into [`ShellCommand`]s and
//! correlates requests with the shell's replies. It implements the
//! directory, bounds and permission collaborators; [`IpcSurfaceBackend`]
//! implements the surface backend on top of it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use super::protocol::{ShellCommand, ShellReply, ShellRequest};
use crate::directory::DirectoryProvider;
use crate::error::{OrbitError, Result};
use crate::platform::{BoundsResolver, PermissionGate, ScreenAccess};
use crate::surface::{Surface, SurfaceBackend, SurfaceMessage, SurfaceRole, SurfaceSpec};
use crate::types::{CaptureSource, DisplayInfo, MediaDeviceDescriptor, Rect, SourceId};

/// Command queue and pending requests shared with the server
pub struct ShellLink {
    commands: mpsc::UnboundedSender<ShellCommand>,
    pending: Mutex<HashMap<u64, oneshot::Sender<ShellReply>>>,
    next_id: AtomicU64,
    connected: AtomicBool,
    timeout: Duration,
}

impl ShellLink {
    /// Create a link; the receiver goes to the server that writes to the shell
    pub fn new(timeout: Duration) -> (Arc<Self>, mpsc::UnboundedReceiver<ShellCommand>) {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let link = Arc::new(Self {
            commands,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            connected: AtomicBool::new(false),
            timeout,
        });
        (link, commands_rx)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Mark the shell connected or gone; going away fails every pending request
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
        if !connected {
            let dropped = {
                let mut pending = self.pending.lock();
                let n = pending.len();
                pending.clear();
                n
            };
            if dropped > 0 {
                debug!("Dropped {} pending shell requests", dropped);
            }
        }
    }

    /// Queue a command for the shell
    pub fn send(&self, command: ShellCommand) -> Result<()> {
        if !self.is_connected() {
            return Err(OrbitError::ipc("No shell connected"));
        }
        self.commands
            .send(command)
            .map_err(|_| OrbitError::ipc("Shell server has stopped"))
    }

    /// Send a request and wait for the matching reply
    pub async fn request(&self, request: ShellRequest) -> Result<ShellReply> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        trace!("Shell request {}: {:?}", id, request);
        if let Err(e) = self.send(ShellCommand::Request { id, request }) {
            self.pending.lock().remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(ShellReply::Error { message })) => Err(OrbitError::ipc(message)),
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(OrbitError::ipc("Shell disconnected before replying")),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(OrbitError::ipc(format!(
                    "Shell did not reply within {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Hand a reply to its waiting request.
    /// Returns false for unknown or already timed-out ids.
    pub fn resolve(&self, id: u64, reply: ShellReply) -> bool {
        let Some(tx) = self.pending.lock().remove(&id) else {
            debug!("Reply {} has no waiting request", id);
            return false;
        };
        tx.send(reply).is_ok()
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.lock().len()
    }
}

fn unexpected(reply: ShellReply) -> OrbitError {
    OrbitError::ipc(format!("Unexpected reply: {:?}", reply))
}

#[async_trait]
impl DirectoryProvider for ShellLink {
    async fn list_capture_sources(&self) -> Result<Vec<CaptureSource>> {
        match self.request(ShellRequest::ListSources).await? {
            ShellReply::Sources { sources } => Ok(sources),
            other => Err(unexpected(other)),
        }
    }

    async fn list_media_devices(&self) -> Result<Vec<MediaDeviceDescriptor>> {
        match self.request(ShellRequest::ListDevices).await? {
            ShellReply::Devices { devices } => Ok(devices),
            other => Err(unexpected(other)),
        }
    }
}

#[async_trait]
impl BoundsResolver for ShellLink {
    async fn window_bounds(&self, id: &SourceId) -> Option<Rect> {
        let request = ShellRequest::WindowBounds { id: id.clone() };
        match self.request(request).await {
            Ok(ShellReply::Bounds { bounds }) => bounds,
            Ok(other) => {
                warn!("Window bounds for {}: {}", id, unexpected(other));
                None
            }
            Err(e) => {
                warn!("Window bounds for {} unavailable: {}", id, e);
                None
            }
        }
    }

    async fn displays(&self) -> Vec<DisplayInfo> {
        match self.request(ShellRequest::Displays).await {
            Ok(ShellReply::Displays { displays }) => displays,
            Ok(other) => {
                warn!("Display layout: {}", unexpected(other));
                Vec::new()
            }
            Err(e) => {
                warn!("Display layout unavailable: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PermissionGate for ShellLink {
    async fn screen_access_status(&self) -> ScreenAccess {
        match self.request(ShellRequest::ScreenAccess).await {
            Ok(ShellReply::Access { access }) => access,
            Ok(other) => {
                warn!("Screen access status: {}", unexpected(other));
                ScreenAccess::NotDetermined
            }
            Err(e) => {
                warn!("Screen access status unavailable: {}", e);
                ScreenAccess::NotDetermined
            }
        }
    }

    async fn request_screen_access(&self) -> bool {
        match self.request(ShellRequest::RequestScreenAccess).await {
            Ok(ShellReply::Granted { granted }) => granted,
            Ok(other) => {
                warn!("Screen access request: {}", unexpected(other));
                false
            }
            Err(e) => {
                warn!("Screen access request failed: {}", e);
                false
            }
        }
    }
}

/// Surface backend rendered by the shell
pub struct IpcSurfaceBackend {
    link: Arc<ShellLink>,
}

impl IpcSurfaceBackend {
    pub fn new(link: Arc<ShellLink>) -> Self {
        Self { link }
    }
}

impl SurfaceBackend for IpcSurfaceBackend {
    fn create(&mut self, role: SurfaceRole, spec: &SurfaceSpec) -> Result<Box<dyn Surface>> {
        self.link
            .send(ShellCommand::Create { role, spec: *spec })
            .map_err(|e| OrbitError::surface(format!("{}: {}", role, e)))?;
        Ok(Box::new(IpcSurface {
            role,
            link: Arc::clone(&self.link),
            destroyed: false,
        }))
    }

    fn install_tray(&mut self) -> Result<()> {
        self.link.send(ShellCommand::InstallTray)
    }

    fn remove_tray(&mut self) -> Result<()> {
        self.link.send(ShellCommand::RemoveTray)
    }
}

/// One shell-side surface
struct IpcSurface {
    role: SurfaceRole,
    link: Arc<ShellLink>,
    destroyed: bool,
}

impl IpcSurface {
    fn command(&self, command: ShellCommand) -> Result<()> {
        if self.destroyed {
            return Err(OrbitError::surface(format!("{} surface was destroyed", self.role)));
        }
        self.link.send(command)
    }
}

impl Surface for IpcSurface {
    fn role(&self) -> SurfaceRole {
        self.role
    }

    fn show(&mut self) -> Result<()> {
        self.command(ShellCommand::Show { role: self.role })
    }

    fn hide(&mut self) -> Result<()> {
        self.command(ShellCommand::Hide { role: self.role })
    }

    fn set_bounds(&mut self, bounds: Rect) -> Result<()> {
        self.command(ShellCommand::SetBounds {
            role: self.role,
            bounds,
        })
    }

    fn send(&mut self, message: &SurfaceMessage) -> Result<()> {
        self.command(ShellCommand::Deliver {
            role: self.role,
            message: message.clone(),
        })
    }

    fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        // The shell may already be gone; the surface is dead either way
        let _ = self.link.send(ShellCommand::Destroy { role: self.role });
        Ok(())
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

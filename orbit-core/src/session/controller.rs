//! Session controller
//!
//! Single owner of the recording session and every surface. Runs as one
//! tokio task fed by a channel; timers post events back into the same
//! channel instead of blocking.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use super::events::{AppSignal, CaptureEvent, ControlIntent, ControllerEvent, SurfaceEvent};
use super::state::{ControlsView, RecordingSession, RecordingState};
use crate::config::RecorderConfig;
use crate::directory::{DirectoryProvider, SourceDirectory};
use crate::error::{OrbitError, Result};
use crate::geometry::corner_inset;
use crate::platform::{
    desktop_bounds, ensure_screen_access, primary_display, resolve_target_bounds, BoundsResolver,
    PermissionGate, DEFAULT_DESKTOP_SIZE, RELAUNCH_HINT,
};
use crate::surface::{
    Placement, RecordingRequest, SurfaceBackend, SurfaceMessage, SurfaceRegistry, SurfaceRole,
};
use crate::types::{DisplayInfo, Handle, MediaDeviceKind, Rect, SourceId};

/// Controller event queue depth
const EVENT_CAPACITY: usize = 256;

/// External collaborators the controller drives
pub struct Collaborators {
    pub surfaces: Box<dyn SurfaceBackend>,
    pub directory: Arc<dyn DirectoryProvider>,
    pub bounds: Arc<dyn BoundsResolver>,
    pub permission: Arc<dyn PermissionGate>,
}

/// Cloneable sender into the controller task
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerEvent>,
}

impl ControllerHandle {
    /// Queue an event for the controller
    pub async fn send(&self, event: impl Into<ControllerEvent>) -> Result<()> {
        self.tx
            .send(event.into())
            .await
            .map_err(|_| OrbitError::ipc("Session controller has stopped"))
    }

    /// Ask the controller to tear everything down and exit
    pub async fn shutdown(&self) -> Result<()> {
        self.send(ControllerEvent::Shutdown).await
    }
}

/// Orchestration core
pub struct SessionController {
    session: RecordingSession,
    registry: SurfaceRegistry,
    directory: SourceDirectory,
    bounds: Arc<dyn BoundsResolver>,
    permission: Arc<dyn PermissionGate>,
    config: RecorderConfig,
    /// Display layout as of the last lookup
    displays: Vec<DisplayInfo>,
    /// A pause or resume was forwarded and not yet acknowledged
    pause_in_flight: bool,
    follow_tick_scheduled: bool,
    events_tx: mpsc::Sender<ControllerEvent>,
    events_rx: mpsc::Receiver<ControllerEvent>,
    view_tx: watch::Sender<ControlsView>,
    signals: mpsc::UnboundedSender<AppSignal>,
}

impl SessionController {
    /// Create a controller and the receiver for its host signals
    pub fn new(
        collaborators: Collaborators,
        config: RecorderConfig,
    ) -> (Self, mpsc::UnboundedReceiver<AppSignal>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let (signals, signals_rx) = mpsc::unbounded_channel();
        let session = RecordingSession::new();
        let (view_tx, _) = watch::channel(session.view());

        let registry = SurfaceRegistry::new(collaborators.surfaces)
            .with_follow(config.follow_gap, config.follow_interval);

        let controller = Self {
            session,
            registry,
            directory: SourceDirectory::new(collaborators.directory),
            bounds: collaborators.bounds,
            permission: collaborators.permission,
            config,
            displays: Vec::new(),
            pause_in_flight: false,
            follow_tick_scheduled: false,
            events_tx,
            events_rx,
            view_tx,
            signals,
        };

        (controller, signals_rx)
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.events_tx.clone(),
        }
    }

    /// Watch every broadcast view
    pub fn subscribe(&self) -> watch::Receiver<ControlsView> {
        self.view_tx.subscribe()
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn state(&self) -> RecordingState {
        self.session.state
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    /// Process events until shutdown
    pub async fn run(mut self) {
        info!("Session controller running");
        while self.step().await {}
        info!("Session controller stopped");
    }

    /// Receive and handle one event. Returns false once shut down.
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(ControllerEvent::Shutdown) | None => {
                self.teardown();
                false
            }
            Some(event) => {
                self.handle_event(event).await;
                true
            }
        }
    }

    /// React to one event
    pub async fn handle_event(&mut self, event: ControllerEvent) {
        trace!("Controller event: {:?}", event);
        match event {
            ControllerEvent::Intent(intent) => {
                if let Err(e) = self.handle_intent(intent).await {
                    debug!("Intent failed: {}", e);
                }
            }
            ControllerEvent::Capture(event) => self.handle_capture(event),
            ControllerEvent::Surface(event) => self.handle_surface(event).await,
            ControllerEvent::CameraGraceElapsed(handle) => {
                if self.session.handle == handle && self.session.state == RecordingState::Starting {
                    info!("Camera did not confirm in time, recording anyway");
                }
                self.begin_recording(handle);
            }
            ControllerEvent::FollowTick => {
                self.follow_tick_scheduled = false;
                let now = tokio::time::Instant::now().into_std();
                if let Some(wait) = self.registry.flush_follow(now) {
                    self.schedule_follow_tick(wait);
                }
            }
            ControllerEvent::ShellConnected { tray } => self.bootstrap(tray).await,
            ControllerEvent::ShellDisconnected => self.shell_disconnected(),
            ControllerEvent::Shutdown => self.teardown(),
        }
    }

    async fn handle_intent(&mut self, intent: ControlIntent) -> Result<()> {
        debug!("Intent: {:?}", intent);
        match intent {
            ControlIntent::SelectSource { source_id } => self.select_source(source_id).await,
            ControlIntent::SelectCamera { device_id } => {
                self.select_device(MediaDeviceKind::Camera, device_id);
                Ok(())
            }
            ControlIntent::SelectMic { device_id } => {
                self.select_device(MediaDeviceKind::Microphone, device_id);
                Ok(())
            }
            ControlIntent::Start => {
                self.request_start();
                Ok(())
            }
            ControlIntent::PauseResume => {
                self.request_pause_resume();
                Ok(())
            }
            ControlIntent::Stop => {
                self.request_stop();
                Ok(())
            }
            ControlIntent::ShowPicker => self.show_picker().await,
            ControlIntent::HidePicker => {
                self.registry.hide(SurfaceRole::Picker);
                Ok(())
            }
            ControlIntent::RefreshDirectory => {
                self.refresh_directory().await;
                Ok(())
            }
            ControlIntent::ShowControls => {
                self.show_controls();
                Ok(())
            }
            ControlIntent::Relaunch => {
                info!("Relaunch requested");
                self.signal(AppSignal::Relaunch);
                Ok(())
            }
            ControlIntent::Quit => {
                self.quit();
                Ok(())
            }
        }
    }

    /// Select the window or screen to record
    pub async fn select_source(&mut self, id: SourceId) -> Result<()> {
        if self.session.state.is_active() {
            debug!("Ignoring source selection while {}", self.session.state);
            return Ok(());
        }

        let snapshot = self.directory.refresh().await;
        self.reset_if_terminal();

        let Some(source) = snapshot.find_source(&id).cloned() else {
            let err = OrbitError::source_not_found(id.to_string());
            warn!("Selected source {} is no longer available", id);
            self.report_error(&err);
            return Err(err);
        };

        let target = resolve_target_bounds(self.bounds.as_ref(), &id).await;
        info!("Selected source {} ({}) at {}", source.display_name, id, target);

        self.session.target_source_id = Some(id.clone());
        self.session.target_source_name = Some(source.display_name.clone());
        self.session.target_bounds = Some(target);
        self.session.failure = None;

        self.show_outline(target).await;
        self.place_camera(target);
        if self.registry.is_visible(SurfaceRole::Control) {
            self.registry.show(SurfaceRole::Camera);
        }
        self.registry.hide(SurfaceRole::Picker);
        self.registry.send(
            SurfaceRole::Control,
            SurfaceMessage::SourceSelected {
                id,
                name: source.display_name,
            },
        );
        self.broadcast();
        Ok(())
    }

    /// Select the camera or microphone
    pub fn select_device(&mut self, kind: MediaDeviceKind, device_id: String) {
        if self.session.state.is_active() {
            debug!("Ignoring {} selection while {}", kind, self.session.state);
            return;
        }

        let reset = self.reset_if_terminal();
        let slot = match kind {
            MediaDeviceKind::Camera => &mut self.session.camera_device_id,
            MediaDeviceKind::Microphone => &mut self.session.mic_device_id,
        };

        if slot.as_deref() == Some(device_id.as_str()) {
            if reset {
                self.broadcast();
            }
            return;
        }

        debug!("Selected {} {}", kind, device_id);
        *slot = Some(device_id.clone());

        if kind == MediaDeviceKind::Camera && self.registry.is_visible(SurfaceRole::Camera) {
            self.registry.send(
                SurfaceRole::Camera,
                SurfaceMessage::StartPreview {
                    camera_id: Some(device_id),
                },
            );
        }
        self.broadcast();
    }

    /// Begin a recording with the selected source, camera and mic
    pub fn request_start(&mut self) {
        if self.session.state != RecordingState::Idle || !self.session.is_ready() {
            debug!(
                "Start rejected: state {}, ready {}",
                self.session.state,
                self.session.is_ready()
            );
            return;
        }
        let (Some(camera_id), Some(target)) = (
            self.session.camera_device_id.clone(),
            self.session.target_bounds,
        ) else {
            return;
        };

        if let Err(e) = self.registry.ensure_visible(SurfaceRole::Camera) {
            error!("Camera surface unavailable: {}", e);
            self.report_error(&OrbitError::surface(format!("camera surface: {}", e)));
            return;
        }

        self.transition(RecordingState::Starting);
        self.place_camera(target);
        if !self.registry.is_visible(SurfaceRole::Outline) {
            // The outline only degrades; it never blocks a start
            self.show_outline_at(desktop_bounds(&self.displays), target);
        }

        let handle = self.session.handle;
        self.registry.send(
            SurfaceRole::Camera,
            SurfaceMessage::StartCamera {
                session: handle,
                camera_id,
            },
        );
        self.schedule(
            self.config.camera_grace,
            ControllerEvent::CameraGraceElapsed(handle),
        );
        self.broadcast();
    }

    /// Toggle pause; ignored while the previous toggle is unacknowledged
    pub fn request_pause_resume(&mut self) {
        if self.pause_in_flight {
            debug!("Pause/resume already in flight, ignoring");
            return;
        }

        let session = self.session.handle;
        let (next, message) = match self.session.state {
            RecordingState::Recording => {
                (RecordingState::Paused, SurfaceMessage::PauseRecording { session })
            }
            RecordingState::Paused => {
                (RecordingState::Recording, SurfaceMessage::ResumeRecording { session })
            }
            state => {
                debug!("Pause/resume rejected while {}", state);
                return;
            }
        };

        self.transition(next);
        self.pause_in_flight = self.registry.send(SurfaceRole::Camera, message);
        self.broadcast();
    }

    /// Stop an active recording; the capture surface finalizes and saves
    pub fn request_stop(&mut self) {
        if !self.session.state.is_active() {
            debug!("Stop rejected while {}", self.session.state);
            return;
        }

        self.registry.send(
            SurfaceRole::Camera,
            SurfaceMessage::StopRecording {
                session: self.session.handle,
            },
        );
        self.registry.hide(SurfaceRole::Outline);
        self.registry.hide(SurfaceRole::Camera);
        self.transition(RecordingState::Stopped);
        self.pause_in_flight = false;
        self.broadcast();
    }

    /// Fail the session with a user-visible message.
    ///
    /// An active capture is stopped so whatever was encoded still gets saved.
    pub fn report_error(&mut self, err: &OrbitError) {
        warn!("Session {} failed: {}", self.session.handle, err);
        self.fail_with(err.user_message());
    }

    fn fail_with(&mut self, message: String) {
        if self.session.state.is_active() {
            self.registry.send(
                SurfaceRole::Camera,
                SurfaceMessage::StopRecording {
                    session: self.session.handle,
                },
            );
        }
        self.registry.hide(SurfaceRole::Outline);
        self.registry.hide(SurfaceRole::Camera);

        self.session.fail(message);
        self.pause_in_flight = false;
        self.broadcast();
    }

    /// Close the control panel: stop and clean up first, hide it last
    pub fn close_control_surface(&mut self) {
        info!("Control surface closing");
        self.release_controls();
        self.registry.hide(SurfaceRole::Control);
    }

    /// Everything that hangs off the control panel goes with it
    fn release_controls(&mut self) {
        if self.session.state.is_active() {
            self.request_stop();
        }
        self.registry
            .send(SurfaceRole::Camera, SurfaceMessage::ControlsClosing);
        self.registry.destroy(SurfaceRole::Picker);
        self.registry.hide(SurfaceRole::Camera);
    }

    /// Open the picker next to the control panel
    pub async fn show_picker(&mut self) -> Result<()> {
        if self.session.state.is_active() {
            debug!("Picker unavailable while {}", self.session.state);
            return Ok(());
        }

        if let Err(err) = ensure_screen_access(self.permission.as_ref()).await {
            self.registry.send(
                SurfaceRole::Control,
                SurfaceMessage::PermissionRequired {
                    message: "Screen recording permission is required.".to_string(),
                    detail: RELAUNCH_HINT.to_string(),
                },
            );
            self.report_error(&err);
            return Err(err);
        }

        let snapshot = self.directory.refresh().await;

        self.registry
            .ensure_created(SurfaceRole::Picker)
            .map_err(|e| e.with_context("Opening source picker"))
            .inspect_err(|e| warn!("{}", e))?;

        if let Some(anchor) = self.registry.bounds(SurfaceRole::Control) {
            self.registry.position_relative_to(
                SurfaceRole::Picker,
                anchor,
                Placement::FollowRight {
                    gap: self.config.follow_gap,
                },
            );
        }
        self.registry.show(SurfaceRole::Picker);
        self.registry.send(
            SurfaceRole::Picker,
            SurfaceMessage::Sources {
                sources: snapshot.sources().to_vec(),
            },
        );
        Ok(())
    }

    /// Re-enumerate devices, defaulting to the first camera and microphone
    pub async fn refresh_directory(&mut self) {
        let snapshot = self.directory.refresh().await;
        let mut changed = false;

        if !self.session.state.is_active() {
            if self.session.camera_device_id.is_none() {
                if let Some(camera) = snapshot.default_device(MediaDeviceKind::Camera) {
                    self.session.camera_device_id = Some(camera.device_id.clone());
                    changed = true;
                }
            }
            if self.session.mic_device_id.is_none() {
                if let Some(mic) = snapshot.default_device(MediaDeviceKind::Microphone) {
                    self.session.mic_device_id = Some(mic.device_id.clone());
                    changed = true;
                }
            }
        }

        self.registry.send(
            SurfaceRole::Control,
            SurfaceMessage::DevicesChanged {
                cameras: snapshot.cameras(),
                microphones: snapshot.microphones(),
            },
        );
        if changed {
            self.broadcast();
        }
    }

    /// Show the control panel and the camera preview
    pub fn show_controls(&mut self) {
        if let Err(e) = self.registry.ensure_visible(SurfaceRole::Control) {
            error!("Cannot show control surface: {}", e);
            return;
        }

        let fresh_camera = !self.registry.exists(SurfaceRole::Camera);
        match self.registry.ensure_created(SurfaceRole::Camera) {
            Ok(()) => {
                if fresh_camera {
                    let home = self.camera_home();
                    self.registry.position(SurfaceRole::Camera, home);
                }
                self.registry.show(SurfaceRole::Camera);
                if !self.session.state.is_active() {
                    self.registry.send(
                        SurfaceRole::Camera,
                        SurfaceMessage::StartPreview {
                            camera_id: self.session.camera_device_id.clone(),
                        },
                    );
                }
            }
            Err(e) => warn!("Camera preview unavailable: {}", e),
        }
        self.broadcast();
    }

    /// Tray icon clicked: toggle the control panel
    pub fn tray_clicked(&mut self) {
        if self.registry.is_visible(SurfaceRole::Control) {
            debug!("Tray toggle: hiding controls");
            self.registry.hide(SurfaceRole::Control);
            if !self.session.state.is_active() {
                self.registry.hide(SurfaceRole::Camera);
            }
        } else {
            debug!("Tray toggle: showing controls");
            self.show_controls();
        }
    }

    /// Stop everything and ask the host to exit
    pub fn quit(&mut self) {
        info!("Quit requested");
        self.teardown();
        self.signal(AppSignal::Quit);
    }

    fn handle_capture(&mut self, event: CaptureEvent) {
        if let Some(handle) = event.session() {
            if handle != self.session.handle {
                debug!("Ignoring stale {:?} for {}", event, handle);
                return;
            }
        }

        match event {
            CaptureEvent::PreviewStarted => debug!("Camera preview running"),
            CaptureEvent::CameraReady { session } => {
                debug!("Camera ready for {}", session);
                self.begin_recording(session);
            }
            CaptureEvent::CameraFailed { reason, .. } => {
                if self.session.state == RecordingState::Starting {
                    self.report_error(&OrbitError::device(reason));
                } else {
                    warn!("Camera failed outside of start: {}", reason);
                }
            }
            CaptureEvent::RecordingStarted { session } => info!("Capture running for {}", session),
            CaptureEvent::Paused { .. } | CaptureEvent::Resumed { .. } => {
                self.pause_in_flight = false;
            }
            CaptureEvent::Saved { path, .. } => {
                info!("Recording saved to {:?}", path);
                self.session.saved_path = Some(path);
                self.broadcast();
            }
            CaptureEvent::SaveCancelled { .. } => info!("Save cancelled by user"),
            CaptureEvent::Failed {
                session,
                kind,
                reason,
                saved,
            } => {
                let mut message = kind.into_error(reason).user_message();
                match &saved {
                    Some(path) => message
                        .push_str(&format!(" Partial recording saved to {}.", path.display())),
                    None if self.session.started_at.is_some() => {
                        message.push_str(" The recording was lost.")
                    }
                    None => {}
                }

                if session.is_none() && !self.session.state.is_active() {
                    // Preview trouble outside a session only needs surfacing
                    warn!("Capture surface: {}", message);
                    self.session.failure = Some(message);
                    self.broadcast();
                    return;
                }

                self.session.saved_path = saved;
                self.fail_with(message);
            }
        }
    }

    async fn handle_surface(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Moved { role, bounds } => {
                let now = tokio::time::Instant::now().into_std();
                if let Some(wait) = self.registry.surface_moved(role, bounds, now) {
                    self.schedule_follow_tick(wait);
                }
                if role == SurfaceRole::Camera {
                    self.camera_moved(bounds);
                }
            }
            SurfaceEvent::CloseRequested { role } => match role {
                SurfaceRole::Control => self.close_control_surface(),
                other => self.registry.hide(other),
            },
            SurfaceEvent::Closed { role } => {
                if self.registry.forget(role) {
                    debug!("{} surface closed by the platform", role);
                }
                match role {
                    SurfaceRole::Control => {
                        info!("Control surface gone, winding down");
                        self.release_controls();
                    }
                    SurfaceRole::Camera if self.session.state.is_active() => {
                        self.report_error(&OrbitError::surface("camera surface closed"));
                    }
                    _ => {}
                }
            }
            SurfaceEvent::CreateFailed { role, reason } => {
                self.registry.forget(role);
                match role {
                    SurfaceRole::Camera if self.session.state.is_active() => {
                        self.report_error(&OrbitError::surface(reason));
                    }
                    SurfaceRole::Control => {
                        error!("Control surface could not be created: {}", reason);
                    }
                    other => warn!("{} surface unavailable, continuing without it: {}", other, reason),
                }
            }
            SurfaceEvent::TrayClicked => self.tray_clicked(),
        }
    }

    /// Recording begins once the camera confirmed or the grace period passed
    fn begin_recording(&mut self, handle: Handle) {
        if handle != self.session.handle || self.session.state != RecordingState::Starting {
            return;
        }
        let (Some(source), Some(camera_id), Some(mic_id), Some(target)) = (
            self.session.target_source_id.clone(),
            self.session.camera_device_id.clone(),
            self.session.mic_device_id.clone(),
            self.session.target_bounds,
        ) else {
            return;
        };

        let camera = self
            .registry
            .bounds(SurfaceRole::Camera)
            .unwrap_or_else(|| corner_inset(target, self.config.camera_size, self.config.camera_margin));

        self.transition(RecordingState::Recording);
        self.registry.send(
            SurfaceRole::Camera,
            SurfaceMessage::StartRecording(RecordingRequest {
                session: handle,
                source,
                camera_id,
                mic_id,
                overlay: camera.relative_to(target),
                target_size: target.size(),
            }),
        );
        self.broadcast();
    }

    fn camera_moved(&mut self, bounds: Rect) {
        if !matches!(
            self.session.state,
            RecordingState::Recording | RecordingState::Paused
        ) {
            return;
        }
        if let Some(target) = self.session.target_bounds {
            self.registry.send(
                SurfaceRole::Camera,
                SurfaceMessage::OverlayMoved {
                    session: self.session.handle,
                    overlay: bounds.relative_to(target),
                },
            );
        }
    }

    async fn bootstrap(&mut self, tray: bool) {
        info!("Shell connected (tray available: {})", tray);
        self.displays = self.bounds.displays().await;
        if tray {
            if let Err(e) = self.registry.install_tray() {
                warn!("Failed to create tray: {}, showing controls directly", e);
                self.show_controls();
            }
        } else {
            self.show_controls();
        }
        self.refresh_directory().await;
    }

    fn shell_disconnected(&mut self) {
        warn!("Shell disconnected, all surfaces lost");
        self.registry.forget_all();
        self.follow_tick_scheduled = false;
        if self.session.state.is_active() {
            self.session
                .fail(OrbitError::ipc("shell disconnected during recording").user_message());
            self.pause_in_flight = false;
            self.broadcast();
        }
    }

    fn teardown(&mut self) {
        if self.session.state.is_active() {
            self.request_stop();
        }
        self.registry
            .send(SurfaceRole::Camera, SurfaceMessage::ControlsClosing);
        self.registry.destroy_all();
        self.registry.remove_tray();
    }

    /// A terminal session is replaced by a fresh record with default devices
    fn reset_if_terminal(&mut self) -> bool {
        if !self.session.state.is_terminal() {
            return false;
        }
        let snapshot = self.directory.snapshot();
        let mut fresh = RecordingSession::new();
        fresh.camera_device_id = snapshot
            .default_device(MediaDeviceKind::Camera)
            .map(|d| d.device_id.clone());
        fresh.mic_device_id = snapshot
            .default_device(MediaDeviceKind::Microphone)
            .map(|d| d.device_id.clone());

        info!(
            "Session {} ended as {}, starting {}",
            self.session.handle, self.session.state, fresh.handle
        );
        self.session = fresh;
        self.pause_in_flight = false;
        true
    }

    async fn show_outline(&mut self, target: Rect) {
        self.displays = self.bounds.displays().await;
        self.show_outline_at(desktop_bounds(&self.displays), target);
    }

    fn show_outline_at(&mut self, desktop: Rect, target: Rect) {
        if let Err(e) = self.registry.ensure_visible(SurfaceRole::Outline) {
            warn!("Recording outline unavailable: {}", e);
            return;
        }
        self.registry.position(SurfaceRole::Outline, desktop);
        self.registry.send(
            SurfaceRole::Outline,
            SurfaceMessage::Outline {
                area: target.relative_to(desktop),
            },
        );
    }

    fn place_camera(&mut self, target: Rect) {
        let size = self
            .registry
            .bounds(SurfaceRole::Camera)
            .map(|b| b.width)
            .filter(|w| *w > 0)
            .unwrap_or(self.config.camera_size);
        self.registry.position_relative_to(
            SurfaceRole::Camera,
            target,
            Placement::CornerInset {
                size,
                margin: self.config.camera_margin,
            },
        );
    }

    /// Resting place of the camera bubble before any source is chosen
    fn camera_home(&self) -> Rect {
        let container = self.session.target_bounds.unwrap_or_else(|| {
            primary_display(&self.displays)
                .map(|d| d.bounds)
                .unwrap_or(Rect::at(0, 0, DEFAULT_DESKTOP_SIZE))
        });
        corner_inset(container, self.config.camera_size, self.config.camera_margin)
    }

    fn transition(&mut self, next: RecordingState) -> bool {
        let from = self.session.state;
        if self.session.transition(next) {
            info!("{}: {} → {}", self.session.handle, from, next);
            true
        } else {
            debug!("{}: invalid transition {} → {}", self.session.handle, from, next);
            false
        }
    }

    fn broadcast(&mut self) {
        let view = self.session.view();
        self.registry
            .send(SurfaceRole::Control, SurfaceMessage::ControlsState(view.clone()));
        self.view_tx.send_replace(view);
    }

    fn schedule(&self, delay: Duration, event: ControllerEvent) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event).await;
        });
    }

    fn schedule_follow_tick(&mut self, wait: Duration) {
        if self.follow_tick_scheduled {
            return;
        }
        self.follow_tick_scheduled = true;
        self.schedule(wait, ControllerEvent::FollowTick);
    }

    fn signal(&self, signal: AppSignal) {
        if self.signals.send(signal).is_err() {
            warn!("Host is not listening for {:?}", signal);
        }
    }
}

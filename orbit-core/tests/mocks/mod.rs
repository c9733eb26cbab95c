//! Mock infrastructure for testing
//!
//! Fake collaborators for the controller (surfaces, directory, bounds,
//! permission) and for the capture agent (media devices, encoder, saver).
//! Every fake records what it was asked to do.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use orbit_core::capture::{AudioFeed, MediaDevices, VideoFeed};
use orbit_core::config::RecorderConfig;
use orbit_core::directory::DirectoryProvider;
use orbit_core::encode::{Encoder, EncoderFactory, EncoderSettings};
use orbit_core::error::{OrbitError, Result};
use orbit_core::platform::{BoundsResolver, PermissionGate, SaveTarget, ScreenAccess};
use orbit_core::session::{
    AppSignal, Collaborators, ControlIntent, ControllerEvent, SessionController,
};
use orbit_core::surface::{Surface, SurfaceBackend, SurfaceMessage, SurfaceRole, SurfaceSpec};
use orbit_core::types::{
    AudioChunk, CaptureSource, DisplayInfo, MediaDeviceDescriptor, Rect, SourceId, VideoFrame,
};

pub const BLUE: [u8; 4] = [255, 0, 0, 255];
pub const RED: [u8; 4] = [0, 0, 255, 255];

pub const WINDOW_ID: &str = "window:1";
pub const WINDOW_BOUNDS: Rect = Rect::new(100, 100, 800, 600);
pub const SCREEN_ID: &str = "screen:0";
pub const CAMERA_ID: &str = "cam-1";
pub const MIC_ID: &str = "mic-1";

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

/// One call made on the surface backend
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Create(SurfaceRole),
    Show(SurfaceRole),
    Hide(SurfaceRole),
    SetBounds(SurfaceRole, Rect),
    Send(SurfaceRole, SurfaceMessage),
    Destroy(SurfaceRole),
    InstallTray,
    RemoveTray,
}

#[derive(Default)]
struct LogInner {
    calls: Vec<SurfaceCall>,
    visible: HashMap<SurfaceRole, bool>,
    fail_create: HashSet<SurfaceRole>,
    fail_tray: bool,
}

/// Shared view of everything the controller did to its surfaces
#[derive(Clone, Default)]
pub struct SurfaceLog {
    inner: Arc<Mutex<LogInner>>,
}

impl SurfaceLog {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn is_visible(&self, role: SurfaceRole) -> bool {
        self.inner.lock().visible.get(&role).copied().unwrap_or(false)
    }

    /// Messages delivered to `role`, oldest first
    pub fn messages_to(&self, role: SurfaceRole) -> Vec<SurfaceMessage> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Send(r, msg) if *r == role => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count_messages(&self, role: SurfaceRole, name: &str) -> usize {
        self.messages_to(role)
            .iter()
            .filter(|msg| msg.name() == name)
            .count()
    }

    /// Last bounds applied to `role`
    pub fn bounds_of(&self, role: SurfaceRole) -> Option<Rect> {
        self.inner.lock().calls.iter().rev().find_map(|call| match call {
            SurfaceCall::SetBounds(r, bounds) if *r == role => Some(*bounds),
            _ => None,
        })
    }

    pub fn set_bounds_count(&self, role: SurfaceRole) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, SurfaceCall::SetBounds(r, _) if *r == role))
            .count()
    }

    /// Position of the first call matching `pred`
    pub fn position(&self, pred: impl Fn(&SurfaceCall) -> bool) -> Option<usize> {
        self.inner.lock().calls.iter().position(pred)
    }

    pub fn fail_create(&self, role: SurfaceRole) {
        self.inner.lock().fail_create.insert(role);
    }

    pub fn fail_tray(&self) {
        self.inner.lock().fail_tray = true;
    }

    fn record(&self, call: SurfaceCall) {
        let mut inner = self.inner.lock();
        match &call {
            SurfaceCall::Show(role) => {
                inner.visible.insert(*role, true);
            }
            SurfaceCall::Hide(role) | SurfaceCall::Destroy(role) => {
                inner.visible.insert(*role, false);
            }
            _ => {}
        }
        inner.calls.push(call);
    }
}

/// Surface backend that records every call
pub struct RecordingBackend {
    log: SurfaceLog,
}

impl RecordingBackend {
    pub fn new() -> (Self, SurfaceLog) {
        let log = SurfaceLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl SurfaceBackend for RecordingBackend {
    fn create(&mut self, role: SurfaceRole, _spec: &SurfaceSpec) -> Result<Box<dyn Surface>> {
        if self.log.inner.lock().fail_create.contains(&role) {
            return Err(OrbitError::surface(format!("{} refused", role)));
        }
        self.log.record(SurfaceCall::Create(role));
        Ok(Box::new(FakeSurface {
            role,
            log: self.log.clone(),
            destroyed: false,
        }))
    }

    fn install_tray(&mut self) -> Result<()> {
        if self.log.inner.lock().fail_tray {
            return Err(OrbitError::surface("no system tray"));
        }
        self.log.record(SurfaceCall::InstallTray);
        Ok(())
    }

    fn remove_tray(&mut self) -> Result<()> {
        self.log.record(SurfaceCall::RemoveTray);
        Ok(())
    }
}

struct FakeSurface {
    role: SurfaceRole,
    log: SurfaceLog,
    destroyed: bool,
}

impl Surface for FakeSurface {
    fn role(&self) -> SurfaceRole {
        self.role
    }

    fn show(&mut self) -> Result<()> {
        self.log.record(SurfaceCall::Show(self.role));
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        self.log.record(SurfaceCall::Hide(self.role));
        Ok(())
    }

    fn set_bounds(&mut self, bounds: Rect) -> Result<()> {
        self.log.record(SurfaceCall::SetBounds(self.role, bounds));
        Ok(())
    }

    fn send(&mut self, message: &SurfaceMessage) -> Result<()> {
        self.log.record(SurfaceCall::Send(self.role, message.clone()));
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.destroyed = true;
        self.log.record(SurfaceCall::Destroy(self.role));
        Ok(())
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

// ---------------------------------------------------------------------------
// Directory, bounds, permission
// ---------------------------------------------------------------------------

/// Directory with settable contents
pub struct FakeDirectory {
    sources: Mutex<Vec<CaptureSource>>,
    devices: Mutex<Vec<MediaDeviceDescriptor>>,
}

impl FakeDirectory {
    pub fn new(sources: Vec<CaptureSource>, devices: Vec<MediaDeviceDescriptor>) -> Self {
        Self {
            sources: Mutex::new(sources),
            devices: Mutex::new(devices),
        }
    }

    /// One window, one screen, one camera, one microphone
    pub fn standard() -> Self {
        Self::new(
            vec![
                CaptureSource::new(WINDOW_ID, "Editor"),
                CaptureSource::new(SCREEN_ID, "Entire screen"),
            ],
            vec![
                MediaDeviceDescriptor::camera(CAMERA_ID, "FaceTime HD"),
                MediaDeviceDescriptor::microphone(MIC_ID, ""),
            ],
        )
    }

    pub fn set_sources(&self, sources: Vec<CaptureSource>) {
        *self.sources.lock() = sources;
    }
}

#[async_trait]
impl DirectoryProvider for FakeDirectory {
    async fn list_capture_sources(&self) -> Result<Vec<CaptureSource>> {
        Ok(self.sources.lock().clone())
    }

    async fn list_media_devices(&self) -> Result<Vec<MediaDeviceDescriptor>> {
        Ok(self.devices.lock().clone())
    }
}

/// Two side-by-side 1080p displays and one known window
pub struct FakeBounds {
    windows: HashMap<String, Rect>,
    displays: Vec<DisplayInfo>,
}

impl FakeBounds {
    pub fn standard() -> Self {
        let mut windows = HashMap::new();
        windows.insert("1".to_string(), WINDOW_BOUNDS);
        Self {
            windows,
            displays: vec![
                DisplayInfo {
                    id: "0".into(),
                    bounds: Rect::new(0, 0, 1920, 1080),
                    primary: true,
                },
                DisplayInfo {
                    id: "1".into(),
                    bounds: Rect::new(1920, 0, 1920, 1080),
                    primary: false,
                },
            ],
        }
    }
}

#[async_trait]
impl BoundsResolver for FakeBounds {
    async fn window_bounds(&self, id: &SourceId) -> Option<Rect> {
        id.native_id().and_then(|n| self.windows.get(n).copied())
    }

    async fn displays(&self) -> Vec<DisplayInfo> {
        self.displays.clone()
    }
}

/// Permission gate with a fixed answer
pub struct FakePermission {
    status: Mutex<ScreenAccess>,
    grant: bool,
    pub requests: AtomicUsize,
}

impl FakePermission {
    pub fn granted() -> Self {
        Self::new(ScreenAccess::Granted, true)
    }

    pub fn refused() -> Self {
        Self::new(ScreenAccess::Denied, false)
    }

    pub fn new(status: ScreenAccess, grant: bool) -> Self {
        Self {
            status: Mutex::new(status),
            grant,
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PermissionGate for FakePermission {
    async fn screen_access_status(&self) -> ScreenAccess {
        *self.status.lock()
    }

    async fn request_screen_access(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.grant {
            *self.status.lock() = ScreenAccess::Granted;
        }
        self.grant
    }
}

// ---------------------------------------------------------------------------
// Controller harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub controller: SessionController,
    pub log: SurfaceLog,
    pub directory: Arc<FakeDirectory>,
    pub permission: Arc<FakePermission>,
    pub signals: mpsc::UnboundedReceiver<AppSignal>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_permission(FakePermission::granted())
    }

    pub fn with_permission(permission: FakePermission) -> Self {
        let (backend, log) = RecordingBackend::new();
        let directory = Arc::new(FakeDirectory::standard());
        let permission = Arc::new(permission);
        let collaborators = Collaborators {
            surfaces: Box::new(backend),
            directory: directory.clone(),
            bounds: Arc::new(FakeBounds::standard()),
            permission: permission.clone(),
        };
        let (controller, signals) = SessionController::new(collaborators, RecorderConfig::default());
        Self {
            controller,
            log,
            directory,
            permission,
            signals,
        }
    }

    pub async fn event(&mut self, event: impl Into<ControllerEvent>) {
        self.controller.handle_event(event.into()).await;
    }

    pub async fn intent(&mut self, intent: ControlIntent) {
        self.event(intent).await;
    }

    /// Shell connected without a tray: controls shown, devices defaulted
    pub async fn connected(mut self) -> Self {
        self.event(ControllerEvent::ShellConnected { tray: false })
            .await;
        self
    }

    /// Connected, with the test window selected
    pub async fn ready(self) -> Self {
        let mut harness = self.connected().await;
        harness
            .intent(ControlIntent::SelectSource {
                source_id: SourceId::new(WINDOW_ID),
            })
            .await;
        harness
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Media devices backed by watch channels the test can feed
pub struct MockMedia {
    screen: watch::Sender<Option<Arc<VideoFrame>>>,
    camera: watch::Sender<Option<Arc<VideoFrame>>>,
    mic: Mutex<Option<mpsc::Sender<AudioChunk>>>,
    pub fail_screen: AtomicBool,
    pub fail_camera: AtomicBool,
    pub camera_opens: AtomicUsize,
}

impl MockMedia {
    /// A 64x36 blue screen and a 16x9 red camera
    pub fn new() -> Self {
        let (screen, _) = watch::channel(Some(Arc::new(VideoFrame::solid(64, 36, BLUE))));
        let (camera, _) = watch::channel(Some(Arc::new(VideoFrame::solid(16, 9, RED))));
        Self {
            screen,
            camera,
            mic: Mutex::new(None),
            fail_screen: AtomicBool::new(false),
            fail_camera: AtomicBool::new(false),
            camera_opens: AtomicUsize::new(0),
        }
    }

    /// Push audio into the open microphone
    pub async fn push_audio(&self, chunk: AudioChunk) {
        let tx = self.mic.lock().clone();
        if let Some(tx) = tx {
            let _ = tx.send(chunk).await;
        }
    }
}

#[async_trait]
impl MediaDevices for MockMedia {
    async fn open_screen(&self, _source: &SourceId) -> Result<VideoFeed> {
        if self.fail_screen.load(Ordering::SeqCst) {
            return Err(OrbitError::source_not_found("window closed"));
        }
        Ok(self.screen.subscribe())
    }

    async fn open_camera(&self, _device_id: Option<&str>) -> Result<VideoFeed> {
        self.camera_opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_camera.load(Ordering::SeqCst) {
            return Err(OrbitError::device("camera busy"));
        }
        Ok(self.camera.subscribe())
    }

    async fn open_microphone(&self, _device_id: &str) -> Result<AudioFeed> {
        let (tx, rx) = mpsc::channel(16);
        *self.mic.lock() = Some(tx);
        Ok(rx)
    }
}

/// Feeds not tied to any device, for driving a pipeline directly
pub fn feeds() -> (
    watch::Sender<Option<Arc<VideoFrame>>>,
    VideoFeed,
    mpsc::Sender<AudioChunk>,
    AudioFeed,
) {
    let (screen_tx, screen) = watch::channel(Some(Arc::new(VideoFrame::solid(64, 36, BLUE))));
    let (audio_tx, audio) = mpsc::channel(16);
    (screen_tx, screen, audio_tx, audio)
}

pub fn audio_chunk() -> AudioChunk {
    AudioChunk {
        samples: vec![0.0; 960],
        sample_rate: 48_000,
        channels: 2,
        pts: 0,
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct EncoderRecord {
    pub settings: Option<EncoderSettings>,
    pub video_pts: Vec<u64>,
    pub audio_chunks: usize,
    pub paused: bool,
    pub pauses: usize,
    pub finalized: bool,
}

/// Encoder whose output is a text summary of what it received
pub struct MockEncoderFactory {
    pub record: Arc<Mutex<EncoderRecord>>,
    /// Fail `push_video` once this many frames were accepted
    pub fail_after: Option<usize>,
    pub fail_create: bool,
}

impl MockEncoderFactory {
    pub fn new() -> Self {
        Self {
            record: Arc::new(Mutex::new(EncoderRecord::default())),
            fail_after: None,
            fail_create: false,
        }
    }

    pub fn failing_after(frames: usize) -> Self {
        Self {
            fail_after: Some(frames),
            ..Self::new()
        }
    }

    pub fn frames(&self) -> usize {
        self.record.lock().video_pts.len()
    }

    pub fn encoder(&self) -> Box<dyn Encoder> {
        Box::new(MockEncoder {
            record: Arc::clone(&self.record),
            fail_after: self.fail_after,
        })
    }
}

impl EncoderFactory for MockEncoderFactory {
    fn create(&self, settings: &EncoderSettings) -> Result<Box<dyn Encoder>> {
        if self.fail_create {
            return Err(OrbitError::encode("no vp9 encoder"));
        }
        self.record.lock().settings = Some(settings.clone());
        Ok(self.encoder())
    }
}

struct MockEncoder {
    record: Arc<Mutex<EncoderRecord>>,
    fail_after: Option<usize>,
}

impl Encoder for MockEncoder {
    fn push_video(&mut self, frame: &VideoFrame) -> Result<()> {
        let mut record = self.record.lock();
        assert!(!record.paused, "frame pushed while paused");
        if self.fail_after.is_some_and(|n| record.video_pts.len() >= n) {
            return Err(OrbitError::encode("muxer closed"));
        }
        record.video_pts.push(frame.pts);
        Ok(())
    }

    fn push_audio(&mut self, _chunk: &AudioChunk) -> Result<()> {
        self.record.lock().audio_chunks += 1;
        Ok(())
    }

    fn pause(&mut self) {
        let mut record = self.record.lock();
        record.paused = true;
        record.pauses += 1;
    }

    fn resume(&mut self) {
        self.record.lock().paused = false;
    }

    fn finalize(self: Box<Self>) -> Result<Bytes> {
        let mut record = self.record.lock();
        record.finalized = true;
        Ok(Bytes::from(format!("frames={}", record.video_pts.len())))
    }
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

/// Saver that keeps files in memory
#[derive(Default)]
pub struct MemorySaver {
    pub files: Mutex<Vec<(PathBuf, Bytes)>>,
    pub cancel: AtomicBool,
    pub fail_write: AtomicBool,
}

impl MemorySaver {
    pub fn saved(&self) -> Vec<(PathBuf, Bytes)> {
        self.files.lock().clone()
    }
}

#[async_trait]
impl SaveTarget for MemorySaver {
    async fn prompt_save_path(&self, suggested_name: &str) -> Option<PathBuf> {
        if self.cancel.load(Ordering::SeqCst) {
            return None;
        }
        Some(Path::new("/recordings").join(suggested_name))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(OrbitError::save("disk full"));
        }
        self.files.lock().push((path.to_path_buf(), data));
        Ok(())
    }
}

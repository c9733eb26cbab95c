//! UI surfaces
//!
//! Orbit coordinates four concurrently visible surfaces. Each role has a
//! fixed [`SurfaceSpec`]; every role exposes the same capability set through
//! the [`Surface`] trait, created on demand by a [`SurfaceBackend`].
//!
//! Surfaces never talk to each other. The controller sends them one-way
//! [`SurfaceMessage`]s and they answer with intents and events.

mod registry;

pub use registry::{Placement, SurfaceRegistry};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::ControlsView;
use crate::types::{CaptureSource, Handle, MediaDeviceDescriptor, Rect, Size, SourceId};

/// Side length of the camera bubble
pub const CAMERA_SIZE: u32 = 200;

/// Smallest camera bubble the user may resize to
pub const CAMERA_MIN_SIZE: u32 = 100;

/// Inset of the camera bubble from the target's bottom-right corner
pub const CAMERA_MARGIN: u32 = 20;

/// Surface role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceRole {
    /// Control panel (source, device, start/pause/stop)
    Control,
    /// Window/screen picker glued to the control panel
    Picker,
    /// Floating camera bubble; also hosts the capture pipeline
    Camera,
    /// Click-through outline spanning every display
    Outline,
}

impl SurfaceRole {
    pub const ALL: [SurfaceRole; 4] = [Self::Control, Self::Picker, Self::Camera, Self::Outline];

    /// Creation parameters for this role
    pub fn spec(&self) -> SurfaceSpec {
        match self {
            Self::Control => SurfaceSpec::fixed(Size::new(400, 500)),
            Self::Picker => SurfaceSpec::fixed(Size::new(600, 600)),
            Self::Camera => SurfaceSpec {
                size: Size::square(CAMERA_SIZE),
                resizable: true,
                min_size: Some(Size::square(CAMERA_MIN_SIZE)),
                ..SurfaceSpec::fixed(Size::square(CAMERA_SIZE))
            },
            Self::Outline => SurfaceSpec {
                click_through: true,
                focusable: false,
                ..SurfaceSpec::fixed(Size::default())
            },
        }
    }
}

impl std::fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Control => write!(f, "control"),
            Self::Picker => write!(f, "picker"),
            Self::Camera => write!(f, "camera"),
            Self::Outline => write!(f, "outline"),
        }
    }
}

/// How a surface is created
///
/// All surfaces are frameless, transparent, always on top and kept out of
/// the taskbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSpec {
    /// Initial size (zero for surfaces sized by their anchor)
    pub size: Size,
    pub resizable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<Size>,
    /// Pointer events pass through to whatever is below
    pub click_through: bool,
    pub focusable: bool,
}

impl SurfaceSpec {
    pub const fn fixed(size: Size) -> Self {
        Self {
            size,
            resizable: false,
            min_size: None,
            click_through: false,
            focusable: true,
        }
    }
}

/// Snapshot of a surface as the registry knows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceHandle {
    pub role: SurfaceRole,
    pub bounds: Rect,
    pub visible: bool,
}

/// Everything the capture surface needs to begin recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRequest {
    pub session: Handle,
    pub source: SourceId,
    pub camera_id: String,
    pub mic_id: String,
    /// Camera bubble, relative to the target's top-left corner
    pub overlay: Rect,
    /// Size of the captured area the overlay is expressed in
    pub target_size: Size,
}

/// One-way messages to surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SurfaceMessage {
    /// Control: full state broadcast
    ControlsState(ControlsView),
    /// Control: the picker chose a source
    SourceSelected { id: SourceId, name: String },
    /// Control: fresh device lists
    DevicesChanged {
        cameras: Vec<MediaDeviceDescriptor>,
        microphones: Vec<MediaDeviceDescriptor>,
    },
    /// Control: screen capture permission is missing
    PermissionRequired { message: String, detail: String },
    /// Picker: sources to choose from
    Sources { sources: Vec<CaptureSource> },
    /// Camera: open the camera for preview only
    StartPreview {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        camera_id: Option<String>,
    },
    /// Camera: switch the preview to the selected camera and acknowledge
    StartCamera { session: Handle, camera_id: String },
    StartRecording(RecordingRequest),
    PauseRecording { session: Handle },
    ResumeRecording { session: Handle },
    StopRecording { session: Handle },
    /// Camera: the bubble moved while recording
    OverlayMoved { session: Handle, overlay: Rect },
    /// Camera: the control panel is closing, release every stream
    ControlsClosing,
    /// Outline: area to outline, relative to the outline surface
    Outline { area: Rect },
}

impl SurfaceMessage {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::ControlsState(_) => "controls-state",
            Self::SourceSelected { .. } => "source-selected",
            Self::DevicesChanged { .. } => "devices-changed",
            Self::PermissionRequired { .. } => "permission-required",
            Self::Sources { .. } => "sources",
            Self::StartPreview { .. } => "start-preview",
            Self::StartCamera { .. } => "start-camera",
            Self::StartRecording(_) => "start-recording",
            Self::PauseRecording { .. } => "pause-recording",
            Self::ResumeRecording { .. } => "resume-recording",
            Self::StopRecording { .. } => "stop-recording",
            Self::OverlayMoved { .. } => "overlay-moved",
            Self::ControlsClosing => "controls-closing",
            Self::Outline { .. } => "outline",
        }
    }
}

/// A live surface
pub trait Surface: Send {
    fn role(&self) -> SurfaceRole;

    fn show(&mut self) -> Result<()>;

    fn hide(&mut self) -> Result<()>;

    fn set_bounds(&mut self, bounds: Rect) -> Result<()>;

    /// Deliver a message; never queued for later
    fn send(&mut self, message: &SurfaceMessage) -> Result<()>;

    fn destroy(&mut self) -> Result<()>;

    fn is_destroyed(&self) -> bool;
}

/// Platform windowing
pub trait SurfaceBackend: Send {
    /// Create a hidden surface for `role`
    fn create(&mut self, role: SurfaceRole, spec: &SurfaceSpec) -> Result<Box<dyn Surface>>;

    /// Install the tray icon and its menu
    fn install_tray(&mut self) -> Result<()>;

    fn remove_tray(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_specs() {
        assert_eq!(SurfaceRole::Control.spec().size, Size::new(400, 500));
        assert_eq!(SurfaceRole::Picker.spec().size, Size::new(600, 600));

        let camera = SurfaceRole::Camera.spec();
        assert!(camera.resizable);
        assert_eq!(camera.min_size, Some(Size::square(CAMERA_MIN_SIZE)));

        let outline = SurfaceRole::Outline.spec();
        assert!(outline.click_through);
        assert!(!outline.focusable);
    }

    #[test]
    fn test_message_wire_name() {
        let json = serde_json::to_string(&SurfaceMessage::ControlsClosing).unwrap();
        assert_eq!(json, r#"{"type":"controls-closing"}"#);
        assert_eq!(SurfaceMessage::ControlsClosing.name(), "controls-closing");
    }
}

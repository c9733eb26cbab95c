//! Messages flowing up to the session controller

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::OrbitError;
use crate::surface::SurfaceRole;
use crate::types::{Handle, Rect, SourceId};

/// User intents raised by the control surface, the picker or the tray menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ControlIntent {
    SelectSource { source_id: SourceId },
    SelectCamera { device_id: String },
    SelectMic { device_id: String },
    Start,
    PauseResume,
    Stop,
    ShowPicker,
    HidePicker,
    RefreshDirectory,
    /// Tray menu "Open Orbit"
    ShowControls,
    Relaunch,
    Quit,
}

/// Category of a capture-side failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Source,
    Device,
    Permission,
    Encode,
    Save,
}

impl FailureKind {
    pub fn into_error(self, reason: impl Into<String>) -> OrbitError {
        match self {
            Self::Source => OrbitError::source_not_found(reason),
            Self::Device => OrbitError::device(reason),
            Self::Permission => OrbitError::permission(reason),
            Self::Encode => OrbitError::encode(reason),
            Self::Save => OrbitError::save(reason),
        }
    }

    /// Best-fitting kind for an error raised on the capture side
    pub fn of(err: &OrbitError) -> Self {
        match err.root() {
            OrbitError::SourceNotFound(_) => Self::Source,
            OrbitError::PermissionDenied(_) => Self::Permission,
            OrbitError::Encode(_) => Self::Encode,
            OrbitError::Save(_) | OrbitError::Io(_) => Self::Save,
            _ => Self::Device,
        }
    }
}

/// Acknowledgements and reports from the capture surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CaptureEvent {
    PreviewStarted,
    CameraReady { session: Handle },
    CameraFailed { session: Handle, reason: String },
    RecordingStarted { session: Handle },
    Paused { session: Handle },
    Resumed { session: Handle },
    Saved { session: Handle, path: PathBuf },
    SaveCancelled { session: Handle },
    /// `saved` is where partial output went; `None` means it was lost
    Failed {
        session: Option<Handle>,
        kind: FailureKind,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        saved: Option<PathBuf>,
    },
}

impl CaptureEvent {
    /// Session this event belongs to, if it names one
    pub fn session(&self) -> Option<Handle> {
        match self {
            Self::PreviewStarted => None,
            Self::CameraReady { session }
            | Self::CameraFailed { session, .. }
            | Self::RecordingStarted { session }
            | Self::Paused { session }
            | Self::Resumed { session }
            | Self::Saved { session, .. }
            | Self::SaveCancelled { session } => Some(*session),
            Self::Failed { session, .. } => *session,
        }
    }
}

/// Platform window events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SurfaceEvent {
    /// Moved or resized by the user
    Moved { role: SurfaceRole, bounds: Rect },
    /// The user asked to close the surface
    CloseRequested { role: SurfaceRole },
    /// The platform destroyed the surface
    Closed { role: SurfaceRole },
    /// Creation failed after the create command was issued
    CreateFailed { role: SurfaceRole, reason: String },
    TrayClicked,
}

/// Everything the controller task reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Intent(ControlIntent),
    Capture(CaptureEvent),
    Surface(SurfaceEvent),
    /// The camera did not acknowledge in time
    CameraGraceElapsed(Handle),
    /// A coalesced picker reposition is due
    FollowTick,
    ShellConnected { tray: bool },
    ShellDisconnected,
    Shutdown,
}

impl From<ControlIntent> for ControllerEvent {
    fn from(intent: ControlIntent) -> Self {
        Self::Intent(intent)
    }
}

impl From<CaptureEvent> for ControllerEvent {
    fn from(event: CaptureEvent) -> Self {
        Self::Capture(event)
    }
}

impl From<SurfaceEvent> for ControllerEvent {
    fn from(event: SurfaceEvent) -> Self {
        Self::Surface(event)
    }
}

/// Requests from the controller to the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSignal {
    /// Re-execute so a newly granted permission takes effect
    Relaunch,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_format() {
        let intent: ControlIntent =
            serde_json::from_str(r#"{"action":"select-source","sourceId":"screen:1:0"}"#).unwrap();
        assert_eq!(
            intent,
            ControlIntent::SelectSource {
                source_id: SourceId::new("screen:1:0")
            }
        );
    }

    #[test]
    fn test_failure_kind_of_context_error() {
        let err = OrbitError::encode("eos").with_context("Finalizing");
        assert_eq!(FailureKind::of(&err), FailureKind::Encode);
    }
}

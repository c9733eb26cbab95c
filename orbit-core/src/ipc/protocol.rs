//! Shell protocol definitions
//!
//! Newline-delimited JSON. The shell sends [`ShellEvent`]s, the orchestrator
//! sends [`ShellCommand`]s. Requests carry an id that the shell echoes in its
//! reply.

use serde::{Deserialize, Serialize};

use crate::platform::ScreenAccess;
use crate::session::{CaptureEvent, ControlIntent, SurfaceEvent};
use crate::surface::{SurfaceMessage, SurfaceRole, SurfaceSpec};
use crate::types::{CaptureSource, DisplayInfo, MediaDeviceDescriptor, Rect, SourceId};

/// Messages from the shell to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShellEvent {
    /// First message on a connection
    Hello { tray: bool },
    /// User intent from the control surface, picker or tray menu
    Intent { intent: ControlIntent },
    /// Report from the capture agent in the camera surface
    Capture { event: CaptureEvent },
    /// Platform window event
    Surface { event: SurfaceEvent },
    /// Answer to a [`ShellCommand::Request`]
    Reply { id: u64, reply: ShellReply },
}

/// Messages from the orchestrator to the shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShellCommand {
    /// Create a hidden surface
    Create { role: SurfaceRole, spec: SurfaceSpec },
    Show { role: SurfaceRole },
    Hide { role: SurfaceRole },
    SetBounds { role: SurfaceRole, bounds: Rect },
    Destroy { role: SurfaceRole },
    /// Forward a message to a surface's content
    Deliver {
        role: SurfaceRole,
        message: SurfaceMessage,
    },
    InstallTray,
    RemoveTray,
    /// Ask the shell a question; answered with a reply event
    Request { id: u64, request: ShellRequest },
}

/// Questions only the platform can answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ShellRequest {
    ListSources,
    ListDevices,
    WindowBounds { id: SourceId },
    Displays,
    ScreenAccess,
    RequestScreenAccess,
}

/// Answers to [`ShellRequest`]s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ShellReply {
    Sources { sources: Vec<CaptureSource> },
    Devices { devices: Vec<MediaDeviceDescriptor> },
    /// `None` when the window is unknown or gone
    Bounds {
        #[serde(default)]
        bounds: Option<Rect>,
    },
    Displays { displays: Vec<DisplayInfo> },
    Access { access: ScreenAccess },
    Granted { granted: bool },
    Error { message: String },
}

impl ShellReply {
    /// Create an error reply
    pub fn error(message: impl Into<String>) -> Self {
        ShellReply::Error {
            message: message.into(),
        }
    }
}

impl ShellEvent {
    /// Serialize event to JSON bytes with newline terminator
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }

    /// Deserialize event from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl ShellCommand {
    /// Serialize command to JSON bytes with newline terminator
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }

    /// Deserialize command from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Surface this command targets, if any
    pub fn role(&self) -> Option<SurfaceRole> {
        match self {
            Self::Create { role, .. }
            | Self::Show { role }
            | Self::Hide { role }
            | Self::SetBounds { role, .. }
            | Self::Destroy { role }
            | Self::Deliver { role, .. } => Some(*role),
            Self::InstallTray | Self::RemoveTray | Self::Request { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Handle;

    #[test]
    fn test_command_wire_format() {
        let cmd = ShellCommand::SetBounds {
            role: SurfaceRole::Camera,
            bounds: Rect::new(780, 580, 200, 200),
        };
        let bytes = cmd.to_bytes();
        assert_eq!(bytes.last(), Some(&b'\n'));

        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "set-bounds");
        assert_eq!(json["role"], "camera");
        assert_eq!(json["bounds"]["x"], 780);
    }

    #[test]
    fn test_intent_event_parses() {
        let line = br#"{"type":"intent","intent":{"action":"select-source","sourceId":"window:42"}}"#;
        let event = ShellEvent::from_bytes(line).unwrap();
        assert_eq!(
            event,
            ShellEvent::Intent {
                intent: ControlIntent::SelectSource {
                    source_id: SourceId::new("window:42")
                }
            }
        );
    }

    #[test]
    fn test_deliver_nests_surface_message() {
        let session = Handle::new();
        let cmd = ShellCommand::Deliver {
            role: SurfaceRole::Camera,
            message: SurfaceMessage::StopRecording { session },
        };
        let bytes = cmd.to_bytes();
        let parsed = ShellCommand::from_bytes(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(parsed, cmd);
        assert_eq!(parsed.role(), Some(SurfaceRole::Camera));
    }

    #[test]
    fn test_reply_without_bounds() {
        let line = br#"{"type":"reply","id":7,"reply":{"kind":"bounds"}}"#;
        let event = ShellEvent::from_bytes(line).unwrap();
        assert_eq!(
            event,
            ShellEvent::Reply {
                id: 7,
                reply: ShellReply::Bounds { bounds: None }
            }
        );
    }
}

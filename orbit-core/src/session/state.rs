//! Recording session record and state machine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

use crate::types::{Handle, Rect, SourceId};

/// Recording session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    /// Waiting for the camera before recording begins
    Starting,
    Recording,
    Paused,
    Stopped,
    Failed,
}

impl RecordingState {
    /// `stopped` and `failed` only leave through a fresh selection
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// A capture is underway or about to be
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Recording | Self::Paused)
    }

    /// Whether the state machine allows `self → next`
    pub fn can_transition_to(&self, next: RecordingState) -> bool {
        use RecordingState::*;
        match (self, next) {
            (_, Failed) => true,
            (Idle, Starting) => true,
            (Starting, Recording) => true,
            (Recording, Paused) | (Paused, Recording) => true,
            (Starting | Recording | Paused, Stopped) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The single authoritative session record
#[derive(Debug, Clone)]
pub struct RecordingSession {
    /// Distinguishes this session's acknowledgements from stale ones
    pub handle: Handle,
    pub state: RecordingState,
    pub target_source_id: Option<SourceId>,
    pub target_source_name: Option<String>,
    pub camera_device_id: Option<String>,
    pub mic_device_id: Option<String>,
    /// Only meaningful once a source is selected
    pub target_bounds: Option<Rect>,
    pub started_at: Option<Instant>,
    /// Last user-visible failure
    pub failure: Option<String>,
    pub saved_path: Option<PathBuf>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            handle: Handle::new(),
            state: RecordingState::Idle,
            target_source_id: None,
            target_source_name: None,
            camera_device_id: None,
            mic_device_id: None,
            target_bounds: None,
            started_at: None,
            failure: None,
            saved_path: None,
        }
    }

    /// Source, camera and mic are all selected
    pub fn is_ready(&self) -> bool {
        self.target_source_id.is_some()
            && self.camera_device_id.is_some()
            && self.mic_device_id.is_some()
    }

    /// Apply a transition if the state machine allows it
    pub fn transition(&mut self, next: RecordingState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        if next == RecordingState::Starting {
            self.started_at = Some(Instant::now());
        }
        self.state = next;
        true
    }

    /// Move to `failed` with a user-visible message
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = RecordingState::Failed;
        self.failure = Some(message.into());
    }

    /// Broadcast view for the control surface
    pub fn view(&self) -> ControlsView {
        let is_paused = self.state == RecordingState::Paused;
        ControlsView {
            state: self.state,
            is_recording: self.state.is_active(),
            is_paused,
            pause_label: if is_paused { "Resume" } else { "Pause" }.to_string(),
            can_start: self.state == RecordingState::Idle && self.is_ready(),
            source_name: self.target_source_name.clone(),
            camera_id: self.camera_device_id.clone(),
            mic_id: self.mic_device_id.clone(),
            failure: self.failure.clone(),
            saved_path: self
                .saved_path
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// State broadcast to the control surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsView {
    pub state: RecordingState,
    pub is_recording: bool,
    pub is_paused: bool,
    /// "Pause" or "Resume"
    pub pause_label: String,
    pub can_start: bool,
    pub source_name: Option<String>,
    pub camera_id: Option<String>,
    pub mic_id: Option<String>,
    pub failure: Option<String>,
    pub saved_path: Option<String>,
}

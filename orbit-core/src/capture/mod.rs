//! Capture and composition
//!
//! Runs inside the camera surface. The [`CaptureAgent`] opens the screen,
//! camera and microphone through [`MediaDevices`], and a [`CapturePipeline`]
//! composites the circular camera overlay onto the screen at a fixed rate
//! and feeds the encoder.

mod agent;
mod compose;
mod pipeline;

pub use agent::CaptureAgent;
pub use compose::{compose_frame, crop_to_aspect, scale_overlay, CropRect};
pub use pipeline::{CapturePipeline, PipelineOutcome, PipelineSettings, PipelineState};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::error::Result;
use crate::types::{AudioChunk, SourceId, VideoFrame};

/// Latest-frame feed; `None` until the first frame arrives.
/// Dropping every receiver releases the stream.
pub type VideoFeed = watch::Receiver<Option<Arc<VideoFrame>>>;

/// Microphone chunks in capture order
pub type AudioFeed = mpsc::Receiver<AudioChunk>;

/// Raw media device access
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Open a window or screen source
    async fn open_screen(&self, source: &SourceId) -> Result<VideoFeed>;

    /// Open a camera; `None` picks the system default
    async fn open_camera(&self, device_id: Option<&str>) -> Result<VideoFeed>;

    async fn open_microphone(&self, device_id: &str) -> Result<AudioFeed>;
}

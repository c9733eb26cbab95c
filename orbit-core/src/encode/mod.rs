//! Encoder interface
//!
//! Orbit does not encode video itself. The capture pipeline drives an
//! opaque [`Encoder`] that accepts composed frames and microphone audio and
//! produces one finished container byte stream.

use bytes::Bytes;

use crate::config::{Container, RecorderConfig};
use crate::error::Result;
use crate::types::{AudioChunk, Size, VideoFrame};

/// Parameters for one recording's encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub container: Container,
    /// Output frame size
    pub size: Size,
    pub fps: u32,
    /// Video bitrate in kbps
    pub video_bitrate: u32,
    /// Audio bitrate in kbps
    pub audio_bitrate: u32,
}

impl EncoderSettings {
    /// Settings for a recording of `size` under `config`
    pub fn from_config(config: &RecorderConfig, size: Size) -> Self {
        Self {
            container: config.container,
            size,
            fps: config.fps,
            video_bitrate: config.effective_video_bitrate(),
            audio_bitrate: config.audio_bitrate,
        }
    }

    /// MIME type of the produced stream
    pub fn mime(&self) -> &'static str {
        self.container.mime()
    }
}

/// One recording's encoder: one video track, one audio track
pub trait Encoder: Send {
    fn push_video(&mut self, frame: &VideoFrame) -> Result<()>;

    fn push_audio(&mut self, chunk: &AudioChunk) -> Result<()>;

    /// Suspend; nothing pushed while paused is expected
    fn pause(&mut self);

    fn resume(&mut self);

    /// Flush and return the finished container
    fn finalize(self: Box<Self>) -> Result<Bytes>;
}

/// Creates encoders
pub trait EncoderFactory: Send + Sync {
    fn create(&self, settings: &EncoderSettings) -> Result<Box<dyn Encoder>>;
}

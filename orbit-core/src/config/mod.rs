//! Configuration types for Orbit
//!
//! Provides the output container, recording settings, and the runtime
//! configuration shared by the controller and the capture agent.

mod file;

pub use file::{sample_config, ConfigFile};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::geometry::{DEFAULT_FOLLOW_GAP, DEFAULT_FOLLOW_INTERVAL};
use crate::surface::{CAMERA_MARGIN, CAMERA_MIN_SIZE, CAMERA_SIZE};

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// WebM with VP9 video (default)
    #[default]
    Webm,
    /// MP4 with H.264 video
    Mp4,
    /// Matroska
    Mkv,
}

impl Container {
    /// File extension without the dot
    pub fn ext(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
        }
    }

    /// MIME type including the video codec
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Webm => "video/webm; codecs=vp9",
            Self::Mp4 => "video/mp4; codecs=avc1",
            Self::Mkv => "video/x-matroska; codecs=vp9",
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ext())
    }
}

impl std::str::FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webm" => Ok(Self::Webm),
            "mp4" => Ok(Self::Mp4),
            "mkv" | "matroska" => Ok(Self::Mkv),
            _ => Err(format!("Unknown container: {}", s)),
        }
    }
}

/// Default frames per second of the composed output
pub const DEFAULT_FPS: u32 = 30;

/// Default wait for the camera acknowledgement before recording anyway
pub const DEFAULT_CAMERA_GRACE: Duration = Duration::from_millis(500);

/// Default timeout for requests answered by the shell
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1500);

/// Default audio bitrate in kbps
pub const DEFAULT_AUDIO_BITRATE: u32 = 128;

/// Default recordings directory (`~/Videos/Orbit`)
pub fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("Orbit")
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Composed output frame rate
    pub fps: u32,
    pub container: Container,
    /// Video bitrate in kbps (0 = automatic)
    pub video_bitrate: u32,
    /// Audio bitrate in kbps
    pub audio_bitrate: u32,
    /// Initial camera bubble side length
    pub camera_size: u32,
    /// Camera inset from the target's bottom-right corner
    pub camera_margin: u32,
    /// Gap between the control panel and the picker
    pub follow_gap: i32,
    /// Minimum interval between picker repositions
    pub follow_interval: Duration,
    /// How long to wait for the camera before recording anyway
    pub camera_grace: Duration,
    /// Timeout for requests answered by the shell
    pub request_timeout: Duration,
    /// Where recordings are saved
    pub output_dir: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            container: Container::default(),
            video_bitrate: 0,
            audio_bitrate: DEFAULT_AUDIO_BITRATE,
            camera_size: CAMERA_SIZE,
            camera_margin: CAMERA_MARGIN,
            follow_gap: DEFAULT_FOLLOW_GAP,
            follow_interval: DEFAULT_FOLLOW_INTERVAL,
            camera_grace: DEFAULT_CAMERA_GRACE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            output_dir: default_output_dir(),
        }
    }
}

impl RecorderConfig {
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn with_video_bitrate(mut self, kbps: u32) -> Self {
        self.video_bitrate = kbps;
        self
    }

    pub fn with_audio_bitrate(mut self, kbps: u32) -> Self {
        self.audio_bitrate = kbps;
        self
    }

    pub fn with_camera_size(mut self, size: u32) -> Self {
        self.camera_size = size;
        self
    }

    pub fn with_camera_margin(mut self, margin: u32) -> Self {
        self.camera_margin = margin;
        self
    }

    pub fn with_follow_gap(mut self, gap: i32) -> Self {
        self.follow_gap = gap;
        self
    }

    pub fn with_follow_interval(mut self, interval: Duration) -> Self {
        self.follow_interval = interval;
        self
    }

    pub fn with_camera_grace(mut self, grace: Duration) -> Self {
        self.camera_grace = grace;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Video bitrate, scaled from a 1080p30 baseline when automatic
    pub fn effective_video_bitrate(&self) -> u32 {
        if self.video_bitrate > 0 {
            self.video_bitrate
        } else {
            // 6 Mbps at 30fps, proportionally more for higher rates
            (6000 * self.fps.max(1) / DEFAULT_FPS).max(1000)
        }
    }

    /// Validate the configuration and return any warnings
    ///
    /// An empty list means the configuration looks good.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.fps > 60 {
            warnings.push(format!(
                "{}fps composition is expensive; 30 or 60 is recommended.",
                self.fps
            ));
        }

        if self.video_bitrate > 0 && self.video_bitrate < 500 {
            warnings.push(
                "Video bitrate below 500 kbps will likely produce poor quality video.".to_string(),
            );
        }

        if self.camera_grace > Duration::from_secs(5) {
            warnings.push(format!(
                "Camera grace of {:?} delays every recording start.",
                self.camera_grace
            ));
        }

        if self.follow_interval > Duration::from_millis(100) {
            warnings.push(format!(
                "Follow interval of {:?} makes the picker lag behind the control panel.",
                self.follow_interval
            ));
        }

        warnings
    }

    /// Validate and return an error if configuration is invalid
    ///
    /// Unlike `validate()` which returns warnings, this returns hard errors
    /// for configurations that cannot work.
    pub fn validate_strict(&self) -> Result<(), String> {
        if self.fps == 0 {
            return Err("Framerate cannot be zero".to_string());
        }

        if self.fps > 240 {
            return Err(format!("Framerate {} exceeds maximum supported (240)", self.fps));
        }

        if self.camera_size < CAMERA_MIN_SIZE {
            return Err(format!(
                "Camera size {} is below the minimum of {}",
                self.camera_size, CAMERA_MIN_SIZE
            ));
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        if self.follow_interval.is_zero() {
            return Err("Follow interval cannot be zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_from_str() {
        assert_eq!("WebM".parse::<Container>(), Ok(Container::Webm));
        assert_eq!("matroska".parse::<Container>(), Ok(Container::Mkv));
        assert!("avi".parse::<Container>().is_err());
        assert_eq!(Container::Webm.mime(), "video/webm; codecs=vp9");
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RecorderConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.validate_strict().is_ok());
        assert_eq!(config.effective_video_bitrate(), 6000);
    }

    #[test]
    fn test_strict_rejects_zero_fps() {
        let config = RecorderConfig::default().with_fps(0);
        assert!(config.validate_strict().is_err());
    }
}

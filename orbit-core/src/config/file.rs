//! Configuration file loading
//!
//! Loads user configuration from `~/.config/orbit/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{default_output_dir, Container, RecorderConfig};
use crate::error::{OrbitError, Result};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Output encoding settings
    #[serde(default)]
    pub recording: RecordingSettings,

    /// Floating surface layout
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Timers and timeouts
    #[serde(default)]
    pub timing: TimingSettings,

    /// Where recordings go
    #[serde(default)]
    pub output: OutputSettings,
}

/// Output encoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Composed frames per second
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Container (webm, mp4, mkv)
    #[serde(default = "default_container")]
    pub container: String,

    /// Video bitrate in kbps (0 = auto)
    #[serde(default)]
    pub video_bitrate: u32,

    /// Audio bitrate in kbps
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: u32,
}

/// Floating surface layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Camera bubble side length in pixels
    #[serde(default = "default_camera_size")]
    pub camera_size: u32,

    /// Camera inset from the recorded area's corner
    #[serde(default = "default_camera_margin")]
    pub camera_margin: u32,

    /// Gap between the control panel and the picker
    #[serde(default = "default_follow_gap")]
    pub follow_gap: i32,

    /// Minimum milliseconds between picker repositions
    #[serde(default = "default_follow_interval_ms")]
    pub follow_interval_ms: u64,
}

/// Timers and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Milliseconds to wait for the camera before recording anyway
    #[serde(default = "default_camera_grace_ms")]
    pub camera_grace_ms: u64,

    /// Milliseconds before an unanswered shell request falls back
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Where recordings go
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Recordings directory (default: ~/Videos/Orbit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

// Default value functions
fn default_fps() -> u32 {
    super::DEFAULT_FPS
}

fn default_container() -> String {
    "webm".to_string()
}

fn default_audio_bitrate() -> u32 {
    super::DEFAULT_AUDIO_BITRATE
}

fn default_camera_size() -> u32 {
    crate::surface::CAMERA_SIZE
}

fn default_camera_margin() -> u32 {
    crate::surface::CAMERA_MARGIN
}

fn default_follow_gap() -> i32 {
    crate::geometry::DEFAULT_FOLLOW_GAP
}

fn default_follow_interval_ms() -> u64 {
    crate::geometry::DEFAULT_FOLLOW_INTERVAL.as_millis() as u64
}

fn default_camera_grace_ms() -> u64 {
    super::DEFAULT_CAMERA_GRACE.as_millis() as u64
}

fn default_request_timeout_ms() -> u64 {
    super::DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            container: default_container(),
            video_bitrate: 0,
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            camera_size: default_camera_size(),
            camera_margin: default_camera_margin(),
            follow_gap: default_follow_gap(),
            follow_interval_ms: default_follow_interval_ms(),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            camera_grace_ms: default_camera_grace_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("orbit").join("config.toml")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("orbit")
                .join("config.toml")
        } else {
            PathBuf::from("/etc/orbit/config.toml")
        }
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| OrbitError::config(format!("Failed to read config file: {}", e)))?;

        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| OrbitError::config(format!("Failed to parse config file: {}", e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, logging warnings but returning defaults on error
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    OrbitError::config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| OrbitError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&path, content)
            .map_err(|e| OrbitError::config(format!("Failed to write config file: {}", e)))?;

        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Build the runtime configuration, rejecting unusable values
    pub fn to_recorder_config(&self) -> Result<RecorderConfig> {
        let container: Container = self.recording.container.parse().map_err(OrbitError::config)?;

        let config = RecorderConfig {
            fps: self.recording.fps,
            container,
            video_bitrate: self.recording.video_bitrate,
            audio_bitrate: self.recording.audio_bitrate,
            camera_size: self.layout.camera_size,
            camera_margin: self.layout.camera_margin,
            follow_gap: self.layout.follow_gap,
            follow_interval: Duration::from_millis(self.layout.follow_interval_ms),
            camera_grace: Duration::from_millis(self.timing.camera_grace_ms),
            request_timeout: Duration::from_millis(self.timing.request_timeout_ms),
            output_dir: self
                .output
                .directory
                .clone()
                .unwrap_or_else(default_output_dir),
        };

        config.validate_strict().map_err(OrbitError::config)?;
        for warning in config.validate() {
            warn!("{}", warning);
        }

        Ok(config)
    }
}

/// Generate a sample configuration file
pub fn sample_config() -> String {
    r#"# Orbit Configuration

[recording]
# Composed output frame rate
fps = 30

# Container: webm (VP9), mp4 (H.264), mkv
container = "webm"

# Video bitrate in kbps (0 = automatic based on fps)
video_bitrate = 0

# Audio bitrate in kbps
audio_bitrate = 128

[layout]
# Camera bubble size in pixels (minimum 100)
camera_size = 200

# Camera inset from the bottom-right corner of the recorded area
camera_margin = 20

# Gap between the control panel and the source picker
follow_gap = 10

# Minimum milliseconds between picker repositions (16 = ~60 per second)
follow_interval_ms = 16

[timing]
# Milliseconds to wait for the camera before recording starts anyway
camera_grace_ms = 500

# Milliseconds before an unanswered shell request falls back to defaults
request_timeout_ms = 1500

[output]
# Recordings directory (default: ~/Videos/Orbit)
# directory = "/home/me/Videos/Orbit"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.recording.fps, 30);
        assert_eq!(config.recording.container, "webm");
        assert_eq!(config.layout.camera_size, 200);
        assert_eq!(config.timing.request_timeout_ms, 1500);
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = sample_config();
        let config: ConfigFile = toml::from_str(&sample).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_unknown_container_rejected() {
        let mut config = ConfigFile::default();
        config.recording.container = "avi".to_string();
        assert!(matches!(
            config.to_recorder_config(),
            Err(OrbitError::Config(_))
        ));
    }
}

//! Core types for Orbit
//!
//! These types represent the fundamental data structures shared by the
//! session controller, the surface registry and the capture pipeline.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global handle counter for unique session IDs
static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle for a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u64);

impl Handle {
    /// Create a new unique handle
    pub fn new() -> Self {
        Self(HANDLE_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A square of the given side length
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Width divided by height (0 for degenerate sizes)
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangle in virtual-desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at `(x, y)` with the given size
    pub const fn at(x: i32, y: i32, size: Size) -> Self {
        Self::new(x, y, size.width, size.height)
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Translate so that coordinates are relative to `origin`
    pub fn relative_to(&self, origin: Rect) -> Rect {
        Rect::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    /// Check if this rectangle contains a point
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.x as i64 && x < self.right() && y >= self.y as i64 && y < self.bottom()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// A physical display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Platform display identifier
    pub id: String,
    /// Display bounds in virtual-desktop coordinates
    pub bounds: Rect,
    /// Whether this is the primary display
    #[serde(default)]
    pub primary: bool,
}

/// Kind of capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Individual application window
    Window,
    /// Full screen/display
    Screen,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Window => write!(f, "Window"),
            SourceKind::Screen => write!(f, "Screen"),
        }
    }
}

/// Opaque capture source id
///
/// The platform encodes the kind as a prefix, e.g. `window:4242:0` or
/// `screen:1:0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind carried by the id prefix, if recognised
    pub fn kind(&self) -> Option<SourceKind> {
        match self.0.split(':').next() {
            Some("window") => Some(SourceKind::Window),
            Some("screen") => Some(SourceKind::Screen),
            _ => None,
        }
    }

    /// The platform-specific part after the kind prefix
    /// (`screen:1:0` → `1`)
    pub fn native_id(&self) -> Option<&str> {
        self.0.split(':').nth(1).filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One selectable window or screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSource {
    pub id: SourceId,
    pub display_name: String,
    /// Opaque encoded preview image, only rendered by the picker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CaptureSource {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: SourceId::new(id),
            display_name: display_name.into(),
            thumbnail: None,
        }
    }

    pub fn kind(&self) -> Option<SourceKind> {
        self.id.kind()
    }
}

/// Media device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    Camera,
    Microphone,
}

impl std::fmt::Display for MediaDeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => write!(f, "Camera"),
            Self::Microphone => write!(f, "Microphone"),
        }
    }
}

/// One camera or microphone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceDescriptor {
    pub device_id: String,
    pub kind: MediaDeviceKind,
    #[serde(default)]
    pub label: String,
}

impl MediaDeviceDescriptor {
    pub fn new(device_id: impl Into<String>, kind: MediaDeviceKind, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
            label: label.into(),
        }
    }

    pub fn camera(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(device_id, MediaDeviceKind::Camera, label)
    }

    pub fn microphone(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(device_id, MediaDeviceKind::Microphone, label)
    }

    /// Label to show, falling back to "Camera 2" style names.
    /// `index` is the zero-based position among devices of the same kind.
    pub fn display_label(&self, index: usize) -> String {
        if self.label.is_empty() {
            format!("{} {}", self.kind, index + 1)
        } else {
            self.label.clone()
        }
    }
}

/// A BGRA video frame (4 bytes per pixel, tightly packed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Presentation timestamp in nanoseconds
    pub pts: u64,
}

impl VideoFrame {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// A transparent black frame
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * Self::BYTES_PER_PIXEL],
            pts: 0,
        }
    }

    /// A frame filled with one BGRA color
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * Self::BYTES_PER_PIXEL);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            data,
            pts: 0,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL
    }

    /// BGRA value at a pixel, `None` outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * Self::BYTES_PER_PIXEL;
        self.data
            .get(idx..idx + Self::BYTES_PER_PIXEL)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Whether `data` matches the declared dimensions
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.height as usize * self.stride()
    }
}

/// A block of interleaved f32 audio samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Presentation timestamp in nanoseconds
    pub pts: u64,
}

impl AudioChunk {
    /// Number of samples per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_kind() {
        assert_eq!(SourceId::new("window:4242:0").kind(), Some(SourceKind::Window));
        assert_eq!(SourceId::new("screen:1:0").kind(), Some(SourceKind::Screen));
        assert_eq!(SourceId::new("tab:7").kind(), None);
        assert_eq!(SourceId::new("screen:1:0").native_id(), Some("1"));
    }

    #[test]
    fn test_device_display_label_fallback() {
        let unnamed = MediaDeviceDescriptor::camera("abc", "");
        assert_eq!(unnamed.display_label(1), "Camera 2");
        let named = MediaDeviceDescriptor::microphone("def", "USB Mic");
        assert_eq!(named.display_label(0), "USB Mic");
    }

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(-100, 50, 300, 200);
        assert_eq!(r.right(), 200);
        assert_eq!(r.bottom(), 250);
        assert!(r.contains_point(-100, 50));
        assert!(!r.contains_point(200, 50));
    }

    #[test]
    fn test_solid_frame_pixel() {
        let frame = VideoFrame::solid(4, 2, [1, 2, 3, 255]);
        assert!(frame.is_well_formed());
        assert_eq!(frame.pixel(3, 1), Some([1, 2, 3, 255]));
        assert_eq!(frame.pixel(4, 0), None);
    }
}

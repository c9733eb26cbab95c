//! Orbit Core Library
//!
//! Screen recording with a floating circular camera overlay.
//!
//! This library provides:
//! - The recording session controller and its state machine
//! - A registry for the four UI surfaces (control, picker, camera, outline)
//! - Geometry for keeping floating surfaces glued to their anchors
//! - The capture pipeline that composites the camera onto the screen
//! - A Unix socket bridge to the shell that renders the surfaces
//!
//! # Architecture
//!
//! ```text
//!                 ┌───────────────────┐
//!   intents ─────▶│ SessionController │───▶ SurfaceRegistry ───▶ shell
//!   capture acks ▶│  (one tokio task) │───▶ SourceDirectory
//!                 └─────────┬─────────┘
//!                           │ StartRecording / Stop
//!                           ▼
//!  ┌──────────────┐   ┌──────────────┐   ┌─────────┐   ┌────────────┐
//!  │ MediaDevices │──▶│ compose_frame│──▶│ Encoder │──▶│ SaveTarget │
//!  │ screen + cam │   │ circle crop  │   │         │   │            │
//!  └──────────────┘   └──────────────┘   └─────────┘   └────────────┘
//! ```

pub mod capture;
pub mod config;
pub mod directory;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod ipc;
pub mod platform;
pub mod session;
pub mod surface;
pub mod types;

pub use config::{Container, RecorderConfig};
pub use error::{OrbitError, Result};
pub use session::{ControllerHandle, RecordingState, SessionController};
pub use surface::{SurfaceMessage, SurfaceRole};
pub use types::{CaptureSource, Handle, MediaDeviceDescriptor, Rect, Size, SourceId};

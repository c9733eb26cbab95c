//! Recording session orchestration
//!
//! The [`SessionController`] owns the one [`RecordingSession`] and the
//! [`SurfaceRegistry`](crate::surface::SurfaceRegistry). Everything reaches
//! it as a [`ControllerEvent`] on its channel and it reacts with state
//! transitions, surface commands and a broadcast of [`ControlsView`].
//!
//! ```text
//!   idle ──start──► starting ──camera ready / grace──► recording ◄──► paused
//!                      │                                   │            │
//!                      └───────────── stop ────────────────┴────────────┴──► stopped
//!   (any) ──error──► failed          stopped / failed ──select──► idle (fresh record)
//! ```

mod controller;
mod events;
mod state;

pub use controller::{Collaborators, ControllerHandle, SessionController};
pub use events::{AppSignal, CaptureEvent, ControlIntent, ControllerEvent, FailureKind, SurfaceEvent};
pub use state::{ControlsView, RecordingSession, RecordingState};

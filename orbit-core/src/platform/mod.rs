//! Platform collaborators
//!
//! Interfaces to the parts of the desktop Orbit does not own: native window
//! bounds and display layout, the save dialog and disk writes, and the
//! screen-recording permission. Each has a plain default implementation.

mod bounds;
mod permission;
mod save;

pub use bounds::{
    desktop_bounds, primary_display, resolve_target_bounds, BoundsResolver, FallbackBounds,
    DEFAULT_DESKTOP_SIZE, DEFAULT_TARGET_SIZE,
};
pub use permission::{ensure_screen_access, PermissionGate, ScreenAccess, Ungated, RELAUNCH_HINT};
pub use save::{suggested_file_name, DirectorySaver, SaveTarget};

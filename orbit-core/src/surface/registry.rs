//! Surface registry
//!
//! Owns every live surface by role. The controller never holds a surface
//! directly; it asks the registry to create, place, show, hide and message
//! them. Messages to a surface that does not exist are dropped.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use super::{Surface, SurfaceBackend, SurfaceHandle, SurfaceMessage, SurfaceRole};
use crate::error::Result;
use crate::geometry::{self, RepositionThrottle, DEFAULT_FOLLOW_GAP};
use crate::types::Rect;

/// How a surface is placed relative to an anchor rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// To the right of the anchor, top edges aligned, keeping its own size
    FollowRight { gap: i32 },
    /// Square in the anchor's bottom-right corner
    CornerInset { size: u32, margin: u32 },
}

struct Entry {
    surface: Box<dyn Surface>,
    handle: SurfaceHandle,
}

/// Registry of live surfaces
pub struct SurfaceRegistry {
    backend: Box<dyn SurfaceBackend>,
    surfaces: HashMap<SurfaceRole, Entry>,
    follow: RepositionThrottle,
    follow_gap: i32,
    tray_installed: bool,
}

impl SurfaceRegistry {
    pub fn new(backend: Box<dyn SurfaceBackend>) -> Self {
        Self {
            backend,
            surfaces: HashMap::new(),
            follow: RepositionThrottle::default(),
            follow_gap: DEFAULT_FOLLOW_GAP,
            tray_installed: false,
        }
    }

    /// Set the picker's follow gap and reposition interval
    pub fn with_follow(mut self, gap: i32, interval: Duration) -> Self {
        self.follow_gap = gap;
        self.follow = RepositionThrottle::new(interval);
        self
    }

    /// Whether a live surface exists for `role`
    pub fn exists(&self, role: SurfaceRole) -> bool {
        self.surfaces
            .get(&role)
            .is_some_and(|e| !e.surface.is_destroyed())
    }

    pub fn handle(&self, role: SurfaceRole) -> Option<SurfaceHandle> {
        self.live(role).map(|e| e.handle)
    }

    pub fn bounds(&self, role: SurfaceRole) -> Option<Rect> {
        self.handle(role).map(|h| h.bounds)
    }

    pub fn is_visible(&self, role: SurfaceRole) -> bool {
        self.handle(role).is_some_and(|h| h.visible)
    }

    /// Create the surface for `role` unless it already exists
    pub fn ensure_created(&mut self, role: SurfaceRole) -> Result<()> {
        if self.exists(role) {
            return Ok(());
        }
        // Drop any destroyed leftover before recreating
        self.surfaces.remove(&role);

        let spec = role.spec();
        let surface = self.backend.create(role, &spec)?;
        info!("Created {} surface", role);

        self.surfaces.insert(
            role,
            Entry {
                surface,
                handle: SurfaceHandle {
                    role,
                    bounds: Rect::at(0, 0, spec.size),
                    visible: false,
                },
            },
        );

        if role == SurfaceRole::Picker {
            self.follow.reset(None);
        }
        Ok(())
    }

    /// Create if needed, then show
    pub fn ensure_visible(&mut self, role: SurfaceRole) -> Result<()> {
        self.ensure_created(role)?;
        self.show(role);
        Ok(())
    }

    /// Show an existing surface
    pub fn show(&mut self, role: SurfaceRole) {
        if let Some(entry) = self.live_mut(role) {
            match entry.surface.show() {
                Ok(()) => entry.handle.visible = true,
                Err(e) => warn!("Failed to show {} surface: {}", role, e),
            }
        }
    }

    pub fn hide(&mut self, role: SurfaceRole) {
        if let Some(entry) = self.live_mut(role) {
            if !entry.handle.visible {
                return;
            }
            if let Err(e) = entry.surface.hide() {
                warn!("Failed to hide {} surface: {}", role, e);
            }
            entry.handle.visible = false;
            debug!("Hid {} surface", role);
        }
    }

    pub fn destroy(&mut self, role: SurfaceRole) {
        if let Some(mut entry) = self.surfaces.remove(&role) {
            if !entry.surface.is_destroyed() {
                if let Err(e) = entry.surface.destroy() {
                    warn!("Failed to destroy {} surface: {}", role, e);
                }
            }
            debug!("Destroyed {} surface", role);
        }
    }

    pub fn destroy_all(&mut self) {
        for role in SurfaceRole::ALL {
            self.destroy(role);
        }
    }

    /// Drop a surface the platform already destroyed
    pub fn forget(&mut self, role: SurfaceRole) -> bool {
        self.surfaces.remove(&role).is_some()
    }

    pub fn forget_all(&mut self) {
        self.surfaces.clear();
        self.tray_installed = false;
    }

    /// Deliver a message; returns whether a surface received it
    pub fn send(&mut self, role: SurfaceRole, message: SurfaceMessage) -> bool {
        let Some(entry) = self.live_mut(role) else {
            trace!("Dropping {} for absent {} surface", message.name(), role);
            return false;
        };
        match entry.surface.send(&message) {
            Ok(()) => {
                debug!("Sent {} to {} surface", message.name(), role);
                true
            }
            Err(e) => {
                warn!("Failed to send {} to {} surface: {}", message.name(), role, e);
                false
            }
        }
    }

    /// Move an existing surface; unchanged bounds are skipped
    pub fn position(&mut self, role: SurfaceRole, bounds: Rect) -> Option<Rect> {
        let entry = self.live_mut(role)?;
        if entry.handle.bounds == bounds {
            return None;
        }
        if let Err(e) = entry.surface.set_bounds(bounds) {
            warn!("Failed to position {} surface: {}", role, e);
            return None;
        }
        entry.handle.bounds = bounds;
        trace!("Positioned {} surface at {}", role, bounds);
        Some(bounds)
    }

    /// Place a surface relative to an anchor rectangle
    pub fn position_relative_to(
        &mut self,
        role: SurfaceRole,
        anchor: Rect,
        placement: Placement,
    ) -> Option<Rect> {
        let target = self.placement_target(role, anchor, placement)?;
        let applied = self.position(role, target);
        if role == SurfaceRole::Picker {
            self.follow.reset(self.bounds(role));
        }
        applied
    }

    /// Record that a surface was moved or resized by the user.
    ///
    /// A control panel move drags the picker along, coalesced to one
    /// reposition per interval. Returns how long until
    /// [`flush_follow`](Self::flush_follow) should run, if a reposition is
    /// pending.
    pub fn surface_moved(&mut self, role: SurfaceRole, bounds: Rect, now: Instant) -> Option<Duration> {
        if let Some(entry) = self.live_mut(role) {
            entry.handle.bounds = bounds;
        }
        if role != SurfaceRole::Control || !self.is_visible(SurfaceRole::Picker) {
            return None;
        }

        let target = self.placement_target(
            SurfaceRole::Picker,
            bounds,
            Placement::FollowRight {
                gap: self.follow_gap,
            },
        )?;

        self.follow.offer(target, now)
    }

    /// Apply a coalesced picker reposition. Returns the remaining wait if it
    /// is still too early.
    pub fn flush_follow(&mut self, now: Instant) -> Option<Duration> {
        if !self.follow.has_pending() {
            return None;
        }
        match self.follow.flush(now) {
            Some(rect) => {
                self.position(SurfaceRole::Picker, rect);
                None
            }
            None if self.follow.has_pending() => Some(self.follow.until_flush(now)),
            None => None,
        }
    }

    /// Install the tray icon
    pub fn install_tray(&mut self) -> Result<()> {
        self.backend.install_tray()?;
        self.tray_installed = true;
        info!("Tray installed");
        Ok(())
    }

    pub fn remove_tray(&mut self) {
        if !self.tray_installed {
            return;
        }
        if let Err(e) = self.backend.remove_tray() {
            warn!("Failed to remove tray: {}", e);
        }
        self.tray_installed = false;
    }

    pub fn tray_installed(&self) -> bool {
        self.tray_installed
    }

    fn placement_target(&self, role: SurfaceRole, anchor: Rect, placement: Placement) -> Option<Rect> {
        let current = self.handle(role)?.bounds;
        let target = match placement {
            Placement::FollowRight { gap } => {
                let size = if current.is_empty() {
                    role.spec().size
                } else {
                    current.size()
                };
                geometry::follow_right(anchor, size, gap)
            }
            Placement::CornerInset { size, margin } => geometry::corner_inset(anchor, size, margin),
        };
        Some(target)
    }

    fn live(&self, role: SurfaceRole) -> Option<&Entry> {
        self.surfaces
            .get(&role)
            .filter(|e| !e.surface.is_destroyed())
    }

    fn live_mut(&mut self, role: SurfaceRole) -> Option<&mut Entry> {
        self.surfaces
            .get_mut(&role)
            .filter(|e| !e.surface.is_destroyed())
    }
}

impl std::fmt::Debug for SurfaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handles: Vec<SurfaceHandle> = self.surfaces.values().map(|e| e.handle).collect();
        f.debug_struct("SurfaceRegistry")
            .field("surfaces", &handles)
            .field("tray_installed", &self.tray_installed)
            .finish()
    }
}

//! Target bounds resolution

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::geometry::{centered, union_of_rectangles};
use crate::types::{DisplayInfo, Rect, Size, SourceId, SourceKind};

/// Size of the best-guess rectangle when a source cannot be located
pub const DEFAULT_TARGET_SIZE: Size = Size::new(1280, 720);

/// Desktop assumed when no display is known
pub const DEFAULT_DESKTOP_SIZE: Size = Size::new(1920, 1080);

/// Native window bounds and display layout
#[async_trait]
pub trait BoundsResolver: Send + Sync {
    /// Bounds of a window source, `None` when the platform cannot tell
    async fn window_bounds(&self, id: &SourceId) -> Option<Rect>;

    /// All connected displays
    async fn displays(&self) -> Vec<DisplayInfo>;
}

/// Resolver that knows nothing; every lookup falls back
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackBounds;

#[async_trait]
impl BoundsResolver for FallbackBounds {
    async fn window_bounds(&self, _id: &SourceId) -> Option<Rect> {
        None
    }

    async fn displays(&self) -> Vec<DisplayInfo> {
        Vec::new()
    }
}

/// The primary display, or the first one listed
pub fn primary_display(displays: &[DisplayInfo]) -> Option<&DisplayInfo> {
    displays
        .iter()
        .find(|d| d.primary)
        .or_else(|| displays.first())
}

/// Bounds covering every display, or the default desktop when none is known
pub fn desktop_bounds(displays: &[DisplayInfo]) -> Rect {
    let rects: Vec<Rect> = displays.iter().map(|d| d.bounds).collect();
    union_of_rectangles(&rects).unwrap_or(Rect::at(0, 0, DEFAULT_DESKTOP_SIZE))
}

/// Resolve the on-screen rectangle of a capture source.
///
/// Windows use the native lookup, screens the matching display. Anything
/// unresolved gets a centered best guess on the primary display.
pub async fn resolve_target_bounds(resolver: &dyn BoundsResolver, id: &SourceId) -> Rect {
    let displays = resolver.displays().await;

    let resolved = match id.kind() {
        Some(SourceKind::Window) => resolver.window_bounds(id).await,
        Some(SourceKind::Screen) => {
            let native = id.native_id();
            displays
                .iter()
                .find(|d| Some(d.id.as_str()) == native)
                .map(|d| d.bounds)
        }
        None => None,
    };

    match resolved {
        Some(bounds) if !bounds.is_empty() => {
            debug!("Resolved bounds for {}: {}", id, bounds);
            bounds
        }
        _ => {
            let container = primary_display(&displays)
                .map(|d| d.bounds)
                .unwrap_or(Rect::at(0, 0, DEFAULT_DESKTOP_SIZE));
            let guess = centered(container, DEFAULT_TARGET_SIZE);
            warn!("Could not resolve bounds for {}, using {}", id, guess);
            guess
        }
    }
}

//! Anchoring geometry for floating surfaces
//!
//! Pure functions deriving surface bounds from their anchors, plus the
//! throttle that coalesces anchor-move bursts. Nothing here touches a live
//! surface.

use std::time::{Duration, Instant};

use crate::types::{Rect, Size};

/// Horizontal gap between the control panel and the source picker
pub const DEFAULT_FOLLOW_GAP: i32 = 10;

/// Minimum interval between follower repositions (~60 updates/second)
pub const DEFAULT_FOLLOW_INTERVAL: Duration = Duration::from_millis(16);

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Place a follower to the right of its anchor, top edges aligned.
///
/// The follower keeps its own size.
pub fn follow_right(anchor: Rect, follower: Size, gap: i32) -> Rect {
    Rect::at(clamp_i32(anchor.right() + gap as i64), anchor.y, follower)
}

/// Park a square element in the bottom-right corner of `container`,
/// inset by `margin` on both axes.
///
/// If the container is too small the element is pinned to the container's
/// top-left instead of escaping past it.
pub fn corner_inset(container: Rect, element: u32, margin: u32) -> Rect {
    let x = container.right() - element as i64 - margin as i64;
    let y = container.bottom() - element as i64 - margin as i64;
    Rect::new(
        clamp_i32(x.max(container.x as i64)),
        clamp_i32(y.max(container.y as i64)),
        element,
        element,
    )
}

/// Smallest rectangle covering every input rectangle.
///
/// Returns `None` for an empty input.
pub fn union_of_rectangles(rects: &[Rect]) -> Option<Rect> {
    let first = rects.first()?;
    let (mut left, mut top) = (first.x as i64, first.y as i64);
    let (mut right, mut bottom) = (first.right(), first.bottom());

    for r in &rects[1..] {
        left = left.min(r.x as i64);
        top = top.min(r.y as i64);
        right = right.max(r.right());
        bottom = bottom.max(r.bottom());
    }

    Some(Rect::new(
        clamp_i32(left),
        clamp_i32(top),
        (right - left).clamp(0, u32::MAX as i64) as u32,
        (bottom - top).clamp(0, u32::MAX as i64) as u32,
    ))
}

/// Center a rectangle of `size` inside `container`
pub fn centered(container: Rect, size: Size) -> Rect {
    let x = container.x as i64 + (container.width as i64 - size.width as i64) / 2;
    let y = container.y as i64 + (container.height as i64 - size.height as i64) / 2;
    Rect::at(clamp_i32(x), clamp_i32(y), size)
}

/// Coalesces rapid reposition requests into at most one per interval.
///
/// The first request after a quiet period arms a deadline one interval
/// away. Requests before the deadline replace the single pending rectangle,
/// and [`flush`](Self::flush) applies it once the deadline has passed. A
/// request for the rectangle already applied cancels anything pending.
#[derive(Debug, Clone)]
pub struct RepositionThrottle {
    interval: Duration,
    deadline: Option<Instant>,
    current: Option<Rect>,
    pending: Option<Rect>,
}

impl RepositionThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            current: None,
            pending: None,
        }
    }

    /// Offer a new target rectangle.
    ///
    /// Returns how long until [`flush`](Self::flush) should run, or `None`
    /// if nothing is pending.
    pub fn offer(&mut self, target: Rect, now: Instant) -> Option<Duration> {
        if self.current == Some(target) {
            self.pending = None;
            self.deadline = None;
            return None;
        }

        self.pending = Some(target);
        let deadline = *self.deadline.get_or_insert(now + self.interval);
        Some(deadline.saturating_duration_since(now))
    }

    /// Apply the pending rectangle once its deadline has passed
    pub fn flush(&mut self, now: Instant) -> Option<Rect> {
        let pending = self.pending?;
        if self.deadline.is_some_and(|deadline| now < deadline) {
            return None;
        }
        self.pending = None;
        self.deadline = None;
        self.current = Some(pending);
        Some(pending)
    }

    /// Whether a coalesced rectangle is waiting for [`flush`](Self::flush)
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time until a pending rectangle may be flushed
    pub fn until_flush(&self, now: Instant) -> Duration {
        self.deadline
            .map_or(Duration::ZERO, |deadline| deadline.saturating_duration_since(now))
    }

    /// Forget what was applied, e.g. after the follower was recreated
    pub fn reset(&mut self, current: Option<Rect>) {
        self.current = current;
        self.pending = None;
        self.deadline = None;
    }
}

impl Default for RepositionThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_FOLLOW_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_right_keeps_follower_size() {
        let anchor = Rect::new(100, 200, 400, 500);
        let placed = follow_right(anchor, Size::new(600, 600), DEFAULT_FOLLOW_GAP);
        assert_eq!(placed, Rect::new(510, 200, 600, 600));
    }

    #[test]
    fn test_corner_inset() {
        let placed = corner_inset(Rect::new(0, 0, 1000, 800), 200, 20);
        assert_eq!(placed, Rect::new(780, 580, 200, 200));
    }

    #[test]
    fn test_corner_inset_offset_container() {
        let placed = corner_inset(Rect::new(-1920, 100, 1920, 1080), 200, 20);
        assert_eq!(placed, Rect::new(-220, 960, 200, 200));
    }

    #[test]
    fn test_corner_inset_tiny_container_pins_to_origin() {
        let placed = corner_inset(Rect::new(50, 60, 100, 100), 200, 20);
        assert_eq!(placed, Rect::new(50, 60, 200, 200));
    }

    #[test]
    fn test_union_side_by_side() {
        let rects = [Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1920, 1080)];
        assert_eq!(union_of_rectangles(&rects), Some(Rect::new(0, 0, 3840, 1080)));
    }

    #[test]
    fn test_union_negative_and_stacked() {
        let rects = [
            Rect::new(0, 0, 2560, 1440),
            Rect::new(-1280, 400, 1280, 1024),
            Rect::new(0, 1440, 1920, 1080),
        ];
        assert_eq!(union_of_rectangles(&rects), Some(Rect::new(-1280, 0, 3840, 2520)));
    }

    #[test]
    fn test_union_empty() {
        assert_eq!(union_of_rectangles(&[]), None);
    }

    #[test]
    fn test_centered() {
        let placed = centered(Rect::new(0, 0, 1920, 1080), Size::new(1280, 720));
        assert_eq!(placed, Rect::new(320, 180, 1280, 720));
    }

    #[test]
    fn test_throttle_burst_applies_once() {
        let mut throttle = RepositionThrottle::new(Duration::from_millis(16));
        let start = Instant::now();
        for i in 0..100 {
            let now = start + Duration::from_micros(i * 100);
            let wait = throttle.offer(Rect::new(i as i32, 0, 600, 600), now);
            assert_eq!(wait, Some(Duration::from_millis(16) - Duration::from_micros(i * 100)));
        }

        let mut applied = Vec::new();
        for ms in 0..40 {
            applied.extend(throttle.flush(start + Duration::from_millis(ms)));
        }
        assert_eq!(applied, vec![Rect::new(99, 0, 600, 600)]);
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_throttle_flush_waits_for_deadline() {
        let mut throttle = RepositionThrottle::new(Duration::from_millis(16));
        let start = Instant::now();
        throttle.offer(Rect::new(0, 0, 10, 10), start);
        throttle.offer(Rect::new(5, 0, 10, 10), start + Duration::from_millis(2));
        throttle.offer(Rect::new(9, 0, 10, 10), start + Duration::from_millis(4));

        assert_eq!(throttle.flush(start + Duration::from_millis(8)), None);
        assert_eq!(throttle.until_flush(start + Duration::from_millis(8)), Duration::from_millis(8));
        assert_eq!(
            throttle.flush(start + Duration::from_millis(16)),
            Some(Rect::new(9, 0, 10, 10))
        );
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_throttle_skips_unchanged() {
        let mut throttle = RepositionThrottle::new(Duration::from_millis(16));
        let start = Instant::now();
        let rect = Rect::new(1, 2, 3, 4);
        throttle.offer(rect, start);
        assert_eq!(throttle.flush(start + Duration::from_millis(16)), Some(rect));
        assert_eq!(throttle.offer(rect, start + Duration::from_secs(1)), None);
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_throttle_return_to_current_cancels_pending() {
        let mut throttle = RepositionThrottle::new(Duration::from_millis(16));
        let start = Instant::now();
        throttle.reset(Some(Rect::new(0, 0, 10, 10)));
        assert!(throttle.offer(Rect::new(4, 0, 10, 10), start).is_some());
        assert_eq!(throttle.offer(Rect::new(0, 0, 10, 10), start), None);
        assert_eq!(throttle.flush(start + Duration::from_millis(20)), None);
    }
}

//! Frame composition
//!
//! The camera image is cropped to the overlay's aspect ratio (never
//! stretched), clipped to the circle inscribed in the overlay rectangle and
//! drawn over the screen frame.

use crate::types::{Rect, Size, VideoFrame};

/// Source region of the secondary image, in its own pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Largest centered region of `source` with the aspect ratio of `target`.
///
/// A source wider than the target loses width, centered horizontally;
/// otherwise it loses height, centered vertically.
pub fn crop_to_aspect(source: Size, target: Size) -> CropRect {
    let (sw, sh) = (source.width as f64, source.height as f64);
    if source.is_empty() || target.is_empty() {
        return CropRect {
            x: 0.0,
            y: 0.0,
            width: sw,
            height: sh,
        };
    }

    let target_ratio = target.aspect();
    if source.aspect() > target_ratio {
        let width = sh * target_ratio;
        CropRect {
            x: (sw - width) / 2.0,
            y: 0.0,
            width,
            height: sh,
        }
    } else {
        let height = sw / target_ratio;
        CropRect {
            x: 0.0,
            y: (sh - height) / 2.0,
            width: sw,
            height,
        }
    }
}

/// Map an overlay from target-area coordinates to frame pixels
pub fn scale_overlay(overlay: Rect, target: Size, frame: Size) -> Rect {
    if target.is_empty() || target == frame {
        return overlay;
    }
    let sx = frame.width as f64 / target.width as f64;
    let sy = frame.height as f64 / target.height as f64;
    Rect::new(
        (overlay.x as f64 * sx).round() as i32,
        (overlay.y as f64 * sy).round() as i32,
        (overlay.width as f64 * sx).round() as u32,
        (overlay.height as f64 * sy).round() as u32,
    )
}

/// Draw `secondary` as a circle at `overlay` (frame pixels) over `primary`.
///
/// A missing or malformed secondary leaves the primary untouched.
pub fn compose_frame(primary: &VideoFrame, secondary: Option<&VideoFrame>, overlay: Rect) -> VideoFrame {
    let mut out = primary.clone();

    let Some(camera) = secondary.filter(|f| f.is_well_formed() && !f.size().is_empty()) else {
        return out;
    };
    if overlay.is_empty() || !out.is_well_formed() {
        return out;
    }

    let crop = crop_to_aspect(camera.size(), overlay.size());
    let (w, h) = (overlay.width as f64, overlay.height as f64);
    let radius = w.min(h) / 2.0;
    let (cx, cy) = (w / 2.0, h / 2.0);

    let x0 = (overlay.x as i64).max(0);
    let y0 = (overlay.y as i64).max(0);
    let x1 = overlay.right().min(out.width as i64);
    let y1 = overlay.bottom().min(out.height as i64);

    let bpp = VideoFrame::BYTES_PER_PIXEL;
    let out_stride = out.stride();
    let cam_stride = camera.stride();

    for py in y0..y1 {
        let ly = (py - overlay.y as i64) as f64 + 0.5;
        for px in x0..x1 {
            let lx = (px - overlay.x as i64) as f64 + 0.5;
            let (dx, dy) = (lx - cx, ly - cy);
            if dx * dx + dy * dy > radius * radius {
                continue;
            }

            let sx = ((crop.x + lx * crop.width / w) as u32).min(camera.width - 1) as usize;
            let sy = ((crop.y + ly * crop.height / h) as u32).min(camera.height - 1) as usize;

            let src = sy * cam_stride + sx * bpp;
            let dst = py as usize * out_stride + px as usize * bpp;
            out.data[dst..dst + bpp].copy_from_slice(&camera.data[src..src + bpp]);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [0, 0, 255, 255];
    const BLUE: [u8; 4] = [255, 0, 0, 255];

    #[test]
    fn test_wide_source_crops_width_centered() {
        let crop = crop_to_aspect(Size::new(1920, 1080), Size::square(200));
        assert_eq!(crop.width, 1080.0);
        assert_eq!(crop.height, 1080.0);
        assert_eq!(crop.x, 420.0);
        assert_eq!(crop.y, 0.0);
    }

    #[test]
    fn test_tall_source_crops_height_centered() {
        let crop = crop_to_aspect(Size::new(720, 1280), Size::square(100));
        assert_eq!(crop.width, 720.0);
        assert_eq!(crop.height, 720.0);
        assert_eq!(crop.y, 280.0);
    }

    #[test]
    fn test_scale_overlay_hidpi() {
        let overlay = scale_overlay(
            Rect::new(780, 580, 200, 200),
            Size::new(1000, 800),
            Size::new(2000, 1600),
        );
        assert_eq!(overlay, Rect::new(1560, 1160, 400, 400));
    }

    #[test]
    fn test_compose_draws_circle_only() {
        let screen = VideoFrame::solid(100, 100, BLUE);
        let camera = VideoFrame::solid(160, 90, RED);
        let out = compose_frame(&screen, Some(&camera), Rect::new(40, 40, 40, 40));

        // center of the circle
        assert_eq!(out.pixel(60, 60), Some(RED));
        // overlay corner lies outside the inscribed circle
        assert_eq!(out.pixel(40, 40), Some(BLUE));
        // outside the overlay
        assert_eq!(out.pixel(10, 10), Some(BLUE));
    }

    #[test]
    fn test_compose_clips_to_frame() {
        let screen = VideoFrame::solid(50, 50, BLUE);
        let camera = VideoFrame::solid(10, 10, RED);
        let out = compose_frame(&screen, Some(&camera), Rect::new(30, 30, 40, 40));
        assert!(out.is_well_formed());
        assert_eq!(out.pixel(49, 49), Some(RED));
    }

    #[test]
    fn test_compose_without_camera_is_screen() {
        let screen = VideoFrame::solid(8, 8, BLUE);
        assert_eq!(compose_frame(&screen, None, Rect::new(0, 0, 4, 4)), screen);
    }
}

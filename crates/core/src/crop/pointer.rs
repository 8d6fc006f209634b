//! Pointer coordinate mapping.
//!
//! The crop canvas has an intrinsic pixel buffer that may be rendered on
//! screen at a different size (window scaling, HiDPI). Pointer positions
//! arrive in screen coordinates; the session works in canvas buffer pixels.
//! This module is the pure bridge between the two.

use crate::geometry::Rect;

/// On-screen layout of the crop canvas, captured once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    /// Top-left of the rendered canvas in screen coordinates.
    pub origin_x: f32,
    pub origin_y: f32,
    /// Rendered size in screen coordinates.
    pub rendered_w: f32,
    pub rendered_h: f32,
    /// Intrinsic pixel buffer size.
    pub buffer_w: i32,
    pub buffer_h: i32,
}

impl CanvasLayout {
    pub fn new(
        origin_x: f32,
        origin_y: f32,
        rendered_w: f32,
        rendered_h: f32,
        buffer_w: i32,
        buffer_h: i32,
    ) -> Self {
        Self {
            origin_x,
            origin_y,
            rendered_w,
            rendered_h,
            buffer_w,
            buffer_h,
        }
    }

    /// Maps a screen-space pointer position into canvas buffer pixels.
    ///
    /// Each axis is scaled independently by `buffer / rendered` and rounded
    /// to the nearest integer. Pure function of the position and this layout;
    /// mouse and touch input both arrive here as a single position (the first
    /// touch point stands in for the pointer).
    pub fn map(&self, screen_x: f32, screen_y: f32) -> (i32, i32) {
        let sx = self.buffer_w as f32 / self.rendered_w;
        let sy = self.buffer_h as f32 / self.rendered_h;
        let x = (screen_x - self.origin_x) * sx;
        let y = (screen_y - self.origin_y) * sy;
        (x.round() as i32, y.round() as i32)
    }

    /// True when a screen-space position falls inside the rendered canvas.
    pub fn contains(&self, screen_x: f32, screen_y: f32) -> bool {
        screen_x >= self.origin_x
            && screen_x < self.origin_x + self.rendered_w
            && screen_y >= self.origin_y
            && screen_y < self.origin_y + self.rendered_h
    }

    /// Projects a canvas-space rectangle back onto the screen, for drawing.
    pub fn to_screen(&self, r: &Rect) -> (f32, f32, f32, f32) {
        let sx = self.rendered_w / self.buffer_w as f32;
        let sy = self.rendered_h / self.buffer_h as f32;
        (
            self.origin_x + r.x as f32 * sx,
            self.origin_y + r.y as f32 * sy,
            r.w as f32 * sx,
            r.h as f32 * sy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_layout_maps_one_to_one() {
        let layout = CanvasLayout::new(0.0, 0.0, 800.0, 600.0, 800, 600);
        assert_eq!(layout.map(10.0, 20.0), (10, 20));
    }

    #[test]
    fn offset_and_scaling_are_corrected_per_axis() {
        // Canvas buffer 800x600 rendered at half width, quarter height,
        // offset by (100, 50) on screen.
        let layout = CanvasLayout::new(100.0, 50.0, 400.0, 150.0, 800, 600);
        assert_eq!(layout.map(100.0, 50.0), (0, 0));
        assert_eq!(layout.map(500.0, 200.0), (800, 600));
        assert_eq!(layout.map(300.0, 125.0), (400, 300));
    }

    #[test]
    fn mapping_rounds_to_nearest_pixel() {
        let layout = CanvasLayout::new(0.0, 0.0, 1000.0, 1000.0, 800, 600);
        // 1.25 buffer px per screen px on x: 101 * 0.8 = 80.8 -> 81.
        assert_eq!(layout.map(101.0, 0.0).0, 81);
    }

    #[test]
    fn contains_matches_rendered_bounds() {
        let layout = CanvasLayout::new(100.0, 50.0, 400.0, 150.0, 800, 600);
        assert!(layout.contains(100.0, 50.0));
        assert!(layout.contains(499.0, 199.0));
        assert!(!layout.contains(500.0, 100.0));
        assert!(!layout.contains(99.0, 100.0));
    }
}

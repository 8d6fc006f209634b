//! Rectangle geometry for the crop surface.
//!
//! Everything here operates in display-canvas space: integer pixel
//! coordinates of the scaled-down canvas the user draws on. Mapping to the
//! source image's native resolution happens later, in [`crate::export`].

/// Side length of the square corner handles, in canvas pixels.
pub const HANDLE_SIZE: i32 = 12;

/// An axis-aligned rectangle in display-canvas space.
///
/// The crop engine keeps every stored rectangle clamped to the canvas with
/// `w >= 1` and `h >= 1`; a zero-size rectangle only exists transiently
/// during a drawing drag and is discarded when the drag ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Zero-size rectangle anchored at a drag start point.
    pub fn at_point(x: i32, y: i32) -> Self {
        Self { x, y, w: 0, h: 0 }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Point-in-rectangle test, edges inclusive.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// True when the rectangle has no area along either axis.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Rectangle spanned between a fixed start point and the current pointer
    /// position, in any drag direction.
    pub fn spanning(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            w: (x1 - x0).abs(),
            h: (y1 - y0).abs(),
        }
    }

    /// Constrains the rectangle to the canvas.
    ///
    /// A negative origin is folded into the size, overflow past the far edge
    /// is trimmed, and the size is floored at 1x1 so a rectangle never
    /// collapses mid-drag. Only the end-of-drag check in the session discards
    /// zero-size selections.
    pub fn clamp_to(&mut self, canvas_w: i32, canvas_h: i32) {
        if self.x < 0 {
            self.w += self.x;
            self.x = 0;
        }
        if self.y < 0 {
            self.h += self.y;
            self.y = 0;
        }
        if self.x + self.w > canvas_w {
            self.w = canvas_w - self.x;
        }
        if self.y + self.h > canvas_h {
            self.h = canvas_h - self.y;
        }
        if self.w < 1 {
            self.w = 1;
        }
        if self.h < 1 {
            self.h = 1;
        }
    }
}

/// How one axis of a rectangle responds to a corner handle drag.
///
/// `Leading` means the near edge follows the pointer (origin and size both
/// adjust); `Trailing` means the far edge follows (size only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeRule {
    Leading,
    Trailing,
}

impl EdgeRule {
    fn apply(self, pos: i32, len: i32, delta: i32) -> (i32, i32) {
        match self {
            EdgeRule::Leading => (pos + delta, len - delta),
            EdgeRule::Trailing => (pos, len + delta),
        }
    }
}

/// Normalize a possibly negative extent by flipping it across its origin.
///
/// This is what lets a handle be dragged through the opposite edge: the
/// rectangle inverts its orientation instead of clamping at zero.
fn normalize_extent(pos: i32, len: i32) -> (i32, i32) {
    if len < 0 { (pos + len, -len) } else { (pos, len) }
}

/// A corner resize handle.
///
/// Indices follow the drawing order: top-left 0, top-right 1, bottom-right 2,
/// bottom-left 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Handle {
    pub const ALL: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
    ];

    pub fn index(self) -> usize {
        match self {
            Handle::TopLeft => 0,
            Handle::TopRight => 1,
            Handle::BottomRight => 2,
            Handle::BottomLeft => 3,
        }
    }

    /// Canvas position of the corner this handle sits on.
    pub fn corner(self, r: &Rect) -> (i32, i32) {
        match self {
            Handle::TopLeft => (r.x, r.y),
            Handle::TopRight => (r.right(), r.y),
            Handle::BottomRight => (r.right(), r.bottom()),
            Handle::BottomLeft => (r.x, r.bottom()),
        }
    }

    /// The fixed-size square hit-box centered on this handle's corner.
    pub fn hit_box(self, r: &Rect) -> Rect {
        let (cx, cy) = self.corner(r);
        let half = HANDLE_SIZE / 2;
        Rect::new(cx - half, cy - half, HANDLE_SIZE, HANDLE_SIZE)
    }

    /// Returns the handle whose hit-box contains the point, if any.
    ///
    /// Handle hit-testing takes priority over the move and new-selection
    /// hit-tests, so callers check this first.
    pub fn at_point(r: &Rect, px: i32, py: i32) -> Option<Handle> {
        Handle::ALL
            .into_iter()
            .find(|h| h.hit_box(r).contains(px, py))
    }

    /// Per-axis edge rules for this corner (x rule, y rule).
    fn rules(self) -> (EdgeRule, EdgeRule) {
        match self {
            Handle::TopLeft => (EdgeRule::Leading, EdgeRule::Leading),
            Handle::TopRight => (EdgeRule::Trailing, EdgeRule::Leading),
            Handle::BottomRight => (EdgeRule::Trailing, EdgeRule::Trailing),
            Handle::BottomLeft => (EdgeRule::Leading, EdgeRule::Trailing),
        }
    }

    /// Applies a pointer delta to the drag-origin rectangle.
    ///
    /// Each corner moves exactly one edge per axis; the opposite edges stay
    /// where the origin snapshot put them. Negative extents are flipped so
    /// the result is always geometrically consistent. The caller clamps.
    pub fn resize(self, origin: &Rect, dx: i32, dy: i32) -> Rect {
        let (rule_x, rule_y) = self.rules();
        let (x, w) = rule_x.apply(origin.x, origin.w, dx);
        let (y, h) = rule_y.apply(origin.y, origin.h, dy);
        let (x, w) = normalize_extent(x, w);
        let (y, h) = normalize_extent(y, h);
        Rect::new(x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_edge_inclusive() {
        let r = Rect::new(10, 10, 20, 20);
        assert!(r.contains(10, 10));
        assert!(r.contains(30, 30));
        assert!(!r.contains(31, 30));
        assert!(!r.contains(9, 15));
    }

    #[test]
    fn clamp_folds_negative_origin_into_size() {
        let mut r = Rect::new(-10, -5, 50, 40);
        r.clamp_to(800, 600);
        assert_eq!(r, Rect::new(0, 0, 40, 35));
    }

    #[test]
    fn clamp_trims_overflow_and_floors_size() {
        let mut r = Rect::new(780, 590, 50, 40);
        r.clamp_to(800, 600);
        assert_eq!(r, Rect::new(780, 590, 20, 10));

        let mut tiny = Rect::new(100, 100, 0, 0);
        tiny.clamp_to(800, 600);
        assert_eq!(tiny, Rect::new(100, 100, 1, 1));
    }

    #[test]
    fn clamp_invariant_holds_for_in_canvas_rects() {
        let cases = [
            Rect::new(-30, 20, 100, 100),
            Rect::new(750, 550, 200, 200),
            Rect::new(0, 0, 800, 600),
            Rect::new(400, 300, 0, 0),
        ];
        for mut r in cases {
            r.clamp_to(800, 600);
            assert!(r.x >= 0 && r.y >= 0, "{r:?}");
            assert!(r.right() <= 800 && r.bottom() <= 600, "{r:?}");
            assert!(r.w >= 1 && r.h >= 1, "{r:?}");
        }
    }

    #[test]
    fn handle_hit_boxes_are_centered_squares() {
        let r = Rect::new(100, 100, 200, 150);
        let hb = Handle::TopLeft.hit_box(&r);
        assert_eq!(hb, Rect::new(94, 94, 12, 12));
        let hb = Handle::BottomRight.hit_box(&r);
        assert_eq!(hb, Rect::new(294, 244, 12, 12));
    }

    #[test]
    fn handle_hit_test_finds_each_corner() {
        let r = Rect::new(100, 100, 200, 150);
        assert_eq!(Handle::at_point(&r, 100, 100), Some(Handle::TopLeft));
        assert_eq!(Handle::at_point(&r, 300, 100), Some(Handle::TopRight));
        assert_eq!(Handle::at_point(&r, 300, 250), Some(Handle::BottomRight));
        assert_eq!(Handle::at_point(&r, 100, 250), Some(Handle::BottomLeft));
        assert_eq!(Handle::at_point(&r, 200, 175), None);
    }

    #[test]
    fn corner_resize_moves_the_right_edges() {
        let origin = Rect::new(100, 100, 200, 150);

        // Top-left adjusts both origin coordinates and both sizes.
        let r = Handle::TopLeft.resize(&origin, 10, -5);
        assert_eq!(r, Rect::new(110, 95, 190, 155));

        // Bottom-right only grows the sizes.
        let r = Handle::BottomRight.resize(&origin, 10, -5);
        assert_eq!(r, Rect::new(100, 100, 210, 145));

        let r = Handle::TopRight.resize(&origin, 10, -5);
        assert_eq!(r, Rect::new(100, 95, 210, 155));

        let r = Handle::BottomLeft.resize(&origin, 10, -5);
        assert_eq!(r, Rect::new(110, 100, 190, 145));
    }

    #[test]
    fn resize_round_trips_with_opposite_delta() {
        let origin = Rect::new(100, 100, 200, 150);
        for h in Handle::ALL {
            let moved = h.resize(&origin, 37, -21);
            let back = h.resize(&moved, -37, 21);
            assert_eq!(back, origin, "{h:?}");
        }
    }

    #[test]
    fn dragging_through_the_opposite_corner_flips() {
        let origin = Rect::new(100, 100, 50, 40);
        // Pull the bottom-right corner 80px left and 60px up, past top-left.
        let r = Handle::BottomRight.resize(&origin, -80, -60);
        assert_eq!(r, Rect::new(70, 80, 30, 20));

        // Pull the top-left corner past bottom-right.
        let r = Handle::TopLeft.resize(&origin, 70, 60);
        assert_eq!(r, Rect::new(150, 140, 20, 20));
    }

    #[test]
    fn spanning_orders_any_drag_direction() {
        assert_eq!(Rect::spanning(50, 50, 150, 120), Rect::new(50, 50, 100, 70));
        assert_eq!(Rect::spanning(150, 120, 50, 50), Rect::new(50, 50, 100, 70));
    }
}

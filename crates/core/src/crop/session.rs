//! Crop selection state machine.
//!
//! A [`CropSession`] owns the selection rectangle and the interaction mode
//! for one loaded image. All mutation goes through the pointer lifecycle
//! methods; the render pipeline only reads. Opening a new image replaces the
//! session wholesale, so no selection state survives an image swap.

use crate::error::{AppError, Result};
use crate::export::{self, SamplingRect};
use crate::geometry::{Handle, Rect};

use super::units::{self, Resolution};

/// What the active drag, if any, is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    DrawingNew,
    Moving,
    Resizing(Handle),
}

/// Cursor affordance for the position under an idle pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    /// Over the top-left or bottom-right handle.
    ResizeNwSe,
    /// Over the top-right or bottom-left handle.
    ResizeNeSw,
    /// Inside the selection, not on a handle.
    Move,
    /// Anywhere else: a drag would start a new selection.
    Crosshair,
}

/// Snapshot taken at drag start; live values are always derived from it.
///
/// Deriving from the snapshot plus the total pointer delta (instead of
/// accumulating per-event deltas) keeps long drags drift-free.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    start_x: i32,
    start_y: i32,
    origin: Rect,
}

/// Interactive crop state for one loaded image.
pub struct CropSession {
    canvas_w: i32,
    canvas_h: i32,
    scale: f64,
    rect: Option<Rect>,
    mode: Mode,
    drag: Option<DragSession>,
}

impl CropSession {
    /// Opens a crop session for an image with the given native dimensions.
    ///
    /// The canvas is sized to fit the `max_w` x `max_h` viewport budget while
    /// preserving the image's aspect ratio exactly; the display-to-source
    /// scale factor is fixed here for the session's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] for degenerate (zero-dimension) images.
    pub fn open(native_w: u32, native_h: u32, max_w: i32, max_h: i32) -> Result<Self> {
        if native_w == 0 || native_h == 0 {
            return Err(AppError::decode(format!(
                "Image has degenerate dimensions {native_w}x{native_h}"
            )));
        }

        let ratio = native_w as f64 / native_h as f64;
        let mut cw = native_w as f64;
        let mut ch = native_h as f64;
        if cw > max_w as f64 {
            cw = max_w as f64;
            ch = (cw / ratio).round();
        }
        if ch > max_h as f64 {
            ch = max_h as f64;
            cw = (ch * ratio).round();
        }
        let canvas_w = (cw as i32).max(1);
        let canvas_h = (ch as i32).max(1);

        Ok(Self {
            canvas_w,
            canvas_h,
            scale: native_w as f64 / canvas_w as f64,
            rect: None,
            mode: Mode::Idle,
            drag: None,
        })
    }

    pub fn canvas_size(&self) -> (i32, i32) {
        (self.canvas_w, self.canvas_h)
    }

    /// Display-to-source scale factor for this session.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rect(&self) -> Option<&Rect> {
        self.rect.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts an interaction at a canvas-space position.
    ///
    /// Handle hit-testing wins over the move test, which wins over starting
    /// a new selection.
    pub fn pointer_down(&mut self, x: i32, y: i32) {
        if self.drag.is_some() {
            return;
        }

        if let Some(rect) = self.rect {
            if let Some(handle) = Handle::at_point(&rect, x, y) {
                self.mode = Mode::Resizing(handle);
                self.drag = Some(DragSession {
                    start_x: x,
                    start_y: y,
                    origin: rect,
                });
                return;
            }
            if rect.contains(x, y) {
                self.mode = Mode::Moving;
                self.drag = Some(DragSession {
                    start_x: x,
                    start_y: y,
                    origin: rect,
                });
                return;
            }
        }

        let rect = Rect::at_point(x, y);
        self.mode = Mode::DrawingNew;
        self.drag = Some(DragSession {
            start_x: x,
            start_y: y,
            origin: rect,
        });
        self.rect = Some(rect);
    }

    /// Updates the selection from the current pointer position.
    ///
    /// The next rectangle is recomputed from the drag-origin snapshot and the
    /// total delta, then clamped to the canvas. A no-op outside a drag.
    pub fn pointer_move(&mut self, x: i32, y: i32) {
        let Some(drag) = self.drag else {
            return;
        };
        let dx = x - drag.start_x;
        let dy = y - drag.start_y;

        let mut next = match self.mode {
            Mode::Moving => {
                let mut r = drag.origin;
                r.x = drag.origin.x + dx;
                r.y = drag.origin.y + dy;
                r
            }
            Mode::Resizing(handle) => handle.resize(&drag.origin, dx, dy),
            Mode::DrawingNew => Rect::spanning(drag.start_x, drag.start_y, x, y),
            Mode::Idle => return,
        };
        next.clamp_to(self.canvas_w, self.canvas_h);
        self.rect = Some(next);
    }

    /// Ends the interaction: pointer release, or the pointer leaving the
    /// canvas while held.
    ///
    /// A selection that never gained area (a click without a drag) is
    /// discarded here; this is the only place a rectangle is dropped.
    pub fn pointer_up(&mut self) {
        self.drag = None;
        self.mode = Mode::Idle;
        if self.rect.is_some_and(|r| r.is_empty()) {
            self.rect = None;
        }
    }

    /// Cursor affordance for an idle pointer at a canvas-space position.
    pub fn cursor_hint(&self, x: i32, y: i32) -> CursorHint {
        if let Some(rect) = self.rect {
            if let Some(handle) = Handle::at_point(&rect, x, y) {
                return match handle {
                    Handle::TopLeft | Handle::BottomRight => CursorHint::ResizeNwSe,
                    Handle::TopRight | Handle::BottomLeft => CursorHint::ResizeNeSw,
                };
            }
            if rect.contains(x, y) {
                return CursorHint::Move;
            }
        }
        CursorHint::Crosshair
    }

    /// Physical size of the current selection at source scale, in mm.
    ///
    /// `None` when there is no selection; the readout shows a placeholder.
    pub fn physical_size_mm(&self, dpi: Resolution) -> Option<(f64, f64)> {
        self.rect.map(|r| {
            (
                units::scaled_extent_mm(r.w, self.scale, dpi),
                units::scaled_extent_mm(r.h, self.scale, dpi),
            )
        })
    }

    /// Commits the selection, producing the source-space sampling rectangle.
    ///
    /// # Errors
    ///
    /// [`AppError::InputMissing`] when no selection exists;
    /// [`AppError::InvalidSelection`] when the scaled rectangle is empty.
    pub fn commit(&self) -> Result<SamplingRect> {
        let rect = self.rect.ok_or(AppError::InputMissing)?;
        export::source_rect(&rect, self.scale)
    }

    /// Drops the selection and any in-flight drag.
    pub fn reset(&mut self) {
        self.rect = None;
        self.mode = Mode::Idle;
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_800x600() -> CropSession {
        // Native 3200x2400 against a 1000x800 budget fits as 1000x750;
        // use a 800x600 budget to get a round 800x600 canvas at scale 4.
        CropSession::open(3200, 2400, 800, 600).unwrap()
    }

    fn draw_rect(session: &mut CropSession, x0: i32, y0: i32, x1: i32, y1: i32) {
        session.pointer_down(x0, y0);
        session.pointer_move(x1, y1);
        session.pointer_up();
    }

    #[test]
    fn open_fits_canvas_to_viewport_budget() {
        let s = CropSession::open(3200, 2400, 1000, 800).unwrap();
        assert_eq!(s.canvas_size(), (1000, 750));
        assert!((s.scale() - 3.2).abs() < 1e-9);

        // Small images are displayed one-to-one.
        let s = CropSession::open(640, 480, 1000, 800).unwrap();
        assert_eq!(s.canvas_size(), (640, 480));
        assert_eq!(s.scale(), 1.0);

        // A tall image is constrained by the height budget.
        let s = CropSession::open(1000, 4000, 1000, 800).unwrap();
        assert_eq!(s.canvas_size(), (200, 800));
        assert_eq!(s.scale(), 5.0);
    }

    #[test]
    fn open_rejects_degenerate_images() {
        assert!(matches!(
            CropSession::open(0, 2400, 1000, 800),
            Err(AppError::Decode(_))
        ));
        assert!(matches!(
            CropSession::open(3200, 0, 1000, 800),
            Err(AppError::Decode(_))
        ));
    }

    #[test]
    fn drawing_a_new_selection_spans_start_to_end() {
        let mut s = session_800x600();
        s.pointer_down(50, 50);
        assert_eq!(s.mode(), Mode::DrawingNew);
        s.pointer_move(150, 120);
        assert_eq!(s.rect(), Some(&Rect::new(50, 50, 100, 70)));
        s.pointer_up();
        assert_eq!(s.mode(), Mode::Idle);
        assert_eq!(s.rect(), Some(&Rect::new(50, 50, 100, 70)));
    }

    #[test]
    fn drawing_backwards_produces_the_same_rect() {
        let mut s = session_800x600();
        draw_rect(&mut s, 150, 120, 50, 50);
        assert_eq!(s.rect(), Some(&Rect::new(50, 50, 100, 70)));
    }

    #[test]
    fn click_without_drag_leaves_no_selection() {
        let mut s = session_800x600();
        s.pointer_down(400, 300);
        s.pointer_up();
        assert_eq!(s.rect(), None);
        assert!(matches!(s.commit(), Err(AppError::InputMissing)));
    }

    #[test]
    fn starting_inside_the_selection_moves_it() {
        let mut s = session_800x600();
        draw_rect(&mut s, 100, 100, 300, 250);

        s.pointer_down(200, 175);
        assert_eq!(s.mode(), Mode::Moving);
        s.pointer_move(230, 215);
        assert_eq!(s.rect(), Some(&Rect::new(130, 140, 200, 150)));

        // Returning to the start restores the origin exactly: no drift.
        s.pointer_move(200, 175);
        assert_eq!(s.rect(), Some(&Rect::new(100, 100, 200, 150)));
        s.pointer_up();
    }

    #[test]
    fn moving_against_a_wall_shrinks_then_recovers() {
        let mut s = session_800x600();
        draw_rect(&mut s, 100, 100, 300, 250);

        s.pointer_down(200, 175);
        // Push 150 px past the left edge: origin folds into the width.
        s.pointer_move(50, 175);
        assert_eq!(s.rect(), Some(&Rect::new(0, 100, 150, 150)));
        // Recomputing from the origin snapshot restores the full width.
        s.pointer_move(200, 175);
        assert_eq!(s.rect(), Some(&Rect::new(100, 100, 200, 150)));
        s.pointer_up();
    }

    #[test]
    fn handle_hit_takes_priority_over_move() {
        let mut s = session_800x600();
        draw_rect(&mut s, 100, 100, 300, 250);

        // The corner point is inside the rect too, but the handle wins.
        s.pointer_down(100, 100);
        assert_eq!(s.mode(), Mode::Resizing(Handle::TopLeft));
        s.pointer_up();
    }

    #[test]
    fn corner_resize_and_reverse_round_trips() {
        let mut s = session_800x600();
        draw_rect(&mut s, 100, 100, 300, 250);

        s.pointer_down(300, 250);
        assert_eq!(s.mode(), Mode::Resizing(Handle::BottomRight));
        s.pointer_move(340, 220);
        assert_eq!(s.rect(), Some(&Rect::new(100, 100, 240, 120)));
        s.pointer_move(300, 250);
        assert_eq!(s.rect(), Some(&Rect::new(100, 100, 200, 150)));
        s.pointer_up();
    }

    #[test]
    fn resizing_through_the_opposite_corner_flips_orientation() {
        let mut s = session_800x600();
        draw_rect(&mut s, 100, 100, 150, 140);

        s.pointer_down(150, 140);
        s.pointer_move(70, 60);
        // Bottom-right dragged past top-left; the rect flips, stays valid.
        assert_eq!(s.rect(), Some(&Rect::new(70, 60, 30, 40)));
        s.pointer_up();
    }

    #[test]
    fn resize_clamps_to_canvas_bounds() {
        let mut s = session_800x600();
        draw_rect(&mut s, 600, 400, 750, 550);

        s.pointer_down(750, 550);
        s.pointer_move(900, 700);
        assert_eq!(s.rect(), Some(&Rect::new(600, 400, 200, 200)));
        s.pointer_up();
    }

    #[test]
    fn pointer_up_mid_draw_discards_only_zero_size() {
        let mut s = session_800x600();
        s.pointer_down(10, 10);
        s.pointer_move(10, 60);
        // Width clamps to the 1 px floor mid-drag, so the drag survives.
        assert_eq!(s.rect(), Some(&Rect::new(10, 10, 1, 50)));
        s.pointer_up();
        assert!(s.rect().is_some());
    }

    #[test]
    fn commit_scales_the_selection_to_source_space() {
        let mut s = session_800x600();
        draw_rect(&mut s, 100, 100, 300, 250);
        let sampled = s.commit().unwrap();
        assert_eq!((sampled.x, sampled.y), (400, 400));
        assert_eq!((sampled.w, sampled.h), (800, 600));
    }

    #[test]
    fn physical_readout_follows_the_selection() {
        let mut s = session_800x600();
        assert_eq!(s.physical_size_mm(Resolution::default()), None);

        draw_rect(&mut s, 100, 100, 400, 250);
        // 300 display px * 4 = 1200 source px -> 101.6 mm at 300 dpi.
        let (w_mm, h_mm) = s.physical_size_mm(Resolution::default()).unwrap();
        assert_eq!(w_mm, 101.6);
        assert_eq!(h_mm, 50.8);
    }

    #[test]
    fn cursor_hints_reflect_affordances() {
        let mut s = session_800x600();
        assert_eq!(s.cursor_hint(400, 300), CursorHint::Crosshair);

        draw_rect(&mut s, 100, 100, 300, 250);
        assert_eq!(s.cursor_hint(100, 100), CursorHint::ResizeNwSe);
        assert_eq!(s.cursor_hint(300, 250), CursorHint::ResizeNwSe);
        assert_eq!(s.cursor_hint(300, 100), CursorHint::ResizeNeSw);
        assert_eq!(s.cursor_hint(100, 250), CursorHint::ResizeNeSw);
        assert_eq!(s.cursor_hint(200, 175), CursorHint::Move);
        assert_eq!(s.cursor_hint(500, 500), CursorHint::Crosshair);
    }

    #[test]
    fn reset_clears_selection_and_drag() {
        let mut s = session_800x600();
        draw_rect(&mut s, 100, 100, 300, 250);
        s.pointer_down(200, 175);
        s.reset();
        assert_eq!(s.rect(), None);
        assert_eq!(s.mode(), Mode::Idle);
        assert!(!s.is_dragging());
    }
}

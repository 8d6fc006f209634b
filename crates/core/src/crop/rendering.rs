//! Overlay rendering for the crop surface.
//!
//! This module contains reusable drawing functions for the crop tool UI:
//! the dimmed mask around the selection, the dashed outline and the corner
//! handles. Everything here only reads selection state.

use crate::geometry::{HANDLE_SIZE, Handle, Rect};

use super::pointer::CanvasLayout;
use eframe::egui;

/// Darkness of the mask outside the selection (0-255).
pub const MASK_ALPHA: u8 = 90;

const DASH_LENGTH: f32 = 6.0;
const GAP_LENGTH: f32 = 4.0;

/// Converts a canvas-space selection rectangle to its on-screen rectangle.
pub fn selection_on_screen(layout: &CanvasLayout, rect: &Rect) -> egui::Rect {
    let (x, y, w, h) = layout.to_screen(rect);
    egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(w, h))
}

/// Draws the dark mask with a transparent "hole" over the selection.
///
/// The canvas outside the selection is dimmed with four rectangles (above,
/// below, left, right), leaving the selected region untouched.
///
/// # Arguments
/// * `painter` - The egui painter to draw with
/// * `canvas` - The full canvas rectangle on screen
/// * `selection` - The selected area to keep clear
/// * `alpha` - Darkness level (0-255, higher = darker)
pub fn draw_mask(
    painter: &egui::Painter,
    canvas: egui::Rect,
    selection: egui::Rect,
    alpha: u8,
) {
    let color = egui::Color32::from_black_alpha(alpha);

    // Top region (above selection)
    painter.rect_filled(
        egui::Rect::from_min_max(canvas.min, egui::pos2(canvas.max.x, selection.min.y)),
        0.0,
        color,
    );

    // Bottom region (below selection)
    painter.rect_filled(
        egui::Rect::from_min_max(egui::pos2(canvas.min.x, selection.max.y), canvas.max),
        0.0,
        color,
    );

    // Left region (left of selection, between top and bottom)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(canvas.min.x, selection.min.y),
            egui::pos2(selection.min.x, selection.max.y),
        ),
        0.0,
        color,
    );

    // Right region (right of selection, between top and bottom)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(selection.max.x, selection.min.y),
            egui::pos2(canvas.max.x, selection.max.y),
        ),
        0.0,
        color,
    );
}

/// Strokes the dashed outline just inside the selection edge.
pub fn draw_outline(painter: &egui::Painter, selection: egui::Rect) {
    let stroke = egui::Stroke::new(2.0, egui::Color32::WHITE);
    let r = selection.shrink(1.0);
    let corners = [
        r.left_top(),
        r.right_top(),
        r.right_bottom(),
        r.left_bottom(),
        r.left_top(),
    ];
    for edge in corners.windows(2) {
        painter.extend(egui::Shape::dashed_line(
            edge,
            stroke,
            DASH_LENGTH,
            GAP_LENGTH,
        ));
    }
}

/// Draws the four square resize handles centered on the selection corners.
pub fn draw_handles(painter: &egui::Painter, layout: &CanvasLayout, rect: &Rect) {
    let fill = egui::Color32::WHITE;
    let stroke = egui::Stroke::new(1.0, egui::Color32::from_black_alpha(115));
    let size = egui::vec2(HANDLE_SIZE as f32, HANDLE_SIZE as f32);

    for handle in Handle::ALL {
        let (cx, cy) = handle.corner(rect);
        let (sx, sy, _, _) = layout.to_screen(&Rect::at_point(cx, cy));
        let hit = egui::Rect::from_center_size(egui::pos2(sx, sy), size);
        painter.rect_filled(hit, 0.0, fill);
        painter.rect_stroke(hit, 0.0, stroke, egui::StrokeKind::Middle);
    }
}

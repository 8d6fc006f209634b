//! Crop export: scale correction and full-resolution extraction.
//!
//! The interactive session works on a scaled-down display canvas. Exporting
//! a crop means translating the committed display-space rectangle into the
//! source image's native coordinate system and sampling exactly that region.
//!
//! # Coordinate Mapping
//!
//! The display canvas is sized to fit a viewport budget, so a single scale
//! factor (native width / canvas width) converts display coordinates to
//! source coordinates. The factor is computed once per image load and stays
//! fixed for the whole crop session.

use crate::error::{AppError, Result};
use crate::geometry::Rect;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// A sampling rectangle in source-space (native resolution) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Scales a committed display-space rectangle up to source space.
///
/// Each component is rounded independently: `s = round(display * scale)`.
///
/// # Errors
///
/// Returns [`AppError::InvalidSelection`] if the scaled rectangle has
/// non-positive width or height.
pub fn source_rect(rect: &Rect, scale: f64) -> Result<SamplingRect> {
    let sx = (rect.x as f64 * scale).round() as i64;
    let sy = (rect.y as f64 * scale).round() as i64;
    let sw = (rect.w as f64 * scale).round() as i64;
    let sh = (rect.h as f64 * scale).round() as i64;

    if sw <= 0 || sh <= 0 {
        return Err(AppError::InvalidSelection);
    }

    Ok(SamplingRect {
        x: sx.max(0) as u32,
        y: sy.max(0) as u32,
        w: sw as u32,
        h: sh as u32,
    })
}

/// Samples the region from the full-resolution image and encodes it as PNG.
///
/// The sampling rectangle is clamped to the image bounds before cropping so
/// rounding at the far edge can never read out of range.
///
/// # Errors
///
/// Returns [`AppError::InvalidSelection`] if the clamped region is empty and
/// [`AppError::Decode`] if PNG encoding fails.
pub fn extract_png(original: &DynamicImage, region: &SamplingRect) -> Result<Vec<u8>> {
    let mut w = region.w;
    let mut h = region.h;

    if region.x.saturating_add(w) > original.width() {
        w = original.width().saturating_sub(region.x);
    }
    if region.y.saturating_add(h) > original.height() {
        h = original.height().saturating_sub(region.y);
    }

    if w == 0 || h == 0 {
        return Err(AppError::InvalidSelection);
    }

    let cropped = original.crop_imm(region.x, region.y, w, h);

    let mut buffer: Vec<u8> = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    cropped
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| AppError::decode(format!("Failed to encode crop: {e}")))?;

    Ok(buffer)
}

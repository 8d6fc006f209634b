//! Pixel to physical-length conversion for the size readout.

use serde::{Deserialize, Serialize};

/// Fallback print density when the user input is missing or invalid.
pub const DEFAULT_DPI: u32 = 300;

const MM_PER_INCH: f64 = 25.4;

/// Linear pixel density (pixels per inch) used for the physical-size readout.
///
/// Always positive; any non-positive or unparsable input falls back to
/// [`DEFAULT_DPI`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resolution(u32);

impl Resolution {
    pub fn new(dpi: i64) -> Self {
        if dpi > 0 {
            Self(dpi as u32)
        } else {
            Self(DEFAULT_DPI)
        }
    }

    /// Parses user input, falling back to the default on garbage.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(v) => Self::new(v),
            Err(_) => Self(DEFAULT_DPI),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self(DEFAULT_DPI)
    }
}

/// Converts a pixel extent at source scale to millimeters, one decimal.
pub fn pixels_to_mm(pixels: i64, dpi: Resolution) -> f64 {
    let mm = pixels as f64 / dpi.get() as f64 * MM_PER_INCH;
    (mm * 10.0).round() / 10.0
}

/// Physical size of a display-space extent once scaled to the source image.
///
/// The extent is first converted to source pixels (`round(len * scale)`),
/// then to millimeters at the given density.
pub fn scaled_extent_mm(display_len: i32, scale: f64, dpi: Resolution) -> f64 {
    let source_px = (display_len as f64 * scale).round() as i64;
    pixels_to_mm(source_px, dpi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_input_falls_back_to_default() {
        assert_eq!(Resolution::new(0).get(), 300);
        assert_eq!(Resolution::new(-72).get(), 300);
        assert_eq!(Resolution::new(600).get(), 600);
    }

    #[test]
    fn parse_tolerates_garbage() {
        assert_eq!(Resolution::parse("150").get(), 150);
        assert_eq!(Resolution::parse(" 96 ").get(), 96);
        assert_eq!(Resolution::parse("dpi").get(), 300);
        assert_eq!(Resolution::parse("").get(), 300);
        assert_eq!(Resolution::parse("-5").get(), 300);
    }

    #[test]
    fn twelve_hundred_pixels_at_300_dpi_is_101_6_mm() {
        assert_eq!(pixels_to_mm(1200, Resolution::new(300)), 101.6);
    }

    #[test]
    fn display_extent_is_scaled_before_conversion() {
        // 300 display px at scale 4 = 1200 source px.
        assert_eq!(scaled_extent_mm(300, 4.0, Resolution::new(300)), 101.6);
    }

    #[test]
    fn readout_rounds_to_one_decimal() {
        // 1000 px / 300 dpi * 25.4 = 84.666... -> 84.7
        assert_eq!(pixels_to_mm(1000, Resolution::new(300)), 84.7);
    }
}

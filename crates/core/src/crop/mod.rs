//! Interactive crop surface.
//!
//! This module provides the crop window for selecting a region of a photo
//! and saving it at native resolution.
//!
//! # Architecture
//!
//! The surface is split into focused submodules:
//! - [`session`]: the crop rectangle state machine
//! - [`pointer`]: screen-to-canvas coordinate mapping
//! - [`units`]: pixel to physical-length conversion
//! - [`settings`]: user preferences and persistence
//! - `rendering`: drawing of the mask, outline and handles
//! - `state`: UI state machine and worker event definitions
//! - `app`: the eframe application
//!
//! # Usage
//!
//! ```ignore
//! use snapcrop_core::crop;
//!
//! let receipt = crop::run_crop_ui(decoded, store, settings, None)?;
//! if let Some(receipt) = receipt {
//!     println!("saved {}", receipt.filename);
//! }
//! ```

mod app;
pub mod pointer;
mod rendering;
pub mod session;
mod settings;
mod state;
pub mod units;

// Public API exports
pub use session::{CropSession, CursorHint, Mode};
pub use settings::Settings;
pub use state::{CropOutcome, UiState};
pub use units::{DEFAULT_DPI, Resolution};

use crate::error::Result;
use crate::store::{DecodedImage, LocalStore, UploadReceipt};
use std::sync::Arc;

/// Launches the crop window and returns the saved crop's receipt.
///
/// Blocks until the user closes the window.
///
/// # Arguments
/// * `decoded` - The image to crop, already decoded and validated
/// * `store` - Upload store used for the gallery and for saving
/// * `settings` - User settings (print density)
/// * `initial_output` - Output filename override; derived from the source
///   name when `None`
///
/// # Returns
/// - `Ok(Some(receipt))` - A crop was exported and stored
/// - `Ok(None)` - The user closed the window without saving
/// - `Err(e)` - The UI failed to launch or run
pub fn run_crop_ui(
    decoded: DecodedImage,
    store: Arc<LocalStore>,
    settings: Settings,
    initial_output: Option<String>,
) -> Result<Option<UploadReceipt>> {
    app::run(decoded, store, settings, initial_output)
}

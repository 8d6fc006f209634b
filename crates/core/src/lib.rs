//! Snapcrop Core Library
//!
//! This library provides the core functionality for the snapcrop photo
//! cropping tool: interactive crop selection, scale-corrected export, and
//! a filesystem-backed upload store with gallery listing.
//!
//! # Overview
//!
//! Snapcrop lets users load a photo, select a rectangular region on a
//! scaled-down canvas, and save that region at the image's native
//! resolution. The library handles:
//!
//! - **Selection**: the crop rectangle state machine via [`crop::session`]
//! - **Geometry**: rectangle math and handle hit-testing via [`geometry`]
//! - **Export**: scale correction and PNG extraction via [`export`]
//! - **Storage**: uploads, gallery and downloads via [`store`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`Snapcrop`] facade:
//!
//! ```ignore
//! use snapcrop_core::Snapcrop;
//! use snapcrop_core::store::PhotoSource;
//!
//! let app = Snapcrop::new()?;
//!
//! // List previously stored uploads
//! for name in app.list_gallery().await? {
//!     println!("{}", name);
//! }
//!
//! // Load an image and launch the interactive crop window
//! let decoded = app.load(&PhotoSource::Path("photo.jpg".into())).await?;
//! let receipt = app.run_interactive(decoded, None)?;
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Configuration loading and management
//! - [`crop`]: Interactive crop surface and state machine
//! - [`error`]: Error types and result aliases
//! - [`export`]: Scale correction and full-resolution extraction
//! - [`geometry`]: Rectangle and handle geometry
//! - [`store`]: Image sources, upload storage, gallery and downloads

pub mod config;
pub mod crop;
pub mod error;
pub mod export;
pub mod geometry;
pub mod store;

// Re-export primary types for convenience
pub use config::Config;
pub use crop::{Resolution, Settings};
pub use error::{AppError, Result};
pub use store::{DecodedImage, LocalStore, PhotoSource, UploadReceipt};

use std::sync::Arc;

/// Main entry point for the snapcrop application.
///
/// This struct provides a facade over the various subsystems,
/// handling initialization and orchestration. It's the recommended
/// way to use the library for most use cases.
///
/// # Example
///
/// ```ignore
/// use snapcrop_core::Snapcrop;
///
/// let app = Snapcrop::new()?;
/// let decoded = app.load(&source).await?;
/// app.run_interactive(decoded, None)?;
/// ```
pub struct Snapcrop {
    config: Config,
    store: Arc<LocalStore>,
    settings: Settings,
}

impl Snapcrop {
    /// Creates a new instance with default configuration.
    ///
    /// Loads configuration from environment variables (including `.env`
    /// files), opens the upload store and loads persisted user settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the uploads directory cannot be created.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::with_config(config)
    }

    /// Creates an instance with custom configuration.
    ///
    /// Use this when you need to override environment-based configuration,
    /// such as pointing at a different uploads directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the uploads directory cannot be created.
    pub fn with_config(config: Config) -> Result<Self> {
        let store = Arc::new(LocalStore::open(&config.upload_dir)?);
        let settings = Settings::load(config.resolution);
        Ok(Self {
            config,
            store,
            settings,
        })
    }

    /// Loads and decodes an image for cropping.
    pub async fn load(&self, source: &PhotoSource) -> Result<DecodedImage> {
        self.store.load(source).await
    }

    /// Lists stored uploads, filtered to recognizable image files.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the uploads directory is unreadable.
    pub async fn list_gallery(&self) -> Result<Vec<String>> {
        Ok(store::filter_image_names(&self.store.list().await?))
    }

    /// Launches the interactive crop window for a loaded image.
    ///
    /// This is the main entry point for the visual crop workflow. Blocks
    /// until the user closes the window.
    ///
    /// # Arguments
    /// * `decoded` - The image to crop
    /// * `output` - Output filename override, if any
    pub fn run_interactive(
        &self,
        decoded: DecodedImage,
        output: Option<String>,
    ) -> Result<Option<UploadReceipt>> {
        crop::run_crop_ui(
            decoded,
            self.store.clone(),
            self.settings.clone(),
            output,
        )
    }

    /// Fetches the finished artifact behind an upload receipt's preview.
    pub async fn download(&self, reference: &str) -> Result<Vec<u8>> {
        self.store.download(reference).await
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the user settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns a mutable reference to the user settings.
    ///
    /// Allows overriding the print density before launching the UI.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present and sets up the environment.
///
/// # Example
///
/// ```ignore
/// snapcrop_core::init();
/// let config = snapcrop_core::Config::load()?;
/// ```
pub fn init() {
    let _ = dotenvy::dotenv();
}

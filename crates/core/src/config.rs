use crate::crop::units::Resolution;
use crate::error::Result;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    /// Directory where uploads and finished crops are stored.
    pub upload_dir: PathBuf,
    /// Default print density for the physical-size readout.
    pub resolution: Resolution,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let upload_dir = env::var("SNAPCROP_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let resolution = env::var("SNAPCROP_DPI")
            .ok()
            .map(|v| Resolution::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            upload_dir,
            resolution,
        })
    }
}

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use snapcrop_core::store::IMAGE_EXTENSIONS;
use snapcrop_core::{Config, PhotoSource, Resolution, Snapcrop, init};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image file to crop (a file dialog opens when omitted)
    image: Option<PathBuf>,

    /// Crop a previously stored upload instead of a local file
    #[arg(short, long)]
    stored: Option<String>,

    /// Override the uploads directory
    #[arg(long)]
    uploads: Option<PathBuf>,

    /// Print density for the physical size readout (px/inch)
    #[arg(long)]
    dpi: Option<u32>,

    /// Filename for the saved crop (default: cropped_<source name>)
    #[arg(short, long)]
    output: Option<String>,

    /// Also write the finished crop to this local path
    #[arg(long)]
    save_to: Option<PathBuf>,

    /// List stored uploads and exit
    #[arg(long)]
    list_uploads: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    let _ = dotenvy::dotenv();
    init();
    let args = Args::parse();

    // Load config and apply CLI overrides
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = args.uploads {
        config.upload_dir = dir;
    }

    let mut app = Snapcrop::with_config(config).context("Failed to open upload store")?;
    if let Some(dpi) = args.dpi {
        app.settings_mut().resolution = Resolution::new(dpi as i64);
    }

    // Handle --list-uploads; a listing failure degrades to an empty gallery
    if args.list_uploads {
        match app.list_gallery().await {
            Ok(names) if names.is_empty() => println!("No uploads"),
            Ok(names) => {
                for name in names {
                    println!("{}", name);
                }
            }
            Err(e) => eprintln!("Warning: failed to list uploads: {}", e),
        }
        return Ok(());
    }

    // Pick the image source: argument, stored name, or file dialog
    let source = if let Some(path) = args.image {
        PhotoSource::Path(path)
    } else if let Some(name) = args.stored {
        PhotoSource::Stored(name)
    } else {
        match rfd::FileDialog::new()
            .add_filter("Image", IMAGE_EXTENSIONS)
            .pick_file()
        {
            Some(path) => PhotoSource::Path(path),
            None => bail!("No image selected"),
        }
    };

    let decoded = app
        .load(&source)
        .await
        .context("Failed to load image")?;

    // Interactive crop window
    let receipt = app.run_interactive(decoded, args.output)?;

    match receipt {
        Some(receipt) => {
            println!("Saved crop as {}", receipt.filename);

            if let Some(path) = args.save_to {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("{spinner:.green} {msg}")?,
                );
                spinner.set_message(format!("Writing {}...", path.display()));
                spinner.enable_steady_tick(Duration::from_millis(100));

                let result: Result<()> = async {
                    let bytes = app
                        .download(&receipt.preview)
                        .await
                        .context("Failed to fetch finished crop")?;
                    tokio::fs::write(&path, &bytes)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    Ok(())
                }
                .await;

                spinner.finish_and_clear();
                result?;
                println!("Wrote {}", path.display());
            }
        }
        None => {
            println!("Crop cancelled");
        }
    }

    Ok(())
}

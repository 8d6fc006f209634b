//! Image sources, upload storage, gallery listing and artifact download.
//!
//! The crop engine talks to the outside world through the operations on
//! [`LocalStore`]: loading a decoded bitmap, persisting a finished crop,
//! listing previously stored files and fetching a finished artifact. The
//! store is backed by a plain uploads directory; previews travel as
//! `data:` URLs so callers never touch the filesystem layout directly.

use crate::error::{AppError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// File extensions recognized as images in the gallery, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "heic",
];

/// Where a crop session's image comes from.
#[derive(Debug, Clone)]
pub enum PhotoSource {
    /// A file picked from the local filesystem.
    Path(PathBuf),
    /// A previously stored upload, by filename.
    Stored(String),
}

/// A decoded bitmap plus the name it was loaded under.
pub struct DecodedImage {
    pub name: String,
    pub image: DynamicImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// What gets handed to the upload transport.
pub enum UploadPayload {
    /// A finished crop, PNG-encoded.
    Png { filename: String, bytes: Vec<u8> },
    /// A reference to an already stored file.
    Stored { filename: String },
}

/// Successful upload response: the stored name and a preview reference.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub filename: String,
    pub preview: String,
}

/// Keeps gallery names that look like images.
///
/// Blank names, dotfiles and unrecognized extensions are dropped; extension
/// matching is case-insensitive. Order is preserved.
pub fn filter_image_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| !n.trim().is_empty() && !n.starts_with('.'))
        .filter(|n| {
            n.rsplit_once('.').is_some_and(|(_, ext)| {
                IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
            })
        })
        .map(str::to_string)
        .collect()
}

/// Default output filename for a crop of the given source file.
pub fn default_output_name(source: &str) -> String {
    if source.trim().is_empty() {
        "cropped_image.png".to_string()
    } else {
        format!("cropped_{source}")
    }
}

fn mime_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

fn make_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Decodes a `data:` URL produced by [`make_data_url`].
fn parse_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AppError::malformed("Preview reference is not a data URL"))?;
    let (_, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::malformed("Data URL has no payload"))?;
    BASE64
        .decode(payload)
        .map_err(|e| AppError::malformed(format!("Invalid base64 payload: {e}")))
}

/// Strips any path components from a user-chosen filename.
fn sanitize_filename(name: &str) -> Result<String> {
    let base = name
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(AppError::transport("Missing or invalid filename"));
    }
    Ok(base.to_string())
}

fn ensure_png_extension(name: String) -> String {
    if Path::new(&name).extension().is_some() {
        name
    } else {
        format!("{name}.png")
    }
}

/// Filesystem-backed store for uploaded and cropped images.
///
/// Decoding happens here so callers always receive a usable bitmap or a
/// [`AppError::Decode`]; degenerate images never reach a crop session.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Opens (and creates, if needed) the uploads directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stored_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(sanitize_filename(name)?))
    }

    /// Loads and decodes an image for a crop session.
    ///
    /// # Errors
    ///
    /// [`AppError::Decode`] when the bytes are not a decodable image or the
    /// decoded image has a zero dimension; [`AppError::Io`] on read failure.
    pub async fn load(&self, source: &PhotoSource) -> Result<DecodedImage> {
        let (name, path) = match source {
            PhotoSource::Path(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image.png".to_string());
                (name, path.clone())
            }
            PhotoSource::Stored(name) => (name.clone(), self.stored_path(name)?),
        };

        let bytes = tokio::fs::read(&path).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| AppError::decode(format!("{}: {e}", path.display())))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(AppError::decode(format!(
                "{}: image has degenerate dimensions",
                path.display()
            )));
        }

        Ok(DecodedImage { name, image })
    }

    /// Stores an upload and returns its receipt.
    ///
    /// PNG payloads are written under the (sanitized) chosen filename, with
    /// a `.png` extension appended when the name has none. A `Stored`
    /// payload re-submits an existing file; it must exist.
    pub async fn upload(&self, payload: UploadPayload) -> Result<UploadReceipt> {
        match payload {
            UploadPayload::Png { filename, bytes } => {
                let filename = ensure_png_extension(sanitize_filename(&filename)?);
                let path = self.root.join(&filename);
                tokio::fs::write(&path, &bytes)
                    .await
                    .map_err(|e| AppError::transport(format!("Failed to store upload: {e}")))?;
                let preview = make_data_url("image/png", &bytes);
                Ok(UploadReceipt { filename, preview })
            }
            UploadPayload::Stored { filename } => {
                let path = self.stored_path(&filename)?;
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|_| AppError::transport("Selected file not found"))?;
                let preview = make_data_url(mime_for(&filename), &bytes);
                Ok(UploadReceipt { filename, preview })
            }
        }
    }

    /// Lists stored filenames, newest first.
    ///
    /// Names are returned unfiltered; callers apply [`filter_image_names`].
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| AppError::transport(format!("Failed to list uploads: {e}")))?;

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| AppError::transport(format!("Failed to list uploads: {e}")))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort();
        names.reverse();
        Ok(names)
    }

    /// Fetches the finished artifact behind a preview reference.
    ///
    /// # Errors
    ///
    /// [`AppError::Malformed`] for an unparsable data URL,
    /// [`AppError::Transport`] for a missing stored file.
    pub async fn download(&self, reference: &str) -> Result<Vec<u8>> {
        if reference.starts_with("data:") {
            return parse_data_url(reference);
        }
        let path = self.stored_path(reference)?;
        tokio::fs::read(&path)
            .await
            .map_err(|_| AppError::transport("Artifact not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_filter_keeps_only_visible_images() {
        let names = ["a.png", ".hidden.png", "b.txt", "C.JPG"];
        assert_eq!(filter_image_names(&names), vec!["a.png", "C.JPG"]);
    }

    #[test]
    fn gallery_filter_drops_blank_and_extensionless_names() {
        let names = ["", "   ", "noext", "x.webp", "y.HEIC"];
        assert_eq!(filter_image_names(&names), vec!["x.webp", "y.HEIC"]);
    }

    #[test]
    fn output_name_gets_cropped_prefix() {
        assert_eq!(default_output_name("portrait.jpg"), "cropped_portrait.jpg");
        assert_eq!(default_output_name(""), "cropped_image.png");
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("dir\\photo.png").unwrap(), "photo.png");
        assert_eq!(sanitize_filename("  plain.png ").unwrap(), "plain.png");
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("uploads/").is_err());
    }

    #[test]
    fn png_extension_is_appended_when_missing() {
        assert_eq!(ensure_png_extension("crop".into()), "crop.png");
        assert_eq!(ensure_png_extension("crop.jpg".into()), "crop.jpg");
    }

    #[test]
    fn data_url_round_trips() {
        let url = make_data_url("image/png", b"hello");
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(parse_data_url(&url).unwrap(), b"hello");
    }

    #[test]
    fn malformed_previews_are_rejected() {
        assert!(matches!(
            parse_data_url("nonsense"),
            Err(AppError::Malformed(_))
        ));
        assert!(matches!(
            parse_data_url("data:image/png;base64"),
            Err(AppError::Malformed(_))
        ));
        assert!(matches!(
            parse_data_url("data:image/png;base64,@@@"),
            Err(AppError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn upload_list_download_round_trip() {
        let root =
            std::env::temp_dir().join(format!("snapcrop-store-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let store = LocalStore::open(&root).unwrap();

        let receipt = store
            .upload(UploadPayload::Png {
                filename: "crop_a".to_string(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();
        assert_eq!(receipt.filename, "crop_a.png");

        let names = store.list().await.unwrap();
        assert_eq!(names, vec!["crop_a.png"]);

        let bytes = store.download(&receipt.preview).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        let bytes = store.download("crop_a.png").await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        // Re-submitting a stored file yields a preview of its contents.
        let receipt = store
            .upload(UploadPayload::Stored {
                filename: "crop_a.png".to_string(),
            })
            .await
            .unwrap();
        assert!(receipt.preview.starts_with("data:image/png;base64,"));

        assert!(matches!(
            store
                .upload(UploadPayload::Stored {
                    filename: "missing.png".to_string()
                })
                .await,
            Err(AppError::Transport(_))
        ));

        let _ = std::fs::remove_dir_all(&root);
    }
}

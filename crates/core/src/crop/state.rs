//! UI state types and worker event definitions.

use crate::store::{DecodedImage, UploadReceipt};

/// Result of a crop-and-save run, shared with the caller of the UI.
#[derive(Clone, Default)]
pub struct CropOutcome {
    /// Receipt for the last successfully saved crop, if any.
    pub receipt: Option<UploadReceipt>,
}

/// Current state of the crop tool's save/load pipeline.
///
/// The UI follows a simple state machine:
/// `Idle` -> `Busy` -> `Saved` or `Error` -> `Idle` (on next interaction)
#[derive(Clone, Debug)]
pub enum UiState {
    /// Waiting for user input.
    Idle,
    /// A background operation is running; the label says which.
    Busy(String),
    /// The crop was exported and stored.
    Saved { filename: String },
    /// An operation failed; the message is shown until the next interaction.
    Error(String),
}

/// Events received from background worker threads.
///
/// Workers send these through a channel; the UI thread drains the channel
/// every frame, so every started operation settles in a terminal state.
pub(crate) enum WorkEvent {
    /// Gallery listing finished.
    Gallery(Vec<String>),
    /// Gallery listing failed; the gallery degrades to an empty state.
    GalleryFailed(String),
    /// A stored image finished loading for a new crop session.
    ImageLoaded(Box<DecodedImage>),
    /// Loading a stored image failed.
    LoadFailed(String),
    /// Export and upload finished.
    Saved(UploadReceipt),
    /// Export or upload failed.
    SaveFailed(String),
}

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a track fails. The `Display` text is what ends up in the batch
/// result.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Extraction reported success but {} is missing", .0.display())]
    MissingOutput(PathBuf),

    #[error("Tagging failed: {0}")]
    Tagging(String),

    #[error("Cover art unavailable: {0}")]
    CoverArt(String),

    #[error("Failed to remove untagged file {}: {source}", .path.display())]
    RemoveOriginal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {} into place: {source}", .path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker aborted: {0}")]
    Scheduling(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DownloadError>;

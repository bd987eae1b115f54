use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Failed to read bookmarks file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bookmarks file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Bookmark folder position {position} is out of range ({available} folders on the bookmark bar)")]
    FolderOutOfRange { position: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, LibraryError>;

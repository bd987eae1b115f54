use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Bookmark error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Download error: {0}")]
    Download(#[from] core_download::DownloadError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tagging tool unavailable: {0}")]
    TaggerMissing(String),

    #[error("Extraction tool update failed: {0}")]
    Update(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

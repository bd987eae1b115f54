use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Catalog credentials are not configured")]
    MissingCredentials,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Catalog rejected the access token (expired or revoked)")]
    Unauthorized,

    #[error("Failed to decode catalog response: {0}")]
    Decode(String),

    #[error("No catalog match for '{title}' by '{artist}'")]
    NoMatch { title: String, artist: String },

    #[error("Token exchange failed: {0}")]
    Token(String),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

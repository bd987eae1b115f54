//! Remote Catalog Client
//!
//! Looks tracks up in a Spotify Web API compatible catalog.
//!
//! ## API Endpoints
//!
//! - **Token**: `POST https://accounts.spotify.com/api/token` with HTTP Basic
//!   client credentials and `grant_type=client_credentials`
//! - **Search**: `GET https://api.spotify.com/v1/search?q={query}&type=track&limit=1`
//!
//! ## Matching
//!
//! The query combines title and artist as exact-phrase field filters
//! (`track:"..." artist:"..."`) and asks for a single result. That first,
//! highest-ranked result is taken as is; no scoring against the input is done.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::{CatalogClient, MetadataResolver};
//!
//! let client = CatalogClient::new(http_client, config.catalog_credentials())
//!     .with_timeout(config.http_timeout());
//! let metadata = client.resolve("One More Time", "Daft Punk").await?;
//! ```

use crate::error::{MetadataError, Result};
use crate::models::{parse_year, TrackMetadata};
use crate::token::{CatalogToken, TokenCache};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::config::CatalogCredentials;
use core_runtime::logging::redact_if_sensitive;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Token endpoint of the public catalog
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// API base of the public catalog
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves canonical metadata for a title/artist pair.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, title: &str, artist: &str) -> Result<TrackMetadata>;
}

/// Where the catalog lives. Overridden in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for CatalogEndpoints {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<CatalogTrack>,
}

#[derive(Debug, Deserialize)]
struct CatalogTrack {
    name: String,
    #[serde(default)]
    artists: Vec<NamedItem>,
    album: CatalogAlbum,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogAlbum {
    name: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    images: Vec<CatalogImage>,
}

#[derive(Debug, Deserialize)]
struct CatalogImage {
    url: String,
}

/// Catalog client with a run-scoped token.
pub struct CatalogClient {
    http_client: Arc<dyn HttpClient>,
    credentials: Option<CatalogCredentials>,
    endpoints: CatalogEndpoints,
    request_timeout: Duration,
    tokens: TokenCache,
}

impl CatalogClient {
    /// Creates a client; `None` credentials make every lookup fail fast with
    /// [`MetadataError::MissingCredentials`].
    pub fn new(http_client: Arc<dyn HttpClient>, credentials: Option<CatalogCredentials>) -> Self {
        Self {
            http_client,
            credentials,
            endpoints: CatalogEndpoints::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tokens: TokenCache::new(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: CatalogEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Deadline applied to every catalog request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn access_token(&self, credentials: &CatalogCredentials) -> Result<String> {
        self.tokens
            .get_or_fetch(|| self.request_token(credentials))
            .await
    }

    async fn request_token(&self, credentials: &CatalogCredentials) -> Result<CatalogToken> {
        debug!(url = %self.endpoints.token_url, "Requesting catalog token");

        let request = HttpRequest::post(&self.endpoints.token_url)
            .basic_auth(&credentials.client_id, &credentials.client_secret)
            .form(&[("grant_type", "client_credentials")])
            .map_err(|e| MetadataError::Token(e.to_string()))?
            .timeout(self.request_timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::Network(format!("Token request failed: {}", e)))?;

        if !response.is_success() {
            return Err(MetadataError::Token(format!(
                "token endpoint returned {}: {}",
                response.status,
                response.text_lossy()
            )));
        }

        let token: CatalogToken = response
            .json()
            .map_err(|e| MetadataError::Decode(format!("token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(MetadataError::Token(
                "token endpoint returned an empty access token".to_string(),
            ));
        }

        debug!(
            token = %redact_if_sensitive("access_token", &token.access_token),
            expires_in = token.expires_in,
            "Catalog token acquired"
        );
        Ok(token)
    }

    fn search_url(&self, title: &str, artist: &str) -> String {
        let query = format!("track:\"{}\" artist:\"{}\"", title, artist);
        format!(
            "{}/search?q={}&type=track&limit=1",
            self.endpoints.api_base.trim_end_matches('/'),
            urlencoding::encode(&query)
        )
    }

    fn check_status(response: &HttpResponse) -> Result<()> {
        match response.status {
            401 => Err(MetadataError::Unauthorized),
            _ if response.is_success() => Ok(()),
            status => Err(MetadataError::Http {
                status,
                body: response.text_lossy(),
            }),
        }
    }
}

#[async_trait]
impl MetadataResolver for CatalogClient {
    #[instrument(skip(self))]
    async fn resolve(&self, title: &str, artist: &str) -> Result<TrackMetadata> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(MetadataError::MissingCredentials)?;

        let token = self.access_token(credentials).await?;

        let request = HttpRequest::get(self.search_url(title, artist))
            .bearer_token(token)
            .header("Accept", "application/json")
            .timeout(self.request_timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::Network(format!("Catalog search failed: {}", e)))?;

        Self::check_status(&response)?;

        let search: SearchResponse = response
            .json()
            .map_err(|e| MetadataError::Decode(e.to_string()))?;

        let best = search
            .tracks
            .items
            .into_iter()
            .next()
            .ok_or_else(|| MetadataError::NoMatch {
                title: title.to_string(),
                artist: artist.to_string(),
            })?;

        let metadata = TrackMetadata {
            title: best.name,
            artist: best
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_else(|| artist.to_string()),
            album: best.album.name,
            year: parse_year(&best.album.release_date),
            cover_url: best.album.images.into_iter().next().map(|image| image.url),
        };

        debug!(album = %metadata.album, year = ?metadata.year, "Catalog match");
        Ok(metadata)
    }
}

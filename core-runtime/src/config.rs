//! # Application Configuration
//!
//! Process-wide settings for a single download run.
//!
//! ## Overview
//!
//! [`AppConfig`] is loaded once before the pipeline starts and is treated as
//! immutable for the rest of the run (shared behind an `Arc`). It is persisted
//! as pretty-printed JSON; the field names match the historical `config.json`
//! layout so existing files keep working.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{AppConfig, ConfigStore};
//!
//! let config = ConfigStore::load("config.json")?;
//!
//! let config = AppConfig::builder()
//!     .music_directory("/srv/music")
//!     .max_concurrent(4)
//!     .catalog_credentials("client-id", "client-secret")
//!     .build()?;
//! ConfigStore::save("config.json", &config)?;
//! ```
//!
//! ## Metadata enrichment
//!
//! Catalog credentials are optional. When either the client id or the secret
//! is empty, [`AppConfig::catalog_credentials`] returns `None` and tracks are
//! stored untagged.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file name used when no explicit config path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Above this `max_concurrent` validation logs a warning; the value is still
/// accepted.
pub const LARGE_CONCURRENCY: usize = 64;

/// Client-credentials pair for the remote catalog.
#[derive(Clone, PartialEq, Eq)]
pub struct CatalogCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl CatalogCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for CatalogCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Settings for one run of the downloader.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog client id (empty disables metadata enrichment)
    pub spotify_client_id: String,

    /// Catalog client secret (empty disables metadata enrichment)
    pub spotify_client_secret: String,

    /// Path to the browser's `Bookmarks` JSON file
    pub bookmark_path: PathBuf,

    /// Index of the bookmark-bar folder holding the music links
    pub bookmark_position: usize,

    /// Output directory for audio files
    pub music_directory: PathBuf,

    /// Index of the title inside a split bookmark name
    pub title_position: usize,

    /// Index of the artist inside a split bookmark name
    pub artist_position: usize,

    /// Separator between artist and title in bookmark names
    pub music_separator: String,

    /// Tagging tool executable
    pub ffmpeg_path: PathBuf,

    /// Audio extraction tool executable
    pub yt_dlp_path: PathBuf,

    /// Maximum number of tracks processed at once
    pub max_concurrent: usize,

    /// Target audio quality passed to the extraction tool (e.g. `192k`)
    pub audio_quality: String,

    /// Deadline for every HTTP request, in seconds
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spotify_client_id: String::new(),
            spotify_client_secret: String::new(),
            bookmark_path: default_bookmark_path(),
            bookmark_position: 0,
            music_directory: PathBuf::from("./downloaded_music"),
            title_position: 1,
            artist_position: 0,
            music_separator: " - ".to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            yt_dlp_path: PathBuf::from("yt-dlp"),
            max_concurrent: 3,
            audio_quality: "192k".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("spotify_client_id", &self.spotify_client_id)
            .field(
                "spotify_client_secret",
                &if self.spotify_client_secret.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .field("bookmark_path", &self.bookmark_path)
            .field("bookmark_position", &self.bookmark_position)
            .field("music_directory", &self.music_directory)
            .field("title_position", &self.title_position)
            .field("artist_position", &self.artist_position)
            .field("music_separator", &self.music_separator)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("yt_dlp_path", &self.yt_dlp_path)
            .field("max_concurrent", &self.max_concurrent)
            .field("audio_quality", &self.audio_quality)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Creates a new builder starting from the defaults.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - `max_concurrent` is at least 1
    /// - The output directory and tool paths are not empty
    /// - The audio quality is set
    /// - The HTTP deadline is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(Error::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        if self.max_concurrent > LARGE_CONCURRENCY {
            tracing::warn!(
                max_concurrent = self.max_concurrent,
                "Many concurrent downloads; remote services may rate-limit"
            );
        }

        if self.music_directory.as_os_str().is_empty() {
            return Err(Error::Config(
                "music_directory cannot be empty".to_string(),
            ));
        }

        if self.yt_dlp_path.as_os_str().is_empty() {
            return Err(Error::Config("yt_dlp_path cannot be empty".to_string()));
        }

        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(Error::Config("ffmpeg_path cannot be empty".to_string()));
        }

        if self.audio_quality.trim().is_empty() {
            return Err(Error::Config("audio_quality cannot be empty".to_string()));
        }

        if self.music_separator.is_empty() {
            return Err(Error::Config(
                "music_separator cannot be empty".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(Error::Config(
                "http_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Catalog credentials, or `None` when metadata enrichment is disabled.
    pub fn catalog_credentials(&self) -> Option<CatalogCredentials> {
        if self.spotify_client_id.is_empty() || self.spotify_client_secret.is_empty() {
            return None;
        }

        Some(CatalogCredentials::new(
            self.spotify_client_id.clone(),
            self.spotify_client_secret.clone(),
        ))
    }

    /// Per-request HTTP deadline.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Whether interactive setup should run before a download.
    pub fn needs_setup(&self) -> bool {
        self.spotify_client_id.is_empty() || self.bookmark_path.as_os_str().is_empty()
    }
}

/// Platform default location of Chrome's `Bookmarks` file.
pub fn default_bookmark_path() -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::new();
    };

    if cfg!(target_os = "windows") {
        home.join("AppData")
            .join("Local")
            .join("Google")
            .join("Chrome")
            .join("User Data")
            .join("Default")
            .join("Bookmarks")
    } else if cfg!(target_os = "macos") {
        home.join("Library")
            .join("Application Support")
            .join("Google")
            .join("Chrome")
            .join("Default")
            .join("Bookmarks")
    } else {
        home.join(".config")
            .join("google-chrome")
            .join("Default")
            .join("Bookmarks")
    }
}

/// Builder for constructing [`AppConfig`] instances.
///
/// Unset values keep their defaults; [`build()`](AppConfigBuilder::build)
/// validates the result.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn catalog_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.config.spotify_client_id = client_id.into();
        self.config.spotify_client_secret = client_secret.into();
        self
    }

    pub fn bookmark_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.bookmark_path = path.into();
        self
    }

    pub fn bookmark_position(mut self, position: usize) -> Self {
        self.config.bookmark_position = position;
        self
    }

    pub fn music_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.music_directory = path.into();
        self
    }

    /// Sets where title and artist sit inside a bookmark name split on `separator`.
    pub fn name_layout(
        mut self,
        separator: impl Into<String>,
        title_position: usize,
        artist_position: usize,
    ) -> Self {
        self.config.music_separator = separator.into();
        self.config.title_position = title_position;
        self.config.artist_position = artist_position;
        self
    }

    pub fn ffmpeg_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.ffmpeg_path = path.into();
        self
    }

    pub fn yt_dlp_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.yt_dlp_path = path.into();
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.config.max_concurrent = max;
        self
    }

    pub fn audio_quality(mut self, quality: impl Into<String>) -> Self {
        self.config.audio_quality = quality.into();
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    /// Builds the final `AppConfig`, returning an error if it is invalid.
    pub fn build(self) -> Result<AppConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Loads and saves [`AppConfig`] as JSON.
#[derive(Debug, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    /// Load the configuration at `path`.
    ///
    /// A missing file yields the defaults. Keys absent from the file keep
    /// their defaults, unknown keys are ignored. A file that exists but is
    /// not valid JSON is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(AppConfig::default());
            }
            Err(source) => {
                return Err(Error::ConfigIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data).map_err(|source| Error::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Save `config` to `path` as pretty-printed JSON.
    pub fn save(path: impl AsRef<Path>, config: &AppConfig) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_vec_pretty(config).map_err(|source| Error::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;

        std::fs::write(path, data).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.max_concurrent, 3);
        assert_eq!(config.audio_quality, "192k");
        assert_eq!(config.music_separator, " - ");
        assert_eq!(config.title_position, 1);
        assert_eq!(config.artist_position, 0);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.music_directory, PathBuf::from("./downloaded_music"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_with_all_fields() {
        let config = AppConfig::builder()
            .catalog_credentials("id", "secret")
            .bookmark_path("/tmp/Bookmarks")
            .bookmark_position(2)
            .music_directory("/srv/music")
            .name_layout(" | ", 0, 1)
            .ffmpeg_path("/usr/bin/ffmpeg")
            .yt_dlp_path("./yt-dlp")
            .max_concurrent(8)
            .audio_quality("320k")
            .http_timeout_secs(10)
            .build()
            .unwrap();

        assert_eq!(config.bookmark_position, 2);
        assert_eq!(config.music_separator, " | ");
        assert_eq!(config.title_position, 0);
        assert_eq!(config.artist_position, 1);
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(
            config.catalog_credentials(),
            Some(CatalogCredentials::new("id", "secret"))
        );
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let result = AppConfig::builder().max_concurrent(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_accepts_any_positive_concurrency() {
        for n in [1, LARGE_CONCURRENCY, 100, 10_000] {
            let config = AppConfig::builder().max_concurrent(n).build().unwrap();
            assert_eq!(config.max_concurrent, n);
        }
    }

    #[test]
    fn test_validate_rejects_empty_quality() {
        let result = AppConfig::builder().audio_quality("  ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = AppConfig::builder().http_timeout_secs(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let config = AppConfig::builder()
            .catalog_credentials("id", "")
            .build()
            .unwrap();
        assert!(config.catalog_credentials().is_none());

        let config = AppConfig::builder()
            .catalog_credentials("", "secret")
            .build()
            .unwrap();
        assert!(config.catalog_credentials().is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AppConfig::builder()
            .catalog_credentials("visible-id", "hidden-secret")
            .build()
            .unwrap();

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("visible-id"));
        assert!(!rendered.contains("hidden-secret"));

        let rendered = format!("{:?}", config.catalog_credentials().unwrap());
        assert!(!rendered.contains("hidden-secret"));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigStore::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"spotify_client_id": "abc", "max_concurrent": 5, "unknown_key": true}"#,
        )
        .unwrap();

        let config = ConfigStore::load(&path).unwrap();
        assert_eq!(config.spotify_client_id, "abc");
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.audio_quality, "192k");
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ConfigStore::load(&path),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig::builder()
            .catalog_credentials("id", "secret")
            .max_concurrent(2)
            .build()
            .unwrap();

        ConfigStore::save(&path, &config).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"spotify_client_id\": \"id\""));

        assert_eq!(ConfigStore::load(&path).unwrap(), config);
    }

    #[test]
    fn test_needs_setup() {
        assert!(AppConfig::default().needs_setup());

        let config = AppConfig::builder()
            .catalog_credentials("id", "secret")
            .bookmark_path("/tmp/Bookmarks")
            .build()
            .unwrap();
        assert!(!config.needs_setup());
    }
}

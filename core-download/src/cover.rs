//! Cover art sidecar file.

use crate::error::{DownloadError, Result};
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::logging::strip_path;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// A downloaded cover image next to the audio file.
///
/// The file is removed when the value is dropped, so every exit path of a
/// track's pipeline cleans it up.
#[derive(Debug)]
pub struct CoverArt {
    path: PathBuf,
}

impl CoverArt {
    /// Sidecar location for the audio file at `audio`.
    pub fn sidecar_path(audio: &Path) -> PathBuf {
        let mut path = audio.as_os_str().to_owned();
        path.push(".cover.jpg");
        PathBuf::from(path)
    }

    /// Download `url` next to `audio`.
    pub async fn download(
        http_client: &dyn HttpClient,
        url: &str,
        audio: &Path,
        timeout: Duration,
    ) -> Result<Self> {
        let response = http_client
            .execute(HttpRequest::get(url).timeout(timeout))
            .await
            .map_err(|e| DownloadError::CoverArt(e.to_string()))?;

        if !response.is_success() {
            return Err(DownloadError::CoverArt(format!(
                "HTTP {} for {}",
                response.status, url
            )));
        }

        if response.body.is_empty() {
            return Err(DownloadError::CoverArt(format!("empty image from {}", url)));
        }

        // Guard first so a partial write is removed too
        let cover = Self {
            path: Self::sidecar_path(audio),
        };
        tokio::fs::write(&cover.path, &response.body)
            .await
            .map_err(|e| DownloadError::CoverArt(e.to_string()))?;

        debug!(
            file = strip_path(&cover.path.to_string_lossy()),
            bytes = response.body.len(),
            "Cover art saved"
        );
        Ok(cover)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CoverArt {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove cover art"),
        }
    }
}

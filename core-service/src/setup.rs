//! # Dependency Setup
//!
//! Gets the external tools and the output directory ready before a batch:
//!
//! 1. Create the output directory (fatal on failure)
//! 2. Fetch the latest extraction tool release and point the config at it
//!    (best effort, a failure only logs a warning)
//! 3. Probe the tagging tool with `-version` (fatal on failure)

use crate::error::{Result, ServiceError};
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::process::CommandRunner;
use core_download::TagWriter;
use core_runtime::config::AppConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Release location of the extraction tool's standalone binaries
pub const YT_DLP_RELEASE_BASE: &str = "https://github.com/yt-dlp/yt-dlp/releases/latest/download";

/// Deadline for the release download; the binary is several megabytes
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Release asset name for the current platform.
pub fn yt_dlp_asset_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

/// What [`DependencySetup::prepare`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    /// First line of the tagging tool's version banner
    pub tagger_version: String,
    /// New extraction tool location, when the update succeeded
    pub extractor_updated: Option<PathBuf>,
    /// Why the update was skipped, when it failed
    pub update_warning: Option<String>,
}

pub struct DependencySetup {
    http_client: Arc<dyn HttpClient>,
    runner: Arc<dyn CommandRunner>,
    install_dir: PathBuf,
    release_base: String,
}

impl DependencySetup {
    /// Installs updates into the current directory.
    pub fn new(http_client: Arc<dyn HttpClient>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            http_client,
            runner,
            install_dir: PathBuf::from("."),
            release_base: YT_DLP_RELEASE_BASE.to_string(),
        }
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    pub fn with_release_base(mut self, base: impl Into<String>) -> Self {
        self.release_base = base.into();
        self
    }

    /// Run every setup step, updating `config.yt_dlp_path` on a successful
    /// update.
    #[instrument(skip_all)]
    pub async fn prepare(&self, config: &mut AppConfig) -> Result<SetupReport> {
        ensure_output_dir(&config.music_directory).await?;

        let (extractor_updated, update_warning) = match self.update_extractor(config).await {
            Ok(path) => (Some(path), None),
            Err(e) => {
                warn!(error = %e, "Could not update extraction tool, using {}", config.yt_dlp_path.display());
                (None, Some(e.to_string()))
            }
        };

        let tagger_version = self.probe_tagger(config).await?;

        Ok(SetupReport {
            tagger_version,
            extractor_updated,
            update_warning,
        })
    }

    /// Check the tagging tool runs.
    pub async fn probe_tagger(&self, config: &AppConfig) -> Result<String> {
        let version = TagWriter::new(Arc::clone(&self.runner), &config.ffmpeg_path)
            .probe()
            .await
            .map_err(|e| ServiceError::TaggerMissing(e.to_string()))?;

        info!(%version, "Tagging tool found");
        Ok(version)
    }

    /// Download the latest extraction tool into the install directory and
    /// point `config` at it.
    ///
    /// The binary is written next to its final name first, so a failed
    /// download never clobbers a working copy.
    #[instrument(skip_all)]
    pub async fn update_extractor(&self, config: &mut AppConfig) -> Result<PathBuf> {
        let asset = yt_dlp_asset_name();
        let url = format!("{}/{}", self.release_base.trim_end_matches('/'), asset);
        info!(%url, "Downloading extraction tool");

        let response = self
            .http_client
            .execute(HttpRequest::get(&url).timeout(UPDATE_TIMEOUT))
            .await
            .map_err(|e| ServiceError::Update(e.to_string()))?;

        if !response.is_success() {
            return Err(ServiceError::Update(format!(
                "{} returned HTTP {}",
                url, response.status
            )));
        }
        if response.body.is_empty() {
            return Err(ServiceError::Update(format!("{} returned an empty body", url)));
        }

        let target = self.install_dir.join(asset);
        let partial = self.install_dir.join(format!("{}.part", asset));

        let install = async {
            tokio::fs::write(&partial, &response.body).await?;
            make_executable(&partial).await?;
            tokio::fs::rename(&partial, &target).await
        };
        if let Err(e) = install.await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(ServiceError::Update(format!(
                "could not install {}: {}",
                target.display(),
                e
            )));
        }

        info!(path = %target.display(), bytes = response.body.len(), "Extraction tool updated");
        config.yt_dlp_path = target.clone();
        Ok(target)
    }
}

/// Create `dir` and its parents if missing.
pub async fn ensure_output_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ServiceError::OutputDirectory {
            path: dir.display().to_string(),
            source,
        })
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

//! # Track Materializer
//!
//! Turns one [`Track`] into a finished audio file.
//!
//! ## Pipeline
//!
//! ```text
//! url and name set? ──no──> Err(InvalidTrack)
//!    │yes
//! exists? ──yes──> Skipped
//!    │no
//! extract ──fail──> Err(Extraction)
//!    │
//! resolver configured? ──no──> Untagged("no metadata")
//!    │yes
//! resolve ──fail──> Untagged("no metadata: ...")
//!    │
//! cover art (best effort)
//!    │
//! tag into <file>.tmp ──fail──> remove tmp, keep original, Err(Tagging)
//!    │
//! remove original, rename tmp ──> Tagged
//! ```
//!
//! Metadata and cover art are enrichment only: their failures are logged and
//! the track still succeeds. Extraction, tagging and the final swap are fatal
//! for the track.

use crate::cover::CoverArt;
use crate::error::{DownloadError, Result};
use crate::extractor::AudioExtractor;
use crate::result::MaterializeOutcome;
use crate::tagger::TagWriter;
use bridge_traits::http::HttpClient;
use bridge_traits::process::CommandRunner;
use core_library::models::Track;
use core_metadata::MetadataResolver;
use core_runtime::config::AppConfig;
use core_runtime::events::{CoreEvent, EventBus, TrackEvent, TrackStage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Note attached to tracks kept without tags
pub const NO_METADATA_NOTE: &str = "no metadata";

/// Runs the per-track pipeline.
pub struct TrackMaterializer {
    extractor: AudioExtractor,
    tagger: TagWriter,
    resolver: Option<Arc<dyn MetadataResolver>>,
    http_client: Arc<dyn HttpClient>,
    output_dir: PathBuf,
    http_timeout: Duration,
    event_bus: Option<EventBus>,
}

impl TrackMaterializer {
    /// Build a materializer from the run configuration.
    ///
    /// `resolver` is `None` when catalog credentials are not configured; every
    /// track is then kept untagged.
    pub fn new(
        config: &AppConfig,
        runner: Arc<dyn CommandRunner>,
        http_client: Arc<dyn HttpClient>,
        resolver: Option<Arc<dyn MetadataResolver>>,
    ) -> Self {
        Self {
            extractor: AudioExtractor::new(
                Arc::clone(&runner),
                &config.yt_dlp_path,
                &config.audio_quality,
            ),
            tagger: TagWriter::new(runner, &config.ffmpeg_path),
            resolver,
            http_client,
            output_dir: config.music_directory.clone(),
            http_timeout: config.http_timeout(),
            event_bus: None,
        }
    }

    /// Publish stage changes on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Temporary path the tagging tool writes to.
    pub fn temp_path(output: &Path) -> PathBuf {
        let mut path = output.as_os_str().to_owned();
        path.push(".tmp");
        PathBuf::from(path)
    }

    /// Produce the final audio file for `track`.
    #[instrument(skip(self, track), fields(track = %track.name))]
    pub async fn materialize(&self, track: &Track) -> Result<MaterializeOutcome> {
        track.validate().map_err(DownloadError::InvalidTrack)?;
        let output = track.output_path(&self.output_dir);

        if tokio::fs::try_exists(&output).await? {
            debug!("Output already present, skipping");
            return Ok(MaterializeOutcome::Skipped);
        }

        // A `/` in the name places the file in a subdirectory
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.emit_stage(track, TrackStage::Downloading);
        let audio = self.extractor.extract(track, &self.output_dir).await?;

        let Some(resolver) = self.resolver.as_ref() else {
            return Ok(MaterializeOutcome::Untagged {
                note: NO_METADATA_NOTE.to_string(),
            });
        };

        self.emit_stage(track, TrackStage::ResolvingMetadata);
        let metadata = match resolver.resolve(&track.title, &track.artist).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "Metadata lookup failed, keeping file untagged");
                return Ok(MaterializeOutcome::Untagged {
                    note: format!("{}: {}", NO_METADATA_NOTE, e),
                });
            }
        };

        // Held until the end of this function; dropping it removes the file
        let cover = match metadata.cover_url.as_deref() {
            Some(url) => {
                match CoverArt::download(self.http_client.as_ref(), url, &audio, self.http_timeout)
                    .await
                {
                    Ok(cover) => Some(cover),
                    Err(e) => {
                        warn!(error = %e, "Tagging without cover art");
                        None
                    }
                }
            }
            None => None,
        };

        self.emit_stage(track, TrackStage::Tagging);
        let temp = Self::temp_path(&audio);

        if let Err(e) = self
            .tagger
            .write_tags(&audio, cover.as_ref().map(CoverArt::path), &metadata, &temp)
            .await
        {
            remove_if_present(&temp).await;
            return Err(e);
        }

        if let Err(source) = tokio::fs::remove_file(&audio).await {
            remove_if_present(&temp).await;
            return Err(DownloadError::RemoveOriginal {
                path: audio,
                source,
            });
        }

        // The tagged copy stays at the temp path if this fails
        tokio::fs::rename(&temp, &audio)
            .await
            .map_err(|source| DownloadError::Rename {
                path: temp.clone(),
                source,
            })?;

        info!(album = %metadata.album, cover = cover.is_some(), "Tagged");
        Ok(MaterializeOutcome::Tagged {
            cover: cover.is_some(),
        })
    }

    fn emit_stage(&self, track: &Track, stage: TrackStage) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Track(TrackEvent::Stage {
                track: track.name.clone(),
                stage,
            }))
            .ok();
        }
    }
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed temporary file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary file"),
    }
}

//! Audio extraction through an external downloader (yt-dlp compatible).

use crate::error::{DownloadError, Result};
use bridge_traits::process::{CommandRunner, CommandSpec};
use core_library::models::{Track, AUDIO_EXTENSION};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Drives the extraction tool: source URL in, audio file out.
#[derive(Clone)]
pub struct AudioExtractor {
    runner: Arc<dyn CommandRunner>,
    program: PathBuf,
    quality: String,
}

impl AudioExtractor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<PathBuf>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            quality: quality.into(),
        }
    }

    /// Output template handed to the tool; it substitutes the extension.
    pub fn output_template(track: &Track, dir: &Path) -> PathBuf {
        track.path_in(dir, "%(ext)s")
    }

    /// Command line for extracting `track` into `dir`.
    pub fn command(&self, track: &Track, dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(["--extract-audio", "--audio-format", AUDIO_EXTENSION])
            .args(["--audio-quality", self.quality.as_str()])
            .arg("--output")
            .arg(Self::output_template(track, dir))
            .args(["--quiet", "--no-warnings", "--"])
            .arg(&track.url)
    }

    /// Extract `track` into `dir` and return the produced file.
    ///
    /// A non-zero exit fails with the tool's stderr as the reason. A zero exit
    /// that leaves no file at the expected path fails with
    /// [`DownloadError::MissingOutput`].
    pub async fn extract(&self, track: &Track, dir: &Path) -> Result<PathBuf> {
        let command = self.command(track, dir);
        debug!(command = %command, "Running extraction tool");

        let output = self.runner.run(command).await.map_err(|e| {
            DownloadError::Extraction(format!(
                "could not start {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !output.is_success() {
            let stderr = output.stderr_lossy();
            let reason = if stderr.is_empty() {
                output.status_description()
            } else {
                format!("{} ({})", stderr, output.status_description())
            };
            return Err(DownloadError::Extraction(reason));
        }

        let produced = track.output_path(dir);
        if !tokio::fs::try_exists(&produced).await? {
            return Err(DownloadError::MissingOutput(produced));
        }

        Ok(produced)
    }
}

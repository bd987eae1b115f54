//! Tag embedding through an external tool (ffmpeg compatible).

use crate::error::{DownloadError, Result};
use bridge_traits::process::{CommandRunner, CommandSpec};
use core_metadata::TrackMetadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Writes ID3 tags and optional front cover into a copy of an audio file.
#[derive(Clone)]
pub struct TagWriter {
    runner: Arc<dyn CommandRunner>,
    program: PathBuf,
}

impl TagWriter {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Command line producing `output` from `input`, tags and optional cover.
    ///
    /// Audio is stream-copied; the cover becomes an attached picture.
    pub fn command(
        &self,
        input: &Path,
        cover: Option<&Path>,
        metadata: &TrackMetadata,
        output: &Path,
    ) -> CommandSpec {
        let mut command = CommandSpec::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(input);

        command = match cover {
            Some(cover) => command
                .arg("-i")
                .arg(cover)
                .args(["-map", "0:a", "-map", "1:0"])
                .args(["-c:a", "copy", "-c:v", "mjpeg"])
                .args(["-disposition:v:0", "attached_pic"]),
            None => command.args(["-c", "copy"]),
        };

        for (key, value) in metadata.tags() {
            command = command.arg("-metadata").arg(format!("{}={}", key, value));
        }

        command
            .args(["-id3v2_version", "3", "-write_id3v1", "1"])
            .args(["-f", "mp3", "-y"])
            .arg(output)
    }

    /// Write a tagged copy of `input` to `output`.
    pub async fn write_tags(
        &self,
        input: &Path,
        cover: Option<&Path>,
        metadata: &TrackMetadata,
        output: &Path,
    ) -> Result<()> {
        let command = self.command(input, cover, metadata, output);
        debug!(command = %command, "Running tagging tool");

        let result = self.runner.run(command).await.map_err(|e| {
            DownloadError::Tagging(format!(
                "could not start {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !result.is_success() {
            let stderr = result.stderr_lossy();
            let reason = if stderr.is_empty() {
                result.status_description()
            } else {
                format!("{} ({})", stderr, result.status_description())
            };
            return Err(DownloadError::Tagging(reason));
        }

        Ok(())
    }

    /// Run `<tool> -version` and return the first line of its banner.
    pub async fn probe(&self) -> Result<String> {
        let output = self
            .runner
            .run(CommandSpec::new(&self.program).arg("-version"))
            .await
            .map_err(|e| DownloadError::Tagging(format!("{}: {}", self.program.display(), e)))?;

        if !output.is_success() {
            return Err(DownloadError::Tagging(format!(
                "{} -version exited with {}",
                self.program.display(),
                output.status_description()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::process::CommandOutput;

    struct VersionRunner;

    #[async_trait]
    impl CommandRunner for VersionRunner {
        async fn run(&self, command: CommandSpec) -> bridge_traits::Result<CommandOutput> {
            assert_eq!(command.args_lossy(), vec!["-version"]);
            Ok(CommandOutput {
                exit_code: Some(0),
                stdout: b"ffmpeg version 6.1 Copyright\nbuilt with gcc\n".to_vec(),
                stderr: Vec::new(),
            })
        }
    }

    fn metadata(year: Option<u16>) -> TrackMetadata {
        TrackMetadata {
            title: "One More Time".to_string(),
            artist: "Daft Punk".to_string(),
            album: "Discovery".to_string(),
            year,
            cover_url: None,
        }
    }

    #[test]
    fn test_command_with_cover() {
        let writer = TagWriter::new(Arc::new(VersionRunner), "ffmpeg");
        let command = writer.command(
            Path::new("/m/a.mp3"),
            Some(Path::new("/m/a.mp3.cover.jpg")),
            &metadata(Some(2001)),
            Path::new("/m/a.mp3.tmp"),
        );

        let args = command.args_lossy();
        assert_eq!(command.value_of("-disposition:v:0"), Some("attached_pic".into()));
        assert!(args.contains(&"/m/a.mp3.cover.jpg".to_string()));
        assert!(args.contains(&"title=One More Time".to_string()));
        assert!(args.contains(&"date=2001".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/m/a.mp3.tmp"));
    }

    #[test]
    fn test_command_without_cover_or_year() {
        let writer = TagWriter::new(Arc::new(VersionRunner), "ffmpeg");
        let command = writer.command(
            Path::new("/m/a.mp3"),
            None,
            &metadata(None),
            Path::new("/m/a.mp3.tmp"),
        );

        let args = command.args_lossy();
        assert_eq!(command.value_of("-c"), Some("copy".into()));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(!args.iter().any(|a| a.starts_with("date=")));
        assert_eq!(command.value_of("-f"), Some("mp3".into()));
    }

    #[tokio::test]
    async fn test_probe_reads_banner() {
        let writer = TagWriter::new(Arc::new(VersionRunner), "ffmpeg");
        assert_eq!(writer.probe().await.unwrap(), "ffmpeg version 6.1 Copyright");
    }
}

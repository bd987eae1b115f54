//! Shared fakes for pipeline tests.
//!
//! `FakeTools` stands in for both external programs. It writes real files
//! into the test's temporary directory so the materializer's filesystem
//! handling runs for real.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::process::{CommandOutput, CommandRunner, CommandSpec};
use bytes::Bytes;
use core_download::TrackMaterializer;
use core_library::models::Track;
use core_metadata::{MetadataError, MetadataResolver, TrackMetadata};
use core_runtime::config::AppConfig;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const EXTRACTOR: &str = "yt-dlp";
pub const TAGGER: &str = "ffmpeg";

#[derive(Default)]
pub struct FakeTools {
    /// Delay applied to every command, to make overlap observable
    pub delay: Duration,
    /// URLs whose extraction exits non-zero
    pub failing_urls: HashSet<String>,
    /// URLs whose extraction panics inside the worker
    pub panicking_urls: HashSet<String>,
    /// URLs whose extraction exits zero without producing a file
    pub silent_urls: HashSet<String>,
    /// Make every tagging run fail after writing a partial output
    pub fail_tagging: bool,
    /// Tagging exits zero without writing its output
    pub silent_tagging: bool,
    /// Tagging succeeds but leaves a directory where the original file was
    pub tagging_blocks_original: bool,

    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    extractions: Mutex<Vec<String>>,
    taggings: Mutex<Vec<CommandSpec>>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub fn panicking(mut self, url: &str) -> Self {
        self.panicking_urls.insert(url.to_string());
        self
    }

    pub fn silent(mut self, url: &str) -> Self {
        self.silent_urls.insert(url.to_string());
        self
    }

    pub fn with_failing_tagger(mut self) -> Self {
        self.fail_tagging = true;
        self
    }

    pub fn with_silent_tagger(mut self) -> Self {
        self.silent_tagging = true;
        self
    }

    pub fn with_tagger_blocking_original(mut self) -> Self {
        self.tagging_blocks_original = true;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// URLs passed to the extraction tool, in call order.
    pub fn extractions(&self) -> Vec<String> {
        self.extractions.lock().unwrap().clone()
    }

    pub fn taggings(&self) -> Vec<CommandSpec> {
        self.taggings.lock().unwrap().clone()
    }

    async fn extract(&self, command: &CommandSpec) -> CommandOutput {
        let args = command.args_lossy();
        let url = args.last().cloned().unwrap_or_default();
        self.extractions.lock().unwrap().push(url.clone());

        if self.panicking_urls.contains(&url) {
            panic!("extractor crashed on {url}");
        }
        if self.failing_urls.contains(&url) {
            return CommandOutput::failure(1, format!("ERROR: [generic] {url}: Video unavailable\n"));
        }
        if self.silent_urls.contains(&url) {
            return CommandOutput::success();
        }

        let template = command.value_of("--output").unwrap_or_default();
        let output = template.replace("%(ext)s", "mp3");
        std::fs::write(&output, format!("audio from {url}")).unwrap();
        CommandOutput::success()
    }

    async fn tag(&self, command: &CommandSpec) -> CommandOutput {
        self.taggings.lock().unwrap().push(command.clone());

        let args = command.args_lossy();
        let input = command.value_of("-i").unwrap_or_default();
        let output = args.last().cloned().unwrap_or_default();

        if self.fail_tagging {
            std::fs::write(&output, b"partial").unwrap();
            return CommandOutput::failure(1, "Error while opening encoder\n");
        }
        if self.silent_tagging {
            return CommandOutput::success();
        }

        let audio = std::fs::read_to_string(&input).unwrap();
        let tags: Vec<String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-metadata")
            .map(|(_, value)| value.clone())
            .collect();
        let has_cover = args.iter().filter(|a| *a == "-i").count() == 2;
        std::fs::write(
            &output,
            format!("{audio}\n[tagged cover={has_cover}] {}", tags.join(";")),
        )
        .unwrap();

        if self.tagging_blocks_original {
            std::fs::remove_file(&input).unwrap();
            std::fs::create_dir_all(Path::new(&input).join("locked")).unwrap();
        }
        CommandOutput::success()
    }
}

#[async_trait]
impl CommandRunner for FakeTools {
    async fn run(&self, command: CommandSpec) -> BridgeResult<CommandOutput> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let output = if command.program == Path::new(EXTRACTOR) {
            Ok(self.extract(&command).await)
        } else if command.program == Path::new(TAGGER) {
            Ok(self.tag(&command).await)
        } else {
            Err(BridgeError::NotAvailable(command.program.display().to_string()))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        output
    }
}

/// Resolver with a fixed answer per title; unknown titles have no match.
#[derive(Default)]
pub struct FakeResolver {
    matches: HashMap<String, TrackMetadata>,
    pub lookups: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match(mut self, title: &str, cover_url: Option<&str>) -> Self {
        self.matches.insert(
            title.to_string(),
            TrackMetadata {
                title: format!("{title} (Remastered)"),
                artist: "Canonical Artist".to_string(),
                album: "Canonical Album".to_string(),
                year: Some(1999),
                cover_url: cover_url.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl MetadataResolver for FakeResolver {
    async fn resolve(&self, title: &str, artist: &str) -> core_metadata::Result<TrackMetadata> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.matches
            .get(title)
            .cloned()
            .ok_or_else(|| MetadataError::NoMatch {
                title: title.to_string(),
                artist: artist.to_string(),
            })
    }
}

/// Serves a tiny JPEG for every URL, or 404 when `missing` is set.
#[derive(Default)]
pub struct FakeImageHost {
    pub missing: bool,
    pub requests: AtomicUsize,
}

#[async_trait]
impl HttpClient for FakeImageHost {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (status, body) = if self.missing {
            (404, Bytes::from_static(b"not found"))
        } else {
            (200, Bytes::from_static(b"\xFF\xD8\xFF\xE0fake-jpeg"))
        };
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body,
        })
    }
}

pub fn config(dir: &Path, max_concurrent: usize) -> AppConfig {
    AppConfig::builder()
        .music_directory(dir)
        .yt_dlp_path(EXTRACTOR)
        .ffmpeg_path(TAGGER)
        .max_concurrent(max_concurrent)
        .build()
        .unwrap()
}

pub fn track(i: usize) -> Track {
    Track::new(
        format!("https://video.test/watch?v={i}"),
        format!("Artist {i} - Song {i}"),
        format!("Song {i}"),
        format!("Artist {i}"),
    )
}

pub fn tracks(n: usize) -> Vec<Track> {
    (0..n).map(track).collect()
}

pub fn materializer(
    config: &AppConfig,
    tools: &Arc<FakeTools>,
    resolver: Option<Arc<FakeResolver>>,
    images: &Arc<FakeImageHost>,
) -> TrackMaterializer {
    TrackMaterializer::new(
        config,
        Arc::clone(tools) as Arc<dyn CommandRunner>,
        Arc::clone(images) as Arc<dyn HttpClient>,
        resolver.map(|r| r as Arc<dyn MetadataResolver>),
    )
}

/// All regular files in `dir`, sorted.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

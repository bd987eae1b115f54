//! Bootstrap and dependency setup of the download service

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::process::{CommandOutput, CommandRunner, CommandSpec};
use bytes::Bytes;
use core_download::{MaterializeOutcome, TrackOutcome};
use core_runtime::config::AppConfig;
use core_service::{DependencySetup, DownloadService, ServiceError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const BINARY: &[u8] = b"#!/bin/sh\necho fake\n";

/// Serves the release binary, or 404 when `missing` is set.
#[derive(Default)]
struct ReleaseHost {
    missing: bool,
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl HttpClient for ReleaseHost {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.urls.lock().unwrap().push(request.url.clone());
        let (status, body) = if self.missing {
            (404, Bytes::from_static(b"Not Found"))
        } else {
            (200, Bytes::from_static(BINARY))
        };
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body,
        })
    }
}

/// Answers `ffmpeg -version` and fakes audio extraction.
#[derive(Default)]
struct Tools {
    no_tagger: bool,
    extractions: AtomicUsize,
}

#[async_trait]
impl CommandRunner for Tools {
    async fn run(&self, command: CommandSpec) -> BridgeResult<CommandOutput> {
        if command.args_lossy() == vec!["-version"] {
            if self.no_tagger {
                return Err(BridgeError::NotAvailable(format!(
                    "{} not found",
                    command.program.display()
                )));
            }
            return Ok(CommandOutput {
                exit_code: Some(0),
                stdout: b"ffmpeg version 7.0 Copyright (c) 2000-2024\n".to_vec(),
                stderr: Vec::new(),
            });
        }

        self.extractions.fetch_add(1, Ordering::SeqCst);
        let output = command
            .value_of("--output")
            .unwrap_or_default()
            .replace("%(ext)s", "mp3");
        std::fs::write(output, b"audio").unwrap();
        Ok(CommandOutput::success())
    }
}

fn config(music: &Path) -> AppConfig {
    AppConfig::builder()
        .music_directory(music)
        .bookmark_path(music.join("Bookmarks"))
        .build()
        .unwrap()
}

fn setup(http: &Arc<ReleaseHost>, tools: &Arc<Tools>, install: &Path) -> DependencySetup {
    DependencySetup::new(
        Arc::clone(http) as Arc<dyn HttpClient>,
        Arc::clone(tools) as Arc<dyn CommandRunner>,
    )
    .with_install_dir(install)
    .with_release_base("https://releases.test/latest/")
}

#[tokio::test]
async fn test_prepare_updates_extractor_and_probes_tagger() {
    let dir = TempDir::new().unwrap();
    let music = dir.path().join("music");
    let mut config = config(&music);
    let http = Arc::new(ReleaseHost::default());
    let tools = Arc::new(Tools::default());

    let report = setup(&http, &tools, dir.path())
        .prepare(&mut config)
        .await
        .unwrap();

    let expected = dir.path().join(core_service::setup::yt_dlp_asset_name());
    assert!(music.is_dir());
    assert_eq!(report.tagger_version, "ffmpeg version 7.0 Copyright (c) 2000-2024");
    assert_eq!(report.extractor_updated, Some(expected.clone()));
    assert_eq!(report.update_warning, None);
    assert_eq!(config.yt_dlp_path, expected);
    assert_eq!(std::fs::read(&expected).unwrap(), BINARY);
    assert_eq!(
        http.urls.lock().unwrap().as_slice(),
        [format!(
            "https://releases.test/latest/{}",
            core_service::setup::yt_dlp_asset_name()
        )]
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&expected).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[tokio::test]
async fn test_failed_update_keeps_configured_extractor() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir.path().join("music"));
    let http = Arc::new(ReleaseHost {
        missing: true,
        ..Default::default()
    });
    let tools = Arc::new(Tools::default());

    let report = setup(&http, &tools, dir.path())
        .prepare(&mut config)
        .await
        .unwrap();

    assert_eq!(report.extractor_updated, None);
    assert!(report.update_warning.unwrap().contains("HTTP 404"));
    assert_eq!(config.yt_dlp_path, PathBuf::from("yt-dlp"));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name.to_string_lossy().starts_with("yt-dlp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_missing_tagger_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir.path().join("music"));
    let http = Arc::new(ReleaseHost::default());
    let tools = Arc::new(Tools {
        no_tagger: true,
        ..Default::default()
    });

    let err = setup(&http, &tools, dir.path())
        .prepare(&mut config)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::TaggerMissing(reason) if reason.contains("ffmpeg")));
}

#[test]
fn test_resolver_requires_both_credential_halves() {
    let dir = TempDir::new().unwrap();
    let http = Arc::new(ReleaseHost::default()) as Arc<dyn HttpClient>;
    let tools = Arc::new(Tools::default()) as Arc<dyn CommandRunner>;

    let partial = AppConfig::builder()
        .music_directory(dir.path())
        .catalog_credentials("id", "")
        .build()
        .unwrap();
    let service = DownloadService::new(partial, Arc::clone(&http), Arc::clone(&tools)).unwrap();
    assert!(!service.has_resolver());

    let full = AppConfig::builder()
        .music_directory(dir.path())
        .catalog_credentials("id", "secret")
        .build()
        .unwrap();
    let service = DownloadService::new(full, http, tools).unwrap();
    assert!(service.has_resolver());
}

#[tokio::test]
async fn test_bookmarks_to_untagged_files() {
    let dir = TempDir::new().unwrap();
    let music = dir.path().join("music");
    std::fs::create_dir_all(&music).unwrap();
    std::fs::write(
        music.join("Bookmarks"),
        r#"{
            "roots": {
                "bookmark_bar": {
                    "type": "folder",
                    "name": "Bookmarks bar",
                    "children": [
                        {
                            "type": "folder",
                            "name": "Music",
                            "children": [
                                { "type": "url", "name": "Daft Punk - One More Time", "url": "https://v.test/1" },
                                { "type": "url", "name": "Air - La Femme d'Argent", "url": "https://v.test/2" }
                            ]
                        }
                    ]
                }
            }
        }"#,
    )
    .unwrap();

    let tools = Arc::new(Tools::default());
    let service = DownloadService::new(
        config(&music),
        Arc::new(ReleaseHost::default()),
        Arc::clone(&tools) as Arc<dyn CommandRunner>,
    )
    .unwrap();
    let mut events = service.events().subscribe();

    let tracks = service.load_tracks().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "One More Time");
    assert_eq!(tracks[1].artist, "Air");

    let result = service.run(tracks).await;
    assert_eq!(result.succeeded(), 2);
    assert!(result
        .entries()
        .iter()
        .all(|e| matches!(e.outcome, TrackOutcome::Success(MaterializeOutcome::Untagged { .. }))));
    assert!(music.join("Daft Punk - One More Time.mp3").exists());
    assert!(music.join("Air - La Femme d'Argent.mp3").exists());
    assert_eq!(tools.extractions.load(Ordering::SeqCst), 2);
    assert!(events.try_recv().is_ok());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = AppConfig::default();
    config.max_concurrent = 0;

    let result = DownloadService::new(
        config,
        Arc::new(ReleaseHost::default()),
        Arc::new(Tools::default()),
    );
    assert!(matches!(result, Err(ServiceError::Config(_))));
}

#[test]
fn test_high_concurrency_is_accepted() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::builder()
        .music_directory(dir.path())
        .max_concurrent(100)
        .build()
        .unwrap();

    let service = DownloadService::new(
        config,
        Arc::new(ReleaseHost::default()),
        Arc::new(Tools::default()),
    )
    .unwrap();
    assert_eq!(service.config().max_concurrent, 100);
}

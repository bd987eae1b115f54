//! Download service façade and bootstrap helpers.
//!
//! Wires host bridge implementations (HTTP, external processes) and the
//! application config into a ready-to-run [`DownloadService`]. Desktop hosts
//! call [`DownloadService::bootstrap_desktop`]; tests pass their own bridges
//! to [`DownloadService::new`].
//!
//! ```ignore
//! let mut service = DownloadService::bootstrap_desktop(config)?;
//! service.prepare().await?;
//! let tracks = service.load_tracks()?;
//! let result = service.run(tracks).await;
//! ```

pub mod error;
pub mod setup;

pub use error::{Result, ServiceError};
pub use setup::{DependencySetup, SetupReport};

use std::sync::Arc;

use bridge_desktop::{ReqwestHttpClient, TokioCommandRunner};
use bridge_traits::{http::HttpClient, process::CommandRunner};
use core_download::{BatchCoordinator, BatchResult, TrackMaterializer};
use core_library::{BookmarkReader, Track, TrackNameLayout};
use core_metadata::{CatalogClient, MetadataResolver};
use core_runtime::config::AppConfig;
use core_runtime::events::EventBus;
use tracing::{info, warn};

/// Primary façade exposed to the command line.
pub struct DownloadService {
    config: AppConfig,
    http_client: Arc<dyn HttpClient>,
    runner: Arc<dyn CommandRunner>,
    resolver: Option<Arc<dyn MetadataResolver>>,
    event_bus: EventBus,
}

impl DownloadService {
    /// Create a service from explicit bridge handles.
    ///
    /// A catalog resolver is built only when the config carries both halves
    /// of the credentials.
    pub fn new(
        config: AppConfig,
        http_client: Arc<dyn HttpClient>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        config.validate()?;

        let resolver = match config.catalog_credentials() {
            Some(credentials) => Some(Arc::new(
                CatalogClient::new(Arc::clone(&http_client), Some(credentials))
                    .with_timeout(config.http_timeout()),
            ) as Arc<dyn MetadataResolver>),
            None => {
                warn!("Catalog credentials not configured, tracks will be kept untagged");
                None
            }
        };

        Ok(Self {
            config,
            http_client,
            runner,
            resolver,
            event_bus: EventBus::default(),
        })
    }

    /// Create a service backed by reqwest and tokio processes.
    pub fn bootstrap_desktop(config: AppConfig) -> Result<Self> {
        let http_client = Arc::new(ReqwestHttpClient::with_timeout(config.http_timeout())?);
        let runner = Arc::new(TokioCommandRunner::new());
        Self::new(config, http_client, runner)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Bus carrying batch and per-track progress.
    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Setup steps bound to this service's bridges.
    pub fn dependency_setup(&self) -> DependencySetup {
        DependencySetup::new(Arc::clone(&self.http_client), Arc::clone(&self.runner))
    }

    /// Prepare the output directory and external tools.
    ///
    /// A successful extraction tool update is applied to this service's
    /// config for the following run.
    pub async fn prepare(&mut self) -> Result<SetupReport> {
        let setup = self.dependency_setup();
        setup.prepare(&mut self.config).await
    }

    /// Tracks from the configured bookmark folder, in bookmark order.
    pub fn load_tracks(&self) -> Result<Vec<Track>> {
        let layout = TrackNameLayout::new(
            self.config.music_separator.clone(),
            self.config.title_position,
            self.config.artist_position,
        );
        let tracks = BookmarkReader::new(self.config.bookmark_position, layout)
            .read_file(&self.config.bookmark_path)?;

        info!(count = tracks.len(), "Loaded tracks from bookmarks");
        Ok(tracks)
    }

    /// Run one batch. Track failures are reported in the result.
    pub async fn run(&self, tracks: Vec<Track>) -> BatchResult {
        let materializer = TrackMaterializer::new(
            &self.config,
            Arc::clone(&self.runner),
            Arc::clone(&self.http_client),
            self.resolver.clone(),
        )
        .with_event_bus(self.event_bus.clone());

        BatchCoordinator::new(Arc::new(materializer), self.config.max_concurrent)
            .with_event_bus(self.event_bus.clone())
            .run(tracks)
            .await
    }
}

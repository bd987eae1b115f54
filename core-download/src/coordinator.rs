//! # Batch Pipeline Coordinator
//!
//! Runs every track of a batch through the [`TrackMaterializer`] with at most
//! `max_concurrent` tracks in flight.
//!
//! ## Architecture
//!
//! ```text
//!             spawn one task per track
//! tracks ──┬──> [permit] materialize ──┐
//!          ├──> [permit] materialize ──┼──> mpsc ──> collector ──> BatchResult
//!          └──> [waiting for permit] ──┘                 │
//!                                                         └──> EventBus (progress)
//! ```
//!
//! - A counting semaphore gates the pipeline; the permit is held for the whole
//!   materialization and released on success, failure or panic.
//! - Each task sends exactly one [`TrackResult`]. A single collector owns the
//!   accumulation, the progress counter and the progress events.
//! - Every join handle is awaited. A panicking task is recorded as a failure
//!   so the result still has one entry per track.

use crate::error::DownloadError;
use crate::materializer::TrackMaterializer;
use crate::result::{BatchResult, MaterializeOutcome, TrackOutcome, TrackResult};
use core_library::models::Track;
use core_runtime::events::{BatchEvent, CoreEvent, EventBus, TrackEvent, TrackStage};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, instrument, warn};

/// Drives one batch to completion.
pub struct BatchCoordinator {
    materializer: Arc<TrackMaterializer>,
    max_concurrent: usize,
    event_bus: Option<EventBus>,
}

impl BatchCoordinator {
    /// `max_concurrent` below 1 is treated as 1.
    pub fn new(materializer: Arc<TrackMaterializer>, max_concurrent: usize) -> Self {
        Self {
            materializer,
            max_concurrent: max_concurrent.max(1),
            event_bus: None,
        }
    }

    /// Publish batch and track events on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Process every track exactly once and return all outcomes.
    ///
    /// Never fails as a whole: per-track errors become
    /// [`TrackOutcome::Failure`] entries.
    #[instrument(skip(self, tracks), fields(total = tracks.len(), max_concurrent = self.max_concurrent))]
    pub async fn run(&self, tracks: Vec<Track>) -> BatchResult {
        let total = tracks.len();
        info!("Starting batch");
        emit(&self.event_bus, CoreEvent::Batch(BatchEvent::Started { total }));

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let (tx, rx) = mpsc::unbounded_channel::<TrackResult>();

        let mut handles = Vec::with_capacity(total);
        for track in tracks {
            let semaphore = Arc::clone(&semaphore);
            let materializer = Arc::clone(&self.materializer);
            let event_bus = self.event_bus.clone();
            let tx = tx.clone();
            let name = track.name.clone();

            let handle = tokio::spawn(async move {
                emit(
                    &event_bus,
                    CoreEvent::Track(TrackEvent::Stage {
                        track: track.name.clone(),
                        stage: TrackStage::Waiting,
                    }),
                );

                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let result = materializer.materialize(&track).await;
                        drop(permit);
                        result
                    }
                    Err(e) => Err(DownloadError::Scheduling(e.to_string())),
                };

                let entry = match result {
                    Ok(outcome) => TrackResult::success(track.name, outcome),
                    Err(e) => TrackResult::failure(track.name, e.to_string()),
                };
                // The collector outlives every task
                tx.send(entry).ok();
            });

            handles.push((name, handle));
        }

        let dispatch = async move {
            for (name, handle) in handles {
                if let Err(e) = handle.await {
                    error!(track = %name, error = %e, "Track worker panicked");
                    let reason = DownloadError::Scheduling(e.to_string()).to_string();
                    tx.send(TrackResult::failure(name, reason)).ok();
                }
            }
            // Dropping the last sender lets the collector finish
        };

        let (result, ()) = tokio::join!(collect(rx, total, self.event_bus.clone()), dispatch);

        info!(
            succeeded = result.succeeded(),
            failed = result.failed(),
            "Batch finished"
        );
        emit(
            &self.event_bus,
            CoreEvent::Batch(BatchEvent::Completed {
                succeeded: result.succeeded(),
                failed: result.failed(),
            }),
        );

        result
    }
}

/// Sole owner of the batch result while tasks are running.
async fn collect(
    mut rx: mpsc::UnboundedReceiver<TrackResult>,
    total: usize,
    event_bus: Option<EventBus>,
) -> BatchResult {
    let mut result = BatchResult::default();

    while let Some(entry) = rx.recv().await {
        let event = match &entry.outcome {
            TrackOutcome::Success(MaterializeOutcome::Skipped) => {
                info!(track = %entry.track_name, "Already downloaded");
                TrackEvent::Skipped {
                    track: entry.track_name.clone(),
                }
            }
            TrackOutcome::Success(outcome) => {
                info!(track = %entry.track_name, "Done");
                TrackEvent::Succeeded {
                    track: entry.track_name.clone(),
                    note: outcome.note(),
                }
            }
            TrackOutcome::Failure { reason } => {
                warn!(track = %entry.track_name, %reason, "Track failed");
                TrackEvent::Failed {
                    track: entry.track_name.clone(),
                    reason: reason.clone(),
                }
            }
        };

        result.push(entry);
        emit(&event_bus, CoreEvent::Track(event));
        emit(
            &event_bus,
            CoreEvent::Batch(BatchEvent::progress(result.len(), total)),
        );
    }

    result
}

fn emit(event_bus: &Option<EventBus>, event: CoreEvent) {
    if let Some(bus) = event_bus {
        // No subscriber is fine
        bus.emit(event).ok();
    }
}

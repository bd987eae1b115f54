//! # Download Module
//!
//! The batch download pipeline.
//!
//! ## Overview
//!
//! - [`BatchCoordinator`] fans a list of tracks out under a concurrency cap and
//!   aggregates one outcome per track into a [`BatchResult`]
//! - [`TrackMaterializer`] runs a single track: extraction, optional metadata
//!   lookup and cover art, tag embedding with rollback
//! - [`AudioExtractor`] and [`TagWriter`] describe the external tool
//!   invocations; a [`CommandRunner`](bridge_traits::CommandRunner) executes them
//!
//! Track failures never abort the batch.

pub mod coordinator;
pub mod cover;
pub mod error;
pub mod extractor;
pub mod materializer;
pub mod result;
pub mod tagger;

pub use coordinator::BatchCoordinator;
pub use cover::CoverArt;
pub use error::{DownloadError, Result};
pub use extractor::AudioExtractor;
pub use materializer::{TrackMaterializer, NO_METADATA_NOTE};
pub use result::{BatchResult, MaterializeOutcome, TrackOutcome, TrackResult};
pub use tagger::TagWriter;

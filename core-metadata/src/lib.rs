//! # Metadata Module
//!
//! Resolves canonical track metadata (title, artist, album, year, cover art)
//! from a remote music catalog.
//!
//! ## Overview
//!
//! - [`MetadataResolver`]: the seam the download pipeline depends on
//! - [`CatalogClient`]: client-credentials catalog client (Spotify Web API
//!   compatible) built on the host [`HttpClient`](bridge_traits::HttpClient)
//! - [`TokenCache`]: run-scoped bearer token with single-flight first fetch
//!
//! Every failure is returned as a distinct [`MetadataError`]; callers are free
//! to treat them all as "no metadata".

pub mod catalog;
pub mod error;
pub mod models;
pub mod token;

pub use catalog::{CatalogClient, CatalogEndpoints, MetadataResolver};
pub use error::{MetadataError, Result};
pub use models::{parse_year, TrackMetadata};
pub use token::{CatalogToken, TokenCache};

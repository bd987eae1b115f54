//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for tunefetch:
//! - Application configuration and its JSON persistence
//! - Logging and tracing bootstrap
//! - Event bus for batch and per-track progress
//!
//! Every other crate in the workspace depends on this one for its settings
//! type and event vocabulary.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{AppConfig, AppConfigBuilder, CatalogCredentials, ConfigStore};
pub use error::{Error, Result};
pub use events::{BatchEvent, CoreEvent, EventBus, TrackEvent, TrackStage};

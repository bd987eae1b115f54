//! # Host Bridge Traits
//!
//! Capability traits the download core needs from its host.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP for the catalog service and asset downloads
//! - [`CommandRunner`](process::CommandRunner) - Runs the external extraction and tagging tools
//!
//! Desktop implementations live in `bridge-desktop`. Tests substitute fakes or
//! `mockall` mocks so no network or external binary is needed.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Implementations
//! should convert platform errors to `BridgeError` and keep enough context
//! (URL, program name) for the message to be actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! by every pipeline worker.

pub mod error;
pub mod http;
pub mod process;

pub use error::{BridgeError, Result};

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use process::{CommandOutput, CommandRunner, CommandSpec};

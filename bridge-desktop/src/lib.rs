//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `CommandRunner` using `tokio::process`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioCommandRunner};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let http_client = Arc::new(ReqwestHttpClient::with_timeout(Duration::from_secs(30))?);
//! let runner = Arc::new(TokioCommandRunner::new());
//! ```

mod http;
mod process;

pub use http::ReqwestHttpClient;
pub use process::TokioCommandRunner;

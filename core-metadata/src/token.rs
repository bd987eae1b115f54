//! Catalog bearer token and its run-scoped cache.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Token issued by the client-credentials exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds as reported by the issuer. Informational only.
    #[serde(default)]
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl fmt::Debug for CatalogToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Holds at most one token for the lifetime of a run.
///
/// The first caller to find the cache empty performs the exchange while
/// concurrent callers wait on the fetch lock and then reuse its result. A
/// failed exchange caches nothing, so the next caller tries again.
///
/// Expiry is not tracked. Once the catalog stops accepting the token,
/// lookups fail with an authorization error for the rest of the run.
#[derive(Default)]
pub struct TokenCache {
    token: RwLock<Option<CatalogToken>>,
    fetch_lock: Mutex<()>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached access token, running `fetch` if there is none yet.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CatalogToken>>,
    {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.access_token.clone());
        }

        let _guard = self.fetch_lock.lock().await;

        // Another caller may have fetched while we waited
        if let Some(token) = self.token.read().await.as_ref() {
            debug!("Token fetched by concurrent caller");
            return Ok(token.access_token.clone());
        }

        let token = fetch().await?;
        let access_token = token.access_token.clone();
        *self.token.write().await = Some(token);

        Ok(access_token)
    }

    /// Whether a token is currently cached.
    pub async fn is_cached(&self) -> bool {
        self.token.read().await.is_some()
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}

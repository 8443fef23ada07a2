//! Polling client for the experiment registry API
//!
//! [`ApiClient`] wraps the four endpoints. [`ExperimentListView`] and
//! [`ExperimentDetailView`] keep a background poll running while they are
//! alive, hold on to the last good snapshot across failures, and re-poll
//! after their own mutations.

/// HTTP client for the experiment endpoints
pub mod api;

/// Create-request drafts and known catalogues
pub mod draft;

/// Client error types
pub mod error;

/// Background refresh loop
pub mod poll;

/// List and detail views
pub mod views;

pub use api::ApiClient;
pub use draft::{ExperimentDraft, ExperimentTypeInfo, EXPERIMENT_TYPES};
pub use error::{ClientError, ClientResult};
pub use poll::{Poller, ViewState};
pub use views::{DeleteOutcome, ExperimentDetailView, ExperimentListView};

use std::time::Duration;

/// Default server root
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default refresh cadence for mounted views
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server root, without the `/api` suffix
    pub base_url: String,

    /// Refresh cadence for mounted views
    pub poll_interval: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with default timings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load config from `CHAOS_REGISTRY_URL`, falling back to defaults
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("CHAOS_REGISTRY_URL") {
            Ok(url) if !url.is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }
}

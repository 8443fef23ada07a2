//! HTTP surface over the experiment registry
//!
//! Axum-based REST server exposing list/get/create/delete on
//! `/api/experiments`, with permissive CORS and optional static dashboard
//! serving.

/// API error types
pub mod error;

/// HTTP handlers for REST endpoints
pub mod handlers;

/// Server configuration from TOML
pub mod config;

/// Server instance management
pub mod instance;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use handlers::AppState;
pub use instance::{app, ChaosRegistryServer};

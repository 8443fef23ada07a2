//! HTTP handlers for the experiment REST endpoints

use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, Request, State},
    handler::HandlerWithoutStateExt,
    http::{header, Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::{Arc, MutexGuard};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{debug, error, info, warn};

use crate::registry::{ExperimentDefinition, ExperimentKey, ExperimentRecord, Registry, SharedRegistry};
use crate::server::config::ServerConfig;
use crate::server::error::{ApiError, ApiResult};

/// Collection route
pub const EXPERIMENTS_PATH: &str = "/api/experiments";

/// Single-experiment route; handlers re-read both segments from the raw URI
pub const EXPERIMENT_PATH: &str = "/api/experiments/:namespace/:name";

/// State shared across all handlers
///
/// The registry sits behind a single mutex; every handler takes the lock
/// once, does its work synchronously and releases it before responding.
#[derive(Clone)]
pub struct AppState {
    /// Experiment registry
    pub registry: SharedRegistry,

    /// Immutable server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new AppState owning the registry
    pub fn new(registry: Registry, config: ServerConfig) -> Self {
        Self {
            registry: registry.into_shared(),
            config: Arc::new(config),
        }
    }

    /// Create AppState from an existing shared registry
    pub fn new_from_arc(registry: SharedRegistry, config: ServerConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, Registry>> {
        self.registry.lock().map_err(|_| {
            error!("Registry lock poisoned");
            ApiError::internal("Internal server error")
        })
    }
}

/// Split `/api/experiments/{namespace}/{name}` into its two segments
///
/// Segments are compared as sent: percent escapes are not decoded, so
/// `a%20b` only addresses a record literally named `a%20b`.
fn experiment_key(path: &str) -> Option<ExperimentKey> {
    let rest = path.strip_prefix(EXPERIMENTS_PATH)?.strip_prefix('/')?;
    let mut segments = rest.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(namespace), Some(name), None) if !namespace.is_empty() && !name.is_empty() => {
            Some(ExperimentKey::new(namespace, name))
        }
        _ => None,
    }
}

fn key_from_uri(uri: &Uri) -> ApiResult<ExperimentKey> {
    experiment_key(uri.path()).ok_or_else(ApiError::route_not_found)
}

/// GET /api/experiments - List all experiments in registry order
pub async fn list_experiments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ExperimentRecord>>> {
    let registry = state.lock()?;
    debug!(count = registry.len(), "Listing experiments");
    Ok(Json(registry.list().to_vec()))
}

/// GET /api/experiments/:namespace/:name - Fetch one experiment
pub async fn get_experiment(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<ExperimentRecord>> {
    let key = key_from_uri(&uri)?;
    let registry = state.lock()?;
    let record = registry.get(&key.namespace, &key.name).map_err(|e| {
        debug!("{}", e);
        ApiError::from(e)
    })?;
    Ok(Json(record.clone()))
}

/// POST /api/experiments - Register a new experiment in the `Pending` phase
///
/// The body is parsed by hand so that any unparseable payload, regardless
/// of content type, maps to the same 400 body. Parseable JSON is never
/// rejected; see [`ExperimentDefinition::from_value`] for non-objects.
pub async fn create_experiment(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ExperimentRecord>)> {
    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected create request: {}", e);
        ApiError::invalid_json()
    })?;
    let definition = ExperimentDefinition::from_value(value);

    let mut registry = state.lock()?;
    let record = registry.insert(definition).map_err(|e| {
        warn!("{}", e);
        ApiError::from(e)
    })?;
    Ok((StatusCode::CREATED, Json(record.clone())))
}

/// DELETE /api/experiments/:namespace/:name - Remove one experiment
pub async fn delete_experiment(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<StatusCode> {
    let key = key_from_uri(&uri)?;
    let mut registry = state.lock()?;
    registry.remove(&key.namespace, &key.name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for every unmatched path or method
pub async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Answer every `OPTIONS` request with an empty 204
///
/// Runs outside the CORS layer so the CORS headers it adds are kept.
pub async fn preflight_no_content(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let (mut parts, _) = next.run(request).await.into_parts();
    parts.status = StatusCode::NO_CONTENT;
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::empty())
}

/// Permissive CORS: any origin, the dashboard's methods, JSON bodies
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// Create router with all API endpoints
///
/// With a static directory configured, unmatched requests are tried against
/// it before falling through to the JSON 404.
pub fn create_router(config: &ServerConfig) -> Router<AppState> {
    let router = Router::new()
        .route(
            EXPERIMENTS_PATH,
            get(list_experiments)
                .post(create_experiment)
                .fallback(route_not_found),
        )
        .route(
            EXPERIMENT_PATH,
            get(get_experiment)
                .delete(delete_experiment)
                .fallback(route_not_found),
        );

    match &config.static_dir {
        Some(dir) => {
            info!("Serving dashboard from {}", dir.display());
            router.fallback_service(
                ServeDir::new(dir)
                    .call_fallback_on_method_not_allowed(true)
                    .not_found_service(route_not_found.into_service()),
            )
        }
        None => router.fallback(route_not_found),
    }
}

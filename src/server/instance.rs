//! Server instance management

use axum::{middleware, Router};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::registry::{Registry, SharedRegistry};
use crate::server::config::ServerConfig;
use crate::server::error::ApiError;
use crate::server::handlers::{cors_layer, create_router, preflight_no_content, AppState};

/// Assemble the full application: routes, request tracing, CORS, preflight
pub fn app(state: AppState) -> Router {
    let enable_logging = state.config.enable_logging;
    let mut app = create_router(&state.config).with_state(state);

    if enable_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.layer(cors_layer())
        .layer(middleware::from_fn(preflight_no_content))
}

/// Chaos experiment registry HTTP server
///
/// Owns the registry for the lifetime of the process and manages the axum
/// server lifecycle including startup and graceful shutdown.
pub struct ChaosRegistryServer {
    /// Server configuration
    config: ServerConfig,

    /// Registry wrapped in Arc<Mutex> for sharing with handlers
    registry: SharedRegistry,
}

impl ChaosRegistryServer {
    /// Create new server instance, seeding the registry if configured
    pub fn new(config: ServerConfig) -> Result<Self, ApiError> {
        if let Err(e) = config.validate() {
            return Err(ApiError::internal(format!("Invalid config: {}", e)));
        }

        let registry = if config.seed_samples {
            Registry::seeded(config.duplicate_policy, Utc::now())
        } else {
            Registry::with_policy(config.duplicate_policy)
        };

        Ok(Self {
            config,
            registry: registry.into_shared(),
        })
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ApiError> {
        self.config
            .socket_addr()
            .map_err(|e| ApiError::internal(format!("Failed to parse address: {}", e)))
    }

    /// Build the router over this server's registry
    #[must_use]
    pub fn router(&self) -> Router {
        app(AppState::new_from_arc(
            Arc::clone(&self.registry),
            self.config.clone(),
        ))
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn start(&self) -> Result<(), ApiError> {
        let addr = self.socket_addr()?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind to {}: {:?}", addr, e);
            ApiError::internal(format!("Failed to bind to {}: {}", addr, e))
        })?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until Ctrl+C or SIGTERM
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ApiError> {
        let local = listener
            .local_addr()
            .map_err(|e| ApiError::internal(format!("Failed to read local address: {}", e)))?;
        info!("Server listening on: http://{}", local);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(wait_for_shutdown())
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get registry reference
    #[must_use]
    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Get server URL
    #[must_use]
    pub fn server_url(&self) -> String {
        self.config.server_url()
    }
}

/// Resolve once Ctrl+C or SIGTERM is received
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix;
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received TERM signal");
            }
            Err(e) => {
                error!("Failed to install TERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

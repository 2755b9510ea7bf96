//! HTTP transport implementation.
//!
//! Serves the host endpoints under `/api/tools` and `/api/health`, dispatches
//! `/api/<tool-id>/...` to the router of the addressed tool, and serves the
//! front-end assets under `/static`.

use axum::{
    Json, Router,
    extract::{Path, Request, State, rejection::PathRejection},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, instrument, warn};

use super::{HttpConfig, TransportError, TransportResult};
use crate::core::DevToolsServer;
use crate::core::security::PathSecurityError;
use crate::domains::tools::assets::STATIC_URL_PREFIX;
use crate::domains::tools::{ApiError, ApiResult, method_not_allowed, success};

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
struct AppState {
    server: DevToolsServer,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Run the HTTP transport until Ctrl-C.
    pub async fn run(self, server: DevToolsServer) -> TransportResult<()> {
        let addr = self.address();

        let mut app = build_router(server);

        // Add CORS if enabled
        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let local = listener.local_addr().map_err(TransportError::LocalAddr)?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", local, cors_status);
        info!("  → Tools:    GET /api/tools");
        info!("  → Refresh:  POST /api/tools/refresh");
        info!("  → Health:   GET /api/health");
        info!("  → Tool API: /api/<tool-id>/...");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(TransportError::Serve)?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Build the application router: host endpoints, tool dispatch and static
/// assets. CORS is left to the caller.
pub fn build_router(server: DevToolsServer) -> Router {
    let static_dir = server.config().tools.static_dir.clone();
    let state = AppState { server };

    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/refresh", post(refresh_tools))
        .route("/api/tools/imports", get(list_imports))
        .route("/api/tools/{tool_id}/panels", get(list_panels))
        .route("/api/tools/{tool_id}/endpoints", get(list_endpoints))
        .route("/api/{tool_id}/{*rest}", any(dispatch))
        .nest_service(STATIC_URL_PREFIX, ServeDir::new(static_dir))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Host Endpoints
// ============================================================================

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "tools": "/api/tools",
            "refresh": "/api/tools/refresh",
            "imports": "/api/tools/imports",
            "panels": "/api/tools/{tool_id}/panels",
            "health": "/api/health",
            "static": STATIC_URL_PREFIX,
        },
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "tools_count": state.server.tools_count().await,
    }))
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    success(json!({ "tools": state.server.list_tools().await }))
}

async fn refresh_tools(State(state): State<AppState>) -> ApiResult {
    let count = state.server.refresh_tools().await.map_err(ApiError::internal)?;
    Ok(success(json!({ "tools_count": count })))
}

async fn list_imports(State(state): State<AppState>) -> Json<Value> {
    success(json!({ "imports": state.server.resolve_imports().await }))
}

async fn list_panels(
    State(state): State<AppState>,
    tool_id: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let Path(tool_id) = tool_id.map_err(bad_path)?;
    let panels = state.server.list_panels(&tool_id).map_err(|e| match e {
        PathSecurityError::InvalidSegment { .. } | PathSecurityError::OutsideRootDirectory { .. } => {
            ApiError::bad_request(e.to_string())
        }
        other => ApiError::internal(other),
    })?;
    Ok(success(json!({ "panels": panels })))
}

async fn list_endpoints(
    State(state): State<AppState>,
    tool_id: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let Path(tool_id) = tool_id.map_err(bad_path)?;
    let endpoints = state
        .server
        .tool_endpoints(&tool_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Tool not found: {}", tool_id)))?;
    Ok(success(json!({ "endpoints": endpoints })))
}

// ============================================================================
// Tool Dispatch
// ============================================================================

/// Hand the request to the router of the addressed tool.
///
/// The lookup goes through the current snapshot, so a request that started
/// before a refresh finishes against the routes it was dispatched to.
#[instrument(skip_all, fields(tool_id))]
async fn dispatch(
    State(state): State<AppState>,
    params: Result<Path<(String, String)>, PathRejection>,
    request: Request,
) -> Response {
    let Path((tool_id, _rest)) = match params {
        Ok(params) => params,
        Err(rejection) => return bad_path(rejection).into_response(),
    };
    Span::current().record("tool_id", tool_id.as_str());
    let registry = state.server.registry().await;

    let Some(tool) = registry.get(&tool_id) else {
        return ApiError::not_found(format!("Tool not found: {}", tool_id)).into_response();
    };
    let Some(router) = tool.router() else {
        return ApiError::not_found(format!("Tool {} exposes no endpoints", tool_id))
            .into_response();
    };

    router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {})
}

fn bad_path(rejection: PathRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

async fn not_found(request: Request) -> ApiError {
    ApiError::not_found(format!("No route for {}", request.uri().path()))
}

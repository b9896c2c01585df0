//! HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/search/{query}?limit=N` | Ranked page-granularity search, fetched from storage |
//! | `GET`  | `/search/{keyword}` | Sync, then line-granularity search over the local cache |
//! | `GET`  | `/sync` | Download issues missing from the local cache |
//!
//! # Error Contract
//!
//! Any request-level failure (metadata store unreachable, cache directory
//! unusable) is answered with `500` and a body of the form:
//!
//! ```json
//! { "detail": "metadata store unavailable: connection refused" }
//! ```
//!
//! A per-issue failure never produces an error response; the issue is
//! skipped and the search continues.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::cache;
use crate::config::Config;
use crate::corpus::Backends;
use crate::error::SearchError;
use crate::models::{LineSearchResponse, PageSearchResponse};
use crate::search::{search_lines, search_pages, PageSearchOptions};

/// Backends and search defaults shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub backends: Backends,
    /// Limit used when `?limit=` is absent.
    pub default_limit: usize,
    pub context_chars: usize,
}

impl AppState {
    pub fn new(backends: Backends, config: &Config) -> Self {
        Self {
            backends,
            default_limit: config.search.default_limit,
            context_chars: config.search.context_chars,
        }
    }
}

/// Starts the HTTP server on `[server].bind` with production backends.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let backends = Backends::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    serve(listener, AppState::new(backends, config)).await
}

/// Serves the API on an already-bound listener.
///
/// Lets tests and embedders inject their own [`Backends`].
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Builds the router with all routes and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/search/{query}", get(handle_page_search))
        .route("/search/{keyword}", get(handle_line_search))
        .route("/sync", get(handle_sync))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error body: `{ "detail": "<message>" }`.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// A failed request, rendered as `{ "detail": ... }`.
struct AppError {
    status: StatusCode,
    detail: String,
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        tracing::error!("request failed: {}", err);
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

// ============ GET / and GET /health ============

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Magazine search API is running",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/search/{query} ============

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

/// Ranked search over PDFs fetched from object storage.
async fn handle_page_search(
    State(state): State<AppState>,
    Path(query): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<PageSearchResponse>, AppError> {
    let options = PageSearchOptions {
        limit: params.limit.unwrap_or(state.default_limit),
        context_chars: state.context_chars,
    };
    let corpus = state.backends.remote_corpus();
    let response = search_pages(&corpus, &query, options).await?;
    Ok(Json(response))
}

// ============ GET /search/{keyword} ============

/// Syncs the cache, then returns every matching line across it.
async fn handle_line_search(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> Result<Json<LineSearchResponse>, AppError> {
    let backends = &state.backends;
    cache::sync(
        backends.metadata.as_ref(),
        backends.blobs.as_ref(),
        &backends.cache,
    )
    .await?;

    let corpus = backends.cached_corpus();
    let response = search_lines(&corpus, &keyword).await?;
    Ok(Json(response))
}

// ============ GET /sync ============

#[derive(Serialize)]
struct SyncResponse {
    status: &'static str,
    new_downloads: usize,
    total_magazines: usize,
}

async fn handle_sync(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    let backends = &state.backends;
    let stats = cache::sync(
        backends.metadata.as_ref(),
        backends.blobs.as_ref(),
        &backends.cache,
    )
    .await?;

    Ok(Json(SyncResponse {
        status: "success",
        new_downloads: stats.new_downloads,
        total_magazines: stats.total_magazines,
    }))
}

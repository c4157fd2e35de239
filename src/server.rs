//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/q/{query}` | Search; JSON array of `{uri, name, src, description}` |
//! | `GET`  | `/update/{token}/{start}/{finish}` | Rebuild the index, streaming progress |
//! | `GET`  | `/delete/{token}` | Remove every entry |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "unauthorized", "message": "invalid token" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `conflict` (409),
//! `internal` (500).
//! Search never errors; failures degrade to `[]`.
//!
//! # CORS
//!
//! Only the search routes carry CORS headers, and only for origins listed in
//! `[server].allowed_origins`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::stream;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::error::BuildError;
use crate::fetch::CorpusFetcher;
use crate::indexer::BulkIndexer;
use crate::migrate;
use crate::models::SearchHit;
use crate::progress::{LineStyle, StreamProgress, STREAM_HEAD};
use crate::search::SearchExecutor;
use crate::update::{self, UpdateLock};

type HmacSha256 = Hmac<Sha256>;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    search: Arc<SearchExecutor>,
    fetcher: Arc<CorpusFetcher>,
    indexer: Arc<BulkIndexer>,
    lock: UpdateLock,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let fetcher = CorpusFetcher::new(&config.source)?;
        Ok(Self {
            search: Arc::new(SearchExecutor::new(pool.clone(), config.search.clone())),
            fetcher: Arc::new(fetcher),
            indexer: Arc::new(BulkIndexer::new(config.index.chunk_size)),
            config: Arc::new(config),
            pool,
            lock: UpdateLock::new(),
        })
    }
}

/// Starts the HTTP server.
///
/// Creates the schema if needed, binds to `[server].bind` and serves until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;

    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config.clone(), pool)?);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid allowed origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET]);

    let search_routes = Router::new()
        .route("/q", get(handle_empty_query))
        .route("/q/", get(handle_empty_query))
        .route("/q/{*query}", get(handle_search))
        .layer(cors);

    Router::new()
        .merge(search_routes)
        .route("/update/{token}/{start}/{finish}", get(handle_update))
        .route("/delete/{token}", get(handle_delete))
        .route("/health", get(handle_health))
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn unauthorized() -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: "invalid token".to_string(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        if matches!(err, BuildError::AlreadyRunning) {
            AppError {
                status: StatusCode::CONFLICT,
                code: "conflict".to_string(),
                message: err.to_string(),
            }
        } else {
            internal(err.to_string())
        }
    }
}

/// Compare `provided` against the configured token in constant time.
fn token_matches(expected: &str, provided: &str) -> bool {
    let tag = |msg: &str| {
        HmacSha256::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(msg.as_bytes());
            mac
        })
    };
    match (tag(provided), tag(expected)) {
        (Ok(mac), Ok(reference)) => mac.verify_slice(&reference.finalize().into_bytes()).is_ok(),
        _ => false,
    }
}

fn check_token(state: &AppState, token: &str) -> Result<(), AppError> {
    if token_matches(&state.config.server.update_token, token) {
        Ok(())
    } else {
        tracing::warn!("rejected request with invalid token");
        Err(unauthorized())
    }
}

// ============ GET /health ============

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

// ============ GET /q/{query} ============

async fn handle_empty_query() -> Json<Vec<SearchHit>> {
    Json(Vec::new())
}

async fn handle_search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<Vec<SearchHit>> {
    match state.search.search(&query).await {
        Ok(hits) => Json(hits),
        Err(e) => {
            tracing::warn!(%query, error = %e, "search failed, returning no results");
            Json(Vec::new())
        }
    }
}

// ============ GET /update/{token}/{start}/{finish} ============

/// Prefer the HTML stream when the client lists `text/html` in `Accept`.
fn line_style(headers: &HeaderMap) -> LineStyle {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if accept.contains("text/html") {
        LineStyle::Html
    } else {
        LineStyle::Plain
    }
}

/// Page numbers come in as raw path segments so the token is checked first.
fn parse_page(raw: &str) -> Result<u32, AppError> {
    raw.parse()
        .map_err(|_| bad_request(format!("invalid page number: {}", raw)))
}

/// Handler for `GET /update/{token}/{start}/{finish}`.
///
/// The build runs on its own task and keeps going if the client hangs up;
/// the response body just follows along as lines are reported.
async fn handle_update(
    State(state): State<AppState>,
    Path((token, start, finish)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    check_token(&state, &token)?;
    let start = parse_page(&start)?;
    let finish = parse_page(&finish)?;
    let guard = state.lock.try_acquire()?;

    let style = line_style(&headers);
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    if style == LineStyle::Html {
        let _ = tx.send(STREAM_HEAD.to_string());
    }

    tokio::spawn(async move {
        // declared after the reporter so the lock is released before the
        // stream closes
        let reporter = StreamProgress::new(tx, style);
        let _guard = guard;
        // failures are already logged and streamed by run_update
        let _ = update::run_update(
            &state.pool,
            &state.fetcher,
            &state.indexer,
            &reporter,
            start,
            finish,
        )
        .await;
    });

    let body = Body::from_stream(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (Ok::<_, Infallible>(line), rx))
    }));
    let content_type = match style {
        LineStyle::Html => "text/html; charset=utf-8",
        LineStyle::Plain => "text/plain; charset=utf-8",
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .map_err(|e| internal(e.to_string()))
}

// ============ GET /delete/{token} ============

async fn handle_delete(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<String, AppError> {
    check_token(&state, &token)?;
    let _guard = state.lock.try_acquire()?;
    let deleted = db::clear_entries(&state.pool)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(format!("deleted {} entries", deleted))
}

use anyhow::{bail, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use filesearch_core::tokenizer::query_terms;
use filesearch_core::QueryProcessor;
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Index files to answer queries from.
    pub indices: Vec<PathBuf>,
    /// Directory served under `/static/`; result links are made relative to it.
    pub static_dir: PathBuf,
    /// Verify each index file's checksum at startup.
    pub validate: bool,
}

#[derive(Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub terms: String,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<QueryHit>,
}

#[derive(Serialize)]
pub struct QueryHit {
    pub document_name: String,
    pub rank: u64,
    /// Link to the document under `/static/`, when it lives in the static dir.
    pub href: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<QueryProcessor>,
    pub static_dir: PathBuf,
}

pub fn build_app(config: &ServerConfig) -> Result<Router> {
    // Readers are opened and validated once, then shared by every request.
    let processor = QueryProcessor::open(config.indices.as_slice(), config.validate);
    if processor.num_indices() == 0 {
        bail!("none of the {} index files could be opened", config.indices.len());
    }
    tracing::info!(indices = processor.num_indices(), "index files loaded");
    let app_state = AppState { processor: Arc::new(processor), static_dir: config.static_dir.clone() };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/query", get(query_handler))
        .route("/static/*path", get(static_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn query_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let query = params.terms.trim().to_string();
    let terms = query_terms(&query);

    let results = if terms.is_empty() {
        Vec::new()
    } else {
        // Lookups are blocking positioned reads.
        let processor = Arc::clone(&state.processor);
        tokio::task::spawn_blocking(move || processor.process_query(&terms))
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("query task failed: {e}")))?
    };

    let results: Vec<QueryHit> = results
        .into_iter()
        .map(|r| {
            let href = static_href(&state.static_dir, &r.document_name);
            QueryHit { document_name: r.document_name, rank: r.rank, href }
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(QueryResponse { query, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

fn static_href(static_dir: &FsPath, document_name: &str) -> Option<String> {
    let rel = FsPath::new(document_name).strip_prefix(static_dir).ok()?;
    Some(format!("/static/{}", rel.to_string_lossy()))
}

pub async fn static_handler(State(state): State<AppState>, Path(rel): Path<String>) -> Response {
    match resolve_static(&state.static_dir, &rel) {
        Some(path) => match tokio::fs::read(&path).await {
            Ok(body) => ([(header::CONTENT_TYPE, content_type(&rel))], body).into_response(),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "static read failed");
                not_found(&rel)
            }
        },
        None => not_found(&rel),
    }
}

fn not_found(rel: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("couldn't find file {rel:?}")).into_response()
}

/// Canonical path of `rel` under `root`, or `None` if it doesn't exist or
/// escapes `root`.
fn resolve_static(root: &FsPath, rel: &str) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let full = root.join(rel).canonicalize().ok()?;
    if full.starts_with(&root) && full.is_file() {
        Some(full)
    } else {
        None
    }
}

fn content_type(name: &str) -> &'static str {
    let ext = FsPath::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "css" => "text/css",
        "js" => "application/javascript",
        "xml" => "application/xml",
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

//! Dashboard routes. Every handler answers with well-formed JSON, whatever
//! the upstreams do.

use axum::{
    extract::State,
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use ergo_dash::{BlockLabel, BlockView, Dashboard, PriceView, TransactionView};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub started: Instant,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self {
            dashboard,
            started: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: &'static str,
}

pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    let api = Router::new()
        .route("/get_transactions", get(get_transactions))
        .route("/get_block_labels", get(get_block_labels))
        .route("/get_blocks", get(get_blocks))
        .route("/get_price", get(get_price))
        .route("/health", get(health))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };
    app.layer(cors).layer(TraceLayer::new_for_http())
}

async fn get_transactions(State(state): State<AppState>) -> Json<Vec<TransactionView>> {
    Json(state.dashboard.transactions().await)
}

async fn get_block_labels(State(state): State<AppState>) -> Json<Vec<BlockLabel>> {
    Json(state.dashboard.block_labels().await)
}

async fn get_blocks(State(state): State<AppState>) -> Json<Vec<BlockView>> {
    Json(state.dashboard.block_views().await)
}

async fn get_price(State(state): State<AppState>) -> Json<PriceView> {
    Json(state.dashboard.price().await)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = Health {
        status: "healthy",
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        uptime_seconds: state.started.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    };
    (
        [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
        Json(body),
    )
}

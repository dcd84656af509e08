//! GastoÁgil receipts API: OCR ingestion and per-user expense records.

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, ApiResult};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use database::BoletaStore;
use services::OcrEngine;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BoletaStore>,
    pub ocr: Arc<dyn OcrEngine>,
    pub http_client: reqwest::Client,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/ocr", post(handlers::upload_and_extract))
        .route("/ocr/from-storage", post(handlers::extract_from_storage))
        .route("/boletas", get(handlers::list_boletas).post(handlers::create_boleta))
        .route("/boletas/stats", get(handlers::get_stats))
        .route("/boletas/:id", get(handlers::get_boleta).delete(handlers::delete_boleta))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(protected)
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // A literal "*" cannot be combined with credentials; echo the caller's origin instead.
    if config.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::mirror_request());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}

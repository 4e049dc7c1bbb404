pub mod auth;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::auth::auth_middleware;
use crate::config::Config;
use crate::error::Result;
use crate::parser::Dataset;
use crate::scraper::{ScrapeRequest, Scraper};
use crate::storage::{export_dataset, ExportFormat};

pub const SCRAPE_ERROR_HEADER: &str = "x-scrape-error";

#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed, but still carrying a payload (the empty table)
    pub fn failure(data: T, message: String) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    pub config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    format: Option<ExportFormat>,
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/scrape", post(scrape))
        .route("/export", post(export))
        .route_layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(protected_routes)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_api_server(scraper: Arc<Scraper>, config: Arc<Config>) -> Result<()> {
    let port = config.server.port;
    let app = router(AppState { scraper, config });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("API server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Json<ApiResponse<Dataset>> {
    let outcome = state.scraper.scrape(&request).await;
    match outcome.error {
        None => Json(ApiResponse::success(outcome.dataset)),
        Some(message) => Json(ApiResponse::failure(outcome.dataset, message)),
    }
}

async fn export(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
    Json(request): Json<ScrapeRequest>,
) -> Response {
    let format = params.format.unwrap_or(state.config.output.format);
    let outcome = state.scraper.scrape(&request).await;

    let exported = match export_dataset(&outcome.dataset, format, outcome.platform) {
        Ok(exported) => exported,
        Err(e) => {
            error!("Export to {} failed: {}", format, e);
            let body = Json(ApiResponse::<Dataset>::error(format!("Export failed: {}", e)));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }
    };

    let headers = [
        (header::CONTENT_TYPE, exported.mime_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", exported.file_name),
        ),
    ];
    let mut response = (headers, exported.bytes).into_response();

    // the file is still sent (empty) so clients can tell failure from an empty result
    if let Some(message) = outcome.error {
        if let Ok(value) = HeaderValue::from_str(&message) {
            response.headers_mut().insert(SCRAPE_ERROR_HEADER, value);
        }
    }

    response
}

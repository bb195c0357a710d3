use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::{ExtractOptions, ServerConfig};
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: PageFetcher,
    pub extract: ExtractOptions,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: String,
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    // Anything that is not an API route falls through to the single-page app.
    let index = Path::new(static_dir).join("index.html");
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(index));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/scrape-matches", post(scrape_matches_handler))
        .fallback_service(spa)
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

pub async fn start_http_server(config: ServerConfig) -> Result<()> {
    let state = AppState {
        fetcher: PageFetcher::new(&config.fetch)?,
        extract: config.extract,
    };
    let app = router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on http://0.0.0.0:{} (static files from {})", config.port, config.static_dir);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn scrape_matches_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("Rejected scrape request: {}", rejection.body_text());
            return ScrapeError::InvalidRequest(rejection.body_text()).into_response();
        }
    };
    match state.fetcher.scrape_matches(&req.url, &state.extract).await {
        Ok(matches) => {
            info!("Scraped {} matches from {}", matches.len(), req.url.trim());
            (StatusCode::OK, Json(serde_json::json!({ "matches": matches }))).into_response()
        }
        Err(e) => {
            warn!("Scrape of {:?} failed: {}", req.url, e);
            e.into_response()
        }
    }
}
